pub mod fileables;
pub mod files;
pub mod health;
pub mod metadata;
