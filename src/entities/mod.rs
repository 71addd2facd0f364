pub mod prelude;

pub mod fileables;
pub mod files;
pub mod metadata;

pub mod posts;
pub mod products;
pub mod users;
