pub mod auth;
pub mod mime;
pub mod validation;
