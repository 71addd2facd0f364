pub use super::fileables::Entity as Fileables;
pub use super::files::Entity as Files;
pub use super::metadata::Entity as Metadata;
pub use super::posts::Entity as Posts;
pub use super::products::Entity as Products;
pub use super::users::Entity as Users;
