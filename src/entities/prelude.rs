pub use super::catalog_cache::Entity as CatalogCache;
pub use super::comments::Entity as Comments;
pub use super::favorites::Entity as Favorites;
pub use super::local_anime::Entity as LocalAnime;
pub use super::profiles::Entity as Profiles;
pub use super::users::Entity as Users;
