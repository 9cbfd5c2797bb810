pub mod prelude;

pub mod catalog_cache;
pub mod comments;
pub mod favorites;
pub mod local_anime;
pub mod profiles;
pub mod users;
