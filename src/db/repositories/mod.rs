pub mod anime;
pub mod cache;
pub mod comment;
pub mod favorite;
pub mod profile;
pub mod user;
