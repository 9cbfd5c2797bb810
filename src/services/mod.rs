pub mod catalog;
pub mod catalog_cache;
pub mod normalizer;
pub use catalog::{CatalogService, CatalogTtls};
pub use catalog_cache::{CacheLayer, CacheStore, Fingerprint, MemoryCacheStore, Namespace};

pub mod calendar;
pub use calendar::{MonthGrid, month_grid};

pub mod import;
pub use import::{ImportOptions, ImportReport, import_top_scored};

pub mod auth_service;
pub mod auth_service_impl;
pub use auth_service::{AuthError, AuthService, LoginResult, UserInfo};
pub use auth_service_impl::SeaOrmAuthService;

pub mod comment_service;
pub mod comment_service_impl;
pub use comment_service::{Actor, CommentError, CommentInput, CommentService};
pub use comment_service_impl::SeaOrmCommentService;

pub mod profile_service;
pub mod profile_service_impl;
pub use profile_service::{ProfileError, ProfileService, ProfileUpdate, PublicProfile};
pub use profile_service_impl::SeaOrmProfileService;
