pub mod anime;

pub use anime::{AiredRange, AiringStatus, CatalogEntry, ScheduleDay};
