//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods
//! that accept `&PgPool` as the first argument.

pub mod beat_repo;
pub mod order_repo;
pub mod site_content_repo;
pub mod user_repo;

pub use beat_repo::BeatRepo;
pub use order_repo::OrderRepo;
pub use site_content_repo::SiteContentRepo;
pub use user_repo::UserRepo;
