pub mod admin_beats;
pub mod admin_orders;
pub mod auth;
pub mod beats;
pub mod cache_admin;
pub mod content;
pub mod cron;
pub mod downloads;
