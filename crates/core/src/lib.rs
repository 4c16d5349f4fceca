//! Domain rules for the beat store.
//!
//! This crate performs no I/O so its rules can be shared by the repository
//! layer, the HTTP handlers, and the delivery resolver alike.

pub mod beat;
pub mod cache_keys;
pub mod catalog;
pub mod content;
pub mod cron;
pub mod delivery;
pub mod error;
pub mod license;
pub mod order_status;
pub mod roles;
pub mod types;
pub mod visibility;
