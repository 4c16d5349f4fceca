//! Shared response envelope types for API handlers.
//!
//! All API responses use a `{ "data": ... }` envelope. The job endpoint is
//! the exception: its body shape is consumed by the external scheduler.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}
