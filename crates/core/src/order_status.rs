//! Order lifecycle statuses.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_PAID: &str = "paid";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_CANCELLED: &str = "cancelled";
pub const STATUS_REFUNDED: &str = "refunded";

const VALID_STATUSES: &[&str] = &[
    STATUS_PENDING,
    STATUS_PAID,
    STATUS_COMPLETED,
    STATUS_CANCELLED,
    STATUS_REFUNDED,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Completed,
    Cancelled,
    Refunded,
}

impl OrderStatus {
    /// Parse from the database `status` column.
    pub fn from_name(name: &str) -> Result<Self, CoreError> {
        match name {
            STATUS_PENDING => Ok(Self::Pending),
            STATUS_PAID => Ok(Self::Paid),
            STATUS_COMPLETED => Ok(Self::Completed),
            STATUS_CANCELLED => Ok(Self::Cancelled),
            STATUS_REFUNDED => Ok(Self::Refunded),
            other => Err(CoreError::Validation(format!(
                "Invalid order status '{other}'. Must be one of: {VALID_STATUSES:?}"
            ))),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Pending => STATUS_PENDING,
            Self::Paid => STATUS_PAID,
            Self::Completed => STATUS_COMPLETED,
            Self::Cancelled => STATUS_CANCELLED,
            Self::Refunded => STATUS_REFUNDED,
        }
    }

    /// Whether purchased files may be delivered for an order in this status.
    pub fn grants_downloads(self) -> bool {
        matches!(self, Self::Paid | Self::Completed)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
