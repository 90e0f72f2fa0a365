use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderStatus {
    Pending,
    Fired,
    Cancelled,
}

impl ReminderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReminderStatus::Pending => "pending",
            ReminderStatus::Fired => "fired",
            ReminderStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for ReminderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReminderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReminderStatus::Pending),
            "fired" => Ok(ReminderStatus::Fired),
            "cancelled" => Ok(ReminderStatus::Cancelled),
            other => Err(format!("unknown reminder status '{}'", other)),
        }
    }
}

/// A reminder the external timer fires once `remind_at` has passed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: String,
    pub bookmark_id: String,
    pub user_id: String,
    pub remind_at: i64,
    pub message: Option<String>,
    pub status: ReminderStatus,
    pub fired_at: Option<i64>,
    pub created_at: i64,
}

/// Expiry marker, at most one per bookmark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expiration {
    pub id: String,
    pub bookmark_id: String,
    pub user_id: String,
    pub expires_at: i64,
    /// Caller-defined action, `"archive"` unless set.
    pub action: String,
    pub is_expired: bool,
    pub created_at: i64,
    pub updated_at: i64,
}
