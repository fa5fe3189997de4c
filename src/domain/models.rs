use std::fmt;

use serde::{Deserialize, Serialize};

/// Customer identifier as received from the webhook. Shopify sends numeric
/// ids, but string ids are accepted too, so it is carried as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerId(pub String);

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    pub street: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
}

/// Normalized customer record. Blank strings from the platform are stored as `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomerProfile {
    pub id: CustomerId,
    pub company: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub address: Address,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl CustomerProfile {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Opaque revision token (the blob sha on GitHub).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileVersion(pub String);

impl fmt::Display for FileVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedFile {
    pub content: String,
    pub version: FileVersion,
}

/// Compare-and-swap write request: succeeds only while `expected_version` is current.
#[derive(Debug, Clone)]
pub struct FileUpdate {
    pub path: String,
    pub branch: String,
    pub content: String,
    pub expected_version: FileVersion,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    Added,
    AlreadyExists,
    Removed { removed: usize },
    Conflict,
}

impl SyncOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            SyncOutcome::Added => "added",
            SyncOutcome::AlreadyExists => "already_exists",
            SyncOutcome::Removed { .. } => "removed",
            SyncOutcome::Conflict => "conflict",
        }
    }
}
