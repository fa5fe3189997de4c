use async_trait::async_trait;
use crate::domain::{
    error::SyncError,
    models::{CustomerId, CustomerProfile, FileUpdate, FileVersion, VersionedFile},
};

#[async_trait]
pub trait CustomerFetcher: Send + Sync {
    async fn fetch_customer(&self, customer_id: &CustomerId) -> Result<CustomerProfile, SyncError>;
}

#[async_trait]
pub trait VersionedFileStore: Send + Sync {
    async fn read_file(&self, path: &str, git_ref: &str) -> Result<VersionedFile, SyncError>;

    /// Returns the new version on success, `SyncError::VersionConflict` if
    /// `update.expected_version` is no longer current.
    async fn write_file(&self, update: FileUpdate) -> Result<FileVersion, SyncError>;
}
