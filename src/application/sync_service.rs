use std::sync::Arc;
use tracing::{info, debug, error, warn};
use crate::domain::{
    error::SyncError,
    models::{CustomerId, FileUpdate, SyncOutcome, VersionedFile},
    ports::{CustomerFetcher, VersionedFileStore},
};
use crate::infrastructure::parsers::stockist_csv::{
    encode_row, matches_for_dedup, matches_for_removal, CsvDocument,
};

/// Where the stockist list lives and how rows are defaulted.
#[derive(Debug, Clone)]
pub struct SyncSettings {
    pub path: String,
    pub branch: String,
    pub default_country: String,
}

/// Applies add/remove events to the stockist CSV.
///
/// Each call performs one read and at most one compare-and-swap write. A
/// stale version is reported as `SyncOutcome::Conflict` and never retried
/// here; the webhook sender is expected to re-deliver.
pub struct SyncService {
    customer_fetcher: Arc<dyn CustomerFetcher>,
    file_store: Arc<dyn VersionedFileStore>,
    settings: SyncSettings,
}

impl SyncService {
    pub fn new(
        customer_fetcher: Arc<dyn CustomerFetcher>,
        file_store: Arc<dyn VersionedFileStore>,
        settings: SyncSettings,
    ) -> Self {
        Self {
            customer_fetcher,
            file_store,
            settings,
        }
    }

    pub async fn add_customer(&self, customer_id: &CustomerId) -> Result<SyncOutcome, SyncError> {
        info!("Starting add for customer {}", customer_id);

        // Step 1: Resolve customer
        let profile = self.customer_fetcher.fetch_customer(customer_id).await
            .map_err(|e| {
                error!(error_kind = e.kind(), "Failed to fetch customer {}: {}", customer_id, e);
                e
            })?;

        // Step 2: Encode row
        let row = encode_row(&profile, &self.settings.default_country);
        let line = row.to_line()?;
        debug!("Encoded row for customer {}: {}", customer_id, line);

        // Step 3: Read current document
        let VersionedFile { content, version } = self.read_current().await?;
        let mut document = CsvDocument::parse(&content);
        debug!("Current document has {} lines at version {}", document.line_count(), version);

        // Step 4: Dedup
        if matches_for_dedup(&document, &profile, &line) {
            info!(outcome = SyncOutcome::AlreadyExists.label(), "ℹ️ Customer {} already exists in CSV", customer_id);
            return Ok(SyncOutcome::AlreadyExists);
        }

        // Step 5: Append and write back
        document.append_line(&line);
        let update = FileUpdate {
            path: self.settings.path.clone(),
            branch: self.settings.branch.clone(),
            content: document.to_text(),
            expected_version: version,
            message: format!("Add stockist: {}", row.company),
        };

        let outcome = self.write(update, SyncOutcome::Added).await?;
        if outcome == SyncOutcome::Added {
            info!(outcome = outcome.label(), "✅ Customer {} added to CSV", customer_id);
        }
        Ok(outcome)
    }

    pub async fn remove_customer(&self, customer_id: &CustomerId) -> Result<SyncOutcome, SyncError> {
        info!("Starting remove for customer {}", customer_id);

        let profile = self.customer_fetcher.fetch_customer(customer_id).await
            .map_err(|e| {
                error!(error_kind = e.kind(), "Failed to fetch customer {}: {}", customer_id, e);
                e
            })?;

        let VersionedFile { content, version } = self.read_current().await?;
        let mut document = CsvDocument::parse(&content);

        let removed = document.retain_lines(|line| !matches_for_removal(line, &profile));
        if removed == 0 {
            warn!("No rows matched customer {}; writing unchanged list", customer_id);
        } else {
            debug!("Filtered {} lines matching customer {}", removed, customer_id);
        }

        let update = FileUpdate {
            path: self.settings.path.clone(),
            branch: self.settings.branch.clone(),
            content: document.to_text().trim().to_string(),
            expected_version: version,
            message: format!("Remove stockist: {}", profile.full_name().to_lowercase()),
        };

        let outcome = self.write(update, SyncOutcome::Removed { removed }).await?;
        if let SyncOutcome::Removed { removed } = outcome {
            info!(outcome = outcome.label(), removed, "✅ Customer {} removed from CSV", customer_id);
        }
        Ok(outcome)
    }

    async fn read_current(&self) -> Result<VersionedFile, SyncError> {
        self.file_store.read_file(&self.settings.path, &self.settings.branch).await
            .map_err(|e| {
                error!(error_kind = e.kind(), "Failed to read {}@{}: {}", self.settings.path, self.settings.branch, e);
                e
            })
    }

    async fn write(&self, update: FileUpdate, on_success: SyncOutcome) -> Result<SyncOutcome, SyncError> {
        let path = update.path.clone();
        match self.file_store.write_file(update).await {
            Ok(new_version) => {
                debug!("{} now at version {}", path, new_version);
                Ok(on_success)
            }
            Err(SyncError::VersionConflict { .. }) => {
                warn!(outcome = SyncOutcome::Conflict.label(), "{} changed since it was read; write rejected", path);
                Ok(SyncOutcome::Conflict)
            }
            Err(e) => {
                error!(error_kind = e.kind(), "Failed to write {}: {}", path, e);
                Err(e)
            }
        }
    }
}
