//! Record and attachment persistence.
//!
//! [`PersistenceGateway`] is the only way the service touches storage.
//! Three backends implement it: [`MemoryGateway`] (tests, demos),
//! [`LocalGateway`] (SQLite plus a blob directory) and [`HostedGateway`]
//! (REST table and object storage).

pub mod error;
pub mod hosted;
pub mod local;
pub mod memory;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{BookingConfig, StoreConfig};
use crate::error::BookingError;
use crate::model::{AppointmentRecord, AppointmentStatus, AttachmentSlot, AttachmentUpload};

pub use error::GatewayError;
pub use hosted::HostedGateway;
pub use local::LocalGateway;
pub use memory::MemoryGateway;

#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Short backend name for logs.
    fn kind(&self) -> &'static str;

    /// Inserts the record as one row and returns its id.
    async fn save(&self, record: &AppointmentRecord) -> Result<String, GatewayError>;

    /// Stores the blob under a fresh `<uuid>-<hint>` name in `bucket`,
    /// creating the bucket first if needed, and returns a stable reference.
    async fn upload_attachment(
        &self,
        blob: &AttachmentUpload,
        filename_hint: &str,
        bucket: &str,
    ) -> Result<String, GatewayError>;

    /// Deletes a blob by the reference `upload_attachment` returned.
    /// `BlobNotFound` if the store holds nothing under it.
    async fn delete_attachment(&self, reference: &str) -> Result<(), GatewayError>;

    /// Sets the slot's flag and reference in one write. Until this succeeds
    /// the slot reads "not uploaded".
    async fn attach_reference(
        &self,
        id: &str,
        slot: AttachmentSlot,
        reference: &str,
    ) -> Result<(), GatewayError>;

    /// Resets the slot's flag and clears its reference. The file name stays.
    async fn clear_attachment(&self, id: &str, slot: AttachmentSlot) -> Result<(), GatewayError>;

    async fn list_all(&self) -> Result<Vec<AppointmentRecord>, GatewayError>;

    async fn get_by_id(&self, id: &str) -> Result<AppointmentRecord, GatewayError>;

    /// Overwrites the status of an existing record. Never inserts.
    async fn update_status(&self, id: &str, status: AppointmentStatus)
        -> Result<(), GatewayError>;

    /// Cheap read that proves the record store answers.
    async fn check_connectivity(&self) -> Result<(), GatewayError>;

    /// Creates the bucket if missing. Returns `true` when it was created.
    async fn ensure_bucket(&self, bucket: &str) -> Result<bool, GatewayError>;
}

/// Runs a gateway call with an upper time bound. Expiry counts as the store
/// being unavailable.
pub async fn bounded<T, F>(timeout: Duration, operation: &str, fut: F) -> Result<T, GatewayError>
where
    F: Future<Output = Result<T, GatewayError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(operation, timeout_secs = timeout.as_secs(), "Store call timed out");
            Err(GatewayError::StorageUnavailable(format!(
                "{} timed out after {}s",
                operation,
                timeout.as_secs()
            )))
        }
    }
}

/// Builds the backend selected by `config.store`.
///
/// The local backend opens its database here (and runs migrations); the
/// hosted backend resolves its key but does not contact the server.
pub fn connect(config: &BookingConfig) -> Result<Arc<dyn PersistenceGateway>, BookingError> {
    let gateway: Arc<dyn PersistenceGateway> = match &config.store {
        StoreConfig::Memory => Arc::new(MemoryGateway::new()),
        StoreConfig::Local(local) => {
            let database_path = local.database_path()?;
            let blob_directory = local.blob_directory()?;
            Arc::new(LocalGateway::open(&database_path, &blob_directory)?)
        }
        StoreConfig::Hosted(hosted) => {
            let key = hosted
                .resolve_key()
                .map_err(crate::error::ConfigError::from)?;
            Arc::new(HostedGateway::new(
                hosted,
                key,
                config.connect_timeout(),
                config.store_timeout(),
            )?)
        }
    };

    tracing::info!(store = gateway.kind(), "Persistence gateway ready");
    Ok(gateway)
}
