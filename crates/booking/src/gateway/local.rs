use std::path::Path;

use async_trait::async_trait;

use super::{GatewayError, PersistenceGateway};
use crate::db::{appointment_repo, Database};
use crate::model::{
    AppointmentRecord, AppointmentRow, AppointmentStatus, AttachmentSlot, AttachmentUpload,
};
use crate::sanitize;
use crate::storage::BlobStorage;

/// SQLite rows plus a blob directory with one subdirectory per bucket.
///
/// rusqlite and the filesystem are blocking, so each call runs on the
/// blocking pool.
#[derive(Clone)]
pub struct LocalGateway {
    db: Database,
    blobs: BlobStorage,
}

impl LocalGateway {
    pub fn open(database_path: &Path, blob_directory: &Path) -> Result<Self, GatewayError> {
        let db = Database::open(database_path)?;
        std::fs::create_dir_all(blob_directory).map_err(|e| {
            GatewayError::StorageUnavailable(format!(
                "cannot create blob directory {}: {}",
                sanitize::redact_path(blob_directory),
                e
            ))
        })?;
        Ok(Self::new(db, BlobStorage::new(blob_directory)))
    }

    pub fn new(db: Database, blobs: BlobStorage) -> Self {
        Self { db, blobs }
    }

    pub fn blobs(&self) -> &BlobStorage {
        &self.blobs
    }

    async fn blocking<T, F>(&self, f: F) -> Result<T, GatewayError>
    where
        F: FnOnce(&Database, &BlobStorage) -> Result<T, GatewayError> + Send + 'static,
        T: Send + 'static,
    {
        let db = self.db.clone();
        let blobs = self.blobs.clone();
        tokio::task::spawn_blocking(move || f(&db, &blobs))
            .await
            .map_err(|e| GatewayError::StorageUnavailable(format!("store task failed: {}", e)))?
    }
}

fn decode(row: AppointmentRow) -> Result<AppointmentRecord, GatewayError> {
    Ok(AppointmentRecord::try_from(row)?)
}

fn require_changed(changed: usize, id: &str) -> Result<(), GatewayError> {
    if changed == 0 {
        return Err(GatewayError::RecordNotFound(id.to_string()));
    }
    Ok(())
}

#[async_trait]
impl PersistenceGateway for LocalGateway {
    fn kind(&self) -> &'static str {
        "local"
    }

    async fn save(&self, record: &AppointmentRecord) -> Result<String, GatewayError> {
        let row = AppointmentRow::from(record);
        self.blocking(move |db, _| {
            appointment_repo::insert(db, &row)?;
            Ok(row.id)
        })
        .await
    }

    async fn upload_attachment(
        &self,
        blob: &AttachmentUpload,
        filename_hint: &str,
        bucket: &str,
    ) -> Result<String, GatewayError> {
        let bytes = blob.bytes.clone();
        let hint = filename_hint.to_string();
        let bucket = bucket.to_string();
        self.blocking(move |_, blobs| {
            if blobs.ensure_bucket(&bucket)? {
                tracing::info!(bucket = %bucket, "Created missing bucket");
            }
            Ok(blobs.store(&bucket, &hint, &bytes)?)
        })
        .await
    }

    async fn delete_attachment(&self, reference: &str) -> Result<(), GatewayError> {
        let reference = reference.to_string();
        self.blocking(move |_, blobs| {
            if blobs.remove(&reference)? {
                Ok(())
            } else {
                Err(GatewayError::BlobNotFound(reference))
            }
        })
        .await
    }

    async fn attach_reference(
        &self,
        id: &str,
        slot: AttachmentSlot,
        reference: &str,
    ) -> Result<(), GatewayError> {
        let id = id.to_string();
        let reference = reference.to_string();
        self.blocking(move |db, _| {
            let changed = appointment_repo::set_attachment(db, &id, slot, true, Some(&reference))?;
            require_changed(changed, &id)
        })
        .await
    }

    async fn clear_attachment(&self, id: &str, slot: AttachmentSlot) -> Result<(), GatewayError> {
        let id = id.to_string();
        self.blocking(move |db, _| {
            let changed = appointment_repo::set_attachment(db, &id, slot, false, None)?;
            require_changed(changed, &id)
        })
        .await
    }

    async fn list_all(&self) -> Result<Vec<AppointmentRecord>, GatewayError> {
        self.blocking(|db, _| {
            appointment_repo::list_all(db)?
                .into_iter()
                .map(decode)
                .collect()
        })
        .await
    }

    async fn get_by_id(&self, id: &str) -> Result<AppointmentRecord, GatewayError> {
        let id = id.to_string();
        self.blocking(move |db, _| match appointment_repo::find_by_id(db, &id)? {
            Some(row) => decode(row),
            None => Err(GatewayError::RecordNotFound(id)),
        })
        .await
    }

    async fn update_status(
        &self,
        id: &str,
        status: AppointmentStatus,
    ) -> Result<(), GatewayError> {
        let id = id.to_string();
        self.blocking(move |db, _| {
            let changed = appointment_repo::update_status(db, &id, status.as_str())?;
            require_changed(changed, &id)
        })
        .await
    }

    async fn check_connectivity(&self) -> Result<(), GatewayError> {
        self.blocking(|db, _| {
            db.ping()?;
            Ok(())
        })
        .await
    }

    async fn ensure_bucket(&self, bucket: &str) -> Result<bool, GatewayError> {
        let bucket = bucket.to_string();
        self.blocking(move |_, blobs| Ok(blobs.ensure_bucket(&bucket)?))
            .await
    }
}
