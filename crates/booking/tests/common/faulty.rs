//! A memory store that fails chosen operations.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use booking::gateway::{GatewayError, MemoryGateway, PersistenceGateway};
use booking::model::{AppointmentRecord, AppointmentStatus, AttachmentSlot, AttachmentUpload};

/// Operations a [`FaultyGateway`] fails with `StorageUnavailable`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Faults {
    pub upload: bool,
    pub attach: bool,
    pub clear: bool,
    pub delete: bool,
    /// `save` keeps the record under an id of the store's choosing.
    pub assign_ids: bool,
}

pub struct FaultyGateway {
    inner: Arc<MemoryGateway>,
    faults: Faults,
    saved: AtomicUsize,
}

impl FaultyGateway {
    pub fn new(inner: Arc<MemoryGateway>, faults: Faults) -> Self {
        Self {
            inner,
            faults,
            saved: AtomicUsize::new(0),
        }
    }
}

fn injected(operation: &str) -> GatewayError {
    GatewayError::StorageUnavailable(format!("{} failed (injected)", operation))
}

#[async_trait]
impl PersistenceGateway for FaultyGateway {
    fn kind(&self) -> &'static str {
        "faulty"
    }

    async fn save(&self, record: &AppointmentRecord) -> Result<String, GatewayError> {
        if !self.faults.assign_ids {
            return self.inner.save(record).await;
        }
        let mut assigned = record.clone();
        assigned.id = format!("store-{}", self.saved.fetch_add(1, Ordering::SeqCst) + 1);
        self.inner.save(&assigned).await
    }

    async fn upload_attachment(
        &self,
        blob: &AttachmentUpload,
        filename_hint: &str,
        bucket: &str,
    ) -> Result<String, GatewayError> {
        if self.faults.upload {
            return Err(injected("upload_attachment"));
        }
        self.inner.upload_attachment(blob, filename_hint, bucket).await
    }

    async fn delete_attachment(&self, reference: &str) -> Result<(), GatewayError> {
        if self.faults.delete {
            return Err(injected("delete_attachment"));
        }
        self.inner.delete_attachment(reference).await
    }

    async fn attach_reference(
        &self,
        id: &str,
        slot: AttachmentSlot,
        reference: &str,
    ) -> Result<(), GatewayError> {
        if self.faults.attach {
            return Err(injected("attach_reference"));
        }
        self.inner.attach_reference(id, slot, reference).await
    }

    async fn clear_attachment(&self, id: &str, slot: AttachmentSlot) -> Result<(), GatewayError> {
        if self.faults.clear {
            return Err(injected("clear_attachment"));
        }
        self.inner.clear_attachment(id, slot).await
    }

    async fn list_all(&self) -> Result<Vec<AppointmentRecord>, GatewayError> {
        self.inner.list_all().await
    }

    async fn get_by_id(&self, id: &str) -> Result<AppointmentRecord, GatewayError> {
        self.inner.get_by_id(id).await
    }

    async fn update_status(
        &self,
        id: &str,
        status: AppointmentStatus,
    ) -> Result<(), GatewayError> {
        self.inner.update_status(id, status).await
    }

    async fn check_connectivity(&self) -> Result<(), GatewayError> {
        self.inner.check_connectivity().await
    }

    async fn ensure_bucket(&self, bucket: &str) -> Result<bool, GatewayError> {
        self.inner.ensure_bucket(bucket).await
    }
}
