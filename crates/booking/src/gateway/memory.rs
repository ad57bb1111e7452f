use std::collections::{BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{GatewayError, PersistenceGateway};
use crate::model::{AppointmentRecord, AppointmentStatus, AttachmentSlot, AttachmentUpload};
use crate::storage::object_name;

/// An uploaded blob as the memory store keeps it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub bucket: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Default)]
struct State {
    records: Vec<AppointmentRecord>,
    blobs: HashMap<String, StoredBlob>,
    buckets: BTreeSet<String>,
    unavailable: bool,
    reject_writes: bool,
    reject_uploads: bool,
}

/// Process-local store. Records keep insertion order.
///
/// The `set_*` toggles simulate an unreachable or refusing store.
#[derive(Default)]
pub struct MemoryGateway {
    state: Mutex<State>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call fails with `StorageUnavailable` while set.
    pub fn set_unavailable(&self, unavailable: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.unavailable = unavailable;
        }
    }

    /// `save` fails with `WriteRejected` while set.
    pub fn set_reject_writes(&self, reject: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.reject_writes = reject;
        }
    }

    /// `upload_attachment` fails with `UploadRejected` while set.
    pub fn set_reject_uploads(&self, reject: bool) {
        if let Ok(mut state) = self.state.lock() {
            state.reject_uploads = reject;
        }
    }

    pub fn blob(&self, reference: &str) -> Option<StoredBlob> {
        self.state.lock().ok()?.blobs.get(reference).cloned()
    }

    pub fn blob_count(&self) -> usize {
        self.state.lock().map(|s| s.blobs.len()).unwrap_or(0)
    }

    pub fn record_count(&self) -> usize {
        self.state.lock().map(|s| s.records.len()).unwrap_or(0)
    }

    pub fn has_bucket(&self, bucket: &str) -> bool {
        self.state
            .lock()
            .map(|s| s.buckets.contains(bucket))
            .unwrap_or(false)
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, GatewayError> {
        let state = self
            .state
            .lock()
            .map_err(|_| GatewayError::StorageUnavailable("memory store lock poisoned".to_string()))?;
        if state.unavailable {
            return Err(GatewayError::StorageUnavailable(
                "memory store is offline".to_string(),
            ));
        }
        Ok(state)
    }
}

fn find_mut<'a>(
    state: &'a mut State,
    id: &str,
) -> Result<&'a mut AppointmentRecord, GatewayError> {
    state
        .records
        .iter_mut()
        .find(|r| r.id == id)
        .ok_or_else(|| GatewayError::RecordNotFound(id.to_string()))
}

#[async_trait]
impl PersistenceGateway for MemoryGateway {
    fn kind(&self) -> &'static str {
        "memory"
    }

    async fn save(&self, record: &AppointmentRecord) -> Result<String, GatewayError> {
        let mut state = self.lock()?;
        if state.reject_writes {
            return Err(GatewayError::WriteRejected(
                "memory store is refusing writes".to_string(),
            ));
        }
        if state.records.iter().any(|r| r.id == record.id) {
            return Err(GatewayError::WriteRejected(format!(
                "duplicate id {}",
                record.id
            )));
        }
        state.records.push(record.clone());
        Ok(record.id.clone())
    }

    async fn upload_attachment(
        &self,
        blob: &AttachmentUpload,
        filename_hint: &str,
        bucket: &str,
    ) -> Result<String, GatewayError> {
        let mut state = self.lock()?;
        if state.reject_uploads {
            return Err(GatewayError::UploadRejected(
                "memory store is refusing uploads".to_string(),
            ));
        }
        state.buckets.insert(bucket.to_string());

        let reference = format!("memory://{}/{}", bucket, object_name(filename_hint));
        state.blobs.insert(
            reference.clone(),
            StoredBlob {
                bucket: bucket.to_string(),
                content_type: crate::storage::content_type_for(blob),
                bytes: blob.bytes.clone(),
            },
        );
        Ok(reference)
    }

    async fn delete_attachment(&self, reference: &str) -> Result<(), GatewayError> {
        self.lock()?
            .blobs
            .remove(reference)
            .map(|_| ())
            .ok_or_else(|| GatewayError::BlobNotFound(reference.to_string()))
    }

    async fn attach_reference(
        &self,
        id: &str,
        slot: AttachmentSlot,
        reference: &str,
    ) -> Result<(), GatewayError> {
        let mut state = self.lock()?;
        let info = find_mut(&mut state, id)?.attachment_mut(slot);
        info.uploaded = true;
        info.reference = Some(reference.to_string());
        Ok(())
    }

    async fn clear_attachment(&self, id: &str, slot: AttachmentSlot) -> Result<(), GatewayError> {
        let mut state = self.lock()?;
        let info = find_mut(&mut state, id)?.attachment_mut(slot);
        info.uploaded = false;
        info.reference = None;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<AppointmentRecord>, GatewayError> {
        Ok(self.lock()?.records.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<AppointmentRecord, GatewayError> {
        let state = self.lock()?;
        state
            .records
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or_else(|| GatewayError::RecordNotFound(id.to_string()))
    }

    async fn update_status(
        &self,
        id: &str,
        status: AppointmentStatus,
    ) -> Result<(), GatewayError> {
        let mut state = self.lock()?;
        find_mut(&mut state, id)?.status = status;
        Ok(())
    }

    async fn check_connectivity(&self) -> Result<(), GatewayError> {
        self.lock().map(|_| ())
    }

    async fn ensure_bucket(&self, bucket: &str) -> Result<bool, GatewayError> {
        Ok(self.lock()?.buckets.insert(bucket.to_string()))
    }
}
