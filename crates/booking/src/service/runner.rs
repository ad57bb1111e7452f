use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{Local, NaiveDateTime, Utc};
use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::{BookingConfig, BucketConfig};
use crate::error::ConfigError;
use crate::gateway::{bounded, GatewayError, PersistenceGateway};
use crate::model::{
    AppointmentRecord, AppointmentRequest, AppointmentStatus, AttachmentSlot, RecordBuilder,
};
use crate::sanitize;
use crate::validation::{FormRules, FormValidator, ValidationFailure};

use super::context::SubmissionContext;
use super::error::{SubmissionWarning, SubmitError};

/// What a successful submission hands back.
#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    pub id: String,
    /// The record as this submission left it, attachment outcomes included.
    pub record: AppointmentRecord,
    pub warnings: Vec<SubmissionWarning>,
}

/// Result of a connectivity check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectivityStatus {
    Reachable {
        store: &'static str,
        latency: Duration,
    },
    Unreachable {
        store: &'static str,
        error: GatewayError,
    },
}

impl ConnectivityStatus {
    pub fn is_reachable(&self) -> bool {
        matches!(self, ConnectivityStatus::Reachable { .. })
    }
}

/// Validates, builds and persists bookings, and serves the read side.
///
/// Every gateway call is bounded by the configured store timeout.
pub struct BookingService {
    gateway: Arc<dyn PersistenceGateway>,
    validator: FormValidator,
    builder: RecordBuilder,
    buckets: BucketConfig,
    timeout: Duration,
}

impl BookingService {
    pub fn new(
        gateway: Arc<dyn PersistenceGateway>,
        config: &BookingConfig,
    ) -> Result<Self, ConfigError> {
        let rules = FormRules::from_config(&config.form)?;
        Ok(Self::with_rules(
            gateway,
            rules,
            config.buckets.clone(),
            config.store_timeout(),
        ))
    }

    pub fn with_rules(
        gateway: Arc<dyn PersistenceGateway>,
        rules: FormRules,
        buckets: BucketConfig,
        timeout: Duration,
    ) -> Self {
        Self {
            gateway,
            validator: FormValidator::new(rules),
            builder: RecordBuilder::new(),
            buckets,
            timeout,
        }
    }

    pub fn gateway(&self) -> &Arc<dyn PersistenceGateway> {
        &self.gateway
    }

    pub fn validator(&self) -> &FormValidator {
        &self.validator
    }

    /// Submits against the current local time.
    pub async fn submit(
        &self,
        request: AppointmentRequest,
    ) -> Result<SubmissionReceipt, SubmitError> {
        self.submit_at(request, Local::now().naive_local()).await
    }

    /// Runs one submission: validate, build, save, then upload each
    /// attachment. Attachment trouble after the save becomes a warning on
    /// the receipt, never an error.
    pub async fn submit_at(
        &self,
        request: AppointmentRequest,
        now: NaiveDateTime,
    ) -> Result<SubmissionReceipt, SubmitError> {
        let span = info_span!(
            "submission",
            email = %sanitize::mask_email(&request.email),
            phone = %sanitize::mask_phone(&request.phone),
            appointment_id = tracing::field::Empty,
        );
        let mut ctx = SubmissionContext::new(request, now);

        async move {
            let mut record = {
                let _step = info_span!("validate_and_build").entered();
                match self.step_validate_and_build(&ctx) {
                    Ok(record) => record,
                    Err(failures) => {
                        info!(failures = failures.len(), "Submission rejected by validation");
                        return Err(SubmitError::Invalid {
                            failures,
                            request: Box::new(ctx.request),
                        });
                    }
                }
            };
            tracing::Span::current().record("appointment_id", record.id.as_str());

            let saved = self
                .step_save(&record)
                .instrument(info_span!("save"))
                .await;
            let stored_id = match saved {
                Ok(id) => id,
                Err(source) => {
                    warn!(error = %source, "Saving appointment failed");
                    return Err(SubmitError::Persistence {
                        source,
                        request: Box::new(ctx.request),
                    });
                }
            };
            if stored_id != record.id {
                debug!(built_id = %record.id, stored_id = %stored_id, "Store assigned its own id");
                record.id = stored_id;
                tracing::Span::current().record("appointment_id", record.id.as_str());
            }

            self.step_upload_attachments(&mut ctx, &mut record)
                .instrument(info_span!("upload_attachments"))
                .await;

            info!(
                warnings = ctx.warnings.len(),
                attachment = record.attachment.uploaded,
                secondary_attachment = record.secondary_attachment.uploaded,
                "Appointment booked"
            );

            Ok(SubmissionReceipt {
                id: record.id.clone(),
                record,
                warnings: ctx.warnings,
            })
        }
        .instrument(span)
        .await
    }

    fn step_validate_and_build(
        &self,
        ctx: &SubmissionContext,
    ) -> Result<AppointmentRecord, Vec<ValidationFailure>> {
        let validated = self.validator.validate(&ctx.request, ctx.now)?;
        Ok(self.builder.build(&validated, Utc::now()))
    }

    /// Returns the id the store reports for the new row.
    async fn step_save(&self, record: &AppointmentRecord) -> Result<String, GatewayError> {
        let id = bounded(self.timeout, "save", self.gateway.save(record)).await?;
        debug!(id = %id, "Record saved");
        Ok(id)
    }

    /// Uploads each attachment and then records its reference. The saved
    /// slot reads "not uploaded" until `attach_reference` succeeds, so a
    /// failure at either step leaves nothing to roll back in the record.
    async fn step_upload_attachments(
        &self,
        ctx: &mut SubmissionContext,
        record: &mut AppointmentRecord,
    ) {
        for slot in AttachmentSlot::ALL {
            let Some(upload) = ctx.request.attachment(slot) else {
                continue;
            };
            let bucket = self.buckets.for_slot(slot);

            let reference = match bounded(
                self.timeout,
                "upload_attachment",
                self.gateway
                    .upload_attachment(upload, &upload.file_name, bucket),
            )
            .await
            {
                Ok(reference) => reference,
                Err(error) => {
                    warn!(%slot, error = %error, "Attachment not stored, keeping record without it");
                    ctx.warnings.push(attachment_failed(slot, &upload.file_name, &error));
                    continue;
                }
            };

            match bounded(
                self.timeout,
                "attach_reference",
                self.gateway.attach_reference(&record.id, slot, &reference),
            )
            .await
            {
                Ok(()) => {
                    debug!(
                        %slot,
                        file = %sanitize::redact_path(Path::new(&upload.file_name)),
                        "Attachment stored"
                    );
                    let info = record.attachment_mut(slot);
                    info.uploaded = true;
                    info.reference = Some(reference);
                }
                Err(error) => {
                    warn!(%slot, error = %error, "Attachment reference not recorded, removing blob");
                    ctx.warnings.push(attachment_failed(slot, &upload.file_name, &error));

                    if let Err(cleanup) = bounded(
                        self.timeout,
                        "delete_attachment",
                        self.gateway.delete_attachment(&reference),
                    )
                    .await
                    {
                        warn!(%slot, error = %cleanup, "Could not remove unreferenced blob");
                        ctx.warnings.push(SubmissionWarning::OrphanedAttachment {
                            slot,
                            error: cleanup.to_string(),
                        });
                    }
                }
            }
        }
    }
}

fn attachment_failed(slot: AttachmentSlot, file_name: &str, error: &GatewayError) -> SubmissionWarning {
    SubmissionWarning::AttachmentFailed {
        slot,
        file_name: file_name.to_string(),
        error: error.to_string(),
    }
}

impl BookingService {
    pub async fn appointment(&self, id: &str) -> Result<AppointmentRecord, GatewayError> {
        bounded(self.timeout, "get_by_id", self.gateway.get_by_id(id)).await
    }

    pub async fn list_appointments(&self) -> Result<Vec<AppointmentRecord>, GatewayError> {
        bounded(self.timeout, "list_all", self.gateway.list_all()).await
    }

    pub async fn update_status(
        &self,
        id: &str,
        status: AppointmentStatus,
    ) -> Result<(), GatewayError> {
        bounded(
            self.timeout,
            "update_status",
            self.gateway.update_status(id, status),
        )
        .await?;
        info!(appointment_id = %id, status = status.as_str(), "Status updated");
        Ok(())
    }

    /// Unlinks the slot's attachment and deletes its blob. The record is
    /// cleared first, so it never points at a deleted blob. The file name
    /// stays on the record.
    pub async fn remove_attachment(
        &self,
        id: &str,
        slot: AttachmentSlot,
    ) -> Result<(), GatewayError> {
        let record = self.appointment(id).await?;
        bounded(
            self.timeout,
            "clear_attachment",
            self.gateway.clear_attachment(id, slot),
        )
        .await?;

        if let Some(reference) = &record.attachment(slot).reference {
            match bounded(
                self.timeout,
                "delete_attachment",
                self.gateway.delete_attachment(reference),
            )
            .await
            {
                Ok(()) | Err(GatewayError::BlobNotFound(_)) => {}
                Err(error) => return Err(error),
            }
        }
        info!(appointment_id = %id, %slot, "Attachment removed");
        Ok(())
    }

    pub async fn check_connectivity(&self) -> ConnectivityStatus {
        let store = self.gateway.kind();
        let started = Instant::now();
        match bounded(
            self.timeout,
            "check_connectivity",
            self.gateway.check_connectivity(),
        )
        .await
        {
            Ok(()) => ConnectivityStatus::Reachable {
                store,
                latency: started.elapsed(),
            },
            Err(error) => ConnectivityStatus::Unreachable { store, error },
        }
    }

    /// Ensures both configured buckets exist. Returns each bucket with
    /// whether it had to be created.
    pub async fn prepare_buckets(&self) -> Result<Vec<(String, bool)>, GatewayError> {
        let mut prepared = Vec::with_capacity(AttachmentSlot::ALL.len());
        for slot in AttachmentSlot::ALL {
            let bucket = self.buckets.for_slot(slot);
            let created = bounded(
                self.timeout,
                "ensure_bucket",
                self.gateway.ensure_bucket(bucket),
            )
            .await?;
            if created {
                info!(bucket, "Bucket created");
            }
            prepared.push((bucket.to_string(), created));
        }
        Ok(prepared)
    }
}
