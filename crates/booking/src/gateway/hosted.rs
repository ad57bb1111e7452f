//! Hosted store: a PostgREST-style table API plus an object storage API
//! under the same base URL.

use std::collections::HashSet;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Map, Value};

use super::{GatewayError, PersistenceGateway};
use crate::config::HostedStoreConfig;
use crate::model::{
    AppointmentRecord, AppointmentRow, AppointmentStatus, AttachmentSlot, AttachmentUpload,
};
use crate::sanitize;
use crate::storage::{content_type_for, object_name};

const MAX_ERROR_BODY_LENGTH: usize = 200;

fn truncate_error_body(body: &str) -> String {
    if body.chars().count() > MAX_ERROR_BODY_LENGTH {
        let head: String = body.chars().take(MAX_ERROR_BODY_LENGTH).collect();
        format!("{}... (truncated)", head)
    } else {
        body.to_string()
    }
}

/// Server-side trouble and throttling mean "try later"; everything else is a
/// refusal of this particular request.
fn is_unavailable_status(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
}

fn transport_error(operation: &str, e: reqwest::Error) -> GatewayError {
    GatewayError::StorageUnavailable(format!("{} failed: {}", operation, e.without_url()))
}

pub struct HostedGateway {
    client: Client,
    base_url: String,
    table: String,
    key: SecretString,
    known_buckets: Mutex<HashSet<String>>,
}

impl HostedGateway {
    pub fn new(
        config: &HostedStoreConfig,
        key: SecretString,
        connect_timeout: Duration,
        request_timeout: Duration,
    ) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(request_timeout)
            .build()
            .map_err(|e| {
                GatewayError::StorageUnavailable(format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            table: config.table.clone(),
            key,
            known_buckets: Mutex::new(HashSet::new()),
        })
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/{}", self.base_url, self.table)
    }

    fn object_url(&self, bucket: &str, name: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, bucket, name)
    }

    /// The reference stored on the record.
    fn public_url(&self, bucket: &str, name: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, bucket, name
        )
    }

    fn bucket_url(&self) -> String {
        format!("{}/storage/v1/bucket", self.base_url)
    }

    /// Splits a reference made by [`public_url`](Self::public_url) back into
    /// bucket and object name.
    fn object_for<'r>(&self, reference: &'r str) -> Option<(&'r str, &'r str)> {
        let prefix = format!("{}/storage/v1/object/public/", self.base_url);
        reference
            .strip_prefix(prefix.as_str())?
            .split_once('/')
            .filter(|(bucket, name)| !bucket.is_empty() && !name.is_empty())
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        let key = self.key.expose_secret();
        request.header("apikey", key).bearer_auth(key)
    }

    async fn send(
        &self,
        operation: &str,
        request: RequestBuilder,
        rejected: fn(String) -> GatewayError,
    ) -> Result<Response, GatewayError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| transport_error(operation, e))?;

        if response.status().is_success() {
            return Ok(response);
        }
        Err(self.failure(operation, response, rejected).await)
    }

    async fn failure(
        &self,
        operation: &str,
        response: Response,
        rejected: fn(String) -> GatewayError,
    ) -> GatewayError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let message = format!("{} returned {}: {}", operation, status, truncate_error_body(&body));
        tracing::warn!(
            operation,
            status = status.as_u16(),
            base_url = %sanitize::redact_url(&self.base_url),
            "Hosted store call failed"
        );
        if is_unavailable_status(status) {
            GatewayError::StorageUnavailable(message)
        } else {
            rejected(message)
        }
    }

    /// PATCHes the row with `id` and fails with `RecordNotFound` when no row
    /// matched.
    async fn patch(&self, operation: &str, id: &str, changes: Value) -> Result<(), GatewayError> {
        let request = self
            .client
            .patch(self.table_url())
            .query(&[("id", format!("eq.{}", id))])
            .header("Prefer", "return=representation")
            .json(&changes);
        let response = self.send(operation, request, GatewayError::WriteRejected).await?;
        if rows(operation, response).await?.is_empty() {
            return Err(GatewayError::RecordNotFound(id.to_string()));
        }
        Ok(())
    }

    fn bucket_known(&self, bucket: &str) -> bool {
        self.known_buckets
            .lock()
            .map(|b| b.contains(bucket))
            .unwrap_or(false)
    }

    fn remember_bucket(&self, bucket: &str) {
        if let Ok(mut buckets) = self.known_buckets.lock() {
            buckets.insert(bucket.to_string());
        }
    }
}

async fn rows(operation: &str, response: Response) -> Result<Vec<AppointmentRow>, GatewayError> {
    response.json::<Vec<AppointmentRow>>().await.map_err(|e| {
        GatewayError::StorageUnavailable(format!(
            "{} returned an unreadable body: {}",
            operation,
            e.without_url()
        ))
    })
}

fn attachment_changes(slot: AttachmentSlot, reference: Option<&str>) -> Value {
    let mut changes = Map::new();
    changes.insert(slot.flag_column().to_string(), Value::Bool(reference.is_some()));
    changes.insert(
        slot.reference_column().to_string(),
        reference.map_or(Value::Null, |r| Value::String(r.to_string())),
    );
    Value::Object(changes)
}

#[async_trait]
impl PersistenceGateway for HostedGateway {
    fn kind(&self) -> &'static str {
        "hosted"
    }

    async fn save(&self, record: &AppointmentRecord) -> Result<String, GatewayError> {
        let row = AppointmentRow::from(record);
        let request = self
            .client
            .post(self.table_url())
            .header("Prefer", "return=representation")
            .json(&[&row]);
        let response = self.send("insert", request, GatewayError::WriteRejected).await?;
        let inserted = rows("insert", response).await?;
        Ok(inserted
            .into_iter()
            .next()
            .map(|r| r.id)
            .unwrap_or(row.id))
    }

    async fn upload_attachment(
        &self,
        blob: &AttachmentUpload,
        filename_hint: &str,
        bucket: &str,
    ) -> Result<String, GatewayError> {
        if !self.bucket_known(bucket) {
            self.ensure_bucket(bucket).await?;
        }

        let name = object_name(filename_hint);
        let request = self
            .client
            .post(self.object_url(bucket, &name))
            .header(reqwest::header::CONTENT_TYPE, content_type_for(blob))
            .header("x-upsert", "false")
            .body(blob.bytes.clone());
        self.send("upload", request, GatewayError::UploadRejected)
            .await?;

        Ok(self.public_url(bucket, &name))
    }

    async fn delete_attachment(&self, reference: &str) -> Result<(), GatewayError> {
        let Some((bucket, name)) = self.object_for(reference) else {
            return Err(GatewayError::BlobNotFound(reference.to_string()));
        };
        let request = self.client.delete(self.object_url(bucket, name));
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| transport_error("delete", e))?;

        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        if status == StatusCode::NOT_FOUND || status == StatusCode::BAD_REQUEST {
            return Err(GatewayError::BlobNotFound(reference.to_string()));
        }
        Err(self.failure("delete", response, GatewayError::UploadRejected).await)
    }

    async fn attach_reference(
        &self,
        id: &str,
        slot: AttachmentSlot,
        reference: &str,
    ) -> Result<(), GatewayError> {
        self.patch("attach_reference", id, attachment_changes(slot, Some(reference)))
            .await
    }

    async fn clear_attachment(&self, id: &str, slot: AttachmentSlot) -> Result<(), GatewayError> {
        self.patch("clear_attachment", id, attachment_changes(slot, None))
            .await
    }

    async fn list_all(&self) -> Result<Vec<AppointmentRecord>, GatewayError> {
        let request = self
            .client
            .get(self.table_url())
            .query(&[("select", "*"), ("order", "created_at.asc")]);
        let response = self.send("list", request, GatewayError::StorageUnavailable).await?;
        rows("list", response)
            .await?
            .into_iter()
            .map(|row| AppointmentRecord::try_from(row).map_err(GatewayError::from))
            .collect()
    }

    async fn get_by_id(&self, id: &str) -> Result<AppointmentRecord, GatewayError> {
        let request = self
            .client
            .get(self.table_url())
            .query(&[("select", "*".to_string()), ("id", format!("eq.{}", id))]);
        let response = self.send("get", request, GatewayError::StorageUnavailable).await?;
        match rows("get", response).await?.into_iter().next() {
            Some(row) => Ok(AppointmentRecord::try_from(row)?),
            None => Err(GatewayError::RecordNotFound(id.to_string())),
        }
    }

    async fn update_status(
        &self,
        id: &str,
        status: AppointmentStatus,
    ) -> Result<(), GatewayError> {
        self.patch("update_status", id, json!({ "status": status.as_str() }))
            .await
    }

    async fn check_connectivity(&self) -> Result<(), GatewayError> {
        let request = self
            .client
            .get(self.table_url())
            .query(&[("select", "id"), ("limit", "1")]);
        self.send("connectivity check", request, GatewayError::StorageUnavailable)
            .await?;
        Ok(())
    }

    async fn ensure_bucket(&self, bucket: &str) -> Result<bool, GatewayError> {
        let lookup = self
            .client
            .get(format!("{}/{}", self.bucket_url(), bucket));
        let response = self
            .authorized(lookup)
            .send()
            .await
            .map_err(|e| transport_error("bucket lookup", e))?;

        let status = response.status();
        if status.is_success() {
            self.remember_bucket(bucket);
            return Ok(false);
        }
        // The storage API answers 400 or 404 for a missing bucket.
        if status != StatusCode::NOT_FOUND && status != StatusCode::BAD_REQUEST {
            return Err(self
                .failure("bucket lookup", response, GatewayError::UploadRejected)
                .await);
        }

        let create = self
            .client
            .post(self.bucket_url())
            .json(&json!({ "id": bucket, "name": bucket, "public": true }));
        self.send("bucket create", create, GatewayError::UploadRejected)
            .await?;

        tracing::info!(bucket, "Created missing bucket");
        self.remember_bucket(bucket);
        Ok(true)
    }
}
