use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::{AppointmentType, TIME_FORMAT};
use crate::secrets::{expand_home, resolve_secret, resolve_secret_optional, SecretError};
use crate::validation::standard_time_slots;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingConfig {
    pub version: String,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default = "default_store_timeout_secs")]
    pub store_timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default)]
    pub buckets: BucketConfig,
    #[serde(default)]
    pub form: FormConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_store_timeout_secs() -> u64 {
    30
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            store: StoreConfig::default(),
            store_timeout_secs: default_store_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
            buckets: BucketConfig::default(),
            form: FormConfig::default(),
            admin: AdminConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl BookingConfig {
    /// Upper bound for a single store call.
    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.store_timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Which backend holds records and attachments.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreConfig {
    /// Process-local, lost on exit. Meant for tests and demos.
    Memory,
    /// SQLite file plus one directory per bucket.
    Local(LocalStoreConfig),
    /// Hosted table + object storage REST API.
    Hosted(HostedStoreConfig),
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig::Local(LocalStoreConfig::default())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalStoreConfig {
    #[serde(default)]
    pub database_path: Option<String>,
    #[serde(default)]
    pub blob_directory: Option<String>,
}

impl LocalStoreConfig {
    /// Configured database path, or `~/.booking/data/booking.db`.
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.database_path {
            Some(path) => Ok(PathBuf::from(expand_home(path))),
            None => crate::db::default_database_path().ok_or_else(no_home_directory),
        }
    }

    /// Configured blob directory, or `~/.booking/uploads`.
    pub fn blob_directory(&self) -> Result<PathBuf, ConfigError> {
        match &self.blob_directory {
            Some(path) => Ok(PathBuf::from(expand_home(path))),
            None => crate::storage::default_blob_directory().ok_or_else(no_home_directory),
        }
    }
}

fn no_home_directory() -> ConfigError {
    ConfigError::Validation {
        message: "Could not determine the home directory; set the store paths explicitly"
            .to_string(),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostedStoreConfig {
    pub url: String,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub key_file: Option<String>,
    #[serde(default = "default_key_env_var")]
    pub key_env_var: Option<String>,
    #[serde(default = "default_table")]
    pub table: String,
}

fn default_key_env_var() -> Option<String> {
    Some("BOOKING_STORE_KEY".to_string())
}

fn default_table() -> String {
    "appointments".to_string()
}

impl HostedStoreConfig {
    /// Resolves the access key from the direct value, file or env var.
    pub fn resolve_key(&self) -> Result<SecretString, SecretError> {
        resolve_secret(
            self.key.as_deref(),
            self.key_file.as_deref(),
            self.key_env_var.as_deref(),
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketConfig {
    #[serde(default = "default_primary_bucket")]
    pub primary: String,
    #[serde(default = "default_secondary_bucket")]
    pub secondary: String,
}

fn default_primary_bucket() -> String {
    "uploads".to_string()
}

fn default_secondary_bucket() -> String {
    "secondary_uploads".to_string()
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self {
            primary: default_primary_bucket(),
            secondary: default_secondary_bucket(),
        }
    }
}

impl BucketConfig {
    pub fn for_slot(&self, slot: crate::model::AttachmentSlot) -> &str {
        match slot {
            crate::model::AttachmentSlot::Primary => &self.primary,
            crate::model::AttachmentSlot::Secondary => &self.secondary,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormConfig {
    #[serde(default = "default_appointment_types")]
    pub appointment_types: Vec<AppointmentType>,
    #[serde(default = "default_time_slots")]
    pub time_slots: Vec<String>,
    #[serde(default = "default_max_attachment_bytes")]
    pub max_attachment_bytes: u64,
    #[serde(default = "default_booking_horizon_days")]
    pub booking_horizon_days: u32,
    #[serde(default = "default_lead_time_minutes")]
    pub lead_time_minutes: u32,
    #[serde(default)]
    pub phone_digits: PhoneDigits,
    #[serde(default)]
    pub intern_track_enabled: bool,
}

fn default_appointment_types() -> Vec<AppointmentType> {
    AppointmentType::ALL.to_vec()
}

fn default_time_slots() -> Vec<String> {
    standard_time_slots()
        .iter()
        .map(|t| t.format(TIME_FORMAT).to_string())
        .collect()
}

fn default_max_attachment_bytes() -> u64 {
    crate::validation::fields::DEFAULT_MAX_ATTACHMENT_BYTES
}

fn default_booking_horizon_days() -> u32 {
    90
}

fn default_lead_time_minutes() -> u32 {
    15
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            appointment_types: default_appointment_types(),
            time_slots: default_time_slots(),
            max_attachment_bytes: default_max_attachment_bytes(),
            booking_horizon_days: default_booking_horizon_days(),
            lead_time_minutes: default_lead_time_minutes(),
            phone_digits: PhoneDigits::default(),
            intern_track_enabled: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PhoneDigits {
    pub min: usize,
    pub max: usize,
}

impl Default for PhoneDigits {
    fn default() -> Self {
        Self { min: 10, max: 15 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminConfig {
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub password_file: Option<String>,
    #[serde(default = "default_password_env_var")]
    pub password_env_var: Option<String>,
}

fn default_password_env_var() -> Option<String> {
    Some("BOOKING_ADMIN_PASSWORD".to_string())
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            password: None,
            password_file: None,
            password_env_var: default_password_env_var(),
        }
    }
}

impl AdminConfig {
    /// `Ok(None)` when no source is configured at all.
    ///
    /// An env var source that is configured but unset also counts as "not
    /// configured", so the default `BOOKING_ADMIN_PASSWORD` stays optional.
    pub fn resolve_password(&self) -> Result<Option<SecretString>, SecretError> {
        match resolve_secret_optional(
            self.password.as_deref(),
            self.password_file.as_deref(),
            self.password_env_var.as_deref(),
        ) {
            Err(SecretError::EnvVarNotSet { .. }) => Ok(None),
            other => other,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}
