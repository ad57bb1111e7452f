use std::path::PathBuf;
use thiserror::Error;

use crate::secrets::SecretError;

#[derive(Error, Debug)]
pub enum BookingError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Gateway(#[from] crate::gateway::GatewayError),

    #[error("Submission failed: {0}")]
    Submit(#[from] crate::service::SubmitError),

    #[error("Admin error: {0}")]
    Admin(#[from] crate::admin::AdminError),

    #[error("Logging error: {0}")]
    Logging(#[from] crate::logging::LoggingError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Invalid time slot '{value}': {reason}")]
    InvalidTimeSlot { value: String, reason: String },

    #[error("Invalid bucket '{name}': {reason}")]
    InvalidBucket { name: String, reason: String },

    #[error("Secret resolution failed: {0}")]
    Secret(#[from] SecretError),
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to create directory '{path}': {source}")]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to remove file '{path}': {source}")]
    RemoveFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid bucket name: {0}")]
    InvalidBucket(String),

    #[error("Bucket does not exist: {0}")]
    UnknownBucket(String),

    #[error("File already exists: {0}")]
    FileExists(PathBuf),
}

pub type Result<T> = std::result::Result<T, BookingError>;
