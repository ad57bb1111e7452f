use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::NaiveTime;

use crate::config::schema::{BookingConfig, StoreConfig};
use crate::error::ConfigError;
use crate::model::TIME_FORMAT;

const SCHEMA_JSON: &str = include_str!("../../../../schema/config-v1.json");

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<BookingConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<BookingConfig, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: BookingConfig = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

/// Returns the default config location: `~/.booking/config.json`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".booking").join("config.json"))
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &BookingConfig) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.store_timeout_secs == 0 {
        return Err(ConfigError::Validation {
            message: "storeTimeoutSecs must be greater than 0".to_string(),
        });
    }

    if let StoreConfig::Hosted(hosted) = &config.store {
        if !(hosted.url.starts_with("http://") || hosted.url.starts_with("https://")) {
            return Err(ConfigError::Validation {
                message: format!("Store URL must be http(s): {}", hosted.url),
            });
        }
        if hosted.table.trim().is_empty() {
            return Err(ConfigError::Validation {
                message: "Store table name cannot be empty".to_string(),
            });
        }
    }

    validate_bucket_name(&config.buckets.primary)?;
    validate_bucket_name(&config.buckets.secondary)?;
    if config.buckets.primary == config.buckets.secondary {
        return Err(ConfigError::InvalidBucket {
            name: config.buckets.secondary.clone(),
            reason: "Primary and secondary buckets must differ".to_string(),
        });
    }

    let form = &config.form;
    if form.appointment_types.is_empty() {
        return Err(ConfigError::Validation {
            message: "At least one appointment type is required".to_string(),
        });
    }

    let mut seen_slots = HashSet::new();
    for slot in &form.time_slots {
        let parsed = NaiveTime::parse_from_str(slot.trim(), TIME_FORMAT).map_err(|e| {
            ConfigError::InvalidTimeSlot {
                value: slot.clone(),
                reason: e.to_string(),
            }
        })?;
        if !seen_slots.insert(parsed) {
            return Err(ConfigError::InvalidTimeSlot {
                value: slot.clone(),
                reason: "Duplicate time slot".to_string(),
            });
        }
    }
    if seen_slots.is_empty() {
        return Err(ConfigError::Validation {
            message: "At least one time slot is required".to_string(),
        });
    }

    if form.phone_digits.min == 0 || form.phone_digits.min > form.phone_digits.max {
        return Err(ConfigError::Validation {
            message: format!(
                "Invalid phone digit bounds: min {} / max {}",
                form.phone_digits.min, form.phone_digits.max
            ),
        });
    }

    if form.booking_horizon_days == 0 {
        return Err(ConfigError::Validation {
            message: "bookingHorizonDays must be at least 1".to_string(),
        });
    }

    Ok(())
}

fn validate_bucket_name(name: &str) -> Result<(), ConfigError> {
    let invalid = |reason: &str| ConfigError::InvalidBucket {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.trim().is_empty() {
        return Err(invalid("Bucket name cannot be empty"));
    }
    if name.contains('/') || name.contains('\\') || name.contains("..") {
        return Err(invalid("Bucket name cannot contain path separators or '..'"));
    }
    Ok(())
}
