//! Password-gated admin view over stored appointments.

use std::collections::BTreeMap;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::config::AdminConfig;
use crate::gateway::GatewayError;
use crate::model::{AppointmentRecord, AppointmentStatus, AttachmentSlot};
use crate::secrets::SecretError;
use crate::service::BookingService;

#[derive(Error, Debug)]
pub enum AdminError {
    #[error("Admin access is not configured")]
    NotConfigured,

    #[error("Incorrect password")]
    IncorrectPassword,

    #[error("Could not load the admin password: {0}")]
    Secret(#[from] SecretError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Holds the static admin password. Without one, nothing unlocks.
pub struct AdminGate {
    password: Option<SecretString>,
}

impl AdminGate {
    pub fn new(password: Option<SecretString>) -> Self {
        Self {
            password: password.filter(|p| !p.expose_secret().is_empty()),
        }
    }

    pub fn from_config(config: &AdminConfig) -> Result<Self, AdminError> {
        Ok(Self::new(config.resolve_password()?))
    }

    pub fn is_configured(&self) -> bool {
        self.password.is_some()
    }

    pub fn unlock<'a>(
        &self,
        service: &'a BookingService,
        attempt: &str,
    ) -> Result<AdminSession<'a>, AdminError> {
        let password = self.password.as_ref().ok_or(AdminError::NotConfigured)?;
        if !constant_time_eq(attempt.as_bytes(), password.expose_secret().as_bytes()) {
            tracing::warn!("Admin unlock attempt with a wrong password");
            return Err(AdminError::IncorrectPassword);
        }
        tracing::info!("Admin session unlocked");
        Ok(AdminSession { service })
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// An unlocked admin view. Every call goes through the service, so store
/// timeouts apply.
pub struct AdminSession<'a> {
    service: &'a BookingService,
}

impl AdminSession<'_> {
    pub async fn list_appointments(&self) -> Result<Vec<AppointmentRecord>, AdminError> {
        Ok(self.service.list_appointments().await?)
    }

    pub async fn appointment(&self, id: &str) -> Result<AppointmentRecord, AdminError> {
        Ok(self.service.appointment(id).await?)
    }

    pub async fn set_status(&self, id: &str, status: AppointmentStatus) -> Result<(), AdminError> {
        Ok(self.service.update_status(id, status).await?)
    }

    pub async fn remove_attachment(&self, id: &str, slot: AttachmentSlot) -> Result<(), AdminError> {
        Ok(self.service.remove_attachment(id, slot).await?)
    }

    /// Record count per status. Every status is present, zero included.
    pub async fn status_summary(&self) -> Result<BTreeMap<AppointmentStatus, usize>, AdminError> {
        let mut summary: BTreeMap<AppointmentStatus, usize> =
            AppointmentStatus::ALL.iter().map(|s| (*s, 0)).collect();
        for record in self.service.list_appointments().await? {
            *summary.entry(record.status).or_default() += 1;
        }
        Ok(summary)
    }
}
