//! Test harness wiring a `BookingService` to an isolated store.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{NaiveDate, NaiveDateTime};
use tempfile::TempDir;

use booking::config::BucketConfig;
use booking::gateway::{LocalGateway, MemoryGateway, PersistenceGateway};
use booking::model::AppointmentRequest;
use booking::service::{BookingService, SubmissionReceipt, SubmitError};
use booking::validation::FormRules;

use super::faulty::{FaultyGateway, Faults};

/// Monday 2026-05-04, 09:00 local time.
pub fn fixed_now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 5, 4)
        .and_then(|d| d.and_hms_opt(9, 0, 0))
        .expect("valid fixed date")
}

pub struct TestHarness {
    pub service: BookingService,
    /// Set for memory-backed harnesses, for fault injection and inspection.
    pub memory: Option<Arc<MemoryGateway>>,
    /// Set for local-backed harnesses.
    pub local: Option<Arc<LocalGateway>>,
    temp_dir: Option<TempDir>,
}

impl TestHarness {
    /// Memory store, default rules.
    pub fn memory() -> Self {
        Self::memory_with_rules(FormRules::default())
    }

    pub fn memory_with_rules(rules: FormRules) -> Self {
        let memory = Arc::new(MemoryGateway::new());
        let gateway: Arc<dyn PersistenceGateway> = memory.clone();
        Self {
            service: BookingService::with_rules(
                gateway,
                rules,
                BucketConfig::default(),
                Duration::from_secs(5),
            ),
            memory: Some(memory),
            local: None,
            temp_dir: None,
        }
    }

    /// Memory store behind a [`FaultyGateway`]. `memory` points at the
    /// undisturbed inner store for inspection.
    pub fn faulty(faults: Faults) -> Self {
        let memory = Arc::new(MemoryGateway::new());
        let gateway: Arc<dyn PersistenceGateway> =
            Arc::new(FaultyGateway::new(memory.clone(), faults));
        Self {
            service: BookingService::with_rules(
                gateway,
                FormRules::default(),
                BucketConfig::default(),
                Duration::from_secs(5),
            ),
            memory: Some(memory),
            local: None,
            temp_dir: None,
        }
    }

    /// SQLite file and blob directory in a fresh temp dir.
    pub fn local() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let gateway = Arc::new(
            LocalGateway::open(
                &temp_dir.path().join("data").join("booking.db"),
                &temp_dir.path().join("uploads"),
            )
            .expect("Failed to open local store"),
        );
        let dyn_gateway: Arc<dyn PersistenceGateway> = gateway.clone();
        Self {
            service: BookingService::with_rules(
                dyn_gateway,
                FormRules::default(),
                BucketConfig::default(),
                Duration::from_secs(5),
            ),
            memory: None,
            local: Some(gateway),
            temp_dir: Some(temp_dir),
        }
    }

    pub fn memory_gateway(&self) -> &MemoryGateway {
        self.memory.as_deref().expect("not a memory harness")
    }

    pub fn local_gateway(&self) -> &LocalGateway {
        self.local.as_deref().expect("not a local harness")
    }

    pub async fn submit(
        &self,
        request: AppointmentRequest,
    ) -> Result<SubmissionReceipt, SubmitError> {
        self.service.submit_at(request, fixed_now()).await
    }
}
