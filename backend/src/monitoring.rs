//! Deployment monitoring
//!
//! Per-deployment outcome records plus the aggregate counters served by
//! the stats endpoint.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const MAX_RECORDS: usize = 1000;

/// Outcome record for one deployment attempt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentRecord {
    pub deployment_id: String,
    pub service_name: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub success: Option<bool>,
    pub error: Option<String>,
}

impl DeploymentRecord {
    pub fn duration_secs(&self) -> Option<f64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds() as f64 / 1000.0)
    }
}

/// Aggregate deployment counters
#[derive(Debug, Clone, Serialize)]
pub struct MonitoringStats {
    pub total_started: u64,
    pub total_succeeded: u64,
    pub total_failed: u64,
    pub active: u64,
    pub avg_duration_secs: Option<f64>,
}

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<String, DeploymentRecord>,
    total_started: u64,
    total_succeeded: u64,
    total_failed: u64,
}

/// Aggregated deployment monitoring service
#[derive(Debug, Default)]
pub struct MonitoringService {
    inner: RwLock<Inner>,
}

impl MonitoringService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start of a deployment attempt
    pub fn record_started(&self, deployment_id: &str, service_name: &str) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());

        if inner.records.len() >= MAX_RECORDS {
            if let Some(oldest_id) = inner
                .records
                .values()
                .min_by_key(|r| r.started_at)
                .map(|r| r.deployment_id.clone())
            {
                inner.records.remove(&oldest_id);
            }
        }

        inner.records.insert(
            deployment_id.to_string(),
            DeploymentRecord {
                deployment_id: deployment_id.to_string(),
                service_name: service_name.to_string(),
                started_at: Utc::now(),
                finished_at: None,
                success: None,
                error: None,
            },
        );
        inner.total_started += 1;
    }

    /// Record the terminal outcome of a deployment attempt
    pub fn record_finished(&self, deployment_id: &str, success: bool, error: Option<&str>) {
        let mut inner = self.inner.write().unwrap_or_else(|e| e.into_inner());

        if success {
            inner.total_succeeded += 1;
        } else {
            inner.total_failed += 1;
        }

        if let Some(record) = inner.records.get_mut(deployment_id) {
            record.finished_at = Some(Utc::now());
            record.success = Some(success);
            record.error = error.map(|e| e.to_string());
        }
    }

    /// Look up one deployment record
    pub fn record(&self, deployment_id: &str) -> Option<DeploymentRecord> {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());
        inner.records.get(deployment_id).cloned()
    }

    /// Aggregate counters for the stats endpoint
    pub fn stats(&self) -> MonitoringStats {
        let inner = self.inner.read().unwrap_or_else(|e| e.into_inner());

        let durations: Vec<f64> = inner
            .records
            .values()
            .filter_map(|r| r.duration_secs())
            .collect();
        let avg_duration_secs = if durations.is_empty() {
            None
        } else {
            Some(durations.iter().sum::<f64>() / durations.len() as f64)
        };

        let active = inner
            .records
            .values()
            .filter(|r| r.finished_at.is_none())
            .count() as u64;

        MonitoringStats {
            total_started: inner.total_started,
            total_succeeded: inner.total_succeeded,
            total_failed: inner.total_failed,
            active,
            avg_duration_secs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_lifecycle() {
        let monitoring = MonitoringService::new();
        monitoring.record_started("dep-abc123def456", "demo");

        let stats = monitoring.stats();
        assert_eq!(stats.total_started, 1);
        assert_eq!(stats.active, 1);

        monitoring.record_finished("dep-abc123def456", true, None);
        let stats = monitoring.stats();
        assert_eq!(stats.total_succeeded, 1);
        assert_eq!(stats.active, 0);
        assert!(stats.avg_duration_secs.is_some());
    }

    #[test]
    fn test_failure_records_error() {
        let monitoring = MonitoringService::new();
        monitoring.record_started("dep-1", "demo");
        monitoring.record_finished("dep-1", false, Some("quota exceeded"));

        let record = monitoring.record("dep-1").unwrap();
        assert_eq!(record.success, Some(false));
        assert_eq!(record.error.as_deref(), Some("quota exceeded"));
        assert_eq!(monitoring.stats().total_failed, 1);
    }
}
