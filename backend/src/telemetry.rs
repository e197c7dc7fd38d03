//! Runtime metrics for the stats endpoint

use serde::{Deserialize, Serialize};
use sysinfo::{Pid, System};

/// Host and process metrics reported by `/stats`.
///
/// Memory figures are bytes; `cpu_usage` and `memory_percent` are 0-100.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemMetrics {
    pub cpu_usage: f32,
    pub cpu_count: usize,
    pub memory_used: u64,
    pub memory_total: u64,
    pub memory_percent: f32,
    /// Resident memory of the backend process itself
    pub process_memory: u64,
    pub uptime_secs: u64,
    pub hostname: String,
}

/// Take one metrics sample
pub fn collect_metrics() -> SystemMetrics {
    let mut sys = System::new_all();
    sys.refresh_all();

    let memory_total = sys.total_memory();
    let memory_used = sys.used_memory();
    let memory_percent = match memory_total {
        0 => 0.0,
        total => memory_used as f32 * 100.0 / total as f32,
    };

    SystemMetrics {
        cpu_usage: sys.global_cpu_usage(),
        cpu_count: sys.cpus().len(),
        memory_used,
        memory_total,
        memory_percent,
        process_memory: sys
            .process(Pid::from_u32(std::process::id()))
            .map(|p| p.memory())
            .unwrap_or(0),
        uptime_secs: System::uptime(),
        hostname: System::host_name().unwrap_or_else(|| "unknown".to_string()),
    }
}
