use std::time::Duration;
#[cfg(feature = "cli")]
use std::{sync::Mutex, time::Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessRefreshKind, ProcessesToUpdate, System};

/// 每秒載入城市數；耗時為零時回傳 0。
pub fn cities_per_second(cities: usize, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        cities as f64 / secs
    } else {
        0.0
    }
}

/// 單一載入階段的行程快照。
#[cfg(feature = "cli")]
#[derive(Debug, Clone)]
pub struct LoadStats {
    pub cpu_usage: f32,
    pub memory_mb: u64,
    pub peak_memory_mb: u64,
    pub elapsed: Duration,
}

/// 載入資料集時的行程資源監控 (CPU / 記憶體)。只刷新本行程。
#[cfg(feature = "cli")]
pub struct SystemMonitor {
    system: Mutex<System>,
    pid: Option<Pid>,
    started: Instant,
    peak_memory_mb: Mutex<u64>,
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    pub fn new(enabled: bool) -> Self {
        let pid = if enabled {
            sysinfo::get_current_pid()
                .map_err(|e| tracing::warn!("⚠️  System monitoring unavailable: {}", e))
                .ok()
        } else {
            None
        };

        Self {
            system: Mutex::new(System::new()),
            pid,
            started: Instant::now(),
            peak_memory_mb: Mutex::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.pid.is_some()
    }

    pub fn snapshot(&self) -> Option<LoadStats> {
        let pid = self.pid?;
        let mut system = self.system.lock().ok()?;
        system.refresh_processes_specifics(
            ProcessesToUpdate::Some(&[pid]),
            true,
            ProcessRefreshKind::nothing().with_cpu().with_memory(),
        );

        let process = system.process(pid)?;
        let memory_mb = process.memory() / 1024 / 1024;

        let mut peak = self.peak_memory_mb.lock().ok()?;
        *peak = (*peak).max(memory_mb);

        Some(LoadStats {
            cpu_usage: process.cpu_usage(),
            memory_mb,
            peak_memory_mb: *peak,
            elapsed: self.started.elapsed(),
        })
    }

    pub fn log_stats(&self, phase: &str) {
        if let Some(stats) = self.snapshot() {
            tracing::info!(
                "📊 {} - CPU: {:.1}%, Memory: {}MB, Peak: {}MB, Time: {:?}",
                phase,
                stats.cpu_usage,
                stats.memory_mb,
                stats.peak_memory_mb,
                stats.elapsed
            );
        }
    }

    pub fn log_final_stats(&self, cities: usize) {
        if let Some(stats) = self.snapshot() {
            tracing::info!(
                "📊 Load finished - {} cities in {:?} ({:.0} cities/s), Peak Memory: {}MB",
                cities,
                stats.elapsed,
                cities_per_second(cities, stats.elapsed),
                stats.peak_memory_mb
            );
        }
    }
}

#[cfg(feature = "cli")]
impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new(false)
    }
}

// 非 CLI 建置時的空實現
#[cfg(not(feature = "cli"))]
#[derive(Default)]
pub struct SystemMonitor;

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new(_enabled: bool) -> Self {
        Self
    }

    pub fn is_enabled(&self) -> bool {
        false
    }

    pub fn log_stats(&self, _phase: &str) {}

    pub fn log_final_stats(&self, _cities: usize) {}
}
