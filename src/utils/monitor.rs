#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};
#[cfg(feature = "cli")]
use std::sync::{Arc, Mutex};
#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Disks, Pid, RefreshKind, System};

#[cfg(feature = "cli")]
#[derive(Debug, Clone)]
pub struct RunStats {
    pub memory_usage_mb: u64,
    pub peak_memory_mb: u64,
    pub disk_available_mb: Option<u64>,
    pub elapsed_time: Duration,
}

#[cfg(feature = "cli")]
pub struct RunMonitor {
    system: Arc<Mutex<System>>,
    pid: Option<Pid>,
    start_time: Instant,
    peak_memory: Arc<Mutex<u64>>,
    download_dir: PathBuf,
    enabled: bool,
}

#[cfg(feature = "cli")]
impl RunMonitor {
    pub fn new(enabled: bool, download_dir: impl Into<PathBuf>) -> Self {
        let mut system = System::new_with_specifics(RefreshKind::everything());
        system.refresh_all();

        Self {
            system: Arc::new(Mutex::new(system)),
            pid: sysinfo::get_current_pid().ok(),
            start_time: Instant::now(),
            peak_memory: Arc::new(Mutex::new(0)),
            download_dir: download_dir.into(),
            enabled,
        }
    }

    pub fn get_stats(&self) -> Option<RunStats> {
        if !self.enabled {
            return None;
        }

        let mut system = self.system.lock().ok()?;
        system.refresh_all();

        let memory_mb = self
            .pid
            .and_then(|pid| system.process(pid))
            .map(|process| process.memory() / 1024 / 1024)
            .unwrap_or(0);

        let mut peak = self.peak_memory.lock().ok()?;
        if memory_mb > *peak {
            *peak = memory_mb;
        }

        Some(RunStats {
            memory_usage_mb: memory_mb,
            peak_memory_mb: *peak,
            disk_available_mb: available_space_mb(&self.download_dir),
            elapsed_time: self.start_time.elapsed(),
        })
    }

    pub fn log_stats(&self, phase: &str) {
        if let Some(stats) = self.get_stats() {
            let disk = stats
                .disk_available_mb
                .map(|mb| format!("{}MB free", mb))
                .unwrap_or_else(|| "unknown".to_string());
            tracing::info!(
                "📊 {} - Memory: {}MB, Peak: {}MB, Disk: {}, Uptime: {:?}",
                phase,
                stats.memory_usage_mb,
                stats.peak_memory_mb,
                disk,
                stats.elapsed_time
            );
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// 找出包含下載目錄的磁碟 (掛載點最長者)
#[cfg(feature = "cli")]
fn available_space_mb(dir: &Path) -> Option<u64> {
    let dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    let disks = Disks::new_with_refreshed_list();
    disks
        .list()
        .iter()
        .filter(|disk| dir.starts_with(disk.mount_point()))
        .max_by_key(|disk| disk.mount_point().as_os_str().len())
        .map(|disk| disk.available_space() / 1024 / 1024)
}

#[cfg(feature = "cli")]
impl Default for RunMonitor {
    fn default() -> Self {
        Self::new(false, PathBuf::new())
    }
}

// 為非CLI環境提供空實現
#[cfg(not(feature = "cli"))]
pub struct RunMonitor;

#[cfg(not(feature = "cli"))]
impl RunMonitor {
    pub fn new(_enabled: bool, _download_dir: impl Into<std::path::PathBuf>) -> Self {
        Self
    }

    pub fn log_stats(&self, _phase: &str) {}

    pub fn is_enabled(&self) -> bool {
        false
    }
}

#[cfg(not(feature = "cli"))]
impl Default for RunMonitor {
    fn default() -> Self {
        Self
    }
}
