#[cfg(feature = "cli")]
use std::sync::Mutex;
#[cfg(feature = "cli")]
use std::time::{Duration, Instant};
#[cfg(feature = "cli")]
use sysinfo::{Pid, ProcessesToUpdate, System};

/// 以名稱辨識的瀏覽器與 driver 行程
#[cfg(feature = "cli")]
const BROWSER_PROCESS_MARKERS: &[&str] = &[
    "chrome",
    "chromium",
    "firefox",
    "msedge",
    "safari",
    "chromedriver",
    "geckodriver",
    "msedgedriver",
];

#[cfg(feature = "cli")]
pub fn is_browser_process(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    BROWSER_PROCESS_MARKERS.iter().any(|m| name.contains(m))
}

/// 一次取樣：本行程與所有瀏覽器行程的資源用量
#[cfg(feature = "cli")]
#[derive(Debug, Clone, Default)]
pub struct ResourceSample {
    pub own_memory_mb: u64,
    pub browser_memory_mb: u64,
    pub browser_processes: usize,
    pub elapsed: Duration,
}

#[cfg(feature = "cli")]
struct SamplerState {
    system: System,
    peak_browser_memory_mb: u64,
    peak_browser_processes: usize,
}

/// 追蹤分批截圖時瀏覽器行程的數量與記憶體，用來發現沒關掉的 session
#[cfg(feature = "cli")]
pub struct SystemMonitor {
    state: Mutex<SamplerState>,
    pid: Option<Pid>,
    started: Instant,
}

#[cfg(feature = "cli")]
impl SystemMonitor {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SamplerState {
                system: System::new(),
                peak_browser_memory_mb: 0,
                peak_browser_processes: 0,
            }),
            pid: sysinfo::get_current_pid().ok(),
            started: Instant::now(),
        }
    }

    pub fn sample(&self) -> Option<ResourceSample> {
        let mut state = self.state.lock().ok()?;
        state.system.refresh_processes(ProcessesToUpdate::All, true);

        let mut sample = ResourceSample {
            elapsed: self.started.elapsed(),
            ..ResourceSample::default()
        };
        for (pid, process) in state.system.processes() {
            let memory_mb = process.memory() / 1024 / 1024;
            if Some(*pid) == self.pid {
                sample.own_memory_mb = memory_mb;
            } else if is_browser_process(&process.name().to_string_lossy()) {
                sample.browser_processes += 1;
                sample.browser_memory_mb += memory_mb;
            }
        }

        state.peak_browser_memory_mb = state.peak_browser_memory_mb.max(sample.browser_memory_mb);
        state.peak_browser_processes = state.peak_browser_processes.max(sample.browser_processes);
        Some(sample)
    }

    pub fn log_chunk(&self, chunk_no: usize) {
        if let Some(sample) = self.sample() {
            tracing::info!(
                "📊 Chunk {} completed - browser processes: {} ({}MB), twinshot: {}MB, elapsed: {:?}",
                chunk_no,
                sample.browser_processes,
                sample.browser_memory_mb,
                sample.own_memory_mb,
                sample.elapsed
            );
        }
    }

    pub fn log_final(&self) {
        let Some(sample) = self.sample() else {
            return;
        };
        let Ok(state) = self.state.lock() else {
            return;
        };
        tracing::info!(
            "📊 Run finished in {:?} - peak browser processes: {}, peak browser memory: {}MB, still running: {}",
            sample.elapsed,
            state.peak_browser_processes,
            state.peak_browser_memory_mb,
            sample.browser_processes
        );
    }
}

#[cfg(feature = "cli")]
impl Default for SystemMonitor {
    fn default() -> Self {
        Self::new()
    }
}

// 非 CLI 建置時沒有 sysinfo，只保留介面
#[cfg(not(feature = "cli"))]
#[derive(Default)]
pub struct SystemMonitor;

#[cfg(not(feature = "cli"))]
impl SystemMonitor {
    pub fn new() -> Self {
        Self
    }

    pub fn log_chunk(&self, _chunk_no: usize) {}

    pub fn log_final(&self) {}
}
