//! Host CPU and memory sampling.
//!
//! [`ProcSampler`] reads `/proc/stat` and `/proc/meminfo`. CPU usage is the
//! busy share of jiffies elapsed since the previous sample, so the first
//! call after construction reports 0. A source that cannot be read or
//! parsed yields 0 and a warning; sampling never fails outright.

use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use tracing::{debug, warn};

/// Source of host utilisation percentages in `0.0..=100.0`.
pub trait SystemSampler: Send + Sync {
    fn sample_cpu(&self) -> f64;
    fn sample_memory(&self) -> f64;
}

/// Cumulative jiffies from the aggregate `cpu` line of `/proc/stat`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct CpuTimes {
    pub(crate) busy: u64,
    pub(crate) total: u64,
}

/// Samples the local host through procfs.
pub struct ProcSampler {
    stat_path: String,
    meminfo_path: String,
    prev_cpu: Mutex<Option<CpuTimes>>,
    warned: AtomicBool,
}

impl ProcSampler {
    pub fn new() -> Self {
        Self::with_paths("/proc/stat", "/proc/meminfo")
    }

    /// Read from alternate files. Used by tests.
    pub fn with_paths(stat_path: impl Into<String>, meminfo_path: impl Into<String>) -> Self {
        Self {
            stat_path: stat_path.into(),
            meminfo_path: meminfo_path.into(),
            prev_cpu: Mutex::new(None),
            warned: AtomicBool::new(false),
        }
    }

    /// Warn the first time a source is unusable, then drop to debug so a
    /// host without procfs does not flood the log on every scrape.
    fn report_failure(&self, source: &str, reason: &str) {
        if self.warned.swap(true, Ordering::Relaxed) {
            debug!(%source, %reason, "system sample unavailable, reporting 0");
        } else {
            warn!(%source, %reason, "system sample unavailable, reporting 0");
        }
    }
}

impl Default for ProcSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemSampler for ProcSampler {
    fn sample_cpu(&self) -> f64 {
        let content = match fs::read_to_string(&self.stat_path) {
            Ok(c) => c,
            Err(e) => {
                self.report_failure(&self.stat_path, &e.to_string());
                return 0.0;
            }
        };
        let Some(current) = parse_cpu_times(&content) else {
            self.report_failure(&self.stat_path, "no aggregate cpu line");
            return 0.0;
        };

        let mut prev = self.prev_cpu.lock().unwrap_or_else(PoisonError::into_inner);
        let percent = prev.map_or(0.0, |p| cpu_percent(p, current));
        *prev = Some(current);
        percent
    }

    fn sample_memory(&self) -> f64 {
        let content = match fs::read_to_string(&self.meminfo_path) {
            Ok(c) => c,
            Err(e) => {
                self.report_failure(&self.meminfo_path, &e.to_string());
                return 0.0;
            }
        };
        match parse_memory_percent(&content) {
            Some(p) => p,
            None => {
                self.report_failure(&self.meminfo_path, "missing MemTotal or MemAvailable");
                0.0
            }
        }
    }
}

/// Returns constant values. Used where real host load is irrelevant.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedSampler {
    pub cpu: f64,
    pub memory: f64,
}

impl FixedSampler {
    pub fn new(cpu: f64, memory: f64) -> Self {
        Self { cpu, memory }
    }
}

impl SystemSampler for FixedSampler {
    fn sample_cpu(&self) -> f64 {
        self.cpu
    }

    fn sample_memory(&self) -> f64 {
        self.memory
    }
}

/// Parse the aggregate `cpu ` line. Idle time is `idle + iowait`.
pub(crate) fn parse_cpu_times(stat: &str) -> Option<CpuTimes> {
    let line = stat.lines().find(|l| l.starts_with("cpu "))?;
    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .map(|f| f.parse().ok())
        .collect::<Option<_>>()?;
    if fields.len() < 4 {
        return None;
    }

    // user nice system idle iowait irq softirq steal [guest guest_nice]
    // guest time is already folded into user/nice.
    let total: u64 = fields.iter().take(8).sum();
    let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
    Some(CpuTimes {
        busy: total.saturating_sub(idle),
        total,
    })
}

pub(crate) fn cpu_percent(prev: CpuTimes, curr: CpuTimes) -> f64 {
    let total = curr.total.saturating_sub(prev.total);
    if total == 0 {
        return 0.0;
    }
    let busy = curr.busy.saturating_sub(prev.busy);
    (busy as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}

/// `(MemTotal - MemAvailable) / MemTotal` as a percentage.
pub(crate) fn parse_memory_percent(meminfo: &str) -> Option<f64> {
    let mut total = None;
    let mut available = None;

    for line in meminfo.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let kb = value
            .split_whitespace()
            .next()
            .and_then(|v| v.parse::<u64>().ok());
        match key.trim() {
            "MemTotal" => total = kb,
            "MemAvailable" => available = kb,
            _ => {}
        }
    }

    let total = total.filter(|&t| t > 0)?;
    let used = total.saturating_sub(available?);
    Some(used as f64 / total as f64 * 100.0)
}
