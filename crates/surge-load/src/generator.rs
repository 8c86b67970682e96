//! Load workers and their bookkeeping.

use std::hint::black_box;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tokio::sync::watch;
use tracing::{debug, info};

use surge_core::LoadConfig;

use crate::error::LoadResult;

/// Longest a sleeping memory worker goes without checking for shutdown.
const SHUTDOWN_POLL: Duration = Duration::from_millis(10);

/// Live counters shared with every worker.
#[derive(Debug, Default)]
struct LoadStats {
    cpu_workers: AtomicUsize,
    memory_workers: AtomicUsize,
    memory_bytes: AtomicU64,
}

/// Decrements a worker count when the worker exits, however it exits.
struct WorkerGuard<'a>(&'a AtomicUsize);

impl<'a> WorkerGuard<'a> {
    fn enter(count: &'a AtomicUsize) -> Self {
        count.fetch_add(1, Ordering::Relaxed);
        Self(count)
    }
}

impl Drop for WorkerGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Starts CPU and memory workers bound to one shutdown signal.
#[derive(Clone)]
pub struct LoadGenerator {
    config: LoadConfig,
    shutdown: watch::Receiver<bool>,
    stats: Arc<LoadStats>,
}

impl LoadGenerator {
    pub fn new(config: LoadConfig, shutdown: watch::Receiver<bool>) -> Self {
        Self {
            config,
            shutdown,
            stats: Arc::new(LoadStats::default()),
        }
    }

    /// Start one CPU-bound worker thread.
    pub fn start_cpu(&self) -> LoadResult<thread::JoinHandle<()>> {
        let shutdown = self.shutdown.clone();
        let stats = self.stats.clone();
        let batch = self.config.cpu_batch;

        let handle = thread::Builder::new()
            .name("surge-cpu-load".to_string())
            .spawn(move || {
                let _guard = WorkerGuard::enter(&stats.cpu_workers);
                info!(batch, "cpu load worker started");

                while !stopping(&shutdown) {
                    black_box(burn(batch));
                }

                info!("cpu load worker stopped");
            })?;
        Ok(handle)
    }

    /// Start one memory-growth worker thread.
    ///
    /// Blocks are retained until shutdown, then released together.
    pub fn start_memory(&self) -> LoadResult<thread::JoinHandle<()>> {
        let shutdown = self.shutdown.clone();
        let stats = self.stats.clone();
        let chunk = self.config.memory_chunk_bytes;
        let interval = self.config.memory_interval;

        let handle = thread::Builder::new()
            .name("surge-memory-load".to_string())
            .spawn(move || {
                let _guard = WorkerGuard::enter(&stats.memory_workers);
                info!(
                    chunk_bytes = chunk,
                    interval_ms = interval.as_millis() as u64,
                    "memory load worker started"
                );

                let mut held: Vec<Vec<u8>> = Vec::new();
                while !stopping(&shutdown) {
                    // Non-zero fill so every page is actually committed.
                    held.push(vec![1u8; chunk]);
                    stats.memory_bytes.fetch_add(chunk as u64, Ordering::Relaxed);
                    debug!(blocks = held.len(), "memory load grew");

                    if wait_for_shutdown(&shutdown, interval) {
                        break;
                    }
                }

                let released: u64 = held.iter().map(|b| b.len() as u64).sum();
                drop(held);
                stats.memory_bytes.fetch_sub(released, Ordering::Relaxed);
                info!(released_bytes = released, "memory load worker stopped");
            })?;
        Ok(handle)
    }

    /// CPU workers currently running.
    pub fn cpu_workers(&self) -> usize {
        self.stats.cpu_workers.load(Ordering::Relaxed)
    }

    /// Memory workers currently running.
    pub fn memory_workers(&self) -> usize {
        self.stats.memory_workers.load(Ordering::Relaxed)
    }

    /// Bytes currently held across all memory workers.
    pub fn memory_bytes(&self) -> u64 {
        self.stats.memory_bytes.load(Ordering::Relaxed)
    }
}

/// True once shutdown is signalled or its sender is gone.
fn stopping(shutdown: &watch::Receiver<bool>) -> bool {
    let stop = *shutdown.borrow();
    stop || shutdown.has_changed().is_err()
}

/// Sleep for `interval` in short steps. Returns true if shutdown arrived first.
fn wait_for_shutdown(shutdown: &watch::Receiver<bool>, interval: Duration) -> bool {
    let deadline = Instant::now() + interval;
    loop {
        if stopping(shutdown) {
            return true;
        }
        let now = Instant::now();
        if now >= deadline {
            return false;
        }
        thread::sleep((deadline - now).min(SHUTDOWN_POLL));
    }
}

/// Sum of `i * i` for `i` in `0..batch`.
fn burn(batch: u64) -> u64 {
    (0..batch).fold(0u64, |acc, i| acc.wrapping_add(i.wrapping_mul(i)))
}
