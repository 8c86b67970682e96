//! surge-load — synthetic host load for exercising an autoscaler.
//!
//! Each worker runs until the shared shutdown signal flips; there is no
//! per-worker stop and no ceiling on how many can be started.
//!
//! - CPU workers are dedicated OS threads that square integers in a tight
//!   loop.
//! - Memory workers are dedicated OS threads that allocate and touch a
//!   fixed-size block every interval and never free it while running.
//!
//! Neither kind runs on the async runtime, so a large fill never stalls
//! request handling or scrapes.

pub mod error;
pub mod generator;

pub use error::{LoadError, LoadResult};
pub use generator::LoadGenerator;
