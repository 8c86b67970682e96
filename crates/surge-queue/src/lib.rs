//! surge-queue — bounded admission with backpressure.
//!
//! Request handlers call [`AdmissionQueue::try_admit`] and get an immediate
//! answer: the token is queued, or the queue is at capacity and the caller
//! receives [`QueueError::Full`]. A single [`Drainer`] task removes tokens
//! oldest-first and spends a fixed simulated work duration on each.
//!
//! # Architecture
//!
//! ```text
//! handlers ── try_admit() ──► AdmissionQueue ◄── drain() ── Drainer (tokio task)
//!                               │  Mutex<VecDeque<Token>>     ├── sleep(work_duration) per token
//!                               │  admitted_total counter     └── wait ≤ idle_wait when empty
//!                               └─ Notify wakes the drainer on admission
//! ```

pub mod drain;
pub mod error;
pub mod queue;

pub use drain::Drainer;
pub use error::{QueueError, QueueResult};
pub use queue::{AdmissionQueue, Token};
