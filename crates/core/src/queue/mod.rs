//! Per-credential rate-limited work queues.
//!
//! All upstream traffic flows through two lanes per credential: a strictly
//! sequential search lane protecting the low-throughput metadata endpoint,
//! and a bounded-parallel download lane with staggered starts. Lanes retry
//! transient failures at the front of their own queue and reject everything
//! else immediately with a classified error.

mod lane;
mod registry;

pub use lane::{JobFn, Lane};
pub use registry::{CredentialQueues, QueueRegistry};
