//! # SDF Generation Queue
//!
//! A single-flight scheduler for remote signed-distance-field generation.
//!
//! Meshes and skinned meshes are converted into compact distance-field representations
//! by a remote compute service. Only one request may be outstanding at a time, payloads
//! must fit the service limits, and an editor or other observer wants live progress with
//! the ability to cancel a whole category of work mid-flight.
//!
//! ## Core Problem Solved
//!
//! - **Single Flight**: Jobs are serviced strictly in acceptance order, one at a time
//! - **Early Rejection**: Oversized meshes and unlicensed submissions never reach the network
//! - **Isolated Failures**: A failed job is reported and the queue moves on
//! - **Category Cancellation**: Mesh and skinned jobs can be aborted independently
//!
//! ## GenerationQueue
//!
//! The queue is a plain owned value driven by an external `tick()` call from any host
//! loop (frame update, timer, tokio task):
//!
//! ```rust,ignore
//! use sdf_generation_queue::core::{GenerationQueue, MeshGeometry, MeshTarget, TargetId};
//! use sdf_generation_queue::infra::{MockNetworkClient, RecordingSink, StaticLicenseGate};
//!
//! let meshes = RecordingSink::default();
//! let mut queue = GenerationQueue::new(
//!     MockNetworkClient::default(),
//!     StaticLicenseGate::available("http://localhost:8080/compute"),
//!     meshes.clone(),
//!     RecordingSink::default(),
//! );
//!
//! queue.enqueue(&MeshTarget::new(TargetId::new(), geometry))?;
//! while queue.is_active() {
//!     if let Some(outcome) = queue.tick() {
//!         println!("{} finished as {:?}", outcome.target, outcome.state);
//!     }
//! }
//! ```
//!
//! ## SharedGenerationQueue - Threaded Hosts
//!
//! Hosts that enqueue from several threads wrap the queue in a
//! `runtime::SharedGenerationQueue` and let a `ThreadTickDriver` or `TokioTickDriver`
//! tick it:
//!
//! ```rust,ignore
//! use sdf_generation_queue::runtime::{SharedGenerationQueue, ThreadTickDriver};
//!
//! let shared = SharedGenerationQueue::new(queue);
//! let _driver = ThreadTickDriver::spawn(shared.clone(), config.tick_interval())?;
//! shared.enqueue(&target)?;
//! ```
//!
//! For complete examples, see:
//! - `tests/queue_scheduling_test.rs` - Scheduling guarantees end to end
//! - `tests/shared_queue_test.rs` - Threaded and tokio drivers

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Payloads, validation, the job state machine and the queue.
pub mod core;
/// Configuration models for queue limits, policy and endpoint.
pub mod config;
/// Builders to construct queues from configuration.
pub mod builders;
/// Bundled collaborators: codec, network clients, license gate and sinks.
pub mod infra;
/// Status snapshots, the shared queue handle and tick drivers.
pub mod runtime;
/// Shared utilities.
pub mod util;
