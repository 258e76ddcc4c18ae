//! # Keyed Work Queue
//!
//! A bounded, fair, key-partitioned work queue for async services.
//!
//! Every unit of work is submitted under a key (a chat channel, a
//! conversation, a tenant). The queue guarantees that units sharing a key never
//! run at the same time and always run in submission order, while units with
//! different keys run in parallel across a pool of worker loops.
//!
//! ## Key Features
//!
//! - **Per-Key Serialization**: no two units of one key ever overlap
//! - **Admission Control**: `put` blocks once `size_limit` units are pending
//! - **Round-Robin Fairness**: a busy key cannot starve the others
//! - **Failure Isolation**: a panicking unit is logged and contained
//! - **Cooperative Cancellation**: every wait takes a [`core::Context`]; units
//!   get an [`core::Attacher`] to bind their own scope to the worker's lifetime
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use keyed_work_queue::builders::build_queue;
//! use keyed_work_queue::config::QueueConfig;
//! use keyed_work_queue::core::Context;
//! use keyed_work_queue::runtime::TokioSpawner;
//!
//! let root = Context::new();
//! let runtime = build_queue::<String>(
//!     &QueueConfig::from_env()?,
//!     &root,
//!     &TokioSpawner::current(),
//! )?;
//!
//! // One call per inbound chat event.
//! runtime
//!     .queue
//!     .put(&root, event.channel.clone(), move |attach| async move {
//!         let (ctx, _guard) = attach.attach(&event_ctx);
//!         handle_event(&ctx, event).await;
//!     })
//!     .await?;
//!
//! runtime.shutdown().await;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core queue, shared state, cancellation scopes.
pub mod core;
/// Configuration models for the queue and its workers.
pub mod config;
/// Builders to construct a running queue from configuration.
pub mod builders;
/// Runtime adapters for spawning and supervising worker loops.
pub mod runtime;
/// Shared utilities.
pub mod util;
