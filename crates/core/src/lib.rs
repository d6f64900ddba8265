//! Core types and shared functionality for shelter.
//!
//! This crate provides:
//! - Request and response snapshots with normalized request identities
//! - Named cache partitions (SQLite and in-memory) with FIFO eviction bounds
//! - Resource classification
//! - Unified error types
//! - Configuration structures

pub mod cache;
pub mod classify;
pub mod config;
pub mod error;
pub mod request;
pub mod response;

pub use cache::{CacheDb, EvictionEnforcer, MemoryStore, PartitionNames, PartitionStore};
pub use classify::{Classification, Classifier, ResourceClass};
pub use config::{AppConfig, ConfigError};
pub use error::Error;
pub use request::{Destination, Request, RequestIdentity};
pub use response::Response;
