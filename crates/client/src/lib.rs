//! Client side of shelter.
//!
//! This crate provides the live fetch pipeline, the per-class caching
//! strategies, the install/activate lifecycle and the notification and sync
//! entry points used by the server.

pub mod events;
pub mod fetch;
pub mod lifecycle;
pub mod strategy;

#[cfg(test)]
mod testing;

pub use events::{Notification, Notifier, SyncHook, handle_notification_click, handle_push, handle_sync};
pub use fetch::{FetchClient, FetchConfig, Network};
pub use lifecycle::{
    ActivationReport, ClientController, ClientInfo, ClientRegistry, ControlMessage, ControlOutcome, InstallReport,
    LifecycleManager, LifecycleState,
};
pub use strategy::{StrategyConfig, StrategyRouter};
