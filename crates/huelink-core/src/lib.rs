//! State synchronization core between `huelink-api` and bridge consumers.
//!
//! This crate keeps a local picture of a Hue bridge's lights, sensors and
//! groups in step with the bridge, and carries writes back to it:
//!
//! - **[`Controller`]**: Owns one bridge connection. [`start()`](Controller::start)
//!   spawns two fixed-delay poll jobs (lights + groups, sensors) that drive
//!   the connection state machine: resume, pair, re-authenticate, or report
//!   the bridge offline.
//!
//! - **[`DataStore`]**: Per-kind `DashMap` caches with `watch` snapshots,
//!   plus the per-entity [`StatusListener`] registry. Each poll reconciles
//!   the fetched entities against the cache and notifies listeners, the
//!   [`DiscoveryListener`], and [`BridgeEvent`] subscribers.
//!
//! - **[`Command`]**: Light, group and sensor writes, each dispatched on
//!   its own task. A [`PollBypass`] window keeps polls from clobbering
//!   state the bridge has not applied yet.
//!
//! - **[`Bridge`]**: The client contract. `huelink_api::HueClient`
//!   implements it over HTTP; anything else (tests, simulators) can too.

pub mod bridge;
pub mod command;
pub mod config;
mod connection;
pub mod controller;
pub mod convert;
pub mod error;
pub mod event;
pub mod listener;
pub mod model;
pub mod store;
pub mod stream;

// ── Primary re-exports ──────────────────────────────────────────────
pub use bridge::Bridge;
pub use command::{BYPASS_MIN_DURATION_BEFORE_CMD, Command};
pub use config::{ConfigIssue, ControllerConfig, Protocol, TlsMode};
pub use controller::{ConnectionState, Controller};
pub use error::{BridgeError, CoreError};
pub use event::BridgeEvent;
pub use listener::{DiscoveryListener, PollBypass, StatusListener};
pub use store::DataStore;
pub use stream::{EntityStream, Snapshot};

pub use model::{
    ApiVersion, BridgeInfo, BridgeProperties, BridgeStatus, Color, ColorMode, Discovered, Entity,
    EntityKind, FullConfig, Group, Light, LightState, Sensor, SensorUpdate, StateUpdate,
    StatusDetail, StatusReason,
};
