//! Session lifecycle control for the songfinder assistive-listening pipeline.
//!
//! A [`SessionController`] owns the real-time audio graph, the attached
//! effect unit and the parameter snapshot. It starts and stops the graph,
//! decides which parameter writes need a rebuild, reacts to hardware events,
//! and remembers gains per input port.
//!
//! # Architecture
//!
//! ```text
//!  device watcher ─┐
//!  stdin / UI ─────┼──▶ EventSender ──▶ [queue] ──▶ SessionController ──▶ AudioGraph
//!  state worker ───┤                                  │        │            │
//!  audio thread ───┘ (faults)                         │        │       EffectUnit
//!                                                     │        ▼            ▲
//!                                   PlatformSession ◀─┘   ErrorChannel      │
//!                                                        LevelMeterSampler ─┘
//! ```
//!
//! Only the thread that owns the controller mutates session state. Everyone
//! else posts [`SessionEvent`]s, which the owner drains with
//! [`SessionController::dispatch_pending`] or
//! [`SessionController::wait_and_dispatch`].
//!
//! # Modules
//!
//! - [`controller`]: run state machine, parameter setters, event handling
//! - [`router`]: route-change and interruption decisions, channel matching
//! - [`bridge`]: parameter snapshot ↔ effect unit controls
//! - [`gain_memory`]: per-port gain settings and first-seen policy
//! - [`meter`]: periodic output level sampling
//! - [`events`]: event and command vocabulary, [`EventSender`]
//! - [`errors`]: nonfatal/fatal error channel

pub mod bridge;
pub mod config;
pub mod controller;
pub mod errors;
pub mod events;
pub mod gain_memory;
pub mod meter;
pub mod router;

pub use config::SessionConfig;
pub use controller::{EffectFactory, RunState, SessionController};
pub use errors::{ErrorChannel, ErrorReport, Severity};
pub use events::{Command, EventSender, SessionEvent};
pub use gain_memory::{GainMemory, GainPolicy};
pub use meter::LevelMeterSampler;
pub use router::{RouteAction, interruption_action, route_action};
