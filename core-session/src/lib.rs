//! # Core Session
//!
//! Audio session reconciliation across the two host audio models.
//!
//! ## Overview
//!
//! Hosts deliver audio state in incompatible shapes: a linear session with a
//! route of typed ports on one side, focus grants plus an enumerable device
//! list with integer type codes on the other. This crate folds both into one
//! model:
//!
//! - [`DeviceSnapshot`] / [`AudioDevice`] with a unified [`DeviceType`]
//! - [`InterruptionEvent`] for interruptions and focus changes alike
//! - [`DevicesChangedEvent`] deltas and a replay-last snapshot stream
//!
//! [`AudioSession`] owns the backend, the [`DeviceDirectory`] and the event
//! buses. Bursts of native device notifications are coalesced by a debouncer
//! before the directory is refreshed.
//!
//! ## Modules
//!
//! - `model`: unified device and interruption types
//! - `normalize`: native type tables
//! - `directory`: canonical snapshot cache and delta computation
//! - `interruption`: interruption and focus change translation
//! - `configuration`: application audio intent and presets
//! - `backend`: the two native backends behind [`AudioBackend`]
//! - `coordinator`: [`AudioSession`]

pub mod backend;
pub mod configuration;
pub mod coordinator;
pub mod directory;
pub mod error;
pub mod events;
pub mod interruption;
pub mod model;
pub mod normalize;

pub use backend::{AudioBackend, BackendKind, BackendSignal, FocusBackend, RouteBackend};
pub use configuration::{
    ActivationOptions, ActivationRequest, AudioSessionConfiguration, CategorySettings,
};
pub use coordinator::AudioSession;
pub use directory::{diff, DeviceDirectory};
pub use error::{Result, SessionError};
pub use events::{SessionEvent, SessionEventStream};
pub use interruption::{translate_route_interruption, FocusTranslator};
pub use model::{
    AudioDevice, DeviceSnapshot, DeviceType, DevicesChangedEvent, InterruptionEvent,
    InterruptionType,
};
