//! # Session Configuration
//!
//! Builder-based configuration for the audio session engine.
//!
//! ## Overview
//!
//! [`SessionConfig`] carries the host bridge the engine talks to plus the
//! tuning knobs of the reconciliation pipeline. The builder validates
//! fail-fast so a misconfigured session is rejected before any native
//! subscription is made.
//!
//! ## Bridges
//!
//! A host provides at most one bridge:
//!
//! - [`RouteSessionBridge`] on platforms with a linear audio session
//! - [`FocusDeviceBridge`] on platforms with audio focus and device enumeration
//!
//! Providing both is rejected since the backend must be selected
//! unambiguously. Providing neither is valid: the session runs without a
//! backend and every operation returns its neutral default.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::SessionConfig;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let config = SessionConfig::builder()
//!     .focus_bridge(Arc::new(MyFocusBridge::new()))
//!     .debounce_window(Duration::from_millis(150))
//!     .build()?;
//! ```
//!
//! ## Error Handling
//!
//! ```should_panic
//! use core_runtime::config::SessionConfig;
//! use std::time::Duration;
//!
//! let config = SessionConfig::builder()
//!     .event_buffer_size(0)
//!     .build()
//!     .expect("Should fail - event buffer must not be empty");
//! ```

use crate::error::{Error, Result};
use bridge_traits::{FocusDeviceBridge, RouteSessionBridge};
use std::sync::Arc;
use std::time::Duration;

pub use crate::events::DEFAULT_EVENT_BUFFER_SIZE;
pub use core_async::debounce::DEFAULT_DEBOUNCE_WINDOW;

/// Longest accepted debounce window.
pub const MAX_DEBOUNCE_WINDOW: Duration = Duration::from_secs(5);

/// Largest accepted event channel capacity.
///
/// Broadcast channels allocate their whole ring buffer up front.
pub const MAX_EVENT_BUFFER_SIZE: usize = 10_000;

/// Configuration for an audio session.
///
/// Use [`SessionConfigBuilder`] to construct instances.
#[derive(Clone)]
pub struct SessionConfig {
    /// Linear session bridge (route/port model)
    pub route_bridge: Option<Arc<dyn RouteSessionBridge>>,

    /// Focus and device-list bridge
    pub focus_bridge: Option<Arc<dyn FocusDeviceBridge>>,

    /// Quiet window before a burst of device notifications triggers a refresh
    pub debounce_window: Duration,

    /// Capacity of each broadcast channel; slow subscribers lag beyond it
    pub event_buffer_size: usize,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field(
                "route_bridge",
                &self
                    .route_bridge
                    .as_ref()
                    .map(|_| "RouteSessionBridge { ... }"),
            )
            .field(
                "focus_bridge",
                &self
                    .focus_bridge
                    .as_ref()
                    .map(|_| "FocusDeviceBridge { ... }"),
            )
            .field("debounce_window", &self.debounce_window)
            .field("event_buffer_size", &self.event_buffer_size)
            .finish()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            route_bridge: None,
            focus_bridge: None,
            debounce_window: DEFAULT_DEBOUNCE_WINDOW,
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
        }
    }
}

impl SessionConfig {
    /// Creates a new builder.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_runtime::config::SessionConfig;
    ///
    /// let config = SessionConfig::builder().build().unwrap();
    /// assert!(!config.has_backend());
    /// ```
    pub fn builder() -> SessionConfigBuilder {
        SessionConfigBuilder::default()
    }

    /// Returns `true` when a host bridge was provided.
    pub fn has_backend(&self) -> bool {
        self.route_bridge.is_some() || self.focus_bridge.is_some()
    }

    /// Validates the configuration.
    ///
    /// Called by [`SessionConfigBuilder::build`]; exposed for configs that
    /// were assembled by hand.
    pub fn validate(&self) -> Result<()> {
        if self.route_bridge.is_some() && self.focus_bridge.is_some() {
            return Err(Error::Config(
                "Both a RouteSessionBridge and a FocusDeviceBridge were provided. \
                 Inject only the bridge that matches the host audio model."
                    .to_string(),
            ));
        }

        if self.debounce_window > MAX_DEBOUNCE_WINDOW {
            return Err(Error::Config(format!(
                "Debounce window of {}ms exceeds maximum of {}ms",
                self.debounce_window.as_millis(),
                MAX_DEBOUNCE_WINDOW.as_millis()
            )));
        }

        if self.event_buffer_size == 0 {
            return Err(Error::Config(
                "Event buffer size must be greater than 0".to_string(),
            ));
        }

        if self.event_buffer_size > MAX_EVENT_BUFFER_SIZE {
            return Err(Error::Config(format!(
                "Event buffer size of {} exceeds maximum of {}",
                self.event_buffer_size, MAX_EVENT_BUFFER_SIZE
            )));
        }

        Ok(())
    }
}

/// Builder for [`SessionConfig`].
#[derive(Default)]
pub struct SessionConfigBuilder {
    route_bridge: Option<Arc<dyn RouteSessionBridge>>,
    focus_bridge: Option<Arc<dyn FocusDeviceBridge>>,
    debounce_window: Option<Duration>,
    event_buffer_size: Option<usize>,
}

impl SessionConfigBuilder {
    /// Sets the linear session bridge.
    pub fn route_bridge(mut self, bridge: Arc<dyn RouteSessionBridge>) -> Self {
        self.route_bridge = Some(bridge);
        self
    }

    /// Sets the focus/device bridge.
    pub fn focus_bridge(mut self, bridge: Arc<dyn FocusDeviceBridge>) -> Self {
        self.focus_bridge = Some(bridge);
        self
    }

    /// Sets the debounce window (default 100ms, at most 5s).
    ///
    /// # Examples
    ///
    /// ```
    /// use core_runtime::config::SessionConfig;
    /// use std::time::Duration;
    ///
    /// let config = SessionConfig::builder()
    ///     .debounce_window(Duration::from_millis(250))
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(config.debounce_window, Duration::from_millis(250));
    /// ```
    pub fn debounce_window(mut self, window: Duration) -> Self {
        self.debounce_window = Some(window);
        self
    }

    /// Sets the broadcast channel capacity (default 100).
    pub fn event_buffer_size(mut self, size: usize) -> Self {
        self.event_buffer_size = Some(size);
        self
    }

    /// Builds and validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if both bridges are set, the debounce window
    /// exceeds 5 seconds, or the event buffer size is zero.
    pub fn build(self) -> Result<SessionConfig> {
        let config = SessionConfig {
            route_bridge: self.route_bridge,
            focus_bridge: self.focus_bridge,
            debounce_window: self.debounce_window.unwrap_or(DEFAULT_DEBOUNCE_WINDOW),
            event_buffer_size: self.event_buffer_size.unwrap_or(DEFAULT_EVENT_BUFFER_SIZE),
        };

        config.validate()?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bridge_traits::error::Result as BridgeResult;
    use bridge_traits::focus::{
        AudioMode, DeviceFlags, FocusChangeCallback, FocusNotificationStream, FocusRequest,
        NativeDeviceInfo,
    };
    use bridge_traits::route::{
        AudioRoute, CategoryOptions, RouteNotificationStream, RoutePort, RouteSharingPolicy,
        SessionCategory, SessionMode, SetActiveOptions,
    };
    use mockall::mock;

    mock! {
        pub RouteBridge {}

        #[async_trait::async_trait]
        impl RouteSessionBridge for RouteBridge {
            async fn current_route(&self) -> BridgeResult<AudioRoute>;
            async fn available_inputs(&self) -> BridgeResult<Vec<RoutePort>>;
            async fn category(&self) -> BridgeResult<SessionCategory>;
            async fn category_options(&self) -> BridgeResult<CategoryOptions>;
            async fn mode(&self) -> BridgeResult<SessionMode>;
            async fn route_sharing_policy(&self) -> BridgeResult<RouteSharingPolicy>;
            async fn set_category(
                &self,
                category: SessionCategory,
                options: CategoryOptions,
                mode: SessionMode,
                policy: RouteSharingPolicy,
            ) -> BridgeResult<()>;
            async fn set_active(&self, active: bool, options: SetActiveOptions) -> BridgeResult<()>;
            async fn is_in_call(&self) -> BridgeResult<bool>;
            async fn subscribe(&self) -> BridgeResult<Box<dyn RouteNotificationStream>>;
        }
    }

    mock! {
        pub FocusBridge {}

        #[async_trait::async_trait]
        impl FocusDeviceBridge for FocusBridge {
            async fn devices(&self, flags: DeviceFlags) -> BridgeResult<Vec<NativeDeviceInfo>>;
            async fn request_focus(
                &self,
                request: FocusRequest,
                callback: FocusChangeCallback,
            ) -> BridgeResult<bool>;
            async fn abandon_focus(&self) -> BridgeResult<bool>;
            async fn mode(&self) -> BridgeResult<AudioMode>;
            async fn subscribe(&self) -> BridgeResult<Box<dyn FocusNotificationStream>>;
        }
    }

    #[test]
    fn test_builder_defaults() {
        let config = SessionConfig::builder().build().unwrap();

        assert!(config.route_bridge.is_none());
        assert!(config.focus_bridge.is_none());
        assert!(!config.has_backend());
        assert_eq!(config.debounce_window, DEFAULT_DEBOUNCE_WINDOW);
        assert_eq!(config.event_buffer_size, DEFAULT_EVENT_BUFFER_SIZE);
    }

    #[test]
    fn test_builder_with_route_bridge() {
        let config = SessionConfig::builder()
            .route_bridge(Arc::new(MockRouteBridge::new()))
            .build()
            .unwrap();

        assert!(config.route_bridge.is_some());
        assert!(config.has_backend());
    }

    #[test]
    fn test_builder_with_focus_bridge() {
        let config = SessionConfig::builder()
            .focus_bridge(Arc::new(MockFocusBridge::new()))
            .event_buffer_size(16)
            .build()
            .unwrap();

        assert!(config.focus_bridge.is_some());
        assert_eq!(config.event_buffer_size, 16);
    }

    #[test]
    fn test_builder_rejects_both_bridges() {
        let result = SessionConfig::builder()
            .route_bridge(Arc::new(MockRouteBridge::new()))
            .focus_bridge(Arc::new(MockFocusBridge::new()))
            .build();

        match result {
            Err(Error::Config(message)) => assert!(message.contains("Both")),
            other => panic!("expected config error, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_rejects_zero_buffer() {
        let result = SessionConfig::builder().event_buffer_size(0).build();
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_validate_rejects_oversized_buffer() {
        let config = SessionConfig {
            event_buffer_size: usize::MAX,
            ..SessionConfig::default()
        };
        match config.validate() {
            Err(Error::Config(message)) => assert!(message.contains("exceeds maximum")),
            other => panic!("expected config error, got {:?}", other),
        }

        let config = SessionConfig::builder()
            .event_buffer_size(MAX_EVENT_BUFFER_SIZE)
            .build()
            .unwrap();
        assert_eq!(config.event_buffer_size, MAX_EVENT_BUFFER_SIZE);
    }

    #[test]
    fn test_validate_rejects_excessive_debounce() {
        let result = SessionConfig::builder()
            .debounce_window(Duration::from_secs(6))
            .build();
        assert!(matches!(result, Err(Error::Config(_))));

        let config = SessionConfig::builder()
            .debounce_window(MAX_DEBOUNCE_WINDOW)
            .build()
            .unwrap();
        assert_eq!(config.debounce_window, MAX_DEBOUNCE_WINDOW);
    }

    #[test]
    fn test_zero_debounce_is_allowed() {
        let config = SessionConfig::builder()
            .debounce_window(Duration::ZERO)
            .build()
            .unwrap();
        assert_eq!(config.debounce_window, Duration::ZERO);
    }

    #[test]
    fn test_debug_hides_bridges() {
        let config = SessionConfig::builder()
            .focus_bridge(Arc::new(MockFocusBridge::new()))
            .build()
            .unwrap();

        let rendered = format!("{:?}", config);
        assert!(rendered.contains("FocusDeviceBridge { ... }"));
        assert!(rendered.contains("route_bridge: None"));
    }

    #[test]
    fn test_config_is_cloneable() {
        let config = SessionConfig::builder()
            .route_bridge(Arc::new(MockRouteBridge::new()))
            .build()
            .unwrap();
        let cloned = config.clone();

        assert!(cloned.route_bridge.is_some());
        assert_eq!(cloned.debounce_window, config.debounce_window);
    }
}
