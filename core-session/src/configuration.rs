//! Application audio intent.
//!
//! [`AudioSessionConfiguration`] describes how the app wants to use audio on
//! either backend. Fields for the backend that is not present are ignored.

use bridge_traits::focus::{AudioAttributes, AudioUsage, ContentType, FocusGainType, FocusRequest};
use bridge_traits::route::{
    CategoryOptions, RouteSharingPolicy, SessionCategory, SessionMode, SetActiveOptions,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioSessionConfiguration {
    // Route/session backend
    pub category: Option<SessionCategory>,
    pub category_options: CategoryOptions,
    pub mode: SessionMode,
    pub route_sharing_policy: RouteSharingPolicy,
    pub set_active_options: SetActiveOptions,

    // Focus backend
    pub audio_attributes: Option<AudioAttributes>,
    pub focus_gain_type: FocusGainType,
    pub will_pause_when_ducked: bool,
}

impl Default for AudioSessionConfiguration {
    fn default() -> Self {
        Self {
            category: None,
            category_options: CategoryOptions::NONE,
            mode: SessionMode::Default,
            route_sharing_policy: RouteSharingPolicy::Default,
            set_active_options: SetActiveOptions::default(),
            audio_attributes: None,
            focus_gain_type: FocusGainType::Gain,
            will_pause_when_ducked: true,
        }
    }
}

impl AudioSessionConfiguration {
    /// Long-form music playback.
    pub fn music() -> Self {
        Self {
            category: Some(SessionCategory::Playback),
            audio_attributes: Some(AudioAttributes {
                content_type: ContentType::Music,
                flags: 0,
                usage: AudioUsage::Media,
            }),
            focus_gain_type: FocusGainType::Gain,
            ..Self::default()
        }
    }

    /// Spoken content such as podcasts or audiobooks, with a microphone
    /// available for voice input.
    pub fn speech() -> Self {
        Self {
            category: Some(SessionCategory::PlayAndRecord),
            category_options: CategoryOptions::ALLOW_BLUETOOTH
                | CategoryOptions::DEFAULT_TO_SPEAKER,
            mode: SessionMode::SpokenAudio,
            audio_attributes: Some(AudioAttributes {
                content_type: ContentType::Speech,
                flags: 0,
                usage: AudioUsage::VoiceCommunication,
            }),
            focus_gain_type: FocusGainType::GainTransientMayDuck,
            ..Self::default()
        }
    }

    /// Category settings to apply, `None` if no category was chosen.
    pub fn category_settings(&self) -> Option<CategorySettings> {
        self.category.map(|category| CategorySettings {
            category,
            options: self.category_options,
            mode: self.mode,
            policy: self.route_sharing_policy,
        })
    }
}

/// The four values a session category change applies together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySettings {
    pub category: SessionCategory,
    pub options: CategoryOptions,
    pub mode: SessionMode,
    pub policy: RouteSharingPolicy,
}

/// Per-call overrides for [`AudioSession::set_active`](crate::AudioSession::set_active).
///
/// Unset fields fall back to the current configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivationOptions {
    pub set_active_options: Option<SetActiveOptions>,
    pub focus_gain_type: Option<FocusGainType>,
    pub audio_attributes: Option<AudioAttributes>,
    pub will_pause_when_ducked: Option<bool>,
}

impl ActivationOptions {
    pub fn with_set_active_options(mut self, options: SetActiveOptions) -> Self {
        self.set_active_options = Some(options);
        self
    }

    pub fn with_focus_gain_type(mut self, gain_type: FocusGainType) -> Self {
        self.focus_gain_type = Some(gain_type);
        self
    }

    pub fn with_audio_attributes(mut self, attributes: AudioAttributes) -> Self {
        self.audio_attributes = Some(attributes);
        self
    }

    pub fn with_pause_when_ducked(mut self, pause: bool) -> Self {
        self.will_pause_when_ducked = Some(pause);
        self
    }
}

/// Fully resolved activation parameters handed to a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivationRequest {
    pub set_active_options: SetActiveOptions,
    pub focus: FocusRequest,
}

impl ActivationRequest {
    pub fn resolve(configuration: &AudioSessionConfiguration, overrides: &ActivationOptions) -> Self {
        Self {
            set_active_options: overrides
                .set_active_options
                .unwrap_or(configuration.set_active_options),
            focus: FocusRequest {
                gain_type: overrides
                    .focus_gain_type
                    .unwrap_or(configuration.focus_gain_type),
                attributes: overrides.audio_attributes.or(configuration.audio_attributes),
                will_pause_when_ducked: overrides
                    .will_pause_when_ducked
                    .unwrap_or(configuration.will_pause_when_ducked),
            },
        }
    }
}
