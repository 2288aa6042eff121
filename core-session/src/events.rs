//! Session events published to the application.

use core_runtime::events::{EventBus, EventSeverity, EventStream, RecvError};
use serde::{Deserialize, Serialize};

use crate::model::{DevicesChangedEvent, InterruptionEvent};

// ============================================================================
// Session Events
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum SessionEvent {
    Interruption(InterruptionEvent),
    /// Audio is about to be routed to the built-in speaker, typically because
    /// headphones were unplugged.
    BecomingNoisy,
    DevicesChanged(DevicesChangedEvent),
}

impl SessionEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            SessionEvent::Interruption(event) if event.begin => "Audio interruption began",
            SessionEvent::Interruption(_) => "Audio interruption ended",
            SessionEvent::BecomingNoisy => "Audio becoming noisy",
            SessionEvent::DevicesChanged(_) => "Audio devices changed",
        }
    }

    pub fn severity(&self) -> EventSeverity {
        match self {
            SessionEvent::Interruption(_) | SessionEvent::BecomingNoisy => EventSeverity::Info,
            SessionEvent::DevicesChanged(_) => EventSeverity::Debug,
        }
    }
}

// ============================================================================
// Typed Streams
// ============================================================================

/// Stream of one kind of [`SessionEvent`] payload.
pub struct SessionEventStream<T> {
    stream: EventStream<SessionEvent>,
    extract: fn(SessionEvent) -> Option<T>,
}

impl<T> SessionEventStream<T> {
    pub(crate) fn new(bus: &EventBus<SessionEvent>, extract: fn(SessionEvent) -> Option<T>) -> Self {
        Self {
            stream: EventStream::new(bus.subscribe()),
            extract,
        }
    }

    /// Waits for the next matching event.
    ///
    /// # Errors
    ///
    /// `RecvError::Lagged` if this subscriber fell behind, `RecvError::Closed`
    /// once the session is gone.
    pub async fn recv(&mut self) -> Result<T, RecvError> {
        loop {
            if let Some(value) = (self.extract)(self.stream.recv().await?) {
                return Ok(value);
            }
        }
    }

    /// Returns the next matching event if one is already queued.
    pub fn try_recv(&mut self) -> Option<Result<T, RecvError>> {
        loop {
            match self.stream.try_recv()? {
                Ok(event) => {
                    if let Some(value) = (self.extract)(event) {
                        return Some(Ok(value));
                    }
                }
                Err(err) => return Some(Err(err)),
            }
        }
    }
}

impl<T> std::fmt::Debug for SessionEventStream<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionEventStream").finish_non_exhaustive()
    }
}

pub(crate) fn interruption(event: SessionEvent) -> Option<InterruptionEvent> {
    match event {
        SessionEvent::Interruption(interruption) => Some(interruption),
        _ => None,
    }
}

pub(crate) fn becoming_noisy(event: SessionEvent) -> Option<()> {
    matches!(event, SessionEvent::BecomingNoisy).then_some(())
}

pub(crate) fn devices_changed(event: SessionEvent) -> Option<DevicesChangedEvent> {
    match event {
        SessionEvent::DevicesChanged(changed) => Some(changed),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InterruptionType;

    #[test]
    fn test_description_and_severity() {
        let began = SessionEvent::Interruption(InterruptionEvent::began(InterruptionType::Pause));
        let ended = SessionEvent::Interruption(InterruptionEvent::ended(InterruptionType::Pause));

        assert_eq!(began.description(), "Audio interruption began");
        assert_eq!(ended.description(), "Audio interruption ended");
        assert_eq!(SessionEvent::BecomingNoisy.severity(), EventSeverity::Info);
        assert_eq!(
            SessionEvent::DevicesChanged(DevicesChangedEvent::default()).severity(),
            EventSeverity::Debug
        );
    }

    #[test]
    fn test_serialization_is_tagged() {
        let json = serde_json::to_value(SessionEvent::BecomingNoisy).unwrap();
        assert_eq!(json, serde_json::json!({"type": "BecomingNoisy"}));
    }

    #[tokio::test]
    async fn test_typed_stream_skips_other_events() {
        let bus = EventBus::new(8);
        let mut noisy = SessionEventStream::new(&bus, becoming_noisy);
        let mut interruptions = SessionEventStream::new(&bus, interruption);

        bus.emit(SessionEvent::Interruption(InterruptionEvent::began(
            InterruptionType::Duck,
        )))
        .unwrap();
        bus.emit(SessionEvent::BecomingNoisy).unwrap();

        noisy.recv().await.unwrap();
        assert!(noisy.try_recv().is_none());

        let event = interruptions.recv().await.unwrap();
        assert_eq!(event.interruption_type, InterruptionType::Duck);
        assert!(interruptions.try_recv().is_none());
    }
}
