//! Interruption and focus translation.
//!
//! Both native models are turned into [`InterruptionEvent`]s:
//!
//! | Native signal                              | Event                          |
//! |--------------------------------------------|--------------------------------|
//! | session interruption began                 | `{begin, unknown}`             |
//! | session interruption began, was suspended  | nothing                        |
//! | session interruption ended                 | `{end, pause}` if it should resume, else `{end, unknown}` |
//! | focus loss                                 | `{begin, unknown}`             |
//! | focus transient loss                       | `{begin, pause}`               |
//! | focus transient loss, may duck             | `{begin, duck}` or `{begin, pause}` when ducking is overridden |
//! | focus gain                                 | `{end, duck}` after a duck, else `{end, pause}` |

use bridge_traits::focus::FocusChange;
use bridge_traits::route::InterruptionNotification;

use crate::model::{InterruptionEvent, InterruptionType};

/// Translates a session interruption notification.
///
/// A begin reported while the app was already suspended is dropped, so the
/// matching end may arrive without a begin.
pub fn translate_route_interruption(
    notification: &InterruptionNotification,
) -> Option<InterruptionEvent> {
    match notification {
        InterruptionNotification::Began {
            was_suspended: Some(true),
        } => None,
        InterruptionNotification::Began { .. } => {
            Some(InterruptionEvent::began(InterruptionType::Unknown))
        }
        InterruptionNotification::Ended { options } => {
            let interruption_type = if options.should_resume {
                InterruptionType::Pause
            } else {
                InterruptionType::Unknown
            };
            Some(InterruptionEvent::ended(interruption_type))
        }
    }
}

/// Focus change translator for one focus grant.
///
/// Tracks whether the app is currently ducked so that the gain that ends a
/// duck is reported as a duck end. With `pause_when_ducked` a duckable loss is
/// reported as a pause instead and the ducked flag is never set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FocusTranslator {
    pause_when_ducked: bool,
    ducked: bool,
}

impl FocusTranslator {
    pub fn new(pause_when_ducked: bool) -> Self {
        Self {
            pause_when_ducked,
            ducked: false,
        }
    }

    pub fn pause_when_ducked(&self) -> bool {
        self.pause_when_ducked
    }

    pub fn is_ducked(&self) -> bool {
        self.ducked
    }

    pub fn translate(&mut self, change: FocusChange) -> InterruptionEvent {
        match change {
            FocusChange::Gain => {
                let interruption_type = if self.ducked {
                    InterruptionType::Duck
                } else {
                    InterruptionType::Pause
                };
                self.ducked = false;
                InterruptionEvent::ended(interruption_type)
            }
            FocusChange::Loss => {
                self.ducked = false;
                InterruptionEvent::began(InterruptionType::Unknown)
            }
            FocusChange::LossTransient => {
                self.ducked = false;
                InterruptionEvent::began(InterruptionType::Pause)
            }
            FocusChange::LossTransientCanDuck => {
                if self.pause_when_ducked {
                    InterruptionEvent::began(InterruptionType::Pause)
                } else {
                    self.ducked = true;
                    InterruptionEvent::began(InterruptionType::Duck)
                }
            }
        }
    }
}
