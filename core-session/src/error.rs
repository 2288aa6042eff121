use bridge_traits::BridgeError;
use thiserror::Error;

use crate::backend::BackendKind;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Bridge error: {0}")]
    Bridge(#[from] BridgeError),

    #[error("Runtime error: {0}")]
    Runtime(#[from] core_runtime::Error),

    #[error("Failed to subscribe to {backend} notifications: {source}")]
    SubscriptionFailed {
        backend: BackendKind,
        #[source]
        source: BridgeError,
    },

    #[error("Audio session has been shut down")]
    ShutDown,
}

pub type Result<T> = std::result::Result<T, SessionError>;
