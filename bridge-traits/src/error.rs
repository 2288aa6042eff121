use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    /// The native audio stack refused the request (e.g. an `OSStatus` or a
    /// focus request that came back failed).
    #[error("Native call rejected ({code}): {message}")]
    Rejected { code: i64, message: String },

    #[error("Notification subscription closed")]
    SubscriptionClosed,
}

pub type Result<T> = std::result::Result<T, BridgeError>;
