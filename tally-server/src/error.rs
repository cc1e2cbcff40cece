use {
    thiserror::Error,
    crate::store::StoreError,
};

/// Failure of a single invocation. There is no status-500 rendering for
/// these: the service future resolves to an error and the connection task
/// reports it, so a failed invocation never produces a success body.
#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("counter store error: {error}")]
    Store { error: StoreError },

    #[error("failed to serialize response body: {reason}")]
    SerializationError { reason: String },
}
