use thiserror::Error;

/// Failure taxonomy for the synchronization layer.
///
/// `Validation` and `Precondition` are resolved locally and never reach the
/// network. `Conflict` means a second write raced an in-flight one for the
/// same entity; the original request continues uninterrupted. `Network` and
/// `NotFound` are produced by the backend layer. No variant is fatal — every
/// failure is scoped to the single action that produced it.
#[derive(Debug, Error)]
pub enum Error {
    /// Input shape rejected before dispatch.
    #[error("invalid input: {0}")]
    Validation(String),

    /// The entity's current state does not permit the action.
    #[error("not allowed: {0}")]
    Precondition(String),

    /// Another mutation for the same entity is still in flight.
    #[error("a request for this entity is already in progress")]
    Conflict,

    /// Transport failure, timeout, or non-2xx response.
    #[error("{0}")]
    Network(String),

    /// The referenced entity no longer exists server-side.
    #[error("not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Human-readable message surfaced to the end user.
    pub fn user_message(&self) -> String {
        self.to_string()
    }
}
