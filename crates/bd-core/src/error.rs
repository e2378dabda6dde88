//! Error taxonomy for the editing engine.
//!
//! Every variant is recoverable: the engine's contract is to preserve the
//! existing document rather than surface a fatal error to the host. Callers
//! log and continue; nothing here should ever reach a panic path.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// Drop data did not parse into any recognized block variant.
    /// The drop is ignored and the tree left unchanged.
    #[error("malformed drop payload: {0}")]
    MalformedPayload(String),

    /// The drop target is the dragged block itself, one of its descendants,
    /// or a position the block kind is not allowed to occupy.
    /// Treated as a cancellation.
    #[error("invalid drop target")]
    InvalidTarget,

    /// An asynchronous file read completed after its insertion target was
    /// removed. The insertion is redirected or discarded, never raised.
    #[error("insertion target no longer exists")]
    StaleInsertionContext,

    /// The live surface's markup could not be serialized back into a block
    /// tree. The last known-good external content is retained.
    #[error("serialization failure: {0}")]
    SerializationFailure(String),
}
