use serde::{Deserialize, Serialize};

/// An application event emitted during an execution.
///
/// Events accumulate in the runtime's outbox and are drained by the
/// embedding host after the execution completes; an aborted execution's
/// events are dropped with the rest of its pending state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Application-defined event kind.
    pub kind: String,
    /// Opaque event payload.
    pub data: Vec<u8>,
    /// Optional handler tag for targeted delivery.
    pub handler: Option<Vec<u8>>,
}

impl Event {
    /// Create an event with no handler tag.
    pub fn new(kind: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            kind: kind.into(),
            data,
            handler: None,
        }
    }

    /// Create an event targeted at a handler.
    pub fn with_handler(kind: impl Into<String>, data: Vec<u8>, handler: Vec<u8>) -> Self {
        Self {
            kind: kind.into(),
            data,
            handler: Some(handler),
        }
    }
}
