/// Link that records what the controller advertises on it.
pub mod link;

/// Mock cache listener.
pub mod listener;

/// Recording coherence protocol.
pub mod protocol;
