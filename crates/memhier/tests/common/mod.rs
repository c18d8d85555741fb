/// Controller test harness.
pub mod harness;

/// Mock implementations of the controller's collaborators.
pub mod mocks;
