


/// Set-index hash tests.
pub mod hash;


/// Replacement policy tests.
pub mod policies;

/// Prefetch path tests.
pub mod prefetch;

/// Address region and slice ownership tests.
pub mod region;

/// Deadlock watchdog tests.
pub mod watchdog;
