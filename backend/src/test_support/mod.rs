//! Shared test doubles for in-crate unit tests.

mod clock;

pub use clock::MutableClock;
