//! Environment abstraction for deterministic testing.
//!
//! The display loop is paced by wall-clock time. Routing every clock read
//! through [`Environment`] lets the simulation harness drive the server with
//! a virtual clock while production uses the system clock.

use std::time::Duration;

/// Abstract environment providing time and async sleeping.
///
/// # Invariants
///
/// - `now()` never goes backwards
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    ///
    /// Production uses `std::time::Instant`, simulation uses the virtual
    /// clock of the test runtime.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic).
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// Only the runtime loop sleeps; the domain model never does.
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;
}
