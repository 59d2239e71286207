//! What happens when an allocation cannot be served.

use crate::AllocError;

/// A policy that stops execution on a fatal allocation error.
///
/// An allocation that cannot be satisfied means the system is misconfigured
/// (heap too small, corrupt sizes, or a logic bug), so implementations must
/// not return.
pub trait Halt {
  fn halt(
    &self,
    error: AllocError,
  ) -> !;
}

/// Halts by panicking.
///
/// Firmware images build with `panic = "abort"`, which makes this stop at the
/// failure point. Under test it unwinds, so fatal paths can be observed.
#[derive(Debug, Clone, Copy, Default)]
pub struct PanicHalt;

impl Halt for PanicHalt {
  #[track_caller]
  fn halt(
    &self,
    error: AllocError,
  ) -> ! {
    log::error!("fatal allocation failure: {error}");
    panic!("{error}")
  }
}

/// Halts by aborting the process, regardless of the panic strategy.
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy, Default)]
pub struct AbortHalt;

#[cfg(feature = "std")]
impl Halt for AbortHalt {
  fn halt(
    &self,
    error: AllocError,
  ) -> ! {
    log::error!("fatal allocation failure: {error}");
    std::process::abort()
  }
}
