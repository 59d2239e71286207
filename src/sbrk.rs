//! newlib's `_sbrk` hook, answered from the process heap.
//!
//! newlib's own `malloc` grows its arena through `_sbrk`. Linking this module
//! in lets it discover where the process heap ends while refusing to hand out
//! any memory itself.

use core::ptr;

use libc::{ENOMEM, c_int, c_void, intptr_t};

use crate::{SystemHeap, growth::query_growth_boundary};

#[cfg(not(test))]
unsafe extern "C" {
  fn __errno() -> *mut c_int;
}

#[cfg(test)]
use tests::__errno;

#[unsafe(no_mangle)]
pub extern "C" fn _sbrk(increment: intptr_t) -> *mut c_void {
  match query_growth_boundary(&SystemHeap, increment) {
    Ok(boundary) => boundary.cast(),
    Err(_) => {
      // SAFETY: `__errno` returns the calling thread's errno slot.
      unsafe { *__errno() = ENOMEM };

      ptr::without_provenance_mut(usize::MAX)
    }
  }
}

#[cfg(test)]
mod tests {
  use core::cell::Cell;

  use super::*;

  std::thread_local! {
    static ERRNO: Cell<c_int> = const { Cell::new(0) };
  }

  /// Stands in for newlib's accessor, one slot per test thread.
  pub(super) unsafe fn __errno() -> *mut c_int {
    ERRNO.with(Cell::as_ptr)
  }

  // Only non-zero increments here: they are rejected before the process heap
  // is read, so this cannot race the process heap test.
  #[test]
  fn test_sbrk_rejects_growth() {
    for increment in [1, 4096, -8] {
      ERRNO.with(|errno| errno.set(0));

      assert_eq!(_sbrk(increment).addr(), usize::MAX);
      assert_eq!(ERRNO.with(Cell::get), ENOMEM);
    }
  }
}
