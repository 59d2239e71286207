//! Heap-growth queries from a C runtime.
//!
//! Some C libraries probe their heap by asking to move the program break
//! instead of calling an allocator. The region managed here never grows, so
//! the only request that can succeed is the zero-sized one, which reports
//! where the region ends.

use crate::{GrowthError, Heap};

/// Something with a fixed upper memory boundary.
pub trait GrowthBoundary {
  fn boundary(&self) -> *mut u8;
}

impl<H> GrowthBoundary for Heap<H> {
  fn boundary(&self) -> *mut u8 {
    self.end_ptr()
  }
}

/// Answers a request to grow `source` by `delta` bytes.
///
/// A `delta` of zero returns the current boundary. Anything else fails.
///
/// # Errors
///
/// [`GrowthError::FixedRegion`] for any non-zero `delta`.
pub fn query_growth_boundary<B: GrowthBoundary + ?Sized>(
  source: &B,
  delta: isize,
) -> Result<*mut u8, GrowthError> {
  if delta != 0 {
    log::debug!("rejected request to grow the heap by {delta} bytes");
    return Err(GrowthError::FixedRegion { delta });
  }

  Ok(source.boundary())
}

#[cfg(test)]
mod tests {
  use core::ptr;

  use super::*;

  #[test]
  fn test_query_boundary() {
    let mut heap = Heap::new();
    unsafe { heap.init(ptr::without_provenance_mut(0x1000), 64) }.unwrap();

    assert_eq!(query_growth_boundary(&heap, 0).unwrap().addr(), 0x1040);

    heap.allocate(1, 40);

    // Allocations move the free pointer, not the boundary.
    assert_eq!(query_growth_boundary(&heap, 0).unwrap().addr(), 0x1040);
  }

  #[test]
  fn test_reject_growth() {
    let mut heap = Heap::new();
    unsafe { heap.init(ptr::without_provenance_mut(0x1000), 64) }.unwrap();

    for delta in [1, 4096, -16, isize::MAX, isize::MIN] {
      assert_eq!(
        query_growth_boundary(&heap, delta),
        Err(GrowthError::FixedRegion { delta })
      );
    }

    assert_eq!(heap.heap_free(), 0x1000);
    assert_eq!(heap.heap_end(), 0x1040);
  }

  #[test]
  fn test_query_before_init() {
    let heap = Heap::new();

    assert!(query_growth_boundary(&heap, 0).unwrap().is_null());
  }
}
