//! The process-wide heap.
//!
//! Startup code calls [`init`] once with the region reserved for the heap,
//! after which every subsystem allocates from the same region through the
//! free functions here, or through Rust's `alloc` crate once [`SystemHeap`]
//! is registered as the global allocator:
//!
//! ```rust,ignore
//! #[global_allocator]
//! static ALLOCATOR: rheap::SystemHeap = rheap::SystemHeap;
//! ```
//!
//! There is no locking. The process heap must only be used from one thread of
//! execution at a time, and not from interrupt handlers that can preempt an
//! allocation in progress.

use core::{
  alloc::{GlobalAlloc, Layout},
  cell::UnsafeCell,
  ptr::{self, NonNull},
};

use crate::{
  DEFAULT_ALIGNMENT, Heap, InitError, PanicHalt,
  growth::GrowthBoundary,
  heap::{finish, log_init},
};

struct GlobalHeap {
  heap: UnsafeCell<Heap>,
}

// SAFETY: callers uphold the single-threaded contract in the module docs.
unsafe impl Sync for GlobalHeap {}

static HEAP: GlobalHeap = GlobalHeap {
  heap: UnsafeCell::new(Heap::new()),
};

/// Runs `f` on the process heap.
///
/// `f` must not log, panic or allocate: any of those can reach the heap again
/// through an installed logger, panic hook or [`SystemHeap`]. Logging and
/// halting happen after this returns.
fn with_heap<R>(f: impl FnOnce(&mut Heap) -> R) -> R {
  // SAFETY: the heap is only reached through this function and callers only
  // pass closures that cannot re-enter it, so this is the only live
  // reference.
  f(unsafe { &mut *HEAP.heap.get() })
}

/// Initializes the process heap with `[start, start + size)`.
///
/// # Errors
///
/// See [`Heap::init`].
///
/// # Safety
///
/// Same contract as [`Heap::init`].
pub unsafe fn init(
  start: *mut u8,
  size: usize,
) -> Result<(), InitError> {
  // SAFETY: forwarded to the caller.
  let result = with_heap(|heap| unsafe { heap.claim(start, size) });
  log_init(result, start, size);
  result
}

/// Allocates `count` elements of `size` bytes at the default alignment.
pub fn alloc(
  count: usize,
  size: usize,
) -> NonNull<u8> {
  alloc_aligned(count, size, DEFAULT_ALIGNMENT)
}

/// Allocates `count` elements of `size` bytes aligned to `alignment`.
pub fn alloc_aligned(
  count: usize,
  size: usize,
  alignment: usize,
) -> NonNull<u8> {
  let result = with_heap(|heap| heap.try_allocate_aligned(count, size, alignment));
  finish(&PanicHalt, result, count, size, alignment)
}

/// Allocates `count` zeroed elements of `size` bytes at the default
/// alignment.
pub fn calloc(
  count: usize,
  size: usize,
) -> NonNull<u8> {
  calloc_aligned(count, size, DEFAULT_ALIGNMENT)
}

/// Allocates `count` zeroed elements of `size` bytes aligned to `alignment`.
pub fn calloc_aligned(
  count: usize,
  size: usize,
  alignment: usize,
) -> NonNull<u8> {
  let result = with_heap(|heap| heap.try_allocate_zeroed_aligned(count, size, alignment));
  finish(&PanicHalt, result, count, size, alignment)
}

/// Bytes left in the process heap; zero before initialization.
pub fn remaining() -> usize {
  with_heap(|heap| heap.remaining())
}

/// End of the process heap region; null before initialization.
pub fn boundary() -> *mut u8 {
  with_heap(|heap| heap.end_ptr())
}

/// [`GlobalAlloc`] over the process heap.
///
/// Failed requests return null so that Rust's allocation error handler
/// reports them. Nothing is logged on this path. Deallocation does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemHeap;

unsafe impl GlobalAlloc for SystemHeap {
  unsafe fn alloc(
    &self,
    layout: Layout,
  ) -> *mut u8 {
    with_heap(|heap| heap.try_allocate_aligned(1, layout.size(), layout.align()))
      .map_or(ptr::null_mut(), NonNull::as_ptr)
  }

  unsafe fn dealloc(
    &self,
    _ptr: *mut u8,
    _layout: Layout,
  ) {
  }
}

impl GrowthBoundary for SystemHeap {
  fn boundary(&self) -> *mut u8 {
    boundary()
  }
}

#[cfg(test)]
mod tests {
  use std::{boxed::Box, slice, vec};

  use super::*;
  use crate::growth::query_growth_boundary;

  // The process heap can only be initialized once, so a single test walks
  // through its whole lifecycle.
  #[test]
  fn test_process_heap() {
    assert_eq!(remaining(), 0);
    assert!(boundary().is_null());
    #[cfg(feature = "newlib")]
    assert!(crate::sbrk::_sbrk(0).is_null());
    assert!(unsafe { SystemHeap.alloc(Layout::new::<u32>()) }.is_null());

    let region = Box::leak(vec![0xFFu8; 512].into_boxed_slice());
    let start = region.as_mut_ptr();

    unsafe {
      assert_eq!(init(ptr::null_mut(), 512), Err(InitError::InvalidRange { start: 0, size: 512 }));
      init(start, region.len()).unwrap();
      assert_eq!(init(start, region.len()), Err(InitError::AlreadyInitialized));
    }

    assert_eq!(remaining(), 512);
    assert_eq!(boundary(), start.wrapping_add(512));
    assert_eq!(query_growth_boundary(&SystemHeap, 0), Ok(start.wrapping_add(512)));
    assert!(query_growth_boundary(&SystemHeap, 64).is_err());
    #[cfg(feature = "newlib")]
    assert_eq!(crate::sbrk::_sbrk(0), start.wrapping_add(512).cast());

    let a = alloc(2, 3);
    let b = alloc_aligned(1, 4, 16);
    assert_eq!(a.addr().get() % DEFAULT_ALIGNMENT, 0);
    assert_eq!(b.addr().get() % 16, 0);
    assert!(b.addr().get() >= a.addr().get() + 6);

    let zeroed = calloc(4, 8);
    assert!(unsafe { slice::from_raw_parts(zeroed.as_ptr(), 32) }.iter().all(|&b| b == 0));

    let zeroed = calloc_aligned(3, 3, 32);
    assert_eq!(zeroed.addr().get() % 32, 0);
    assert!(unsafe { slice::from_raw_parts(zeroed.as_ptr(), 9) }.iter().all(|&b| b == 0));

    let layout = Layout::new::<u64>();
    let word = unsafe { SystemHeap.alloc(layout) };
    assert!(!word.is_null());
    assert_eq!(word.addr() % layout.align(), 0);
    unsafe { SystemHeap.dealloc(word, layout) };

    // Deallocation never returns memory to the heap.
    let next = unsafe { SystemHeap.alloc(layout) };
    assert!(next.addr() >= word.addr() + 8);

    let huge = Layout::from_size_align(4096, 8).unwrap();
    assert!(unsafe { SystemHeap.alloc(huge) }.is_null());

    assert_eq!(boundary(), start.wrapping_add(512));
  }
}
