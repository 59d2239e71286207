use core::{
  mem::MaybeUninit,
  ptr::{self, NonNull},
};

use static_assertions::const_assert;

use crate::{
  AllocError, Halt, InitError, PanicHalt,
  align::{align_up, is_aligned},
};

/// Alignment used by [`Heap::allocate`] and [`Heap::allocate_zeroed`].
///
/// Eight bytes covers every primitive type on the supported targets.
pub const DEFAULT_ALIGNMENT: usize = 8;

const_assert!(DEFAULT_ALIGNMENT.is_power_of_two());

/// A single-region bump allocator.
///
/// The heap owns one contiguous region handed to it by [`Heap::init`] and
/// serves each request by rounding the free pointer up to the requested
/// alignment and advancing it past the request. Nothing is ever freed.
///
/// Requests that cannot be served are fatal: they are handed to the heap's
/// [`Halt`] policy, so the allocation entry points only ever return valid
/// pointers. [`Heap::try_allocate_aligned`] exposes the same checks without
/// halting.
pub struct Heap<H = PanicHalt> {
  initialized: bool,
  base: *mut u8,
  heap_free: usize,
  heap_end: usize,
  halt: H,
}

impl Heap<PanicHalt> {
  /// Creates an uninitialized heap that panics on fatal errors.
  pub const fn new() -> Self {
    Self::with_halt(PanicHalt)
  }
}

impl Default for Heap<PanicHalt> {
  fn default() -> Self {
    Self::new()
  }
}

impl<H> Heap<H> {
  /// Creates an uninitialized heap that stops through `halt` on fatal errors.
  pub const fn with_halt(halt: H) -> Self {
    Self {
      initialized: false,
      base: ptr::null_mut(),
      heap_free: 0,
      heap_end: 0,
      halt,
    }
  }

  /// Hands the region `[start, start + size)` to the heap.
  ///
  /// # Errors
  ///
  /// - [`InitError::AlreadyInitialized`] if a previous call succeeded.
  /// - [`InitError::InvalidRange`] if `start` is null, `size` is zero, or the
  ///   region would wrap around the address space. The heap stays
  ///   uninitialized.
  ///
  /// # Safety
  ///
  /// The region must be valid for reads and writes for as long as the heap
  /// and any allocation made from it are in use, and nothing else may access
  /// it except through pointers this heap returns.
  pub unsafe fn init(
    &mut self,
    start: *mut u8,
    size: usize,
  ) -> Result<(), InitError> {
    // SAFETY: forwarded to the caller.
    let result = unsafe { self.claim(start, size) };
    log_init(result, start, size);
    result
  }

  /// [`Heap::init`] without logging.
  ///
  /// # Safety
  ///
  /// Same contract as [`Heap::init`].
  pub(crate) unsafe fn claim(
    &mut self,
    start: *mut u8,
    size: usize,
  ) -> Result<(), InitError> {
    if self.initialized {
      return Err(InitError::AlreadyInitialized);
    }

    let invalid = InitError::InvalidRange {
      start: start.addr(),
      size,
    };

    if start.is_null() || size == 0 {
      return Err(invalid);
    }

    let end = start.addr().checked_add(size).ok_or(invalid)?;

    self.base = start;
    self.heap_free = start.addr();
    self.heap_end = end;
    self.initialized = true;

    Ok(())
  }

  /// Hands a `'static` buffer to the heap.
  ///
  /// # Errors
  ///
  /// Same as [`Heap::init`]; an empty buffer is an [`InitError::InvalidRange`].
  pub fn init_from_slice(
    &mut self,
    region: &'static mut [MaybeUninit<u8>],
  ) -> Result<(), InitError> {
    // SAFETY: the exclusive 'static borrow gives the heap sole access to the
    // buffer for the rest of the program.
    unsafe { self.init(region.as_mut_ptr().cast(), region.len()) }
  }

  pub const fn is_initialized(&self) -> bool {
    self.initialized
  }

  /// Address of the first free byte. Zero before initialization.
  pub const fn heap_free(&self) -> usize {
    self.heap_free
  }

  /// Address one past the last byte of the region. Zero before
  /// initialization.
  pub const fn heap_end(&self) -> usize {
    self.heap_end
  }

  /// Pointer one past the last byte of the region.
  pub fn end_ptr(&self) -> *mut u8 {
    self.base.wrapping_add(self.heap_end - self.base.addr())
  }

  /// Bytes left between the free pointer and the end of the region,
  /// ignoring any padding a future request may need.
  pub const fn remaining(&self) -> usize {
    self.heap_end - self.heap_free
  }

  /// Allocates `count` elements of `element_size` bytes aligned to
  /// `alignment`, without halting on failure.
  ///
  /// A failed request leaves the heap untouched. Nothing is logged, so this
  /// is safe to call from a global allocator whose logger allocates.
  ///
  /// # Errors
  ///
  /// Checked in this order:
  ///
  /// 1. [`AllocError::ZeroSized`] / [`AllocError::Uninitialized`]
  /// 2. [`AllocError::BadAlignment`]
  /// 3. [`AllocError::SizeOverflow`]
  /// 4. [`AllocError::AlignOverflow`]
  /// 5. [`AllocError::OutOfMemory`]
  pub fn try_allocate_aligned(
    &mut self,
    count: usize,
    element_size: usize,
    alignment: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    self.carve(count, element_size, alignment).map(|(ptr, _)| ptr)
  }

  /// Like [`Heap::try_allocate_aligned`], with every byte of the range set to
  /// zero.
  ///
  /// # Errors
  ///
  /// See [`Heap::try_allocate_aligned`].
  pub fn try_allocate_zeroed_aligned(
    &mut self,
    count: usize,
    element_size: usize,
    alignment: usize,
  ) -> Result<NonNull<u8>, AllocError> {
    let (ptr, total_size) = self.carve(count, element_size, alignment)?;

    // SAFETY: the range lies inside the region, which the init contract makes
    // writable, and no earlier allocation overlaps it.
    unsafe { ptr::write_bytes(ptr.as_ptr(), 0, total_size) };

    Ok(ptr)
  }

  /// Validates a request and bumps the free pointer past it, returning the
  /// start of the range together with its checked length.
  fn carve(
    &mut self,
    count: usize,
    element_size: usize,
    alignment: usize,
  ) -> Result<(NonNull<u8>, usize), AllocError> {
    if count == 0 || element_size == 0 || alignment == 0 {
      return Err(AllocError::ZeroSized);
    }

    if !self.initialized {
      return Err(AllocError::Uninitialized);
    }

    if !alignment.is_power_of_two() {
      return Err(AllocError::BadAlignment { alignment });
    }

    let total_size = count
      .checked_mul(element_size)
      .ok_or(AllocError::SizeOverflow { count, element_size })?;

    let start = align_up(self.heap_free, alignment).ok_or(AllocError::AlignOverflow {
      heap_free: self.heap_free,
      alignment,
    })?;

    if total_size > self.heap_end.saturating_sub(start) {
      return Err(AllocError::OutOfMemory {
        requested: total_size,
        remaining: self.remaining(),
      });
    }

    debug_assert!(is_aligned(start, alignment));

    self.heap_free = start + total_size;

    let ptr = self.base.wrapping_add(start - self.base.addr());

    // SAFETY: `start` is at least the region's start address, which init
    // checked to be non-null.
    Ok((unsafe { NonNull::new_unchecked(ptr) }, total_size))
  }
}

impl<H: Halt> Heap<H> {
  /// Allocates `count` elements of `element_size` bytes aligned to
  /// `alignment`.
  ///
  /// Bytes skipped to reach the alignment are never recovered.
  ///
  /// Any failure listed on [`Heap::try_allocate_aligned`] is fatal.
  pub fn allocate_aligned(
    &mut self,
    count: usize,
    element_size: usize,
    alignment: usize,
  ) -> NonNull<u8> {
    let result = self.try_allocate_aligned(count, element_size, alignment);
    finish(&self.halt, result, count, element_size, alignment)
  }

  /// Allocates `count` elements of `element_size` bytes at
  /// [`DEFAULT_ALIGNMENT`].
  ///
  /// # Examples
  ///
  /// ```rust
  /// use core::mem::MaybeUninit;
  /// use rheap::Heap;
  ///
  /// let region = Box::leak(Box::new([MaybeUninit::<u8>::uninit(); 256]));
  /// let mut heap = Heap::new();
  /// heap.init_from_slice(region).unwrap();
  ///
  /// let a = heap.allocate(1, 10);
  /// let b = heap.allocate(1, 1);
  /// assert_eq!(b.addr().get() % 8, 0);
  /// assert!(b.addr().get() >= a.addr().get() + 10);
  /// ```
  pub fn allocate(
    &mut self,
    count: usize,
    element_size: usize,
  ) -> NonNull<u8> {
    self.allocate_aligned(count, element_size, DEFAULT_ALIGNMENT)
  }

  /// Like [`Heap::allocate_aligned`], with every byte of the range set to
  /// zero.
  pub fn allocate_zeroed_aligned(
    &mut self,
    count: usize,
    element_size: usize,
    alignment: usize,
  ) -> NonNull<u8> {
    let result = self.try_allocate_zeroed_aligned(count, element_size, alignment);
    finish(&self.halt, result, count, element_size, alignment)
  }

  /// Like [`Heap::allocate`], with every byte of the range set to zero.
  pub fn allocate_zeroed(
    &mut self,
    count: usize,
    element_size: usize,
  ) -> NonNull<u8> {
    self.allocate_zeroed_aligned(count, element_size, DEFAULT_ALIGNMENT)
  }
}

/// Logs the outcome of an initialization attempt.
pub(crate) fn log_init(
  result: Result<(), InitError>,
  start: *mut u8,
  size: usize,
) {
  match result {
    Ok(()) => log::debug!(
      "heap initialized: {:#x}..{:#x} ({} bytes)",
      start.addr(),
      start.addr() + size,
      size
    ),
    Err(error) => log::warn!("rejected heap region at {start:p}: {error}"),
  }
}

/// Logs a served request or stops through `halt`.
///
/// Kept apart from the allocation itself so the process heap can call it
/// after releasing its borrow, since a logger or panic hook may allocate.
pub(crate) fn finish<H: Halt>(
  halt: &H,
  result: Result<NonNull<u8>, AllocError>,
  count: usize,
  element_size: usize,
  alignment: usize,
) -> NonNull<u8> {
  match result {
    Ok(ptr) => {
      log::trace!(
        "allocated {count} x {element_size} bytes at {:#x} (align {alignment})",
        ptr.addr().get()
      );
      ptr
    }
    Err(error) => halt.halt(error),
  }
}
