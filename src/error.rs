use thiserror::Error;

/// Errors returned when a heap region is handed to the allocator.
///
/// These are recoverable; the allocator never escalates them itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InitError {
  #[error("heap is already initialized")]
  AlreadyInitialized,

  #[error("invalid heap region (start: {start:#x}, size: {size} bytes)")]
  InvalidRange { start: usize, size: usize },
}

/// Reasons an allocation request cannot be served.
///
/// The allocation entry points treat every one of these as fatal and hand it
/// to the heap's [`Halt`](crate::Halt) policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AllocError {
  #[error("heap used before initialization")]
  Uninitialized,

  #[error("zero count, element size or alignment")]
  ZeroSized,

  #[error("alignment must be a power of two: {alignment}")]
  BadAlignment { alignment: usize },

  #[error("allocation size overflows ({count} x {element_size} bytes)")]
  SizeOverflow { count: usize, element_size: usize },

  #[error("aligning {heap_free:#x} to {alignment} overflows the address space")]
  AlignOverflow { heap_free: usize, alignment: usize },

  #[error("out of heap memory (requested: {requested} bytes, remaining: {remaining} bytes)")]
  OutOfMemory { requested: usize, remaining: usize },
}

/// Returned by the growth shim for any request to extend the heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GrowthError {
  #[error("heap region is fixed-size, cannot grow by {delta} bytes")]
  FixedRegion { delta: isize },
}
