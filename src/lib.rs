//! # rheap - A Single-Region Heap for Firmware
//!
//! This crate provides a **bump allocator** (also known as an arena allocator)
//! over one contiguous memory region handed to it at startup. It is the
//! dynamic-memory primitive for environments with no operating system
//! allocator underneath.
//!
//! ## Overview
//!
//! ```text
//!   Heap Region:
//!
//!   start                                                          heap_end
//!   ▼                                                                  ▼
//!   ┌──────┬──┬──────────┬────┬────────┬──────────────────────────────┐
//!   │  A1  │░░│    A2    │░░░░│   A3   │          Free Space          │
//!   └──────┴──┴──────────┴────┴────────┴──────────────────────────────┘
//!                                      ▲
//!                                  heap_free
//!
//!   ░ = padding forfeited to reach the next allocation's alignment
//! ```
//!
//! Each allocation rounds `heap_free` up to the requested alignment and
//! bumps it past the request. Nothing is ever freed; the region is reclaimed
//! when the firmware restarts.
//!
//! ## Crate Structure
//!
//! ```text
//!   rheap
//!   ├── align   - Checked alignment arithmetic
//!   ├── error   - InitError, AllocError, GrowthError
//!   ├── halt    - Halt policies for fatal allocation errors
//!   ├── heap    - Heap, the allocator context
//!   ├── growth  - Heap-growth queries from a C runtime
//!   ├── global  - The process-wide heap and its GlobalAlloc adapter
//!   └── sbrk    - newlib `_sbrk` hook (feature `newlib`)
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use core::mem::MaybeUninit;
//! use rheap::Heap;
//!
//! static mut REGION: [MaybeUninit<u8>; 1024] = [MaybeUninit::uninit(); 1024];
//!
//! let mut heap = Heap::new();
//!
//! // SAFETY: REGION is only ever used by this heap.
//! unsafe { heap.init(&raw mut REGION as *mut u8, 1024) }.unwrap();
//!
//! let words = heap.allocate_zeroed(4, size_of::<u32>()).cast::<u32>();
//! unsafe { words.write(42) };
//! ```
//!
//! ## Failure
//!
//! Initialization errors are returned. Allocation errors are not: a request
//! that cannot be served means the heap is too small or the request is
//! corrupt, so it is handed to the heap's [`Halt`] policy, which does not
//! return. Callers never check allocation results.
//!
//! ## Limitations
//!
//! - **Single-threaded only**: No synchronization primitives
//! - **No deallocation**: Memory is never reused
//! - **Fixed size**: The region cannot grow after initialization

#![no_std]

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod align;
mod error;
pub mod global;
pub mod growth;
mod halt;
mod heap;
#[cfg(feature = "newlib")]
pub mod sbrk;

pub use error::{AllocError, GrowthError, InitError};
pub use global::SystemHeap;
#[cfg(feature = "std")]
pub use halt::AbortHalt;
pub use halt::{Halt, PanicHalt};
pub use heap::{DEFAULT_ALIGNMENT, Heap};
