//! The process heap serving the same program's logger and panic hook.
//!
//! The logger here allocates for every record, and while routing is on those
//! allocations land on the process heap through `SystemHeap`. Allocation must
//! therefore never log or panic while the heap is held.

use std::{
  alloc::{GlobalAlloc, Layout, System},
  cell::Cell,
  panic,
  sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
  },
};

use log::{LevelFilter, Log, Metadata, Record};
use rheap::{SystemHeap, global};

static REGION_START: AtomicUsize = AtomicUsize::new(0);
static REGION_END: AtomicUsize = AtomicUsize::new(0);

std::thread_local! {
  static ROUTED: Cell<bool> = const { Cell::new(false) };
}

/// Sends allocations from routed threads to the process heap and everything
/// else (the test harness, other threads) to the system allocator.
struct Router;

unsafe impl GlobalAlloc for Router {
  unsafe fn alloc(
    &self,
    layout: Layout,
  ) -> *mut u8 {
    if ROUTED.with(Cell::get) {
      let ptr = unsafe { SystemHeap.alloc(layout) };
      if !ptr.is_null() {
        return ptr;
      }
    }

    unsafe { System.alloc(layout) }
  }

  unsafe fn dealloc(
    &self,
    ptr: *mut u8,
    layout: Layout,
  ) {
    if in_region(ptr.addr()) {
      unsafe { SystemHeap.dealloc(ptr, layout) }
    } else {
      unsafe { System.dealloc(ptr, layout) }
    }
  }
}

#[global_allocator]
static ALLOCATOR: Router = Router;

static LINES: Mutex<Vec<String>> = Mutex::new(Vec::new());

struct RecordingLogger;

impl Log for RecordingLogger {
  fn enabled(
    &self,
    _metadata: &Metadata<'_>,
  ) -> bool {
    true
  }

  fn log(
    &self,
    record: &Record<'_>,
  ) {
    let line = format!("{} {}", record.level(), record.args());
    LINES.lock().unwrap().push(line);
  }

  fn flush(&self) {}
}

static LOGGER: RecordingLogger = RecordingLogger;

fn in_region(addr: usize) -> bool {
  addr >= REGION_START.load(Ordering::Relaxed) && addr < REGION_END.load(Ordering::Relaxed)
}

#[test]
fn test_logger_allocating_from_process_heap() {
  log::set_logger(&LOGGER).unwrap();
  log::set_max_level(LevelFilter::Trace);

  let region = Box::leak(vec![0u8; 64 * 1024].into_boxed_slice());
  let start = region.as_mut_ptr();
  REGION_START.store(start.addr(), Ordering::Relaxed);
  REGION_END.store(start.addr() + region.len(), Ordering::Relaxed);

  ROUTED.with(|routed| routed.set(true));

  // The init log line is formatted once the heap is ready.
  unsafe { global::init(start, region.len()) }.unwrap();

  let before = global::remaining();

  let word = global::alloc(1, 8);
  let zeroed = global::calloc(4, 4);

  assert!(in_region(word.addr().get()));
  assert!(in_region(zeroed.addr().get()));

  // The logger's own strings came out of the heap as well.
  assert!(global::remaining() < before - 8 - 16);

  let failed = panic::catch_unwind(|| global::alloc_aligned(1, 1, 3));
  assert!(failed.is_err());

  ROUTED.with(|routed| routed.set(false));

  let lines = LINES.lock().unwrap();
  assert!(lines.iter().any(|line| line.starts_with("DEBUG heap initialized")));
  assert!(lines.iter().any(|line| line.contains("allocated 1 x 8 bytes")));
  assert!(lines.iter().any(|line| line.contains("allocated 4 x 4 bytes")));
  assert!(lines.iter().any(|line| line.starts_with("ERROR fatal allocation failure")));
}
