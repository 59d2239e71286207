use std::{mem::MaybeUninit, ptr::NonNull, slice};

use rheap::{AbortHalt, Heap, growth::query_growth_boundary};

const REGION_SIZE: usize = 4 * 1024;

/// Prints where an allocation landed and what is left of the heap.
fn print_alloc(
  label: &str,
  heap: &Heap<AbortHalt>,
  size: usize,
  addr: NonNull<u8>,
) {
  println!(
    "[{}] Allocated {} bytes, address = {:#x}, heap_free = {:#x}, remaining = {}",
    label,
    size,
    addr.addr().get(),
    heap.heap_free(),
    heap.remaining(),
  );
}

fn main() {
  let region: &'static mut [MaybeUninit<u8>] =
    Box::leak(vec![MaybeUninit::uninit(); REGION_SIZE].into_boxed_slice());

  // Abort instead of unwinding if the demo ever runs the heap dry.
  let mut heap = Heap::with_halt(AbortHalt);

  if let Err(err) = heap.init_from_slice(region) {
    eprintln!("failed to initialize heap: {err}");
    return;
  }

  println!(
    "[start] heap = {:#x}..{:#x} ({} bytes)",
    heap.heap_free(),
    heap.heap_end(),
    heap.remaining()
  );

  // --------------------------------------------------------------------
  // 1) A 10-byte buffer at the default alignment.
  // --------------------------------------------------------------------
  let first = heap.allocate(1, 10);
  print_alloc("1", &heap, 10, first);

  // --------------------------------------------------------------------
  // 2) A single byte. The free pointer is no longer 8-aligned, so the
  //    padding up to the next multiple of 8 is forfeited.
  // --------------------------------------------------------------------
  let second = heap.allocate(1, 1);
  print_alloc("2", &heap, 1, second);
  println!(
    "[2] Forfeited {} bytes of padding",
    second.addr().get() - (first.addr().get() + 10)
  );

  // --------------------------------------------------------------------
  // 3) An array of u16 with a much stricter alignment than it needs.
  // --------------------------------------------------------------------
  let third = heap.allocate_aligned(16, size_of::<u16>(), 256);
  print_alloc("3", &heap, 32, third);

  let halves = third.cast::<u16>();
  for i in 0..16 {
    unsafe { halves.add(i).write(i as u16) };
  }
  println!("[3] Wrote 0..15 into the u16 array");

  // --------------------------------------------------------------------
  // 4) Zeroed memory.
  // --------------------------------------------------------------------
  let fourth = heap.allocate_zeroed(8, size_of::<u64>());
  print_alloc("4", &heap, 64, fourth);

  let bytes = unsafe { slice::from_raw_parts(fourth.as_ptr(), 64) };
  println!("[4] All zero? {}", bytes.iter().all(|&b| b == 0));

  // --------------------------------------------------------------------
  // 5) What a C runtime sees when it probes for growth.
  // --------------------------------------------------------------------
  match query_growth_boundary(&heap, 0) {
    Ok(boundary) => println!("\n[5] Heap boundary = {boundary:p}"),
    Err(err) => println!("\n[5] {err}"),
  }

  if let Err(err) = query_growth_boundary(&heap, 4096) {
    println!("[5] Growing by 4096 bytes: {err}");
  }

  // --------------------------------------------------------------------
  // 6) Failure. `try_allocate_aligned` reports what `allocate` would
  //    have halted on.
  // --------------------------------------------------------------------
  if let Err(err) = heap.try_allocate_aligned(2, REGION_SIZE, 8) {
    println!("\n[6] Oversized request: {err}");
  }

  if let Err(err) = heap.try_allocate_aligned(1, 1, 3) {
    println!("[6] Odd alignment: {err}");
  }

  println!("\n[7] End of demo. Nothing is freed; the region lives until exit.");
}
