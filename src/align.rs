/// Rounds `addr` up to the next multiple of `align`.
///
/// Returns `None` when the rounded address does not fit in a `usize`.
/// `align` must be a power of two.
///
/// # Examples
///
/// ```rust
/// use rheap::align::align_up;
///
/// assert_eq!(align_up(0x100A, 8), Some(0x1010));
/// assert_eq!(align_up(0x1010, 8), Some(0x1010));
/// assert_eq!(align_up(usize::MAX, 2), None);
/// ```
pub const fn align_up(
  addr: usize,
  align: usize,
) -> Option<usize> {
  debug_assert!(align.is_power_of_two());

  let mask = align - 1;

  match addr.checked_add(mask) {
    Some(bumped) => Some(bumped & !mask),
    None => None,
  }
}

/// Whether `addr` is a multiple of `align`.
pub const fn is_aligned(
  addr: usize,
  align: usize,
) -> bool {
  addr & (align - 1) == 0
}
