//! Page and table geometry constants.

/// Size in bytes of one page, the unit of memory mapping.
pub const PAGE_SIZE: usize = 4096;

/// Number of slots in every table level.
pub const TABLE_SLOTS: usize = 512;

/// Maximum nesting depth of tables used as page tables.
///
/// Depth 1 spans 2 MiB, depth 2 spans 1 GiB, depth 3 spans 512 GiB.
pub const MAX_TABLE_DEPTH: u32 = 3;

/// Picks the smallest supported table span that covers `size` bytes.
///
/// Returns `None` when `size` exceeds the largest supported span.
pub fn table_span_for(size: usize) -> Option<usize> {
    let mut span = PAGE_SIZE * TABLE_SLOTS;
    for _ in 0..MAX_TABLE_DEPTH {
        if size <= span {
            return Some(span);
        }
        span *= TABLE_SLOTS;
    }
    None
}

/// Number of whole pages needed to hold `bytes` bytes (at least one).
pub fn pages_for(bytes: usize) -> usize {
    bytes.div_ceil(PAGE_SIZE).max(1)
}
