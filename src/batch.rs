//! Splitting record lists into endpoint-sized chunks.

/// Lazily splits `records` into contiguous chunks of at most `size` items.
///
/// Only the last chunk may be shorter. A `size` of zero is treated as one
/// so a misconfigured limit still makes progress.
pub fn batches<T>(records: &[T], size: usize) -> std::slice::Chunks<'_, T> {
    records.chunks(size.max(1))
}

/// Number of chunks [`batches`] yields for `len` records
pub fn batch_count(len: usize, size: usize) -> usize {
    len.div_ceil(size.max(1))
}
