//! Upload session chunking
//!
//! The single-request upload endpoint caps payloads at 150 MiB; anything
//! larger goes through an upload session in fixed-size sequential chunks.
//! No resume state is kept: a failed chunk fails the whole upload.

/// Largest payload accepted by the single-request upload endpoint
pub const SINGLE_REQUEST_LIMIT: usize = 150 * 1024 * 1024;

/// Chunk size used for session uploads; must be a multiple of 4 MiB
/// per the API contract
pub const SESSION_CHUNK_SIZE: usize = 8 * 1024 * 1024;

/// Number of chunks a payload splits into
pub fn chunk_count(total: usize, chunk_size: usize) -> usize {
    total.div_ceil(chunk_size)
}

/// Byte range of one chunk, end-exclusive and clamped to the payload
pub fn chunk_range(index: usize, chunk_size: usize, total: usize) -> (usize, usize) {
    let start = index * chunk_size;
    let end = (start + chunk_size).min(total);
    (start, end)
}
