use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::{file_to_string, parse_u64, Result, ZramError};

/// Statistics file of the first zram device.
pub const MM_STAT_PATH: &str = "/sys/block/zram0/mm_stat";

const MM_STAT_NUMBER_OF_FIELDS: usize = 8;

/// Memory management statistics of a zram device, in the column order of
/// `mm_stat`. Serialization keeps this order.
#[derive(Debug, PartialEq, Serialize)]
pub struct MemoryStats {
    /// Uncompressed size of the stored data in bytes.
    pub orig_data_size: u64,
    /// Compressed size of the stored data in bytes.
    pub compr_data_size: u64,
    /// Memory allocated for the device in bytes, allocator overhead included.
    pub mem_used_total: u64,
    /// Maximum amount of memory the device may use in bytes.
    pub mem_limit: u64,
    /// Peak of `mem_used_total` in bytes.
    pub mem_used_max: u64,
    /// Pages filled with one repeated element, stored without allocation.
    pub same_pages: u64,
    /// Pages freed by compaction.
    pub pages_compacted: u64,
    /// Incompressible pages.
    pub huge_pages: u64,
    /// `orig_data_size / compr_data_size`.
    pub compression_ratio: f64,
}

/// Read the memory statistics of `zram0`.
#[cfg(target_os = "linux")]
pub fn read() -> Result<MemoryStats> {
    read_and_parse_mm_stat(Path::new(MM_STAT_PATH))
}

pub fn read_and_parse_mm_stat(path: &Path) -> Result<MemoryStats> {
    let raw_data = file_to_string(path)?;
    let segments: Vec<&str> = raw_data.split_whitespace().collect();
    debug!(path = %path.display(), segments = segments.len(), "read mm_stat");

    // Newer kernels append counters after huge_pages, those are ignored.
    if segments.len() < MM_STAT_NUMBER_OF_FIELDS {
        return Err(ZramError::UnexpectedContent(format!(
            "Expected at least {} segments in mm_stat, had {}",
            MM_STAT_NUMBER_OF_FIELDS,
            segments.len()
        )));
    }

    let orig_data_size = parse_u64(segments[0])?;
    let compr_data_size = parse_u64(segments[1])?;
    if compr_data_size == 0 {
        return Err(ZramError::ZeroCompressedSize);
    }

    Ok(MemoryStats {
        orig_data_size,
        compr_data_size,
        mem_used_total: parse_u64(segments[2])?,
        mem_limit: parse_u64(segments[3])?,
        mem_used_max: parse_u64(segments[4])?,
        same_pages: parse_u64(segments[5])?,
        pages_compacted: parse_u64(segments[6])?,
        huge_pages: parse_u64(segments[7])?,
        compression_ratio: orig_data_size as f64 / compr_data_size as f64,
    })
}
