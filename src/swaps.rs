use std::path::Path;

use tracing::{debug, trace};

use crate::{file_to_string, parse_u64, Result, ZramError};

/// Listing of the active swap areas.
pub const SWAPS_PATH: &str = "/proc/swaps";

const SWAPS_MINIMUM_NUMBER_OF_FIELDS: usize = 4;

/// An active swap device or file. Sizes are in bytes.
#[derive(Debug, PartialEq)]
pub struct SwapEntry {
    pub name: String,
    pub size: u64,
    pub used: u64,
}

/// Read the active swap areas.
#[cfg(target_os = "linux")]
pub fn read() -> Result<Vec<SwapEntry>> {
    read_and_parse_swaps(Path::new(SWAPS_PATH))
}

/// Parse a `/proc/swaps` listing, keeping the order the kernel lists devices in.
pub fn read_and_parse_swaps(path: &Path) -> Result<Vec<SwapEntry>> {
    let raw_data = file_to_string(path)?;

    let swaps = raw_data
        .lines()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(parse_line)
        .collect::<Result<Vec<SwapEntry>>>()?;

    debug!(path = %path.display(), entries = swaps.len(), "read swaps");
    Ok(swaps)
}

fn parse_line(line: &str) -> Result<SwapEntry> {
    let segments: Vec<&str> = line.split_whitespace().collect();

    if segments.len() < SWAPS_MINIMUM_NUMBER_OF_FIELDS {
        return Err(ZramError::UnexpectedContent(format!(
            "Expected at least {} items in swap line, had {}: '{}'",
            SWAPS_MINIMUM_NUMBER_OF_FIELDS,
            segments.len(),
            line.trim()
        )));
    }

    // Size and Used are reported in KiB.
    let entry = SwapEntry {
        name: segments[0].to_owned(),
        size: kilo_bytes_to_bytes(parse_u64(segments[2])?)?,
        used: kilo_bytes_to_bytes(parse_u64(segments[3])?)?,
    };
    trace!(name = %entry.name, size = entry.size, used = entry.used, "parsed swap entry");
    Ok(entry)
}

#[inline]
fn kilo_bytes_to_bytes(value: u64) -> Result<u64> {
    value.checked_mul(1024).ok_or_else(|| {
        ZramError::UnexpectedContent(format!("Swap size of {} KiB overflows u64", value))
    })
}
