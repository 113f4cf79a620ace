pub mod error;
pub mod format;
pub mod mm_stat;
pub mod swaps;

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::result;

pub use error::ZramError;
pub use mm_stat::MemoryStats;
pub use swaps::SwapEntry;

pub type Result<T> = result::Result<T, error::ZramError>;

/// How the collected statistics are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    /// Aligned columns, swap devices included.
    #[default]
    Text,
    /// Aligned columns followed by the field documentation.
    Verbose,
    /// A single JSON object with the memory statistics only.
    Json,
}

/// Files the statistics are read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sources {
    pub mm_stat: PathBuf,
    pub swaps: PathBuf,
}

/// Read the kernel's statistics of `zram0` and the active swap areas and
/// render them to `out`.
#[cfg(target_os = "linux")]
pub fn report<W: Write>(mode: Mode, out: &mut W) -> Result<()> {
    let stats = mm_stat::read()?;
    let swaps = swaps::read()?;
    render(&stats, &swaps, mode, out)
}

/// Read both sources and render them to `out`.
///
/// Both files are parsed before anything is written, so a read or parse
/// failure leaves `out` untouched.
pub fn run<W: Write>(sources: &Sources, mode: Mode, out: &mut W) -> Result<()> {
    let stats = mm_stat::read_and_parse_mm_stat(&sources.mm_stat)?;
    let swaps = swaps::read_and_parse_swaps(&sources.swaps)?;
    render(&stats, &swaps, mode, out)
}

fn render<W: Write>(
    stats: &MemoryStats,
    swaps: &[SwapEntry],
    mode: Mode,
    out: &mut W,
) -> Result<()> {
    match mode {
        Mode::Json => format::write_json(out, stats),
        Mode::Text => format::write_text(out, stats, swaps, false),
        Mode::Verbose => format::write_text(out, stats, swaps, true),
    }
}

#[inline]
fn file_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| ZramError::IO(e, path_to_string(path)))
}

#[inline]
fn path_to_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[inline]
fn parse_u64(segment: &str) -> Result<u64> {
    segment.parse().map_err(|_| {
        ZramError::UnexpectedContent(format!("Could not parse '{}' as u64", segment))
    })
}
