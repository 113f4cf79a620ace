use std::fmt;
use std::io;
use std::io::Write;

use serde::Serialize;
use serde_json::ser::Formatter;

use crate::{MemoryStats, Result, SwapEntry};

const SUFFIXES: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

/// Values above this are shown in human units in text mode.
const HUMAN_THRESHOLD: u64 = 10000;

/// Description of the `mm_stat` columns, shown with `--verbose`.
pub const DOCS: &str = "
 orig_data_size   uncompressed size of data stored in this disk.
                  This excludes same-element-filled pages (same_pages) since
                  no memory is allocated for them.
                  Unit: bytes
 compr_data_size  compressed size of data stored in this disk
 mem_used_total   the amount of memory allocated for this disk. This
                  includes allocator fragmentation and metadata overhead,
                  allocated for this disk. So, allocator space efficiency
                  can be calculated using compr_data_size and this statistic.
                  Unit: bytes
 mem_limit        the maximum amount of memory ZRAM can use to store
                  the compressed data
 mem_used_max     the maximum amount of memory zram have consumed to
                  store the data
 same_pages       the number of same element filled pages written to this disk.
                  No memory is allocated for such pages.
 pages_compacted  the number of pages freed during compaction
 huge_pages       the number of incompressible pages
";

/// Format a byte count with binary units, e.g. `1536` becomes `1.5 KB`.
pub fn size(nbytes: u64) -> String {
    scale(nbytes as f64)
}

fn scale(mut value: f64) -> String {
    let mut i = 0;
    while value >= 1024.0 && i < SUFFIXES.len() - 1 {
        value /= 1024.0;
        i += 1;
    }

    let rendered = format!("{:.2}", value);
    let number = rendered.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", number, SUFFIXES[i])
}

/// Shortest round-trip form of a float with a signed exponent of at least
/// two digits, e.g. `2.0`, `0.0001`, `1e-06` and `1.5e+17`.
pub fn float_repr(value: f64) -> String {
    let debug = format!("{:?}", value);
    match debug.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };
            format!("{}e{}{:0>2}", mantissa, sign, digits)
        }
        None => debug,
    }
}

/// A single value of the stats block.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Field {
    Count(u64),
    Ratio(f64),
}

// Counts are scaled like byte sizes once they pass the threshold, the
// page counters included.
impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Field::Count(value) if value > HUMAN_THRESHOLD => write!(f, "{}", size(value)),
            Field::Count(value) => write!(f, "{}", value),
            Field::Ratio(value) if value > HUMAN_THRESHOLD as f64 => write!(f, "{}", scale(value)),
            Field::Ratio(value) => write!(f, "{}", float_repr(value)),
        }
    }
}

fn fields(stats: &MemoryStats) -> [(&'static str, Field); 9] {
    [
        ("orig_data_size", Field::Count(stats.orig_data_size)),
        ("compr_data_size", Field::Count(stats.compr_data_size)),
        ("mem_used_total", Field::Count(stats.mem_used_total)),
        ("mem_limit", Field::Count(stats.mem_limit)),
        ("mem_used_max", Field::Count(stats.mem_used_max)),
        ("same_pages", Field::Count(stats.same_pages)),
        ("pages_compacted", Field::Count(stats.pages_compacted)),
        ("huge_pages", Field::Count(stats.huge_pages)),
        ("compression_ratio", Field::Ratio(stats.compression_ratio)),
    ]
}

/// Object separators of `", "` and `": "` on a single line, floats as
/// [`float_repr`].
struct SpacedFormatter;

impl Formatter for SpacedFormatter {
    #[inline]
    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(float_repr(value).as_bytes())
    }

    #[inline]
    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    #[inline]
    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }
}

/// Write the statistics as one JSON object. Swap devices are not part of it.
pub fn write_json<W: Write>(out: &mut W, stats: &MemoryStats) -> Result<()> {
    let mut serializer = serde_json::Serializer::with_formatter(&mut *out, SpacedFormatter);
    stats.serialize(&mut serializer)?;
    writeln!(out)?;
    Ok(())
}

/// Write the statistics as aligned columns followed by the swap devices.
pub fn write_text<W: Write>(
    out: &mut W,
    stats: &MemoryStats,
    swaps: &[SwapEntry],
    verbose: bool,
) -> Result<()> {
    for (name, value) in fields(stats).iter() {
        writeln!(out, "{:<18}{}", name, value)?;
    }

    if verbose {
        writeln!(out, "{}", DOCS)?;
    } else {
        writeln!(out)?;
    }

    for swap in swaps {
        writeln!(out, "{:<18}{:<8} [{}]", swap.name, size(swap.used), size(swap.size))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{float_repr, size, write_json, write_text, Field, DOCS};
    use crate::{MemoryStats, SwapEntry, ZramError};
    use std::io;

    struct BrokenPipe;

    impl io::Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn stats() -> MemoryStats {
        MemoryStats {
            orig_data_size: 100,
            compr_data_size: 50,
            mem_used_total: 60,
            mem_limit: 1000,
            mem_used_max: 70,
            same_pages: 5,
            pages_compacted: 2,
            huge_pages: 0,
            compression_ratio: 2.0,
        }
    }

    fn render_text(stats: &MemoryStats, swaps: &[SwapEntry], verbose: bool) -> String {
        let mut out = Vec::new();
        write_text(&mut out, stats, swaps, verbose).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_size() {
        assert_eq!(size(0), "0 B");
        assert_eq!(size(1023), "1023 B");
        assert_eq!(size(1024), "1 KB");
        assert_eq!(size(1536), "1.5 KB");
        assert_eq!(size(1024 * 1024), "1 MB");
        assert_eq!(size(301174590), "287.22 MB");
        assert_eq!(size(1216364544), "1.13 GB");
    }

    #[test]
    fn test_size_rounds_up_into_whole_number() {
        assert_eq!(size(8589930496), "8 GB");
    }

    #[test]
    fn test_size_stops_at_petabytes() {
        assert_eq!(size(1024u64.pow(5) * 5), "5 PB");
        assert_eq!(size(1024u64.pow(6)), "1024 PB");
    }

    #[test]
    fn test_size_has_no_trailing_zeros() {
        for nbytes in [0, 1, 10, 100, 1000, 1024, 10240, 102400, 1 << 20, 1 << 40, u64::MAX] {
            let formatted = size(nbytes);
            let (number, unit) = formatted.split_once(' ').unwrap();
            assert!(["B", "KB", "MB", "GB", "TB", "PB"].contains(&unit), "{}", formatted);
            assert!(!number.ends_with('.'), "{}", formatted);
            if number.contains('.') {
                assert!(!number.ends_with('0'), "{}", formatted);
            }
        }
    }

    #[test]
    fn test_field_threshold_is_strict() {
        assert_eq!(Field::Count(10000).to_string(), "10000");
        assert_eq!(Field::Count(10001).to_string(), "9.77 KB");
        assert_eq!(Field::Ratio(2.0).to_string(), "2.0");
        assert_eq!(Field::Ratio(20000.0 / 3.0).to_string(), "6666.666666666667");
        assert_eq!(Field::Ratio(20000.0).to_string(), "19.53 KB");
    }

    #[test]
    fn test_field_count_threshold_near_u64_max() {
        assert_eq!(Field::Count(u64::MAX).to_string(), "16384 PB");
    }

    #[test]
    fn test_float_repr() {
        assert_eq!(float_repr(2.0), "2.0");
        assert_eq!(float_repr(4.038735618433149), "4.038735618433149");
        assert_eq!(float_repr(0.0001), "0.0001");
        assert_eq!(float_repr(1e-6), "1e-06");
        assert_eq!(float_repr(1.5e-7), "1.5e-07");
        assert_eq!(float_repr(1e16), "1e+16");
        assert_eq!(float_repr(123456789012345678.0), "1.2345678901234568e+17");
    }

    #[test]
    fn test_small_ratio_uses_two_digit_exponent() {
        let mut stats = stats();
        stats.compression_ratio = 1e-6;

        let mut out = Vec::new();
        write_json(&mut out, &stats).unwrap();
        let json = String::from_utf8(out).unwrap();
        assert!(json.ends_with("\"compression_ratio\": 1e-06}\n"));

        let text = render_text(&stats, &[], false);
        assert!(text.contains("compression_ratio 1e-06\n"));
    }

    #[test]
    fn test_write_errors_are_output_errors() {
        match write_text(&mut BrokenPipe, &stats(), &[], false) {
            Err(ZramError::Output(e)) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
            r => panic!("Unexpected result: {:?}", r),
        }
        match write_json(&mut BrokenPipe, &stats()) {
            Err(ZramError::Json(_)) | Err(ZramError::Output(_)) => (),
            r => panic!("Unexpected result: {:?}", r),
        }
    }

    #[test]
    fn test_write_json() {
        let mut out = Vec::new();
        write_json(&mut out, &stats()).unwrap();

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"orig_data_size\": 100, \"compr_data_size\": 50, \"mem_used_total\": 60, \
             \"mem_limit\": 1000, \"mem_used_max\": 70, \"same_pages\": 5, \
             \"pages_compacted\": 2, \"huge_pages\": 0, \"compression_ratio\": 2.0}\n"
        );
    }

    #[test]
    fn test_write_text() {
        let swaps = vec![SwapEntry {
            name: "/dev/zram0".to_owned(),
            size: 8589930496,
            used: 1216348160,
        }];

        assert_eq!(
            render_text(&stats(), &swaps, false),
            "orig_data_size    100\n\
             compr_data_size   50\n\
             mem_used_total    60\n\
             mem_limit         1000\n\
             mem_used_max      70\n\
             same_pages        5\n\
             pages_compacted   2\n\
             huge_pages        0\n\
             compression_ratio 2.0\n\
             \n\
             /dev/zram0        1.13 GB  [8 GB]\n"
        );
    }

    #[test]
    fn test_write_text_scales_counts_above_threshold() {
        let mut stats = stats();
        stats.orig_data_size = 20000;
        stats.same_pages = 10000;
        stats.huge_pages = 10001;

        let text = render_text(&stats, &[], false);
        assert!(text.contains("orig_data_size    19.53 KB\n"));
        assert!(text.contains("same_pages        10000\n"));
        assert!(text.contains("huge_pages        9.77 KB\n"));
    }

    #[test]
    fn test_write_text_verbose() {
        let text = render_text(&stats(), &[], true);

        assert!(text.ends_with(&format!("compression_ratio 2.0\n{}\n", DOCS)));
    }

    #[test]
    fn test_write_text_without_swaps() {
        let text = render_text(&stats(), &[], false);

        assert_eq!(text.lines().count(), 10);
        assert!(text.ends_with("compression_ratio 2.0\n\n"));
    }

    #[test]
    fn test_write_text_keeps_swap_order() {
        let swaps = vec![
            SwapEntry {
                name: "/swapfile".to_owned(),
                size: 2147479552,
                used: 0,
            },
            SwapEntry {
                name: "/dev/zram0".to_owned(),
                size: 4096,
                used: 1024,
            },
        ];

        let text = render_text(&stats(), &swaps, false);
        assert!(text.ends_with(
            "\n\n/swapfile         0 B      [2 GB]\n/dev/zram0        1 KB     [4 KB]\n"
        ));
    }
}
