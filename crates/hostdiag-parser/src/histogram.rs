//! Power-of-two histogram parser (BCC/bpftrace `bpf_histogram` output).
//!
//! Follows the procfs line-parsing idiom used in
//! `probe-platform::linux::procfs` (read the whole buffer, iterate
//! lines, tolerate extra whitespace and trailing annotation columns,
//! default a field to zero rather than abort on a parse miss), applied
//! here to the BCC histogram text shape instead of a procfs table.

use hostdiag_model::{Bucket, Histogram};

use crate::ansi::strip_ansi;
use crate::error::{ParseError, Result};

/// Parse a single BCC-style histogram: lines of the shape
/// `low -> high : count`, optionally followed by a `|`-delimited
/// distribution-bar annotation that is discarded. Lines starting with
/// `"Tracing"` or `"Attaching"` are skipped as preamble.
pub fn parse_histogram(name: &str, unit: &str, raw: &str) -> Result<Histogram> {
    let buckets = parse_buckets(raw);
    if buckets.is_empty() {
        return Err(ParseError::NoHistogramData);
    }
    Ok(Histogram::from_buckets(name, unit, buckets))
}

/// Parse a per-disk histogram dump: `disk = 'NAME'` section headers,
/// each followed by its own set of bucket lines. Emits one histogram
/// per section, named `<name>-<disk>`.
pub fn parse_histogram_per_disk(name: &str, unit: &str, raw: &str) -> Result<Vec<Histogram>> {
    let cleaned = strip_ansi(raw);
    let mut out = Vec::new();
    let mut current_disk: Option<String> = None;
    let mut current_lines = String::new();

    let flush = |disk: &Option<String>, lines: &str, out: &mut Vec<Histogram>| {
        if let Some(disk) = disk {
            let buckets = parse_buckets(lines);
            if !buckets.is_empty() {
                out.push(Histogram::from_buckets(format!("{name}-{disk}"), unit, buckets));
            }
        }
    };

    for line in cleaned.lines() {
        if let Some(disk) = extract_disk_header(line) {
            flush(&current_disk, &current_lines, &mut out);
            current_disk = Some(disk);
            current_lines.clear();
            continue;
        }
        current_lines.push_str(line);
        current_lines.push('\n');
    }
    flush(&current_disk, &current_lines, &mut out);

    if out.is_empty() {
        return Err(ParseError::NoHistogramData);
    }
    Ok(out)
}

fn extract_disk_header(line: &str) -> Option<String> {
    let trimmed = line.trim();
    let rest = trimmed.strip_prefix("disk = '")?;
    let end = rest.find('\'')?;
    Some(rest[..end].to_string())
}

fn is_preamble(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("Tracing") || trimmed.starts_with("Attaching")
}

fn parse_buckets(raw: &str) -> Vec<Bucket> {
    let cleaned = strip_ansi(raw);
    let mut buckets = Vec::new();
    for line in cleaned.lines() {
        if line.trim().is_empty() || is_preamble(line) {
            continue;
        }
        if let Some(bucket) = parse_bucket_line(line) {
            buckets.push(bucket);
        }
    }
    buckets
}

/// Parse one `low -> high : count [| annotation |]` line.
fn parse_bucket_line(line: &str) -> Option<Bucket> {
    let (low_part, rest) = line.split_once("->")?;
    let (high_part, count_part) = rest.split_once(':')?;

    let low: u64 = low_part.trim().parse().ok()?;
    let high: u64 = high_part.trim().parse().ok()?;
    let count_token = count_part.trim().split_whitespace().next()?;
    let count: u64 = count_token.parse().ok()?;

    Some(Bucket { low, high, count })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Tracing block I/O... Hit Ctrl-C to end.
     usecs               : count     distribution
         0 -> 1          : 0        |                                        |
         2 -> 3          : 1        |*                                       |
         4 -> 7          : 2        |**                                      |
         8 -> 15         : 97       |****************************************|
";

    #[test]
    fn parses_bucket_lines_and_skips_preamble() {
        let h = parse_histogram("biolatency", "us", SAMPLE).unwrap();
        assert_eq!(h.buckets.len(), 4);
        assert_eq!(h.total, 100);
        assert_eq!(h.max, 15.0);
    }

    #[test]
    fn no_bucket_lines_is_an_error() {
        let err = parse_histogram("x", "us", "Tracing... Hit Ctrl-C to end.\n").unwrap_err();
        assert_eq!(err, ParseError::NoHistogramData);
    }

    #[test]
    fn per_disk_sections_are_split_and_named() {
        let raw = "\
disk = 'sda'
     0 -> 1          : 5        |****|
disk = 'sdb'
     0 -> 1          : 9        |****|
";
        let histos = parse_histogram_per_disk("biolatency", "us", raw).unwrap();
        assert_eq!(histos.len(), 2);
        assert_eq!(histos[0].name, "biolatency-sda");
        assert_eq!(histos[1].name, "biolatency-sdb");
        assert_eq!(histos[1].total, 9);
    }
}
