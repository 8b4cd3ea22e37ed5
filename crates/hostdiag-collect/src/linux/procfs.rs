//! Shared procfs/sysfs text-parsing helpers.
//!
//! Grounded on `probe-platform::linux::procfs`: read the
//! whole file into a string, tolerate its absence, split on
//! whitespace, and default every field that doesn't parse to zero
//! rather than propagate an error (I4).

use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Read a file to a string, returning an empty string on any I/O
/// error (missing file, permission denied, not present on this
/// kernel). Callers then apply the usual "absent field -> zero" rule.
pub fn read_to_string_lossy(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_default()
}

/// Parse a decimal field, defaulting to zero on any parse failure (I4).
pub fn parse_u64_or_zero(field: &str) -> u64 {
    field.parse().unwrap_or(0)
}

/// Parse a decimal field, defaulting to zero on any parse failure (I4).
pub fn parse_f64_or_zero(field: &str) -> f64 {
    field.parse().unwrap_or(0.0)
}

/// Non-negative delta: `after - before`, clamped to 0 on wrap/reset (I1).
pub fn delta_u64(before: u64, after: u64) -> u64 {
    after.saturating_sub(before)
}

/// Parse a PSI (`/proc/pressure/*`) line's `avg10=`/`avg60=` tokens.
/// Lines look like `some avg10=0.00 avg60=0.00 avg300=0.00 total=0`.
pub fn parse_psi_line(line: &str) -> (f64, f64) {
    let mut avg10 = 0.0;
    let mut avg60 = 0.0;
    for token in line.split_whitespace() {
        if let Some(value) = token.strip_prefix("avg10=") {
            avg10 = parse_f64_or_zero(value);
        } else if let Some(value) = token.strip_prefix("avg60=") {
            avg60 = parse_f64_or_zero(value);
        }
    }
    (avg10, avg60)
}

/// Read a pressure file's `some` line avg10/avg60 pair, zeroed if the
/// file is absent (e.g. PSI disabled in the running kernel) (I4).
pub fn read_pressure_some(path: &Path) -> (f64, f64) {
    let content = read_to_string_lossy(path);
    content
        .lines()
        .find(|line| line.starts_with("some"))
        .map(parse_psi_line)
        .unwrap_or((0.0, 0.0))
}

/// Read a pressure file's `full` line avg10/avg60 pair, zeroed if the
/// file or line is absent (I4).
pub fn read_pressure_full(path: &Path) -> (f64, f64) {
    let content = read_to_string_lossy(path);
    content
        .lines()
        .find(|line| line.starts_with("full"))
        .map(parse_psi_line)
        .unwrap_or((0.0, 0.0))
}

/// Parse a `key: value unit` style file (e.g. `/proc/meminfo`) into a
/// map keyed by the bare key name, values left as their raw numeric
/// token (callers apply unit scaling themselves).
pub fn parse_colon_table(content: &str) -> HashMap<String, u64> {
    let mut out = HashMap::new();
    for line in content.lines() {
        let Some((key, rest)) = line.split_once(':') else { continue };
        let value = rest.split_whitespace().next().unwrap_or("0");
        out.insert(key.trim().to_string(), parse_u64_or_zero(value));
    }
    out
}

/// Extract the bracketed active token from a sysfs toggle file, e.g.
/// `always [madvise] never` -> `"madvise"`. Falls back to the trimmed
/// content when no bracket is present.
pub fn parse_bracketed_choice(content: &str) -> String {
    if let (Some(start), Some(end)) = (content.find('['), content.find(']')) {
        if end > start {
            return content[start + 1..end].to_string();
        }
    }
    content.trim().to_string()
}

/// Extract the scheduler name marked `[active]` in a sysfs
/// `queue/scheduler` file, reusing the same bracket convention.
pub fn parse_active_scheduler(content: &str) -> String {
    parse_bracketed_choice(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_clamps_negative_to_zero() {
        assert_eq!(delta_u64(100, 50), 0);
        assert_eq!(delta_u64(50, 100), 50);
    }

    #[test]
    fn psi_line_extracts_avg10_and_avg60() {
        let (avg10, avg60) = parse_psi_line("some avg10=1.50 avg60=2.75 avg300=0.00 total=12345");
        assert_eq!(avg10, 1.50);
        assert_eq!(avg60, 2.75);
    }

    #[test]
    fn missing_pressure_file_defaults_to_zero() {
        let (avg10, avg60) = read_pressure_some(Path::new("/nonexistent/pressure/path"));
        assert_eq!((avg10, avg60), (0.0, 0.0));
    }

    #[test]
    fn bracketed_choice_extracts_active_token() {
        assert_eq!(parse_bracketed_choice("always [madvise] never\n"), "madvise");
    }

    #[test]
    fn bracketed_choice_falls_back_to_trimmed_content() {
        assert_eq!(parse_bracketed_choice("noop\n"), "noop");
    }

    #[test]
    fn colon_table_parses_meminfo_style_lines() {
        let table = parse_colon_table("MemTotal:       16384000 kB\nMemFree:         1024000 kB\n");
        assert_eq!(table.get("MemTotal"), Some(&16384000));
    }
}
