//! Tabular event parser (BCC-style whitespace-column tool output).

use hostdiag_model::Event;

use crate::ansi::strip_ansi;

/// Outcome of parsing a tabular event stream.
#[derive(Debug, Clone, Default)]
pub struct TabularResult {
    /// Parsed events, in source order.
    pub events: Vec<Event>,
    /// Set when `max_events` was reached before the input was exhausted.
    pub truncated: bool,
}

fn is_preamble(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("Tracing") || trimmed.starts_with("Attaching")
}

/// Parse a tabular event stream. The first non-blank, non-preamble line
/// is treated as the header; column names are lower-cased. Subsequent
/// rows are paired positionally with the header up to
/// `min(headers.len(), fields.len())`. Parsing stops once `max_events`
/// rows have been produced, setting `truncated`.
pub fn parse_tabular_events(raw: &str, max_events: usize) -> TabularResult {
    let cleaned = strip_ansi(raw);
    let mut lines = cleaned.lines();

    let mut header: Option<Vec<String>> = None;
    let mut result = TabularResult::default();

    for line in &mut lines {
        if line.trim().is_empty() || is_preamble(line) {
            continue;
        }
        header = Some(line.split_whitespace().map(|h| h.to_lowercase()).collect());
        break;
    }

    let Some(header) = header else {
        return result;
    };

    for line in lines {
        if line.trim().is_empty() {
            continue;
        }
        if result.events.len() >= max_events {
            result.truncated = true;
            break;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        let n = header.len().min(fields.len());

        let mut event = Event::new();
        for (name, raw_value) in header.iter().take(n).zip(fields.iter().take(n)) {
            match name.as_str() {
                "time" => event.time = Some((*raw_value).to_string()),
                "pid" => event.pid = Some(raw_value.parse::<i32>().unwrap_or(0)),
                "comm" => event.comm = Some((*raw_value).to_string()),
                _ => event.set_detail(name.clone(), raw_value),
            }
        }
        result.events.push(event);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostdiag_model::Scalar;

    #[test]
    fn pairs_header_and_rows_positionally() {
        let raw = "TIME COMM PID LAT\nbash 1234 5.2 ok\nngrok 555 3.1 ok\n";
        let result = parse_tabular_events(raw, 10);
        assert_eq!(result.events.len(), 2);
        assert_eq!(result.events[0].time.as_deref(), Some("bash"));
        assert_eq!(result.events[0].comm.as_deref(), Some("1234"));
        assert_eq!(result.events[0].pid, Some(0)); // "5.2" doesn't parse as i32 -> defaults (I4-style)
        assert!(!result.truncated);
    }

    #[test]
    fn short_rows_pair_up_to_the_shorter_length() {
        // Header has 4 columns but each row supplies only 3 tokens:
        // pairing is purely positional, so header[2] ("pid") lands on
        // the row's third token regardless of its semantic meaning.
        let raw = "TIME COMM PID LAT(ms)\nbash 1234 5.2\nngrok 555 3.1\n";
        let result = parse_tabular_events(raw, 10);
        assert_eq!(result.events.len(), 2);
        assert_eq!(result.events[0].time.as_deref(), Some("bash"));
        assert_eq!(result.events[0].comm.as_deref(), Some("1234"));
        assert_eq!(result.events[0].pid, Some(0)); // "5.2" doesn't parse as i32
    }

    #[test]
    fn truncates_at_max_events() {
        let raw = "TIME COMM PID\nbash 1 0\nngrok 2 0\ncurl 3 0\n";
        let result = parse_tabular_events(raw, 1);
        assert_eq!(result.events.len(), 1);
        assert!(result.truncated);
    }

    #[test]
    fn unparsable_pid_defaults_to_zero() {
        let raw = "PID COMM\nabc bash\n";
        let result = parse_tabular_events(raw, 10);
        assert_eq!(result.events[0].pid, Some(0));
    }

    #[test]
    fn numeric_detail_column_is_typed_as_number() {
        let raw = "COMM LAT\nbash 5.2\n";
        let result = parse_tabular_events(raw, 10);
        assert_eq!(result.events[0].details.get("lat"), Some(&Scalar::Number(5.2)));
    }
}
