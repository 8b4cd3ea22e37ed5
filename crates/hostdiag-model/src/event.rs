//! Normalized tool-output events (tabular event parser target shape).

use std::collections::HashMap;

/// A typed scalar value parsed from a tabular tool output column.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum Scalar {
    /// A column that parsed as a float.
    Number(f64),
    /// A column kept as its original text.
    Text(String),
}

/// One row of a tabular tool output, normalized to a shared shape.
///
/// `time`, `pid`, and `comm` are lifted into dedicated fields when a
/// column with that (lower-cased) header name is present; every other
/// column lands in `details`, typed as [`Scalar::Number`] when it parses
/// as a float and [`Scalar::Text`] otherwise.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Event {
    /// Raw `time` column text, if present.
    pub time: Option<String>,
    /// Parsed `pid` column, 0 when present but unparsable.
    pub pid: Option<i32>,
    /// Raw `comm` column text, if present.
    pub comm: Option<String>,
    /// Every other column, keyed by lower-cased header name.
    pub details: HashMap<String, Scalar>,
}

impl Event {
    /// An empty event with no fields set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a non-dedicated column into `details`, typing it as a
    /// number when it parses as a float, otherwise as text.
    pub fn set_detail(&mut self, key: impl Into<String>, raw: &str) {
        let value = match raw.parse::<f64>() {
            Ok(n) => Scalar::Number(n),
            Err(_) => Scalar::Text(raw.to_string()),
        };
        self.details.insert(key.into(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_detail_parses_as_number() {
        let mut e = Event::new();
        e.set_detail("lat(ms)", "5.2");
        assert_eq!(e.details.get("lat(ms)"), Some(&Scalar::Number(5.2)));
    }

    #[test]
    fn non_numeric_detail_stays_text() {
        let mut e = Event::new();
        e.set_detail("state", "RUNNING");
        assert_eq!(e.details.get("state"), Some(&Scalar::Text("RUNNING".to_string())));
    }
}
