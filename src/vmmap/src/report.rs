//! Best-effort parsing support for human-readable debugger reports.

use std::fmt;

/// A line that could not be interpreted and was skipped
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseWarning {
    /// 1-based line number within the report
    pub line_no: usize,
    pub line: String,
    pub reason: String,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {} ({:?})", self.line_no, self.reason, self.line)
    }
}

/// Parser output together with the lines it had to skip
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed<T> {
    pub value: T,
    pub warnings: Vec<ParseWarning>,
}

impl<T> Parsed<T> {
    pub fn new(value: T) -> Self {
        Parsed {
            value,
            warnings: Vec::new(),
        }
    }

    pub fn warn(&mut self, line_no: usize, line: &str, reason: impl Into<String>) {
        self.warnings.push(ParseWarning {
            line_no,
            line: line.to_string(),
            reason: reason.into(),
        });
    }

    /// Emit every warning to the tracing sink under `source` and return the value
    pub fn log_warnings(self, source: &str) -> T {
        for warning in &self.warnings {
            tracing::warn!(source, "Skipping unparseable report line: {}", warning);
        }
        self.value
    }
}

/// Parse a hex token with or without a `0x` prefix
pub fn parse_hex(token: &str) -> Option<u64> {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    u64::from_str_radix(digits, 16).ok()
}

/// Split on runs of whitespace into at most `n` fields
///
/// The last field keeps the remainder of the line, inner whitespace included.
pub fn splitn_whitespace(line: &str, n: usize) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut rest = line.trim();

    while !rest.is_empty() {
        if fields.len() + 1 == n {
            fields.push(rest);
            break;
        }
        match rest.find(char::is_whitespace) {
            Some(idx) => {
                fields.push(&rest[..idx]);
                rest = rest[idx..].trim_start();
            }
            None => {
                fields.push(rest);
                break;
            }
        }
    }

    fields
}
