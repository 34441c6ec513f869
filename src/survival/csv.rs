//! Minimal CSV parser with quoted-field support and type coercion

use crate::{Error, Result};

/// A parsed cell value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Null,
}

impl Value {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// One data row keyed by header name, preserving header order
#[derive(Debug, Clone)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .map(|i| &self.values[i])
    }

    pub fn number(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(Value::as_number)
    }

    pub fn text(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(Value::as_text)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

/// Split one line on commas, honoring double-quoted fields. A doubled
/// quote inside a quoted field unescapes to a single quote.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(ch),
        }
    }
    fields.push(current);
    fields
}

fn coerce(raw: &str) -> Value {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "NULL" || trimmed == "null" || trimmed == "NaN" {
        return Value::Null;
    }
    // f64::from_str also accepts "nan"/"inf"; only the literals above
    // mean missing, so non-finite parses stay text.
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => Value::Number(n),
        _ => Value::Text(raw.to_string()),
    }
}

/// Parse delimited text whose first line is the header.
///
/// Rows whose field count does not match the header are dropped, not
/// fatal. Fails only when there is no data at all (fewer than two lines).
pub fn parse_csv(text: &str) -> Result<Vec<Row>> {
    let mut lines = text
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty());

    let header_line = lines
        .next()
        .ok_or_else(|| Error::Parse("empty input".into()))?;
    let columns = split_fields(header_line);

    let mut rows = Vec::new();
    let mut dropped = 0usize;
    for line in lines {
        let fields = split_fields(line);
        if fields.len() != columns.len() {
            dropped += 1;
            continue;
        }
        rows.push(Row {
            columns: columns.clone(),
            values: fields.iter().map(|f| coerce(f)).collect(),
        });
    }

    if dropped > 0 {
        eprintln!("dropped {dropped} row(s) with mismatched field counts");
    }
    if rows.is_empty() {
        return Err(Error::Parse("no data rows (header only or empty)".into()));
    }
    Ok(rows)
}
