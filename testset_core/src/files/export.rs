//! CSV export of test-set rows

use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde_json::{Map, Value};

use crate::error::Result;

/// One exported record, keyed by column name.
pub type Row = Map<String, Value>;

/// Serializes `rows` as CSV with a header line.
///
/// Header entries that are `None` or empty are dropped; the remaining columns
/// keep their relative order. Records are CRLF-separated and the output has no
/// trailing terminator. A header that filters down to nothing yields an empty
/// string.
pub fn convert_to_csv(rows: &[Row], header: &[Option<String>]) -> Result<String> {
    let columns: Vec<&str> = header
        .iter()
        .filter_map(|column| column.as_deref())
        .filter(|column| !column.is_empty())
        .collect();

    if columns.is_empty() {
        return Ok(String::new());
    }

    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::CRLF)
        .from_writer(Vec::new());

    writer.write_record(&columns)?;

    for row in rows {
        let record: Vec<String> = columns
            .iter()
            .map(|column| render_field(row.get(*column)))
            .collect();
        writer.write_record(&record)?;
    }

    let bytes = writer.into_inner()?;
    let mut text = String::from_utf8(bytes)
        .map_err(|e| anyhow::anyhow!("CSV output was not UTF-8: {}", e))?;

    if text.ends_with("\r\n") {
        text.truncate(text.len() - 2);
    }

    Ok(text)
}

/// Replaces every literal `\n` with the two characters `\` `n`.
pub fn escape_newlines(value: &str) -> String {
    value.replace('\n', "\\n")
}

fn render_field(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(nested) => nested.to_string(),
    }
}
