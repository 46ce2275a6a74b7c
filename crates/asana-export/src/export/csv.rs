//! CSV rendering.
//!
//! CSV is flat, so this path is lossy: the header is taken from the first
//! row only, later rows are fitted to it (missing keys blank, extra keys
//! dropped) and nested values are written as compact JSON inside one cell.

use std::io::Write;

use serde_json::{Map, Value};

/// Write `rows` as CSV. An empty slice writes nothing.
///
/// # Errors
/// Returns error if a cell cannot be encoded or the writer fails.
pub fn write_rows<W: Write>(rows: &[Map<String, Value>], writer: W) -> Result<(), csv::Error> {
    let Some(first) = rows.first() else {
        return Ok(());
    };

    let header: Vec<&str> = first.keys().map(String::as_str).collect();
    let mut out = csv::Writer::from_writer(writer);
    out.write_record(&header)?;

    for row in rows {
        let cells = header
            .iter()
            .map(|key| row.get(*key).map(cell).unwrap_or_default());
        out.write_record(cells)?;
    }

    out.flush()?;
    Ok(())
}

/// Render one value as a cell.
fn cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        nested @ (Value::Array(_) | Value::Object(_)) => nested.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn row(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test rows are objects"),
        }
    }

    fn render(rows: &[Map<String, Value>]) -> String {
        let mut buf = Vec::new();
        write_rows(rows, &mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_header_from_first_row() {
        let rows = [
            row(json!({"name": "A", "completed": false})),
            row(json!({"name": "B", "completed": true, "extra": "dropped"})),
            row(json!({"completed": true})),
        ];

        assert_eq!(render(&rows), "name,completed\nA,false\nB,true\n,true\n");
    }

    #[test]
    fn test_nested_values_in_one_cell() {
        let rows = [row(json!({
            "name": "A",
            "due_on": null,
            "comments": [{"creator_time": "Ada - 2024", "text": "hi"}]
        }))];

        let out = render(&rows);
        let mut reader = csv::Reader::from_reader(out.as_bytes());
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[1], "");
        assert_eq!(
            &record[2],
            r#"[{"creator_time":"Ada - 2024","text":"hi"}]"#
        );
    }

    #[test]
    fn test_empty_input_writes_nothing() {
        assert_eq!(render(&[]), "");
    }
}
