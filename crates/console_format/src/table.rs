//! `console.table` rendering.
//!
//! Builds a fixed-width box-drawing grid from an array of records, an array
//! of primitives or a plain object. The grid is lossy (row cap, column
//! width cap), so the full serialization travels with it as a fallback.

use unicode_segmentation::UnicodeSegmentation;

use common::limits::{MAX_COLUMN_WIDTH, MAX_TABLE_ROWS, MIN_COLUMN_WIDTH};
use common::{JsObject, Value};

use crate::error::FormatError;
use crate::serialize::serialize;

const INDEX_HEADER: &str = "(index)";
const KEY_HEADER: &str = "key";
const VALUE_HEADER: &str = "value";
const ELLIPSIS: &str = "...";

/// Grid text plus the full serialization of the source value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableText {
    pub grid: String,
    pub fallback: String,
}

impl TableText {
    /// Message text carried by the log entry.
    pub fn to_message(&self) -> String {
        format!("{}\n\nOriginal object:\n{}", self.grid, self.fallback)
    }
}

/// Headers and the first rows of cells, already stringified.
struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    total_rows: usize,
}

/// Render `data` as a table.
pub fn render_table(data: &Value) -> Result<TableText, FormatError> {
    let table = match data {
        Value::Array(array) if !array.is_empty() => {
            let items = array.items();
            if items[0].is_object() {
                record_table(&items)?
            } else {
                indexed_table(items.iter().enumerate().map(|(i, v)| (i.to_string(), v.clone())), items.len())
            }
        }
        Value::Object(object) => object_table(object)?,
        Value::Array(_) => return Err(FormatError::UnsupportedTableShape("empty array")),
        other => return Err(FormatError::UnsupportedTableShape(other.type_of())),
    };

    Ok(TableText {
        grid: draw_grid(&table),
        fallback: serialize(data),
    })
}

/// Rows are records; columns are the first record's keys.
fn record_table(items: &[Value]) -> Result<Table, FormatError> {
    let headers = own_keys(&items[0])?;
    let mut rows = Vec::new();
    for item in items.iter().take(MAX_TABLE_ROWS) {
        let mut row = Vec::with_capacity(headers.len());
        for header in &headers {
            row.push(cell(item, header)?);
        }
        rows.push(row);
    }
    Ok(Table {
        headers,
        rows,
        total_rows: items.len(),
    })
}

fn indexed_table(entries: impl Iterator<Item = (String, Value)>, total_rows: usize) -> Table {
    let rows = entries
        .take(MAX_TABLE_ROWS)
        .map(|(index, value)| vec![index, value.to_js_string()])
        .collect();
    Table {
        headers: vec![INDEX_HEADER.to_string(), VALUE_HEADER.to_string()],
        rows,
        total_rows,
    }
}

fn object_table(object: &JsObject) -> Result<Table, FormatError> {
    let keys = object.own_keys()?;
    let array_like = !keys.is_empty() && keys.iter().all(|k| is_index_key(k));

    if array_like {
        let mut entries = Vec::new();
        for key in keys.iter().take(MAX_TABLE_ROWS) {
            entries.push((key.clone(), object.get(key)?));
        }
        return Ok(indexed_table(entries.into_iter(), keys.len()));
    }

    let mut rows = Vec::new();
    for (index, key) in keys.iter().enumerate().take(MAX_TABLE_ROWS) {
        let value = object.get(key)?;
        rows.push(vec![index.to_string(), key.clone(), value.to_js_string()]);
    }
    Ok(Table {
        headers: vec![
            INDEX_HEADER.to_string(),
            KEY_HEADER.to_string(),
            VALUE_HEADER.to_string(),
        ],
        rows,
        total_rows: keys.len(),
    })
}

fn is_index_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

/// Own keys of an object-like row.
fn own_keys(value: &Value) -> Result<Vec<String>, FormatError> {
    match value {
        Value::Object(object) => Ok(object.own_keys()?),
        Value::Array(array) => Ok((0..array.len()).map(|i| i.to_string()).collect()),
        _ => Ok(Vec::new()),
    }
}

/// Cell text; absent and non-record rows give an empty cell.
fn cell(row: &Value, header: &str) -> Result<String, FormatError> {
    let value = match row {
        Value::Object(object) => object.get(header)?,
        Value::Array(array) => match header.parse::<usize>() {
            Ok(index) => array.get(index),
            Err(_) => Value::Undefined,
        },
        _ => Value::Undefined,
    };
    Ok(match value {
        Value::Undefined => String::new(),
        other => other.to_js_string(),
    })
}

fn width_of(text: &str) -> usize {
    text.graphemes(true).count()
}

/// Truncate to `width` (with a trailing ellipsis) and pad to `width`.
fn fit(text: &str, width: usize) -> String {
    let len = width_of(text);
    let mut out = if len > width {
        let keep = width.saturating_sub(ELLIPSIS.len());
        let mut cut: String = text.graphemes(true).take(keep).collect();
        cut.push_str(ELLIPSIS);
        cut
    } else {
        text.to_string()
    };
    let used = width_of(&out);
    out.extend(std::iter::repeat(' ').take(width.saturating_sub(used)));
    out
}

fn draw_grid(table: &Table) -> String {
    if table.headers.is_empty() || table.rows.is_empty() {
        return "Table: Empty".to_string();
    }

    let widths: Vec<usize> = table
        .headers
        .iter()
        .enumerate()
        .map(|(column, header)| {
            let widest_cell = table
                .rows
                .iter()
                .map(|row| row.get(column).map(|c| width_of(c)).unwrap_or(0))
                .max()
                .unwrap_or(0);
            width_of(header)
                .max(widest_cell)
                .clamp(MIN_COLUMN_WIDTH, MAX_COLUMN_WIDTH)
        })
        .collect();

    let border = |left: &str, joint: &str, right: &str| {
        let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
        format!("{}{}{}\n", left, segments.join(joint), right)
    };
    let line = |cells: &[String]| {
        let fitted: Vec<String> = widths
            .iter()
            .enumerate()
            .map(|(i, w)| fit(cells.get(i).map(String::as_str).unwrap_or(""), *w))
            .collect();
        format!("│ {} │\n", fitted.join(" │ "))
    };

    let mut grid = String::from("Table:\n");
    grid.push_str(&border("┌", "┬", "┐"));
    grid.push_str(&line(&table.headers));
    grid.push_str(&border("├", "┼", "┤"));
    for row in &table.rows {
        grid.push_str(&line(row));
    }
    grid.push_str(&border("└", "┴", "┘"));

    if table.total_rows > table.rows.len() {
        grid.push_str(&format!(
            "... ({} more rows)",
            table.total_rows - table.rows.len()
        ));
    }
    grid
}
