use super::normalizer::{clean_cell_text, column_letter_id};
use super::{ColumnMeta, RowSourceError, SheetPayload};
use crate::workflows::dashboard::dates::{format_day_first, instant_date_at};
use crate::workflows::dashboard::{CellValue, RawRow};
use chrono::FixedOffset;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::io::Read;

#[derive(Debug, Deserialize)]
struct ScriptResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    headers: Vec<ScriptHeader>,
    #[serde(default)]
    tasks: Option<Vec<Map<String, Value>>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ScriptHeader {
    id: Option<String>,
    label: Option<String>,
}

/// Decodes an Apps Script `fetchTasks` response body.
///
/// Rows arrive as objects keyed by header id and are turned positional in
/// header order. At least `min_width` positions are produced, falling back to
/// letter ids past the end of the header list. Date instants are rewritten as
/// `DD/MM/YYYY` in the sheet's `offset`.
pub(crate) fn parse_script_payload(
    body: &[u8],
    min_width: usize,
    offset: FixedOffset,
) -> Result<SheetPayload, RowSourceError> {
    let response: ScriptResponse = serde_json::from_slice(body)
        .map_err(|err| RowSourceError::Format(format!("response is not valid JSON: {err}")))?;

    if !response.success {
        let reason = response
            .error
            .filter(|message| !message.trim().is_empty())
            .unwrap_or_else(|| "row source reported failure".to_string());
        tracing::warn!(error = %reason, "row source reported an unsuccessful payload");
        return Err(RowSourceError::Fetch(reason));
    }

    let tasks = response
        .tasks
        .ok_or_else(|| RowSourceError::Format("response has no tasks array".to_string()))?;

    let headers: Vec<ColumnMeta> = response
        .headers
        .into_iter()
        .enumerate()
        .map(|(index, header)| ColumnMeta {
            id: header
                .id
                .map(|id| clean_cell_text(&id))
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| column_letter_id(index)),
            label: header.label,
        })
        .collect();

    let width = headers.len().max(min_width);
    let ids: Vec<String> = (0..width)
        .map(|index| {
            headers
                .get(index)
                .map(|header| header.id.clone())
                .unwrap_or_else(|| column_letter_id(index))
        })
        .collect();

    let rows = tasks
        .iter()
        .map(|object| {
            ids.iter()
                .map(|id| {
                    object
                        .get(id)
                        .map(|value| json_cell(value, offset))
                        .unwrap_or(CellValue::Empty)
                })
                .collect::<RawRow>()
        })
        .collect();

    Ok(SheetPayload { headers, rows })
}

fn json_cell(value: &Value, offset: FixedOffset) -> CellValue {
    match value {
        Value::Null => CellValue::Empty,
        Value::Bool(flag) => CellValue::Bool(*flag),
        Value::Number(number) => number
            .as_f64()
            .map(CellValue::Number)
            .unwrap_or(CellValue::Empty),
        Value::String(text) => match instant_date_at(text, offset) {
            Some(date) => CellValue::from_text(format_day_first(date)),
            None => CellValue::from_text(clean_cell_text(text)),
        },
        other => CellValue::from_text(other.to_string()),
    }
}

/// Reads a CSV sheet export. The first record is the header row.
pub(crate) fn parse_csv<R: Read>(reader: R) -> Result<SheetPayload, RowSourceError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<ColumnMeta> = csv_reader
        .headers()?
        .iter()
        .enumerate()
        .map(|(index, label)| {
            let label = clean_cell_text(label);
            ColumnMeta {
                id: column_letter_id(index),
                label: (!label.is_empty()).then_some(label),
            }
        })
        .collect();

    let mut rows = Vec::new();
    let mut ragged = 0usize;
    for record in csv_reader.records() {
        let record = record?;
        if record.len() != headers.len() {
            ragged += 1;
        }
        rows.push(
            record
                .iter()
                .map(|cell| CellValue::from_text(clean_cell_text(cell)))
                .collect::<RawRow>(),
        );
    }

    if ragged > 0 {
        tracing::warn!(
            ragged,
            columns = headers.len(),
            "csv rows with a different width than the header row"
        );
    }
    Ok(SheetPayload { headers, rows })
}
