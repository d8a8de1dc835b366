use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum SheetError {
    #[error("payload is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("{0}")]
    Malformed(String),
}

/// One data row of an uploaded sheet. Cells are kept as raw text; grade
/// validation happens at the API layer so row numbers end up in the error
/// messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SheetRow {
    /// 1-based data row number (the header is row 0).
    pub(crate) row: usize,
    pub(crate) record_id: String,
    pub(crate) grades: Vec<String>,
}

pub(crate) fn decode_payload(encoded: &str) -> Result<Vec<u8>, SheetError> {
    Ok(STANDARD.decode(encoded.trim())?)
}

#[cfg(test)]
pub(crate) fn encode_payload(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

pub(crate) fn write_sheet(
    headers: &[&str],
    rows: impl IntoIterator<Item = Vec<String>>,
) -> Result<Vec<u8>, SheetError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(headers).map_err(|err| SheetError::Malformed(err.to_string()))?;
    for row in rows {
        writer.write_record(&row).map_err(|err| SheetError::Malformed(err.to_string()))?;
    }
    writer
        .into_inner()
        .map_err(|err| SheetError::Malformed(err.to_string()))
}

/// Reads a sheet previously produced by [`write_sheet`]. Columns are looked
/// up by header name so reordered or extra display columns do not break the
/// import.
pub(crate) fn read_sheet(
    bytes: &[u8],
    id_column: &str,
    grade_columns: &[&str],
) -> Result<Vec<SheetRow>, SheetError> {
    let mut reader = csv::ReaderBuilder::new().has_headers(true).from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|err| SheetError::Malformed(format!("spreadsheet has no header row: {err}")))?
        .clone();

    let id_index = column_index(&headers, id_column)?;
    let grade_indexes = grade_columns
        .iter()
        .map(|column| column_index(&headers, column))
        .collect::<Result<Vec<_>, _>>()?;

    let mut rows = Vec::new();
    for (offset, record) in reader.records().enumerate() {
        let row = offset + 1;
        let record = record
            .map_err(|err| SheetError::Malformed(format!("row {row} is not valid: {err}")))?;

        let record_id = record
            .get(id_index)
            .ok_or_else(|| SheetError::Malformed(format!("row {row} is missing {id_column}")))?
            .trim()
            .to_string();

        let grades = grade_indexes
            .iter()
            .map(|&index| record.get(index).unwrap_or("").trim().to_string())
            .collect();

        rows.push(SheetRow { row, record_id, grades });
    }

    Ok(rows)
}

fn column_index(headers: &csv::StringRecord, column: &str) -> Result<usize, SheetError> {
    headers
        .iter()
        .position(|header| header.trim() == column)
        .ok_or_else(|| SheetError::Malformed(format!("spreadsheet is missing column {column}")))
}

pub(crate) fn grade_cell(grade: Option<f64>) -> String {
    match grade {
        Some(value) => format!("{value}"),
        None => String::new(),
    }
}
