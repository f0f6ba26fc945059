use std::collections::HashMap;

use super::{BatchError, ID_COLUMN, LATITUDE_COLUMN, LONGITUDE_COLUMN};
use crate::domain::BatchForwardResult;

/// Row id -> `[latitude, longitude]`, verbatim from the response
pub type ResultRows = HashMap<String, [String; 2]>;

/// Decode a dataflow result document into [`ResultRows`].
///
/// # Precondition
/// The first line is the service banner and is dropped unread. A document
/// without any newline therefore decodes to an empty mapping. If Bing ever
/// stops sending the banner, the CSV header would be swallowed instead and
/// the first data row read as a header.
///
/// Duplicate ids overwrite each other; the last row wins.
pub fn adapt_results(response: &str) -> Result<ResultRows, BatchError> {
    let body = match response.split_once('\n') {
        Some((_banner, rest)) => rest,
        None => "",
    };
    if body.trim().is_empty() {
        return Ok(ResultRows::new());
    }

    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(body.as_bytes());

    // Bing sends many more columns than these three; the rest are ignored.
    // A repeated header name resolves to its last column.
    let headers = rdr.headers()?.clone();
    let column = |name: &'static str| {
        headers
            .iter()
            .enumerate()
            .filter(|(_, h)| *h == name)
            .map(|(idx, _)| idx)
            .last()
            .ok_or(BatchError::MissingColumn(name))
    };
    let (id, lat, lng) = (
        column(ID_COLUMN)?,
        column(LATITUDE_COLUMN)?,
        column(LONGITUDE_COLUMN)?,
    );

    let mut rows = ResultRows::new();
    for record in rdr.records() {
        let record = record?;
        // Short rows are allowed; absent fields read as empty
        let field = |idx: usize| record.get(idx).unwrap_or_default().to_string();
        rows.insert(field(id), [field(lat), field(lng)]);
    }

    Ok(rows)
}

/// Same as [`adapt_results`] for a raw downloaded body
pub fn adapt_results_bytes(response: Vec<u8>) -> Result<ResultRows, BatchError> {
    let text = String::from_utf8(response)?;
    adapt_results(&text)
}

/// Pair each submitted address position with its result.
///
/// Produces exactly `count` results in submission order. Ids the service
/// did not return, and rows it could not geocode (both coordinates blank),
/// yield an empty result.
pub fn ordered_results(mut rows: ResultRows, count: usize) -> Vec<BatchForwardResult> {
    (0..count)
        .map(|idx| {
            let pair = rows
                .remove(&idx.to_string())
                .filter(|pair| pair.iter().any(|v| !v.trim().is_empty()));
            BatchForwardResult::new(pair)
        })
        .collect()
}
