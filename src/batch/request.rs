use super::{BANNER, BatchError, COLUMNS};

/// Encode addresses as a Bing geocode dataflow upload.
///
/// The document is the service banner, the fixed four-column header and one
/// `(idx, address, "", "")` row per address. Addresses are written as given;
/// the zero-based position becomes the row `Id` that comes back in the
/// response.
pub fn generate_batch<S: AsRef<str>>(addresses: &[S]) -> Result<String, BatchError> {
    let mut body = Vec::new();
    {
        let mut wtr = csv::WriterBuilder::new()
            .terminator(csv::Terminator::CRLF)
            .from_writer(&mut body);

        wtr.write_record(COLUMNS)?;
        for (idx, address) in addresses.iter().enumerate() {
            wtr.write_record([idx.to_string().as_str(), address.as_ref(), "", ""])?;
        }
        wtr.flush().map_err(csv::Error::from)?;
    }
    let body = String::from_utf8(body)?;

    Ok(format!("{BANNER}\n{body}"))
}
