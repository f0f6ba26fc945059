//! CSV documents exchanged with the Bing geocode dataflow

pub mod error;
pub mod request;
pub mod response;

pub use error::{Axis, BatchError};
pub use request::generate_batch;
pub use response::{ResultRows, adapt_results, adapt_results_bytes, ordered_results};

/// First line of every dataflow upload and download
pub const BANNER: &str = "Bing Spatial Data Services, 2.0";

pub const ID_COLUMN: &str = "Id";
pub const QUERY_COLUMN: &str = "GeocodeRequest/Query";
pub const LATITUDE_COLUMN: &str = "GeocodeResponse/Point/Latitude";
pub const LONGITUDE_COLUMN: &str = "GeocodeResponse/Point/Longitude";

pub const COLUMNS: [&str; 4] = [ID_COLUMN, QUERY_COLUMN, LATITUDE_COLUMN, LONGITUDE_COLUMN];

/// Encode/decode seam used by the dataflow client.
///
/// The client owns transport, the key and job polling; a format only turns
/// addresses into an upload body and a downloaded body into result rows.
pub trait BatchFormat {
    fn generate_batch(&self, addresses: &[String]) -> Result<String, BatchError>;

    fn adapt_results(&self, response: &str) -> Result<ResultRows, BatchError>;
}

/// Forward geocoding: free-text address in, point out
#[derive(Debug, Clone, Copy, Default)]
pub struct BingBatchForward;

impl BatchFormat for BingBatchForward {
    fn generate_batch(&self, addresses: &[String]) -> Result<String, BatchError> {
        request::generate_batch(addresses)
    }

    fn adapt_results(&self, response: &str) -> Result<ResultRows, BatchError> {
        response::adapt_results(response)
    }
}
