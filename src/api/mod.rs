pub mod dataflow;

pub use dataflow::{DataflowClient, DataflowJob, JobStatus};
