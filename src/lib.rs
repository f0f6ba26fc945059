//! geobatch - Batch forward geocoding through the Bing Spatial Data Services dataflow

pub mod api;
pub mod batch;
pub mod config;
pub mod domain;
