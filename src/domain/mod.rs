pub mod result;

pub use result::BatchForwardResult;
