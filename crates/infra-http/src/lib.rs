// ocrdeck Infrastructure - Recognition backend over HTTP
// Implements the RecognitionBackend port with reqwest

pub mod client;
pub mod config;
pub mod convert;
pub mod error;
pub mod wire;

pub use client::HttpRecognitionBackend;
pub use config::HttpBackendConfig;
pub use error::HttpError;
