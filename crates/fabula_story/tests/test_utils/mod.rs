//! Shared helpers for generator tests.

#[allow(unused_imports)]
pub use fabula_models::mock::{JPEG_BYTES, MockDriver, MockResponse, PNG_BYTES};
