//! Integration tests across hub components

pub mod api_test;
pub mod realtime_test;
pub mod reference_test;
