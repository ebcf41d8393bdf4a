//! Property-based tests

pub mod stats_proptest;
