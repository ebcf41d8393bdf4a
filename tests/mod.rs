//! Test suite for the activity hub
//!
//! This module organizes all tests

pub mod e2e;
pub mod integration;
pub mod property;
