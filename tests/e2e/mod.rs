//! End-to-end tests against a real listener

pub mod websocket_test;
