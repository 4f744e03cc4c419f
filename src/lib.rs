//! TIPSTER: daily football coupon picker and Telegram publisher
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod types;
pub mod coupon;
pub mod provider;
pub mod strategy;
pub mod engine;
pub mod notify;
pub mod schedule;
pub mod storage;
