//! Common test infrastructure for deepomatic-api tests
//!
//! # Usage
//!
//! In your test file, add:
//! ```ignore
//! mod common;
//! use common::*;
//! ```

// Not every test file uses every helper
#![allow(dead_code)]

pub mod mock_server;

pub use mock_server::*;
