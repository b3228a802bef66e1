//! # ADX Common Library
//!
//! Shared code for the ADX convert services:
//! - Error type and result alias
//! - Service configuration resolution (CLI/env, TOML file, compiled defaults)
//! - Clock abstraction for wall-clock dependent logic

pub mod config;
pub mod error;
pub mod time;

pub use error::{Error, Result};
pub use time::{Clock, SystemClock};
