//! tophn library
//!
//! Fetches the top Hacker News items on a timer, serves them from an in-memory
//! cache and archives the list once per day. The binary and the integration
//! tests are built on these modules.

pub mod archive;
pub mod cache;
pub mod cli;
pub mod data;
pub mod logger;
pub mod refresh;
