//! jobharvest - remote job listing scraper.
//!
//! Fetches job postings from a remote-job board (HTML pages, RSS feed,
//! or JSON API), normalizes them into a flat record schema, filters by
//! keyword/location/date, and emits JSON lines to an append-only sink.

pub mod cli;
pub mod config;
pub mod dedupe;
pub mod extract;
pub mod fetch;
pub mod filter;
pub mod models;
pub mod paginate;
pub mod run;
pub mod sanitize;
pub mod sink;
