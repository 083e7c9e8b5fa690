//! Browser collaborator for page fetching
//!
//! This module contains:
//! - The `BrowserSession` / `BrowserPage` traits the crawler consumes
//! - `HttpBrowser`, an implementation over a plain HTTP client

mod http;
mod traits;

pub use http::{build_http_client, HttpBrowser, HttpPage};
pub use traits::{BrowserError, BrowserPage, BrowserSession, PageResponse};
