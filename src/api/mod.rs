//! HTTP API Module
//!
//! Provides the REST API in front of the media bucket.

pub mod auth;
mod http;

pub use http::{AppState, HttpServer};
