//! Inkboard - collaborative drawing board server
//!
//! Library half of the `inkboard` binary: configuration, the HTTP API,
//! authentication middleware and router assembly. Integration tests build
//! the router from here.

#![forbid(unsafe_code)]

pub mod api;
pub mod middleware;
pub mod server;
