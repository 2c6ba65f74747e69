//! Middleware module for the Inkboard HTTP server
//!
//! Provides bearer-token authentication for the request/response routes.

pub mod auth;
