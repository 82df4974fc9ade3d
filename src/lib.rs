//! Request-authentication gate for the edge service API.
//!
//! Most routes require an HMAC-signed JWT in the `Authorization` header,
//! verified against a passphrase that is loaded from (or generated into)
//! `passPhraseJWT.txt`. A fixed allow-list of paths bypasses the check.

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod middleware;
pub mod services;
