//! Session credentials, refresh-endpoint payloads, and redacted token secrets.

pub mod token;

pub use token::{grant::*, secret::*, session::*};
