//! Token models shared by the client, stores, and session flows.

pub mod grant;
pub mod secret;
pub mod session;
