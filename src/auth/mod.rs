//! Session state for the authenticated API client.

mod session;

pub use session::SessionData;
