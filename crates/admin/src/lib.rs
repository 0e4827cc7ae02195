//! # Admin
//!
//! Request/reply control channel.
//!
//! Responsibilities:
//! - Serve operator commands over a local TCP endpoint
//! - `status`: report daemon counters without mutating pipeline state
//! - `flush`: trigger an out-of-cycle flush, replying once dispatched
//! - `shutdown`: cancel the shared root token (same path as an OS signal)
//!
//! Unknown or malformed commands get an explicit error reply; the channel
//! never silently ignores a request and the connection stays open after an
//! error.

mod error;
mod protocol;
mod server;

pub use error::AdminError;
pub use protocol::{AdminReply, AdminRequest, StatusBody};
pub use server::{AdminContext, AdminServer};
