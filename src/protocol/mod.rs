//! Backend wire protocol.

mod messages;

pub use messages::*;
