//! Network boundary for online play.
//!
//! The crate does not move bytes itself. It defines the message, its wire
//! encoding, and the `SelectionSink` trait a transport implements.

mod message;

pub use message::{ChannelSink, SelectionMessage, SelectionSink};
