//! Selection messages exchanged between peers.
//!
//! The wire form is bincode over a plain `(u32, u8)` record: the raw self
//! id and the 1-based player number. Decoding checks the player number.

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

use crate::cards::SelfId;
use crate::core::error::{NetError, NetResult};
use crate::core::PlayerId;

/// "`player` selected `self_id`", as sent to or received from a peer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SelectionMessage {
    pub self_id: SelfId,
    pub player: PlayerId,
}

#[derive(Serialize, Deserialize)]
struct WireSelection {
    self_id: u32,
    player: u8,
}

impl SelectionMessage {
    #[must_use]
    pub fn new(self_id: SelfId, player: PlayerId) -> Self {
        Self { self_id, player }
    }

    /// Encode for the transport.
    pub fn encode(&self) -> NetResult<Vec<u8>> {
        let wire = WireSelection {
            self_id: self.self_id.raw(),
            player: self.player.number(),
        };
        Ok(bincode::serialize(&wire)?)
    }

    /// Decode a payload received from a peer.
    ///
    /// ## Errors
    ///
    /// `Codec` for malformed bytes, `InvalidPlayer` for a player number
    /// other than 1 or 2.
    pub fn decode(bytes: &[u8]) -> NetResult<Self> {
        let wire: WireSelection = bincode::deserialize(bytes)?;
        let player = PlayerId::from_number(wire.player).ok_or(NetError::InvalidPlayer(wire.player))?;
        Ok(Self {
            self_id: SelfId::new(wire.self_id),
            player,
        })
    }
}

/// Outbound half of the network boundary.
///
/// In online mode the session calls this instead of touching its own
/// engine. The transport is expected to deliver the message to every peer
/// (including the sender), which then calls `GameSession::receive_remote`.
pub trait SelectionSink: Send + Sync {
    fn send_selection(&self, message: &SelectionMessage) -> NetResult<()>;
}

/// Sink that pushes encoded messages into a tokio channel.
///
/// Useful as a loopback transport and in tests.
#[derive(Clone, Debug)]
pub struct ChannelSink {
    tx: UnboundedSender<Vec<u8>>,
}

impl ChannelSink {
    #[must_use]
    pub fn new(tx: UnboundedSender<Vec<u8>>) -> Self {
        Self { tx }
    }
}

impl SelectionSink for ChannelSink {
    fn send_selection(&self, message: &SelectionMessage) -> NetResult<()> {
        let bytes = message.encode()?;
        self.tx
            .send(bytes)
            .map_err(|_| NetError::Transport("channel closed".to_string()))
    }
}
