//! Client-facing messages.
//!
//! Applications talk to the stack-and-tile core over the host's IPC link;
//! one magic identifier tags the messages, a sub-code selects stacking or
//! tiling, and an operation code plus payload follows. The payloads are
//! plain serde types, encoded with `bincode` on the wire.

use crate::{
    error::{Error, Result},
    group::GroupArchive,
};
use serde::{Deserialize, Serialize};

/// Magic identifier tagging stack-and-tile messages (`'SATI'`)
pub const SAT_IDENTIFIER: u32 = 0x5341_5449;

/// Which feature a message addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SatTarget {
    /// Window stacking operations
    Stacking,
    /// Window tiling operations
    Tiling,
}

/// Operations a client may request.
///
/// Windows are addressed by their stable 64-bit id; stack positions are
/// indices into the sender's area, `-1` meaning the end of the stack.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SatRequest {
    /// Stack the given window onto the sender's stack
    AddWindowToStack {
        /// Stable id of the window to add
        window:   u64,
        /// Position of the stacking parent, `-1` = end
        position: i32,
    },
    /// Remove the given window from the sender's group
    RemoveWindowFromStack {
        /// Stable id of the window to remove
        window: u64,
    },
    /// Remove the window at a stack position
    RemoveWindowFromStackAt {
        /// Position in the sender's stack
        position: i32,
    },
    /// How many windows share the sender's stack
    CountWindowsOnStack,
    /// Which window sits at a stack position
    WindowOnStackAt {
        /// Position in the sender's stack
        position: i32,
    },
    /// Is the given window on the sender's stack?
    StackHasWindow {
        /// Stable id of the candidate
        window: u64,
    },
    /// Serialize every multi-window group
    SaveAllGroups,
    /// Rebuild one group from its archive
    RestoreGroup {
        /// The archived group
        archive: GroupArchive,
    },
}

/// Replies to [`SatRequest`]s
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SatReply {
    /// The request succeeded
    Ok,
    /// The request referenced an unknown window or position
    BadValue,
    /// Reply to [`SatRequest::CountWindowsOnStack`]
    Count(i32),
    /// Reply carrying one window id
    Window(u64),
    /// Reply to [`SatRequest::StackHasWindow`]
    Has(bool),
    /// Reply to [`SatRequest::SaveAllGroups`]
    Groups(Vec<GroupArchive>),
}

/// One tagged message as it travels over the link
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SatMessage {
    /// Always [`SAT_IDENTIFIER`]
    pub magic:   u32,
    /// Stacking or tiling
    pub target:  SatTarget,
    /// The operation
    pub request: SatRequest,
}

impl SatMessage {
    /// Tag a stacking request
    pub fn stacking(request: SatRequest) -> Self {
        Self {
            magic: SAT_IDENTIFIER,
            target: SatTarget::Stacking,
            request,
        }
    }

    /// Tag a tiling request
    pub fn tiling(request: SatRequest) -> Self {
        Self {
            magic: SAT_IDENTIFIER,
            target: SatTarget::Tiling,
            request,
        }
    }
}

/// Encode a message for the wire
pub fn encode_message(message: &SatMessage) -> Result<Vec<u8>> {
    bincode::serialize(message).map_err(|e| Error::BadMessage(e.to_string()))
}

/// Decode a message from the wire, rejecting foreign magic
pub fn decode_message(bytes: &[u8]) -> Result<SatMessage> {
    let message: SatMessage =
        bincode::deserialize(bytes).map_err(|e| Error::BadMessage(e.to_string()))?;
    if message.magic != SAT_IDENTIFIER {
        return Err(Error::BadMessage(format!(
            "unexpected magic {:#x}",
            message.magic
        )));
    }
    Ok(message)
}

/// Encode a reply for the wire
pub fn encode_reply(reply: &SatReply) -> Result<Vec<u8>> {
    bincode::serialize(reply).map_err(|e| Error::BadMessage(e.to_string()))
}

/// Decode a reply from the wire
pub fn decode_reply(bytes: &[u8]) -> Result<SatReply> {
    bincode::deserialize(bytes).map_err(|e| Error::BadMessage(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::{
        decode_message, decode_reply, encode_message, encode_reply, SatMessage, SatReply,
        SatRequest,
    };

    #[test]
    fn messages_survive_the_wire() {
        let message = SatMessage::stacking(SatRequest::AddWindowToStack {
            window:   0xdead_beef,
            position: -1,
        });
        let bytes = encode_message(&message).unwrap();
        assert_eq!(decode_message(&bytes).unwrap(), message);

        let reply = SatReply::Window(42);
        let bytes = encode_reply(&reply).unwrap();
        assert_eq!(decode_reply(&bytes).unwrap(), reply);
    }

    #[test]
    fn foreign_magic_is_rejected() {
        let mut message = SatMessage::tiling(SatRequest::CountWindowsOnStack);
        message.magic = 0x1234_5678;
        let bytes = bincode::serialize(&message).unwrap();
        assert!(decode_message(&bytes).is_err());
    }
}
