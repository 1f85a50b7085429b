//! Errors found throughout this crate

use thiserror::Error;

/// Errors that occur while mutating or solving a window group
#[derive(Debug, Error)]
pub enum Error {
    /// Two tabs of the same orientation can never cross
    #[error("tabs of the same orientation cannot cross")]
    ParallelTabs,

    /// A window was expected to be a group member but is not
    #[error("window {0:#x} is not a member of this group")]
    NotInGroup(u64),

    /// The host declined to merge the native window stacks
    #[error("the host refused to merge the native window stacks")]
    StackMergeRefused,

    /// A serialized group referenced tabs that do not exist
    #[error("group archive is malformed: {0}")]
    BadArchive(String),

    /// A client message could not be decoded
    #[error("malformed client message: {0}")]
    BadMessage(String),

    /// An area could not be wired into its group
    #[error("area could not be registered with the group")]
    AreaRegistration,

    /// The window is being torn down and takes no new group
    #[error("window {0:#x} is shutting down")]
    ShuttingDown(u64),
}

/// Result alias used throughout this crate
pub type Result<T> = std::result::Result<T, Error>;
