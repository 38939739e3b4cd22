//! Error types for the cascaded shadow crate.
//!
//! Fallible building blocks (split calculation, scene graph edits, config
//! validation) return [`CsmError`]. The [`Csm`](crate::csm::Csm) controller
//! itself never propagates these out of its per-frame path; it logs them.

use std::fmt;

use crate::core::scene::NodeId;

/// Main error type for the crate.
#[derive(Debug, Clone, PartialEq)]
pub enum CsmError {
    /// Custom split mode was selected without registering a callback.
    MissingCustomSplitCallback,
    /// A configuration value is outside its usable range.
    InvalidConfig(String),
    /// A scene node id does not refer to a live node.
    NodeNotFound(NodeId),
    /// The child is not attached to the given parent.
    NotAChild { parent: NodeId, child: NodeId },
    /// Adding the child would make a node its own ancestor.
    CyclicHierarchy { parent: NodeId, child: NodeId },
}

impl fmt::Display for CsmError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::MissingCustomSplitCallback => {
                write!(f, "custom split scheme callback not defined")
            }
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            Self::NodeNotFound(id) => write!(f, "scene node {} not found", id.index()),
            Self::NotAChild { parent, child } => write!(
                f,
                "node {} is not a child of node {}",
                child.index(),
                parent.index()
            ),
            Self::CyclicHierarchy { parent, child } => write!(
                f,
                "adding node {} under node {} would create a cycle",
                child.index(),
                parent.index()
            ),
        }
    }
}

impl std::error::Error for CsmError {}

/// Convenient Result type alias for crate operations.
pub type Result<T> = std::result::Result<T, CsmError>;
