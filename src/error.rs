//! Engine error taxonomy.

use thiserror::Error;

use crate::types::{HostNodeId, NodeKind, TreeId};

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Wrong node kind, missing required children, malformed prop value.
    #[error("structural violation: {message}")]
    Structural { message: String },

    /// Consuming or linking a provider that is not registered for the tree.
    #[error("context violation: {message}")]
    Context { message: String },

    /// A template reported failure while generating.
    #[error("generation violation: {message}")]
    Generation { message: String },

    /// Hook slot store misuse.
    #[error("hook error: {message}")]
    Hook { message: String },

    /// The host renderer was asked about a node it does not know.
    #[error("unknown host node {node}")]
    UnknownHostNode { node: HostNodeId },
}

impl EngineError {
    pub fn structural(message: impl Into<String>) -> Self {
        Self::Structural {
            message: message.into(),
        }
    }

    pub fn context(message: impl Into<String>) -> Self {
        Self::Context {
            message: message.into(),
        }
    }

    pub fn generation(message: impl Into<String>) -> Self {
        Self::Generation {
            message: message.into(),
        }
    }

    pub fn hook(message: impl Into<String>) -> Self {
        Self::Hook {
            message: message.into(),
        }
    }

    pub(crate) fn wrong_kind(expected: NodeKind, found: NodeKind) -> Self {
        Self::structural(format!("expected a {expected} node, found a {found} node"))
    }

    pub(crate) fn provider_missing(provider: &str, tree: TreeId) -> Self {
        Self::context(format!("no `{provider}` provider registered in {tree}"))
    }

    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Structural { .. })
    }

    pub fn is_context(&self) -> bool {
        matches!(self, Self::Context { .. })
    }

    pub fn is_generation(&self) -> bool {
        matches!(self, Self::Generation { .. })
    }

    pub fn is_hook(&self) -> bool {
        matches!(self, Self::Hook { .. })
    }
}
