//! Preview handle accounting.
//!
//! A preview handle stands in for a revocable, renderable reference to a
//! photo (the browser analogue is an object URL). The registry hands out
//! move-only handles and takes them back exactly once: `release` consumes the
//! handle, so a double release does not compile, and the live count makes
//! leaks observable to tests and to `dispose`.

use std::collections::HashSet;
use std::fmt;

use uuid::Uuid;

use crate::selection::PhotoFile;

/// Copyable identifier embedded in a handle; what renderers put in the
/// thumbnail markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PreviewToken(Uuid);

impl fmt::Display for PreviewToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "preview://{}", self.0.simple())
    }
}

/// Exclusive reference to one acquired preview resource.
///
/// Deliberately neither `Clone` nor `Copy`: the selection store is the only
/// holder, and releasing requires giving the handle back.
#[derive(Debug)]
pub struct PreviewHandle {
    token: PreviewToken,
}

impl PreviewHandle {
    pub fn token(&self) -> PreviewToken {
        self.token
    }

    /// Renderable URI for this preview.
    pub fn uri(&self) -> String {
        self.token.to_string()
    }
}

/// Tracks every live preview resource for one widget instance.
#[derive(Debug, Default)]
pub struct PreviewRegistry {
    live: HashSet<Uuid>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire a preview for `file`. Never fails for valid binary input.
    pub fn acquire(&mut self, file: &PhotoFile) -> PreviewHandle {
        let id = Uuid::new_v4();
        self.live.insert(id);
        tracing::trace!("acquired preview {id} for {}", file.name());
        PreviewHandle {
            token: PreviewToken(id),
        }
    }

    /// Release a previously acquired handle. Consuming the handle makes a
    /// second release unrepresentable.
    pub fn release(&mut self, handle: PreviewHandle) {
        let PreviewToken(id) = handle.token;
        if !self.live.remove(&id) {
            tracing::warn!("released preview {id} that this registry never issued");
        }
    }

    /// Number of handles acquired and not yet released.
    pub fn live_count(&self) -> usize {
        self.live.len()
    }
}
