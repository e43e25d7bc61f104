use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of a pane, assigned when the pane's window is created and stable
/// for its whole lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaneId(Uuid);

impl PaneId {
    /// Generate a fresh random pane id.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PaneId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PaneId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Client-created token that uniquely identifies a pane group for its whole
/// lifetime. Tokens are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupToken(Uuid);

impl GroupToken {
    /// Mint a fresh token.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for GroupToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for GroupToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Server-confirmed view of a group's membership, replaced wholesale on every
/// update.
///
/// `panes` lists members in server stacking order (topmost last) and only
/// names identities; whether an identity is hosted by this process is decided
/// locally. `empty` is the server's verdict on the whole group, which can
/// disagree with `panes.is_empty()` when members are hosted by other
/// processes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSnapshot {
    pub panes: Vec<PaneId>,
    pub empty: bool,
}

impl GroupSnapshot {
    pub fn new(panes: Vec<PaneId>, empty: bool) -> Self {
        Self { panes, empty }
    }

    /// A snapshot of a group the server reports as having no members.
    pub fn vacant() -> Self {
        Self::new(Vec::new(), true)
    }

    pub fn pane_ids(&self) -> &[PaneId] {
        &self.panes
    }

    /// Whether the server reports `id` as a member of this group.
    pub fn contains(&self, id: PaneId) -> bool {
        self.panes.contains(&id)
    }

    /// The server's emptiness verdict.
    pub fn is_empty(&self) -> bool {
        self.empty
    }
}
