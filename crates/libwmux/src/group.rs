use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::{debug, info};

use wmux_protocol::{GroupSnapshot, GroupToken, PaneId};

use crate::pane::{PaneDirectory, PaneRef};

/// Client-side mirror of one server-owned pane group.
///
/// The server's view arrives as wholesale [`GroupSnapshot`] replacements; in
/// between, at most one locally-known pane sits in the pending slot while its
/// reparent into the group awaits confirmation. Destroying a group closes its
/// own panes and, when cascading, every group and standalone pane registered
/// to go down with it.
pub struct PaneGroup {
    /// Client-created token that uniquely identifies this group.
    token: GroupToken,
    directory: Rc<PaneDirectory>,
    inner: RefCell<Inner>,
    /// Committed before any teardown side effect runs, so a cascade that
    /// loops back here exits immediately.
    destroyed: Cell<bool>,
}

impl std::fmt::Debug for PaneGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaneGroup")
            .field("token", &self.token)
            .field("destroyed", &self.destroyed.get())
            .finish_non_exhaustive()
    }
}

struct Inner {
    /// Server-confirmed membership, replaced wholesale on every update.
    snapshot: Option<GroupSnapshot>,
    /// Pane being reparented to this group that the server has not yet
    /// reported as a member.
    pending: Option<PaneRef>,
    /// Groups that should be destroyed together with this one, in
    /// registration order.
    dependent_groups: Vec<Weak<PaneGroup>>,
    /// Panes in other groups that should be closed together with this one.
    dependent_panes: Vec<PaneRef>,
}

impl PaneGroup {
    /// Create a group, optionally seeded with a pane that a window
    /// transaction is about to reparent into it.
    pub fn new(directory: Rc<PaneDirectory>, pending: Option<PaneRef>) -> Rc<Self> {
        Rc::new(Self {
            token: GroupToken::new(),
            directory,
            inner: RefCell::new(Inner {
                snapshot: None,
                pending,
                dependent_groups: Vec::new(),
                dependent_panes: Vec::new(),
            }),
            destroyed: Cell::new(false),
        })
    }

    pub fn token(&self) -> GroupToken {
        self.token
    }

    /// The last server-confirmed membership, if any arrived yet.
    pub fn snapshot(&self) -> Option<GroupSnapshot> {
        self.inner.borrow().snapshot.clone()
    }

    /// Panes that belong to this group and live in this process.
    ///
    /// The pending pane comes first, in case the server has not yet reported
    /// it as a member; placement decisions keep applying in the interim.
    /// Confirmed members follow in server stacking order, skipping identities
    /// hosted by other processes and identities already in the list. The view
    /// is recomputed on every call.
    pub fn panes(&self) -> Vec<PaneRef> {
        let inner = self.inner.borrow();
        let mut panes: Vec<PaneRef> = Vec::new();
        if let Some(pending) = &inner.pending {
            panes.push(Rc::clone(pending));
        }
        let Some(snapshot) = &inner.snapshot else {
            return panes;
        };
        for &id in &snapshot.panes {
            let Some(pane) = self.directory.get(id) else {
                continue;
            };
            if panes.iter().any(|known| known.id() == id) {
                continue;
            }
            panes.push(pane);
        }
        panes
    }

    /// Whether `id` is a confirmed member or the pane pending reparent.
    /// Confirmed members count even when their window lives in another
    /// process.
    pub fn has_pane(&self, id: PaneId) -> bool {
        let inner = self.inner.borrow();
        if inner.snapshot.as_ref().is_some_and(|s| s.contains(id)) {
            return true;
        }
        inner.pending.as_ref().is_some_and(|p| p.id() == id)
    }

    /// Topmost member pane that is not already closing. Last in the merged
    /// view counts as topmost.
    pub fn top_non_closing(&self) -> Option<PaneRef> {
        self.panes().into_iter().rev().find(|pane| !pane.is_closing())
    }

    /// A group is empty when nothing is pending and the server either never
    /// reported membership or reports the group empty.
    pub fn is_empty(&self) -> bool {
        let inner = self.inner.borrow();
        inner.pending.is_none() && inner.snapshot.as_ref().is_none_or(|s| s.empty)
    }

    /// Replace the server-confirmed view wholesale. `None` means the server
    /// has not reported this group yet.
    ///
    /// Once the new snapshot names the pending pane, the pending slot is
    /// cleared: the server's ordering is authoritative for it from then on.
    pub fn apply_snapshot(&self, snapshot: Option<GroupSnapshot>) {
        let mut inner = self.inner.borrow_mut();
        inner.snapshot = snapshot;
        let confirmed = match (&inner.snapshot, &inner.pending) {
            (Some(snapshot), Some(pending)) => {
                snapshot.contains(pending.id()).then(|| pending.id())
            }
            _ => None,
        };
        if let Some(id) = confirmed {
            inner.pending = None;
            debug!(token = %self.token, pane = %id, "reparent confirmed by server");
        }
    }

    /// Track a pane as optimistically belonging to this group until a
    /// snapshot confirms the reparent. Replaces any unconfirmed predecessor;
    /// ignored once the group is destroyed or when the pane is already a
    /// confirmed member.
    pub fn begin_reparent(&self, pane: PaneRef) {
        if self.destroyed.get() {
            debug!(token = %self.token, pane = %pane.id(), "reparent into destroyed group ignored");
            return;
        }
        let mut inner = self.inner.borrow_mut();
        if inner.snapshot.as_ref().is_some_and(|s| s.contains(pane.id())) {
            debug!(token = %self.token, pane = %pane.id(), "pane already confirmed in group");
            return;
        }
        if let Some(previous) = &inner.pending {
            debug!(token = %self.token, superseded = %previous.id(), "pending reparent replaced");
        }
        inner.pending = Some(pane);
    }

    /// Register another group to destroy whenever this one is destroyed with
    /// cascade. Registration order is cascade order; the reference is weak,
    /// the registry keeps ownership. Ignored once destroyed.
    pub fn add_dependent_group(&self, group: &Rc<PaneGroup>) {
        if self.destroyed.get() {
            debug!(token = %self.token, dependent = %group.token(), "dependent added to destroyed group ignored");
            return;
        }
        self.inner
            .borrow_mut()
            .dependent_groups
            .push(Rc::downgrade(group));
    }

    /// Register a standalone pane to close whenever this group is destroyed
    /// with cascade. Ignored once destroyed.
    pub fn add_dependent_pane(&self, pane: PaneRef) {
        if self.destroyed.get() {
            debug!(token = %self.token, pane = %pane.id(), "dependent added to destroyed group ignored");
            return;
        }
        self.inner.borrow_mut().dependent_panes.push(pane);
    }

    /// Tear the group down: close every member pane and, with `cascade`,
    /// every dependent group and pane registered on it.
    ///
    /// Safe to call any number of times, including from within its own
    /// cascade: the terminal flag commits before the first side effect, so
    /// each reachable group runs its teardown exactly once no matter how
    /// many dependency paths lead to it.
    pub fn destroy(&self, cascade: bool) {
        if self.destroyed.replace(true) {
            return;
        }

        // Close our own members, including a pending pane the server never
        // confirmed.
        let members = self.panes();
        self.inner.borrow_mut().pending = None;
        for pane in &members {
            pane.close();
        }

        if cascade {
            // Take the lists so no borrow is held across the recursion.
            let (groups, panes) = {
                let mut inner = self.inner.borrow_mut();
                (
                    std::mem::take(&mut inner.dependent_groups),
                    std::mem::take(&mut inner.dependent_panes),
                )
            };
            for group in &groups {
                match group.upgrade() {
                    Some(group) => group.destroy(true),
                    None => debug!(token = %self.token, "dependent group already discarded"),
                }
            }
            for pane in &panes {
                pane.close();
            }
            // A pane parked in the pending slot while the cascade ran still
            // gets its close request. Take it first, close() may look back
            // at the group.
            let parked = self.inner.borrow_mut().pending.take();
            if let Some(pane) = parked {
                pane.close();
            }
        }

        info!(token = %self.token, cascade, panes = members.len(), "group destroyed");
    }

    /// Whether the group already went through teardown.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed.get()
    }
}
