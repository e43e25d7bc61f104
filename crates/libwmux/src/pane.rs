use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use wmux_protocol::PaneId;

/// Capability surface of a pane as group tracking sees it.
///
/// Implementors front a live window hosted by this process. `close` requests
/// teardown and must be idempotent and non-failing: delivery problems are the
/// implementor's to absorb (for example by queueing the request on the
/// window's own event loop), never the group's.
pub trait PaneHandle {
    /// Stable identity of the pane.
    fn id(&self) -> PaneId;

    /// Whether the pane is already on its way out.
    fn is_closing(&self) -> bool;

    /// Request that the pane's window be torn down.
    fn close(&self);
}

/// Shared handle to a pane hosted by this process.
pub type PaneRef = Rc<dyn PaneHandle>;

/// The panes hosted by this client process, keyed by identity.
///
/// Groups resolve snapshot members through the directory: identities the
/// server reports but the directory does not know are hosted by other
/// processes and are skipped by the merged view.
pub struct PaneDirectory {
    panes: RefCell<HashMap<PaneId, PaneRef>>,
}

impl PaneDirectory {
    pub fn new() -> Self {
        Self {
            panes: RefCell::new(HashMap::new()),
        }
    }

    /// Make a pane resolvable, replacing any previous handle with the same
    /// identity.
    pub fn register(&self, pane: PaneRef) {
        let id = pane.id();
        if self.panes.borrow_mut().insert(id, pane).is_some() {
            debug!(pane = %id, "pane handle replaced");
        } else {
            debug!(pane = %id, "pane registered");
        }
    }

    /// Forget a pane, returning its handle if it was known.
    pub fn remove(&self, id: PaneId) -> Option<PaneRef> {
        let removed = self.panes.borrow_mut().remove(&id);
        if removed.is_some() {
            debug!(pane = %id, "pane removed");
        }
        removed
    }

    pub fn get(&self, id: PaneId) -> Option<PaneRef> {
        self.panes.borrow().get(&id).cloned()
    }

    pub fn contains(&self, id: PaneId) -> bool {
        self.panes.borrow().contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.panes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.panes.borrow().is_empty()
    }
}

impl Default for PaneDirectory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    struct FixedPane {
        id: PaneId,
        close_calls: Cell<usize>,
    }

    impl FixedPane {
        fn new(id: PaneId) -> Rc<Self> {
            Rc::new(Self {
                id,
                close_calls: Cell::new(0),
            })
        }
    }

    impl PaneHandle for FixedPane {
        fn id(&self) -> PaneId {
            self.id
        }

        fn is_closing(&self) -> bool {
            false
        }

        fn close(&self) {
            self.close_calls.set(self.close_calls.get() + 1);
        }
    }

    #[test]
    fn register_and_resolve() {
        let directory = PaneDirectory::new();
        let id = PaneId::new();
        directory.register(FixedPane::new(id));

        assert!(directory.contains(id));
        assert_eq!(directory.len(), 1);
        let resolved = directory.get(id).expect("registered pane resolves");
        assert_eq!(resolved.id(), id);
    }

    #[test]
    fn unknown_id_does_not_resolve() {
        let directory = PaneDirectory::new();
        assert!(directory.get(PaneId::new()).is_none());
        assert!(directory.is_empty());
    }

    #[test]
    fn register_replaces_handle_with_same_id() {
        let directory = PaneDirectory::new();
        let id = PaneId::new();
        let first = FixedPane::new(id);
        let second = FixedPane::new(id);

        directory.register(first);
        directory.register(second.clone());
        assert_eq!(directory.len(), 1);

        directory.get(id).expect("pane resolves").close();
        assert_eq!(second.close_calls.get(), 1);
    }

    #[test]
    fn remove_forgets_pane() {
        let directory = PaneDirectory::new();
        let id = PaneId::new();
        directory.register(FixedPane::new(id));

        assert!(directory.remove(id).is_some());
        assert!(!directory.contains(id));
        assert!(directory.remove(id).is_none());
    }
}
