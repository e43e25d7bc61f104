use std::cell::RefCell;
use std::rc::Rc;

use tracing::{debug, info};

use wmux_protocol::{GroupSnapshot, GroupToken, PaneId};

use crate::error::GroupError;
use crate::group::PaneGroup;
use crate::pane::{PaneDirectory, PaneRef};

/// Owner of every live pane group in this process.
///
/// The registry holds the strong references; dependency edges between groups
/// are weak. It routes server snapshots and reparent intents to groups by
/// token, enforces that at most one live group claims a pane at a time, and
/// sweeps groups out once they are destroyed. Groups are kept in creation
/// order.
pub struct GroupRegistry {
    directory: Rc<PaneDirectory>,
    groups: RefCell<Vec<Rc<PaneGroup>>>,
}

impl GroupRegistry {
    pub fn new(directory: Rc<PaneDirectory>) -> Self {
        Self {
            directory,
            groups: RefCell::new(Vec::new()),
        }
    }

    /// Create an empty group, to be populated by server snapshots.
    pub fn create_group(&self) -> Rc<PaneGroup> {
        let group = PaneGroup::new(Rc::clone(&self.directory), None);
        info!(token = %group.token(), "group created");
        self.groups.borrow_mut().push(Rc::clone(&group));
        group
    }

    /// Create a group pre-seeded with a pane awaiting reparent confirmation.
    pub fn create_group_for_pane(&self, pane: PaneRef) -> Result<Rc<PaneGroup>, GroupError> {
        self.ensure_unclaimed(pane.id())?;
        let pane_id = pane.id();
        let group = PaneGroup::new(Rc::clone(&self.directory), Some(pane));
        info!(token = %group.token(), pane = %pane_id, "group created for pane");
        self.groups.borrow_mut().push(Rc::clone(&group));
        Ok(group)
    }

    /// Route a reparent intent: mark `pane` as pending in the target group.
    ///
    /// The pane must not be claimed by a different live group; routing it at
    /// the group it already belongs to is fine.
    pub fn reparent_pane(&self, pane: PaneRef, token: GroupToken) -> Result<(), GroupError> {
        let group = self.group(token).ok_or(GroupError::GroupNotFound(token))?;
        if group.is_destroyed() {
            return Err(GroupError::GroupDestroyed(token));
        }
        if let Some(holder) = self.group_with_pane(pane.id())
            && holder.token() != token
        {
            return Err(GroupError::PaneAlreadyGrouped {
                pane: pane.id(),
                group: holder.token(),
            });
        }
        debug!(token = %token, pane = %pane.id(), "reparent requested");
        group.begin_reparent(pane);
        Ok(())
    }

    /// Route a server snapshot to its group. Destroyed groups still accept
    /// snapshots, the server stays authoritative for them.
    pub fn apply_snapshot(
        &self,
        token: GroupToken,
        snapshot: Option<GroupSnapshot>,
    ) -> Result<(), GroupError> {
        let group = self.group(token).ok_or(GroupError::GroupNotFound(token))?;
        group.apply_snapshot(snapshot);
        Ok(())
    }

    /// Destroy a group, then sweep every destroyed group out of the registry
    /// and return their tokens. With `cascade` the sweep picks up everything
    /// the cascade reached.
    pub fn destroy_group(
        &self,
        token: GroupToken,
        cascade: bool,
    ) -> Result<Vec<GroupToken>, GroupError> {
        let group = self.group(token).ok_or(GroupError::GroupNotFound(token))?;
        group.destroy(cascade);
        Ok(self.sweep())
    }

    /// Sweep groups that were destroyed outside `destroy_group`, e.g. by a
    /// cascade registered on some other group.
    pub fn purge_destroyed(&self) -> Vec<GroupToken> {
        self.sweep()
    }

    pub fn group(&self, token: GroupToken) -> Option<Rc<PaneGroup>> {
        self.groups
            .borrow()
            .iter()
            .find(|group| group.token() == token)
            .cloned()
    }

    /// First live group claiming `pane`, as a confirmed member or pending.
    pub fn group_with_pane(&self, pane: PaneId) -> Option<Rc<PaneGroup>> {
        self.groups
            .borrow()
            .iter()
            .find(|group| !group.is_destroyed() && group.has_pane(pane))
            .cloned()
    }

    pub fn tokens(&self) -> Vec<GroupToken> {
        self.groups.borrow().iter().map(|group| group.token()).collect()
    }

    pub fn len(&self) -> usize {
        self.groups.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.borrow().is_empty()
    }

    /// The pane directory shared with every group this registry creates.
    pub fn directory(&self) -> Rc<PaneDirectory> {
        Rc::clone(&self.directory)
    }

    fn ensure_unclaimed(&self, pane: PaneId) -> Result<(), GroupError> {
        match self.group_with_pane(pane) {
            Some(group) => Err(GroupError::PaneAlreadyGrouped {
                pane,
                group: group.token(),
            }),
            None => Ok(()),
        }
    }

    fn sweep(&self) -> Vec<GroupToken> {
        let mut groups = self.groups.borrow_mut();
        let mut swept = Vec::new();
        groups.retain(|group| {
            if group.is_destroyed() {
                swept.push(group.token());
                false
            } else {
                true
            }
        });
        if !swept.is_empty() {
            info!(count = swept.len(), "destroyed groups swept from registry");
        }
        swept
    }
}
