use thiserror::Error;

use wmux_protocol::{GroupToken, PaneId};

#[derive(Error, Debug)]
pub enum GroupError {
    #[error("group not found: {0}")]
    GroupNotFound(GroupToken),

    #[error("group already destroyed: {0}")]
    GroupDestroyed(GroupToken),

    #[error("pane {pane} is already claimed by group {group}")]
    PaneAlreadyGrouped { pane: PaneId, group: GroupToken },
}
