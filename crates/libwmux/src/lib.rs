pub mod error;
pub mod group;
pub mod pane;
pub mod registry;

pub use error::GroupError;
pub use group::PaneGroup;
pub use pane::{PaneDirectory, PaneHandle, PaneRef};
pub use registry::GroupRegistry;
