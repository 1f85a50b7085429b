//! Snapping behaviours: the strategies that turn a drag into a group
//! mutation.
//!
//! Each behaviour inspects candidate groups while the user drags a window
//! with the modifier held, owns its own highlight feedback, and commits
//! the merge on release. Stacking merges into an existing area's tab bar;
//! tiling docks the window next to existing areas on shared tabs.

pub mod stacking;
pub mod tiling;

use crate::{area::WindowArea, group::SatGroup, types::WindowLook};
use std::rc::Rc;

/// One snapping strategy owned by a [`SatWindow`](crate::window::SatWindow)
pub trait SnappingBehaviour {
    /// Inspect `group` and remember it as the merge target when the
    /// current drag position matches; highlights are the behaviour's job
    fn find_snapping_candidates(&self, group: &Rc<SatGroup>) -> bool;

    /// Merge the dragged window into the remembered candidate
    fn join_candidates(&self) -> bool;

    /// Forget the candidate and clear any highlight
    fn reset_search_results(&self);

    /// Called after every group layout run
    fn do_group_layout(&self) {}

    /// Called when the owning window left `area`
    fn removed_from_area(&self, _area: &Rc<WindowArea>) {}

    /// The user dragged the tab along the tab bar
    fn tab_location_moved(&self, _location: f32, _shifting: bool) {}

    /// The owning window's look changed
    fn window_look_changed(&self, _look: WindowLook) {}
}
