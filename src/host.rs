//! The seam between the stack-and-tile core and the enclosing window server.
//!
//! Everything the core consumes from or invokes on the host goes through
//! [`Desktop`]; the crate never talks to a display protocol itself. All
//! methods may be called from inside listener callbacks, and service calls
//! may synchronously recurse back into the listener.

use crate::{
    geometry::{Extents, Point, Rect},
    types::{DecorRegion, HighlightState, SizeLimits, Window, WindowLook, WorkspaceMask},
    window::SatWindow,
};
use std::rc::Rc;

/// Services and queries the core consumes from the host window server
pub trait Desktop {
    // ========================== Queries ==========================

    /// Undecorated frame of a window in screen coordinates
    fn window_frame(&self, window: Window) -> Rect;

    /// Space the decorator adds around the window; `top` includes the tab
    fn decor_extents(&self, window: Window) -> Extents;

    /// Screen rectangle of the window's tab
    fn tab_rect(&self, window: Window) -> Rect;

    /// Size limits the client declared for the window
    fn size_limits(&self, window: Window) -> SizeLimits;

    /// Decoration style of the window
    fn window_look(&self, window: Window) -> WindowLook;

    /// Is the window visible on the workspace currently shown?
    fn on_current_workspace(&self, window: Window) -> bool;

    /// Index of the workspace currently shown
    fn current_workspace(&self) -> i32;

    /// Stored anchor position of the window on the given workspace
    fn anchor_position(&self, window: Window, workspace: i32) -> Option<Point>;

    /// Frame of the screen the window lives on
    fn screen_frame(&self) -> Rect;

    /// Current pointer position in screen coordinates
    fn pointer_position(&self) -> Point;

    /// All windows of the current workspace, front-most first
    fn windows_front_to_back(&self) -> Vec<Window>;

    /// Is the window hidden (unmapped or minimized)?
    fn window_is_hidden(&self, window: Window) -> bool;

    /// The window that currently has focus
    fn focused_window(&self) -> Option<Window>;

    /// Offset of the window's tab along its top border
    fn window_tab_location(&self, window: Window) -> f32;

    // ========================== Services =========================

    /// Translate a window; triggers a `window_moved` notification
    fn move_window_by(&self, window: Window, dx: f32, dy: f32);

    /// Grow or shrink a window; triggers a `window_resized` notification
    fn resize_window_by(&self, window: Window, dw: f32, dh: f32);

    /// Raise and focus a window
    fn activate_window(&self, window: Window);

    /// Push a window behind `behind_of`, or to the very back
    fn send_window_behind(&self, window: Window, behind_of: Option<Window>);

    /// Replace the window's workspace mask
    fn set_window_workspaces(&self, window: Window, workspaces: WorkspaceMask);

    /// Override the window's size limits (restored when a window leaves
    /// its group)
    fn set_size_limits(&self, window: Window, limits: SizeLimits);

    /// Minimize or restore a window
    fn minimize_window(&self, window: Window, minimize: bool);

    /// Move the window's tab along its top border
    fn set_window_tab_location(&self, window: Window, location: f32);

    /// Repaint whatever the decorator marked dirty for this window
    fn process_dirty_region(&self, window: Window);

    // ====================== Decorator hooks ======================

    /// Put one decorator region into a highlight state; returns whether
    /// anything became dirty
    fn set_highlight(&self, window: Window, region: DecorRegion, state: HighlightState) -> bool;

    /// Switch the decorator between solo and stacked tab drawing
    fn set_stacked_mode(&self, window: Window, stacked: bool);

    /// Width of the window's tab while it shares a tab bar
    fn set_stacked_tab_length(&self, window: Window, length: f32);

    // ===================== Native window stacks ==================

    /// Merge two native window stacks; `false` means the host refused
    fn merge_window_stacks(&self, parent: Window, child: Window) -> bool;

    /// Detach a window from its native stack again
    fn separate_window_stack(&self, window: Window);
}

/// Resolves stable window ids, e.g. while restoring an archived group
pub trait WindowLookup {
    /// The adapter for the given stable id, if the window still exists
    fn find_sat_window(&self, id: u64) -> Option<Rc<SatWindow>>;
}
