//! Per-window adapter between a host window and the group machinery.
//!
//! A [`SatWindow`] tracks the original size limits and solo size of its
//! host window, keeps the strong reference to the current group (the rest
//! of the model points back weakly), and owns the two snapping behaviours
//! that turn drags into group mutations.

use crate::{
    area::WindowArea,
    config::Config,
    error::{Error, Result},
    geometry::Rect,
    group::SatGroup,
    host::Desktop,
    snap::{stacking::SatStacking, tiling::SatTiling, SnappingBehaviour},
    types::{
        generate_window_id, DecorRegion, HighlightState, SizeLimits, Window, WindowLook,
        MAX_SOLVER_SIZE,
    },
};
use std::{
    cell::{Cell, RefCell},
    rc::{Rc, Weak},
};

/// Adapter for one host window
pub struct SatWindow {
    window:  Window,
    id:      u64,
    desktop: Rc<dyn Desktop>,
    config:  Rc<Config>,

    /// The group cookie; everything else points back at the window weakly
    group: RefCell<Option<Rc<SatGroup>>>,
    area:  RefCell<Weak<WindowArea>>,

    /// Limits as declared by the client; restored when the window leaves
    /// a multi-window group
    original_limits: RefCell<SizeLimits>,
    /// Host frame size captured while the window was last solo
    original_size:   Cell<(f32, f32)>,

    behaviours:       RefCell<Vec<Rc<dyn SnappingBehaviour>>>,
    ongoing_snapping: RefCell<Option<Rc<dyn SnappingBehaviour>>>,

    shutdown: Cell<bool>,
}

impl SatWindow {
    /// Create the adapter for a freshly added host window
    pub fn new(desktop: Rc<dyn Desktop>, config: Rc<Config>, window: Window) -> Rc<Self> {
        let frame = desktop.window_frame(window);
        let limits = desktop.size_limits(window);

        Rc::new_cyclic(|weak: &Weak<SatWindow>| {
            let behaviours: Vec<Rc<dyn SnappingBehaviour>> = vec![
                Rc::new(SatStacking::new(weak.clone())),
                Rc::new(SatTiling::new(weak.clone())),
            ];
            Self {
                window,
                id: generate_window_id(),
                desktop: Rc::clone(&desktop),
                config: Rc::clone(&config),
                group: RefCell::new(None),
                area: RefCell::new(Weak::new()),
                original_limits: RefCell::new(limits),
                original_size: Cell::new((frame.width(), frame.height())),
                behaviours: RefCell::new(behaviours),
                ongoing_snapping: RefCell::new(None),
                shutdown: Cell::new(false),
            }
        })
    }

    // ========================== Accessors ==========================

    /// The host window handle
    pub fn window(&self) -> Window {
        self.window
    }

    /// The stable 64-bit id used in archives and client messages
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The host this window talks to
    pub fn desktop(&self) -> Rc<dyn Desktop> {
        Rc::clone(&self.desktop)
    }

    /// The crate configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The area this window is stacked in, while it has one
    pub fn area(&self) -> Option<Rc<WindowArea>> {
        self.area.borrow().upgrade()
    }

    /// The window's group, created lazily for solo windows.
    ///
    /// A solo window's area mirrors whatever frame the window really has,
    /// so the group reflects reality before any snapping math runs.
    pub fn group(self: &Rc<Self>) -> Option<Rc<SatGroup>> {
        if self.group.borrow().is_none() && !self.shutdown.get() {
            self.init_group();
        }

        if !self.position_managed() {
            if let Some(area) = self.area() {
                let frame = self.complete_window_frame();
                area.left_tab().set_position(frame.left);
                area.top_tab().set_position(frame.top);
                area.right_tab().set_position(frame.right);
                area.bottom_tab().set_position(frame.bottom);
            }
        }

        self.group.borrow().clone()
    }

    /// True while the window shares a group with at least one other
    /// window, i.e. while the solver owns its position
    pub fn position_managed(&self) -> bool {
        self.group
            .borrow()
            .as_ref()
            .map_or(false, |group| group.window_count() > 1)
    }

    fn init_group(self: &Rc<Self>) {
        log::debug!("SatWindow::init_group {:#x}", self.id);
        let group = SatGroup::new();
        if group
            .add_window(self, None, None, None, None)
            .is_err()
        {
            log::warn!("adding window {:#x} to its own group failed", self.id);
        }
    }

    // ======================== Group cookie =========================

    /// Hook called by the group when this window was inserted.
    ///
    /// Any previous (singleton) group is quietly dissolved first; joining
    /// a multi-window group relaxes everyone's host limits so the solver
    /// has slack.
    pub(crate) fn added_to_group(
        self: &Rc<Self>,
        group: &Rc<SatGroup>,
        area: &Rc<WindowArea>,
    ) -> Result<()> {
        log::debug!("SatWindow::added_to_group {:#x}", self.id);
        if self.shutdown.get() {
            return Err(Error::ShuttingDown(self.id));
        }

        let old = self.group.borrow_mut().take();
        if let Some(old) = old {
            if !Rc::ptr_eq(&old, group) {
                old.forget_window(self);
            }
        }

        *self.group.borrow_mut() = Some(Rc::clone(group));
        *self.area.borrow_mut() = Rc::downgrade(area);

        if group.window_count() > 1 {
            for window in group.windows() {
                window.adjust_size_limits();
            }
        }
        Ok(())
    }

    /// Hook called by the group when this window was removed.
    ///
    /// Original limits come back, non-resizable axes get their original
    /// extent back, and with `stay_below_mouse` the window follows the
    /// cursor onto the decorator element it was grabbed by.
    pub(crate) fn removed_from_group(
        self: &Rc<Self>,
        group: &Rc<SatGroup>,
        stay_below_mouse: bool,
    ) {
        log::debug!("SatWindow::removed_from_group {:#x}", self.id);

        {
            let mut cookie = self.group.borrow_mut();
            match cookie.as_ref() {
                Some(current) if Rc::ptr_eq(current, group) => {
                    *cookie = None;
                }
                _ => return,
            }
        }
        *self.area.borrow_mut() = Weak::new();

        if self.shutdown.get() {
            return;
        }

        let original = *self.original_limits.borrow();
        self.desktop.set_size_limits(self.window, original);

        let frame = self.desktop.window_frame(self.window);
        let (width, height) = self.original_size.get();
        let mut dw = 0.;
        let mut dh = 0.;
        if original.is_h_fixed() {
            dw = width - frame.width();
        }
        if original.is_v_fixed() {
            dh = height - frame.height();
        }
        if dw != 0. || dh != 0. {
            self.desktop.resize_window_by(self.window, dw, dh);
        }

        if stay_below_mouse {
            self.stay_below_mouse();
        }
    }

    /// Translate the window so the cursor ends up back on the tab it was
    /// dragging
    fn stay_below_mouse(&self) {
        let pointer = self.desktop.pointer_position();
        let tab_rect = self.desktop.tab_rect(self.window);
        if tab_rect.contains(pointer) {
            return;
        }

        let dx = pointer.x - pointer.x.clamp(tab_rect.left, tab_rect.right);
        let dy = pointer.y - pointer.y.clamp(tab_rect.top, tab_rect.bottom);
        if dx != 0. || dy != 0. {
            self.desktop.move_window_by(self.window, dx, dy);
        }
    }

    /// Hook called by an area when this window left it
    pub(crate) fn removed_from_area(&self, area: &Rc<WindowArea>) {
        for behaviour in self.behaviours.borrow().clone() {
            behaviour.removed_from_area(area);
        }
    }

    /// Swap this window's cookie over to `group` during a split
    pub(crate) fn set_group_cookie(&self, group: &Rc<SatGroup>, area: &Rc<WindowArea>) {
        *self.group.borrow_mut() = Some(Rc::clone(group));
        *self.area.borrow_mut() = Rc::downgrade(area);
    }

    /// Drop all group state without touching the host; the window is on
    /// its way out
    pub(crate) fn prepare_shutdown(&self) {
        self.shutdown.set(true);
    }

    /// Tear the window out of every structure; called when the host
    /// removed the window. Splits the remaining group as needed.
    pub(crate) fn dispose(self: &Rc<Self>) {
        self.prepare_shutdown();
        self.clear_snapping_candidates();

        let group = self.group.borrow().clone();
        if let Some(group) = group {
            let _ = group.remove_window(self, false);
        }
    }

    // ========================== Stacking ===========================

    /// Stack `child` onto this window's area, directly after it.
    ///
    /// The host merges the native window stacks afterwards; if it
    /// refuses, the group insertion is rolled back.
    pub fn stack_window(self: &Rc<Self>, child: &Rc<SatWindow>) -> Result<()> {
        let group = self.group().ok_or(Error::AreaRegistration)?;
        let area = self.area().ok_or(Error::AreaRegistration)?;

        group.add_window_to_area(child, &area, Some(self))?;
        self.do_group_layout();

        if !self.desktop.merge_window_stacks(self.window, child.window()) {
            let _ = group.remove_window(child, false);
            return Err(Error::StackMergeRefused);
        }

        for window in area.windows() {
            window.set_stacked_mode(true);
        }
        Ok(())
    }

    // ========================== Snapping ===========================

    /// Let every behaviour look for a merge target among `groups`; the
    /// first hit becomes the ongoing snapping
    pub fn find_snapping_candidates(&self, groups: &[Rc<SatGroup>]) {
        *self.ongoing_snapping.borrow_mut() = None;

        let behaviours = self.behaviours.borrow().clone();
        for group in groups {
            for behaviour in &behaviours {
                if behaviour.find_snapping_candidates(group) {
                    *self.ongoing_snapping.borrow_mut() = Some(Rc::clone(behaviour));
                    return;
                }
            }
        }
    }

    /// Commit the ongoing snapping, if any
    pub fn join_candidates(&self) -> bool {
        let ongoing = self.ongoing_snapping.borrow_mut().take();
        match ongoing {
            Some(behaviour) => behaviour.join_candidates(),
            None => false,
        }
    }

    /// Abandon the ongoing snapping and clear its highlights
    pub fn clear_snapping_candidates(&self) {
        if let Some(behaviour) = self.ongoing_snapping.borrow_mut().take() {
            behaviour.reset_search_results();
        }
    }

    // =========================== Layout ============================

    /// Re-layout the window's group around its area
    pub fn do_group_layout(self: &Rc<Self>) {
        if !self.position_managed() {
            return;
        }

        if let Some(area) = self.area() {
            area.do_group_layout(self);
        }
        for behaviour in self.behaviours.borrow().clone() {
            behaviour.do_group_layout();
        }
    }

    /// Move and resize the host window onto its area's solved tabs
    pub(crate) fn move_window_to_sat(self: &Rc<Self>) {
        let area = match self.area() {
            Some(area) => area,
            None => return,
        };
        let target = area.frame();
        let frame = self.complete_window_frame();

        let dx = target.left - frame.left;
        let dy = target.top - frame.top;
        if dx != 0. || dy != 0. {
            self.desktop.move_window_by(self.window, dx, dy);
        }

        let dw = target.width() - frame.width();
        let dh = target.height() - frame.height();
        if dw != 0. || dh != 0. {
            self.desktop.resize_window_by(self.window, dw, dh);
        }
    }

    /// After a committed user resize, remember every area's new size as
    /// its preferred one
    pub fn update_group_windows_size(self: &Rc<Self>) {
        let group = match self.group() {
            Some(group) => group,
            None => return,
        };
        for area in group.areas() {
            area.update_size_constraints(area.frame());
        }
    }

    // ============================ Frames ===========================

    /// The host frame inflated by the decorator extents; windows on
    /// another workspace use their stored anchor position
    pub fn complete_window_frame(&self) -> Rect {
        let mut frame = self.desktop.window_frame(self.window);

        if !self.desktop.on_current_workspace(self.window) {
            if let Some(anchor) = self
                .desktop
                .anchor_position(self.window, self.desktop.current_workspace())
            {
                frame = frame.offset_to(anchor);
            }
        }

        frame + self.desktop.decor_extents(self.window)
    }

    // ========================= Size limits =========================

    /// The client-declared limits this window returns to outside a group
    pub fn original_size_limits(&self) -> SizeLimits {
        *self.original_limits.borrow()
    }

    /// Track a client-side limit change; the area's constraints follow
    pub(crate) fn set_original_size_limits(&self, limits: SizeLimits) {
        *self.original_limits.borrow_mut() = limits;
        if let Some(area) = self.area() {
            area.update_size_limits();
        }
    }

    /// The original limits converted to decorated-frame space, clamped so
    /// the solver never overflows
    pub(crate) fn size_limits_with_decor(&self) -> SizeLimits {
        let extents = self.desktop.decor_extents(self.window);
        let limits = *self.original_limits.borrow();
        let horizontal = extents.left + extents.right;
        let vertical = extents.top + extents.bottom;

        SizeLimits::new(
            (limits.min_width + horizontal).min(MAX_SOLVER_SIZE),
            (limits.max_width + horizontal).min(MAX_SOLVER_SIZE),
            (limits.min_height + vertical).min(MAX_SOLVER_SIZE),
            (limits.max_height + vertical).min(MAX_SOLVER_SIZE),
        )
    }

    /// Give the solver slack while the window shares a group
    pub(crate) fn adjust_size_limits(&self) {
        self.desktop
            .set_size_limits(self.window, SizeLimits::unconstrained());
    }

    /// Remember the current host size while the window is solo, so a
    /// later group exit can restore non-resizable axes exactly
    pub(crate) fn note_frame_changed(&self) {
        if self.position_managed() {
            return;
        }
        let frame = self.desktop.window_frame(self.window);
        self.original_size.set((frame.width(), frame.height()));
    }

    // ========================= Decorator ===========================

    /// Toggle the stack-and-tile highlight on the tab; returns whether
    /// anything changed
    pub fn highlight_tab(&self, active: bool) -> bool {
        let state = if active {
            HighlightState::StackAndTile
        } else {
            HighlightState::Clear
        };
        if self.desktop.set_highlight(self.window, DecorRegion::Tab, state) {
            self.desktop.process_dirty_region(self.window);
            return true;
        }
        false
    }

    /// Toggle the stack-and-tile highlight on one border region
    pub fn highlight_border(&self, region: DecorRegion, active: bool) -> bool {
        let state = if active {
            HighlightState::StackAndTile
        } else {
            HighlightState::Clear
        };
        if self.desktop.set_highlight(self.window, region, state) {
            self.desktop.process_dirty_region(self.window);
            return true;
        }
        false
    }

    /// Switch the decorator between solo and stacked tab drawing
    pub(crate) fn set_stacked_mode(&self, stacked: bool) {
        self.desktop.set_stacked_mode(self.window, stacked);
    }

    /// Width of this window's tab while it shares a tab bar
    pub(crate) fn set_stacked_tab_length(&self, length: f32) {
        self.desktop.set_stacked_tab_length(self.window, length);
    }

    // ======================== Notifications ========================

    /// The user dragged the tab along the tab bar
    pub(crate) fn tab_location_moved(&self, location: f32, shifting: bool) {
        for behaviour in self.behaviours.borrow().clone() {
            behaviour.tab_location_moved(location, shifting);
        }
    }

    /// The window's look changed; behaviours may eject it from its group
    pub(crate) fn window_look_changed(&self, look: WindowLook) {
        for behaviour in self.behaviours.borrow().clone() {
            behaviour.window_look_changed(look);
        }
    }
}
