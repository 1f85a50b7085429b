//! A maximal connected set of window areas whose geometry is jointly
//! maintained by one linear spec.
//!
//! Groups own the solver, the tab lists and the member windows. Removing a
//! window may disconnect the adjacency graph; the connected-components
//! split then moves every stranded cluster into a freshly allocated group
//! and nudges any group that ended up off-screen back onto it.

use crate::{
    error::{Error, Result},
    geometry::{Point, Rect},
    host::WindowLookup,
    solver::{LinearSpec, MAX_SOLVER_VALUE},
    tab::{Crossing, Tab, POSITION_EPSILON},
    types::{CornerPosition, CornerStatus, Orientation},
    window::SatWindow,
    area::WindowArea,
};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    fmt,
    rc::{Rc, Weak},
};

// ============================= SatGroup =============================
// ====================================================================

/// The top-level entity tying tabs, areas and windows to one solver
pub struct SatGroup {
    linear_spec: LinearSpec,

    areas: RefCell<Vec<Rc<WindowArea>>>,

    horizontal_tabs:   RefCell<Vec<Weak<Tab>>>,
    vertical_tabs:     RefCell<Vec<Weak<Tab>>>,
    horizontal_sorted: Cell<bool>,
    vertical_sorted:   Cell<bool>,

    windows: RefCell<Vec<Rc<SatWindow>>>,

    /// Remembered for focus restoration when cycling between groups
    active_window: RefCell<Weak<SatWindow>>,
}

impl SatGroup {
    /// Create an empty group
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            linear_spec:       LinearSpec::new(),
            areas:             RefCell::new(Vec::new()),
            horizontal_tabs:   RefCell::new(Vec::new()),
            vertical_tabs:     RefCell::new(Vec::new()),
            horizontal_sorted: Cell::new(false),
            vertical_sorted:   Cell::new(false),
            windows:           RefCell::new(Vec::new()),
            active_window:     RefCell::new(Weak::new()),
        })
    }

    /// The solver owned by this group
    pub fn linear_spec(&self) -> &LinearSpec {
        &self.linear_spec
    }

    // ========================== Membership =========================

    /// Add `window` in a new area delimited by the given tabs.
    ///
    /// Missing tabs and crossings are created; any failure leaves the
    /// group unchanged.
    pub fn add_window(
        self: &Rc<Self>,
        window: &Rc<SatWindow>,
        left: Option<Rc<Tab>>,
        top: Option<Rc<Tab>>,
        right: Option<Rc<Tab>>,
        bottom: Option<Rc<Tab>>,
    ) -> Result<()> {
        log::debug!("SatGroup::add_window {:#x}", window.id());

        let left = left.unwrap_or_else(|| self.add_vertical_tab(0.));
        let top = top.unwrap_or_else(|| self.add_horizontal_tab(0.));
        let right = right.unwrap_or_else(|| self.add_vertical_tab(0.));
        let bottom = bottom.unwrap_or_else(|| self.add_horizontal_tab(0.));

        let left_top = match left.find_crossing(&top) {
            Some(crossing) => crossing,
            None => left.add_crossing(&top)?,
        };
        let right_top = match right.find_crossing(&top) {
            Some(crossing) => crossing,
            None => right.add_crossing(&top)?,
        };
        let left_bottom = match left.find_crossing(&bottom) {
            Some(crossing) => crossing,
            None => left.add_crossing(&bottom)?,
        };
        let right_bottom = match right.find_crossing(&bottom) {
            Some(crossing) => crossing,
            None => right.add_crossing(&bottom)?,
        };

        let area = WindowArea::new(left_top, right_top, left_bottom, right_bottom);
        area.init(self)?;

        if let Err(error) = self.add_window_to_area(window, &area, None) {
            area.discard(self);
            return Err(error);
        }
        Ok(())
    }

    /// Add `window` to an existing area, after `after` in tab order.
    ///
    /// This is how stacking merges windows; failure is fully unwound.
    pub fn add_window_to_area(
        self: &Rc<Self>,
        window: &Rc<SatWindow>,
        area: &Rc<WindowArea>,
        after: Option<&Rc<SatWindow>>,
    ) -> Result<()> {
        area.add_window(window, after);
        self.windows.borrow_mut().push(Rc::clone(window));

        if let Err(error) = window.added_to_group(self, area) {
            area.remove_window(window);
            self.windows
                .borrow_mut()
                .retain(|w| !Rc::ptr_eq(w, window));
            return Err(error);
        }
        Ok(())
    }

    /// Remove `window` from the group.
    ///
    /// The window's area may destroy itself and trigger a group split;
    /// with `stay_below_mouse` the evicted window is translated so the
    /// cursor stays over the decorator element it was on.
    pub fn remove_window(
        self: &Rc<Self>,
        window: &Rc<SatWindow>,
        stay_below_mouse: bool,
    ) -> Result<()> {
        let found = {
            let mut list = self.windows.borrow_mut();
            match list.iter().position(|w| Rc::ptr_eq(w, window)) {
                Some(index) => {
                    list.remove(index);
                    true
                }
                None => false,
            }
        };
        if !found {
            return Err(Error::NotInGroup(window.id()));
        }

        // the strong reference keeps the area alive through its own teardown
        if let Some(area) = window.area() {
            area.remove_window(window);
        }

        let remaining = self.window_count();
        window.removed_from_group(self, stay_below_mouse);

        if remaining >= 2 {
            if let Some(first) = self.window_at(0) {
                first.do_group_layout();
            }
        }
        Ok(())
    }

    /// Detach `window` without notifying it; used when a window trades
    /// its old group for a new one in a single step
    pub(crate) fn forget_window(self: &Rc<Self>, window: &Rc<SatWindow>) {
        self.windows
            .borrow_mut()
            .retain(|w| !Rc::ptr_eq(w, window));
        if let Some(area) = window.area() {
            area.remove_window(window);
        }
    }

    pub(crate) fn forget_window_entry(&self, window: &Rc<SatWindow>) {
        self.windows
            .borrow_mut()
            .retain(|w| !Rc::ptr_eq(w, window));
    }

    pub(crate) fn adopt_window_entry(&self, window: &Rc<SatWindow>) {
        self.windows.borrow_mut().push(Rc::clone(window));
    }

    /// Number of member windows
    pub fn window_count(&self) -> usize {
        self.windows.borrow().len()
    }

    /// Member window at `index`
    pub fn window_at(&self, index: usize) -> Option<Rc<SatWindow>> {
        self.windows.borrow().get(index).cloned()
    }

    /// All member windows
    pub fn windows(&self) -> Vec<Rc<SatWindow>> {
        self.windows.borrow().clone()
    }

    /// All areas, in no particular order
    pub fn areas(&self) -> Vec<Rc<WindowArea>> {
        self.areas.borrow().clone()
    }

    /// The window focus should return to when this group is activated
    pub fn active_window(&self) -> Option<Rc<SatWindow>> {
        self.active_window.borrow().upgrade()
    }

    pub(crate) fn set_active_window(&self, window: Option<&Rc<SatWindow>>) {
        *self.active_window.borrow_mut() = window.map_or_else(Weak::new, Rc::downgrade);
    }

    // ============================ Tabs =============================

    /// Horizontal tabs sorted by position, sorting lazily
    pub fn horizontal_tabs(&self) -> Vec<Rc<Tab>> {
        self.tabs(&self.horizontal_tabs, &self.horizontal_sorted)
    }

    /// Vertical tabs sorted by position, sorting lazily
    pub fn vertical_tabs(&self) -> Vec<Rc<Tab>> {
        self.tabs(&self.vertical_tabs, &self.vertical_sorted)
    }

    fn tabs(&self, list: &RefCell<Vec<Weak<Tab>>>, sorted: &Cell<bool>) -> Vec<Rc<Tab>> {
        let mut tabs: Vec<Rc<Tab>> = list
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .collect();
        if !sorted.get() {
            tabs.sort_by(Tab::compare);
            *list.borrow_mut() = tabs.iter().map(Rc::downgrade).collect();
            sorted.set(true);
        }
        tabs
    }

    /// The horizontal tab at `position`, within an epsilon of 1e-4
    pub fn find_horizontal_tab(&self, position: f32) -> Option<Rc<Tab>> {
        Self::find_tab(&self.horizontal_tabs, position)
    }

    /// The vertical tab at `position`, within an epsilon of 1e-4
    pub fn find_vertical_tab(&self, position: f32) -> Option<Rc<Tab>> {
        Self::find_tab(&self.vertical_tabs, position)
    }

    fn find_tab(list: &RefCell<Vec<Weak<Tab>>>, position: f32) -> Option<Rc<Tab>> {
        list.borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .find(|tab| (tab.position() - position).abs() < POSITION_EPSILON)
    }

    pub(crate) fn add_horizontal_tab(self: &Rc<Self>, position: f32) -> Rc<Tab> {
        let variable = self.linear_spec.add_variable();
        variable.set_range(0., MAX_SOLVER_VALUE);
        let tab = Tab::new(self, variable, Orientation::Horizontal);
        tab.set_position(position);
        self.horizontal_tabs
            .borrow_mut()
            .push(Rc::downgrade(&tab));
        self.horizontal_sorted.set(false);
        tab
    }

    pub(crate) fn add_vertical_tab(self: &Rc<Self>, position: f32) -> Rc<Tab> {
        let variable = self.linear_spec.add_variable();
        variable.set_range(0., MAX_SOLVER_VALUE);
        let tab = Tab::new(self, variable, Orientation::Vertical);
        tab.set_position(position);
        self.vertical_tabs.borrow_mut().push(Rc::downgrade(&tab));
        self.vertical_sorted.set(false);
        tab
    }

    /// Called from a dying tab; the variable is removed by the tab itself
    pub(crate) fn forget_tab(&self, orientation: Orientation, tab: *const Tab) {
        let (list, sorted) = match orientation {
            Orientation::Horizontal => (&self.horizontal_tabs, &self.horizontal_sorted),
            Orientation::Vertical => (&self.vertical_tabs, &self.vertical_sorted),
        };
        list.borrow_mut().retain(|weak| weak.as_ptr() != tab);
        sorted.set(false);
    }

    // ============================ Areas ============================

    pub(crate) fn register_area(&self, area: &Rc<WindowArea>) {
        self.areas.borrow_mut().push(Rc::clone(area));
    }

    pub(crate) fn unregister_area(&self, area: &Rc<WindowArea>) {
        self.areas
            .borrow_mut()
            .retain(|a| !Rc::ptr_eq(a, area));
    }

    /// An area lost its last window: detach it and split the group if its
    /// removal disconnected the adjacency graph
    pub(crate) fn area_removed(self: &Rc<Self>, area: &Rc<WindowArea>) {
        self.unregister_area(area);
        self.split_group_if_necessary(area);
    }

    // =========================== Layout ============================

    /// Push the solved tab positions out to every member window
    pub(crate) fn adjust_windows(&self, _trigger: &Rc<SatWindow>) {
        for window in self.windows() {
            window.move_window_to_sat();
        }
    }

    // ============================ Split ============================

    /// Flood the adjacency graph from the removed area's neighbours; the
    /// first cluster keeps this group, every further cluster moves into a
    /// fresh one, and all of them are nudged back onto the screen
    fn split_group_if_necessary(self: &Rc<Self>, removed: &Rc<WindowArea>) {
        if removed.window_count() > 1 {
            return;
        }

        let mut seeds = self.neighbours_of(removed);
        let mut own_group_processed = false;

        while let Some(cluster) = self.next_connected_cluster(&mut seeds, removed) {
            log::debug!("connected cluster found: {} area(s)", cluster.len());

            if cluster.len() == 1 && cluster[0].window_count() == 1 {
                // a stranded singleton just leaves; it gets its own group
                if let Some(window) = cluster[0].window_at(0) {
                    let _ = self.remove_window(&window, false);
                    Self::ensure_group_on_screen(window.group());
                }
            } else if own_group_processed {
                self.spawn_new_group(&cluster);
            } else {
                Self::ensure_group_on_screen(Some(Rc::clone(self)));
                own_group_processed = true;
            }
        }
    }

    fn next_connected_cluster(
        &self,
        seeds: &mut Vec<Rc<WindowArea>>,
        removed: &Rc<WindowArea>,
    ) -> Option<Vec<Rc<WindowArea>>> {
        if seeds.is_empty() {
            return None;
        }

        let start = seeds.remove(0);
        let mut cluster = vec![Rc::clone(&start)];
        let mut queue = VecDeque::from([start]);

        while let Some(area) = queue.pop_front() {
            for neighbour in self.neighbours_of(&area) {
                if Rc::ptr_eq(&neighbour, removed)
                    || cluster.iter().any(|a| Rc::ptr_eq(a, &neighbour))
                {
                    continue;
                }
                seeds.retain(|s| !Rc::ptr_eq(s, &neighbour));
                cluster.push(Rc::clone(&neighbour));
                queue.push_back(neighbour);
            }
        }
        Some(cluster)
    }

    /// All four-sided neighbours of `area`
    pub(crate) fn neighbours_of(&self, area: &Rc<WindowArea>) -> Vec<Rc<WindowArea>> {
        let mut neighbours = Vec::new();
        self.side_neighbours(area, Side::Left, &mut neighbours);
        self.side_neighbours(area, Side::Right, &mut neighbours);
        self.side_neighbours(area, Side::Top, &mut neighbours);
        self.side_neighbours(area, Side::Bottom, &mut neighbours);
        neighbours
    }

    /// Walk the crossings of the shared tab and collect every area whose
    /// extent overlaps the parent's by more than zero
    fn side_neighbours(
        &self,
        parent: &Rc<WindowArea>,
        side: Side,
        neighbours: &mut Vec<Rc<WindowArea>>,
    ) {
        let (tab, corner_position) = match side {
            Side::Left => (parent.left_tab(), CornerPosition::LeftTop),
            Side::Right => (parent.right_tab(), CornerPosition::RightTop),
            Side::Top => (parent.top_tab(), CornerPosition::LeftTop),
            Side::Bottom => (parent.bottom_tab(), CornerPosition::LeftBottom),
        };
        let (start, end) = side.extent(parent);

        let crossings = tab
            .crossings()
            .into_iter()
            .sorted_by(|a, b| {
                let key = |c: &Rc<Crossing>| match side {
                    Side::Left | Side::Right => c.horizontal_tab().position(),
                    Side::Top | Side::Bottom => c.vertical_tab().position(),
                };
                key(a).partial_cmp(&key(b)).unwrap_or(std::cmp::Ordering::Equal)
            });

        for crossing in crossings {
            let corner = crossing.corner(corner_position);
            if corner.status() != CornerStatus::Used {
                continue;
            }
            let area = match corner.window_area() {
                Some(area) => area,
                None => continue,
            };

            let (pos1, pos2) = side.extent(&area);
            if pos1 < end && pos2 > start {
                neighbours.push(area);
            }
            if pos2 > end {
                break;
            }
        }
    }

    /// Move a disconnected cluster into a freshly allocated group
    fn spawn_new_group(&self, cluster: &[Rc<WindowArea>]) {
        log::debug!("SatGroup::spawn_new_group with {} area(s)", cluster.len());
        let group = SatGroup::new();

        for area in cluster {
            if area.propagate_to_group(&group).is_err() {
                log::warn!("area could not be moved into the split-off group");
            }
        }
        Self::ensure_group_on_screen(Some(group));
    }

    // ======================= Screen recovery =======================

    /// If no member frame intersects the (inset) screen, translate the
    /// whole group by the smallest vector that brings a member back over
    /// a screen edge with some margin
    pub(crate) fn ensure_group_on_screen(group: Option<Rc<SatGroup>>) {
        let group = match group {
            Some(group) => group,
            None => return,
        };
        let window = match group.window_at(0) {
            Some(window) => window,
            None => return,
        };
        let desktop = window.desktop();
        let settings = &window.config().global;
        let overlap = settings.min_overlap;
        let move_to_screen = settings.move_to_screen;

        const BIG_DISTANCE: f32 = 1e10;

        let screen = desktop.screen_frame();
        let reduced_screen = screen.inset_by(overlap, overlap);

        let mut min_left = BIG_DISTANCE;
        let mut left_rect = Rect::zeroed();
        let mut min_top = BIG_DISTANCE;
        let mut top_rect = Rect::zeroed();
        let mut min_right = BIG_DISTANCE;
        let mut right_rect = Rect::zeroed();
        let mut min_bottom = BIG_DISTANCE;
        let mut bottom_rect = Rect::zeroed();

        for window in group.windows() {
            let frame = window.complete_window_frame();
            if reduced_screen.intersects(frame) {
                return;
            }

            if frame.right < screen.left + overlap {
                let distance = (screen.left - frame.right).abs();
                if distance < min_left {
                    min_left = distance;
                    left_rect = frame;
                } else if distance == min_left {
                    left_rect = left_rect.union(frame);
                }
            }
            if frame.top > screen.bottom - overlap {
                let distance = (frame.top - screen.bottom).abs();
                if distance < min_bottom {
                    min_bottom = distance;
                    bottom_rect = frame;
                } else if distance == min_bottom {
                    bottom_rect = bottom_rect.union(frame);
                }
            }
            if frame.left > screen.right - overlap {
                let distance = (frame.left - screen.right).abs();
                if distance < min_right {
                    min_right = distance;
                    right_rect = frame;
                } else if distance == min_right {
                    right_rect = right_rect.union(frame);
                }
            }
            if frame.bottom < screen.top + overlap {
                let distance = (frame.bottom - screen.top).abs();
                if distance < min_top {
                    min_top = distance;
                    top_rect = frame;
                } else if distance == min_top {
                    top_rect = top_rect.union(frame);
                }
            }
        }

        let mut offset = Point::default();
        if min_left < BIG_DISTANCE {
            offset.x = screen.left - left_rect.right + move_to_screen;
            Self::y_offset(&mut offset, left_rect, screen, overlap, move_to_screen);
        } else if min_top < BIG_DISTANCE {
            offset.y = screen.top - top_rect.bottom + move_to_screen;
            Self::x_offset(&mut offset, top_rect, screen, overlap, move_to_screen);
        } else if min_right < BIG_DISTANCE {
            offset.x = screen.right - right_rect.left - move_to_screen;
            Self::y_offset(&mut offset, right_rect, screen, overlap, move_to_screen);
        } else if min_bottom < BIG_DISTANCE {
            offset.y = screen.bottom - bottom_rect.top - move_to_screen;
            Self::x_offset(&mut offset, bottom_rect, screen, overlap, move_to_screen);
        }

        if offset.is_zero() {
            return;
        }
        log::debug!("moving group back on screen by ({}, {})", offset.x, offset.y);

        desktop.move_window_by(window.window(), offset.x, offset.y);
        window.do_group_layout();
    }

    fn x_offset(offset: &mut Point, frame: Rect, screen: Rect, overlap: f32, move_to: f32) {
        if frame.right < screen.left + overlap {
            offset.x = screen.left - frame.right + move_to;
        } else if frame.left > screen.right - overlap {
            offset.x = screen.right - frame.left - move_to;
        }
    }

    fn y_offset(offset: &mut Point, frame: Rect, screen: Rect, overlap: f32, move_to: f32) {
        if frame.top > screen.bottom - overlap {
            offset.y = screen.bottom - frame.top - move_to;
        } else if frame.bottom < screen.top + overlap {
            offset.y = screen.top - frame.bottom + move_to;
        }
    }

    // =========================== Archive ===========================

    /// Serialize the group: tab counts plus, per area, the four tab
    /// indices and the member window ids
    pub fn archive(&self) -> GroupArchive {
        let horizontal = self.horizontal_tabs();
        let vertical = self.vertical_tabs();

        let tab_index = |list: &[Rc<Tab>], tab: &Rc<Tab>| -> i32 {
            list.iter()
                .position(|t| Rc::ptr_eq(t, tab))
                .map_or(-1, |i| i as i32)
        };

        let areas = self
            .areas()
            .iter()
            .map(|area| AreaArchive {
                left_tab:   tab_index(&vertical, &area.left_tab()),
                right_tab:  tab_index(&vertical, &area.right_tab()),
                top_tab:    tab_index(&horizontal, &area.top_tab()),
                bottom_tab: tab_index(&horizontal, &area.bottom_tab()),
                windows:    area.windows().iter().map(|w| w.id()).collect(),
            })
            .collect();

        GroupArchive {
            htab_count: horizontal.len() as i32,
            vtab_count: vertical.len() as i32,
            areas,
        }
    }

    /// Rebuild a group from an archive, resolving window ids through the
    /// registry; unknown ids are skipped silently
    pub fn restore(archive: &GroupArchive, registry: &dyn WindowLookup) -> Result<Rc<Self>> {
        let group = Self::new();

        let horizontal: Vec<Rc<Tab>> = (0..archive.htab_count)
            .map(|_| group.add_horizontal_tab(0.))
            .collect();
        let vertical: Vec<Rc<Tab>> = (0..archive.vtab_count)
            .map(|_| group.add_vertical_tab(0.))
            .collect();

        for area in &archive.areas {
            let pick = |list: &[Rc<Tab>], index: i32| -> Result<Rc<Tab>> {
                usize::try_from(index)
                    .ok()
                    .and_then(|i| list.get(i).cloned())
                    .ok_or_else(|| Error::BadArchive(format!("tab index {} out of range", index)))
            };
            let left = pick(&vertical, area.left_tab)?;
            let right = pick(&vertical, area.right_tab)?;
            let top = pick(&horizontal, area.top_tab)?;
            let bottom = pick(&horizontal, area.bottom_tab)?;

            let mut previous: Option<Rc<SatWindow>> = None;
            for id in &area.windows {
                let window = match registry.find_sat_window(*id) {
                    Some(window) => window,
                    None => continue,
                };
                match &previous {
                    None => {
                        if group
                            .add_window(
                                &window,
                                Some(Rc::clone(&left)),
                                Some(Rc::clone(&top)),
                                Some(Rc::clone(&right)),
                                Some(Rc::clone(&bottom)),
                            )
                            .is_err()
                        {
                            continue;
                        }
                        previous = Some(window);
                    }
                    Some(parent) => {
                        if parent.stack_window(&window).is_err() {
                            continue;
                        }
                        previous = Some(window);
                    }
                }
            }
        }
        Ok(group)
    }
}

impl fmt::Debug for SatGroup {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("SatGroup")
            .field("areas", &self.areas.borrow().len())
            .field("windows", &self.windows.borrow().len())
            .field("horizontal_tabs", &self.horizontal_tabs.borrow().len())
            .field("vertical_tabs", &self.vertical_tabs.borrow().len())
            .finish()
    }
}

/// The four sides an area can have a neighbour on
#[derive(Debug, Clone, Copy)]
enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    /// The extent of `area` along this side's shared tab: vertical range
    /// for left/right neighbours, horizontal range for top/bottom ones
    fn extent(self, area: &Rc<WindowArea>) -> (f32, f32) {
        match self {
            Self::Left | Self::Right => (
                area.top_tab().position(),
                area.bottom_tab().position(),
            ),
            Self::Top | Self::Bottom => (
                area.left_tab().position(),
                area.right_tab().position(),
            ),
        }
    }
}

// ========================== Group archive ===========================
// ====================================================================

/// Serialized form of one group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupArchive {
    /// Number of horizontal tabs
    pub htab_count: i32,
    /// Number of vertical tabs
    pub vtab_count: i32,
    /// One entry per area
    #[serde(rename = "area")]
    pub areas:      Vec<AreaArchive>,
}

/// Serialized form of one area: tab indices into the per-orientation
/// lists plus the stacked window ids
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AreaArchive {
    /// Index of the left tab in the vertical tab list
    pub left_tab:   i32,
    /// Index of the right tab in the vertical tab list
    pub right_tab:  i32,
    /// Index of the top tab in the horizontal tab list
    pub top_tab:    i32,
    /// Index of the bottom tab in the horizontal tab list
    pub bottom_tab: i32,
    /// Stable ids of the stacked windows, in tab order
    #[serde(rename = "window")]
    pub windows:    Vec<u64>,
}
