//! A rectangular region bounded by four crossings, holding the stack of
//! windows sharing that rectangle.
//!
//! The area owns the solver constraints for its rectangle: near-hard
//! min/max size bounds and soft preferred sizes. Group layout anchors the
//! dragged area, solves, and pushes the result out to every member window.

use crate::{
    error::{Error, Result},
    geometry::Rect,
    group::SatGroup,
    solver::{Constraint, Operator, SolveResult, EXTENT_PENALTY, HIGH_PENALTY, INEQUALITY_PENALTY},
    tab::{Corner, Crossing, Tab},
    types::{CornerPosition, CornerStatus, MAX_SOLVER_SIZE},
    window::SatWindow,
};
use std::{
    cell::{Cell, RefCell},
    fmt,
    rc::{Rc, Weak},
};

/// Solve attempts before a layout gives up on a non-optimal solver
const SOLVE_ATTEMPTS: usize = 15;

/// The six solver constraints an area installs for its rectangle
struct SizeConstraints {
    min_width:        Rc<Constraint>,
    min_height:       Rc<Constraint>,
    max_width:        Rc<Constraint>,
    max_height:       Rc<Constraint>,
    preferred_width:  Rc<Constraint>,
    preferred_height: Rc<Constraint>,
}

impl SizeConstraints {
    fn all(&self) -> [&Rc<Constraint>; 6] {
        [
            &self.min_width,
            &self.min_height,
            &self.max_width,
            &self.max_height,
            &self.preferred_width,
            &self.preferred_height,
        ]
    }
}

/// The two quadrants sharing an edge with `inner` at the same crossing
const fn neighbour_positions(inner: CornerPosition) -> [CornerPosition; 2] {
    match inner {
        CornerPosition::LeftTop => [CornerPosition::RightTop, CornerPosition::LeftBottom],
        CornerPosition::RightTop => [CornerPosition::LeftTop, CornerPosition::RightBottom],
        CornerPosition::LeftBottom => [CornerPosition::LeftTop, CornerPosition::RightBottom],
        CornerPosition::RightBottom => [CornerPosition::RightTop, CornerPosition::LeftBottom],
    }
}

// ============================ WindowArea ============================
// ====================================================================

/// A rectangle delimited by four crossings, containing one or more
/// stacked windows
pub struct WindowArea {
    group: RefCell<Weak<SatGroup>>,

    left_top:     RefCell<Rc<Crossing>>,
    right_top:    RefCell<Rc<Crossing>>,
    left_bottom:  RefCell<Rc<Crossing>>,
    right_bottom: RefCell<Rc<Crossing>>,

    /// Insertion/user order; the tab bar shows this order
    windows:     RefCell<Vec<Rc<SatWindow>>>,
    /// Back-to-front paint order; the last entry is the visible window
    layer_order: RefCell<Vec<Rc<SatWindow>>>,

    constraints: RefCell<Option<SizeConstraints>>,

    /// Tracks failed-solve transitions so each one is logged only once
    solve_failed: Cell<bool>,
}

impl WindowArea {
    pub(crate) fn new(
        left_top: Rc<Crossing>,
        right_top: Rc<Crossing>,
        left_bottom: Rc<Crossing>,
        right_bottom: Rc<Crossing>,
    ) -> Rc<Self> {
        Rc::new(Self {
            group: RefCell::new(Weak::new()),
            left_top: RefCell::new(left_top),
            right_top: RefCell::new(right_top),
            left_bottom: RefCell::new(left_bottom),
            right_bottom: RefCell::new(right_bottom),
            windows: RefCell::new(Vec::new()),
            layer_order: RefCell::new(Vec::new()),
            constraints: RefCell::new(None),
            solve_failed: Cell::new(false),
        })
    }

    /// Wire the area into `group`: register it and install the six size
    /// constraints in the group's linear spec.
    ///
    /// Fails without side effects when the four crossings do not form an
    /// axis-aligned rectangle.
    pub(crate) fn init(self: &Rc<Self>, group: &Rc<SatGroup>) -> Result<()> {
        if !self.crossings_form_rectangle() {
            return Err(Error::AreaRegistration);
        }

        let spec = group.linear_spec();
        let left = self.left_tab();
        let right = self.right_tab();
        let top = self.top_tab();
        let bottom = self.bottom_tab();

        let width_terms = || {
            vec![
                (-1., Rc::clone(left.variable())),
                (1., Rc::clone(right.variable())),
            ]
        };
        let height_terms = || {
            vec![
                (-1., Rc::clone(top.variable())),
                (1., Rc::clone(bottom.variable())),
            ]
        };

        let constraints = SizeConstraints {
            min_width:        spec.add_constraint(
                width_terms(),
                Operator::Ge,
                0.,
                Some(INEQUALITY_PENALTY),
                Some(INEQUALITY_PENALTY),
            ),
            min_height:       spec.add_constraint(
                height_terms(),
                Operator::Ge,
                0.,
                Some(INEQUALITY_PENALTY),
                Some(INEQUALITY_PENALTY),
            ),
            max_width:        spec.add_constraint(
                width_terms(),
                Operator::Le,
                f64::from(MAX_SOLVER_SIZE),
                Some(INEQUALITY_PENALTY),
                Some(INEQUALITY_PENALTY),
            ),
            max_height:       spec.add_constraint(
                height_terms(),
                Operator::Le,
                f64::from(MAX_SOLVER_SIZE),
                Some(INEQUALITY_PENALTY),
                Some(INEQUALITY_PENALTY),
            ),
            preferred_width:  spec.add_constraint(
                width_terms(),
                Operator::Eq,
                0.,
                Some(EXTENT_PENALTY),
                Some(EXTENT_PENALTY),
            ),
            preferred_height: spec.add_constraint(
                height_terms(),
                Operator::Eq,
                0.,
                Some(EXTENT_PENALTY),
                Some(EXTENT_PENALTY),
            ),
        };

        *self.constraints.borrow_mut() = Some(constraints);
        *self.group.borrow_mut() = Rc::downgrade(group);
        group.register_area(self);
        Ok(())
    }

    fn crossings_form_rectangle(&self) -> bool {
        let lt = self.left_top.borrow();
        let rt = self.right_top.borrow();
        let lb = self.left_bottom.borrow();
        let rb = self.right_bottom.borrow();

        Rc::ptr_eq(lt.horizontal_tab(), rt.horizontal_tab())
            && Rc::ptr_eq(lb.horizontal_tab(), rb.horizontal_tab())
            && Rc::ptr_eq(lt.vertical_tab(), lb.vertical_tab())
            && Rc::ptr_eq(rt.vertical_tab(), rb.vertical_tab())
    }

    // ========================== Accessors ==========================

    pub fn left_top_crossing(&self) -> Rc<Crossing> {
        Rc::clone(&self.left_top.borrow())
    }

    pub fn right_top_crossing(&self) -> Rc<Crossing> {
        Rc::clone(&self.right_top.borrow())
    }

    pub fn left_bottom_crossing(&self) -> Rc<Crossing> {
        Rc::clone(&self.left_bottom.borrow())
    }

    pub fn right_bottom_crossing(&self) -> Rc<Crossing> {
        Rc::clone(&self.right_bottom.borrow())
    }

    /// The vertical tab all members' left edges sit on
    pub fn left_tab(&self) -> Rc<Tab> {
        Rc::clone(self.left_top.borrow().vertical_tab())
    }

    /// The vertical tab all members' right edges sit on
    pub fn right_tab(&self) -> Rc<Tab> {
        Rc::clone(self.right_bottom.borrow().vertical_tab())
    }

    /// The horizontal tab all members' top edges sit on
    pub fn top_tab(&self) -> Rc<Tab> {
        Rc::clone(self.left_top.borrow().horizontal_tab())
    }

    /// The horizontal tab all members' bottom edges sit on
    pub fn bottom_tab(&self) -> Rc<Tab> {
        Rc::clone(self.right_bottom.borrow().horizontal_tab())
    }

    /// The rectangle currently described by the four tabs
    pub fn frame(&self) -> Rect {
        Rect::new(
            self.left_tab().position(),
            self.top_tab().position(),
            self.right_tab().position(),
            self.bottom_tab().position(),
        )
    }

    /// The owning group, while the area is alive
    pub fn group(&self) -> Option<Rc<SatGroup>> {
        self.group.borrow().upgrade()
    }

    /// Members in tab order
    pub fn windows(&self) -> Vec<Rc<SatWindow>> {
        self.windows.borrow().clone()
    }

    /// Number of stacked windows
    pub fn window_count(&self) -> usize {
        self.windows.borrow().len()
    }

    /// Member at `index` in tab order
    pub fn window_at(&self, index: usize) -> Option<Rc<SatWindow>> {
        self.windows.borrow().get(index).cloned()
    }

    /// Tab-order index of `window`
    pub fn index_of(&self, window: &Rc<SatWindow>) -> Option<usize> {
        self.windows
            .borrow()
            .iter()
            .position(|w| Rc::ptr_eq(w, window))
    }

    /// Is `window` stacked in this area?
    pub fn contains(&self, window: &Rc<SatWindow>) -> bool {
        self.index_of(window).is_some()
    }

    /// The member currently drawn on top
    pub fn top_window(&self) -> Option<Rc<SatWindow>> {
        self.layer_order.borrow().last().cloned()
    }

    // ========================= Membership ==========================

    /// Insert `window`, after `after` or at the end of the tab order.
    ///
    /// The first window marks the area's inner corners as used; every
    /// membership change re-derives the size limits.
    pub(crate) fn add_window(
        self: &Rc<Self>,
        window: &Rc<SatWindow>,
        after: Option<&Rc<SatWindow>>,
    ) {
        {
            let mut list = self.windows.borrow_mut();
            let index = after
                .and_then(|a| list.iter().position(|w| Rc::ptr_eq(w, a)))
                .map_or(list.len(), |i| i + 1);
            list.insert(index, Rc::clone(window));
        }
        self.layer_order.borrow_mut().push(Rc::clone(window));

        if self.window_count() == 1 {
            self.init_corners();
            self.update_size_constraints(window.complete_window_frame());
        }
        self.update_size_limits();
    }

    /// Remove `window`; the area tears itself down when it empties.
    ///
    /// Returns `false` when the window was not a member. The caller's
    /// strong reference keeps the area alive for the duration of the call.
    pub(crate) fn remove_window(self: &Rc<Self>, window: &Rc<SatWindow>) -> bool {
        let removed = {
            let mut list = self.windows.borrow_mut();
            match list.iter().position(|w| Rc::ptr_eq(w, window)) {
                Some(index) => {
                    list.remove(index);
                    true
                }
                None => false,
            }
        };
        if !removed {
            return false;
        }

        self.layer_order
            .borrow_mut()
            .retain(|w| !Rc::ptr_eq(w, window));
        window.removed_from_area(self);

        if self.windows.borrow().is_empty() {
            self.uninit();
        } else {
            self.update_size_limits();
        }
        true
    }

    /// Reorder `window` to `index` in the tab order; geometry is untouched
    pub fn move_window_to_position(&self, window: &Rc<SatWindow>, index: usize) -> Result<()> {
        let mut list = self.windows.borrow_mut();
        let old = list
            .iter()
            .position(|w| Rc::ptr_eq(w, window))
            .ok_or_else(|| Error::NotInGroup(window.id()))?;
        let moved = list.remove(old);
        let index = index.min(list.len());
        list.insert(index, moved);
        Ok(())
    }

    /// Raise `window` to the top of the paint order; geometry is untouched
    pub fn move_to_top_layer(&self, window: &Rc<SatWindow>) -> bool {
        let mut order = self.layer_order.borrow_mut();
        match order.iter().position(|w| Rc::ptr_eq(w, window)) {
            Some(index) => {
                let moved = order.remove(index);
                order.push(moved);
                true
            }
            None => false,
        }
    }

    // =========================== Layout ============================

    /// Re-layout the whole group around this area.
    ///
    /// The trigger window's current position anchors the area hard; its
    /// size dominates through a temporary penalty boost. Afterwards every
    /// area's top window is moved/resized to the solved tab positions.
    pub(crate) fn do_group_layout(&self, trigger: &Rc<SatWindow>) {
        let group = match self.group.borrow().upgrade() {
            Some(group) => group,
            None => return,
        };
        let frame = trigger.complete_window_frame();

        {
            let guard = self.constraints.borrow();
            let constraints = match guard.as_ref() {
                Some(constraints) => constraints,
                None => return,
            };
            constraints.preferred_width.set_rhs(f64::from(frame.width()));
            constraints
                .preferred_height
                .set_rhs(f64::from(frame.height()));
            constraints
                .preferred_width
                .set_penalties(Some(HIGH_PENALTY), Some(HIGH_PENALTY));
            constraints
                .preferred_height
                .set_penalties(Some(HIGH_PENALTY), Some(HIGH_PENALTY));
        }

        let spec = group.linear_spec();
        let left_pin = self.left_tab().pin(frame.left);
        let top_pin = self.top_tab().pin(frame.top);

        let mut result = SolveResult::Suboptimal;
        for _attempt in 0..SOLVE_ATTEMPTS {
            result = spec.solve();
            if result != SolveResult::Suboptimal {
                break;
            }
        }

        if result == SolveResult::Infeasible {
            if !self.solve_failed.get() {
                log::warn!("group layout is infeasible, keeping previous geometry");
                self.solve_failed.set(true);
            }
        } else {
            self.solve_failed.set(false);
            group.adjust_windows(trigger);
        }

        if let Some(pin) = left_pin {
            spec.remove_constraint(&pin);
        }
        if let Some(pin) = top_pin {
            spec.remove_constraint(&pin);
        }
        if let Some(constraints) = self.constraints.borrow().as_ref() {
            constraints
                .preferred_width
                .set_penalties(Some(EXTENT_PENALTY), Some(EXTENT_PENALTY));
            constraints
                .preferred_height
                .set_penalties(Some(EXTENT_PENALTY), Some(EXTENT_PENALTY));
        }
    }

    /// Re-derive the min/max constraints from the members' size limits.
    ///
    /// Min is the largest member minimum, max the smallest member maximum,
    /// both clamped so the solver never overflows; an inverted range is
    /// resolved by widening max to min.
    pub(crate) fn update_size_limits(&self) {
        let guard = self.constraints.borrow();
        let constraints = match guard.as_ref() {
            Some(constraints) => constraints,
            None => return,
        };

        let mut min_width = 0_f32;
        let mut min_height = 0_f32;
        let mut max_width = MAX_SOLVER_SIZE;
        let mut max_height = MAX_SOLVER_SIZE;

        for window in self.windows.borrow().iter() {
            let limits = window.size_limits_with_decor();
            min_width = min_width.max(limits.min_width);
            min_height = min_height.max(limits.min_height);
            max_width = max_width.min(limits.max_width);
            max_height = max_height.min(limits.max_height);
        }

        min_width = min_width.min(MAX_SOLVER_SIZE);
        min_height = min_height.min(MAX_SOLVER_SIZE);
        if max_width < min_width {
            max_width = min_width;
        }
        if max_height < min_height {
            max_height = min_height;
        }

        constraints.min_width.set_rhs(f64::from(min_width));
        constraints.min_height.set_rhs(f64::from(min_height));
        constraints.max_width.set_rhs(f64::from(max_width));
        constraints.max_height.set_rhs(f64::from(max_height));
    }

    /// Remember a committed user resize in the preferred sizes, without
    /// solving
    pub(crate) fn update_size_constraints(&self, frame: Rect) {
        if let Some(constraints) = self.constraints.borrow().as_ref() {
            constraints.preferred_width.set_rhs(f64::from(frame.width()));
            constraints
                .preferred_height
                .set_rhs(f64::from(frame.height()));
        }
    }

    // ======================= Group migration =======================

    /// Move this area and its windows into `group`.
    ///
    /// Matching tabs and crossings are found or created by position in the
    /// destination; the constraints move to the destination's linear spec;
    /// every member window follows. Nothing is mutated until all four
    /// destination crossings exist, so failure leaves the area untouched.
    pub(crate) fn propagate_to_group(self: &Rc<Self>, group: &Rc<SatGroup>) -> Result<()> {
        let new_left_top = self.crossing_by_position(&self.left_top_crossing(), group);
        let new_right_top = self.crossing_by_position(&self.right_top_crossing(), group);
        let new_left_bottom = self.crossing_by_position(&self.left_bottom_crossing(), group);
        let new_right_bottom = self.crossing_by_position(&self.right_bottom_crossing(), group);

        let (new_left_top, new_right_top, new_left_bottom, new_right_bottom) =
            match (new_left_top, new_right_top, new_left_bottom, new_right_bottom) {
                (Some(lt), Some(rt), Some(lb), Some(rb)) => (lt, rt, lb, rb),
                _ => return Err(Error::AreaRegistration),
            };

        let old_group = self.group.borrow().upgrade();

        // detach the constraints from the old group's solver
        let old_rhs = self.constraints.borrow().as_ref().map(|constraints| {
            constraints.all().map(|c| c.rhs())
        });
        if let (Some(old), Some(constraints)) = (&old_group, self.constraints.borrow().as_ref()) {
            for constraint in constraints.all() {
                old.linear_spec().remove_constraint(constraint);
            }
        }
        *self.constraints.borrow_mut() = None;
        if let Some(old) = &old_group {
            old.unregister_area(self);
        }

        *self.left_top.borrow_mut() = new_left_top;
        *self.right_top.borrow_mut() = new_right_top;
        *self.left_bottom.borrow_mut() = new_left_bottom;
        *self.right_bottom.borrow_mut() = new_right_bottom;

        self.init(group)?;
        if let (Some(constraints), Some(rhs)) = (self.constraints.borrow().as_ref(), old_rhs) {
            for (constraint, value) in constraints.all().iter().zip(rhs) {
                constraint.set_rhs(value);
            }
        }

        for window in self.windows() {
            if let Some(old) = &old_group {
                old.forget_window_entry(&window);
            }
            group.adopt_window_entry(&window);
            window.set_group_cookie(group, self);
        }

        // the inner corners of the destination crossings are ours now
        self.init_corners();
        Ok(())
    }

    /// Find or create the crossing in `group` matching `crossing`'s
    /// position
    fn crossing_by_position(
        &self,
        crossing: &Rc<Crossing>,
        group: &Rc<SatGroup>,
    ) -> Option<Rc<Crossing>> {
        let horizontal_position = crossing.horizontal_tab().position();
        let vertical_position = crossing.vertical_tab().position();

        let horizontal = group
            .find_horizontal_tab(horizontal_position)
            .unwrap_or_else(|| group.add_horizontal_tab(horizontal_position));

        if let Some(existing) = horizontal.find_crossing_at(vertical_position) {
            return Some(existing);
        }

        let vertical = group
            .find_vertical_tab(vertical_position)
            .unwrap_or_else(|| group.add_vertical_tab(vertical_position));
        horizontal.add_crossing(&vertical).ok()
    }

    // ========================== Teardown ===========================

    /// Undo a successful [`init`](Self::init) for an area that never
    /// received a window
    pub(crate) fn discard(self: &Rc<Self>, group: &Rc<SatGroup>) {
        if let Some(constraints) = self.constraints.borrow_mut().take() {
            for constraint in constraints.all() {
                group.linear_spec().remove_constraint(constraint);
            }
        }
        group.unregister_area(self);
        *self.group.borrow_mut() = Weak::new();
    }


    /// Last window left: split the group around us, free our corners and
    /// drop the constraints
    fn uninit(self: &Rc<Self>) {
        let group = self.group.borrow().upgrade();

        if let Some(group) = &group {
            group.area_removed(self);
        }
        self.cleanup_corners();
        if let Some(group) = &group {
            if let Some(constraints) = self.constraints.borrow_mut().take() {
                for constraint in constraints.all() {
                    group.linear_spec().remove_constraint(constraint);
                }
            }
        }
        *self.group.borrow_mut() = Weak::new();
    }

    // =========================== Corners ===========================

    /// The four (crossing, inner-quadrant) pairs of this rectangle
    fn corner_quartet(&self) -> [(Rc<Crossing>, CornerPosition); 4] {
        [
            (self.left_top_crossing(), CornerPosition::RightBottom),
            (self.right_top_crossing(), CornerPosition::LeftBottom),
            (self.left_bottom_crossing(), CornerPosition::RightTop),
            (self.right_bottom_crossing(), CornerPosition::LeftTop),
        ]
    }

    /// Mark the inner corners used and open the neighbouring quadrants up
    /// for docking
    fn init_corners(self: &Rc<Self>) {
        for (crossing, inner) in self.corner_quartet() {
            let corner = crossing.corner(inner);
            corner.set_status(CornerStatus::Used);
            corner.set_window_area(Rc::downgrade(self));

            for position in neighbour_positions(inner) {
                let neighbour = crossing.corner(position);
                if neighbour.status() == CornerStatus::NotDockable {
                    neighbour.set_status(CornerStatus::Free);
                }
            }
        }
    }

    /// Release the inner corners; each freed neighbour reverts to
    /// not-dockable unless its opponent corner is still used.
    ///
    /// The opponent is a fixed corner per neighbour, on the crossing one
    /// rectangle edge away; it is not the diagonal at the neighbour's own
    /// crossing.
    fn cleanup_corners(&self) {
        let left_top = self.left_top_crossing();
        let right_top = self.right_top_crossing();
        let left_bottom = self.left_bottom_crossing();
        let right_bottom = self.right_bottom_crossing();

        Self::unset_window_corner(left_top.corner(CornerPosition::RightBottom));
        Self::unset_neighbour_corner(
            left_top.corner(CornerPosition::LeftBottom),
            left_bottom.corner(CornerPosition::LeftTop),
        );
        Self::unset_neighbour_corner(
            left_top.corner(CornerPosition::RightTop),
            left_bottom.corner(CornerPosition::LeftTop),
        );

        Self::unset_window_corner(right_top.corner(CornerPosition::LeftBottom));
        Self::unset_neighbour_corner(
            right_top.corner(CornerPosition::LeftTop),
            left_bottom.corner(CornerPosition::RightTop),
        );
        Self::unset_neighbour_corner(
            right_top.corner(CornerPosition::RightBottom),
            left_bottom.corner(CornerPosition::RightTop),
        );

        Self::unset_window_corner(left_bottom.corner(CornerPosition::RightTop));
        Self::unset_neighbour_corner(
            left_bottom.corner(CornerPosition::LeftTop),
            left_bottom.corner(CornerPosition::LeftBottom),
        );
        Self::unset_neighbour_corner(
            left_bottom.corner(CornerPosition::RightBottom),
            left_bottom.corner(CornerPosition::LeftBottom),
        );

        Self::unset_window_corner(right_bottom.corner(CornerPosition::LeftTop));
        Self::unset_neighbour_corner(
            right_bottom.corner(CornerPosition::LeftBottom),
            right_bottom.corner(CornerPosition::RightBottom),
        );
        Self::unset_neighbour_corner(
            right_bottom.corner(CornerPosition::RightTop),
            right_bottom.corner(CornerPosition::RightBottom),
        );
    }

    fn unset_window_corner(corner: &Corner) {
        corner.set_status(CornerStatus::Free);
        corner.set_window_area(Weak::new());
    }

    fn unset_neighbour_corner(neighbour: &Corner, opponent: &Corner) {
        if neighbour.status() == CornerStatus::Free && opponent.status() != CornerStatus::Used {
            neighbour.set_status(CornerStatus::NotDockable);
        }
    }
}

impl fmt::Debug for WindowArea {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("WindowArea")
            .field("frame", &self.frame())
            .field("windows", &self.windows.borrow().len())
            .finish()
    }
}
