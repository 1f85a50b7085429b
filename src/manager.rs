//! The stack-and-tile session: receives host events and orchestrates
//! drags, candidate search, commits, splits, and keyboard navigation.
//!
//! One [`StackAndTile`] lives for the lifetime of the listener
//! registration. All host events arrive on the server's event thread;
//! service calls back into the host may recurse into the listener hooks,
//! which a single in-progress flag guards against.

use crate::{
    config::Config,
    geometry::Point,
    group::SatGroup,
    host::{Desktop, WindowLookup},
    messages::{SatReply, SatRequest, SAT_IDENTIFIER},
    types::{
        KeyCode, KeyEventKind, Modifiers, SizeLimits, Window, WindowFeel, WindowLook,
        WorkspaceMask,
    },
    window::SatWindow,
};
use indexmap::IndexMap;
use std::{
    cell::{Cell, RefCell},
    rc::Rc,
};

/// The controller wiring host events to the group machinery
pub struct StackAndTile {
    desktop: Rc<dyn Desktop>,
    config:  Rc<Config>,

    windows: RefCell<IndexMap<Window, Rc<SatWindow>>>,

    /// The configured modifier is currently held
    sat_key_pressed: Cell<bool>,
    /// The window a pointer gesture started on
    current_window:  RefCell<Option<Rc<SatWindow>>>,
    /// A tab drag along the tab bar is in flight
    tab_is_shifting: Cell<bool>,
    /// Re-entrancy guard: notifications caused by our own host calls are
    /// dropped
    notifying:       Cell<bool>,
}

impl StackAndTile {
    /// Create a session talking to `desktop`
    pub fn new(desktop: Rc<dyn Desktop>, config: Config) -> Rc<Self> {
        Rc::new(Self {
            desktop,
            config: Rc::new(config),
            windows: RefCell::new(IndexMap::new()),
            sat_key_pressed: Cell::new(false),
            current_window: RefCell::new(None),
            tab_is_shifting: Cell::new(false),
            notifying: Cell::new(false),
        })
    }

    /// The magic identifier this listener answers to on the IPC link
    pub fn identifier() -> u32 {
        SAT_IDENTIFIER
    }

    /// The adapter for a host window, if it is managed
    pub fn sat_window(&self, window: Window) -> Option<Rc<SatWindow>> {
        self.windows.borrow().get(&window).cloned()
    }

    /// The session configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    fn with_guard<R>(&self, f: impl FnOnce() -> R) -> R {
        let previous = self.notifying.replace(true);
        let result = f();
        self.notifying.set(previous);
        result
    }

    // ====================== Listener lifecycle =====================

    /// Adopt every window the host already manages
    pub fn listener_registered(&self) {
        for window in self.desktop.windows_front_to_back() {
            self.window_added(window);
        }
    }

    /// Drop every adapter again
    pub fn listener_unregistered(&self) {
        let windows: Vec<Rc<SatWindow>> = self.windows.borrow().values().cloned().collect();
        for window in windows {
            window.dispose();
        }
        self.windows.borrow_mut().clear();
    }

    // ======================= Window lifecycle ======================

    /// A window appeared; wrap it in an adapter
    pub fn window_added(&self, window: Window) {
        if self.windows.borrow().contains_key(&window) {
            return;
        }
        let sat = SatWindow::new(
            Rc::clone(&self.desktop),
            Rc::clone(&self.config),
            window,
        );
        self.windows.borrow_mut().insert(window, sat);
    }

    /// A window disappeared; drop it from every structure and split its
    /// group as needed. Cancels a drag that was holding it.
    pub fn window_removed(&self, window: Window) {
        let sat = match self.windows.borrow_mut().shift_remove(&window) {
            Some(sat) => sat,
            None => return,
        };
        log::debug!("StackAndTile::window_removed {:#x}", sat.id());

        let was_current = self
            .current_window
            .borrow()
            .as_ref()
            .map_or(false, |current| Rc::ptr_eq(current, &sat));
        if was_current {
            *self.current_window.borrow_mut() = None;
        }

        self.with_guard(|| sat.dispose());
    }

    /// A window was hidden; unless it merely minimized it leaves its
    /// group
    pub fn window_hidden(&self, window: Window, from_minimize: bool) {
        if from_minimize {
            return;
        }
        let sat = match self.sat_window(window) {
            Some(sat) => sat,
            None => return,
        };
        if !sat.position_managed() {
            return;
        }
        if let Some(group) = sat.group() {
            self.with_guard(|| {
                let _ = group.remove_window(&sat, false);
            });
        }
    }

    /// Minimization spreads to the whole group
    pub fn window_minimized(&self, window: Window, minimize: bool) {
        if self.notifying.get() {
            return;
        }
        let sat = match self.sat_window(window) {
            Some(sat) => sat,
            None => return,
        };
        let group = match sat.group() {
            Some(group) => group,
            None => return,
        };

        self.with_guard(|| {
            for member in group.windows() {
                if !Rc::ptr_eq(&member, &sat) {
                    self.desktop.minimize_window(member.window(), minimize);
                }
            }
        });
    }

    // ========================== Pointer ============================

    /// Pointer went down on a window's decorator
    pub fn mouse_down(&self, window: Window, _point: Point, _buttons: u32) {
        let sat = match self.sat_window(window) {
            Some(sat) => sat,
            None => return,
        };
        *self.current_window.borrow_mut() = Some(sat);

        if !self.sat_key_pressed.get() {
            return;
        }
        self.start_sat();
    }

    /// Pointer released: commit a pending tab shift and any snap
    pub fn mouse_up(&self, window: Window, _point: Point) {
        if self.tab_is_shifting.get() {
            if let Some(sat) = self.sat_window(window) {
                self.tab_is_shifting.set(false);
                sat.tab_location_moved(self.desktop.window_tab_location(window), false);
            }
        }

        if self.sat_key_pressed.get() {
            self.stop_sat();
        }
        *self.current_window.borrow_mut() = None;
    }

    /// Pointer moved during a drag: recompute the candidates
    pub fn mouse_moved(&self, window: Window, _point: Point, _buttons: u32) {
        if !self.sat_key_pressed.get() || self.notifying.get() {
            return;
        }
        let dragging = self
            .current_window
            .borrow()
            .as_ref()
            .map_or(false, |current| current.window() == window);
        if !dragging {
            return;
        }
        if let Some(sat) = self.sat_window(window) {
            sat.find_snapping_candidates(&self.groups_front_to_back());
        }
    }

    // ========================= Geometry ============================

    /// While the modifier is held a move searches for candidates;
    /// otherwise the window's group follows it
    pub fn window_moved(&self, window: Window) {
        if self.notifying.get() {
            return;
        }
        let sat = match self.sat_window(window) {
            Some(sat) => sat,
            None => return,
        };

        if self.sat_key_pressed.get() {
            sat.find_snapping_candidates(&self.groups_front_to_back());
        } else {
            self.with_guard(|| sat.do_group_layout());
        }
    }

    /// A resize re-runs the layout and then commits the new sizes as the
    /// members' preferred ones
    pub fn window_resized(&self, window: Window) {
        if self.notifying.get() {
            return;
        }
        let sat = match self.sat_window(window) {
            Some(sat) => sat,
            None => return,
        };
        sat.note_frame_changed();

        if self.sat_key_pressed.get() {
            sat.find_snapping_candidates(&self.groups_front_to_back());
        } else {
            self.with_guard(|| {
                sat.do_group_layout();
                sat.update_group_windows_size();
            });
        }
    }

    // ====================== Focus and order ========================

    /// Activating one member raises the whole group
    pub fn window_activated(&self, window: Window) {
        if self.notifying.get() {
            return;
        }
        let sat = match self.sat_window(window) {
            Some(sat) => sat,
            None => return,
        };
        self.activate_window_and_group(&sat);
    }

    /// Sending one member behind drags the rest of the group along
    pub fn window_sent_behind(&self, window: Window, behind_of: Option<Window>) {
        if self.notifying.get() {
            return;
        }
        let sat = match self.sat_window(window) {
            Some(sat) => sat,
            None => return,
        };
        let group = match sat.group() {
            Some(group) => group,
            None => return,
        };

        self.with_guard(|| {
            for member in group.windows() {
                if !Rc::ptr_eq(&member, &sat) {
                    self.desktop.send_window_behind(member.window(), behind_of);
                }
            }
        });
    }

    /// Workspace membership is a group property; members never diverge
    pub fn window_workspaces_changed(&self, window: Window, workspaces: WorkspaceMask) {
        if self.notifying.get() {
            return;
        }
        let sat = match self.sat_window(window) {
            Some(sat) => sat,
            None => return,
        };
        let group = match sat.group() {
            Some(group) => group,
            None => return,
        };

        self.with_guard(|| {
            for member in group.windows() {
                if !Rc::ptr_eq(&member, &sat) {
                    self.desktop.set_window_workspaces(member.window(), workspaces);
                }
            }
        });
    }

    // ======================= Window attributes =====================

    /// The user started dragging a tab along the tab bar
    pub fn window_tab_location_changed(&self, window: Window, location: f32, is_shifting: bool) {
        let sat = match self.sat_window(window) {
            Some(sat) => sat,
            None => return,
        };
        self.tab_is_shifting.set(is_shifting);
        sat.tab_location_moved(location, is_shifting);
    }

    /// The client changed its size limits
    pub fn window_size_limits_changed(&self, window: Window, limits: SizeLimits) {
        if self.notifying.get() {
            return;
        }
        let sat = match self.sat_window(window) {
            Some(sat) => sat,
            None => return,
        };
        sat.set_original_size_limits(limits);
        self.with_guard(|| sat.do_group_layout());
    }

    /// A look change may disqualify the window from stacking
    pub fn window_look_changed(&self, window: Window, look: WindowLook) {
        let sat = match self.sat_window(window) {
            Some(sat) => sat,
            None => return,
        };
        self.with_guard(|| sat.window_look_changed(look));
    }

    /// Non-normal windows never take part in groups
    pub fn window_feel_changed(&self, window: Window, feel: WindowFeel) {
        if feel == WindowFeel::Normal {
            return;
        }
        let sat = match self.sat_window(window) {
            Some(sat) => sat,
            None => return,
        };
        if !sat.position_managed() {
            return;
        }
        if let Some(group) = sat.group() {
            self.with_guard(|| {
                let _ = group.remove_window(&sat, false);
            });
        }
    }

    /// Decorator settings passthrough; the core holds no decorator state
    pub fn set_decorator_settings(&self, window: Window, _settings: &serde_json::Value) -> bool {
        let _ = self.sat_window(window);
        false
    }

    /// Decorator settings passthrough; the core holds no decorator state
    pub fn get_decorator_settings(&self, window: Window) -> Option<serde_json::Value> {
        let _ = self.sat_window(window)?;
        None
    }

    // ========================= Keyboard ============================

    /// Handle a key event; returns `true` when the event was consumed
    pub fn key_pressed(&self, kind: KeyEventKind, key: KeyCode, modifiers: Modifiers) -> bool {
        match kind {
            KeyEventKind::ModifiersChanged => {
                let was_pressed = self.sat_key_pressed.get();
                let pressed = modifiers.contains(self.config.global.modifier.mask());
                self.sat_key_pressed.set(pressed);

                if was_pressed && !pressed {
                    self.stop_sat();
                }
                if !was_pressed && pressed {
                    self.start_sat();
                }
                false
            }
            KeyEventKind::KeyDown | KeyEventKind::UnmappedKeyDown => {
                if !self.sat_key_pressed.get() {
                    return false;
                }
                self.handle_key_down(key, modifiers)
            }
        }
    }

    fn handle_key_down(&self, key: KeyCode, modifiers: Modifiers) -> bool {
        match key {
            KeyCode::Tab | KeyCode::LeftArrow | KeyCode::RightArrow => {
                let backward = key == KeyCode::LeftArrow
                    || (key == KeyCode::Tab && modifiers.contains(Modifiers::SHIFT));
                self.cycle_focused_stack(backward)
            }
            KeyCode::UpArrow | KeyCode::PageUp => self.activate_group_behind(),
            KeyCode::DownArrow | KeyCode::PageDown => self.activate_next_group(),
            _ => false,
        }
    }

    /// Activate the previous/next tab within the focused stack
    fn cycle_focused_stack(&self, backward: bool) -> bool {
        let focused = match self.desktop.focused_window() {
            Some(window) => window,
            None => return false,
        };
        let sat = match self.sat_window(focused) {
            Some(sat) => sat,
            None => return false,
        };
        let area = match sat.area() {
            Some(area) => area,
            None => return false,
        };
        let count = area.window_count();
        if count < 2 {
            return false;
        }
        let index = match area.index_of(&sat) {
            Some(index) => index,
            None => return false,
        };

        let next = if backward {
            (index + count - 1) % count
        } else {
            (index + 1) % count
        };
        let target = match area.window_at(next) {
            Some(target) => target,
            None => return false,
        };

        self.with_guard(|| {
            area.move_to_top_layer(&target);
            self.desktop.activate_window(target.window());
        });
        true
    }

    /// Step the focus one group toward the back
    fn activate_group_behind(&self) -> bool {
        let (groups, index) = match self.focused_group() {
            Some(found) => found,
            None => return false,
        };
        let target = groups
            .get(index + 1)
            .or_else(|| groups.last())
            .cloned();
        match target {
            Some(target) => {
                self.activate_group(&target);
                true
            }
            None => false,
        }
    }

    /// Activate the next group and push the focused one to the back
    fn activate_next_group(&self) -> bool {
        let (groups, index) = match self.focused_group() {
            Some(found) => found,
            None => return false,
        };

        self.with_guard(|| {
            for member in groups[index].windows() {
                self.desktop.send_window_behind(member.window(), None);
            }
        });

        let target = groups.get((index + 1) % groups.len()).cloned();
        match target {
            Some(target) => {
                self.activate_group(&target);
                true
            }
            None => false,
        }
    }

    fn focused_group(&self) -> Option<(Vec<Rc<SatGroup>>, usize)> {
        let groups = self.groups_front_to_back();
        let focused = self.desktop.focused_window()?;
        let sat = self.sat_window(focused)?;
        let group = sat.group()?;
        let index = groups.iter().position(|g| Rc::ptr_eq(g, &group))?;
        Some((groups, index))
    }

    /// Raise a whole group, restoring focus to its remembered window
    fn activate_group(&self, group: &Rc<SatGroup>) {
        let target = group.active_window().or_else(|| group.window_at(0));
        let target = match target {
            Some(target) => target,
            None => return,
        };
        self.activate_window_and_group(&target);
    }

    /// Raise `sat`'s group back-to-front with `sat` activated last
    fn activate_window_and_group(&self, sat: &Rc<SatWindow>) {
        let group = match sat.group() {
            Some(group) => group,
            None => return,
        };

        self.with_guard(|| {
            for member in group.windows() {
                if !Rc::ptr_eq(&member, sat) {
                    self.desktop.activate_window(member.window());
                }
            }
            self.desktop.activate_window(sat.window());
        });
        group.set_active_window(Some(sat));
    }

    // ========================== Gestures ===========================

    /// Begin a drag: pull the window out of its group and look for
    /// merge targets
    fn start_sat(&self) {
        log::debug!("StackAndTile::start_sat");
        let current = match self.current_window.borrow().clone() {
            Some(current) => current,
            None => return,
        };
        let group = match current.group() {
            Some(group) => group,
            None => return,
        };

        self.with_guard(|| {
            let _ = group.remove_window(&current, true);
        });
        current.find_snapping_candidates(&self.groups_front_to_back());
    }

    /// End a drag: commit the winning behaviour and activate the window
    fn stop_sat(&self) {
        log::debug!("StackAndTile::stop_sat");
        let current = match self.current_window.borrow().clone() {
            Some(current) => current,
            None => return,
        };
        if self.with_guard(|| current.join_candidates()) {
            self.activate_window_and_group(&current);
        }
    }

    // ======================= Group iteration =======================

    /// Every group, ordered by its front-most window, front to back
    pub fn groups_front_to_back(&self) -> Vec<Rc<SatGroup>> {
        let mut groups: Vec<Rc<SatGroup>> = Vec::new();
        for window in self.desktop.windows_front_to_back() {
            if self.desktop.window_is_hidden(window) {
                continue;
            }
            let sat = match self.sat_window(window) {
                Some(sat) => sat,
                None => continue,
            };
            let group = match sat.group() {
                Some(group) => group,
                None => continue,
            };
            if !groups.iter().any(|g| Rc::ptr_eq(g, &group)) {
                groups.push(group);
            }
        }
        groups
    }

    // ========================== Messages ===========================

    /// Handle one decoded client request sent by `sender`
    pub fn handle_message(&self, sender: Window, request: &SatRequest) -> SatReply {
        let sender = match self.sat_window(sender) {
            Some(sender) => sender,
            None => return SatReply::BadValue,
        };
        // make sure the sender has its group structures
        let _ = sender.group();

        match request {
            SatRequest::AddWindowToStack { window, position } => {
                let area = match sender.area() {
                    Some(area) => area,
                    None => return SatReply::BadValue,
                };
                let position = if *position < 0 {
                    area.window_count() as i32 - 1
                } else {
                    *position
                };
                let parent = usize::try_from(position)
                    .ok()
                    .and_then(|index| area.window_at(index));
                let parent = match parent {
                    Some(parent) => parent,
                    None => return SatReply::BadValue,
                };
                let candidate = match self.find_sat_window(*window) {
                    Some(candidate) => candidate,
                    None => return SatReply::BadValue,
                };
                match self.with_guard(|| parent.stack_window(&candidate)) {
                    Ok(()) => SatReply::Ok,
                    Err(_) => SatReply::BadValue,
                }
            }
            SatRequest::RemoveWindowFromStack { window } => {
                let group = match sender.group() {
                    Some(group) => group,
                    None => return SatReply::BadValue,
                };
                let candidate = match self.find_sat_window(*window) {
                    Some(candidate) => candidate,
                    None => return SatReply::BadValue,
                };
                match self.with_guard(|| group.remove_window(&candidate, false)) {
                    Ok(()) => SatReply::Ok,
                    Err(_) => SatReply::BadValue,
                }
            }
            SatRequest::RemoveWindowFromStackAt { position } => {
                let (group, area) = match (sender.group(), sender.area()) {
                    (Some(group), Some(area)) => (group, area),
                    _ => return SatReply::BadValue,
                };
                let target = usize::try_from(*position)
                    .ok()
                    .and_then(|index| area.window_at(index));
                let target = match target {
                    Some(target) => target,
                    None => return SatReply::BadValue,
                };
                let id = target.id();
                match self.with_guard(|| group.remove_window(&target, false)) {
                    Ok(()) => SatReply::Window(id),
                    Err(_) => SatReply::BadValue,
                }
            }
            SatRequest::CountWindowsOnStack => match sender.area() {
                Some(area) => SatReply::Count(area.window_count() as i32),
                None => SatReply::BadValue,
            },
            SatRequest::WindowOnStackAt { position } => {
                let area = match sender.area() {
                    Some(area) => area,
                    None => return SatReply::BadValue,
                };
                usize::try_from(*position)
                    .ok()
                    .and_then(|index| area.window_at(index))
                    .map_or(SatReply::BadValue, |window| SatReply::Window(window.id()))
            }
            SatRequest::StackHasWindow { window } => {
                let area = match sender.area() {
                    Some(area) => area,
                    None => return SatReply::BadValue,
                };
                SatReply::Has(area.windows().iter().any(|w| w.id() == *window))
            }
            SatRequest::SaveAllGroups => {
                let archives = self
                    .groups_front_to_back()
                    .into_iter()
                    .filter(|group| group.window_count() > 1)
                    .map(|group| group.archive())
                    .collect();
                SatReply::Groups(archives)
            }
            SatRequest::RestoreGroup { archive } => {
                match self.with_guard(|| SatGroup::restore(archive, self)) {
                    Ok(_group) => SatReply::Ok,
                    Err(_) => SatReply::BadValue,
                }
            }
        }
    }
}

impl WindowLookup for StackAndTile {
    fn find_sat_window(&self, id: u64) -> Option<Rc<SatWindow>> {
        self.windows
            .borrow()
            .values()
            .find(|window| window.id() == id)
            .cloned()
    }
}
