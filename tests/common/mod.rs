//! A scripted window server standing in for the real host.
//!
//! The mock keeps every window's frame, limits and decoration state in
//! plain maps; service calls mutate them directly and never notify the
//! listener, so tests drive the controller hooks explicitly.

#![allow(dead_code)]

use stacktile::{
    Config, DecorRegion, Desktop, Extents, HighlightState, KeyCode, KeyEventKind, Modifiers,
    Point, Rect, SizeLimits, StackAndTile, Window, WindowLook, WorkspaceMask,
};
use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    rc::Rc,
};

/// Everything the mock knows about one window
#[derive(Debug, Clone)]
pub struct WindowState {
    pub frame:              Rect,
    pub limits:             SizeLimits,
    pub look:               WindowLook,
    pub workspaces:         WorkspaceMask,
    pub hidden:             bool,
    pub minimized:          bool,
    pub tab_location:       f32,
    pub stacked_mode:       bool,
    pub stacked_tab_length: f32,
    pub highlights:         HashMap<DecorRegion, HighlightState>,
}

/// Scripted desktop double
pub struct MockDesktop {
    pub windows: RefCell<HashMap<Window, WindowState>>,
    /// Front-most first
    pub z_order: RefCell<Vec<Window>>,
    pub focus:   RefCell<Option<Window>>,
    pub screen:  Cell<Rect>,
    pub pointer: Cell<Point>,

    /// Decoration added around every window; `top` is the tab height
    pub extents: Cell<Extents>,

    /// Simulate the host refusing a native stack merge
    pub refuse_stack_merge: Cell<bool>,
    /// Merged (parent, child) pairs, in call order
    pub merged_stacks:      RefCell<Vec<(Window, Window)>>,
}

impl MockDesktop {
    pub fn new() -> Rc<Self> {
        Rc::new(Self {
            windows: RefCell::new(HashMap::new()),
            z_order: RefCell::new(Vec::new()),
            focus: RefCell::new(None),
            screen: Cell::new(Rect::new(0., 0., 1920., 1080.)),
            pointer: Cell::new(Point::new(0., 0.)),
            extents: Cell::new(Extents::new(10., 0., 0., 0.)),
            refuse_stack_merge: Cell::new(false),
            merged_stacks: RefCell::new(Vec::new()),
        })
    }

    /// Register a titled window with default limits
    pub fn add_window(&self, window: Window, frame: Rect) {
        self.add_window_with(window, frame, SizeLimits::default(), WindowLook::Titled);
    }

    pub fn add_window_with(&self, window: Window, frame: Rect, limits: SizeLimits, look: WindowLook) {
        self.windows.borrow_mut().insert(window, WindowState {
            frame,
            limits,
            look,
            workspaces: 1,
            hidden: false,
            minimized: false,
            tab_location: 0.,
            stacked_mode: false,
            stacked_tab_length: 0.,
            highlights: HashMap::new(),
        });
        self.z_order.borrow_mut().insert(0, window);
        if self.focus.borrow().is_none() {
            *self.focus.borrow_mut() = Some(window);
        }
    }

    pub fn remove_window(&self, window: Window) {
        self.windows.borrow_mut().remove(&window);
        self.z_order.borrow_mut().retain(|w| *w != window);
        if *self.focus.borrow() == Some(window) {
            *self.focus.borrow_mut() = None;
        }
    }

    pub fn frame_of(&self, window: Window) -> Rect {
        self.windows.borrow()[&window].frame
    }

    pub fn limits_of(&self, window: Window) -> SizeLimits {
        self.windows.borrow()[&window].limits
    }

    pub fn state_of(&self, window: Window) -> WindowState {
        self.windows.borrow()[&window].clone()
    }

    /// Teleport a window without notifying anyone, like a user drag the
    /// test then reports through the listener hooks
    pub fn set_frame(&self, window: Window, frame: Rect) {
        self.windows.borrow_mut().get_mut(&window).unwrap().frame = frame;
    }

    pub fn set_focus(&self, window: Window) {
        *self.focus.borrow_mut() = Some(window);
    }

    pub fn set_pointer(&self, x: f32, y: f32) {
        self.pointer.set(Point::new(x, y));
    }

    pub fn highlight_of(&self, window: Window, region: DecorRegion) -> HighlightState {
        self.windows.borrow()[&window]
            .highlights
            .get(&region)
            .copied()
            .unwrap_or(HighlightState::Clear)
    }
}

impl Desktop for MockDesktop {
    fn window_frame(&self, window: Window) -> Rect {
        self.windows
            .borrow()
            .get(&window)
            .map_or_else(Rect::zeroed, |state| state.frame)
    }

    fn decor_extents(&self, _window: Window) -> Extents {
        self.extents.get()
    }

    fn tab_rect(&self, window: Window) -> Rect {
        let frame = self.frame_of(window);
        let tab_height = self.extents.get().top;
        Rect::new(frame.left, frame.top - tab_height, frame.right, frame.top)
    }

    fn size_limits(&self, window: Window) -> SizeLimits {
        self.windows
            .borrow()
            .get(&window)
            .map_or_else(SizeLimits::default, |state| state.limits)
    }

    fn window_look(&self, window: Window) -> WindowLook {
        self.windows
            .borrow()
            .get(&window)
            .map_or(WindowLook::Titled, |state| state.look)
    }

    fn on_current_workspace(&self, _window: Window) -> bool {
        true
    }

    fn current_workspace(&self) -> i32 {
        0
    }

    fn anchor_position(&self, _window: Window, _workspace: i32) -> Option<Point> {
        None
    }

    fn screen_frame(&self) -> Rect {
        self.screen.get()
    }

    fn pointer_position(&self) -> Point {
        self.pointer.get()
    }

    fn windows_front_to_back(&self) -> Vec<Window> {
        self.z_order.borrow().clone()
    }

    fn window_is_hidden(&self, window: Window) -> bool {
        self.windows
            .borrow()
            .get(&window)
            .map_or(true, |state| state.hidden || state.minimized)
    }

    fn focused_window(&self) -> Option<Window> {
        *self.focus.borrow()
    }

    fn window_tab_location(&self, window: Window) -> f32 {
        self.windows
            .borrow()
            .get(&window)
            .map_or(0., |state| state.tab_location)
    }

    fn move_window_by(&self, window: Window, dx: f32, dy: f32) {
        if let Some(state) = self.windows.borrow_mut().get_mut(&window) {
            state.frame = state.frame.offset_by(dx, dy);
        }
    }

    fn resize_window_by(&self, window: Window, dw: f32, dh: f32) {
        if let Some(state) = self.windows.borrow_mut().get_mut(&window) {
            state.frame.right += dw;
            state.frame.bottom += dh;
        }
    }

    fn activate_window(&self, window: Window) {
        let mut z_order = self.z_order.borrow_mut();
        z_order.retain(|w| *w != window);
        z_order.insert(0, window);
        *self.focus.borrow_mut() = Some(window);
    }

    fn send_window_behind(&self, window: Window, behind_of: Option<Window>) {
        let mut z_order = self.z_order.borrow_mut();
        z_order.retain(|w| *w != window);
        match behind_of.and_then(|b| z_order.iter().position(|w| *w == b)) {
            Some(index) => z_order.insert(index + 1, window),
            None => z_order.push(window),
        }
    }

    fn set_window_workspaces(&self, window: Window, workspaces: WorkspaceMask) {
        if let Some(state) = self.windows.borrow_mut().get_mut(&window) {
            state.workspaces = workspaces;
        }
    }

    fn set_size_limits(&self, window: Window, limits: SizeLimits) {
        if let Some(state) = self.windows.borrow_mut().get_mut(&window) {
            state.limits = limits;
        }
    }

    fn minimize_window(&self, window: Window, minimize: bool) {
        if let Some(state) = self.windows.borrow_mut().get_mut(&window) {
            state.minimized = minimize;
            state.hidden = minimize;
        }
    }

    fn set_window_tab_location(&self, window: Window, location: f32) {
        if let Some(state) = self.windows.borrow_mut().get_mut(&window) {
            state.tab_location = location;
        }
    }

    fn process_dirty_region(&self, _window: Window) {}

    fn set_highlight(&self, window: Window, region: DecorRegion, state: HighlightState) -> bool {
        let mut windows = self.windows.borrow_mut();
        let window_state = match windows.get_mut(&window) {
            Some(window_state) => window_state,
            None => return false,
        };
        let previous = window_state
            .highlights
            .insert(region, state)
            .unwrap_or(HighlightState::Clear);
        previous != state
    }

    fn set_stacked_mode(&self, window: Window, stacked: bool) {
        if let Some(state) = self.windows.borrow_mut().get_mut(&window) {
            state.stacked_mode = stacked;
        }
    }

    fn set_stacked_tab_length(&self, window: Window, length: f32) {
        if let Some(state) = self.windows.borrow_mut().get_mut(&window) {
            state.stacked_tab_length = length;
        }
    }

    fn merge_window_stacks(&self, parent: Window, child: Window) -> bool {
        if self.refuse_stack_merge.get() {
            return false;
        }
        self.merged_stacks.borrow_mut().push((parent, child));
        true
    }

    fn separate_window_stack(&self, window: Window) {
        self.merged_stacks
            .borrow_mut()
            .retain(|(parent, child)| *parent != window && *child != window);
    }
}

// ========================= Test helpers ============================

/// Compare two rectangles up to solver tolerance
pub fn assert_close(actual: Rect, expected: Rect) {
    let eps = 0.01;
    assert!(
        (actual.left - expected.left).abs() < eps
            && (actual.top - expected.top).abs() < eps
            && (actual.right - expected.right).abs() < eps
            && (actual.bottom - expected.bottom).abs() < eps,
        "expected {}, got {}",
        expected,
        actual
    );
}

/// A controller wired to the mock with default configuration
pub fn controller(mock: &Rc<MockDesktop>) -> Rc<StackAndTile> {
    let desktop: Rc<dyn Desktop> = Rc::clone(mock) as Rc<dyn Desktop>;
    let sat = StackAndTile::new(desktop, Config::default());
    sat.listener_registered();
    sat
}

/// Press the snapping modifier
pub fn hold_modifier(sat: &StackAndTile) {
    sat.key_pressed(
        KeyEventKind::ModifiersChanged,
        KeyCode::Other(0),
        Modifiers::OPTION,
    );
}

/// Release all modifiers
pub fn release_modifier(sat: &StackAndTile) {
    sat.key_pressed(
        KeyEventKind::ModifiersChanged,
        KeyCode::Other(0),
        Modifiers::empty(),
    );
}

/// Begin a modifier drag on `window` with the pointer over its tab
pub fn begin_drag(sat: &StackAndTile, mock: &MockDesktop, window: Window) {
    let tab = {
        let frame = mock.frame_of(window);
        Point::new((frame.left + frame.right) / 2., frame.top - 5.)
    };
    mock.set_pointer(tab.x, tab.y);
    hold_modifier(sat);
    sat.mouse_down(window, tab, 1);
}

/// Drop the dragged window, committing any candidate
pub fn end_drag(sat: &StackAndTile, window: Window) {
    let point = Point::new(0., 0.);
    sat.mouse_up(window, point);
    release_modifier(sat);
}
