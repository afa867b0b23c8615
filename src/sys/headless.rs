//! A display that keeps window state in memory.
//!
//! Used by the preview binary and by tests. Pointer grabs consume a scripted
//! event queue; an empty queue behaves like a closed connection.

use parking_lot::Mutex;
use serde::Serialize;

use crate::common::collections::{HashMap, VecDeque};
use crate::model::WindowId;
use crate::sys::display::{
    ClassHint, Color, Display, DisplayError, GrabEvent, PointerState, TextProperty,
};
use crate::sys::geometry::Rect;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct WindowState {
    pub region: Rect,
    pub border_width: i32,
    pub border_color: Option<Color>,
    pub offscreen: bool,
    pub killed: bool,
    pub delete_requested: bool,
}

#[derive(Default)]
struct Properties {
    class_hint: Option<ClassHint>,
    net_wm_name: Option<String>,
    wm_name: Option<String>,
    supports_delete: bool,
}

#[derive(Default)]
struct State {
    windows: HashMap<WindowId, WindowState>,
    properties: HashMap<WindowId, Properties>,
    pointer: PointerState,
    grab_events: VecDeque<GrabEvent>,
    grabbed: bool,
    refuse_grabs: bool,
    disconnected: bool,
    ungrab_count: usize,
    focus: Option<WindowId>,
}

pub struct HeadlessDisplay {
    screen: Rect,
    state: Mutex<State>,
}

impl HeadlessDisplay {
    pub fn new(screen: Rect) -> Self {
        Self {
            screen,
            state: Mutex::new(State::default()),
        }
    }

    pub fn window(&self, window: WindowId) -> Option<WindowState> {
        self.state.lock().windows.get(&window).copied()
    }

    pub fn set_class_hint(&self, window: WindowId, class: &str, name: &str) {
        self.state.lock().properties.entry(window).or_default().class_hint = Some(ClassHint {
            class: class.to_string(),
            name: name.to_string(),
        });
    }

    pub fn set_text_property(&self, window: WindowId, property: TextProperty, value: &str) {
        let mut state = self.state.lock();
        let props = state.properties.entry(window).or_default();
        match property {
            TextProperty::NetWmName => props.net_wm_name = Some(value.to_string()),
            TextProperty::WmName => props.wm_name = Some(value.to_string()),
        }
    }

    pub fn set_supports_delete(&self, window: WindowId, supported: bool) {
        self.state.lock().properties.entry(window).or_default().supports_delete = supported;
    }

    pub fn set_pointer(&self, x: i32, y: i32, child: Option<WindowId>) {
        self.state.lock().pointer = PointerState { x, y, child };
    }

    pub fn push_grab_events(&self, events: impl IntoIterator<Item = GrabEvent>) {
        self.state.lock().grab_events.extend(events);
    }

    pub fn refuse_grabs(&self, refuse: bool) { self.state.lock().refuse_grabs = refuse; }

    pub fn disconnect(&self) { self.state.lock().disconnected = true; }

    pub fn is_grabbed(&self) -> bool { self.state.lock().grabbed }

    pub fn ungrab_count(&self) -> usize { self.state.lock().ungrab_count }

    pub fn focused(&self) -> Option<WindowId> { self.state.lock().focus }
}

impl Display for HeadlessDisplay {
    fn screen_region(&self) -> Rect { self.screen }

    fn move_resize(&self, window: WindowId, region: Rect) {
        let mut state = self.state.lock();
        let w = state.windows.entry(window).or_default();
        w.region = region;
        w.offscreen = false;
    }

    fn move_offscreen(&self, window: WindowId) {
        let screen = self.screen;
        let mut state = self.state.lock();
        let w = state.windows.entry(window).or_default();
        w.region.x = screen.right() + 1;
        w.region.y = screen.bottom() + 1;
        w.offscreen = true;
    }

    fn set_border(&self, window: WindowId, width: i32, color: Color) {
        let mut state = self.state.lock();
        let w = state.windows.entry(window).or_default();
        w.border_width = width;
        w.border_color = Some(color);
    }

    fn set_input_focus(&self, window: Option<WindowId>) { self.state.lock().focus = window; }

    fn query_pointer(&self) -> Option<PointerState> {
        let state = self.state.lock();
        (!state.disconnected).then_some(state.pointer)
    }

    fn grab_pointer(&self) -> Result<(), DisplayError> {
        let mut state = self.state.lock();
        if state.disconnected {
            return Err(DisplayError::Disconnected);
        }
        if state.refuse_grabs || state.grabbed {
            return Err(DisplayError::GrabRefused);
        }
        state.grabbed = true;
        Ok(())
    }

    fn ungrab_pointer(&self) {
        let mut state = self.state.lock();
        state.grabbed = false;
        state.ungrab_count += 1;
    }

    fn next_grab_event(&self) -> Option<GrabEvent> {
        let mut state = self.state.lock();
        let event = state.grab_events.pop_front()?;
        if let GrabEvent::Motion { x, y } = event {
            state.pointer.x = x;
            state.pointer.y = y;
        }
        Some(event)
    }

    fn class_hint(&self, window: WindowId) -> Option<ClassHint> {
        self.state.lock().properties.get(&window).and_then(|p| p.class_hint.clone())
    }

    fn text_property(&self, window: WindowId, property: TextProperty) -> Option<String> {
        let state = self.state.lock();
        let props = state.properties.get(&window)?;
        match property {
            TextProperty::NetWmName => props.net_wm_name.clone(),
            TextProperty::WmName => props.wm_name.clone(),
        }
    }

    fn supports_delete(&self, window: WindowId) -> bool {
        self.state.lock().properties.get(&window).is_some_and(|p| p.supports_delete)
    }

    fn send_delete(&self, window: WindowId) {
        self.state.lock().windows.entry(window).or_default().delete_requested = true;
    }

    fn kill_client(&self, window: WindowId) {
        self.state.lock().windows.entry(window).or_default().killed = true;
    }
}
