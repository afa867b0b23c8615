//! The display connection as seen by the placement core.

use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use crate::model::WindowId;
use crate::sys::geometry::Rect;

/// A 24-bit RGB pixel value, written as `#rrggbb` in configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color(pub u32);

#[derive(Debug, Error, PartialEq, Eq)]
#[error("invalid color '{0}', expected #rrggbb")]
pub struct ColorParseError(String);

impl FromStr for Color {
    type Err = ColorParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().strip_prefix('#').ok_or_else(|| ColorParseError(s.to_string()))?;
        if hex.len() != 6 {
            return Err(ColorParseError(s.to_string()));
        }
        u32::from_str_radix(hex, 16).map(Color).map_err(|_| ColorParseError(s.to_string()))
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> { value.parse() }
}

impl From<Color> for String {
    fn from(value: Color) -> Self { format!("#{:06x}", value.0) }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PointerState {
    pub x: i32,
    pub y: i32,
    /// Top-level window under the pointer, if any.
    pub child: Option<WindowId>,
}

/// Events delivered while the pointer is grabbed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrabEvent {
    Motion { x: i32, y: i32 },
    ButtonPress,
    ButtonRelease,
    /// Synthetic: abandon the transform and restore the starting geometry.
    Cancel,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClassHint {
    pub class: String,
    pub name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextProperty {
    /// `_NET_WM_NAME`
    NetWmName,
    /// `WM_NAME`
    WmName,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DisplayError {
    #[error("pointer grab was refused")]
    GrabRefused,
    #[error("display connection closed")]
    Disconnected,
}

/// Requests the placement core makes of the windowing system.
///
/// Methods take `&self`: connections are shared between the engine and the
/// pointer grab guard, and implementations serialize requests themselves.
pub trait Display {
    fn screen_region(&self) -> Rect;

    fn move_resize(&self, window: WindowId, region: Rect);

    /// Parks a window outside the visible screen without unmapping it.
    fn move_offscreen(&self, window: WindowId);

    fn set_border(&self, window: WindowId, width: i32, color: Color);

    fn set_input_focus(&self, window: Option<WindowId>);

    fn query_pointer(&self) -> Option<PointerState>;

    /// Grabs the pointer for motion and button events.
    fn grab_pointer(&self) -> Result<(), DisplayError>;

    fn ungrab_pointer(&self);

    /// Blocks until the next grabbed event. `None` once the connection is gone.
    fn next_grab_event(&self) -> Option<GrabEvent>;

    fn class_hint(&self, window: WindowId) -> Option<ClassHint>;

    fn text_property(&self, window: WindowId, property: TextProperty) -> Option<String>;

    /// Whether the window takes part in the `WM_DELETE_WINDOW` protocol.
    fn supports_delete(&self, window: WindowId) -> bool;

    fn send_delete(&self, window: WindowId);

    fn kill_client(&self, window: WindowId);
}

/// Exclusive pointer capture, released when dropped.
pub struct PointerGrab<D: Display> {
    display: Arc<D>,
}

impl<D: Display> PointerGrab<D> {
    pub fn acquire(display: &Arc<D>) -> Result<Self, DisplayError> {
        display.grab_pointer()?;
        trace!("pointer grabbed");
        Ok(Self { display: Arc::clone(display) })
    }

    pub fn next_event(&self) -> Option<GrabEvent> { self.display.next_grab_event() }
}

impl<D: Display> Drop for PointerGrab<D> {
    fn drop(&mut self) {
        self.display.ungrab_pointer();
        trace!("pointer released");
    }
}

/// Reads the window title, preferring the EWMH name.
pub fn window_title(display: &impl Display, window: WindowId) -> Option<String> {
    display
        .text_property(window, TextProperty::NetWmName)
        .filter(|t| !t.is_empty())
        .or_else(|| display.text_property(window, TextProperty::WmName))
        .or_else(|| {
            trace!(?window, "window has no title property");
            None
        })
}
