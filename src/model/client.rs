use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use crate::sys::geometry::Rect;

new_key_type! {
    /// Stable handle of a managed client inside the store arena.
    pub struct ClientId;
}

/// Longest class/name/title kept for a client, in bytes.
pub const MAX_PROPERTY_LEN: usize = 255;

/// Opaque handle of a window on the display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WindowId(pub u64);

/// Which floating placement strategy governs a client. `None` means tiled.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FreePolicy {
    #[default]
    None,
    /// Use the remembered float region as is.
    Float,
    /// Keep the float size, centered on the stack region.
    Center,
    /// A large centered rectangle covering most of the stack region.
    BigCenter,
}

/// Screen slot a client is pinned to. `None` means not fixed.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FixedPosition {
    #[default]
    None,
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone)]
pub struct Client {
    window: WindowId,
    pub workspace: usize,
    pub tiled_region: Rect,
    pub float_region: Rect,
    pub free_policy: FreePolicy,
    pub fixed_position: FixedPosition,
    /// Fraction of the stack region taken by a fixed client along its axis.
    pub fixed_size: f32,
    pub is_fullscreen: bool,
    pub is_urgent: bool,
    class: String,
    name: String,
    title: String,
}

impl Client {
    pub fn new(window: WindowId, geometry: Rect) -> Self {
        Self {
            window,
            workspace: 0,
            tiled_region: Rect::default(),
            float_region: geometry,
            free_policy: FreePolicy::None,
            fixed_position: FixedPosition::None,
            fixed_size: 0.0,
            is_fullscreen: false,
            is_urgent: false,
            class: String::new(),
            name: String::new(),
            title: String::new(),
        }
    }

    pub fn window(&self) -> WindowId { self.window }

    pub fn is_free(&self) -> bool { self.free_policy != FreePolicy::None }

    pub fn is_fixed(&self) -> bool { self.fixed_position != FixedPosition::None }

    /// Whether the client takes part in the tiling partition.
    pub fn is_tiled(&self) -> bool { !self.is_free() && !self.is_fullscreen && !self.is_fixed() }

    pub fn class(&self) -> &str { &self.class }

    pub fn name(&self) -> &str { &self.name }

    pub fn title(&self) -> &str { &self.title }

    pub fn set_class_and_name(&mut self, class: Option<&str>, name: Option<&str>) {
        self.class = bounded(class);
        self.name = bounded(name);
    }

    pub fn set_title(&mut self, title: Option<&str>) { self.title = bounded(title); }
}

fn bounded(value: Option<&str>) -> String {
    let Some(value) = value else { return String::new() };
    if value.len() <= MAX_PROPERTY_LEN {
        return value.to_string();
    }
    let mut end = MAX_PROPERTY_LEN;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    value[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_client_remembers_window_geometry_as_float_region() {
        let c = Client::new(WindowId(7), Rect::new(10, 20, 300, 200));
        assert_eq!(c.window(), WindowId(7));
        assert_eq!(c.float_region, Rect::new(10, 20, 300, 200));
        assert_eq!(c.tiled_region, Rect::default());
        assert!(c.is_tiled());
        assert_eq!(c.class(), "");
    }

    #[test]
    fn tiled_flag_follows_placement_tags() {
        let mut c = Client::new(WindowId(1), Rect::default());
        c.free_policy = FreePolicy::Center;
        assert!(c.is_free() && !c.is_tiled());
        c.free_policy = FreePolicy::None;
        c.fixed_position = FixedPosition::Up;
        assert!(c.is_fixed() && !c.is_tiled());
    }

    #[test]
    fn properties_are_bounded_and_missing_data_is_empty() {
        let mut c = Client::new(WindowId(1), Rect::default());
        let long = "é".repeat(200);
        c.set_title(Some(&long));
        assert!(c.title().len() <= MAX_PROPERTY_LEN);
        assert!(c.title().chars().all(|ch| ch == 'é'));

        c.set_class_and_name(Some("XTerm"), None);
        assert_eq!(c.class(), "XTerm");
        assert_eq!(c.name(), "");
        c.set_title(None);
        assert_eq!(c.title(), "");
    }
}
