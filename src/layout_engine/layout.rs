use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::common::config::LayoutConf;
use crate::layout_engine::{
    ArrangerKind, BorderColorPolicy, BorderGapPolicy, BorderWidthPolicy, LayoutMods,
};
use crate::sys::geometry::RelativeRect;

/// Tunables handed to an arranger for one run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LayoutParams {
    #[serde(default = "default_master_count")]
    pub master_count: u32,
    #[serde(default = "default_master_ratio")]
    pub master_ratio: f32,
    #[serde(default = "default_resize_step")]
    pub resize_step: f32,
}

impl Default for LayoutParams {
    fn default() -> Self {
        Self {
            master_count: default_master_count(),
            master_ratio: default_master_ratio(),
            resize_step: default_resize_step(),
        }
    }
}

pub(crate) fn default_master_count() -> u32 { 1 }

pub(crate) fn default_master_ratio() -> f32 { 0.5 }

pub(crate) fn default_resize_step() -> f32 { 0.03 }

/// Addresses a layout in one of a workspace's two lists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayoutSlot {
    Main(usize),
    Toggle(usize),
}

/// A configured layout together with its runtime state.
#[derive(Clone, Debug)]
pub struct Layout {
    name: String,
    conf: LayoutConf,
    pub mods: LayoutMods,
    pub follow_mouse: bool,
    pub params: LayoutParams,
}

impl Layout {
    pub fn new(name: impl Into<String>, conf: LayoutConf) -> Self {
        Self {
            name: name.into(),
            mods: conf.mods,
            follow_mouse: conf.follow_mouse,
            params: conf.params,
            conf,
        }
    }

    pub fn name(&self) -> &str { &self.name }

    pub fn arranger(&self) -> ArrangerKind { self.conf.arranger }

    pub fn region(&self) -> RelativeRect { self.conf.region }

    pub fn border_width(&self) -> BorderWidthPolicy { self.conf.border_width }

    pub fn border_gap(&self) -> BorderGapPolicy { self.conf.border_gap }

    pub fn border_color(&self) -> BorderColorPolicy { self.conf.border_color }

    pub fn toggle_mods(&mut self, mods: LayoutMods) { self.mods.toggle(mods); }

    /// Restores modifiers, follow-mouse and parameters to the configured values.
    pub fn reset(&mut self) {
        self.mods = self.conf.mods;
        self.follow_mouse = self.conf.follow_mouse;
        self.params = self.conf.params;
    }

    /// Adds `step` to the master count. Refuses to go below one.
    pub fn increase_master(&mut self, step: i32) -> bool {
        let count = i64::from(self.params.master_count) + i64::from(step);
        let Ok(count) = u32::try_from(count) else {
            debug!(layout = %self.name, count, "master count out of range");
            return false;
        };
        if count < 1 {
            debug!(layout = %self.name, "master count would drop below one");
            return false;
        }
        self.params.master_count = count;
        true
    }

    /// Moves the master ratio by `factor` resize steps. The result must stay
    /// strictly between zero and one.
    pub fn resize_master(&mut self, factor: f32) -> bool {
        let ratio = factor * self.params.resize_step + self.params.master_ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            debug!(layout = %self.name, ratio, "master ratio out of range");
            return false;
        }
        self.params.master_ratio = ratio;
        true
    }
}
