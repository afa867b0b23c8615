use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use regex::Regex;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::layout_engine::{
    ArrangerKind, BorderColorPolicy, BorderGapPolicy, BorderWidthPolicy, LayoutMods, LayoutParams,
};
use crate::model::{FixedPosition, FreePolicy};
use crate::sys::display::Color;
use crate::sys::geometry::{Gaps, RelativeRect};

const MAX_WORKSPACES: usize = 32;

pub fn config_file() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("neuro")
        .join("neuro.toml")
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub settings: Settings,
    pub layouts: FxHashMap<String, LayoutConf>,
    pub workspaces: Vec<WorkspaceSettings>,
    #[serde(default)]
    pub rules: Vec<RuleSettings>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default = "default_border_width")]
    pub border_width: i32,
    #[serde(default)]
    pub border_gap: i32,
    /// Screen space kept for panels; workspace areas exclude it.
    #[serde(default)]
    pub reserved: Gaps,
    #[serde(default)]
    pub colors: BorderColors,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, Clone, Copy)]
#[serde(deny_unknown_fields)]
pub struct BorderColors {
    pub normal: Color,
    pub current: Color,
    pub previous: Color,
    pub free: Color,
    pub urgent: Color,
}

impl Default for BorderColors {
    fn default() -> Self {
        Self {
            normal: Color(0x1c1c1c),
            current: Color(0xb3b3b3),
            previous: Color(0x444444),
            free: Color(0xf7a16e),
            urgent: Color(0x66ff66),
        }
    }
}

/// Static description of a layout. Runtime state lives in
/// [`crate::layout_engine::Layout`].
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct LayoutConf {
    #[serde(default)]
    pub arranger: ArrangerKind,
    #[serde(default)]
    pub border_color: BorderColorPolicy,
    #[serde(default)]
    pub border_width: BorderWidthPolicy,
    #[serde(default)]
    pub border_gap: BorderGapPolicy,
    #[serde(default)]
    pub mods: LayoutMods,
    #[serde(default = "yes")]
    pub follow_mouse: bool,
    /// Part of the stack region handed to the arranger.
    #[serde(default)]
    pub region: RelativeRect,
    #[serde(default)]
    pub params: LayoutParams,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceSettings {
    pub name: String,
    #[serde(default)]
    pub gaps: Gaps,
    pub layouts: Vec<String>,
    #[serde(default)]
    pub toggle_layouts: Vec<String>,
}

/// Placement rule for newly managed clients. Unset patterns match anything.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct RuleSettings {
    #[serde(default)]
    pub class: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub free: FreePolicy,
    #[serde(default)]
    pub fixed: FixedPosition,
    #[serde(default)]
    pub fixed_size: f32,
    #[serde(default)]
    pub fullscreen: bool,
    #[serde(default)]
    pub workspace: Option<usize>,
}

impl Default for LayoutConf {
    fn default() -> Self {
        Self {
            arranger: ArrangerKind::default(),
            border_color: BorderColorPolicy::default(),
            border_width: BorderWidthPolicy::default(),
            border_gap: BorderGapPolicy::default(),
            mods: LayoutMods::empty(),
            follow_mouse: yes(),
            region: RelativeRect::WHOLE,
            params: LayoutParams::default(),
        }
    }
}

fn yes() -> bool { true }

fn default_border_width() -> i32 { 1 }

impl Settings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.border_width < 0 {
            issues.push(format!("border_width must be non-negative, got {}", self.border_width));
        }
        if self.border_gap < 0 {
            issues.push(format!("border_gap must be non-negative, got {}", self.border_gap));
        }
        issues.extend(validate_gaps("settings.reserved", &self.reserved));

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        if self.border_width < 0 {
            self.border_width = default_border_width();
            fixes += 1;
        }
        if self.border_gap < 0 {
            self.border_gap = 0;
            fixes += 1;
        }
        fixes += fix_gaps(&mut self.reserved);

        fixes
    }
}

impl LayoutConf {
    pub fn validate(&self, name: &str) -> Vec<String> {
        let mut issues = Vec::new();

        if self.params.master_count < 1 {
            issues.push(format!("layout '{name}': master_count must be at least 1"));
        }
        let ratio = self.params.master_ratio;
        if !(ratio > 0.0 && ratio < 1.0) {
            issues.push(format!(
                "layout '{name}': master_ratio must be between 0 and 1 exclusive, got {ratio}"
            ));
        }
        if !(self.params.resize_step > 0.0 && self.params.resize_step < 1.0) {
            issues.push(format!(
                "layout '{name}': resize_step must be between 0 and 1 exclusive, got {}",
                self.params.resize_step
            ));
        }
        if !self.region.is_valid() {
            issues.push(format!("layout '{name}': region must lie within the unit square"));
        }

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;
        let defaults = LayoutParams::default();

        if self.params.master_count < 1 {
            self.params.master_count = defaults.master_count;
            fixes += 1;
        }
        if !(self.params.master_ratio > 0.0 && self.params.master_ratio < 1.0) {
            self.params.master_ratio = defaults.master_ratio;
            fixes += 1;
        }
        if !(self.params.resize_step > 0.0 && self.params.resize_step < 1.0) {
            self.params.resize_step = defaults.resize_step;
            fixes += 1;
        }
        if !self.region.is_valid() {
            self.region = RelativeRect::WHOLE;
            fixes += 1;
        }

        fixes
    }
}

impl RuleSettings {
    pub fn validate(&self, index: usize, workspace_count: usize) -> Vec<String> {
        let mut issues = Vec::new();

        for pattern in [&self.class, &self.name, &self.title].into_iter().flatten() {
            if let Err(e) = Regex::new(pattern) {
                issues.push(format!("Rule {index} has an invalid pattern '{pattern}': {e}"));
            }
        }
        if self.fixed != FixedPosition::None && !(self.fixed_size > 0.0 && self.fixed_size <= 1.0) {
            issues.push(format!(
                "Rule {index} has fixed_size {} outside (0, 1]",
                self.fixed_size
            ));
        }
        if let Some(workspace) = self.workspace {
            if workspace >= workspace_count {
                issues.push(format!(
                    "Rule {index} references workspace {workspace} but only {workspace_count} workspaces exist"
                ));
            }
        }

        issues
    }
}

fn validate_gaps(what: &str, gaps: &Gaps) -> Vec<String> {
    let mut issues = Vec::new();
    for (side, value) in
        [("top", gaps.top), ("bottom", gaps.bottom), ("left", gaps.left), ("right", gaps.right)]
    {
        if value < 0 {
            issues.push(format!("{what}.{side} must be non-negative, got {value}"));
        }
    }
    issues
}

fn fix_gaps(gaps: &mut Gaps) -> usize {
    let mut fixes = 0;
    for value in [&mut gaps.top, &mut gaps.bottom, &mut gaps.left, &mut gaps.right] {
        if *value < 0 {
            *value = 0;
            fixes += 1;
        }
    }
    fixes
}

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&buf)
    }

    pub fn default() -> Config {
        Self::parse(include_str!("../../neuro.default.toml"))
            .expect("bundled default configuration is valid")
    }

    /// Save the current config to a file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let toml_string = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, toml_string.as_bytes())?;

        Ok(())
    }

    /// Validates the entire configuration and returns a list of issues found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        issues.extend(self.settings.validate());

        let mut names: Vec<_> = self.layouts.keys().collect();
        names.sort();
        for name in names {
            issues.extend(self.layouts[name].validate(name));
        }

        if self.workspaces.is_empty() {
            issues.push("at least one workspace must be configured".to_string());
        }
        if self.workspaces.len() > MAX_WORKSPACES {
            issues.push(format!("no more than {MAX_WORKSPACES} workspaces are supported"));
        }
        for ws in &self.workspaces {
            if ws.layouts.is_empty() {
                issues.push(format!("workspace '{}' has no layouts", ws.name));
            }
            for layout in ws.layouts.iter().chain(&ws.toggle_layouts) {
                if !self.layouts.contains_key(layout) {
                    issues.push(format!(
                        "workspace '{}' references unknown layout '{layout}'",
                        ws.name
                    ));
                }
            }
            issues.extend(validate_gaps(&format!("workspace '{}' gaps", ws.name), &ws.gaps));
        }

        for (index, rule) in self.rules.iter().enumerate() {
            issues.extend(rule.validate(index, self.workspaces.len()));
        }

        issues
    }

    /// Attempts to fix configuration values automatically.
    /// Returns the number of fixes applied.
    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        fixes += self.settings.auto_fix_values();

        for layout in self.layouts.values_mut() {
            fixes += layout.auto_fix_values();
        }

        for ws in &mut self.workspaces {
            fixes += fix_gaps(&mut ws.gaps);
            let before = ws.layouts.len() + ws.toggle_layouts.len();
            ws.layouts.retain(|l| self.layouts.contains_key(l));
            ws.toggle_layouts.retain(|l| self.layouts.contains_key(l));
            fixes += before - ws.layouts.len() - ws.toggle_layouts.len();
        }

        let workspace_count = self.workspaces.len();
        for rule in &mut self.rules {
            if rule.workspace.is_some_and(|ws| ws >= workspace_count) {
                rule.workspace = None;
                fixes += 1;
            }
            if rule.fixed != FixedPosition::None && !(rule.fixed_size > 0.0 && rule.fixed_size <= 1.0)
            {
                rule.fixed = FixedPosition::None;
                fixes += 1;
            }
        }

        fixes
    }

    pub fn parse(buf: &str) -> anyhow::Result<Config> {
        let c: Config = toml::from_str(buf)?;
        if c.workspaces.is_empty() {
            bail!("configuration defines no workspaces");
        }
        for ws in &c.workspaces {
            if ws.layouts.is_empty() {
                bail!("workspace '{}' has no layouts", ws.name);
            }
            for layout in ws.layouts.iter().chain(&ws.toggle_layouts) {
                if !c.layouts.contains_key(layout) {
                    bail!("workspace '{}' references unknown layout '{layout}'", ws.name);
                }
            }
        }
        for (index, rule) in c.rules.iter().enumerate() {
            for pattern in [&rule.class, &rule.name, &rule.title].into_iter().flatten() {
                if let Err(e) = Regex::new(pattern) {
                    bail!("Could not parse pattern of rule {index}: {e}");
                }
            }
        }
        Ok(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_parses() {
        let config = Config::default();
        assert_eq!(config.workspaces.len(), 10);
        assert_eq!(config.workspaces[0].layouts, ["tile", "mirr", "grid"]);
        assert_eq!(config.layouts["mirr"].mods, LayoutMods::MIRROR);
        assert_eq!(config.layouts["float"].arranger, ArrangerKind::Float);
        assert!(!config.layouts["float"].follow_mouse);
        assert!(config.validate().is_empty(), "{:?}", config.validate());
    }

    #[test]
    fn parse_rejects_unknown_layout_reference() {
        let err = Config::parse(
            r#"
            [settings]
            [layouts.tile]
            [[workspaces]]
            name = "one"
            layouts = ["tile", "spiral"]
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("spiral"));
    }

    #[test]
    fn parse_rejects_bad_rule_pattern() {
        let err = Config::parse(
            r#"
            [settings]
            [layouts.tile]
            [[workspaces]]
            name = "one"
            layouts = ["tile"]
            [[rules]]
            class = "("
            "#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("rule 0"));
    }

    #[test]
    fn layout_fields_parse() {
        let config = Config::parse(
            r##"
            [settings]
            border_width = 3
            colors = { normal = "#000000", current = "#ffffff", previous = "#111111", free = "#222222", urgent = "#ff0000" }

            [layouts.wide]
            arranger = "grid"
            border_width = "focused"
            border_gap = "never"
            border_color = "none"
            mods = "MIRROR | REFLECT_Y"
            region = { x = 0.0, y = 0.5, w = 1.0, h = 0.5 }
            params = { master_count = 2 }

            [[workspaces]]
            name = "one"
            gaps = { top = 10 }
            layouts = ["wide"]

            [[rules]]
            class = "^Bar$"
            fixed = "up"
            fixed_size = 0.05
            "##,
        )
        .unwrap();
        let wide = &config.layouts["wide"];
        assert_eq!(wide.arranger, ArrangerKind::Grid);
        assert_eq!(wide.border_width, BorderWidthPolicy::Focused);
        assert_eq!(wide.border_gap, BorderGapPolicy::Never);
        assert_eq!(wide.border_color, BorderColorPolicy::None);
        assert_eq!(wide.mods, LayoutMods::MIRROR | LayoutMods::REFLECT_Y);
        assert_eq!(wide.params.master_count, 2);
        assert_eq!(wide.params.master_ratio, 0.5);
        assert!(wide.follow_mouse);
        assert_eq!(config.settings.colors.urgent, Color(0xff0000));
        assert_eq!(config.workspaces[0].gaps.top, 10);
        assert_eq!(config.rules[0].fixed, FixedPosition::Up);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();

        config.settings.border_width = -2;
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("border_width must be non-negative"));

        let fixes = config.auto_fix_values();
        assert_eq!(fixes, 1);
        assert_eq!(config.settings.border_width, 1);

        config.layouts.get_mut("tile").unwrap().params.master_ratio = 1.5;
        let issues = config.validate();
        assert_eq!(issues.len(), 1);
        assert!(issues[0].contains("master_ratio"));

        assert_eq!(config.auto_fix_values(), 1);
        assert_eq!(config.layouts["tile"].params.master_ratio, 0.5);
        assert!(config.validate().is_empty());

        config.rules.push(RuleSettings {
            workspace: Some(40),
            ..Default::default()
        });
        assert_eq!(config.validate().len(), 1);
        assert_eq!(config.auto_fix_values(), 1);
        assert_eq!(config.rules[0].workspace, None);
    }

    #[test]
    fn save_and_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("neuro.toml");
        let mut config = Config::default();
        config.settings.border_gap = 4;
        config.save(&path).unwrap();

        let read = Config::read(&path).unwrap();
        assert_eq!(read.settings, config.settings);
        assert_eq!(read.workspaces, config.workspaces);
        assert_eq!(read.layouts, config.layouts);
    }

    #[test]
    fn missing_file_is_reported_with_path() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::read(&dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }
}
