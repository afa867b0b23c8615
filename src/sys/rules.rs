//! Floating and fixed placement rules.

use regex::Regex;
use tracing::debug;

use crate::common::config::RuleSettings;
use crate::model::{Client, FixedPosition, FreePolicy};
use crate::sys::geometry::Rect;

/// Share of the stack region covered by [`FreePolicy::BigCenter`].
const BIG_CENTER_SHARE: f32 = 0.8;

/// Computes placement for clients that are not tiled.
pub trait RuleTable {
    /// Assigns the free policy, fixed slot and target workspace of a newly
    /// managed client.
    fn apply(&self, client: &mut Client, workspace_count: usize);

    fn free_region(&self, policy: FreePolicy, float_region: Rect, stack: Rect) -> Option<Rect>;

    fn fixed_region(&self, position: FixedPosition, size: f32, stack: Rect) -> Option<Rect>;

    /// Removes the space a fixed client reserves from a layout region.
    fn reserve_layout_region(&self, region: &mut Rect, client: &Client, stack: Rect) {
        let Some(fixed) = self.fixed_region(client.fixed_position, client.fixed_size, stack)
        else {
            return;
        };
        if !region.intersects(&fixed) {
            return;
        }
        carve(region, &fixed, client.fixed_position);
    }
}

fn carve(region: &mut Rect, fixed: &Rect, position: FixedPosition) {
    match position {
        FixedPosition::Up => {
            let cut = (fixed.bottom() - region.y).clamp(0, region.h);
            region.y += cut;
            region.h -= cut;
        }
        FixedPosition::Down => {
            let cut = (region.bottom() - fixed.y).clamp(0, region.h);
            region.h -= cut;
        }
        FixedPosition::Left => {
            let cut = (fixed.right() - region.x).clamp(0, region.w);
            region.x += cut;
            region.w -= cut;
        }
        FixedPosition::Right => {
            let cut = (region.right() - fixed.x).clamp(0, region.w);
            region.w -= cut;
        }
        FixedPosition::None => {}
    }
}

struct Rule {
    class: Option<Regex>,
    name: Option<Regex>,
    title: Option<Regex>,
    settings: RuleSettings,
}

impl Rule {
    fn matches(&self, client: &Client) -> bool {
        let test = |re: &Option<Regex>, value: &str| re.as_ref().is_none_or(|re| re.is_match(value));
        test(&self.class, client.class())
            && test(&self.name, client.name())
            && test(&self.title, client.title())
    }
}

/// Rule table backed by the `[[rules]]` configuration entries.
#[derive(Default)]
pub struct DefaultRules {
    rules: Vec<Rule>,
}

impl DefaultRules {
    pub fn new(settings: &[RuleSettings]) -> Result<Self, regex::Error> {
        let compile = |p: &Option<String>| p.as_deref().map(Regex::new).transpose();
        let rules = settings
            .iter()
            .map(|s| {
                Ok(Rule {
                    class: compile(&s.class)?,
                    name: compile(&s.name)?,
                    title: compile(&s.title)?,
                    settings: s.clone(),
                })
            })
            .collect::<Result<_, regex::Error>>()?;
        Ok(Self { rules })
    }
}

impl RuleTable for DefaultRules {
    fn apply(&self, client: &mut Client, workspace_count: usize) {
        let Some(rule) = self.rules.iter().find(|r| r.matches(client)) else { return };
        let s = &rule.settings;
        debug!(class = client.class(), free = %s.free, fixed = %s.fixed, "rule matched");
        client.free_policy = s.free;
        client.fixed_position = s.fixed;
        client.fixed_size = s.fixed_size;
        client.is_fullscreen = s.fullscreen;
        if let Some(ws) = s.workspace.filter(|ws| *ws < workspace_count) {
            client.workspace = ws;
        }
    }

    fn free_region(&self, policy: FreePolicy, float_region: Rect, stack: Rect) -> Option<Rect> {
        match policy {
            FreePolicy::None => None,
            FreePolicy::Float => Some(float_region),
            FreePolicy::Center => Some(float_region.centered_in(&stack)),
            FreePolicy::BigCenter => {
                let w = (stack.w as f32 * BIG_CENTER_SHARE) as i32;
                let h = (stack.h as f32 * BIG_CENTER_SHARE) as i32;
                Some(Rect::new(0, 0, w, h).centered_in(&stack))
            }
        }
    }

    fn fixed_region(&self, position: FixedPosition, size: f32, stack: Rect) -> Option<Rect> {
        let along = |extent: i32| (extent as f32 * size) as i32;
        match position {
            FixedPosition::None => None,
            FixedPosition::Up => Some(Rect::new(stack.x, stack.y, stack.w, along(stack.h))),
            FixedPosition::Down => {
                let h = along(stack.h);
                Some(Rect::new(stack.x, stack.bottom() - h, stack.w, h))
            }
            FixedPosition::Left => Some(Rect::new(stack.x, stack.y, along(stack.w), stack.h)),
            FixedPosition::Right => {
                let w = along(stack.w);
                Some(Rect::new(stack.right() - w, stack.y, w, stack.h))
            }
        }
    }
}
