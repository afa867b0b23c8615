//! Picks the rectangle a client is finally shown in.
//!
//! Precedence is fullscreen, then free, then fixed, then tiled. The chosen
//! rectangle is inset by the layout's border width and gap strategies.

use serde::{Deserialize, Serialize};

use crate::common::config::{BorderColors, Settings};
use crate::layout_engine::{ArrangerKind, Layout};
use crate::model::{Client, ClientId, WindowId};
use crate::sys::display::Color;
use crate::sys::geometry::Rect;
use crate::sys::rules::RuleTable;

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BorderWidthPolicy {
    Always,
    Never,
    /// Drop the border when it would only frame a single visible window.
    #[default]
    Smart,
    /// Only the current client gets a border.
    Focused,
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BorderGapPolicy {
    #[default]
    Always,
    Never,
    Smart,
    Focused,
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum BorderColorPolicy {
    /// Current, urgent, free, previous, normal; first that applies.
    #[default]
    All,
    /// Current or normal.
    Focused,
    None,
}

/// Everything the display needs to show one client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Placement {
    pub window: WindowId,
    pub region: Rect,
    pub border_width: i32,
    pub border_color: Color,
}

/// Workspace-wide inputs of the cascade.
pub struct ResolveContext<'a, R: RuleTable> {
    pub settings: &'a Settings,
    pub rules: &'a R,
    pub layout: &'a Layout,
    pub screen: Rect,
    /// Workspace area, gaps included.
    pub area: Rect,
    pub stack: Rect,
    pub current: Option<ClientId>,
    pub previous: Option<ClientId>,
    /// Whether any client of the workspace is fixed.
    pub has_fixed: bool,
}

impl<R: RuleTable> ResolveContext<'_, R> {
    /// Resolves `client`. Free and fixed results are written back to the
    /// tiled region so that spatial queries see what is on screen.
    pub fn resolve(&self, id: ClientId, client: &mut Client) -> Placement {
        let region = if client.is_fullscreen {
            self.area
        } else if let Some(free) =
            self.rules.free_region(client.free_policy, client.float_region, self.stack)
        {
            client.tiled_region = free;
            free
        } else if let Some(fixed) =
            self.rules.fixed_region(client.fixed_position, client.fixed_size, self.stack)
        {
            client.tiled_region = fixed;
            fixed
        } else {
            client.tiled_region
        };

        let is_current = self.current == Some(id);
        let border_width = self.border_width(client, is_current);
        let border_gap = self.border_gap(client, is_current);
        Placement {
            window: client.window(),
            region: region.inset_border(border_width, border_gap).at_least(1, 1),
            border_width,
            border_color: self.border_color(id, client),
        }
    }

    fn fills_area(&self, client: &Client) -> bool {
        client.tiled_region.same_size(&self.stack) || client.tiled_region.same_size(&self.screen)
    }

    fn border_width(&self, client: &Client, is_current: bool) -> i32 {
        if client.is_fullscreen {
            return 0;
        }
        let configured = self.settings.border_width;
        match self.layout.border_width() {
            BorderWidthPolicy::Always => configured,
            BorderWidthPolicy::Never => 0,
            BorderWidthPolicy::Focused if is_current => configured,
            BorderWidthPolicy::Focused => 0,
            BorderWidthPolicy::Smart => {
                if client.is_free()
                    || self.layout.arranger() == ArrangerKind::Float
                    || self.has_fixed
                    || !self.fills_area(client)
                {
                    configured
                } else {
                    0
                }
            }
        }
    }

    fn border_gap(&self, client: &Client, is_current: bool) -> i32 {
        if client.is_fullscreen
            || client.is_free()
            || self.layout.arranger() == ArrangerKind::Float
        {
            return 0;
        }
        let configured = self.settings.border_gap;
        match self.layout.border_gap() {
            BorderGapPolicy::Always => configured,
            BorderGapPolicy::Never => 0,
            BorderGapPolicy::Smart if self.fills_area(client) => 0,
            BorderGapPolicy::Smart => configured,
            BorderGapPolicy::Focused if is_current => configured,
            BorderGapPolicy::Focused => 0,
        }
    }

    fn border_color(&self, id: ClientId, client: &Client) -> Color {
        let BorderColors { normal, current, previous, free, urgent } = self.settings.colors;
        let is_current = self.current == Some(id);
        match self.layout.border_color() {
            BorderColorPolicy::All if is_current => current,
            BorderColorPolicy::All if client.is_urgent => urgent,
            BorderColorPolicy::All if client.is_free() => free,
            BorderColorPolicy::All if self.previous == Some(id) => previous,
            BorderColorPolicy::Focused if is_current => current,
            _ => normal,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use slotmap::SlotMap;

    use super::*;
    use crate::common::config::LayoutConf;
    use crate::model::{FixedPosition, FreePolicy};
    use crate::sys::geometry::Gaps;
    use crate::sys::rules::DefaultRules;

    struct Fixture {
        settings: Settings,
        rules: DefaultRules,
        layout: Layout,
        id: ClientId,
        other: ClientId,
    }

    impl Fixture {
        fn new(conf: LayoutConf) -> Self {
            let mut keys: SlotMap<ClientId, ()> = SlotMap::with_key();
            Self {
                settings: Settings {
                    border_width: 2,
                    border_gap: 3,
                    reserved: Gaps::default(),
                    colors: BorderColors::default(),
                },
                rules: DefaultRules::default(),
                layout: Layout::new("test", conf),
                id: keys.insert(()),
                other: keys.insert(()),
            }
        }

        fn ctx(&self, current: Option<ClientId>, has_fixed: bool) -> ResolveContext<'_, DefaultRules> {
            ResolveContext {
                settings: &self.settings,
                rules: &self.rules,
                layout: &self.layout,
                screen: Rect::new(0, 0, 1000, 600),
                area: Rect::new(0, 0, 1000, 600),
                stack: Rect::new(10, 10, 980, 580),
                current,
                previous: None,
                has_fixed,
            }
        }
    }

    fn client() -> Client {
        let mut c = Client::new(WindowId(7), Rect::new(100, 100, 200, 100));
        c.tiled_region = Rect::new(10, 10, 490, 580);
        c
    }

    #[test]
    fn precedence_fullscreen_free_fixed_tiled() {
        let f = Fixture::new(LayoutConf {
            border_width: BorderWidthPolicy::Always,
            ..Default::default()
        });
        let ctx = f.ctx(None, true);
        let mut c = client();
        c.is_fullscreen = true;
        c.free_policy = FreePolicy::Float;
        c.fixed_position = FixedPosition::Left;
        c.fixed_size = 0.5;

        let p = ctx.resolve(f.id, &mut c);
        assert_eq!(p.region, Rect::new(0, 0, 1000, 600));
        assert_eq!(p.border_width, 0);

        c.is_fullscreen = false;
        let p = ctx.resolve(f.id, &mut c);
        assert_eq!(p.region, Rect::new(100, 100, 196, 96));
        assert_eq!(c.tiled_region, Rect::new(100, 100, 200, 100));

        c.free_policy = FreePolicy::None;
        let p = ctx.resolve(f.id, &mut c);
        assert_eq!(p.region, Rect::new(13, 13, 480, 570));
        assert_eq!(c.tiled_region, Rect::new(10, 10, 490, 580));

        c.fixed_position = FixedPosition::None;
        c.tiled_region = Rect::new(500, 10, 490, 580);
        let p = ctx.resolve(f.id, &mut c);
        assert_eq!(p.region, Rect::new(503, 13, 480, 570));
    }

    #[test]
    fn smart_border_drops_for_a_lone_window() {
        let f = Fixture::new(LayoutConf::default());
        let mut c = client();
        c.tiled_region = Rect::new(10, 10, 980, 580);

        let p = f.ctx(None, false).resolve(f.id, &mut c);
        assert_eq!(p.border_width, 0);
        assert_eq!(p.region, Rect::new(13, 13, 974, 574));

        let p = f.ctx(None, true).resolve(f.id, &mut c);
        assert_eq!(p.border_width, 2);
    }

    #[test]
    fn focused_policies_follow_the_current_client() {
        let f = Fixture::new(LayoutConf {
            border_width: BorderWidthPolicy::Focused,
            border_gap: BorderGapPolicy::Focused,
            border_color: BorderColorPolicy::Focused,
            ..Default::default()
        });
        let mut c = client();

        let p = f.ctx(Some(f.id), false).resolve(f.id, &mut c);
        assert_eq!((p.border_width, p.border_color), (2, f.settings.colors.current));
        assert_eq!(p.region, Rect::new(13, 13, 480, 570));

        let p = f.ctx(Some(f.other), false).resolve(f.id, &mut c);
        assert_eq!((p.border_width, p.border_color), (0, f.settings.colors.normal));
        assert_eq!(p.region, c.tiled_region);
    }

    #[test]
    fn color_precedence() {
        let f = Fixture::new(LayoutConf::default());
        let colors = f.settings.colors;
        let mut c = client();
        c.is_urgent = true;
        c.free_policy = FreePolicy::Float;

        assert_eq!(f.ctx(Some(f.id), false).resolve(f.id, &mut c).border_color, colors.current);
        assert_eq!(f.ctx(None, false).resolve(f.id, &mut c).border_color, colors.urgent);
        c.is_urgent = false;
        assert_eq!(f.ctx(None, false).resolve(f.id, &mut c).border_color, colors.free);
        c.free_policy = FreePolicy::None;
        let mut ctx = f.ctx(None, false);
        ctx.previous = Some(f.id);
        assert_eq!(ctx.resolve(f.id, &mut c).border_color, colors.previous);
        assert_eq!(f.ctx(None, false).resolve(f.id, &mut c).border_color, colors.normal);
    }

    #[test]
    fn tiny_regions_are_clamped_to_one_pixel() {
        let f = Fixture::new(LayoutConf {
            border_width: BorderWidthPolicy::Always,
            ..Default::default()
        });
        let mut c = client();
        c.tiled_region = Rect::new(0, 0, 4, 4);
        let p = f.ctx(None, false).resolve(f.id, &mut c);
        assert_eq!((p.region.w, p.region.h), (1, 1));
    }
}
