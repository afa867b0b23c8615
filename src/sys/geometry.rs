use serde::{Deserialize, Serialize};

/// Integer screen rectangle, origin at the top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

/// Space kept free between a workspace area and the tiled windows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Gaps {
    #[serde(default)]
    pub top: i32,
    #[serde(default)]
    pub bottom: i32,
    #[serde(default)]
    pub left: i32,
    #[serde(default)]
    pub right: i32,
}

/// A rectangle expressed as fractions of another one.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RelativeRect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Default for RelativeRect {
    fn default() -> Self { Self::WHOLE }
}

impl RelativeRect {
    pub const WHOLE: RelativeRect = RelativeRect { x: 0.0, y: 0.0, w: 1.0, h: 1.0 };

    pub fn is_valid(&self) -> bool {
        let unit = 0.0..=1.0;
        unit.contains(&self.x)
            && unit.contains(&self.y)
            && self.w > 0.0
            && self.h > 0.0
            && self.x + self.w <= 1.0
            && self.y + self.h <= 1.0
    }
}

impl Rect {
    pub const fn new(x: i32, y: i32, w: i32, h: i32) -> Self { Self { x, y, w, h } }

    pub fn right(&self) -> i32 { self.x + self.w }

    pub fn bottom(&self) -> i32 { self.y + self.h }

    pub fn same_size(&self, other: &Rect) -> bool { self.w == other.w && self.h == other.h }

    /// Half-open containment: the right and bottom edges belong to the neighbour.
    pub fn contains_point(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    /// Swaps the axes.
    pub fn transpose(&mut self) {
        std::mem::swap(&mut self.x, &mut self.y);
        std::mem::swap(&mut self.w, &mut self.h);
    }

    pub fn transposed(mut self) -> Self {
        self.transpose();
        self
    }

    /// Mirrors horizontally about the vertical center line of `within`.
    pub fn reflect_x(&mut self, within: &Rect) {
        self.x = 2 * within.x + within.w - (self.x + self.w);
    }

    /// Mirrors vertically about the horizontal center line of `within`.
    pub fn reflect_y(&mut self, within: &Rect) {
        self.y = 2 * within.y + within.h - (self.y + self.h);
    }

    pub fn shrink_by_gaps(&self, gaps: &Gaps) -> Rect {
        Rect {
            x: self.x + gaps.left,
            y: self.y + gaps.top,
            w: (self.w - gaps.left - gaps.right).max(0),
            h: (self.h - gaps.top - gaps.bottom).max(0),
        }
    }

    /// Reserves room for a window border drawn outside the client area and a
    /// gap around it.
    pub fn inset_border(&self, border_width: i32, border_gap: i32) -> Rect {
        let total = 2 * (border_width + border_gap);
        Rect {
            x: self.x + border_gap,
            y: self.y + border_gap,
            w: self.w - total,
            h: self.h - total,
        }
    }

    pub fn at_least(&self, min_w: i32, min_h: i32) -> Rect {
        Rect {
            w: self.w.max(min_w),
            h: self.h.max(min_h),
            ..*self
        }
    }

    pub fn relative(&self, rel: &RelativeRect) -> Rect {
        let scale = |v: f32, extent: i32| (v * extent as f32) as i32;
        Rect {
            x: self.x + scale(rel.x, self.w),
            y: self.y + scale(rel.y, self.h),
            w: scale(rel.w, self.w),
            h: scale(rel.h, self.h),
        }
    }

    /// Keeps the size where possible and slides the rectangle so it lies inside `area`.
    pub fn clamped_into(&self, area: &Rect) -> Rect {
        let w = self.w.min(area.w).max(1);
        let h = self.h.min(area.h).max(1);
        let x = self.x.min(area.right() - w).max(area.x);
        let y = self.y.min(area.bottom() - h).max(area.y);
        Rect { x, y, w, h }
    }

    pub fn centered_in(&self, area: &Rect) -> Rect {
        Rect {
            x: area.x + (area.w - self.w) / 2,
            y: area.y + (area.h - self.h) / 2,
            ..*self
        }
    }
}
