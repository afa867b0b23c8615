use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::layout_engine::{ArrangerKind, LayoutParams};
use crate::sys::geometry::Rect;

bitflags! {
    /// Geometric transforms applied on top of an arranger.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct LayoutMods: u8 {
        /// Run the arranger with the axes swapped.
        const MIRROR = 1 << 0;
        const REFLECT_X = 1 << 1;
        const REFLECT_Y = 1 << 2;
    }
}

/// Runs `arranger` over `region` and applies `mods` to the result.
///
/// Order is fixed: mirror wraps the arranger itself, then reflect-x, then
/// reflect-y operate on the finished rectangles.
pub fn arrange_with_mods(
    arranger: ArrangerKind,
    mods: LayoutMods,
    region: &mut Rect,
    params: &LayoutParams,
    floats: &[Rect],
    out: &mut [Rect],
) {
    if mods.contains(LayoutMods::MIRROR) {
        mirror(arranger, region, params, floats, out);
    } else {
        arranger.arrange(*region, params, floats, out);
    }
    if mods.contains(LayoutMods::REFLECT_X) {
        reflect_x(region, out);
    }
    if mods.contains(LayoutMods::REFLECT_Y) {
        reflect_y(region, out);
    }
}

fn mirror(
    arranger: ArrangerKind,
    region: &mut Rect,
    params: &LayoutParams,
    floats: &[Rect],
    out: &mut [Rect],
) {
    region.transpose();
    let floats: Vec<Rect> = floats.iter().map(|f| f.transposed()).collect();
    arranger.arrange(*region, params, &floats, out);
    out.iter_mut().for_each(Rect::transpose);
    region.transpose();
}

pub fn reflect_x(region: &Rect, out: &mut [Rect]) {
    for r in out {
        r.reflect_x(region);
    }
}

pub fn reflect_y(region: &Rect, out: &mut [Rect]) {
    for r in out {
        r.reflect_y(region);
    }
}
