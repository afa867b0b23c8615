use serde::{Deserialize, Serialize};

use crate::layout_engine::LayoutParams;
use crate::sys::geometry::Rect;

/// Partitioning strategy of a layout.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ArrangerKind {
    /// Master column beside a stacking column.
    #[default]
    Tall,
    Grid,
    /// Every client covers the whole region.
    Full,
    /// Clients keep their remembered float regions.
    Float,
}

/// One slot of a one-dimensional partition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Span {
    pub position: i32,
    pub size: i32,
}

/// Splits `total` into `n` contiguous spans whose sizes differ by at most one.
///
/// Sizes always sum to `total`; when it does not divide evenly the earlier
/// spans get the extra unit.
pub fn partition(n: usize, total: i32) -> Vec<Span> {
    let mut spans = Vec::with_capacity(n);
    let mut remaining = total.max(0);
    let mut position = 0;
    for i in 0..n {
        let left = (n - i) as i32;
        let size = (remaining + left - 1) / left;
        spans.push(Span { position, size });
        position += size;
        remaining -= size;
    }
    spans
}

/// Rows per column of the grid arranger, left to right.
pub fn grid_columns(n: usize) -> Vec<usize> {
    if n == 0 {
        return Vec::new();
    }
    let mut cols = 1;
    while cols * cols < n {
        cols += 1;
    }
    let rows = n / cols;
    let extra = n % cols;
    (0..cols).map(|c| rows + usize::from(c >= cols - extra)).collect()
}

impl ArrangerKind {
    /// Writes a rectangle for every member into `out`, in member order.
    pub fn arrange(self, region: Rect, params: &LayoutParams, floats: &[Rect], out: &mut [Rect]) {
        debug_assert_eq!(floats.len(), out.len());
        if out.is_empty() {
            return;
        }
        match self {
            ArrangerKind::Tall => tall(region, params, out),
            ArrangerKind::Grid => grid(region, out),
            ArrangerKind::Full => out.fill(region),
            ArrangerKind::Float => {
                for (slot, float) in out.iter_mut().zip(floats) {
                    *slot = float.clamped_into(&region);
                }
            }
        }
    }
}

fn tall(region: Rect, params: &LayoutParams, out: &mut [Rect]) {
    let n = out.len();
    let masters = n.min(params.master_count.max(1) as usize);
    let master_w = (params.master_ratio * region.w as f32) as i32;
    let (masters_out, stack_out) = out.split_at_mut(masters);

    let column_w = if stack_out.is_empty() { region.w } else { master_w };
    for (slot, row) in masters_out.iter_mut().zip(partition(masters, region.h)) {
        *slot = Rect::new(region.x, region.y + row.position, column_w, row.size);
    }

    for (slot, row) in stack_out.iter_mut().zip(partition(n - masters, region.h)) {
        *slot = Rect::new(
            region.x + master_w,
            region.y + row.position,
            region.w - master_w,
            row.size,
        );
    }
}

fn grid(region: Rect, out: &mut [Rect]) {
    let columns = grid_columns(out.len());
    let mut slots = out.iter_mut();
    for (col, rows) in partition(columns.len(), region.w).into_iter().zip(columns) {
        for (slot, row) in slots.by_ref().take(rows).zip(partition(rows, region.h)) {
            *slot = Rect::new(
                region.x + col.position,
                region.y + row.position,
                col.size,
                row.size,
            );
        }
    }
}
