//! Composition planning for resolved sequences
//!
//! Decides canvas size, scale and tile offsets. Decoding, pasting and
//! encoding the actual images is left to the renderer.

use crate::completion::Placement;
use crate::item::ItemId;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Width of one item image in pixels
pub const TILE_WIDTH: u32 = 72;
/// Height of one item image in pixels
pub const TILE_HEIGHT: u32 = 24;

const MAX_TILES: usize = 100;
const MAX_SCALE: u32 = 25;
const SCROLL_SCALE: u32 = 10;
const MAX_SCROLL_ITEMS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Layout {
    /// Side by side
    Merge,
    /// On top of each other
    Stack,
    /// Row-major grid
    Grid { columns: u32, rows: u32 },
    /// Horizontally scrolling loop
    Scroll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TilePlacement {
    pub id: ItemId,
    /// Unscaled offset in pixels
    pub x: u32,
    pub y: u32,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
}

/// Everything a renderer needs to draw a layout
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompositionPlan {
    pub layout: Layout,
    /// Unscaled canvas size
    pub canvas_width: u32,
    pub canvas_height: u32,
    /// Nearest-neighbor upscale factor applied to the canvas
    pub scale: u32,
    pub tiles: Vec<TilePlacement>,
    /// Frames of a scroll animation (one per pixel column), 0 otherwise
    pub frame_count: u32,
}

/// Upscale factor for `n` tiles: `min(25, floor(50 / sqrt(n)))`
pub fn scale_for(n: usize) -> u32 {
    if n == 0 {
        return MAX_SCALE;
    }
    let scale = (50.0 / (n as f64).sqrt()).floor() as u32;
    scale.min(MAX_SCALE)
}

impl Layout {
    /// Check the tile count this layout accepts
    pub fn validate(&self, n: usize) -> Result<()> {
        match *self {
            Layout::Merge | Layout::Stack => {
                if !(2..=MAX_TILES).contains(&n) {
                    return Err(Error::InvalidLayout(format!(
                        "between 2 and {} items can be combined, got {}",
                        MAX_TILES, n
                    )));
                }
            }
            Layout::Grid { columns, rows } => {
                let cells = columns as usize * rows as usize;
                if cells == 0 || cells > MAX_TILES {
                    return Err(Error::InvalidLayout(format!(
                        "a grid holds between 1 and {} items, got {}x{}",
                        MAX_TILES, columns, rows
                    )));
                }
                if cells != n {
                    return Err(Error::InvalidLayout(format!(
                        "expected {} items but got {}",
                        cells, n
                    )));
                }
            }
            Layout::Scroll => {
                if !(2..=MAX_SCROLL_ITEMS).contains(&n) {
                    return Err(Error::InvalidLayout(format!(
                        "between 2 and {} items can be scrolled, got {}",
                        MAX_SCROLL_ITEMS, n
                    )));
                }
            }
        }
        Ok(())
    }

    /// Plan the composition of `placements`
    pub fn plan(&self, placements: &[Placement]) -> Result<CompositionPlan> {
        let n = placements.len();
        self.validate(n)?;

        let tile = |p: &Placement, col: u32, row: u32| TilePlacement {
            id: p.id,
            x: col * TILE_WIDTH,
            y: row * TILE_HEIGHT,
            flip_horizontal: p.flip_horizontal,
            flip_vertical: p.flip_vertical,
        };

        let plan = match *self {
            Layout::Merge => CompositionPlan {
                layout: *self,
                canvas_width: TILE_WIDTH * n as u32,
                canvas_height: TILE_HEIGHT,
                scale: scale_for(n),
                tiles: placements
                    .iter()
                    .enumerate()
                    .map(|(i, p)| tile(p, i as u32, 0))
                    .collect(),
                frame_count: 0,
            },
            Layout::Stack => CompositionPlan {
                layout: *self,
                canvas_width: TILE_WIDTH,
                canvas_height: TILE_HEIGHT * n as u32,
                scale: scale_for(n),
                tiles: placements
                    .iter()
                    .enumerate()
                    .map(|(i, p)| tile(p, 0, i as u32))
                    .collect(),
                frame_count: 0,
            },
            Layout::Grid { columns, rows } => CompositionPlan {
                layout: *self,
                canvas_width: TILE_WIDTH * columns,
                canvas_height: TILE_HEIGHT * rows,
                scale: scale_for(n),
                tiles: placements
                    .iter()
                    .enumerate()
                    .map(|(i, p)| tile(p, i as u32 % columns, i as u32 / columns))
                    .collect(),
                frame_count: 0,
            },
            Layout::Scroll => {
                // The first item repeats at the end so the strip loops.
                let strip: Vec<TilePlacement> = placements
                    .iter()
                    .chain(placements.first())
                    .enumerate()
                    .map(|(i, p)| tile(p, i as u32, 0))
                    .collect();
                CompositionPlan {
                    layout: *self,
                    canvas_width: TILE_WIDTH * strip.len() as u32,
                    canvas_height: TILE_HEIGHT,
                    scale: SCROLL_SCALE,
                    tiles: strip,
                    frame_count: TILE_WIDTH * n as u32,
                }
            }
        };
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placements(ids: &[ItemId]) -> Vec<Placement> {
        ids.iter().map(|&id| Placement::new(id, false)).collect()
    }

    #[test]
    fn test_scale_for() {
        assert_eq!(scale_for(2), 25);
        assert_eq!(scale_for(4), 25);
        assert_eq!(scale_for(9), 16);
        assert_eq!(scale_for(100), 5);
    }

    #[test]
    fn test_merge_plan() {
        let plan = Layout::Merge.plan(&placements(&[3, 1, 2])).unwrap();
        assert_eq!(plan.canvas_width, 216);
        assert_eq!(plan.canvas_height, 24);
        let xs: Vec<u32> = plan.tiles.iter().map(|t| t.x).collect();
        assert_eq!(xs, vec![0, 72, 144]);
    }

    #[test]
    fn test_stack_plan() {
        let plan = Layout::Stack.plan(&placements(&[3, 1])).unwrap();
        assert_eq!((plan.canvas_width, plan.canvas_height), (72, 48));
        assert_eq!(plan.tiles[1].y, 24);
    }

    #[test]
    fn test_grid_plan() {
        let layout = Layout::Grid { columns: 3, rows: 2 };
        let plan = layout.plan(&placements(&[1, 2, 3, 4, 5, 6])).unwrap();
        assert_eq!((plan.canvas_width, plan.canvas_height), (216, 48));
        assert_eq!((plan.tiles[4].x, plan.tiles[4].y), (72, 24));
        assert_eq!(plan.scale, 20);
    }

    #[test]
    fn test_grid_count_mismatch() {
        let layout = Layout::Grid { columns: 2, rows: 2 };
        assert!(matches!(
            layout.plan(&placements(&[1, 2, 3])),
            Err(Error::InvalidLayout(_))
        ));
        let empty = Layout::Grid { columns: 0, rows: 5 };
        assert!(matches!(empty.validate(0), Err(Error::InvalidLayout(_))));
    }

    #[test]
    fn test_scroll_loops() {
        let plan = Layout::Scroll.plan(&placements(&[4, 9])).unwrap();
        let ids: Vec<ItemId> = plan.tiles.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![4, 9, 4]);
        assert_eq!(plan.frame_count, 144);
        assert_eq!(plan.scale, 10);
        assert!(Layout::Scroll.validate(5).is_err());
    }

    #[test]
    fn test_merge_limits() {
        assert!(Layout::Merge.validate(1).is_err());
        assert!(Layout::Merge.validate(100).is_ok());
        assert!(Layout::Stack.validate(101).is_err());
    }
}
