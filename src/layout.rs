//! Justified row layout
//!
//! Greedily packs tiles of mixed aspect ratio into rows. A row closes once
//! its width at the current target height reaches the container width;
//! its committed height is then solved exactly so that
//! `container_width = height * sum(aspect) + gap * (n - 1)`.
//!
//! The target height is re-rolled after every row so the grid gets uneven
//! bands, and portrait tiles pull their row's target up so they get more
//! vertical room and fewer neighbours.

use rand::Rng;

use crate::gallery::TileId;
use crate::settings::Tuning;

/// Smallest height a row may be committed at
const MIN_ROW_HEIGHT: f32 = 1.0;

/// One tile as seen by the layout engine
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutItem {
    pub tile: TileId,
    pub aspect: f32,
}

/// A closed row of tiles sharing one rendered height
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub tiles: Vec<TileId>,
    /// Sum of the aspect ratios of `tiles`
    pub aspect_sum: f32,
    /// Target height in effect when the row closed
    pub target_height: f32,
    /// Committed height applied to every tile in the row
    pub height: f32,
}

impl Row {
    /// Rendered width of the row including inter-tile gaps
    pub fn width(&self, gap: f32) -> f32 {
        self.height * self.aspect_sum + gap * self.tiles.len().saturating_sub(1) as f32
    }
}

/// Output of [`justify`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JustifiedLayout {
    pub rows: Vec<Row>,
    pub gap: f32,
}

impl JustifiedLayout {
    /// Committed height of a tile, if it was laid out
    pub fn height_of(&self, tile: TileId) -> Option<f32> {
        self.rows
            .iter()
            .find(|row| row.tiles.contains(&tile))
            .map(|row| row.height)
    }

    /// `(tile, height)` pairs in layout order
    pub fn assignments(&self) -> impl Iterator<Item = (TileId, f32)> + '_ {
        self.rows
            .iter()
            .flat_map(|row| row.tiles.iter().map(move |&tile| (tile, row.height)))
    }
}

/// Pack `items` (already in display order) into justified rows
pub fn justify(
    items: &[LayoutItem],
    container_width: f32,
    tuning: &Tuning,
    rng: &mut impl Rng,
) -> JustifiedLayout {
    let gap = tuning.gap;
    let mut layout = JustifiedLayout {
        rows: Vec::new(),
        gap,
    };

    let mut row: Vec<TileId> = Vec::new();
    let mut aspect_sum = 0.0;
    let mut target_height = tuning.initial_row_height;

    for (index, item) in items.iter().enumerate() {
        row.push(item.tile);
        aspect_sum += item.aspect;

        // Portrait tiles force the whole row much taller
        if item.aspect < tuning.portrait_threshold {
            target_height = target_height.max(tuning.portrait_row_height);
        }

        let total_gap = (row.len() - 1) as f32 * gap;
        let projected_width = target_height * aspect_sum + total_gap;
        let is_last = index == items.len() - 1;

        if projected_width >= container_width || is_last {
            let mut height = (container_width - total_gap) / aspect_sum;
            height = height.min(tuning.max_row_height);
            // Too few tiles left to fill the width: don't blow the last row up
            if is_last && height > target_height {
                height = target_height;
            }
            // Container narrower than its own gaps
            let height = height.max(MIN_ROW_HEIGHT);

            log::debug!(
                "row of {} closed at {:.1}px (target {:.1}px)",
                row.len(),
                height,
                target_height
            );

            layout.rows.push(Row {
                tiles: std::mem::take(&mut row),
                aspect_sum,
                target_height,
                height,
            });

            aspect_sum = 0.0;
            let (lo, hi) = tuning.target_height_range;
            target_height = if hi > lo { rng.random_range(lo..=hi) } else { lo };
        }
    }

    layout
}


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn arb_items() -> impl Strategy<Value = Vec<LayoutItem>> {
        prop::collection::vec(0.2f32..5.0, 1..40).prop_map(|aspects| {
            aspects
                .into_iter()
                .enumerate()
                .map(|(i, aspect)| LayoutItem {
                    tile: TileId(i as u32),
                    aspect,
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn rows_fill_container_width(
            items in arb_items(),
            width in 200.0f32..3000.0,
            seed in any::<u64>(),
        ) {
            let tuning = Tuning::default();
            let mut rng = Pcg32::seed_from_u64(seed);
            let layout = justify(&items, width, &tuning, &mut rng);
            let eps = width * 1e-4;

            let (last, full) = layout.rows.split_last().unwrap();
            for row in full {
                prop_assert!((row.width(tuning.gap) - width).abs() < eps,
                    "row width {} vs container {}", row.width(tuning.gap), width);
            }
            prop_assert!(last.width(tuning.gap) <= width + eps);
        }

        #[test]
        fn every_tile_is_placed_once_in_order(
            items in arb_items(),
            width in 200.0f32..3000.0,
            seed in any::<u64>(),
        ) {
            let mut rng = Pcg32::seed_from_u64(seed);
            let layout = justify(&items, width, &Tuning::default(), &mut rng);
            let placed: Vec<TileId> = layout.assignments().map(|(tile, _)| tile).collect();
            let expected: Vec<TileId> = items.iter().map(|item| item.tile).collect();
            prop_assert_eq!(placed, expected);
        }

        #[test]
        fn portrait_rows_aim_tall(
            items in arb_items(),
            width in 200.0f32..3000.0,
            seed in any::<u64>(),
        ) {
            let tuning = Tuning::default();
            let mut rng = Pcg32::seed_from_u64(seed);
            let layout = justify(&items, width, &tuning, &mut rng);
            for row in &layout.rows {
                prop_assert!(row.height > 0.0 && row.height <= tuning.max_row_height);
                let has_portrait = row
                    .tiles
                    .iter()
                    .any(|t| items[t.0 as usize].aspect < tuning.portrait_threshold);
                if has_portrait {
                    prop_assert!(row.target_height >= tuning.portrait_row_height);
                }
            }
        }
    }
}
