//! Tile <-> body association
//!
//! Bodies never carry a reference to the tile they stand for; this map is
//! the only link, and it is kept one-to-one in both directions.

use std::collections::BTreeMap;

use super::world::BodyHandle;
use crate::gallery::TileId;

#[derive(Debug, Clone, Default)]
pub struct Binding {
    by_tile: BTreeMap<TileId, BodyHandle>,
    by_body: BTreeMap<BodyHandle, TileId>,
}

impl Binding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associate `tile` with `body`, dropping any previous pairing of either
    pub fn bind(&mut self, tile: TileId, body: BodyHandle) {
        if let Some(old_body) = self.by_tile.insert(tile, body) {
            self.by_body.remove(&old_body);
        }
        if let Some(old_tile) = self.by_body.insert(body, tile) {
            if old_tile != tile {
                self.by_tile.remove(&old_tile);
            }
        }
    }

    pub fn unbind_tile(&mut self, tile: TileId) -> Option<BodyHandle> {
        let body = self.by_tile.remove(&tile)?;
        self.by_body.remove(&body);
        Some(body)
    }

    pub fn body_of(&self, tile: TileId) -> Option<BodyHandle> {
        self.by_tile.get(&tile).copied()
    }

    pub fn tile_of(&self, body: BodyHandle) -> Option<TileId> {
        self.by_body.get(&body).copied()
    }

    /// `(tile, body)` pairs ordered by tile
    pub fn iter(&self) -> impl Iterator<Item = (TileId, BodyHandle)> + '_ {
        self.by_tile.iter().map(|(&t, &b)| (t, b))
    }

    pub fn len(&self) -> usize {
        self.by_tile.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_tile.is_empty()
    }

    pub fn clear(&mut self) {
        self.by_tile.clear();
        self.by_body.clear();
    }
}
