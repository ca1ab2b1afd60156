//! Physics sandbox controller
//!
//! Owns the world, its boundary walls and the tile binding for the
//! lifetime of disco mode. Each tick steps the world and then syncs every
//! bound body back into its tile's transform, repairing inconsistent
//! bodies and kicking ones that got stuck in a corner on the way.

use glam::Vec2;
use rand::Rng;

use super::binding::Binding;
use super::world::{BodyDesc, BodyHandle, RigidBody, World};
use crate::gallery::{Stage, Tile, TileId};
use crate::settings::Tuning;
use crate::{jitter, jitter_vec};

/// True if `pos` lies within `margin` of any viewport edge (or outside it)
pub fn near_edge(pos: Vec2, viewport: Vec2, margin: f32) -> bool {
    pos.x < margin || pos.x > viewport.x - margin || pos.y < margin || pos.y > viewport.y - margin
}

#[derive(Debug, Clone, Default)]
pub struct Sandbox {
    world: World,
    walls: Vec<BodyHandle>,
    binding: Binding,
    viewport: Vec2,
    active: bool,
}

impl Sandbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn binding(&self) -> &Binding {
        &self.binding
    }

    pub fn walls(&self) -> &[BodyHandle] {
        &self.walls
    }

    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    pub fn body_of(&self, tile: TileId) -> Option<&RigidBody> {
        self.binding.body_of(tile).and_then(|h| self.world.body(h))
    }

    /// Test/debug access to a tile's body
    pub fn body_of_mut(&mut self, tile: TileId) -> Option<&mut RigidBody> {
        let handle = self.binding.body_of(tile)?;
        self.world.body_mut(handle)
    }

    /// Build walls around `viewport` and release `tiles` (id + element size)
    /// into the world with random positions and motion
    pub fn start(
        &mut self,
        viewport: Vec2,
        tiles: &[(TileId, Vec2)],
        tuning: &Tuning,
        rng: &mut impl Rng,
    ) {
        if self.active {
            self.stop();
        }

        self.viewport = viewport;
        self.build_walls(tuning);

        for &(tile, size) in tiles {
            let position = spawn_position(viewport, size, tuning.spawn_padding, rng);
            let desc = BodyDesc::rectangle(position, size)
                .with_angle(rng.random_range(0.0..std::f32::consts::TAU))
                .with_velocity(
                    jitter_vec(rng, 2.0 * tuning.launch_speed),
                    jitter(rng, 2.0 * tuning.launch_spin),
                );
            let handle = self.world.add_body(desc);
            self.binding.bind(tile, handle);
        }

        self.active = true;
        log::info!(
            "Sandbox started: {} bodies in {}x{}",
            self.binding.len(),
            viewport.x,
            viewport.y
        );
    }

    /// Drop every body and wall
    pub fn stop(&mut self) {
        if self.active {
            log::info!("Sandbox stopped");
        }
        self.world.clear();
        self.walls.clear();
        self.binding.clear();
        self.active = false;
    }

    /// Four thick static walls just outside the viewport, overlapping at the corners
    fn build_walls(&mut self, tuning: &Tuning) {
        for wall in self.walls.drain(..) {
            self.world.remove_body(wall);
        }

        let (w, h) = (self.viewport.x, self.viewport.y);
        let t = tuning.wall_thickness;
        let rects = [
            (Vec2::new(w / 2.0, -t / 2.0), Vec2::new(w + 2.0 * t, t)), // Top
            (Vec2::new(w / 2.0, h + t / 2.0), Vec2::new(w + 2.0 * t, t)), // Bottom
            (Vec2::new(w + t / 2.0, h / 2.0), Vec2::new(t, h + 2.0 * t)), // Right
            (Vec2::new(-t / 2.0, h / 2.0), Vec2::new(t, h + 2.0 * t)), // Left
        ];
        for (center, size) in rects {
            let wall = self.world.add_body(BodyDesc::rectangle(center, size).fixed());
            self.walls.push(wall);
        }
    }

    /// Freeze a tile's body in place
    pub fn freeze(&mut self, tile: TileId) -> bool {
        match self.binding.body_of(tile) {
            Some(handle) => self.world.set_static(handle, true),
            None => false,
        }
    }

    /// Unfreeze and wake a tile's body
    pub fn unfreeze(&mut self, tile: TileId) -> bool {
        let Some(handle) = self.binding.body_of(tile) else {
            return false;
        };
        self.world.wake(handle);
        self.world.set_static(handle, false)
    }

    /// Remove a tile's body from the world
    pub fn release(&mut self, tile: TileId) -> bool {
        match self.binding.unbind_tile(tile) {
            Some(handle) => self.world.remove_body(handle).is_some(),
            None => false,
        }
    }

    /// Give a tile's body a random velocity with components in `[-speed, speed)`
    pub fn nudge(&mut self, tile: TileId, speed: f32, rng: &mut impl Rng) {
        if let Some(body) = self.body_of_mut(tile) {
            body.sleeping = false;
            body.velocity = jitter_vec(rng, 2.0 * speed);
        }
    }

    /// Move a body that sits on an edge or origin back near the center with
    /// fresh velocity; otherwise just nudge it awake. Returns true if moved.
    pub fn rescue(&mut self, tile: TileId, tuning: &Tuning, rng: &mut impl Rng) -> bool {
        let viewport = self.viewport;
        let Some(body) = self.body_of_mut(tile) else {
            return false;
        };
        if near_edge(body.position, viewport, tuning.rescue_margin) {
            relocate(body, viewport, tuning, rng);
            true
        } else {
            body.velocity = jitter_vec(rng, 2.0 * tuning.nudge_speed);
            false
        }
    }

    /// Step the world and sync bodies into their tiles
    pub fn tick(
        &mut self,
        tiles: &[Tile],
        stage: &mut impl Stage,
        tuning: &Tuning,
        rng: &mut impl Rng,
    ) {
        if !self.active {
            return;
        }

        self.world.step();

        let viewport = self.viewport;
        let Self { world, binding, .. } = self;

        for (tile_id, handle) in binding.iter() {
            let Some(body) = world.body_mut(handle) else {
                continue;
            };
            let Some(tile) = tiles.get(tile_id.index()) else {
                log::warn!("body {:?} has no tile {:?}; skipping", handle, tile_id);
                continue;
            };
            let focused = tile.is_focused();

            // Frozen without being focused or held: something froze it and
            // lost track. Unfreeze, and rescue it if it sits at a default spot.
            if body.is_static && !focused && !tile.held {
                log::warn!("tile {:?} frozen while {:?}; unfreezing", tile_id, tile.mode);
                body.is_static = false;
                body.sleeping = false;
                if near_edge(body.position, viewport, tuning.rescue_margin) {
                    relocate(body, viewport, tuning, rng);
                }
            }

            if body.is_static {
                continue;
            }

            unstick(body, viewport, tuning, rng);

            // The focus transition owns a focused tile's transform
            if focused {
                body.stuck_frames = 0;
                continue;
            }

            stage.set_transform(tile_id, body.top_left(), body.angle);
        }
    }

    /// Rebuild walls for a new viewport and pull bodies back inside
    pub fn on_viewport_resize(&mut self, viewport: Vec2, tuning: &Tuning, rng: &mut impl Rng) {
        if !self.active {
            return;
        }

        self.viewport = viewport;
        self.build_walls(tuning);

        let pad = tuning.resize_padding;
        let Self { world, binding, .. } = self;
        for (_, handle) in binding.iter() {
            let Some(body) = world.body_mut(handle) else {
                continue;
            };
            if body.is_static {
                continue;
            }

            let mut pos = body.position;
            if pos.x < pad {
                pos.x = pad;
            }
            if pos.x > viewport.x - pad {
                pos.x = viewport.x - pad;
            }
            if pos.y < pad {
                pos.y = pad;
            }
            if pos.y > viewport.y - pad {
                pos.y = viewport.y - pad;
            }

            if pos != body.position {
                body.position = pos;
                body.sleeping = false;
                if body.speed() < tuning.min_speed {
                    body.velocity = jitter_vec(rng, 2.0 * tuning.nudge_speed);
                }
            }
        }

        log::debug!("Sandbox walls rebuilt for {}x{}", viewport.x, viewport.y);
    }
}

/// Random position that keeps a body of `size` inside the viewport at any rotation
fn spawn_position(viewport: Vec2, size: Vec2, padding: f32, rng: &mut impl Rng) -> Vec2 {
    let safe = size.length() / 2.0 + padding;
    let max = viewport - Vec2::splat(safe);
    Vec2::new(
        pick_between(rng, safe, max.x, viewport.x / 2.0),
        pick_between(rng, safe, max.y, viewport.y / 2.0),
    )
}

/// Uniform in `[lo, hi]`, or `fallback` when the range is empty
fn pick_between(rng: &mut impl Rng, lo: f32, hi: f32, fallback: f32) -> f32 {
    if lo > hi {
        fallback
    } else {
        lo + rng.random::<f32>() * (hi - lo)
    }
}

/// Teleport near the center with fresh launch velocity
fn relocate(body: &mut RigidBody, viewport: Vec2, tuning: &Tuning, rng: &mut impl Rng) {
    body.position = viewport / 2.0 + jitter_vec(rng, 2.0 * tuning.rescue_spread);
    body.velocity = jitter_vec(rng, 2.0 * tuning.launch_speed);
    body.sleeping = false;
}

/// Count slow ticks in a corner and kick the body out once it overstays
fn unstick(body: &mut RigidBody, viewport: Vec2, tuning: &Tuning, rng: &mut impl Rng) {
    let threshold = tuning.corner_threshold;
    let Vec2 { x, y } = body.position;
    let in_left = x < threshold;
    let in_right = x > viewport.x - threshold;
    let in_top = y < threshold;
    let in_bottom = y > viewport.y - threshold;
    let in_corner = (in_left || in_right) && (in_top || in_bottom);

    if !in_corner || body.speed() >= tuning.min_speed {
        body.stuck_frames = 0;
        return;
    }

    body.stuck_frames += 1;
    if body.stuck_frames <= tuning.stuck_frame_limit {
        return;
    }

    // Kick away from the occupied edges
    let (lo, hi) = tuning.kick_magnitude_range;
    let mut kick = jitter_vec(rng, 2.0 * (hi - lo));
    if in_left {
        kick.x = kick.x.abs() + lo;
    }
    if in_right {
        kick.x = -kick.x.abs() - lo;
    }
    if in_top {
        kick.y = kick.y.abs() + lo;
    }
    if in_bottom {
        kick.y = -kick.y.abs() - lo;
    }

    body.velocity = kick;
    body.angular_velocity = jitter(rng, 4.0 * tuning.launch_spin);
    body.sleeping = false;
    body.stuck_frames = 0;
    log::debug!("kicked stuck body {:?} with {:?}", body.handle, kick);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gallery::TileKind;
    use crate::platform::headless::HeadlessStage;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    const VIEWPORT: Vec2 = Vec2::new(1024.0, 768.0);

    fn floating_tiles(n: u32) -> Vec<Tile> {
        (0..n)
            .map(|i| {
                let mut tile = Tile::new(TileId(i), TileKind::Plain);
                tile.mode = crate::gallery::TileMode::Floating;
                tile
            })
            .collect()
    }

    fn started(n: u32, size: Vec2) -> (Sandbox, Vec<Tile>, Pcg32) {
        let mut rng = Pcg32::seed_from_u64(42);
        let tiles = floating_tiles(n);
        let specs: Vec<_> = tiles.iter().map(|t| (t.id, size)).collect();
        let mut sandbox = Sandbox::new();
        sandbox.start(VIEWPORT, &specs, &Tuning::default(), &mut rng);
        (sandbox, tiles, rng)
    }

    #[test]
    fn test_start_builds_walls_and_bodies() {
        let (sandbox, _, _) = started(5, Vec2::new(120.0, 80.0));
        assert!(sandbox.is_active());
        assert_eq!(sandbox.walls().len(), 4);
        assert_eq!(sandbox.binding().len(), 5);
        assert_eq!(sandbox.world().len(), 9);

        let tuning = Tuning::default();
        for i in 0..5 {
            let body = sandbox.body_of(TileId(i)).unwrap();
            let safe = Vec2::new(120.0, 80.0).length() / 2.0 + tuning.spawn_padding;
            assert!(body.position.x >= safe && body.position.x <= VIEWPORT.x - safe);
            assert!(body.position.y >= safe && body.position.y <= VIEWPORT.y - safe);
            assert!(body.velocity.x.abs() <= 4.0 && body.velocity.y.abs() <= 4.0);
            assert!(!body.is_static);
        }
    }

    #[test]
    fn test_oversized_tile_spawns_centered() {
        let (sandbox, _, _) = started(1, Vec2::new(3000.0, 100.0));
        let body = sandbox.body_of(TileId(0)).unwrap();
        assert_eq!(body.position.x, VIEWPORT.x / 2.0);
    }

    #[test]
    fn test_stop_clears_everything() {
        let (mut sandbox, _, _) = started(3, Vec2::splat(50.0));
        sandbox.stop();
        assert!(!sandbox.is_active());
        assert!(sandbox.world().is_empty());
        assert!(sandbox.binding().is_empty());
        assert!(sandbox.walls().is_empty());
    }

    #[test]
    fn test_walls_enclose_viewport() {
        let (sandbox, _, _) = started(0, Vec2::ZERO);
        for &wall in sandbox.walls() {
            let body = sandbox.world().body(wall).unwrap();
            assert!(body.is_static);
            let min = body.position - body.half_extents;
            let max = body.position + body.half_extents;
            let inside_x = min.x < VIEWPORT.x && max.x > 0.0;
            let inside_y = min.y < VIEWPORT.y && max.y > 0.0;
            assert!(!(inside_x && inside_y), "wall intrudes into the viewport");
        }
    }

    #[test]
    fn test_self_heal_unfreezes_and_rescues() {
        let (mut sandbox, tiles, mut rng) = started(1, Vec2::splat(40.0));
        let mut stage = HeadlessStage::new(VIEWPORT);
        {
            let body = sandbox.body_of_mut(TileId(0)).unwrap();
            body.is_static = true;
            body.velocity = Vec2::ZERO;
            body.position = Vec2::ZERO;
        }

        sandbox.tick(&tiles, &mut stage, &Tuning::default(), &mut rng);

        let body = sandbox.body_of(TileId(0)).unwrap();
        assert!(!body.is_static);
        assert!(body.position.abs_diff_eq(VIEWPORT / 2.0, 50.0 + 1e-3));
        assert!(body.speed() > 0.0);
        assert!(stage.transform(TileId(0)).is_some());
    }

    #[test]
    fn test_focused_body_is_left_alone() {
        let (mut sandbox, mut tiles, mut rng) = started(1, Vec2::splat(40.0));
        let mut stage = HeadlessStage::new(VIEWPORT);
        tiles[0].mode = crate::gallery::TileMode::Focused;
        sandbox.freeze(TileId(0));
        let before = sandbox.body_of(TileId(0)).unwrap().position;

        sandbox.tick(&tiles, &mut stage, &Tuning::default(), &mut rng);

        let body = sandbox.body_of(TileId(0)).unwrap();
        assert!(body.is_static);
        assert_eq!(body.position, before);
        assert!(stage.transform(TileId(0)).is_none());
    }

    #[test]
    fn test_held_control_stays_frozen() {
        let (mut sandbox, mut tiles, mut rng) = started(1, Vec2::splat(40.0));
        let mut stage = HeadlessStage::new(VIEWPORT);
        tiles[0].held = true;
        sandbox.freeze(TileId(0));
        sandbox.tick(&tiles, &mut stage, &Tuning::default(), &mut rng);
        assert!(sandbox.body_of(TileId(0)).unwrap().is_static);
    }

    #[test]
    fn test_cornered_slow_body_gets_kicked() {
        let (mut sandbox, tiles, mut rng) = started(1, Vec2::splat(20.0));
        let mut stage = HeadlessStage::new(VIEWPORT);
        let tuning = Tuning::default();
        {
            let body = sandbox.body_of_mut(TileId(0)).unwrap();
            body.position = Vec2::new(20.0, 700.0);
            body.velocity = Vec2::new(0.1, 0.0);
            body.angular_velocity = 0.0;
            body.angle = 0.0;
        }

        for _ in 0..30 {
            sandbox.tick(&tiles, &mut stage, &tuning, &mut rng);
        }
        let body = sandbox.body_of(TileId(0)).unwrap();
        assert_eq!(body.stuck_frames, 30);
        assert!(body.speed() < tuning.min_speed);

        sandbox.tick(&tiles, &mut stage, &tuning, &mut rng);
        let body = sandbox.body_of(TileId(0)).unwrap();
        assert_eq!(body.stuck_frames, 0);
        assert!(body.speed() >= 3.0);
        assert!(body.velocity.x > 0.0, "kicked away from the left edge");
        assert!(body.velocity.y < 0.0, "kicked away from the bottom edge");
    }

    #[test]
    fn test_moving_resets_stuck_counter() {
        let (mut sandbox, tiles, mut rng) = started(1, Vec2::splat(20.0));
        let mut stage = HeadlessStage::new(VIEWPORT);
        {
            let body = sandbox.body_of_mut(TileId(0)).unwrap();
            body.position = Vec2::new(30.0, 30.0);
            body.velocity = Vec2::ZERO;
            body.angular_velocity = 0.0;
        }
        for _ in 0..10 {
            sandbox.tick(&tiles, &mut stage, &Tuning::default(), &mut rng);
        }
        assert_eq!(sandbox.body_of(TileId(0)).unwrap().stuck_frames, 10);

        sandbox.body_of_mut(TileId(0)).unwrap().velocity = Vec2::new(2.0, 2.0);
        sandbox.tick(&tiles, &mut stage, &Tuning::default(), &mut rng);
        assert_eq!(sandbox.body_of(TileId(0)).unwrap().stuck_frames, 0);
    }

    #[test]
    fn test_sync_writes_top_left() {
        let (mut sandbox, tiles, mut rng) = started(1, Vec2::new(100.0, 60.0));
        let mut stage = HeadlessStage::new(VIEWPORT);
        {
            let body = sandbox.body_of_mut(TileId(0)).unwrap();
            body.position = Vec2::new(500.0, 400.0);
            body.velocity = Vec2::new(1.0, 0.0);
            body.angular_velocity = 0.0;
            body.angle = 0.5;
        }
        sandbox.tick(&tiles, &mut stage, &Tuning::default(), &mut rng);
        let (top_left, angle) = stage.transform(TileId(0)).unwrap();
        assert!(top_left.abs_diff_eq(Vec2::new(451.0, 370.0), 1e-3));
        assert!((angle - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_resize_pulls_bodies_inside() {
        let (mut sandbox, _, mut rng) = started(1, Vec2::splat(20.0));
        let tuning = Tuning::default();
        {
            let body = sandbox.body_of_mut(TileId(0)).unwrap();
            body.position = Vec2::new(1000.0, 700.0);
            body.velocity = Vec2::ZERO;
        }

        let smaller = Vec2::new(600.0, 400.0);
        sandbox.on_viewport_resize(smaller, &tuning, &mut rng);

        let body = sandbox.body_of(TileId(0)).unwrap();
        assert_eq!(body.position, Vec2::new(550.0, 350.0));
        assert!(body.speed() > 0.0);
        assert_eq!(sandbox.walls().len(), 4);
        assert_eq!(sandbox.world().len(), 5);
        assert_eq!(sandbox.viewport(), smaller);
    }

    #[test]
    fn test_rescue_relocates_edge_body() {
        let (mut sandbox, _, mut rng) = started(1, Vec2::splat(20.0));
        let tuning = Tuning::default();
        {
            let body = sandbox.body_of_mut(TileId(0)).unwrap();
            body.position = Vec2::new(10.0, 400.0);
            body.velocity = Vec2::ZERO;
        }

        assert!(sandbox.rescue(TileId(0), &tuning, &mut rng));

        let body = sandbox.body_of(TileId(0)).unwrap();
        assert!(body.position.abs_diff_eq(VIEWPORT / 2.0, tuning.rescue_spread + 1e-3));
        assert!(body.velocity.x.abs() <= tuning.launch_speed);
        assert!(body.velocity.y.abs() <= tuning.launch_speed);
        assert!(body.speed() > 0.0);
    }

    #[test]
    fn test_rescue_only_nudges_central_body() {
        let (mut sandbox, _, mut rng) = started(1, Vec2::splat(20.0));
        let tuning = Tuning::default();
        let center = Vec2::new(400.0, 300.0);
        {
            let body = sandbox.body_of_mut(TileId(0)).unwrap();
            body.position = center;
            body.velocity = Vec2::ZERO;
        }

        assert!(!sandbox.rescue(TileId(0), &tuning, &mut rng));

        let body = sandbox.body_of(TileId(0)).unwrap();
        assert_eq!(body.position, center);
        assert!(body.velocity.x.abs() <= tuning.nudge_speed);
        assert!(body.velocity.y.abs() <= tuning.nudge_speed);
        assert!(body.speed() > 0.0);
        assert!(!sandbox.rescue(TileId(9), &tuning, &mut rng), "unbound tile");
    }

    #[test]
    fn test_release_removes_body() {
        let (mut sandbox, _, _) = started(2, Vec2::splat(20.0));
        assert!(sandbox.release(TileId(1)));
        assert!(!sandbox.release(TileId(1)));
        assert!(sandbox.body_of(TileId(1)).is_none());
        assert_eq!(sandbox.world().len(), 5);
    }
}
