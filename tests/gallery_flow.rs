//! End-to-end mode transitions against the headless stage

use disco_gallery::consts::{CONGRATS_MESSAGE, DISCO_COLORS, FINALE_MESSAGE};
use disco_gallery::platform::headless::HeadlessStage;
use disco_gallery::{
    DisplayMode, Gallery, Settings, Stage, TileId, TileKind, TileMode, ToggleOutcome,
};
use glam::Vec2;

const VIEWPORT: Vec2 = Vec2::new(1440.0, 900.0);

struct Fixture {
    gallery: Gallery<HeadlessStage>,
    items: Vec<TileId>,
    controls: Vec<TileId>,
}

fn fixture(seed: u64) -> Fixture {
    let mut gallery = Gallery::new(HeadlessStage::new(VIEWPORT), Settings::default(), seed);
    let mut items = Vec::new();
    for i in 0..8 {
        let kind = match i % 4 {
            0 => TileKind::Media {
                video_src: Some(format!("films/{i}.mp4")),
            },
            1 => TileKind::Essay {
                path: format!("essays/{i}.txt"),
            },
            _ => TileKind::Media { video_src: None },
        };
        let id = gallery.add_tile(kind);
        let (w, h) = if i % 3 == 0 { (600.0, 900.0) } else { (1200.0, 800.0) };
        gallery.set_natural_size(id, w, h);
        items.push(id);
    }
    let controls = (0..3).map(|_| gallery.add_tile(TileKind::Control)).collect();
    gallery.enter_grid_mode();
    Fixture {
        gallery,
        items,
        controls,
    }
}

fn assert_one_body_per_visible_tile(gallery: &Gallery<HeadlessStage>) {
    let sandbox = gallery.sandbox();
    let visible = gallery.tiles().iter().filter(|t| t.visible).count();
    assert_eq!(sandbox.binding().len(), visible);
    for tile in gallery.tiles() {
        let body = sandbox.binding().body_of(tile.id);
        if tile.visible {
            let handle = body.expect("visible tile without a body");
            assert!(sandbox.world().contains(handle));
            assert_eq!(sandbox.binding().tile_of(handle), Some(tile.id));
        } else {
            assert!(body.is_none(), "hidden tile {:?} kept a body", tile.id);
        }
    }
}

#[test]
fn grid_layout_fills_the_container() {
    let f = fixture(1);
    let layout = f.gallery.layout();
    let width = f.gallery.stage().container_width();
    let gap = layout.gap;
    for row in &layout.rows[..layout.rows.len() - 1] {
        let filled = row.width(gap);
        assert!((filled - width).abs() < 1.0, "row {filled} vs {width}");
    }
    let laid_out: usize = layout.rows.iter().map(|r| r.tiles.len()).sum();
    assert_eq!(laid_out, f.items.len());
}

#[test]
fn entering_grid_twice_restores_the_same_tile_state() {
    let mut f = fixture(2);
    f.gallery.lose_form();
    f.gallery.focus(f.items[2]);
    f.gallery.close_all();
    f.gallery.dismiss(f.controls[0]);

    f.gallery.enter_grid_mode();
    let first: Vec<_> = f
        .gallery
        .tiles()
        .iter()
        .map(|t| (t.mode, t.visible, t.held))
        .collect();
    f.gallery.enter_grid_mode();
    let second: Vec<_> = f
        .gallery
        .tiles()
        .iter()
        .map(|t| (t.mode, t.visible, t.held))
        .collect();

    assert_eq!(first, second);
    assert!(first.iter().all(|&(mode, visible, held)| mode == TileMode::Grid && visible && !held));
    assert!(!f.gallery.sandbox().is_active());
    assert!(f.gallery.sandbox().world().is_empty());
    for tile in f.gallery.tiles() {
        assert!(!f.gallery.stage().is_hidden(tile.id));
        assert!(!f.gallery.stage().is_floating(tile.id));
    }
}

#[test]
fn disco_keeps_one_body_per_visible_tile() {
    let mut f = fixture(3);
    f.gallery.lose_form();
    assert_one_body_per_visible_tile(&f.gallery);

    for _ in 0..120 {
        f.gallery.advance(1.0 / 60.0);
    }
    f.gallery.focus(f.items[0]);
    assert_one_body_per_visible_tile(&f.gallery);
    f.gallery.close_all();
    assert_one_body_per_visible_tile(&f.gallery);
    f.gallery.dismiss(f.controls[1]);
    assert_one_body_per_visible_tile(&f.gallery);
}

#[test]
fn bodies_stay_inside_the_walls() {
    let mut f = fixture(4);
    f.gallery.lose_form();
    for _ in 0..600 {
        f.gallery.advance(1.0 / 60.0);
    }
    for tile in f.gallery.tiles() {
        let body = f.gallery.sandbox().body_of(tile.id).unwrap();
        assert!(body.position.x > -10.0 && body.position.x < VIEWPORT.x + 10.0);
        assert!(body.position.y > -10.0 && body.position.y < VIEWPORT.y + 10.0);
    }
}

#[test]
fn at_most_one_tile_is_focused() {
    let mut f = fixture(5);
    for &id in &f.items {
        f.gallery.focus(id);
        let focused = f.gallery.tiles().iter().filter(|t| t.is_focused()).count();
        assert_eq!(focused, 1);
        assert_eq!(f.gallery.focused(), Some(id));
    }
}

#[test]
fn focusing_a_focused_tile_closes_it() {
    let mut f = fixture(6);
    let id = f.items[3];
    f.gallery.focus(id);
    f.gallery.focus(id);
    assert_eq!(f.gallery.focused(), None);
    assert_eq!(f.gallery.tile(id).unwrap().mode, TileMode::Grid);
    assert!(!f.gallery.stage().overlay());
}

#[test]
fn stray_frozen_body_heals_on_the_next_tick() {
    let mut f = fixture(7);
    f.gallery.lose_form();
    let id = f.items[4];
    {
        let body = f.gallery.sandbox_mut().body_of_mut(id).unwrap();
        body.is_static = true;
        body.velocity = Vec2::ZERO;
        body.position = Vec2::ZERO;
    }
    f.gallery.tick();
    let body = f.gallery.sandbox().body_of(id).unwrap();
    assert!(!body.is_static);
    assert!(body.position.abs_diff_eq(VIEWPORT / 2.0, 50.0 + 1e-3));
}

#[test]
fn clearing_the_board_sets_the_easter_egg_once() {
    let mut f = fixture(8);
    f.gallery.lose_form();
    for &id in &f.items {
        f.gallery.focus(id);
        f.gallery.close_all();
        assert_eq!(f.gallery.tile(id).unwrap().mode, TileMode::Disappeared);
    }
    assert!(!f.gallery.easter_egg_ready());

    for &id in &f.controls {
        assert!(f.gallery.dismiss(id));
    }
    assert!(f.gallery.easter_egg_ready());
    assert_eq!(f.gallery.stage().message(), Some(CONGRATS_MESSAGE));
    assert!(f.gallery.sandbox().binding().is_empty());

    // Further closes must not re-announce
    f.gallery.stage_mut().hide_message();
    f.gallery.close_all();
    assert_eq!(f.gallery.stage().message(), None);

    assert_eq!(f.gallery.toggle(), ToggleOutcome::Finale);
    assert_eq!(f.gallery.display_mode(), DisplayMode::Disco);
    assert_eq!(f.gallery.stage().message(), Some(FINALE_MESSAGE));
    assert!(!f.gallery.stage().toggle_visible());
}

#[test]
fn returning_to_grid_resets_the_easter_egg() {
    let mut f = fixture(9);
    f.gallery.lose_form();
    let all: Vec<TileId> = f.gallery.tiles().iter().map(|t| t.id).collect();
    for id in all {
        if !f.gallery.dismiss(id) {
            f.gallery.focus(id);
            f.gallery.close_all();
        }
    }
    assert!(f.gallery.easter_egg_ready());

    f.gallery.enter_grid_mode();
    assert!(!f.gallery.easter_egg_ready());
    assert_eq!(f.gallery.stage().message(), None);
    assert_eq!(f.gallery.toggle(), ToggleOutcome::Switched(DisplayMode::Disco));
}

#[test]
fn late_essay_fetch_does_not_steal_focus() {
    let mut f = fixture(10);
    let essay = f.items[1];
    let other = f.items[2];

    let epoch = f.gallery.focus_epoch();
    f.gallery.activate(other);
    assert!(!f.gallery.focus_if_current(essay, epoch));
    assert_eq!(f.gallery.focused(), Some(other));

    // A mode change in between also invalidates it
    let epoch = f.gallery.focus_epoch();
    f.gallery.lose_form();
    assert!(!f.gallery.focus_if_current(essay, epoch));
    assert_eq!(f.gallery.focused(), None);
}

#[test]
fn disco_resize_rebuilds_walls() {
    let mut f = fixture(11);
    f.gallery.lose_form();
    let smaller = Vec2::new(800.0, 600.0);
    f.gallery.stage_mut().set_viewport(smaller);
    f.gallery.on_viewport_resize();
    assert_eq!(f.gallery.sandbox().viewport(), smaller);
    for tile in f.gallery.tiles() {
        let body = f.gallery.sandbox().body_of(tile.id).unwrap();
        assert!(body.position.x <= smaller.x - 50.0 + 1e-3);
        assert!(body.position.y <= smaller.y - 50.0 + 1e-3);
    }
}

#[test]
fn reduced_motion_jumps_straight_to_focus() {
    let settings = Settings {
        reduced_motion: true,
        ..Settings::default()
    };
    let mut gallery = Gallery::new(HeadlessStage::new(VIEWPORT), settings, 12);
    let id = gallery.add_tile(TileKind::Plain);
    gallery.enter_grid_mode();
    gallery.focus(id);
    assert!(!gallery.is_animating());
    assert!(gallery.stage().focus_transform(id).unwrap().is_identity());
}

#[test]
fn toggling_paints_and_restores_the_page_background() {
    let mut f = fixture(13);
    assert_eq!(f.gallery.toggle(), ToggleOutcome::Switched(DisplayMode::Disco));
    let color = f.gallery.stage().background().expect("disco without a background");
    assert!(DISCO_COLORS.contains(&color));

    for _ in 0..200 {
        f.gallery.advance(1.0 / 60.0);
    }
    assert!(f.gallery.stage().background_changes() >= 3);

    assert_eq!(f.gallery.toggle(), ToggleOutcome::Switched(DisplayMode::Grid));
    assert_eq!(f.gallery.stage().background(), None);
}
