//! Disco Gallery entry point
//!
//! Wires the page's DOM events into the gallery and drives it from
//! requestAnimationFrame.

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

#[cfg(target_arch = "wasm32")]
mod wasm_gallery {
    use std::cell::RefCell;
    use std::rc::Rc;
    use wasm_bindgen::prelude::*;
    use web_sys::{Document, HtmlElement, MouseEvent};

    use disco_gallery::consts::SIM_DT;
    use disco_gallery::error::Result;
    use disco_gallery::platform::dom::DomStage;
    use disco_gallery::platform::essay;
    use disco_gallery::{DisplayMode, Gallery, Settings, Stage, TileId, TileKind, ToggleOutcome};

    const LOSE_FORM_LABEL: &str = "Lose Form";
    const RETURN_LABEL: &str = "Return to Form";
    /// Matches the loading screen's CSS fade-out
    const LOADER_FADE_MS: i32 = 500;

    /// Gallery plus frame timing
    struct App {
        gallery: Gallery<DomStage>,
        last_time: f64,
    }

    type Shared = Rc<RefCell<App>>;

    impl App {
        /// Pull freshly known media metrics into the tiles
        fn measure(&mut self, tile: TileId) {
            let natural = self.gallery.stage().natural_size(tile);
            let text = self.gallery.stage().text_width(tile);
            if let Some(size) = natural {
                self.gallery.set_natural_size(tile, size.x, size.y);
            }
            if let Some(width) = text {
                self.gallery.set_text_width(tile, width);
            }
        }

        fn frame(&mut self, time: f64) {
            let dt = if self.last_time > 0.0 {
                ((time - self.last_time) / 1000.0) as f32
            } else {
                SIM_DT
            };
            self.last_time = time;
            self.gallery.advance(dt);
        }
    }

    pub fn run() -> Result<()> {
        console_error_panic_hook::set_once();
        let _ = console_log::init_with_level(log::Level::Info);
        log::info!("Disco Gallery starting...");

        let settings = Settings::load();
        let (stage, kinds) = DomStage::from_document()?;

        let seed = js_sys::Date::now() as u64;
        let mut gallery = Gallery::new(stage, settings, seed);
        for kind in &kinds {
            gallery.add_tile(kind.clone());
        }
        log::info!("Gallery initialized with seed: {}", seed);

        let app = Rc::new(RefCell::new(App {
            gallery,
            last_time: 0.0,
        }));
        {
            let mut a = app.borrow_mut();
            for i in 0..kinds.len() {
                a.measure(TileId(i as u32));
            }
            a.gallery.enter_grid_mode();
        }

        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| disco_gallery::GalleryError::MissingElement("document".into()))?;
        set_label(&app, LOSE_FORM_LABEL);
        randomize_button_colors(&document);

        setup_tile_handlers(&app, &kinds)?;
        setup_toggle(&app, document.clone())?;
        setup_overlay(&app)?;
        setup_resize(&app)?;
        setup_image_loads(&app)?;

        dismiss_loader(&document);

        request_animation_frame(app);
        log::info!("Disco Gallery running!");
        Ok(())
    }

    /// Fade the loading screen out, then take it out of the layout
    fn dismiss_loader(document: &Document) {
        let Some(loader) = document
            .get_element_by_id("loading-screen")
            .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        else {
            return;
        };
        let _ = loader.class_list().add_1("hidden");

        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move || {
            let _ = loader.style().set_property("display", "none");
        });
        if let Err(e) = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            closure.as_ref().unchecked_ref(),
            LOADER_FADE_MS,
        ) {
            log::warn!("Scheduling loader removal: {e:?}");
        }
        closure.forget();
    }

    fn element(app: &Shared, tile: TileId) -> Option<HtmlElement> {
        app.borrow().gallery.stage().element(tile).cloned()
    }

    fn set_label(app: &Shared, label: &str) {
        app.borrow()
            .gallery
            .stage()
            .toggle_button()
            .set_inner_text(label);
    }

    fn listen<E: wasm_bindgen::convert::FromWasmAbi + 'static>(
        target: &web_sys::EventTarget,
        event: &str,
        handler: impl FnMut(E) + 'static,
    ) -> Result<()> {
        let closure = Closure::<dyn FnMut(E)>::new(handler);
        target.add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())?;
        closure.forget();
        Ok(())
    }

    fn setup_tile_handlers(app: &Shared, kinds: &[TileKind]) -> Result<()> {
        for (i, kind) in kinds.iter().enumerate() {
            let tile = TileId(i as u32);
            let Some(el) = element(app, tile) else {
                continue;
            };

            match kind.clone() {
                TileKind::Control => {
                    let a = app.clone();
                    listen(&el, "click", move |event: MouseEvent| {
                        if a.borrow_mut().gallery.dismiss(tile) {
                            event.prevent_default();
                        }
                    })?;
                    let a = app.clone();
                    listen(&el, "mouseenter", move |_: MouseEvent| {
                        a.borrow_mut().gallery.hold(tile);
                    })?;
                    let a = app.clone();
                    listen(&el, "mouseleave", move |_: MouseEvent| {
                        a.borrow_mut().gallery.release_hold(tile);
                    })?;
                }
                TileKind::Essay { path } => {
                    let a = app.clone();
                    let target = el.clone();
                    listen(&el, "click", move |_: MouseEvent| {
                        let (epoch, focused) = {
                            let app = a.borrow();
                            let focused = app.gallery.tile(tile).is_some_and(|t| t.is_focused());
                            (app.gallery.focus_epoch(), focused)
                        };
                        if focused {
                            return;
                        }
                        let a = a.clone();
                        let target = target.clone();
                        let path = path.clone();
                        wasm_bindgen_futures::spawn_local(async move {
                            essay::ensure_loaded(&target, &path).await;
                            let mut app = a.borrow_mut();
                            app.measure(tile);
                            app.gallery.focus_if_current(tile, epoch);
                        });
                    })?;
                }
                _ => {
                    let a = app.clone();
                    listen(&el, "click", move |_: MouseEvent| {
                        a.borrow_mut().gallery.activate(tile);
                    })?;
                }
            }
        }
        Ok(())
    }

    fn setup_toggle(app: &Shared, document: Document) -> Result<()> {
        let button = app.borrow().gallery.stage().toggle_button().clone();
        let a = app.clone();
        listen(&button, "click", move |event: MouseEvent| {
            event.stop_propagation();
            let outcome = a.borrow_mut().gallery.toggle();
            match outcome {
                ToggleOutcome::Switched(DisplayMode::Disco) => {
                    set_label(&a, RETURN_LABEL);
                    randomize_button_colors(&document);
                }
                ToggleOutcome::Switched(DisplayMode::Grid) => {
                    set_label(&a, LOSE_FORM_LABEL);
                    randomize_button_colors(&document);
                }
                ToggleOutcome::Finale => {}
            }
        })
    }

    fn setup_overlay(app: &Shared) -> Result<()> {
        let overlay = app.borrow().gallery.stage().overlay().clone();
        let a = app.clone();
        listen(&overlay, "click", move |_: MouseEvent| {
            a.borrow_mut().gallery.close_all();
        })
    }

    fn setup_resize(app: &Shared) -> Result<()> {
        let window =
            web_sys::window().ok_or_else(|| disco_gallery::GalleryError::MissingElement("window".into()))?;
        let a = app.clone();
        listen(&window, "resize", move |_: web_sys::Event| {
            a.borrow_mut().gallery.on_viewport_resize();
        })
    }

    /// Re-run the layout as late images arrive
    fn setup_image_loads(app: &Shared) -> Result<()> {
        let pending = app.borrow().gallery.stage().pending_images();
        for (tile, img) in pending {
            for event in ["load", "error"] {
                let a = app.clone();
                listen(&img, event, move |_: web_sys::Event| {
                    let mut app = a.borrow_mut();
                    app.measure(tile);
                    app.gallery.relayout();
                })?;
            }
        }
        Ok(())
    }

    /// Triadic colors for the three floating buttons
    fn randomize_button_colors(document: &Document) {
        let base: u32 = rand::random_range(0..360);
        let buttons = [("insta-btn", 0), ("return-btn", 120), ("email-btn", 240)];
        for (id, offset) in buttons {
            let Some(el) = document
                .get_element_by_id(id)
                .and_then(|el| el.dyn_into::<HtmlElement>().ok())
            else {
                continue;
            };
            let hue = (base + offset) % 360;
            let _ = el
                .style()
                .set_property("background-color", &format!("hsl({hue}, 70%, 45%)"));
        }
    }

    fn request_animation_frame(app: Shared) {
        let Some(window) = web_sys::window() else {
            return;
        };
        let closure = Closure::once(move |time: f64| {
            app.borrow_mut().frame(time);
            request_animation_frame(app);
        });
        let _ = window.request_animation_frame(closure.as_ref().unchecked_ref());
        closure.forget();
    }
}

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn wasm_main() {
    if let Err(e) = wasm_gallery::run() {
        log::error!("Disco Gallery failed to start: {e}");
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // wasm_main is the real entry point
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    use disco_gallery::platform::headless::HeadlessStage;
    use disco_gallery::{Gallery, Settings, TileId, TileKind};
    use glam::Vec2;

    env_logger::init();
    log::info!("Disco Gallery (native) starting...");
    log::info!("The browser build is the real front-end; this runs a headless walkthrough");

    let mut gallery = Gallery::new(
        HeadlessStage::new(Vec2::new(1280.0, 800.0)),
        Settings::load(),
        0xD15C0,
    );
    let sizes = [(1600.0, 1067.0), (800.0, 1000.0), (1920.0, 1080.0), (1200.0, 1200.0)];
    for (i, (w, h)) in sizes.into_iter().cycle().take(10).enumerate() {
        let kind = if i == 3 {
            TileKind::Essay {
                path: "essays/notes.txt".into(),
            }
        } else {
            TileKind::Media { video_src: None }
        };
        let id = gallery.add_tile(kind);
        gallery.set_natural_size(id, w, h);
    }
    let controls: Vec<TileId> = (0..2).map(|_| gallery.add_tile(TileKind::Control)).collect();

    gallery.enter_grid_mode();
    for (i, row) in gallery.layout().rows.iter().enumerate() {
        println!("row {i}: {} tiles at {:.1}px", row.tiles.len(), row.height);
    }

    gallery.lose_form();
    for _ in 0..300 {
        gallery.advance(1.0 / 60.0);
    }
    println!("disco: {} bodies bound", gallery.sandbox().binding().len());

    // Clear the board
    let items: Vec<TileId> = gallery
        .tiles()
        .iter()
        .filter(|t| !t.kind.is_control())
        .map(|t| t.id)
        .collect();
    for id in items {
        gallery.focus(id);
        gallery.close_all();
    }
    for id in controls {
        gallery.dismiss(id);
    }
    println!(
        "board cleared: {}, message: {:?}",
        gallery.easter_egg_ready(),
        gallery.stage().message()
    );
}
