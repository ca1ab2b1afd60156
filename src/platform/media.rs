//! Film playback inside a focused tile
//!
//! `.m3u8` manifests go through hls.js when the page loaded it, then
//! native HLS (Safari); anything else is a plain `<video src>`.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{HtmlElement, HtmlVideoElement};

use crate::error::{GalleryError, Result};

const HLS_MIME: &str = "application/vnd.apple.mpegurl";

// hls.js is an optional page script, so it is reached through inline JS
#[wasm_bindgen(inline_js = "
    export function attach_hls(video, src) {
        if (!window.Hls || !Hls.isSupported()) {
            return false;
        }
        const hls = new Hls({ startFragPrefetch: true, enableWorker: true });
        hls.loadSource(src);
        hls.attachMedia(video);
        video.hls = hls;
        hls.on(Hls.Events.MANIFEST_PARSED, () => {
            video.play().catch(e => console.warn('autoplay blocked', e));
        });
        return true;
    }

    export function detach_hls(video) {
        if (video.hls) {
            video.hls.destroy();
            video.hls = null;
        }
    }
")]
extern "C" {
    fn attach_hls(video: &HtmlVideoElement, src: &str) -> bool;
    fn detach_hls(video: &HtmlVideoElement);
}

fn child(tile: &HtmlElement, selector: &str) -> Result<HtmlElement> {
    tile.query_selector(selector)?
        .and_then(|el| el.dyn_into::<HtmlElement>().ok())
        .ok_or_else(|| GalleryError::MissingElement(selector.to_string()))
}

/// Replace the tile's thumbnail with a playing video
pub fn start(tile: &HtmlElement, src: &str) -> Result<()> {
    let container = child(tile, ".video-container")?;
    let document = tile
        .owner_document()
        .ok_or_else(|| GalleryError::MissingElement("document".into()))?;

    container.set_inner_html("");
    let video: HtmlVideoElement = document
        .create_element("video")?
        .dyn_into()
        .map_err(|_| GalleryError::Js("created <video> is not a video element".into()))?;
    video.set_id("active-video");
    video.set_controls(true);
    video.set_autoplay(true);
    video.set_attribute("playsinline", "")?;
    let style = video.style();
    style.set_property("width", "100%")?;
    style.set_property("height", "auto")?;
    container.append_child(&video)?;

    let is_manifest = src.ends_with(".m3u8");
    if !(is_manifest && attach_hls(&video, src)) {
        if is_manifest && video.can_play_type(HLS_MIME).is_empty() {
            log::warn!("No HLS support for {src}; trying it as a plain source");
        }
        video.set_src(src);
        play(&video);
    }

    // Clicks on the controls must not reach the tile
    let stop = Closure::<dyn FnMut(_)>::new(move |event: web_sys::MouseEvent| {
        event.stop_propagation();
    });
    video.add_event_listener_with_callback("click", stop.as_ref().unchecked_ref())?;
    stop.forget();

    if let Ok(thumbnail) = child(tile, ".thumbnail") {
        thumbnail.style().set_property("display", "none")?;
    }
    container.style().set_property("display", "block")?;
    log::info!("Playing {src}");
    Ok(())
}

/// Stop playback, tear down HLS and restore the thumbnail
pub fn stop(tile: &HtmlElement) -> Result<()> {
    let container = child(tile, ".video-container")?;
    if let Some(video) = container
        .query_selector("video")?
        .and_then(|el| el.dyn_into::<HtmlVideoElement>().ok())
    {
        let _ = video.pause();
        detach_hls(&video);
        video.remove_attribute("src")?;
        video.load();
    }
    container.set_inner_html("");
    container.style().set_property("display", "none")?;

    if let Ok(thumbnail) = child(tile, ".thumbnail") {
        thumbnail.style().remove_property("display")?;
    }
    Ok(())
}

fn play(video: &HtmlVideoElement) {
    match video.play() {
        Ok(promise) => spawn_local(async move {
            if let Err(e) = JsFuture::from(promise).await {
                log::warn!("Autoplay rejected: {e:?}");
            }
        }),
        Err(e) => log::warn!("play() failed: {e:?}"),
    }
}
