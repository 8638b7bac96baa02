use anyhow::{anyhow, Result};
use log::debug;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlAudioElement;

use crate::browser;

pub fn create_track(src: &str, looping: bool, volume: f64) -> Result<HtmlAudioElement> {
    let track = HtmlAudioElement::new_with_src(src)
        .map_err(|err| anyhow!("Could not create audio track {} {:#?}", src, err))?;
    track.set_loop(looping);
    track.set_volume(volume);
    Ok(track)
}

/// Starts playback without waiting for it. Browsers reject `play()` when the page
/// has not been interacted with yet; that rejection is dropped.
pub fn play_track(track: &HtmlAudioElement) {
    match track.play() {
        Ok(promise) => browser::spawn_local(async move {
            if let Err(err) = JsFuture::from(promise).await {
                debug!("Track playback was rejected {:#?}", err);
            }
        }),
        Err(err) => debug!("Track could not be played {:#?}", err),
    }
}

pub fn stop_track(track: &HtmlAudioElement) -> Result<()> {
    track
        .pause()
        .map_err(|err| anyhow!("Could not pause track {:#?}", err))?;
    track.set_current_time(0.0);
    Ok(())
}
