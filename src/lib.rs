use engine::GameLoop;
use game::LoveQuest;
use log::{error, warn, LevelFilter};
use settings::Settings;
use wasm_bindgen::prelude::*;

mod browser;
mod engine;
mod game;
mod settings;
mod sound;

// This is like the `main` function, except for JavaScript.
#[wasm_bindgen(start)]
pub fn main_js() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    browser::init_logging(if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });

    browser::spawn_local(async move {
        let settings = Settings::from_page().unwrap_or_else(|err| {
            warn!("Falling back to default settings {:#?}", err);
            Settings::default()
        });

        if let Err(err) = GameLoop::start(LoveQuest::new(settings)).await {
            error!("Could not start game loop {:#?}", err);
        }
    });

    Ok(())
}
