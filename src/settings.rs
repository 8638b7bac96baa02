use anyhow::{anyhow, Result};
use serde::Deserialize;
use wasm_bindgen::JsValue;

const SETTINGS_GLOBAL: &str = "loveQuestSettings";
const MINIMUM_WORLD_WIDTH: f64 = 1000.0;

/// Runtime knobs a hosting page may set on `window.loveQuestSettings`, e.g.
/// `{ seed: 7, music: "lanterns.mp3", musicVolume: 0.4 }`.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    /// Fixes the scenery and particle layout; a fresh layout is rolled when absent.
    pub seed: Option<u64>,
    pub music: String,
    pub music_volume: f64,
    pub world_width: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            seed: None,
            music: "lanterns.mp3".to_owned(),
            music_volume: 0.6,
            world_width: 6000.0,
        }
    }
}

impl Settings {
    pub fn from_js(value: JsValue) -> Result<Self> {
        serde_wasm_bindgen::from_value::<Settings>(value)
            .map(Settings::normalized)
            .map_err(|err| anyhow!("Invalid {} {:#?}", SETTINGS_GLOBAL, err))
    }

    pub fn from_page() -> Result<Self> {
        match crate::browser::global(SETTINGS_GLOBAL)? {
            Some(value) => Settings::from_js(value),
            None => Ok(Settings::default()),
        }
    }

    pub fn normalized(self) -> Self {
        Settings {
            music_volume: if self.music_volume.is_finite() {
                self.music_volume.clamp(0.0, 1.0)
            } else {
                Settings::default().music_volume
            },
            world_width: if self.world_width.is_finite() {
                self.world_width.max(MINIMUM_WORLD_WIDTH)
            } else {
                Settings::default().world_width
            },
            ..self
        }
    }
}


#[cfg(all(test, target_arch = "wasm32"))]
mod browser_tests {
    use super::*;
    use wasm_bindgen_test::wasm_bindgen_test;

    wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn partial_settings_fill_in_defaults() {
        let value = js_sys::JSON::parse(r#"{"seed": 7, "musicVolume": 0.25}"#).unwrap();

        let settings = Settings::from_js(value).unwrap();

        assert_eq!(settings.seed, Some(7));
        assert_eq!(settings.music_volume, 0.25);
        assert_eq!(settings.music, "lanterns.mp3");
    }
}
