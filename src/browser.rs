use std::future::Future;

use anyhow::{anyhow, Result};
use log::{Level, LevelFilter, Log, Metadata, Record};
use wasm_bindgen::{
    closure::{Closure, WasmClosure},
    JsCast, JsValue,
};
use web_sys::{
    CanvasRenderingContext2d, Document, Element, HtmlCanvasElement, HtmlElement,
    HtmlInputElement, Window,
};

const CANVAS_ID: &str = "canvas";
const UI_ID: &str = "ui";

struct ConsoleLogger;

static LOGGER: ConsoleLogger = ConsoleLogger;

impl Log for ConsoleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let line = JsValue::from_str(&format!("[{}] {}", record.target(), record.args()));
        match record.level() {
            Level::Error => web_sys::console::error_1(&line),
            Level::Warn => web_sys::console::warn_1(&line),
            Level::Info => web_sys::console::info_1(&line),
            Level::Debug | Level::Trace => web_sys::console::debug_1(&line),
        }
    }

    fn flush(&self) {}
}

pub fn init_logging(level: LevelFilter) {
    if log::set_logger(&LOGGER).is_ok() {
        log::set_max_level(level);
    }
}

pub fn window() -> Result<Window> {
    web_sys::window().ok_or_else(|| anyhow!("No Window Found"))
}

pub fn document() -> Result<Document> {
    window()?
        .document()
        .ok_or_else(|| anyhow!("No Document Found"))
}

pub fn canvas() -> Result<HtmlCanvasElement> {
    document()?
        .get_element_by_id(CANVAS_ID)
        .ok_or_else(|| anyhow!("No Canvas Element found with ID '{}'", CANVAS_ID))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|element| anyhow!("Error converting {:#?} to HtmlCanvasElement", element))
}

pub fn context() -> Result<CanvasRenderingContext2d> {
    canvas()?
        .get_context("2d")
        .map_err(|js_value| anyhow!("Error getting 2d context {:#?}", js_value))?
        .ok_or_else(|| anyhow!("No 2d context found"))?
        .dyn_into::<CanvasRenderingContext2d>()
        .map_err(|element| {
            anyhow!(
                "Error converting {:#?} to CanvasRenderingContext2d",
                element
            )
        })
}

/// Resizes the canvas to the window and returns the new `(width, height)`.
pub fn fit_canvas_to_window() -> Result<(f64, f64)> {
    let window = window()?;
    let width = window
        .inner_width()
        .map_err(|err| anyhow!("Could not read window width {:#?}", err))?
        .as_f64()
        .ok_or_else(|| anyhow!("Window width is not a number"))?;
    let height = window
        .inner_height()
        .map_err(|err| anyhow!("Could not read window height {:#?}", err))?
        .as_f64()
        .ok_or_else(|| anyhow!("Window height is not a number"))?;
    let canvas = canvas()?;
    canvas.set_width(width as u32);
    canvas.set_height(height as u32);
    Ok((width, height))
}

pub fn spawn_local<F>(future: F)
where
    F: Future<Output = ()> + 'static,
{
    wasm_bindgen_futures::spawn_local(future);
}

pub type LoopClosure = Closure<dyn FnMut(f64)>;

pub fn request_animation_frame(callback: &LoopClosure) -> Result<i32> {
    window()?
        .request_animation_frame(callback.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("Cannot request animation frame {:#?}", err))
}

pub fn closure_wrap<T: WasmClosure + ?Sized>(data: Box<T>) -> Closure<T> {
    Closure::wrap(data)
}

pub fn create_raf_closure(f: impl FnMut(f64) + 'static) -> LoopClosure {
    closure_wrap(Box::new(f))
}

pub fn now() -> Result<f64> {
    Ok(window()?
        .performance()
        .ok_or_else(|| anyhow!("Performance object not found"))?
        .now())
}

/// Looks up a global set by the hosting page, e.g. `window.loveQuestSettings`.
pub fn global(name: &str) -> Result<Option<JsValue>> {
    let window = window()?;
    let value = js_sys::Reflect::get(&window, &JsValue::from_str(name))
        .map_err(|err| anyhow!("Could not read global {} {:#?}", name, err))?;
    if value.is_undefined() || value.is_null() {
        Ok(None)
    } else {
        Ok(Some(value))
    }
}

pub fn find_html_element_by_id(id: &str) -> Result<HtmlElement> {
    document()
        .and_then(|doc| {
            doc.get_element_by_id(id)
                .ok_or_else(|| anyhow!("Element with id {} not found", id))
        })
        .and_then(|element| {
            element
                .dyn_into::<HtmlElement>()
                .map_err(|err| anyhow!("Could not cast into HtmlElement {:#?}", err))
        })
}

pub fn input_value(id: &str) -> Result<String> {
    find_html_element_by_id(id)?
        .dyn_into::<HtmlInputElement>()
        .map(|input| input.value())
        .map_err(|err| anyhow!("Element {} is not an input {:#?}", id, err))
}

pub fn set_text(id: &str, text: &str) -> Result<()> {
    find_html_element_by_id(id)?.set_text_content(Some(text));
    Ok(())
}

fn find_ui() -> Result<Element> {
    document().and_then(|doc| {
        doc.get_element_by_id(UI_ID)
            .ok_or_else(|| anyhow!("UI element not found"))
    })
}

pub fn draw_ui(html: &str) -> Result<()> {
    let ui = find_ui()?;
    ui.set_inner_html(html);
    ui.dyn_into::<HtmlElement>()
        .map_err(|err| anyhow!("Could not cast UI into HtmlElement {:#?}", err))?
        .style()
        .set_property("display", "flex")
        .map_err(|err| anyhow!("Could not show the UI {:#?}", err))
}

pub fn hide_ui() -> Result<()> {
    let ui = find_ui()?;
    ui.set_inner_html("");
    ui.dyn_into::<HtmlElement>()
        .map_err(|err| anyhow!("Could not cast UI into HtmlElement {:#?}", err))?
        .style()
        .set_property("display", "none")
        .map_err(|err| anyhow!("Could not hide the UI {:#?}", err))?;
    canvas()?
        .focus()
        .map_err(|err| anyhow!("Could not set focus to canvas! {:#?}", err))
}

/// Returns the `(width, height)` of the box `element` is positioned against,
/// falling back to the UI container when it has no offset parent.
pub fn containing_size(element: &HtmlElement) -> Result<(f64, f64)> {
    let container = match element.offset_parent() {
        Some(parent) => parent,
        None => find_ui()?,
    };
    let rect = container.get_bounding_client_rect();
    Ok((rect.width(), rect.height()))
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::wasm_bindgen_test;

    wasm_bindgen_test::wasm_bindgen_test_configure!(run_in_browser);

    fn insert_ui() {
        document()
            .unwrap()
            .body()
            .unwrap()
            .insert_adjacent_html("afterbegin", "<div id='ui'></div>")
            .unwrap();
    }

    #[wasm_bindgen_test]
    fn draw_ui_replaces_previous_content() {
        insert_ui();
        draw_ui("<p id='first'>first</p>").unwrap();
        draw_ui("<p id='second'>second</p>").unwrap();

        let ui = find_ui().unwrap();
        assert_eq!(ui.child_element_count(), 1);
        assert!(document().unwrap().get_element_by_id("first").is_none());
    }

    #[wasm_bindgen_test]
    fn set_text_updates_element() {
        insert_ui();
        draw_ui("<div id='hint'></div>").unwrap();
        set_text("hint", "Hint: It was in March.").unwrap();

        let hint = find_html_element_by_id("hint").unwrap();
        assert_eq!(
            hint.text_content().as_deref(),
            Some("Hint: It was in March.")
        );
    }

    #[wasm_bindgen_test]
    fn missing_global_is_none() {
        assert!(global("definitelyNotAGlobal").unwrap().is_none());
    }

    #[wasm_bindgen_test]
    fn page_global_is_read_from_the_window() {
        js_sys::Reflect::set(
            &window().unwrap(),
            &JsValue::from_str("loveQuestTestGlobal"),
            &JsValue::from_f64(7.0),
        )
        .unwrap();

        let value = global("loveQuestTestGlobal").unwrap();

        assert_eq!(value.and_then(|value| value.as_f64()), Some(7.0));
    }
}
