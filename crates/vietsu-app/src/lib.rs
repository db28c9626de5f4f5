//! WASM entry point. Wires the browser adapters into the egui shell.

mod app;

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsCast;

const CANVAS_ID: &str = "vietsu_canvas";

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub async fn main() -> Result<(), JsValue> {
    wasm_logger::init(wasm_logger::Config::default());
    log::info!("Việt Sử client starting");

    eframe::WebRunner::new()
        .start(
            find_canvas()?,
            eframe::WebOptions::default(),
            Box::new(|cc| Ok(Box::new(app::VietSuApp::new(cc)))),
        )
        .await
}

/// The canvas index.html reserves for the app.
#[cfg(target_arch = "wasm32")]
fn find_canvas() -> Result<web_sys::HtmlCanvasElement, JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    document
        .get_element_by_id(CANVAS_ID)
        .ok_or_else(|| JsValue::from_str("canvas element not found"))?
        .dyn_into::<web_sys::HtmlCanvasElement>()
        .map_err(|_| JsValue::from_str("element is not a canvas"))
}
