//! Canvas 2D implementation of the renderer's drawing surface.

#![allow(deprecated)] // web-sys Canvas API deprecation warnings

use pixel_core::artwork::{ARTWORK_BACKGROUND, fit_artwork};
use pixel_core::renderer::DecodeRequest;
use pixel_core::{Color, Dimensions, ScreenRect, Surface};
use tracing::trace;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement};

pub struct CanvasSurface {
    context: CanvasRenderingContext2d,
    width: f64,
    height: f64,
}

impl CanvasSurface {
    pub fn new(canvas: &HtmlCanvasElement) -> Result<Self, JsValue> {
        let context = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("Failed to get 2d context"))?
            .dyn_into::<CanvasRenderingContext2d>()?;

        Ok(Self {
            context,
            width: f64::from(canvas.width()),
            height: f64::from(canvas.height()),
        })
    }
}

impl Surface for CanvasSurface {
    type Image = HtmlImageElement;

    fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn clear_rect(&mut self, rect: ScreenRect) {
        self.context
            .clear_rect(rect.x, rect.y, rect.width, rect.height);
    }

    fn fill_rect(&mut self, rect: ScreenRect, color: Color) {
        self.context
            .set_fill_style(&JsValue::from_str(&color.to_css()));
        self.context
            .fill_rect(rect.x, rect.y, rect.width, rect.height);
    }

    fn stroke_rect(&mut self, rect: ScreenRect, color: Color, line_width: f64) {
        self.context
            .set_stroke_style(&JsValue::from_str(&color.to_css()));
        self.context.set_line_width(line_width);
        self.context
            .stroke_rect(rect.x, rect.y, rect.width, rect.height);
    }

    fn draw_image(&mut self, image: &HtmlImageElement, rect: ScreenRect) {
        if let Err(e) = self
            .context
            .draw_image_with_html_image_element_and_dw_and_dh(
                image,
                rect.x,
                rect.y,
                rect.width,
                rect.height,
            )
        {
            trace!("draw_image failed: {e:?}");
        }
    }
}

async fn load_image(source: &str) -> Result<HtmlImageElement, JsValue> {
    let image = HtmlImageElement::new()?;
    image.set_src(source);
    JsFuture::from(image.decode()).await?;
    Ok(image)
}

/// Loads the request's content (a URL or data URL) into an image element.
pub async fn decode_image(request: &DecodeRequest) -> Result<HtmlImageElement, JsValue> {
    load_image(&request.content).await
}

/// Draws `source` fitted into an offscreen canvas the size of `block` and
/// returns it as a PNG data URL.
pub async fn render_artwork(source: &str, block: Dimensions) -> Result<String, JsValue> {
    let image = load_image(source).await?;
    let layout = fit_artwork(
        f64::from(image.natural_width()),
        f64::from(image.natural_height()),
        block,
    )
    .ok_or_else(|| JsValue::from_str("Image or selection is empty"))?;

    let canvas = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("No document"))?
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()?;
    canvas.set_width(layout.canvas_width);
    canvas.set_height(layout.canvas_height);

    let mut surface = CanvasSurface::new(&canvas)?;
    let full = ScreenRect::new(0.0, 0.0, surface.width, surface.height);
    surface.fill_rect(full, ARTWORK_BACKGROUND);
    surface.draw_image(
        &image,
        ScreenRect::new(layout.x, layout.y, layout.width, layout.height),
    );
    trace!(?layout, "artwork rendered");

    canvas.to_data_url_with_type("image/png")
}
