//! HTML canvas renderer

use std::f64::consts::TAU;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::rank_color;
use crate::sim::Session;

/// Draws the pit onto a 2D canvas
pub struct CanvasRenderer {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
    show_ranks: bool,
}

impl CanvasRenderer {
    pub fn new(canvas: HtmlCanvasElement, show_ranks: bool) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
            .dyn_into::<CanvasRenderingContext2d>()?;
        Ok(Self {
            canvas,
            ctx,
            show_ranks,
        })
    }

    /// Draw one frame
    pub fn render(&self, session: &Session) {
        let w = self.canvas.width() as f64;
        let h = self.canvas.height() as f64;
        let ctx = &self.ctx;
        ctx.clear_rect(0.0, 0.0, w, h);

        // Drop line
        let line_y = session.config().drop_line_y as f64;
        ctx.set_stroke_style_str("rgba(255, 255, 255, 0.35)");
        ctx.set_line_width(2.0);
        ctx.begin_path();
        ctx.move_to(0.0, line_y);
        ctx.line_to(w, line_y);
        ctx.stroke();

        ctx.set_text_align("center");
        ctx.set_text_baseline("middle");
        for ball in session.balls() {
            let (x, y, r) = (ball.pos.x as f64, ball.pos.y as f64, ball.radius as f64);
            ctx.set_global_alpha(if ball.held { 0.7 } else { 1.0 });
            ctx.set_fill_style_str(rank_color(ball.rank));
            ctx.begin_path();
            if ctx.arc(x, y, r, 0.0, TAU).is_err() {
                continue;
            }
            ctx.fill();

            if self.show_ranks {
                ctx.set_fill_style_str("#ffffff");
                ctx.set_font(&format!("bold {}px sans-serif", (r * 0.6).max(12.0) as u32));
                let _ = ctx.fill_text(&(ball.rank.value() + 1).to_string(), x, y);
            }
        }
        ctx.set_global_alpha(1.0);
    }

    /// PNG data URL of the current frame (end-of-round snapshot)
    pub fn snapshot(&self) -> Option<String> {
        match self.canvas.to_data_url() {
            Ok(url) => Some(url),
            Err(e) => {
                log::warn!("Snapshot failed: {e:?}");
                None
            }
        }
    }
}
