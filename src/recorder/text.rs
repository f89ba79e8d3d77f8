//! Text output

use super::Recorder;
use crate::emf_records::*;
use crate::error::{RecorderError, RecorderResult};
use crate::record::Record;
use crate::surface::Surface;
use crate::types::{GraphicsMode, Point, Rect};
use log::warn;

impl<S: Surface> Recorder<S> {
    /// Draw UTF-16 `text` at `origin`.
    ///
    /// Without `dx` the advances are measured character by character and
    /// stored. The text box only feeds the bounds; it is padded by one unit
    /// on the far edges.
    pub fn ext_text_out(
        &mut self,
        origin: Point,
        options: u32,
        rect: Option<Rect>,
        text: &[u16],
        dx: Option<&[i32]>,
    ) -> RecorderResult<()> {
        if let Some(dx) = dx {
            if dx.len() != text.len() {
                warn!("{} advances for {} characters", dx.len(), text.len());
                return Err(RecorderError::InvalidArgument(format!(
                    "{} advances for {} characters",
                    dx.len(),
                    text.len()
                )));
            }
        }

        let mode = self.surface.graphics_mode();
        let (ex_scale, ey_scale) = match mode {
            GraphicsMode::Compatible => self.text_scale(),
            GraphicsMode::Advanced => (0.0, 0.0),
        };

        let mut text_width = 0i32;
        let mut text_height = 0i32;
        let advances: Vec<i32> = match dx {
            Some(dx) => {
                text_width = dx.iter().fold(0i32, |w, d| w.wrapping_add(*d));
                if let Some(extent) = self.surface.text_extent(text) {
                    text_height = extent.cy;
                }
                dx.to_vec()
            }
            None => text
                .iter()
                .map(|unit| match self.surface.text_extent(std::slice::from_ref(unit)) {
                    Some(extent) => {
                        text_width = text_width.wrapping_add(extent.cx);
                        text_height = text_height.max(extent.cy);
                        extent.cx
                    }
                    None => 0,
                })
                .collect(),
        };

        let bounds = if self.path_open {
            Rect::EMPTY
        } else {
            self.text_box(origin, text_width, text_height)
        };

        let record = Record::ExtTextOut {
            bounds,
            graphics_mode: mode.to_wire(),
            ex_scale,
            ey_scale,
            reference: origin,
            options,
            rect: rect.unwrap_or(Rect::EMPTY),
            text,
            dx: &advances,
        };
        self.emit_shape(&record, bounds)
    }

    /// Convenience wrapper for Rust strings with measured advances
    pub fn text_out(&mut self, origin: Point, text: &str) -> RecorderResult<()> {
        let units: Vec<u16> = text.encode_utf16().collect();
        self.ext_text_out(origin, 0, None, &units, None)
    }

    /// 0.01 mm per logical unit, as stored for compatible-mode text
    fn text_scale(&self) -> (f32, f32) {
        let caps = self.surface.device_caps();
        let window = self.surface.window_ext();
        let viewport = self.surface.viewport_ext();
        let ex = 100.0 * (caps.horz_size as f32 / caps.horz_res as f32)
            / (window.cx as f32 / viewport.cx as f32);
        let ey = 100.0 * (caps.vert_size as f32 / caps.vert_res as f32)
            / (window.cy as f32 / viewport.cy as f32);
        (ex, ey)
    }

    /// Logical box of a text run given the current alignment
    fn text_box(&self, origin: Point, width: i32, height: i32) -> Rect {
        let align = self.surface.text_align();
        let (x, y) = (origin.x, origin.y);

        // Runs near the coordinate limits clamp instead of wrapping
        let (left, right) = match align & (TA_LEFT | TA_RIGHT | TA_CENTER) {
            TA_CENTER => {
                let half = width / 2;
                (
                    x.saturating_sub(half).saturating_sub(1),
                    x.saturating_add(half).saturating_add(1),
                )
            }
            TA_RIGHT => (x.saturating_sub(width).saturating_sub(1), x),
            _ => (x, x.saturating_add(width).saturating_add(1)),
        };
        let (top, bottom) = match align & (TA_TOP | TA_BOTTOM | TA_BASELINE) {
            TA_BASELINE => {
                let descent = self.surface.text_descent().unwrap_or(0);
                (
                    y.saturating_sub(height).saturating_sub(1),
                    y.saturating_add(descent).saturating_add(1),
                )
            }
            TA_BOTTOM => (y.saturating_sub(height).saturating_sub(1), y),
            _ => (y, y.saturating_add(height).saturating_add(1)),
        };
        Rect::new(left, top, right, bottom)
    }
}
