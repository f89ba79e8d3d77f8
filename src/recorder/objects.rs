//! Object selection, creation and deletion records

use super::Recorder;
use crate::emf_records::*;
use crate::error::{RecorderError, RecorderResult};
use crate::record::Record;
use crate::surface::Surface;
use crate::types::{ColorRef, LogPen, ObjectIndex, ObjectKind, ObjectRef, Point, StockObject};
use log::{debug, warn};

const PALETTE_VERSION: u16 = 0x300;

impl<S: Surface> Recorder<S> {
    /// Select a brush, pen or font, creating its record on first use.
    /// Other object kinds are accepted and not recorded.
    pub fn select_object(&mut self, object: ObjectRef) -> RecorderResult<()> {
        let kind = self
            .surface
            .object_kind(object)
            .ok_or(RecorderError::ObjectQuery(object))?;
        let index = match kind {
            ObjectKind::Brush => self.brush_index(object)?,
            ObjectKind::Pen | ObjectKind::ExtPen => self.pen_index(object)?,
            ObjectKind::Font => self.font_index(object)?,
            ObjectKind::Palette | ObjectKind::Region | ObjectKind::Bitmap => {
                debug!("select of {:?} {:?} not recorded", kind, object);
                return Ok(());
            }
        };
        self.emit(&Record::Value(EMR_SELECTOBJECT, index))
    }

    pub fn select_palette(&mut self, palette: ObjectRef) -> RecorderResult<()> {
        self.sync_deletions()?;
        let index = match self.stock_index(palette, ObjectKind::Palette) {
            Some(index) => index,
            None => match self.handles.find(palette) {
                Some(index) => index,
                None => self.create_palette(palette)?,
            },
        };
        self.emit(&Record::Value(EMR_SELECTPALETTE, index))
    }

    /// Delete an object through the registry and drop its handle
    pub fn delete_object(&mut self, object: ObjectRef) -> RecorderResult<()> {
        if !self.surface.delete_object(object) {
            return Err(RecorderError::InvalidArgument(format!(
                "{:?} is not a live object",
                object
            )));
        }
        self.sync_deletions()?;
        self.release_handle(object)
    }

    /// Deletion notification: an object was destroyed by its owner.
    ///
    /// Writes a delete record and frees the handle if the stream knows the
    /// object; does nothing otherwise.
    pub fn object_deleted(&mut self, object: ObjectRef) -> RecorderResult<()> {
        self.sync_deletions()?;
        self.release_handle(object)
    }

    /// Record every watched object the registry destroyed since the last
    /// drain.
    ///
    /// Runs before each record is written and before each handle lookup,
    /// so a reference the registry hands out again never resolves to the
    /// slot of the object it used to name.
    pub fn sync_deletions(&mut self) -> RecorderResult<()> {
        self.pending_deletions.extend(self.surface.take_deleted());
        while let Some(&object) = self.pending_deletions.front() {
            self.release_handle(object)?;
            self.pending_deletions.pop_front();
        }
        Ok(())
    }

    fn release_handle(&mut self, object: ObjectRef) -> RecorderResult<()> {
        let Some(index) = self.handles.find(object) else {
            return Ok(());
        };
        self.buffer
            .append(&Record::Value(EMR_DELETEOBJECT, index).encode())?;
        self.handles.release(index);
        if self.dc_brush == Some(object) {
            self.dc_brush = None;
        }
        if self.dc_pen == Some(object) {
            self.dc_pen = None;
        }
        Ok(())
    }

    /// Colour for the stock DC brush; recorded only while it is selected
    pub fn set_dc_brush_color(&mut self, color: ColorRef) -> RecorderResult<()> {
        if !self.is_selected(ObjectKind::Brush, StockObject::DcBrush) {
            return Ok(());
        }
        if let Some(old) = self.dc_brush.take() {
            self.delete_object(old)?;
        }
        let brush = self
            .surface
            .create_solid_brush(color)
            .ok_or(RecorderError::Allocation("DC brush"))?;
        let index = self.create_brush(brush)?;
        self.dc_brush = Some(brush);
        self.emit(&Record::Value(EMR_SELECTOBJECT, index))
    }

    /// Colour for the stock DC pen; recorded only while it is selected
    pub fn set_dc_pen_color(&mut self, color: ColorRef) -> RecorderResult<()> {
        if !self.is_selected(ObjectKind::Pen, StockObject::DcPen) {
            return Ok(());
        }
        if let Some(old) = self.dc_pen.take() {
            self.delete_object(old)?;
        }
        let pen = self
            .surface
            .create_pen(LogPen {
                style: PS_SOLID,
                width: Point::new(0, 0),
                color,
            })
            .ok_or(RecorderError::Allocation("DC pen"))?;
        let index = self.create_pen(pen)?;
        self.dc_pen = Some(pen);
        self.emit(&Record::Value(EMR_SELECTOBJECT, index))
    }

    fn is_selected(&self, kind: ObjectKind, stock: StockObject) -> bool {
        self.surface
            .current_object(kind)
            .and_then(|object| self.surface.stock_object(object))
            == Some(stock)
    }

    /// Wire index of a stock object of the expected kind
    fn stock_index(&self, object: ObjectRef, kind: ObjectKind) -> Option<u32> {
        self.surface
            .stock_object(object)
            .filter(|stock| stock.kind() == kind)
            .map(|stock| ObjectIndex::Stock(stock).to_wire())
    }

    pub(super) fn brush_index(&mut self, brush: ObjectRef) -> RecorderResult<u32> {
        self.sync_deletions()?;
        if let Some(index) = self.stock_index(brush, ObjectKind::Brush) {
            return Ok(index);
        }
        match self.handles.find(brush) {
            Some(index) => Ok(index),
            None => self.create_brush(brush),
        }
    }

    fn pen_index(&mut self, pen: ObjectRef) -> RecorderResult<u32> {
        self.sync_deletions()?;
        if let Some(index) = self.stock_index(pen, ObjectKind::Pen) {
            return Ok(index);
        }
        match self.handles.find(pen) {
            Some(index) => Ok(index),
            None => self.create_pen(pen),
        }
    }

    fn font_index(&mut self, font: ObjectRef) -> RecorderResult<u32> {
        self.sync_deletions()?;
        if let Some(index) = self.stock_index(font, ObjectKind::Font) {
            return Ok(index);
        }
        match self.handles.find(font) {
            Some(index) => Ok(index),
            None => self.create_font(font),
        }
    }

    /// Write the creation record for `object` under a fresh handle.
    /// The handle is only taken once the record is in the stream.
    fn register<F>(&mut self, object: ObjectRef, build: F) -> RecorderResult<u32>
    where
        F: FnOnce(u32) -> Vec<u8>,
    {
        self.sync_deletions()?;
        let index = self.handles.reserve()?;
        self.buffer.append(&build(index))?;
        self.handles.occupy(index, object);
        self.surface.watch_deletion(object);
        Ok(index)
    }

    fn create_brush(&mut self, brush: ObjectRef) -> RecorderResult<u32> {
        let logbrush = self.surface.brush(brush).ok_or_else(|| {
            warn!("brush query failed for {:?}", brush);
            RecorderError::ObjectQuery(brush)
        })?;
        match logbrush.style {
            BS_SOLID | BS_HATCHED | BS_NULL => self.register(brush, |index| {
                Record::CreateBrush {
                    index,
                    brush: logbrush,
                }
                .encode()
            }),
            BS_PATTERN | BS_DIBPATTERN => {
                let pattern = self
                    .surface
                    .brush_pattern(brush)
                    .ok_or(RecorderError::ObjectQuery(brush))?;
                let mono = logbrush.style == BS_PATTERN && pattern.header.bit_count == 1;
                self.register(brush, |index| {
                    Record::CreateDibPatternBrush {
                        index,
                        pattern: &pattern,
                        mono,
                    }
                    .encode()
                })
            }
            style => {
                warn!("unsupported brush style {:#x}", style);
                Err(RecorderError::UnsupportedObject(brush))
            }
        }
    }

    fn create_pen(&mut self, pen: ObjectRef) -> RecorderResult<u32> {
        let logpen = match self.surface.pen(pen) {
            Some(logpen) => logpen,
            None => self.surface.ext_pen(pen).map(LogPen::from).ok_or_else(|| {
                warn!("pen query failed for {:?}", pen);
                RecorderError::ObjectQuery(pen)
            })?,
        };
        self.register(pen, |index| Record::CreatePen { index, pen: logpen }.encode())
    }

    fn create_font(&mut self, font: ObjectRef) -> RecorderResult<u32> {
        let logfont = self.surface.font(font).ok_or_else(|| {
            warn!("font query failed for {:?}", font);
            RecorderError::ObjectQuery(font)
        })?;
        self.register(font, |index| {
            Record::CreateFont {
                index,
                font: &logfont,
            }
            .encode()
        })
    }

    fn create_palette(&mut self, palette: ObjectRef) -> RecorderResult<u32> {
        let entries = self
            .surface
            .palette(palette)
            .ok_or(RecorderError::ObjectQuery(palette))?;
        if entries.len() > u16::MAX as usize {
            return Err(RecorderError::UnsupportedObject(palette));
        }
        self.register(palette, |index| {
            Record::CreatePalette {
                index,
                version: PALETTE_VERSION,
                entries: &entries,
            }
            .encode()
        })
    }
}
