//! Recording session
//!
//! A [`Recorder`] is bound to one [`Surface`] from [`Recorder::open`] until
//! [`Recorder::close`]. Every drawing or state call turns into one record
//! (object selection may add a creation record first). The emitters live in
//! the sub-modules by topic.
//!
//! A call that fails leaves the stream, the handle table and the bounds as
//! they were, apart from delete records for objects the registry had
//! already destroyed.

mod drawing;
mod objects;
mod state;
mod text;

use crate::bounds::BoundsTracker;
use crate::buffer::RecordBuffer;
use crate::config::MetafileOptions;
use crate::error::{RecorderError, RecorderResult};
use crate::handles::HandleTable;
use crate::metafile::{
    EnhMetafile, MetafileHeader, OFF_BOUNDS, OFF_BYTES, OFF_FRAME, OFF_HANDLES, OFF_RECORDS,
};
use crate::record::Record;
use crate::surface::Surface;
use crate::types::{GraphicsMode, ObjectRef, Rect, SizeL};
use log::{debug, info, warn};
use memmap2::Mmap;
use std::collections::VecDeque;
use std::fs::File;
use std::io::Write;

pub struct Recorder<S: Surface> {
    surface: S,
    buffer: RecordBuffer,
    handles: HandleTable,
    bounds: BoundsTracker,
    /// Frame requested at open, in 0.01 mm
    frame: Option<Rect>,
    device: SizeL,
    millimeters: SizeL,
    file: Option<File>,
    path_open: bool,
    save_depth: i32,
    /// Session-owned stand-ins for the stock DC brush and pen
    dc_brush: Option<ObjectRef>,
    dc_pen: Option<ObjectRef>,
    /// Registry deletions not yet written to the stream
    pending_deletions: VecDeque<ObjectRef>,
}

impl<S: Surface> Recorder<S> {
    /// Start recording against `surface`.
    ///
    /// Writes the header, with the description right behind it, and
    /// creates the backing file when one is configured.
    pub fn open(surface: S, options: MetafileOptions) -> RecorderResult<Self> {
        let caps = surface.device_caps();
        let device = SizeL::new(caps.horz_res, caps.vert_res);
        let millimeters = SizeL::new(caps.horz_size, caps.vert_size);
        let description = options
            .description
            .as_ref()
            .map(|d| d.to_utf16())
            .unwrap_or_default();

        let frame = options.frame.filter(|f| !f.is_empty());
        let header = MetafileHeader::new(
            frame.unwrap_or(Rect::EMPTY),
            device,
            millimeters,
            &description,
        );

        let file = match &options.file {
            Some(path) => {
                let file = File::options()
                    .read(true)
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(path)?;
                debug!("metafile backed by {}", path.display());
                Some(file)
            }
            None => None,
        };

        debug!(
            "recording opened: device {}x{} px, {}x{} mm, frame {:?}",
            device.cx, device.cy, millimeters.cx, millimeters.cy, frame
        );

        Ok(Self {
            surface,
            buffer: RecordBuffer::with_header(header.encode(&description)),
            handles: HandleTable::new(),
            bounds: BoundsTracker::new(),
            frame,
            device,
            millimeters,
            file,
            path_open: false,
            save_depth: 0,
            dc_brush: None,
            dc_pen: None,
            pending_deletions: VecDeque::new(),
        })
    }

    /// Finish the stream and hand back the metafile.
    ///
    /// Unwinds open saves, deletes the DC brush/pen stand-ins, writes the
    /// end-of-file record and fills in the header totals. A file-backed
    /// session is written out and mapped back read-only.
    pub fn close(mut self) -> RecorderResult<EnhMetafile> {
        if self.save_depth > 0 {
            self.restore_dc(1)?;
        }
        for placeholder in [self.dc_brush.take(), self.dc_pen.take()]
            .into_iter()
            .flatten()
        {
            self.delete_object(placeholder)?;
        }
        self.emit(&Record::Eof)?;

        let bounds = self.bounds.bounds();
        let frame = self
            .frame
            .unwrap_or_else(|| frame_from_bounds(bounds, self.device, self.millimeters));
        let handles = self.handles.high_water().min(u16::MAX as u32) as u16;
        let bytes = self.buffer.byte_length() as u32;
        let records = self.buffer.record_count();

        self.patch_rect(OFF_BOUNDS, bounds);
        self.patch_rect(OFF_FRAME, frame);
        self.buffer.patch_u32(OFF_BYTES, bytes);
        self.buffer.patch_u32(OFF_RECORDS, records);
        self.buffer.patch_u16(OFF_HANDLES, handles);

        info!(
            "recording closed: {} records, {} bytes, {} handles, disk {}",
            records,
            bytes,
            handles,
            self.file.is_some()
        );

        let Recorder { buffer, file, .. } = self;
        match file {
            Some(mut file) => {
                file.write_all(buffer.as_bytes())?;
                file.flush()?;
                drop(buffer);
                // SAFETY: the file was created by this session and is only
                // read through the map from here on.
                let map = unsafe { Mmap::map(&file)? };
                Ok(EnhMetafile::Mapped(map))
            }
            None => Ok(EnhMetafile::Memory(buffer.into_vec())),
        }
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// The bound surface, for changing drawing state between calls
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Records so far, the header included
    pub fn record_count(&self) -> u32 {
        self.buffer.record_count()
    }

    pub fn byte_length(&self) -> usize {
        self.buffer.byte_length()
    }

    /// Highest number of handles live at once, the reserved one included
    pub fn handle_count(&self) -> u32 {
        self.handles.high_water()
    }

    /// Stream index of `object`, if it has one. Deletions the registry
    /// queued since the last recorded call show up after
    /// [`sync_deletions`](Self::sync_deletions).
    pub fn handle_of(&self, object: ObjectRef) -> Option<u32> {
        self.handles.find(object)
    }

    /// Device-space bounds of everything drawn so far
    pub fn bounds(&self) -> Rect {
        self.bounds.bounds()
    }

    pub fn path_open(&self) -> bool {
        self.path_open
    }

    pub fn save_depth(&self) -> i32 {
        self.save_depth
    }

    /// Raw stream as written so far
    pub fn as_bytes(&self) -> &[u8] {
        self.buffer.as_bytes()
    }

    fn emit(&mut self, record: &Record) -> RecorderResult<()> {
        self.sync_deletions()?;
        self.buffer.append(&record.encode())
    }

    /// Append a geometry record, then extend the bounds by `bounds`
    fn emit_with_bounds(&mut self, record: &Record, bounds: Rect) -> RecorderResult<()> {
        self.emit(record)?;
        self.fold_bounds(&bounds);
        Ok(())
    }

    /// Like [`emit_with_bounds`](Self::emit_with_bounds), but path
    /// construction does not count towards the bounds
    fn emit_shape(&mut self, record: &Record, bounds: Rect) -> RecorderResult<()> {
        if self.path_open {
            self.emit(record)
        } else {
            self.emit_with_bounds(record, bounds)
        }
    }

    fn fold_bounds(&mut self, rect: &Rect) {
        self.bounds.fold(rect, &self.surface);
    }

    /// Box for rectangle-like shapes: rejects zero spans, sorts the edges
    /// and pulls right/bottom in by one in compatible mode
    fn shape_box(&self, rect: Rect) -> RecorderResult<Rect> {
        if rect.left == rect.right || rect.top == rect.bottom {
            warn!("degenerate shape {:?}", rect);
            return Err(RecorderError::DegenerateShape);
        }
        let mut shape = rect.normalized();
        if self.surface.graphics_mode() == GraphicsMode::Compatible {
            shape.right -= 1;
            shape.bottom -= 1;
        }
        Ok(shape)
    }

    fn patch_rect(&mut self, offset: usize, rect: Rect) {
        let fields = [rect.left, rect.top, rect.right, rect.bottom];
        for (i, value) in fields.into_iter().enumerate() {
            self.buffer.patch_u32(offset + i * 4, value as u32);
        }
    }
}

/// Physical frame (0.01 mm) covering `bounds` on the reference device
fn frame_from_bounds(bounds: Rect, device: SizeL, millimeters: SizeL) -> Rect {
    let scale = |v: i32, mm: i32, px: i32| -> i32 {
        if px == 0 {
            return 0;
        }
        let scaled = v as i64 * mm as i64 * 100 / px as i64;
        scaled.clamp(i32::MIN as i64, i32::MAX as i64) as i32
    };
    Rect::new(
        scale(bounds.left, millimeters.cx, device.cx),
        scale(bounds.top, millimeters.cy, device.cy),
        scale(bounds.right, millimeters.cx, device.cx),
        scale(bounds.bottom, millimeters.cy, device.cy),
    )
}
