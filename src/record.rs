//! Record encoding
//!
//! Each [`Record`] variant knows its own fixed part and where its trailing
//! arrays go. [`RecordBuilder`] handles the little-endian layout, the final
//! 4-byte padding and the size field.

use crate::emf_records::*;
use crate::types::{
    BitmapInfoHeader, ColorRef, DibPattern, LogBrush, LogFont, LogPen, PaletteEntry, Point, Rect,
    SizeL, TriVertex, XForm,
};
use byteorder::{ByteOrder, LittleEndian};

/// Size of the record prefix (type + size)
pub const RECORD_HEADER_SIZE: usize = 8;

/// Fixed part of an EXTTEXTOUTW record, before the string
pub const EXTTEXTOUT_FIXED_SIZE: u32 = 76;

const FACE_NAME_UNITS: usize = 32;

pub struct RecordBuilder {
    buf: Vec<u8>,
}

impl RecordBuilder {
    pub fn new(record_type: u32) -> Self {
        let mut builder = Self {
            buf: Vec::with_capacity(64),
        };
        builder.u32(record_type).u32(0);
        builder
    }

    fn grow(&mut self, n: usize) -> &mut [u8] {
        let at = self.buf.len();
        self.buf.resize(at + n, 0);
        &mut self.buf[at..]
    }

    pub fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub fn u16(&mut self, v: u16) -> &mut Self {
        LittleEndian::write_u16(self.grow(2), v);
        self
    }

    pub fn i16(&mut self, v: i16) -> &mut Self {
        LittleEndian::write_i16(self.grow(2), v);
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        LittleEndian::write_u32(self.grow(4), v);
        self
    }

    pub fn i32(&mut self, v: i32) -> &mut Self {
        LittleEndian::write_i32(self.grow(4), v);
        self
    }

    pub fn f32(&mut self, v: f32) -> &mut Self {
        LittleEndian::write_f32(self.grow(4), v);
        self
    }

    pub fn color(&mut self, c: ColorRef) -> &mut Self {
        self.u32(c.0)
    }

    pub fn point(&mut self, p: Point) -> &mut Self {
        self.i32(p.x).i32(p.y)
    }

    pub fn size(&mut self, s: SizeL) -> &mut Self {
        self.i32(s.cx).i32(s.cy)
    }

    pub fn rect(&mut self, r: Rect) -> &mut Self {
        self.i32(r.left).i32(r.top).i32(r.right).i32(r.bottom)
    }

    /// Points as POINTL, or as POINTS when `short` is set
    pub fn points(&mut self, points: &[Point], short: bool) -> &mut Self {
        for p in points {
            if short {
                self.i16(p.x as i16).i16(p.y as i16);
            } else {
                self.point(*p);
            }
        }
        self
    }

    pub fn bytes(&mut self, data: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(data);
        self
    }

    pub fn zeros(&mut self, n: usize) -> &mut Self {
        self.grow(n);
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.len() <= RECORD_HEADER_SIZE
    }

    /// Zero-pad to a multiple of 4 and fill in the size field
    pub fn finish(mut self) -> Vec<u8> {
        let padded = (self.buf.len() + 3) & !3;
        self.buf.resize(padded, 0);
        let size = self.buf.len() as u32;
        LittleEndian::write_u32(&mut self.buf[4..8], size);
        self.buf
    }
}

fn bitmap_info_header(b: &mut RecordBuilder, h: &BitmapInfoHeader) {
    b.u32(BitmapInfoHeader::SIZE)
        .i32(h.width)
        .i32(h.height)
        .u16(h.planes)
        .u16(h.bit_count)
        .u32(h.compression)
        .u32(h.size_image)
        .i32(h.x_pels_per_meter)
        .i32(h.y_pels_per_meter)
        .u32(h.clr_used)
        .u32(h.clr_important);
}

fn log_font(b: &mut RecordBuilder, font: &LogFont) {
    b.i32(font.height)
        .i32(font.width)
        .i32(font.escapement)
        .i32(font.orientation)
        .i32(font.weight)
        .u8(font.italic)
        .u8(font.underline)
        .u8(font.strike_out)
        .u8(font.char_set)
        .u8(font.out_precision)
        .u8(font.clip_precision)
        .u8(font.quality)
        .u8(font.pitch_and_family);
    let mut face = [0u16; FACE_NAME_UNITS];
    for (dst, src) in face
        .iter_mut()
        .take(FACE_NAME_UNITS - 1)
        .zip(font.face_name.encode_utf16())
    {
        *dst = src;
    }
    for unit in face {
        b.u16(unit);
    }
}

/// One record of the stream
#[derive(Debug, Clone, PartialEq)]
pub enum Record<'a> {
    /// Records with no payload (save, path bracketing)
    Empty(u32),
    /// Records carrying one 32-bit value (modes, colours, object indices)
    Value(u32, u32),
    Point(u32, Point),
    Size(u32, SizeL),
    Rect(u32, Rect),
    ScaleExtent {
        kind: u32,
        x_num: i32,
        x_denom: i32,
        y_num: i32,
        y_denom: i32,
    },
    RestoreDc(i32),
    TextJustification {
        extra: i32,
        breaks: i32,
    },
    Arc {
        kind: u32,
        rect: Rect,
        start: Point,
        end: Point,
    },
    AngleArc {
        center: Point,
        radius: u32,
        start: f32,
        sweep: f32,
    },
    RoundRect {
        rect: Rect,
        corner: SizeL,
    },
    SetPixel {
        point: Point,
        color: ColorRef,
    },
    /// Poly-line family; switches to the 16-bit variant when every point fits
    Poly {
        kind: u32,
        bounds: Rect,
        points: &'a [Point],
    },
    PolyPoly {
        kind: u32,
        bounds: Rect,
        counts: &'a [u32],
        points: &'a [Point],
    },
    PolyDraw {
        bounds: Rect,
        points: &'a [Point],
        types: &'a [u8],
    },
    ExtFloodFill {
        point: Point,
        color: ColorRef,
        mode: u32,
    },
    FillRgn {
        bounds: Rect,
        brush: u32,
        region: &'a [u8],
    },
    FrameRgn {
        bounds: Rect,
        brush: u32,
        stroke: SizeL,
        region: &'a [u8],
    },
    /// Paint or invert region
    Rgn {
        kind: u32,
        bounds: Rect,
        region: &'a [u8],
    },
    ExtSelectClipRgn {
        mode: u32,
        region: &'a [u8],
    },
    ExtTextOut {
        bounds: Rect,
        graphics_mode: u32,
        ex_scale: f32,
        ey_scale: f32,
        reference: Point,
        options: u32,
        rect: Rect,
        text: &'a [u16],
        dx: &'a [i32],
    },
    GradientFill {
        bounds: Rect,
        mode: u32,
        shapes: u32,
        vertices: &'a [TriVertex],
        indices: &'a [u32],
    },
    SetWorldTransform(XForm),
    ModifyWorldTransform(XForm, u32),
    CreateBrush {
        index: u32,
        brush: LogBrush,
    },
    CreateDibPatternBrush {
        index: u32,
        pattern: &'a DibPattern,
        /// Write as a monochrome brush without colour table
        mono: bool,
    },
    CreatePen {
        index: u32,
        pen: LogPen,
    },
    CreateFont {
        index: u32,
        font: &'a LogFont,
    },
    CreatePalette {
        index: u32,
        version: u16,
        entries: &'a [PaletteEntry],
    },
    Comment(&'a [u8]),
    Eof,
}

fn all_short(points: &[Point]) -> bool {
    points.iter().all(Point::fits_i16)
}

impl Record<'_> {
    /// Type tag this record is written with
    pub fn record_type(&self) -> u32 {
        match self {
            Record::Empty(kind)
            | Record::Value(kind, _)
            | Record::Point(kind, _)
            | Record::Size(kind, _)
            | Record::Rect(kind, _)
            | Record::ScaleExtent { kind, .. }
            | Record::Arc { kind, .. }
            | Record::Rgn { kind, .. } => *kind,
            Record::Poly { kind, points, .. } | Record::PolyPoly { kind, points, .. } => {
                match short_point_variant(*kind) {
                    Some(short) if all_short(points) => short,
                    _ => *kind,
                }
            }
            Record::PolyDraw { points, .. } => {
                if all_short(points) {
                    EMR_POLYDRAW16
                } else {
                    EMR_POLYDRAW
                }
            }
            Record::RestoreDc(_) => EMR_RESTOREDC,
            Record::TextJustification { .. } => EMR_SETTEXTJUSTIFICATION,
            Record::AngleArc { .. } => EMR_ANGLEARC,
            Record::RoundRect { .. } => EMR_ROUNDRECT,
            Record::SetPixel { .. } => EMR_SETPIXELV,
            Record::ExtFloodFill { .. } => EMR_EXTFLOODFILL,
            Record::FillRgn { .. } => EMR_FILLRGN,
            Record::FrameRgn { .. } => EMR_FRAMERGN,
            Record::ExtSelectClipRgn { .. } => EMR_EXTSELECTCLIPRGN,
            Record::ExtTextOut { .. } => EMR_EXTTEXTOUTW,
            Record::GradientFill { .. } => EMR_GRADIENTFILL,
            Record::SetWorldTransform(_) => EMR_SETWORLDTRANSFORM,
            Record::ModifyWorldTransform(..) => EMR_MODIFYWORLDTRANSFORM,
            Record::CreateBrush { .. } => EMR_CREATEBRUSHINDIRECT,
            Record::CreateDibPatternBrush { mono, .. } => {
                if *mono {
                    EMR_CREATEMONOBRUSH
                } else {
                    EMR_CREATEDIBPATTERNBRUSHPT
                }
            }
            Record::CreatePen { .. } => EMR_CREATEPEN,
            Record::CreateFont { .. } => EMR_EXTCREATEFONTINDIRECTW,
            Record::CreatePalette { .. } => EMR_CREATEPALETTE,
            Record::Comment(_) => EMR_GDICOMMENT,
            Record::Eof => EMR_EOF,
        }
    }

    /// Serialize to the on-disk layout
    pub fn encode(&self) -> Vec<u8> {
        let mut b = RecordBuilder::new(self.record_type());
        match self {
            Record::Empty(_) => {}
            Record::Value(_, value) => {
                b.u32(*value);
            }
            Record::Point(_, point) => {
                b.point(*point);
            }
            Record::Size(_, size) => {
                b.size(*size);
            }
            Record::Rect(_, rect) => {
                b.rect(*rect);
            }
            Record::ScaleExtent {
                x_num,
                x_denom,
                y_num,
                y_denom,
                ..
            } => {
                b.i32(*x_num).i32(*x_denom).i32(*y_num).i32(*y_denom);
            }
            Record::RestoreDc(relative) => {
                b.i32(*relative);
            }
            Record::TextJustification { extra, breaks } => {
                b.i32(*extra).i32(*breaks);
            }
            Record::Arc {
                rect, start, end, ..
            } => {
                b.rect(*rect).point(*start).point(*end);
            }
            Record::AngleArc {
                center,
                radius,
                start,
                sweep,
            } => {
                b.point(*center).u32(*radius).f32(*start).f32(*sweep);
            }
            Record::RoundRect { rect, corner } => {
                b.rect(*rect).size(*corner);
            }
            Record::SetPixel { point, color } => {
                b.point(*point).color(*color);
            }
            Record::Poly { bounds, points, .. } => {
                b.rect(*bounds)
                    .u32(points.len() as u32)
                    .points(points, all_short(points));
            }
            Record::PolyPoly {
                bounds,
                counts,
                points,
                ..
            } => {
                b.rect(*bounds)
                    .u32(counts.len() as u32)
                    .u32(points.len() as u32);
                for count in counts.iter() {
                    b.u32(*count);
                }
                b.points(points, all_short(points));
            }
            Record::PolyDraw {
                bounds,
                points,
                types,
            } => {
                b.rect(*bounds)
                    .u32(points.len() as u32)
                    .points(points, all_short(points))
                    .bytes(types);
            }
            Record::ExtFloodFill { point, color, mode } => {
                b.point(*point).color(*color).u32(*mode);
            }
            Record::FillRgn {
                bounds,
                brush,
                region,
            } => {
                b.rect(*bounds)
                    .u32(region.len() as u32)
                    .u32(*brush)
                    .bytes(region);
            }
            Record::FrameRgn {
                bounds,
                brush,
                stroke,
                region,
            } => {
                b.rect(*bounds)
                    .u32(region.len() as u32)
                    .u32(*brush)
                    .size(*stroke)
                    .bytes(region);
            }
            Record::Rgn { bounds, region, .. } => {
                b.rect(*bounds).u32(region.len() as u32).bytes(region);
            }
            Record::ExtSelectClipRgn { mode, region } => {
                b.u32(region.len() as u32).u32(*mode).bytes(region);
            }
            Record::ExtTextOut {
                bounds,
                graphics_mode,
                ex_scale,
                ey_scale,
                reference,
                options,
                rect,
                text,
                dx,
            } => {
                let string_units = (text.len() + 1) & !1;
                let off_dx = EXTTEXTOUT_FIXED_SIZE + string_units as u32 * 2;
                b.rect(*bounds)
                    .u32(*graphics_mode)
                    .f32(*ex_scale)
                    .f32(*ey_scale)
                    .point(*reference)
                    .u32(text.len() as u32)
                    .u32(EXTTEXTOUT_FIXED_SIZE)
                    .u32(*options)
                    .rect(*rect)
                    .u32(off_dx);
                for unit in text.iter() {
                    b.u16(*unit);
                }
                b.zeros((string_units - text.len()) * 2);
                for advance in dx.iter() {
                    b.i32(*advance);
                }
            }
            Record::GradientFill {
                bounds,
                mode,
                shapes,
                vertices,
                indices,
            } => {
                b.rect(*bounds)
                    .u32(vertices.len() as u32)
                    .u32(*shapes)
                    .u32(*mode);
                for v in vertices.iter() {
                    b.i32(v.x)
                        .i32(v.y)
                        .u16(v.red)
                        .u16(v.green)
                        .u16(v.blue)
                        .u16(v.alpha);
                }
                for index in indices.iter() {
                    b.u32(*index);
                }
            }
            Record::SetWorldTransform(xform) => {
                xform_fields(&mut b, xform);
            }
            Record::ModifyWorldTransform(xform, mode) => {
                xform_fields(&mut b, xform);
                b.u32(*mode);
            }
            Record::CreateBrush { index, brush } => {
                b.u32(*index)
                    .u32(brush.style)
                    .color(brush.color)
                    .u32(brush.hatch);
            }
            Record::CreateDibPatternBrush {
                index,
                pattern,
                mono,
            } => {
                // ihBrush, iUsage, offBmi, cbBmi, offBits, cbBits
                const FIXED: u32 = 32;
                let (usage, off_bmi, cb_bmi) = if *mono {
                    // An extra DWORD precedes the info header
                    (DIB_PAL_MONO, FIXED + 4, BitmapInfoHeader::SIZE)
                } else {
                    (pattern.usage, FIXED, pattern.info_size())
                };
                let off_bits = off_bmi + cb_bmi;
                b.u32(*index)
                    .u32(usage)
                    .u32(off_bmi)
                    .u32(cb_bmi)
                    .u32(off_bits)
                    .u32(pattern.bits.len() as u32);
                if *mono {
                    b.u32(0);
                }
                bitmap_info_header(&mut b, &pattern.header);
                if !*mono {
                    b.bytes(&pattern.color_table);
                }
                b.bytes(&pattern.bits);
            }
            Record::CreatePen { index, pen } => {
                b.u32(*index).u32(pen.style).point(pen.width).color(pen.color);
            }
            Record::CreateFont { index, font } => {
                b.u32(*index);
                log_font(&mut b, font);
                // Full name and style, both empty
                b.zeros(64 * 2 + 32 * 2);
                // Version, style size, match, reserved
                b.u32(0).u32(0).u32(0).u32(0);
                // Vendor id
                b.zeros(4);
                b.u32(PAN_CULTURE_LATIN);
                for _ in 0..10 {
                    b.u8(PAN_NO_FIT);
                }
            }
            Record::CreatePalette {
                index,
                version,
                entries,
            } => {
                b.u32(*index).u16(*version).u16(entries.len() as u16);
                for e in entries.iter() {
                    b.u8(e.red).u8(e.green).u8(e.blue).u8(0);
                }
                // The fixed part ends in a one-entry array
                b.u32(0);
            }
            Record::Comment(data) => {
                b.u32(data.len() as u32).bytes(data);
            }
            Record::Eof => {
                const EOF_SIZE: u32 = 20;
                // nPalEntries, offPalEntries, nSizeLast
                b.u32(0).u32(16).u32(EOF_SIZE);
            }
        }
        b.finish()
    }
}

fn xform_fields(b: &mut RecordBuilder, x: &XForm) {
    b.f32(x.m11).f32(x.m12).f32(x.m21).f32(x.m22).f32(x.dx).f32(x.dy);
}
