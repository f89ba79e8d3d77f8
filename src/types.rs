//! Value types written into EMF records

use crate::emf_records::{GM_ADVANCED, GM_COMPATIBLE, STOCK_OBJECT_FLAG};
use serde::{Deserialize, Serialize};

/// Point in 32-bit coordinates (POINTL)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Whether both coordinates fit a signed 16-bit value
    pub fn fits_i16(&self) -> bool {
        let fits = |v: i32| (v.wrapping_add(0x8000) as u32) & !0xffff == 0;
        fits(self.x) && fits(self.y)
    }
}

/// Rectangle with inclusive edges (RECTL)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    /// The "nothing recorded yet" sentinel: right < left
    pub const EMPTY: Rect = Rect {
        left: 0,
        top: 0,
        right: -1,
        bottom: -1,
    };

    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.left > self.right
    }

    /// Same rectangle with left <= right and top <= bottom
    pub fn normalized(&self) -> Self {
        Self {
            left: self.left.min(self.right),
            top: self.top.min(self.bottom),
            right: self.left.max(self.right),
            bottom: self.top.max(self.bottom),
        }
    }

    /// Smallest rectangle holding every point, `None` when there are none
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut rect = Rect::new(first.x, first.y, first.x, first.y);
        for pt in iter {
            rect.left = rect.left.min(pt.x);
            rect.top = rect.top.min(pt.y);
            rect.right = rect.right.max(pt.x);
            rect.bottom = rect.bottom.max(pt.y);
        }
        Some(rect)
    }
}

impl Default for Rect {
    fn default() -> Self {
        Rect::EMPTY
    }
}

/// Width/height pair (SIZEL)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SizeL {
    pub cx: i32,
    pub cy: i32,
}

impl SizeL {
    pub fn new(cx: i32, cy: i32) -> Self {
        Self { cx, cy }
    }
}

/// 0x00BBGGRR colour value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize)]
pub struct ColorRef(pub u32);

impl ColorRef {
    pub fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self(r as u32 | (g as u32) << 8 | (b as u32) << 16)
    }
}

/// World transform matrix
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct XForm {
    pub m11: f32,
    pub m12: f32,
    pub m21: f32,
    pub m22: f32,
    pub dx: f32,
    pub dy: f32,
}

impl XForm {
    pub fn identity() -> Self {
        Self {
            m11: 1.0,
            m12: 0.0,
            m21: 0.0,
            m22: 1.0,
            dx: 0.0,
            dy: 0.0,
        }
    }
}

/// Gradient vertex: position plus 16-bit colour channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TriVertex {
    pub x: i32,
    pub y: i32,
    pub red: u16,
    pub green: u16,
    pub blue: u16,
    pub alpha: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogBrush {
    pub style: u32,
    pub color: ColorRef,
    pub hatch: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LogPen {
    pub style: u32,
    pub width: Point,
    pub color: ColorRef,
}

/// Geometric pen; only the fields a simple pen record can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExtLogPen {
    pub style: u32,
    pub width: u32,
    pub brush_style: u32,
    pub color: ColorRef,
    pub hatch: u32,
}

impl From<ExtLogPen> for LogPen {
    fn from(pen: ExtLogPen) -> Self {
        LogPen {
            style: pen.style,
            width: Point::new(pen.width as i32, 0),
            color: pen.color,
        }
    }
}

/// Logical font description
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LogFont {
    pub height: i32,
    pub width: i32,
    pub escapement: i32,
    pub orientation: i32,
    pub weight: i32,
    pub italic: u8,
    pub underline: u8,
    pub strike_out: u8,
    pub char_set: u8,
    pub out_precision: u8,
    pub clip_precision: u8,
    pub quality: u8,
    pub pitch_and_family: u8,
    /// Truncated to 31 UTF-16 units when written
    pub face_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PaletteEntry {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
    pub flags: u8,
}

/// BITMAPINFOHEADER
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapInfoHeader {
    pub width: i32,
    pub height: i32,
    pub planes: u16,
    pub bit_count: u16,
    pub compression: u32,
    pub size_image: u32,
    pub x_pels_per_meter: i32,
    pub y_pels_per_meter: i32,
    pub clr_used: u32,
    pub clr_important: u32,
}

impl BitmapInfoHeader {
    pub const SIZE: u32 = 40;
}

/// Bitmap behind a pattern brush, as a device-independent bitmap
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DibPattern {
    pub header: BitmapInfoHeader,
    /// Raw colour table following the header (RGBQUADs or palette indices)
    pub color_table: Vec<u8>,
    pub bits: Vec<u8>,
    /// DIB_RGB_COLORS or DIB_PAL_COLORS
    pub usage: u32,
}

impl DibPattern {
    pub fn info_size(&self) -> u32 {
        BitmapInfoHeader::SIZE + self.color_table.len() as u32
    }
}

/// Region as a list of rectangles (RGNDATA); `bounds` has exclusive right/bottom
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegionData {
    pub bounds: Rect,
    pub rects: Vec<Rect>,
}

impl RegionData {
    pub const HEADER_SIZE: usize = 32;
    const RDH_RECTANGLES: u32 = 1;

    pub fn byte_len(&self) -> usize {
        Self::HEADER_SIZE + self.rects.len() * 16
    }

    /// Serialize as RGNDATAHEADER followed by the rectangles
    pub fn to_bytes(&self) -> Vec<u8> {
        use byteorder::{LittleEndian, WriteBytesExt};

        let mut out = Vec::with_capacity(self.byte_len());
        let rects_size = (self.rects.len() * 16) as u32;
        let mut put = |v: u32| {
            // Writes into a Vec cannot fail
            let _ = out.write_u32::<LittleEndian>(v);
        };
        put(Self::HEADER_SIZE as u32);
        put(Self::RDH_RECTANGLES);
        put(self.rects.len() as u32);
        put(rects_size);
        for r in std::iter::once(&self.bounds).chain(self.rects.iter()) {
            put(r.left as u32);
            put(r.top as u32);
            put(r.right as u32);
            put(r.bottom as u32);
        }
        out
    }

    /// Read the bounding box out of a serialized region
    pub fn bounds_of(blob: &[u8]) -> Option<Rect> {
        use byteorder::{ByteOrder, LittleEndian};

        if blob.len() < Self::HEADER_SIZE {
            return None;
        }
        let at = |i: usize| LittleEndian::read_i32(&blob[16 + i * 4..]);
        Some(Rect::new(at(0), at(1), at(2), at(3)))
    }
}

/// Opaque reference to a graphics object owned by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectRef(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Brush,
    Pen,
    ExtPen,
    Font,
    Palette,
    Region,
    Bitmap,
}

/// Predefined objects that are referenced without a handle slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum StockObject {
    WhiteBrush = 0,
    LtGrayBrush = 1,
    GrayBrush = 2,
    DkGrayBrush = 3,
    BlackBrush = 4,
    NullBrush = 5,
    WhitePen = 6,
    BlackPen = 7,
    NullPen = 8,
    OemFixedFont = 10,
    AnsiFixedFont = 11,
    AnsiVarFont = 12,
    SystemFont = 13,
    DeviceDefaultFont = 14,
    DefaultPalette = 15,
    SystemFixedFont = 16,
    DefaultGuiFont = 17,
    DcBrush = 18,
    DcPen = 19,
}

impl StockObject {
    pub fn kind(self) -> ObjectKind {
        use StockObject::*;
        match self {
            WhiteBrush | LtGrayBrush | GrayBrush | DkGrayBrush | BlackBrush | NullBrush
            | DcBrush => ObjectKind::Brush,
            WhitePen | BlackPen | NullPen | DcPen => ObjectKind::Pen,
            DefaultPalette => ObjectKind::Palette,
            OemFixedFont | AnsiFixedFont | AnsiVarFont | SystemFont | DeviceDefaultFont
            | SystemFixedFont | DefaultGuiFont => ObjectKind::Font,
        }
    }
}

/// Object index as referenced from select/delete records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectIndex {
    Stock(StockObject),
    /// 1-based handle table position
    Table(u32),
}

impl ObjectIndex {
    pub fn to_wire(self) -> u32 {
        match self {
            ObjectIndex::Stock(stock) => stock as u32 | STOCK_OBJECT_FLAG,
            ObjectIndex::Table(index) => index,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GraphicsMode {
    /// Legacy mode: shape edges are inclusive
    #[default]
    Compatible,
    Advanced,
}

impl GraphicsMode {
    pub fn to_wire(self) -> u32 {
        match self {
            GraphicsMode::Compatible => GM_COMPATIBLE,
            GraphicsMode::Advanced => GM_ADVANCED,
        }
    }
}

/// Encode a string as UTF-16 without a terminator
pub fn to_utf16(s: &str) -> Vec<u16> {
    s.encode_utf16().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_point_range() {
        assert!(Point::new(32767, -32768).fits_i16());
        assert!(!Point::new(32768, 0).fits_i16());
        assert!(!Point::new(0, -32769).fits_i16());
        assert!(!Point::new(i32::MIN, 0).fits_i16());
    }

    #[test]
    fn test_rect_from_points() {
        let pts = [Point::new(5, 9), Point::new(-2, 4), Point::new(3, 12)];
        assert_eq!(Rect::from_points(&pts), Some(Rect::new(-2, 4, 5, 12)));
        assert_eq!(Rect::from_points(&[]), None);
    }

    #[test]
    fn test_stock_index_sets_high_bit() {
        assert_eq!(ObjectIndex::Stock(StockObject::BlackPen).to_wire(), 0x8000_0007);
        assert_eq!(ObjectIndex::Stock(StockObject::WhiteBrush).to_wire(), 0x8000_0000);
        assert_eq!(ObjectIndex::Table(3).to_wire(), 3);
    }

    #[test]
    fn test_region_blob_bounds() {
        let region = RegionData {
            bounds: Rect::new(1, 2, 30, 40),
            rects: vec![Rect::new(1, 2, 30, 40)],
        };
        let blob = region.to_bytes();
        assert_eq!(blob.len(), region.byte_len());
        assert_eq!(RegionData::bounds_of(&blob), Some(Rect::new(1, 2, 30, 40)));
        assert_eq!(RegionData::bounds_of(&blob[..8]), None);
    }
}
