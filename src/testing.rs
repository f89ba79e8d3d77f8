//! In-memory surface for recorder tests

use crate::bounds::CoordinateSpace;
use crate::config::DeviceCaps;
use crate::emf_records::BS_SOLID;
use crate::surface::{DeviceContext, ObjectRegistry};
use crate::types::{
    ColorRef, DibPattern, ExtLogPen, GraphicsMode, LogBrush, LogFont, LogPen, ObjectKind,
    ObjectRef, PaletteEntry, Point, Rect, RegionData, SizeL, StockObject,
};
use std::collections::{BTreeMap, BTreeSet};

const STOCK_BASE: u64 = 0x1000;

enum MockObject {
    Stock(StockObject),
    Brush(LogBrush, Option<DibPattern>),
    Pen(LogPen),
    ExtPen(ExtLogPen),
    Font(LogFont),
    Palette(Vec<PaletteEntry>),
    Region(RegionData),
}

/// Identity mapping by default; `mirror_x` negates x and `scale`
/// multiplies both axes. Every character measures 8x16 with descent 4.
pub(crate) struct MockSurface {
    pub mode: GraphicsMode,
    pub text_align: u32,
    pub position: Point,
    pub caps: DeviceCaps,
    pub viewport_ext: SizeL,
    pub window_ext: SizeL,
    pub scale: i32,
    pub mirror_x: bool,
    pub path: Option<Rect>,
    selected: BTreeMap<u8, ObjectRef>,
    objects: BTreeMap<ObjectRef, MockObject>,
    next_id: u64,
    watched: BTreeSet<ObjectRef>,
    deleted: Vec<ObjectRef>,
}

const ALL_STOCK: [StockObject; 19] = [
    StockObject::WhiteBrush,
    StockObject::LtGrayBrush,
    StockObject::GrayBrush,
    StockObject::DkGrayBrush,
    StockObject::BlackBrush,
    StockObject::NullBrush,
    StockObject::WhitePen,
    StockObject::BlackPen,
    StockObject::NullPen,
    StockObject::OemFixedFont,
    StockObject::AnsiFixedFont,
    StockObject::AnsiVarFont,
    StockObject::SystemFont,
    StockObject::DeviceDefaultFont,
    StockObject::DefaultPalette,
    StockObject::SystemFixedFont,
    StockObject::DefaultGuiFont,
    StockObject::DcBrush,
    StockObject::DcPen,
];

fn kind_slot(kind: ObjectKind) -> u8 {
    match kind {
        ObjectKind::Pen | ObjectKind::ExtPen => 1,
        other => other as u8 + 10,
    }
}

impl MockSurface {
    pub fn new() -> Self {
        let mut objects = BTreeMap::new();
        for stock in ALL_STOCK {
            objects.insert(
                ObjectRef(STOCK_BASE + stock as u64),
                MockObject::Stock(stock),
            );
        }
        let mut surface = Self {
            mode: GraphicsMode::Compatible,
            text_align: 0,
            position: Point::new(0, 0),
            caps: DeviceCaps::default(),
            viewport_ext: SizeL::new(1, 1),
            window_ext: SizeL::new(1, 1),
            scale: 1,
            mirror_x: false,
            path: None,
            selected: BTreeMap::new(),
            objects,
            next_id: 1,
            watched: BTreeSet::new(),
            deleted: Vec::new(),
        };
        surface.select(surface.stock(StockObject::WhiteBrush));
        surface.select(surface.stock(StockObject::BlackPen));
        surface
    }

    pub fn stock(&self, stock: StockObject) -> ObjectRef {
        ObjectRef(STOCK_BASE + stock as u64)
    }

    fn insert(&mut self, object: MockObject) -> ObjectRef {
        let id = ObjectRef(self.next_id);
        self.next_id += 1;
        self.objects.insert(id, object);
        id
    }

    pub fn add_brush(&mut self, brush: LogBrush) -> ObjectRef {
        self.insert(MockObject::Brush(brush, None))
    }

    /// Put a brush under a reference that was freed, as a registry
    /// recycling its ids would
    pub fn add_brush_at(&mut self, id: ObjectRef, brush: LogBrush) {
        self.objects.insert(id, MockObject::Brush(brush, None));
    }

    pub fn add_pattern_brush(&mut self, style: u32, pattern: DibPattern) -> ObjectRef {
        let brush = LogBrush {
            style,
            color: ColorRef(0),
            hatch: 0,
        };
        self.insert(MockObject::Brush(brush, Some(pattern)))
    }

    pub fn add_pen(&mut self, pen: LogPen) -> ObjectRef {
        self.insert(MockObject::Pen(pen))
    }

    pub fn add_ext_pen(&mut self, pen: ExtLogPen) -> ObjectRef {
        self.insert(MockObject::ExtPen(pen))
    }

    pub fn add_font(&mut self, font: LogFont) -> ObjectRef {
        self.insert(MockObject::Font(font))
    }

    pub fn add_palette(&mut self, entries: Vec<PaletteEntry>) -> ObjectRef {
        self.insert(MockObject::Palette(entries))
    }

    pub fn add_region(&mut self, region: RegionData) -> ObjectRef {
        self.insert(MockObject::Region(region))
    }

    /// Make `object` the current object of its kind
    pub fn select(&mut self, object: ObjectRef) {
        if let Some(kind) = self.object_kind(object) {
            self.selected.insert(kind_slot(kind), object);
        }
    }
}

impl CoordinateSpace for MockSurface {
    fn lp_to_dp(&self, points: &mut [Point]) {
        for pt in points {
            pt.x *= self.scale;
            pt.y *= self.scale;
            if self.mirror_x {
                pt.x = -pt.x;
            }
        }
    }
}

impl DeviceContext for MockSurface {
    fn graphics_mode(&self) -> GraphicsMode {
        self.mode
    }

    fn text_align(&self) -> u32 {
        self.text_align
    }

    fn current_position(&self) -> Point {
        self.position
    }

    fn device_caps(&self) -> DeviceCaps {
        self.caps
    }

    fn viewport_ext(&self) -> SizeL {
        self.viewport_ext
    }

    fn window_ext(&self) -> SizeL {
        self.window_ext
    }

    fn text_extent(&self, text: &[u16]) -> Option<SizeL> {
        Some(SizeL::new(8 * text.len() as i32, 16))
    }

    fn text_descent(&self) -> Option<i32> {
        Some(4)
    }

    fn path_bounds(&self) -> Option<Rect> {
        self.path
    }

    fn current_object(&self, kind: ObjectKind) -> Option<ObjectRef> {
        self.selected.get(&kind_slot(kind)).copied()
    }
}

impl ObjectRegistry for MockSurface {
    fn object_kind(&self, object: ObjectRef) -> Option<ObjectKind> {
        Some(match self.objects.get(&object)? {
            MockObject::Stock(stock) => stock.kind(),
            MockObject::Brush(..) => ObjectKind::Brush,
            MockObject::Pen(_) => ObjectKind::Pen,
            MockObject::ExtPen(_) => ObjectKind::ExtPen,
            MockObject::Font(_) => ObjectKind::Font,
            MockObject::Palette(_) => ObjectKind::Palette,
            MockObject::Region(_) => ObjectKind::Region,
        })
    }

    fn stock_object(&self, object: ObjectRef) -> Option<StockObject> {
        match self.objects.get(&object)? {
            MockObject::Stock(stock) => Some(*stock),
            _ => None,
        }
    }

    fn brush(&self, object: ObjectRef) -> Option<LogBrush> {
        match self.objects.get(&object)? {
            MockObject::Brush(brush, _) => Some(*brush),
            _ => None,
        }
    }

    fn brush_pattern(&self, object: ObjectRef) -> Option<DibPattern> {
        match self.objects.get(&object)? {
            MockObject::Brush(_, pattern) => pattern.clone(),
            _ => None,
        }
    }

    fn pen(&self, object: ObjectRef) -> Option<LogPen> {
        match self.objects.get(&object)? {
            MockObject::Pen(pen) => Some(*pen),
            _ => None,
        }
    }

    fn ext_pen(&self, object: ObjectRef) -> Option<ExtLogPen> {
        match self.objects.get(&object)? {
            MockObject::ExtPen(pen) => Some(*pen),
            _ => None,
        }
    }

    fn font(&self, object: ObjectRef) -> Option<LogFont> {
        match self.objects.get(&object)? {
            MockObject::Font(font) => Some(font.clone()),
            _ => None,
        }
    }

    fn palette(&self, object: ObjectRef) -> Option<Vec<PaletteEntry>> {
        match self.objects.get(&object)? {
            MockObject::Palette(entries) => Some(entries.clone()),
            _ => None,
        }
    }

    fn region_data(&self, region: ObjectRef, out: &mut [u8]) -> usize {
        let Some(MockObject::Region(data)) = self.objects.get(&region) else {
            return 0;
        };
        let blob = data.to_bytes();
        if out.is_empty() {
            return blob.len();
        }
        let n = blob.len().min(out.len());
        out[..n].copy_from_slice(&blob[..n]);
        n
    }

    fn create_solid_brush(&mut self, color: ColorRef) -> Option<ObjectRef> {
        Some(self.add_brush(LogBrush {
            style: BS_SOLID,
            color,
            hatch: 0,
        }))
    }

    fn create_pen(&mut self, pen: LogPen) -> Option<ObjectRef> {
        Some(self.add_pen(pen))
    }

    fn delete_object(&mut self, object: ObjectRef) -> bool {
        if self.stock_object(object).is_some() {
            return false;
        }
        if self.objects.remove(&object).is_none() {
            return false;
        }
        if self.watched.remove(&object) {
            self.deleted.push(object);
        }
        true
    }

    fn watch_deletion(&mut self, object: ObjectRef) {
        self.watched.insert(object);
    }

    fn take_deleted(&mut self) -> Vec<ObjectRef> {
        std::mem::take(&mut self.deleted)
    }
}
