//! Collaborators the recorder reads from
//!
//! The recorder never owns drawing state or graphics objects. It asks a
//! [`DeviceContext`] for the current attributes and an [`ObjectRegistry`]
//! for object definitions, and the two together form a [`Surface`].

use crate::bounds::CoordinateSpace;
use crate::config::DeviceCaps;
use crate::types::{
    ColorRef, DibPattern, ExtLogPen, GraphicsMode, LogBrush, LogFont, LogPen, ObjectKind,
    ObjectRef, PaletteEntry, Point, Rect, SizeL, StockObject,
};

/// Attribute provider for the virtual drawing surface
pub trait DeviceContext: CoordinateSpace {
    fn graphics_mode(&self) -> GraphicsMode;

    /// TA_* flags currently in effect
    fn text_align(&self) -> u32;

    fn current_position(&self) -> Point;

    fn device_caps(&self) -> DeviceCaps;

    fn viewport_ext(&self) -> SizeL;

    fn window_ext(&self) -> SizeL;

    /// Extent of `text` in the selected font, `None` if it cannot be measured
    fn text_extent(&self, text: &[u16]) -> Option<SizeL>;

    /// Descent of the selected font
    fn text_descent(&self) -> Option<i32>;

    /// Bounding box of the current path once turned into a region.
    /// `None` when there is no closed path to realize.
    fn path_bounds(&self) -> Option<Rect>;

    /// Object of `kind` currently selected into the surface
    fn current_object(&self, kind: ObjectKind) -> Option<ObjectRef>;
}

/// Owner of brushes, pens, fonts, palettes and regions
pub trait ObjectRegistry {
    fn object_kind(&self, object: ObjectRef) -> Option<ObjectKind>;

    /// Which stock object `object` is, if any
    fn stock_object(&self, object: ObjectRef) -> Option<StockObject>;

    fn brush(&self, object: ObjectRef) -> Option<LogBrush>;

    /// Pattern bitmap behind a BS_PATTERN or BS_DIBPATTERN brush
    fn brush_pattern(&self, object: ObjectRef) -> Option<DibPattern>;

    /// Simple pen definition; `None` for geometric pens
    fn pen(&self, object: ObjectRef) -> Option<LogPen>;

    fn ext_pen(&self, object: ObjectRef) -> Option<ExtLogPen>;

    fn font(&self, object: ObjectRef) -> Option<LogFont>;

    fn palette(&self, object: ObjectRef) -> Option<Vec<PaletteEntry>>;

    /// Serialized region data.
    ///
    /// With an empty `out` this returns the size needed. Otherwise it fills
    /// `out` and returns the bytes written. Returns 0 for anything that is
    /// not a region.
    fn region_data(&self, region: ObjectRef, out: &mut [u8]) -> usize;

    fn create_solid_brush(&mut self, color: ColorRef) -> Option<ObjectRef>;

    fn create_pen(&mut self, pen: LogPen) -> Option<ObjectRef>;

    /// Destroy an object; returns false if it did not exist
    fn delete_object(&mut self, object: ObjectRef) -> bool;

    /// Ask to be told when `object` is destroyed, whoever destroys it.
    /// The registry queues the reference for [`take_deleted`](Self::take_deleted)
    /// before it may hand the same reference out again.
    fn watch_deletion(&mut self, object: ObjectRef);

    /// Watched objects destroyed since the last call, oldest first
    fn take_deleted(&mut self) -> Vec<ObjectRef>;
}

/// Everything a recording session is bound to
pub trait Surface: DeviceContext + ObjectRegistry {}

impl<T: DeviceContext + ObjectRegistry> Surface for T {}

/// Fetch a region blob with the size query followed by the fill
pub(crate) fn fetch_region_data<R: ObjectRegistry + ?Sized>(
    registry: &R,
    region: ObjectRef,
) -> Option<Vec<u8>> {
    let needed = registry.region_data(region, &mut []);
    if needed == 0 {
        return None;
    }
    let mut blob = vec![0u8; needed];
    let written = registry.region_data(region, &mut blob);
    if written != needed {
        return None;
    }
    Some(blob)
}
