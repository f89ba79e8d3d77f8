//! EMF record type constants and the other numeric values that appear on the wire

pub const EMR_HEADER: u32 = 1;
pub const EMR_POLYBEZIER: u32 = 2;
pub const EMR_POLYGON: u32 = 3;
pub const EMR_POLYLINE: u32 = 4;
pub const EMR_POLYBEZIERTO: u32 = 5;
pub const EMR_POLYLINETO: u32 = 6;
pub const EMR_POLYPOLYLINE: u32 = 7;
pub const EMR_POLYPOLYGON: u32 = 8;
pub const EMR_SETWINDOWEXTEX: u32 = 9;
pub const EMR_SETWINDOWORGEX: u32 = 10;
pub const EMR_SETVIEWPORTEXTEX: u32 = 11;
pub const EMR_SETVIEWPORTORGEX: u32 = 12;
pub const EMR_EOF: u32 = 14;
pub const EMR_SETPIXELV: u32 = 15;
pub const EMR_SETMAPPERFLAGS: u32 = 16;
pub const EMR_SETMAPMODE: u32 = 17;
pub const EMR_SETBKMODE: u32 = 18;
pub const EMR_SETPOLYFILLMODE: u32 = 19;
pub const EMR_SETROP2: u32 = 20;
pub const EMR_SETSTRETCHBLTMODE: u32 = 21;
pub const EMR_SETTEXTALIGN: u32 = 22;
pub const EMR_SETTEXTCOLOR: u32 = 24;
pub const EMR_SETBKCOLOR: u32 = 25;
pub const EMR_OFFSETCLIPRGN: u32 = 26;
pub const EMR_MOVETOEX: u32 = 27;
pub const EMR_EXCLUDECLIPRECT: u32 = 29;
pub const EMR_INTERSECTCLIPRECT: u32 = 30;
pub const EMR_SCALEVIEWPORTEXTEX: u32 = 31;
pub const EMR_SCALEWINDOWEXTEX: u32 = 32;
pub const EMR_SAVEDC: u32 = 33;
pub const EMR_RESTOREDC: u32 = 34;
pub const EMR_SETWORLDTRANSFORM: u32 = 35;
pub const EMR_MODIFYWORLDTRANSFORM: u32 = 36;
pub const EMR_SELECTOBJECT: u32 = 37;
pub const EMR_CREATEPEN: u32 = 38;
pub const EMR_CREATEBRUSHINDIRECT: u32 = 39;
pub const EMR_DELETEOBJECT: u32 = 40;
pub const EMR_ANGLEARC: u32 = 41;
pub const EMR_ELLIPSE: u32 = 42;
pub const EMR_RECTANGLE: u32 = 43;
pub const EMR_ROUNDRECT: u32 = 44;
pub const EMR_ARC: u32 = 45;
pub const EMR_CHORD: u32 = 46;
pub const EMR_PIE: u32 = 47;
pub const EMR_SELECTPALETTE: u32 = 48;
pub const EMR_CREATEPALETTE: u32 = 49;
pub const EMR_EXTFLOODFILL: u32 = 53;
pub const EMR_LINETO: u32 = 54;
pub const EMR_ARCTO: u32 = 55;
pub const EMR_POLYDRAW: u32 = 56;
pub const EMR_SETARCDIRECTION: u32 = 57;
pub const EMR_BEGINPATH: u32 = 59;
pub const EMR_ENDPATH: u32 = 60;
pub const EMR_CLOSEFIGURE: u32 = 61;
pub const EMR_FILLPATH: u32 = 62;
pub const EMR_STROKEANDFILLPATH: u32 = 63;
pub const EMR_STROKEPATH: u32 = 64;
pub const EMR_FLATTENPATH: u32 = 65;
pub const EMR_WIDENPATH: u32 = 66;
pub const EMR_SELECTCLIPPATH: u32 = 67;
pub const EMR_ABORTPATH: u32 = 68;
pub const EMR_GDICOMMENT: u32 = 70;
pub const EMR_FILLRGN: u32 = 71;
pub const EMR_FRAMERGN: u32 = 72;
pub const EMR_INVERTRGN: u32 = 73;
pub const EMR_PAINTRGN: u32 = 74;
pub const EMR_EXTSELECTCLIPRGN: u32 = 75;
pub const EMR_EXTCREATEFONTINDIRECTW: u32 = 82;
pub const EMR_EXTTEXTOUTW: u32 = 84;
pub const EMR_POLYBEZIER16: u32 = 85;
pub const EMR_POLYGON16: u32 = 86;
pub const EMR_POLYLINE16: u32 = 87;
pub const EMR_POLYBEZIERTO16: u32 = 88;
pub const EMR_POLYLINETO16: u32 = 89;
pub const EMR_POLYPOLYLINE16: u32 = 90;
pub const EMR_POLYPOLYGON16: u32 = 91;
pub const EMR_POLYDRAW16: u32 = 92;
pub const EMR_CREATEMONOBRUSH: u32 = 93;
pub const EMR_CREATEDIBPATTERNBRUSHPT: u32 = 94;
pub const EMR_SETLAYOUT: u32 = 115;
pub const EMR_GRADIENTFILL: u32 = 118;
pub const EMR_SETTEXTJUSTIFICATION: u32 = 120;

/// " EMF" read as a little-endian u32
pub const ENHMETA_SIGNATURE: u32 = 0x464D_4520;
pub const ENHMETA_VERSION: u32 = 0x0001_0000;

/// Set on an object index to mark it as a stock object
pub const STOCK_OBJECT_FLAG: u32 = 0x8000_0000;

// Brush styles
pub const BS_SOLID: u32 = 0;
pub const BS_NULL: u32 = 1;
pub const BS_HATCHED: u32 = 2;
pub const BS_PATTERN: u32 = 3;
pub const BS_DIBPATTERN: u32 = 5;

// DIB colour table usage
pub const DIB_RGB_COLORS: u32 = 0;
pub const DIB_PAL_COLORS: u32 = 1;
/// Monochrome pattern stored without its two-entry palette
pub const DIB_PAL_MONO: u32 = 2;

pub const PS_SOLID: u32 = 0;

// Text alignment
pub const TA_LEFT: u32 = 0;
pub const TA_RIGHT: u32 = 2;
pub const TA_CENTER: u32 = 6;
pub const TA_TOP: u32 = 0;
pub const TA_BOTTOM: u32 = 8;
pub const TA_BASELINE: u32 = 24;

pub const GM_COMPATIBLE: u32 = 1;
pub const GM_ADVANCED: u32 = 2;

pub const RGN_AND: u32 = 1;
pub const RGN_OR: u32 = 2;
pub const RGN_XOR: u32 = 3;
pub const RGN_DIFF: u32 = 4;
pub const RGN_COPY: u32 = 5;

pub const MWT_IDENTITY: u32 = 1;
pub const MWT_LEFTMULTIPLY: u32 = 2;
pub const MWT_RIGHTMULTIPLY: u32 = 3;

pub const GRADIENT_FILL_RECT_H: u32 = 0;
pub const GRADIENT_FILL_RECT_V: u32 = 1;
pub const GRADIENT_FILL_TRIANGLE: u32 = 2;

// Poly-draw point types
pub const PT_CLOSEFIGURE: u8 = 0x01;
pub const PT_LINETO: u8 = 0x02;
pub const PT_BEZIERTO: u8 = 0x04;
pub const PT_MOVETO: u8 = 0x06;

pub const PAN_CULTURE_LATIN: u32 = 0;
pub const PAN_NO_FIT: u8 = 1;

/// Get a human-readable name for a record type
pub fn get_record_type_name(record_type: u32) -> &'static str {
    match record_type {
        EMR_HEADER => "EMR_HEADER",
        EMR_POLYBEZIER => "EMR_POLYBEZIER",
        EMR_POLYGON => "EMR_POLYGON",
        EMR_POLYLINE => "EMR_POLYLINE",
        EMR_POLYBEZIERTO => "EMR_POLYBEZIERTO",
        EMR_POLYLINETO => "EMR_POLYLINETO",
        EMR_POLYPOLYLINE => "EMR_POLYPOLYLINE",
        EMR_POLYPOLYGON => "EMR_POLYPOLYGON",
        EMR_SETWINDOWEXTEX => "EMR_SETWINDOWEXTEX",
        EMR_SETWINDOWORGEX => "EMR_SETWINDOWORGEX",
        EMR_SETVIEWPORTEXTEX => "EMR_SETVIEWPORTEXTEX",
        EMR_SETVIEWPORTORGEX => "EMR_SETVIEWPORTORGEX",
        EMR_EOF => "EMR_EOF",
        EMR_SETPIXELV => "EMR_SETPIXELV",
        EMR_SETMAPPERFLAGS => "EMR_SETMAPPERFLAGS",
        EMR_SETMAPMODE => "EMR_SETMAPMODE",
        EMR_SETBKMODE => "EMR_SETBKMODE",
        EMR_SETPOLYFILLMODE => "EMR_SETPOLYFILLMODE",
        EMR_SETROP2 => "EMR_SETROP2",
        EMR_SETSTRETCHBLTMODE => "EMR_SETSTRETCHBLTMODE",
        EMR_SETTEXTALIGN => "EMR_SETTEXTALIGN",
        EMR_SETTEXTCOLOR => "EMR_SETTEXTCOLOR",
        EMR_SETBKCOLOR => "EMR_SETBKCOLOR",
        EMR_OFFSETCLIPRGN => "EMR_OFFSETCLIPRGN",
        EMR_MOVETOEX => "EMR_MOVETOEX",
        EMR_EXCLUDECLIPRECT => "EMR_EXCLUDECLIPRECT",
        EMR_INTERSECTCLIPRECT => "EMR_INTERSECTCLIPRECT",
        EMR_SCALEVIEWPORTEXTEX => "EMR_SCALEVIEWPORTEXTEX",
        EMR_SCALEWINDOWEXTEX => "EMR_SCALEWINDOWEXTEX",
        EMR_SAVEDC => "EMR_SAVEDC",
        EMR_RESTOREDC => "EMR_RESTOREDC",
        EMR_SETWORLDTRANSFORM => "EMR_SETWORLDTRANSFORM",
        EMR_MODIFYWORLDTRANSFORM => "EMR_MODIFYWORLDTRANSFORM",
        EMR_SELECTOBJECT => "EMR_SELECTOBJECT",
        EMR_CREATEPEN => "EMR_CREATEPEN",
        EMR_CREATEBRUSHINDIRECT => "EMR_CREATEBRUSHINDIRECT",
        EMR_DELETEOBJECT => "EMR_DELETEOBJECT",
        EMR_ANGLEARC => "EMR_ANGLEARC",
        EMR_ELLIPSE => "EMR_ELLIPSE",
        EMR_RECTANGLE => "EMR_RECTANGLE",
        EMR_ROUNDRECT => "EMR_ROUNDRECT",
        EMR_ARC => "EMR_ARC",
        EMR_CHORD => "EMR_CHORD",
        EMR_PIE => "EMR_PIE",
        EMR_SELECTPALETTE => "EMR_SELECTPALETTE",
        EMR_CREATEPALETTE => "EMR_CREATEPALETTE",
        EMR_EXTFLOODFILL => "EMR_EXTFLOODFILL",
        EMR_LINETO => "EMR_LINETO",
        EMR_ARCTO => "EMR_ARCTO",
        EMR_POLYDRAW => "EMR_POLYDRAW",
        EMR_SETARCDIRECTION => "EMR_SETARCDIRECTION",
        EMR_BEGINPATH => "EMR_BEGINPATH",
        EMR_ENDPATH => "EMR_ENDPATH",
        EMR_CLOSEFIGURE => "EMR_CLOSEFIGURE",
        EMR_FILLPATH => "EMR_FILLPATH",
        EMR_STROKEANDFILLPATH => "EMR_STROKEANDFILLPATH",
        EMR_STROKEPATH => "EMR_STROKEPATH",
        EMR_FLATTENPATH => "EMR_FLATTENPATH",
        EMR_WIDENPATH => "EMR_WIDENPATH",
        EMR_SELECTCLIPPATH => "EMR_SELECTCLIPPATH",
        EMR_ABORTPATH => "EMR_ABORTPATH",
        EMR_GDICOMMENT => "EMR_GDICOMMENT",
        EMR_FILLRGN => "EMR_FILLRGN",
        EMR_FRAMERGN => "EMR_FRAMERGN",
        EMR_INVERTRGN => "EMR_INVERTRGN",
        EMR_PAINTRGN => "EMR_PAINTRGN",
        EMR_EXTSELECTCLIPRGN => "EMR_EXTSELECTCLIPRGN",
        EMR_EXTCREATEFONTINDIRECTW => "EMR_EXTCREATEFONTINDIRECTW",
        EMR_EXTTEXTOUTW => "EMR_EXTTEXTOUTW",
        EMR_POLYBEZIER16 => "EMR_POLYBEZIER16",
        EMR_POLYGON16 => "EMR_POLYGON16",
        EMR_POLYLINE16 => "EMR_POLYLINE16",
        EMR_POLYBEZIERTO16 => "EMR_POLYBEZIERTO16",
        EMR_POLYLINETO16 => "EMR_POLYLINETO16",
        EMR_POLYPOLYLINE16 => "EMR_POLYPOLYLINE16",
        EMR_POLYPOLYGON16 => "EMR_POLYPOLYGON16",
        EMR_POLYDRAW16 => "EMR_POLYDRAW16",
        EMR_CREATEMONOBRUSH => "EMR_CREATEMONOBRUSH",
        EMR_CREATEDIBPATTERNBRUSHPT => "EMR_CREATEDIBPATTERNBRUSHPT",
        EMR_SETLAYOUT => "EMR_SETLAYOUT",
        EMR_GRADIENTFILL => "EMR_GRADIENTFILL",
        EMR_SETTEXTJUSTIFICATION => "EMR_SETTEXTJUSTIFICATION",
        _ => "UNKNOWN",
    }
}

/// Type tag of the 16-bit point variant of a point-array record.
///
/// Returns `None` for record types that have no short form.
pub fn short_point_variant(record_type: u32) -> Option<u32> {
    match record_type {
        EMR_POLYBEZIER => Some(EMR_POLYBEZIER16),
        EMR_POLYGON => Some(EMR_POLYGON16),
        EMR_POLYLINE => Some(EMR_POLYLINE16),
        EMR_POLYBEZIERTO => Some(EMR_POLYBEZIERTO16),
        EMR_POLYLINETO => Some(EMR_POLYLINETO16),
        EMR_POLYPOLYLINE => Some(EMR_POLYPOLYLINE16),
        EMR_POLYPOLYGON => Some(EMR_POLYPOLYGON16),
        EMR_POLYDRAW => Some(EMR_POLYDRAW16),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_variants_keep_fixed_offset() {
        assert_eq!(short_point_variant(EMR_POLYLINE), Some(EMR_POLYLINE16));
        assert_eq!(short_point_variant(EMR_POLYPOLYGON), Some(EMR_POLYPOLYGON16));
        assert_eq!(short_point_variant(EMR_POLYDRAW), Some(EMR_POLYDRAW16));
        assert_eq!(short_point_variant(EMR_RECTANGLE), None);
        assert_eq!(EMR_POLYLINE16 - EMR_POLYLINE, EMR_POLYBEZIER16 - EMR_POLYBEZIER);
    }

    #[test]
    fn test_record_names() {
        assert_eq!(get_record_type_name(EMR_EOF), "EMR_EOF");
        assert_eq!(get_record_type_name(EMR_GDICOMMENT), "EMR_GDICOMMENT");
        assert_eq!(get_record_type_name(9999), "UNKNOWN");
    }
}
