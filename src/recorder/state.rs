//! State records: modes, colours, mapping, transforms, clipping, paths,
//! save/restore and comments

use super::Recorder;
use crate::emf_records::*;
use crate::error::{RecorderError, RecorderResult};
use crate::record::Record;
use crate::surface::{fetch_region_data, Surface};
use crate::types::{ColorRef, ObjectRef, Point, Rect, SizeL, XForm};
use log::warn;

impl<S: Surface> Recorder<S> {
    pub fn save_dc(&mut self) -> RecorderResult<()> {
        self.emit(&Record::Empty(EMR_SAVEDC))?;
        self.save_depth += 1;
        Ok(())
    }

    /// Restore a saved state.
    ///
    /// A negative `level` is relative to the current depth, a positive one
    /// names an absolute save level. Zero, or a level deeper than what was
    /// saved, fails.
    pub fn restore_dc(&mut self, level: i32) -> RecorderResult<()> {
        if level == 0 || level.unsigned_abs() > self.save_depth as u32 {
            warn!("restore to {} with save depth {}", level, self.save_depth);
            return Err(RecorderError::InvalidRestoreLevel {
                level,
                depth: self.save_depth,
            });
        }
        let relative = if level < 0 {
            level
        } else {
            level - self.save_depth - 1
        };
        self.emit(&Record::RestoreDc(relative))?;
        self.save_depth += relative;
        Ok(())
    }

    pub fn set_text_align(&mut self, align: u32) -> RecorderResult<()> {
        self.emit(&Record::Value(EMR_SETTEXTALIGN, align))
    }

    pub fn set_text_justification(&mut self, extra: i32, breaks: i32) -> RecorderResult<()> {
        self.emit(&Record::TextJustification { extra, breaks })
    }

    pub fn set_bk_mode(&mut self, mode: u32) -> RecorderResult<()> {
        self.emit(&Record::Value(EMR_SETBKMODE, mode))
    }

    pub fn set_bk_color(&mut self, color: ColorRef) -> RecorderResult<()> {
        self.emit(&Record::Value(EMR_SETBKCOLOR, color.0))
    }

    pub fn set_text_color(&mut self, color: ColorRef) -> RecorderResult<()> {
        self.emit(&Record::Value(EMR_SETTEXTCOLOR, color.0))
    }

    pub fn set_rop2(&mut self, rop: u32) -> RecorderResult<()> {
        self.emit(&Record::Value(EMR_SETROP2, rop))
    }

    pub fn set_poly_fill_mode(&mut self, mode: u32) -> RecorderResult<()> {
        self.emit(&Record::Value(EMR_SETPOLYFILLMODE, mode))
    }

    pub fn set_stretch_blt_mode(&mut self, mode: u32) -> RecorderResult<()> {
        self.emit(&Record::Value(EMR_SETSTRETCHBLTMODE, mode))
    }

    pub fn set_arc_direction(&mut self, direction: u32) -> RecorderResult<()> {
        self.emit(&Record::Value(EMR_SETARCDIRECTION, direction))
    }

    pub fn set_map_mode(&mut self, mode: u32) -> RecorderResult<()> {
        self.emit(&Record::Value(EMR_SETMAPMODE, mode))
    }

    pub fn set_layout(&mut self, layout: u32) -> RecorderResult<()> {
        self.emit(&Record::Value(EMR_SETLAYOUT, layout))
    }

    pub fn set_mapper_flags(&mut self, flags: u32) -> RecorderResult<()> {
        self.emit(&Record::Value(EMR_SETMAPPERFLAGS, flags))
    }

    pub fn exclude_clip_rect(&mut self, rect: Rect) -> RecorderResult<()> {
        self.emit(&Record::Rect(EMR_EXCLUDECLIPRECT, rect))
    }

    pub fn intersect_clip_rect(&mut self, rect: Rect) -> RecorderResult<()> {
        self.emit(&Record::Rect(EMR_INTERSECTCLIPRECT, rect))
    }

    pub fn offset_clip_region(&mut self, offset: Point) -> RecorderResult<()> {
        self.emit(&Record::Point(EMR_OFFSETCLIPRGN, offset))
    }

    /// Combine a region into the clip region with an RGN_* mode.
    /// `None` resets the clip and is only valid with RGN_COPY.
    pub fn ext_select_clip_region(
        &mut self,
        region: Option<ObjectRef>,
        mode: u32,
    ) -> RecorderResult<()> {
        let blob = match region {
            Some(region) => fetch_region_data(&self.surface, region)
                .ok_or(RecorderError::ObjectQuery(region))?,
            None if mode == RGN_COPY => Vec::new(),
            None => {
                warn!("clip reset with mode {}", mode);
                return Err(RecorderError::InvalidArgument(format!(
                    "no region for clip mode {}",
                    mode
                )));
            }
        };
        self.emit(&Record::ExtSelectClipRgn {
            mode,
            region: &blob,
        })
    }

    pub fn set_viewport_ext(&mut self, ext: SizeL) -> RecorderResult<()> {
        self.emit(&Record::Size(EMR_SETVIEWPORTEXTEX, ext))
    }

    pub fn set_window_ext(&mut self, ext: SizeL) -> RecorderResult<()> {
        self.emit(&Record::Size(EMR_SETWINDOWEXTEX, ext))
    }

    pub fn set_viewport_org(&mut self, org: Point) -> RecorderResult<()> {
        self.emit(&Record::Point(EMR_SETVIEWPORTORGEX, org))
    }

    pub fn set_window_org(&mut self, org: Point) -> RecorderResult<()> {
        self.emit(&Record::Point(EMR_SETWINDOWORGEX, org))
    }

    pub fn scale_viewport_ext(
        &mut self,
        x_num: i32,
        x_denom: i32,
        y_num: i32,
        y_denom: i32,
    ) -> RecorderResult<()> {
        self.emit(&Record::ScaleExtent {
            kind: EMR_SCALEVIEWPORTEXTEX,
            x_num,
            x_denom,
            y_num,
            y_denom,
        })
    }

    pub fn scale_window_ext(
        &mut self,
        x_num: i32,
        x_denom: i32,
        y_num: i32,
        y_denom: i32,
    ) -> RecorderResult<()> {
        self.emit(&Record::ScaleExtent {
            kind: EMR_SCALEWINDOWEXTEX,
            x_num,
            x_denom,
            y_num,
            y_denom,
        })
    }

    pub fn set_world_transform(&mut self, xform: &XForm) -> RecorderResult<()> {
        self.emit(&Record::SetWorldTransform(*xform))
    }

    /// MWT_IDENTITY ignores `xform` and records the identity matrix
    pub fn modify_world_transform(&mut self, xform: &XForm, mode: u32) -> RecorderResult<()> {
        let xform = if mode == MWT_IDENTITY {
            XForm::identity()
        } else {
            *xform
        };
        self.emit(&Record::ModifyWorldTransform(xform, mode))
    }

    pub fn begin_path(&mut self) -> RecorderResult<()> {
        self.emit(&Record::Empty(EMR_BEGINPATH))?;
        self.path_open = true;
        Ok(())
    }

    pub fn end_path(&mut self) -> RecorderResult<()> {
        self.path_open = false;
        self.emit(&Record::Empty(EMR_ENDPATH))
    }

    pub fn abort_path(&mut self) -> RecorderResult<()> {
        self.path_open = false;
        self.emit(&Record::Empty(EMR_ABORTPATH))
    }

    pub fn close_figure(&mut self) -> RecorderResult<()> {
        self.emit(&Record::Empty(EMR_CLOSEFIGURE))
    }

    pub fn flatten_path(&mut self) -> RecorderResult<()> {
        self.emit(&Record::Empty(EMR_FLATTENPATH))
    }

    pub fn widen_path(&mut self) -> RecorderResult<()> {
        self.emit(&Record::Empty(EMR_WIDENPATH))
    }

    pub fn select_clip_path(&mut self, mode: u32) -> RecorderResult<()> {
        self.emit(&Record::Value(EMR_SELECTCLIPPATH, mode))
    }

    /// Opaque application data, zero-padded to 4 bytes
    pub fn comment(&mut self, data: &[u8]) -> RecorderResult<()> {
        if data.len() > u32::MAX as usize - 16 {
            return Err(RecorderError::RecordTooLarge(data.len()));
        }
        self.emit(&Record::Comment(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MetafileOptions;
    use crate::testing::MockSurface;
    use crate::types::RegionData;
    use byteorder::{ByteOrder, LittleEndian};

    fn open() -> Recorder<MockSurface> {
        Recorder::open(MockSurface::new(), MetafileOptions::new()).unwrap()
    }

    fn tail(recorder: &Recorder<MockSurface>, n: usize) -> Vec<u8> {
        let bytes = recorder.as_bytes();
        bytes[bytes.len() - n..].to_vec()
    }

    #[test]
    fn test_restore_levels() {
        let mut recorder = open();
        assert!(matches!(
            recorder.restore_dc(-1),
            Err(RecorderError::InvalidRestoreLevel { level: -1, depth: 0 })
        ));
        recorder.save_dc().unwrap();
        recorder.save_dc().unwrap();
        recorder.save_dc().unwrap();
        assert!(recorder.restore_dc(0).is_err());
        assert!(recorder.restore_dc(4).is_err());
        assert!(recorder.restore_dc(-4).is_err());
        let records = recorder.record_count();

        // Back to absolute level 2 pops the third and second saves
        recorder.restore_dc(2).unwrap();
        assert_eq!(LittleEndian::read_i32(&tail(&recorder, 4)), -2);
        assert_eq!(recorder.save_depth(), 1);
        assert_eq!(recorder.record_count(), records + 1);

        recorder.save_dc().unwrap();
        recorder.restore_dc(-2).unwrap();
        assert_eq!(LittleEndian::read_i32(&tail(&recorder, 4)), -2);
        assert_eq!(recorder.save_depth(), 0);
    }

    #[test]
    fn test_value_setters() {
        let mut recorder = open();
        recorder.set_text_color(ColorRef::rgb(0x12, 0x34, 0x56)).unwrap();
        let record = tail(&recorder, 12);
        assert_eq!(LittleEndian::read_u32(&record[0..4]), EMR_SETTEXTCOLOR);
        assert_eq!(LittleEndian::read_u32(&record[4..8]), 12);
        assert_eq!(LittleEndian::read_u32(&record[8..12]), 0x0056_3412);

        recorder.set_map_mode(8).unwrap();
        recorder.set_bk_mode(1).unwrap();
        recorder.set_layout(1).unwrap();
        assert_eq!(LittleEndian::read_u32(&tail(&recorder, 12)[0..4]), EMR_SETLAYOUT);
        recorder.set_text_justification(10, 3).unwrap();
        assert_eq!(tail(&recorder, 16)[4], 16);
        recorder.set_viewport_ext(SizeL::new(640, 480)).unwrap();
        assert_eq!(LittleEndian::read_i32(&tail(&recorder, 4)), 480);
        recorder.scale_window_ext(1, 2, 3, 4).unwrap();
        assert_eq!(tail(&recorder, 24)[4], 24);
        assert_eq!(recorder.record_count(), 8);
    }

    #[test]
    fn test_modify_identity_ignores_matrix() {
        let mut recorder = open();
        let skew = XForm {
            m11: 2.0,
            m12: 0.5,
            m21: 0.0,
            m22: 2.0,
            dx: 10.0,
            dy: 20.0,
        };
        recorder.modify_world_transform(&skew, MWT_IDENTITY).unwrap();
        let record = tail(&recorder, 36);
        assert_eq!(LittleEndian::read_f32(&record[8..12]), 1.0);
        assert_eq!(LittleEndian::read_f32(&record[28..32]), 0.0);
        assert_eq!(LittleEndian::read_u32(&record[32..36]), MWT_IDENTITY);

        recorder.modify_world_transform(&skew, MWT_LEFTMULTIPLY).unwrap();
        let record = tail(&recorder, 36);
        assert_eq!(LittleEndian::read_f32(&record[8..12]), 2.0);
        assert_eq!(LittleEndian::read_f32(&record[28..32]), 20.0);

        recorder.set_world_transform(&skew).unwrap();
        assert_eq!(tail(&recorder, 32)[4], 32);
    }

    #[test]
    fn test_clip_region_selection() {
        let mut recorder = open();
        assert!(recorder.ext_select_clip_region(None, RGN_AND).is_err());
        recorder.ext_select_clip_region(None, RGN_COPY).unwrap();
        let record = tail(&recorder, 16);
        assert_eq!(LittleEndian::read_u32(&record[4..8]), 16);
        assert_eq!(LittleEndian::read_u32(&record[8..12]), 0);
        assert_eq!(LittleEndian::read_u32(&record[12..16]), RGN_COPY);

        let region = recorder.surface_mut().add_region(RegionData {
            bounds: Rect::new(0, 0, 5, 5),
            rects: vec![Rect::new(0, 0, 5, 5)],
        });
        recorder.ext_select_clip_region(Some(region), RGN_OR).unwrap();
        let record = tail(&recorder, 16 + 48);
        assert_eq!(LittleEndian::read_u32(&record[0..4]), EMR_EXTSELECTCLIPRGN);
        assert_eq!(LittleEndian::read_u32(&record[8..12]), 48);
        // Clipping never extends the bounds
        assert!(recorder.bounds().is_empty());
    }

    #[test]
    fn test_path_flag_follows_brackets() {
        let mut recorder = open();
        recorder.begin_path().unwrap();
        assert!(recorder.path_open());
        recorder.close_figure().unwrap();
        recorder.end_path().unwrap();
        assert!(!recorder.path_open());
        recorder.begin_path().unwrap();
        recorder.abort_path().unwrap();
        assert!(!recorder.path_open());
        recorder.widen_path().unwrap();
        recorder.flatten_path().unwrap();
        recorder.select_clip_path(RGN_AND).unwrap();
        assert_eq!(recorder.byte_length(), 108 + 8 * 7 + 12);
    }

    #[test]
    fn test_clip_rects_and_offset() {
        let mut recorder = open();
        recorder.intersect_clip_rect(Rect::new(0, 0, 100, 100)).unwrap();
        recorder.exclude_clip_rect(Rect::new(10, 10, 20, 20)).unwrap();
        recorder.offset_clip_region(Point::new(3, -3)).unwrap();
        assert_eq!(recorder.byte_length(), 108 + 24 + 24 + 16);
        assert!(recorder.bounds().is_empty());
    }

    #[test]
    fn test_comment_is_padded() {
        let mut recorder = open();
        recorder.comment(&[1, 2, 3, 4, 5, 6]).unwrap();
        let record = tail(&recorder, 20);
        assert_eq!(LittleEndian::read_u32(&record[0..4]), EMR_GDICOMMENT);
        assert_eq!(LittleEndian::read_u32(&record[8..12]), 6);
        assert_eq!(&record[12..20], &[1, 2, 3, 4, 5, 6, 0, 0]);
    }
}
