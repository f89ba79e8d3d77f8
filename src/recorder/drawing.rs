//! Geometry records: lines, curves, shapes, regions, gradients, paths

use super::Recorder;
use crate::emf_records::*;
use crate::error::{RecorderError, RecorderResult};
use crate::record::Record;
use crate::surface::{fetch_region_data, Surface};
use crate::types::{ColorRef, ObjectRef, Point, Rect, RegionData, SizeL, TriVertex};
use log::warn;

fn invalid(message: impl Into<String>) -> RecorderError {
    let message = message.into();
    warn!("{}", message);
    RecorderError::InvalidArgument(message)
}

impl<S: Surface> Recorder<S> {
    pub fn move_to(&mut self, point: Point) -> RecorderResult<()> {
        self.emit(&Record::Point(EMR_MOVETOEX, point))
    }

    /// Line from the current position to `point`
    pub fn line_to(&mut self, point: Point) -> RecorderResult<()> {
        let from = self.surface.current_position();
        let bounds = Rect::new(from.x, from.y, point.x, point.y).normalized();
        self.emit_shape(&Record::Point(EMR_LINETO, point), bounds)
    }

    pub fn arc(&mut self, rect: Rect, start: Point, end: Point) -> RecorderResult<()> {
        self.arc_chord_pie(EMR_ARC, rect, start, end)
    }

    pub fn arc_to(&mut self, rect: Rect, start: Point, end: Point) -> RecorderResult<()> {
        self.arc_chord_pie(EMR_ARCTO, rect, start, end)
    }

    pub fn chord(&mut self, rect: Rect, start: Point, end: Point) -> RecorderResult<()> {
        self.arc_chord_pie(EMR_CHORD, rect, start, end)
    }

    pub fn pie(&mut self, rect: Rect, start: Point, end: Point) -> RecorderResult<()> {
        self.arc_chord_pie(EMR_PIE, rect, start, end)
    }

    fn arc_chord_pie(
        &mut self,
        kind: u32,
        rect: Rect,
        start: Point,
        end: Point,
    ) -> RecorderResult<()> {
        let rect = self.shape_box(rect)?;
        self.emit_shape(
            &Record::Arc {
                kind,
                rect,
                start,
                end,
            },
            rect,
        )
    }

    /// Arc of a circle; angles are in degrees
    pub fn angle_arc(
        &mut self,
        center: Point,
        radius: u32,
        start: f32,
        sweep: f32,
    ) -> RecorderResult<()> {
        let r = radius.min(i32::MAX as u32) as i32;
        let bounds = Rect::new(
            center.x.saturating_sub(r),
            center.y.saturating_sub(r),
            center.x.saturating_add(r),
            center.y.saturating_add(r),
        );
        self.emit_shape(
            &Record::AngleArc {
                center,
                radius,
                start,
                sweep,
            },
            bounds,
        )
    }

    pub fn ellipse(&mut self, rect: Rect) -> RecorderResult<()> {
        let rect = self.shape_box(rect)?;
        self.emit_shape(&Record::Rect(EMR_ELLIPSE, rect), rect)
    }

    pub fn rectangle(&mut self, rect: Rect) -> RecorderResult<()> {
        let rect = self.shape_box(rect)?;
        self.emit_shape(&Record::Rect(EMR_RECTANGLE, rect), rect)
    }

    /// Rectangle with corners rounded by an ellipse of size `corner`
    pub fn round_rect(&mut self, rect: Rect, corner: SizeL) -> RecorderResult<()> {
        let rect = self.shape_box(rect)?;
        self.emit_shape(&Record::RoundRect { rect, corner }, rect)
    }

    pub fn set_pixel(&mut self, point: Point, color: ColorRef) -> RecorderResult<()> {
        let bounds = Rect::new(point.x, point.y, point.x, point.y);
        self.emit_shape(&Record::SetPixel { point, color }, bounds)
    }

    pub fn polyline(&mut self, points: &[Point]) -> RecorderResult<()> {
        self.poly(EMR_POLYLINE, points)
    }

    /// Polyline starting at the current position
    pub fn polyline_to(&mut self, points: &[Point]) -> RecorderResult<()> {
        self.poly(EMR_POLYLINETO, points)
    }

    pub fn polygon(&mut self, points: &[Point]) -> RecorderResult<()> {
        if points.len() < 2 {
            return Err(invalid(format!("polygon needs 2 points, got {}", points.len())));
        }
        self.poly(EMR_POLYGON, points)
    }

    pub fn poly_bezier(&mut self, points: &[Point]) -> RecorderResult<()> {
        self.poly(EMR_POLYBEZIER, points)
    }

    /// Bezier segments continuing from the current position
    pub fn poly_bezier_to(&mut self, points: &[Point]) -> RecorderResult<()> {
        self.poly(EMR_POLYBEZIERTO, points)
    }

    fn poly(&mut self, kind: u32, points: &[Point]) -> RecorderResult<()> {
        if points.is_empty() {
            return Err(invalid(format!(
                "{} without points",
                get_record_type_name(kind)
            )));
        }
        let bounds = if self.path_open {
            Rect::EMPTY
        } else {
            let from_current = kind == EMR_POLYLINETO || kind == EMR_POLYBEZIERTO;
            let current = self.surface.current_position();
            let start = if from_current { Some(&current) } else { None };
            Rect::from_points(start.into_iter().chain(points)).unwrap_or(Rect::EMPTY)
        };
        self.emit_shape(
            &Record::Poly {
                kind,
                bounds,
                points,
            },
            bounds,
        )
    }

    /// Several polylines; `counts` splits `points` into runs of 2 or more
    pub fn poly_polyline(&mut self, points: &[Point], counts: &[u32]) -> RecorderResult<()> {
        self.poly_poly(EMR_POLYPOLYLINE, points, counts)
    }

    pub fn poly_polygon(&mut self, points: &[Point], counts: &[u32]) -> RecorderResult<()> {
        self.poly_poly(EMR_POLYPOLYGON, points, counts)
    }

    fn poly_poly(&mut self, kind: u32, points: &[Point], counts: &[u32]) -> RecorderResult<()> {
        let total: u64 = counts.iter().map(|c| *c as u64).sum();
        if counts.is_empty() || counts.iter().any(|c| *c < 2) {
            return Err(invalid(format!(
                "{}: every run needs 2 or more points",
                get_record_type_name(kind)
            )));
        }
        if total != points.len() as u64 {
            return Err(invalid(format!(
                "{}: counts cover {} points, {} given",
                get_record_type_name(kind),
                total,
                points.len()
            )));
        }
        let bounds = if self.path_open {
            Rect::EMPTY
        } else {
            Rect::from_points(points).unwrap_or(Rect::EMPTY)
        };
        self.emit_shape(
            &Record::PolyPoly {
                kind,
                bounds,
                counts,
                points,
            },
            bounds,
        )
    }

    /// Mixed lines and Beziers; `types` holds one PT_* flag per point
    pub fn poly_draw(&mut self, points: &[Point], types: &[u8]) -> RecorderResult<()> {
        if points.is_empty() || points.len() != types.len() {
            return Err(invalid(format!(
                "poly draw with {} points and {} types",
                points.len(),
                types.len()
            )));
        }
        let bounds = if self.path_open {
            Rect::EMPTY
        } else {
            Rect::from_points(points).unwrap_or(Rect::EMPTY)
        };
        self.emit_shape(
            &Record::PolyDraw {
                bounds,
                points,
                types,
            },
            bounds,
        )
    }

    pub fn ext_flood_fill(
        &mut self,
        point: Point,
        color: ColorRef,
        mode: u32,
    ) -> RecorderResult<()> {
        self.emit(&Record::ExtFloodFill { point, color, mode })
    }

    pub fn fill_region(&mut self, region: ObjectRef, brush: ObjectRef) -> RecorderResult<()> {
        let (blob, bounds) = self.region_blob(region)?;
        let brush = self.brush_index(brush)?;
        self.emit_with_bounds(
            &Record::FillRgn {
                bounds,
                brush,
                region: &blob,
            },
            bounds,
        )
    }

    /// Border of `width` x `height` around a region
    pub fn frame_region(
        &mut self,
        region: ObjectRef,
        brush: ObjectRef,
        width: i32,
        height: i32,
    ) -> RecorderResult<()> {
        let (blob, bounds) = self.region_blob(region)?;
        let brush = self.brush_index(brush)?;
        self.emit_with_bounds(
            &Record::FrameRgn {
                bounds,
                brush,
                stroke: SizeL::new(width, height),
                region: &blob,
            },
            bounds,
        )
    }

    pub fn paint_region(&mut self, region: ObjectRef) -> RecorderResult<()> {
        self.paint_invert(EMR_PAINTRGN, region)
    }

    pub fn invert_region(&mut self, region: ObjectRef) -> RecorderResult<()> {
        self.paint_invert(EMR_INVERTRGN, region)
    }

    fn paint_invert(&mut self, kind: u32, region: ObjectRef) -> RecorderResult<()> {
        let (blob, bounds) = self.region_blob(region)?;
        self.emit_with_bounds(
            &Record::Rgn {
                kind,
                bounds,
                region: &blob,
            },
            bounds,
        )
    }

    /// Region data plus its inclusive bounding box
    fn region_blob(&self, region: ObjectRef) -> RecorderResult<(Vec<u8>, Rect)> {
        let blob = fetch_region_data(&self.surface, region).ok_or_else(|| {
            warn!("region data query failed for {:?}", region);
            RecorderError::ObjectQuery(region)
        })?;
        let bound = RegionData::bounds_of(&blob).ok_or(RecorderError::ObjectQuery(region))?;
        let bounds = Rect::new(
            bound.left,
            bound.top,
            bound.right.saturating_sub(1),
            bound.bottom.saturating_sub(1),
        );
        Ok((blob, bounds))
    }

    /// Gradient over rectangles (two vertex indices each) or triangles
    /// (three each), depending on `mode`
    pub fn gradient_fill(
        &mut self,
        vertices: &[TriVertex],
        indices: &[u32],
        mode: u32,
    ) -> RecorderResult<()> {
        let per_shape = match mode {
            GRADIENT_FILL_RECT_H | GRADIENT_FILL_RECT_V => 2,
            GRADIENT_FILL_TRIANGLE => 3,
            other => return Err(invalid(format!("gradient mode {}", other))),
        };
        if indices.is_empty() || indices.len() % per_shape != 0 {
            return Err(invalid(format!(
                "{} gradient indices for mode {}",
                indices.len(),
                mode
            )));
        }
        let corners = indices
            .iter()
            .map(|i| {
                vertices
                    .get(*i as usize)
                    .map(|v| Point::new(v.x, v.y))
                    .ok_or_else(|| invalid(format!("gradient vertex {} out of range", i)))
            })
            .collect::<RecorderResult<Vec<_>>>()?;
        let mut bounds = Rect::from_points(&corners).unwrap_or(Rect::EMPTY);
        bounds.right = bounds.right.saturating_sub(1);
        bounds.bottom = bounds.bottom.saturating_sub(1);

        self.emit_with_bounds(
            &Record::GradientFill {
                bounds,
                mode,
                shapes: (indices.len() / per_shape) as u32,
                vertices,
                indices,
            },
            bounds,
        )
    }

    pub fn fill_path(&mut self) -> RecorderResult<()> {
        self.path_paint(EMR_FILLPATH)
    }

    pub fn stroke_path(&mut self) -> RecorderResult<()> {
        self.path_paint(EMR_STROKEPATH)
    }

    pub fn stroke_and_fill_path(&mut self) -> RecorderResult<()> {
        self.path_paint(EMR_STROKEANDFILLPATH)
    }

    /// Bounds come from the realized path, not from the call
    fn path_paint(&mut self, kind: u32) -> RecorderResult<()> {
        let Some(bounds) = self.surface.path_bounds() else {
            warn!("{} without a path", get_record_type_name(kind));
            return Err(RecorderError::NoPath);
        };
        self.emit_with_bounds(&Record::Rect(kind, bounds), bounds)
    }
}
