//! Accumulated device-space bounds of everything drawn

use crate::types::{Point, Rect};

/// Logical to device coordinate conversion
pub trait CoordinateSpace {
    fn lp_to_dp(&self, points: &mut [Point]);
}

/// Identity mapping, for callers that already hold device coordinates
pub struct DeviceSpace;

impl CoordinateSpace for DeviceSpace {
    fn lp_to_dp(&self, _points: &mut [Point]) {}
}

#[derive(Debug, Clone, Copy)]
pub struct BoundsTracker {
    bounds: Rect,
}

impl BoundsTracker {
    pub fn new() -> Self {
        Self { bounds: Rect::EMPTY }
    }

    /// Extend the bounds by a logical rectangle
    pub fn fold(&mut self, rect: &Rect, space: &dyn CoordinateSpace) {
        let mut corners = [
            Point::new(rect.left, rect.top),
            Point::new(rect.right, rect.bottom),
        ];
        space.lp_to_dp(&mut corners);
        // The mapping may mirror an axis
        let device = Rect::new(corners[0].x, corners[0].y, corners[1].x, corners[1].y).normalized();

        if self.bounds.is_empty() {
            self.bounds = device;
        } else {
            self.bounds.left = self.bounds.left.min(device.left);
            self.bounds.top = self.bounds.top.min(device.top);
            self.bounds.right = self.bounds.right.max(device.right);
            self.bounds.bottom = self.bounds.bottom.max(device.bottom);
        }
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }
}

impl Default for BoundsTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Mirror;

    impl CoordinateSpace for Mirror {
        fn lp_to_dp(&self, points: &mut [Point]) {
            for pt in points {
                pt.x = 100 - pt.x;
                pt.y *= 2;
            }
        }
    }

    #[test]
    fn test_first_fold_replaces_sentinel() {
        let mut tracker = BoundsTracker::new();
        assert!(tracker.is_empty());
        tracker.fold(&Rect::new(10, 10, 20, 20), &DeviceSpace);
        assert_eq!(tracker.bounds(), Rect::new(10, 10, 20, 20));
    }

    #[test]
    fn test_fold_takes_component_extremes() {
        let mut tracker = BoundsTracker::new();
        tracker.fold(&Rect::new(10, 10, 20, 20), &DeviceSpace);
        tracker.fold(&Rect::new(5, 25, 15, 15), &DeviceSpace);
        assert_eq!(tracker.bounds(), Rect::new(5, 10, 20, 25));
    }

    #[test]
    fn test_fold_never_shrinks() {
        let mut tracker = BoundsTracker::new();
        tracker.fold(&Rect::new(0, 0, 50, 50), &DeviceSpace);
        tracker.fold(&Rect::new(10, 10, 20, 20), &DeviceSpace);
        assert_eq!(tracker.bounds(), Rect::new(0, 0, 50, 50));
    }

    #[test]
    fn test_mirrored_space_is_resorted() {
        let mut tracker = BoundsTracker::new();
        tracker.fold(&Rect::new(10, 5, 30, 15), &Mirror);
        assert_eq!(tracker.bounds(), Rect::new(70, 10, 90, 30));
    }
}
