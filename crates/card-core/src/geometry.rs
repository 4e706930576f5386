//! Node geometry: position, size, rotation, and bounding boxes.
//!
//! All coordinates are absolute document coordinates. Rotation is in
//! degrees, normalized into `[0, 360)` and applied about the box center.

use serde::{Deserialize, Deserializer, Serialize};

/// Geometry fields present on every node.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Geometry {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(deserialize_with = "rotation_degrees")]
    pub rotation: f32,
}

fn rotation_degrees<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f32, D::Error> {
    f32::deserialize(deserializer).map(normalize_rotation)
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: 100.0,
            height: 100.0,
            rotation: 0.0,
        }
    }
}

impl Geometry {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            rotation: 0.0,
        }
    }

    /// Shift position by `(dx, dy)`.
    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
    }

    /// Fold `rotation` into `[0, 360)`.
    pub fn normalize(&mut self) {
        self.rotation = normalize_rotation(self.rotation);
    }

    pub fn size_eq(&self, other: &Geometry) -> bool {
        self.width == other.width && self.height == other.height
    }
}

/// Fold any angle into `[0, 360)`.
pub fn normalize_rotation(degrees: f32) -> f32 {
    let r = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if r >= 360.0 { 0.0 } else { r }
}

/// Partial geometry update. `None` fields are left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GeometryPatch {
    pub x: Option<f32>,
    pub y: Option<f32>,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub rotation: Option<f32>,
}

impl GeometryPatch {
    pub fn is_empty(&self) -> bool {
        self.x.is_none()
            && self.y.is_none()
            && self.width.is_none()
            && self.height.is_none()
            && self.rotation.is_none()
    }

    /// Whether this patch would change the size of `current`.
    pub fn changes_size(&self, current: &Geometry) -> bool {
        self.width.is_some_and(|w| w != current.width)
            || self.height.is_some_and(|h| h != current.height)
    }

    /// Write the present fields into `geometry`.
    pub fn apply(&self, geometry: &mut Geometry) {
        if let Some(x) = self.x {
            geometry.x = x;
        }
        if let Some(y) = self.y {
            geometry.y = y;
        }
        if let Some(w) = self.width {
            geometry.width = w.max(0.0);
        }
        if let Some(h) = self.height {
            geometry.height = h.max(0.0);
        }
        if let Some(r) = self.rotation {
            geometry.rotation = normalize_rotation(r);
        }
    }

    /// Keep only the fields whose value differs from `current`.
    pub fn diff_against(&self, current: &Geometry) -> GeometryPatch {
        GeometryPatch {
            x: self.x.filter(|v| *v != current.x),
            y: self.y.filter(|v| *v != current.y),
            width: self.width.filter(|v| *v != current.width),
            height: self.height.filter(|v| *v != current.height),
            rotation: self
                .rotation
                .map(normalize_rotation)
                .filter(|v| *v != current.rotation),
        }
    }
}

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Bounds {
    /// Axis-aligned hull of a (possibly rotated) node box.
    pub fn of(g: &Geometry) -> Self {
        if g.rotation == 0.0 {
            return Self {
                min_x: g.x,
                min_y: g.y,
                max_x: g.x + g.width,
                max_y: g.y + g.height,
            };
        }
        let (sin, cos) = g.rotation.to_radians().sin_cos();
        let (cx, cy) = (g.x + g.width / 2.0, g.y + g.height / 2.0);
        let (hw, hh) = (g.width / 2.0, g.height / 2.0);
        let ex = (hw * cos).abs() + (hh * sin).abs();
        let ey = (hw * sin).abs() + (hh * cos).abs();
        Self {
            min_x: cx - ex,
            min_y: cy - ey,
            max_x: cx + ex,
            max_y: cy + ey,
        }
    }

    pub fn union(self, other: Bounds) -> Bounds {
        Bounds {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Union of many boxes; `None` for an empty input.
    pub fn union_all(boxes: impl IntoIterator<Item = Bounds>) -> Option<Bounds> {
        boxes.into_iter().reduce(Bounds::union)
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn contains(&self, other: &Bounds) -> bool {
        self.min_x <= other.min_x
            && self.min_y <= other.min_y
            && self.max_x >= other.max_x
            && self.max_y >= other.max_y
    }

    /// Unrotated geometry covering this box.
    pub fn to_geometry(self) -> Geometry {
        Geometry::new(self.min_x, self.min_y, self.width(), self.height())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rotation_is_normalized() {
        assert_eq!(normalize_rotation(370.0), 10.0);
        assert_eq!(normalize_rotation(-90.0), 270.0);
        assert_eq!(normalize_rotation(360.0), 0.0);
    }

    #[test]
    fn deserialized_rotation_is_normalized() {
        let g: Geometry = serde_json::from_str(r#"{"x": 1, "rotation": 360}"#).unwrap();
        assert_eq!(g.rotation, 0.0);
        assert_eq!(g.width, 100.0);
        let g: Geometry = serde_json::from_str(r#"{"rotation": -45}"#).unwrap();
        assert_eq!(g.rotation, 315.0);
    }

    #[test]
    fn union_covers_both() {
        let a = Bounds::of(&Geometry::new(10.0, 10.0, 100.0, 20.0));
        let b = Bounds::of(&Geometry::new(50.0, 80.0, 30.0, 30.0));
        let u = a.union(b);
        assert_eq!(u.to_geometry(), Geometry::new(10.0, 10.0, 100.0, 100.0));
        assert!(u.contains(&a) && u.contains(&b));
    }

    #[test]
    fn rotated_hull_is_wider() {
        let mut g = Geometry::new(0.0, 0.0, 100.0, 20.0);
        g.rotation = 90.0;
        let b = Bounds::of(&g);
        assert!((b.width() - 20.0).abs() < 1e-3);
        assert!((b.height() - 100.0).abs() < 1e-3);
    }

    #[test]
    fn patch_diff_drops_untouched_values() {
        let current = Geometry::new(10.0, 10.0, 100.0, 20.0);
        let patch = GeometryPatch {
            x: Some(10.0),
            y: Some(40.0),
            ..Default::default()
        };
        let diff = patch.diff_against(&current);
        assert_eq!(diff.x, None);
        assert_eq!(diff.y, Some(40.0));
        assert!(!patch.changes_size(&current));
    }
}
