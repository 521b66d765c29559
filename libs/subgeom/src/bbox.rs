//! Rectangular bounding boxes and associated trait implementations.

use serde::{Deserialize, Serialize};

use super::{Point, Rect};

/// An axis-aligned rectangular bounding box.
///
/// `p0` is always closest to negative-infinity, in both x and y,
/// and `p1` is always closest to positive-infinity.
///
/// This differs from [`Rect`] in that it could be empty, meaning that `p0`
/// is to the upper right of `p1`.
#[derive(Debug, Copy, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Bbox {
    pub p0: Point,
    pub p1: Point,
}

impl Default for Bbox {
    fn default() -> Self {
        Self::empty()
    }
}

impl Bbox {
    /// Create a new [`Bbox`] from two [`Point`]s.
    #[inline]
    pub fn new(p0: Point, p1: Point) -> Self {
        Self {
            p0: Point::new(p0.x.min(p1.x), p0.y.min(p1.y)),
            p1: Point::new(p0.x.max(p1.x), p0.y.max(p1.y)),
        }
    }

    /// Creates an empty, otherwise invalid bounding box.
    pub fn empty() -> Self {
        Self {
            p0: Point::new(i64::MAX, i64::MAX),
            p1: Point::new(i64::MIN, i64::MIN),
        }
    }

    /// Returns `true` if the bounding box is empty.
    pub fn is_empty(&self) -> bool {
        self.p0.x > self.p1.x || self.p0.y > self.p1.y
    }

    #[inline]
    pub fn width(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.p1.x - self.p0.x
        }
    }

    #[inline]
    pub fn height(&self) -> i64 {
        if self.is_empty() {
            0
        } else {
            self.p1.y - self.p0.y
        }
    }

    /// Returns the bounding box's center.
    pub fn center(&self) -> Point {
        Point::new((self.p0.x + self.p1.x) / 2, (self.p0.y + self.p1.y) / 2)
    }

    /// Returns the smallest bounding box containing both `self` and `other`.
    pub fn union(self, other: Bbox) -> Bbox {
        if other.is_empty() {
            return self;
        }
        if self.is_empty() {
            return other;
        }
        Bbox::new(
            Point::new(self.p0.x.min(other.p0.x), self.p0.y.min(other.p0.y)),
            Point::new(self.p1.x.max(other.p1.x), self.p1.y.max(other.p1.y)),
        )
    }

    /// Returns the overlap of `self` and `other`, which may be empty.
    pub fn intersection(self, other: Bbox) -> Bbox {
        let pmin = Point::new(self.p0.x.max(other.p0.x), self.p0.y.max(other.p0.y));
        let pmax = Point::new(self.p1.x.min(other.p1.x), self.p1.y.min(other.p1.y));
        if pmin.x > pmax.x || pmin.y > pmax.y {
            return Bbox::empty();
        }
        Bbox::new(pmin, pmax)
    }

    /// Converts a bounding box into a [`Rect`], returning [`None`] if it is empty.
    #[inline]
    pub fn into_rect(self) -> Option<Rect> {
        if self.is_empty() {
            None
        } else {
            Some(Rect::new(self.p0, self.p1))
        }
    }
}

impl From<Rect> for Bbox {
    fn from(r: Rect) -> Self {
        Self { p0: r.p0, p1: r.p1 }
    }
}

/// A trait representing functions available for objects with a bounding box.
pub trait BoundBox {
    /// Compute a rectangular bounding box around the implementing type.
    fn bbox(&self) -> Bbox;

    /// Computes the rectangular bounding box and converts it to a [`Rect`].
    ///
    /// Returns [`None`] if the bounding box is empty.
    fn brect(&self) -> Option<Rect> {
        self.bbox().into_rect()
    }
}

impl<T> BoundBox for &T
where
    T: BoundBox,
{
    fn bbox(&self) -> Bbox {
        T::bbox(*self)
    }
}

impl BoundBox for Bbox {
    fn bbox(&self) -> Bbox {
        *self
    }
}

impl BoundBox for Point {
    fn bbox(&self) -> Bbox {
        Bbox::new(*self, *self)
    }
}

impl BoundBox for Rect {
    fn bbox(&self) -> Bbox {
        Bbox::from(*self)
    }
}

impl<T> BoundBox for [T]
where
    T: BoundBox,
{
    fn bbox(&self) -> Bbox {
        self.iter()
            .fold(Bbox::empty(), |acc, item| acc.union(item.bbox()))
    }
}

impl<T> BoundBox for Vec<T>
where
    T: BoundBox,
{
    fn bbox(&self) -> Bbox {
        self.as_slice().bbox()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_union_with_empty() {
        let r = Rect::new(Point::new(-5, -5), Point::new(10, 20));
        assert_eq!(Bbox::empty().union(r.bbox()), r.bbox());
        assert_eq!(r.bbox().union(Bbox::empty()), r.bbox());
        assert_eq!(Bbox::empty().width(), 0);
        assert!(Bbox::empty().into_rect().is_none());
    }

    #[test]
    fn test_vec_bbox() {
        let rects = vec![
            Rect::new(Point::new(0, 0), Point::new(10, 10)),
            Rect::new(Point::new(20, -10), Point::new(30, 0)),
        ];
        let bbox = rects.bbox();
        assert_eq!(bbox.p0, Point::new(0, -10));
        assert_eq!(bbox.p1, Point::new(30, 10));
        assert_eq!(bbox.center(), Point::new(15, 0));
    }

    #[test]
    fn test_intersection() {
        let a = Rect::new(Point::new(0, 0), Point::new(10, 10)).bbox();
        let b = Rect::new(Point::new(5, 5), Point::new(20, 20)).bbox();
        assert_eq!(
            a.intersection(b),
            Bbox::new(Point::new(5, 5), Point::new(10, 10))
        );
        let c = Rect::new(Point::new(50, 50), Point::new(60, 60)).bbox();
        assert!(a.intersection(c).is_empty());
    }
}
