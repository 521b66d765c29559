//! Translation traits.

use super::{Point, Rect};

/// A trait for specifying how a shape is translated in place by a [`Point`].
pub trait Translate {
    fn translate(&mut self, p: Point);
}

/// A trait for specifying how a shape is translated by a [`Point`], consuming the shape.
pub trait TranslateOwned {
    fn translate_owned(self, p: Point) -> Self;
}

impl Translate for Point {
    fn translate(&mut self, p: Point) {
        self.x += p.x;
        self.y += p.y;
    }
}

impl TranslateOwned for Point {
    fn translate_owned(mut self, p: Point) -> Self {
        self.translate(p);
        self
    }
}

impl Translate for Rect {
    fn translate(&mut self, p: Point) {
        self.p0.translate(p);
        self.p1.translate(p);
    }
}

impl TranslateOwned for Rect {
    fn translate_owned(mut self, p: Point) -> Self {
        self.translate(p);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_rect() {
        let r = Rect::new(Point::new(0, 0), Point::new(10, 5));
        let moved = r.translate_owned(Point::new(-20, 15));
        assert_eq!(moved.p0, Point::new(-20, 15));
        assert_eq!(moved.p1, Point::new(-10, 20));
        assert_eq!(moved.dims(), r.dims());
    }
}
