//! Rectangular ring geometry.
//!
//! Used for drawing structures that enclose other structures,
//! such as guard rings and substrate taps.

use array_map::ArrayMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::bbox::{Bbox, BoundBox};
use super::transform::{Translate, TranslateOwned};
use super::{Corner, Point, Rect, ShapeTrait, Side, Sign, Span};

/// A rectangular ring surrounding an enclosed rectangle.
#[derive(
    Debug, Default, Copy, Clone, Hash, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord,
)]
pub struct Ring {
    /// Vertical span of top segment.
    topv: Span,
    /// Vertical span of bottom segment.
    botv: Span,
    /// Horizontal span of left segment.
    lefth: Span,
    /// Horizontal span of right segment.
    righth: Span,
}

/// Represents all ways [`Ring`] geometry can be specified.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub enum RingContents {
    /// The ring must fit within the given rectangle.
    Outer(Rect),
    /// The ring must enclose the given rectangle.
    Inner(Rect),
}

impl RingContents {
    pub fn rect(&self) -> Rect {
        match self {
            Self::Outer(r) | Self::Inner(r) => *r,
        }
    }

    pub fn is_outer(&self) -> bool {
        matches!(self, Self::Outer(_))
    }
}

/// Errors produced when building a [`Ring`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RingError {
    #[error("ring contents were not specified")]
    MissingContents,
    #[error("ring side widths must be positive, got {0:?}")]
    NonPositiveWidth(Side),
    #[error("ring segments overlap: outer rect {0:?} is too small for the requested widths")]
    Overlapping(Rect),
}

#[derive(Debug, Default, Copy, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RingBuilder {
    contents: Option<RingContents>,
    widths: ArrayMap<Side, i64, 4>,
}

impl Ring {
    #[inline]
    pub fn builder() -> RingBuilder {
        RingBuilder::new()
    }

    fn is_valid(&self) -> bool {
        self.topv.start() > self.botv.stop() && self.righth.start() > self.lefth.stop()
    }

    pub fn outer_hspan(&self) -> Span {
        Span::new(self.lefth.start(), self.righth.stop())
    }

    pub fn inner_hspan(&self) -> Span {
        Span::new(self.lefth.stop(), self.righth.start())
    }

    pub fn outer_vspan(&self) -> Span {
        Span::new(self.botv.start(), self.topv.stop())
    }

    pub fn inner_vspan(&self) -> Span {
        Span::new(self.botv.stop(), self.topv.start())
    }

    pub fn outer(&self) -> Rect {
        Rect::from_spans(self.outer_hspan(), self.outer_vspan())
    }

    pub fn inner(&self) -> Rect {
        Rect::from_spans(self.inner_hspan(), self.inner_vspan())
    }

    /// The full-length segment on the given side, including both corners.
    #[inline]
    pub fn rect(&self, side: Side) -> Rect {
        match side {
            Side::Top => Rect::from_spans(self.outer_hspan(), self.topv),
            Side::Right => Rect::from_spans(self.righth, self.outer_vspan()),
            Side::Bot => Rect::from_spans(self.outer_hspan(), self.botv),
            Side::Left => Rect::from_spans(self.lefth, self.outer_vspan()),
        }
    }

    /// The segment on the given side, excluding the corners.
    #[inline]
    pub fn inner_rect(&self, side: Side) -> Rect {
        match side {
            Side::Top => Rect::from_spans(self.inner_hspan(), self.topv),
            Side::Right => Rect::from_spans(self.righth, self.inner_vspan()),
            Side::Bot => Rect::from_spans(self.inner_hspan(), self.botv),
            Side::Left => Rect::from_spans(self.lefth, self.inner_vspan()),
        }
    }

    #[inline]
    pub fn corner(&self, corner: Corner) -> Rect {
        match corner {
            Corner::LowerLeft => Rect::from_spans(self.lefth, self.botv),
            Corner::UpperLeft => Rect::from_spans(self.lefth, self.topv),
            Corner::LowerRight => Rect::from_spans(self.righth, self.botv),
            Corner::UpperRight => Rect::from_spans(self.righth, self.topv),
        }
    }

    #[inline]
    pub fn rects(&self) -> [Rect; 4] {
        Side::ALL.map(|side| self.rect(side))
    }

    /// The [`Rect`]s going in the horizontal direction (ie. the bottom and top rectangles).
    #[inline]
    pub fn hrects(&self) -> [Rect; 2] {
        [self.rect(Side::Bot), self.rect(Side::Top)]
    }

    /// The [`Rect`]s going in the vertical direction (ie. the left and right rectangles).
    #[inline]
    pub fn vrects(&self) -> [Rect; 2] {
        [self.rect(Side::Left), self.rect(Side::Right)]
    }
}

impl BoundBox for Ring {
    #[inline]
    fn bbox(&self) -> Bbox {
        self.outer().bbox()
    }
}

impl ShapeTrait for Ring {
    fn point0(&self) -> Point {
        self.outer().p0
    }

    fn contains(&self, pt: Point) -> bool {
        self.rects().into_iter().any(move |r| r.contains(pt))
    }

    fn is_on_grid(&self, grid: i64) -> bool {
        self.outer().is_on_grid(grid) && self.inner().is_on_grid(grid)
    }
}

impl Translate for Ring {
    fn translate(&mut self, p: Point) {
        *self = self.translate_owned(p);
    }
}

impl TranslateOwned for Ring {
    fn translate_owned(self, p: Point) -> Self {
        Self {
            lefth: self.lefth.translate(p.x),
            righth: self.righth.translate(p.x),
            topv: self.topv.translate(p.y),
            botv: self.botv.translate(p.y),
        }
    }
}

impl TryFrom<RingBuilder> for Ring {
    type Error = RingError;

    fn try_from(value: RingBuilder) -> Result<Self, Self::Error> {
        let contents = value.contents.ok_or(RingError::MissingContents)?;
        for side in Side::ALL {
            if value.widths[side] <= 0 {
                return Err(RingError::NonPositiveWidth(side));
            }
        }
        let r = contents.rect();

        let sign = if contents.is_outer() {
            Sign::Neg
        } else {
            Sign::Pos
        };

        let res = Self {
            topv: Span::with_point_and_length(sign, r.top(), value.widths[Side::Top]),
            righth: Span::with_point_and_length(sign, r.right(), value.widths[Side::Right]),
            lefth: Span::with_point_and_length(!sign, r.left(), value.widths[Side::Left]),
            botv: Span::with_point_and_length(!sign, r.bottom(), value.widths[Side::Bot]),
        };

        if !res.is_valid() {
            return Err(RingError::Overlapping(res.outer()));
        }
        Ok(res)
    }
}

impl RingBuilder {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn build(&mut self) -> Result<Ring, RingError> {
        Ring::try_from(*self)
    }

    pub fn outer(&mut self, rect: Rect) -> &mut Self {
        self.contents = Some(RingContents::Outer(rect));
        self
    }

    pub fn inner(&mut self, rect: Rect) -> &mut Self {
        self.contents = Some(RingContents::Inner(rect));
        self
    }

    pub fn side_width(&mut self, side: Side, value: i64) -> &mut Self {
        self.widths[side] = value;
        self
    }

    /// Sets the widths of the vertical-going parts of the ring to the given value.
    pub fn widths(&mut self, value: i64) -> &mut Self {
        self.side_width(Side::Left, value);
        self.side_width(Side::Right, value)
    }

    /// Sets the heights of the horizontal-going parts of the ring to the given value.
    pub fn heights(&mut self, value: i64) -> &mut Self {
        self.side_width(Side::Top, value);
        self.side_width(Side::Bot, value)
    }

    /// Sets the width of all ring edges to the given value.
    pub fn uniform_width(&mut self, value: i64) -> &mut Self {
        self.widths(value);
        self.heights(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_from_inner() {
        let inner = Rect::new(Point::new(-100, -50), Point::new(100, 50));
        let ring = Ring::builder().inner(inner).uniform_width(20).build().unwrap();
        assert_eq!(ring.inner(), inner);
        assert_eq!(
            ring.outer(),
            Rect::new(Point::new(-120, -70), Point::new(120, 70))
        );
        assert_eq!(ring.rect(Side::Left).width(), 20);
        assert_eq!(ring.rect(Side::Left).height(), 140);
        assert_eq!(ring.inner_rect(Side::Top).width(), 200);
        assert_eq!(
            ring.corner(Corner::UpperRight),
            Rect::new(Point::new(100, 50), Point::new(120, 70))
        );
        assert!(ring.contains(Point::new(-110, 0)));
        assert!(!ring.contains(Point::zero()));
    }

    #[test]
    fn test_ring_from_outer() {
        let outer = Rect::new(Point::new(0, 0), Point::new(100, 100));
        let ring = Ring::builder()
            .outer(outer)
            .widths(10)
            .heights(20)
            .build()
            .unwrap();
        assert_eq!(ring.outer(), outer);
        assert_eq!(ring.inner(), Rect::new(Point::new(10, 20), Point::new(90, 80)));
    }

    #[test]
    fn test_ring_errors() {
        assert_eq!(
            Ring::builder().uniform_width(10).build(),
            Err(RingError::MissingContents)
        );
        let outer = Rect::new(Point::new(0, 0), Point::new(30, 30));
        assert!(matches!(
            Ring::builder().outer(outer).uniform_width(20).build(),
            Err(RingError::Overlapping(_))
        ));
        assert_eq!(
            Ring::builder().outer(outer).widths(5).build(),
            Err(RingError::NonPositiveWidth(Side::Top))
        );
    }
}
