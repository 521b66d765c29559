//! Integer geometry for grid-aligned layout generation.
//!
//! All coordinates are in nanometers.

use std::fmt::Display;
use std::str::FromStr;

use array_map::{ArrayMap, Indexable};
use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use self::bbox::{Bbox, BoundBox};
use self::ring::Ring;
use self::transform::{Translate, TranslateOwned};

pub mod bbox;
pub mod ring;
pub mod transform;

/// Snaps `pos` to the nearest multiple of `grid`.
///
/// Values exactly halfway between two grid points snap towards negative infinity.
pub fn snap_to_grid(pos: i64, grid: i64) -> i64 {
    assert!(grid > 0);

    let rem = pos.rem_euclid(grid);
    if rem <= grid / 2 {
        pos - rem
    } else {
        pos + grid - rem
    }
}

/// Returns `true` if `pos` is an exact multiple of `grid`.
#[inline]
pub fn is_on_grid(pos: i64, grid: i64) -> bool {
    pos.rem_euclid(grid) == 0
}

/// A point in two-dimensional layout-space.
#[derive(
    Debug, Copy, Clone, Default, Hash, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord,
)]
pub struct Point {
    pub x: i64,
    pub y: i64,
}

impl Point {
    /// Creates a new [`Point`] from (x,y) coordinates.
    pub const fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    /// Returns the origin, (0, 0).
    #[inline]
    pub const fn zero() -> Self {
        Self { x: 0, y: 0 }
    }

    /// Creates a new point from the given direction and coordinates.
    ///
    /// If `dir` is [`Dir::Horiz`], `a` becomes the x-coordinate and `b` becomes the y-coordinate.
    /// If `dir` is [`Dir::Vert`], `a` becomes the y-coordinate and `b` becomes the x-coordinate.
    pub fn from_dir_coords(dir: Dir, a: i64, b: i64) -> Self {
        match dir {
            Dir::Horiz => Self::new(a, b),
            Dir::Vert => Self::new(b, a),
        }
    }

    /// Creates a new [`Point`] that serves as an offset in direction `dir`.
    pub fn offset(val: i64, dir: Dir) -> Self {
        match dir {
            Dir::Horiz => Self { x: val, y: 0 },
            Dir::Vert => Self { x: 0, y: val },
        }
    }

    /// Gets the coordinate associated with direction `dir`.
    pub fn coord(&self, dir: Dir) -> i64 {
        match dir {
            Dir::Horiz => self.x,
            Dir::Vert => self.y,
        }
    }

    #[inline]
    pub fn snap_to_grid(&self, grid: i64) -> Self {
        Self::new(snap_to_grid(self.x, grid), snap_to_grid(self.y, grid))
    }

    #[inline]
    pub fn is_on_grid(&self, grid: i64) -> bool {
        is_on_grid(self.x, grid) && is_on_grid(self.y, grid)
    }
}

impl std::ops::Add<Point> for Point {
    type Output = Self;
    fn add(self, rhs: Point) -> Self::Output {
        Self::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl std::ops::Sub<Point> for Point {
    type Output = Self;
    fn sub(self, rhs: Point) -> Self::Output {
        Self::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl std::ops::Neg for Point {
    type Output = Self;
    fn neg(self) -> Self::Output {
        Self::new(-self.x, -self.y)
    }
}

impl From<(i64, i64)> for Point {
    fn from(value: (i64, i64)) -> Self {
        Self::new(value.0, value.1)
    }
}

impl Display for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// A one-dimensional closed interval.
#[derive(
    Debug, Default, Clone, Copy, Hash, Ord, PartialOrd, Serialize, Deserialize, PartialEq, Eq,
)]
pub struct Span {
    start: i64,
    stop: i64,
}

impl Span {
    /// Creates a new [`Span`] between two integers, in either order.
    pub fn new(a: i64, b: i64) -> Self {
        Self {
            start: a.min(b),
            stop: a.max(b),
        }
    }

    pub fn with_start_and_length(start: i64, length: i64) -> Self {
        Self::new(start, start + length)
    }

    pub fn with_stop_and_length(stop: i64, length: i64) -> Self {
        Self::new(stop - length, stop)
    }

    /// Creates a span of `length` extending from `point` in the direction of `sign`.
    pub fn with_point_and_length(sign: Sign, point: i64, length: i64) -> Self {
        match sign {
            Sign::Pos => Self::with_start_and_length(point, length),
            Sign::Neg => Self::with_stop_and_length(point, length),
        }
    }

    /// Creates a span of length `span` centered on `center`.
    ///
    /// `span` should be even so that both endpoints are integral.
    pub fn from_center_span(center: i64, span: i64) -> Self {
        debug_assert!(span >= 0);
        Self::new(center - span / 2, center + span - span / 2)
    }

    #[inline]
    pub fn start(&self) -> i64 {
        self.start
    }

    #[inline]
    pub fn stop(&self) -> i64 {
        self.stop
    }

    /// Returns the endpoint of the span on the side given by `sign`.
    pub fn point(&self, sign: Sign) -> i64 {
        match sign {
            Sign::Neg => self.start,
            Sign::Pos => self.stop,
        }
    }

    #[inline]
    pub fn center(&self) -> i64 {
        (self.start + self.stop) / 2
    }

    #[inline]
    pub fn length(&self) -> i64 {
        self.stop - self.start
    }

    pub fn contains(&self, other: Self) -> bool {
        self.start <= other.start && self.stop >= other.stop
    }

    pub fn intersects(&self, other: &Self) -> bool {
        !(other.stop < self.start || self.stop < other.start)
    }

    /// Returns the smallest span containing both `self` and `other`.
    pub fn union(self, other: Self) -> Self {
        Self {
            start: self.start.min(other.start),
            stop: self.stop.max(other.stop),
        }
    }

    /// Grows the span by `amount` at both ends.
    pub fn expand_all(self, amount: i64) -> Self {
        Self::new(self.start - amount, self.stop + amount)
    }

    pub fn translate(self, amount: i64) -> Self {
        Self {
            start: self.start + amount,
            stop: self.stop + amount,
        }
    }
}

impl From<(i64, i64)> for Span {
    fn from(value: (i64, i64)) -> Self {
        Self::new(value.0, value.1)
    }
}

/// An enumeration of axis-aligned directions.
#[derive(Debug, Default, Clone, Copy, Serialize, Deserialize, Hash, PartialEq, Eq)]
pub enum Dir {
    /// The horizontal, or x-aligned, direction.
    #[default]
    Horiz,
    /// The vertical, or y-aligned, direction.
    Vert,
}

#[derive(Debug, Clone, Eq, PartialEq, Error)]
#[error("error parsing direction `{original}`; expected horizontal or vertical")]
pub struct DirParseError {
    original: String,
}

impl FromStr for Dir {
    type Err = DirParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "vertical" | "vert" | "v" => Ok(Self::Vert),
            "horizontal" | "horiz" | "h" => Ok(Self::Horiz),
            _ => Err(DirParseError {
                original: s.to_string(),
            }),
        }
    }
}

impl Dir {
    /// Returns the perpendicular direction.
    pub fn other(self) -> Self {
        match self {
            Self::Horiz => Self::Vert,
            Self::Vert => Self::Horiz,
        }
    }
}

impl Display for Dir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Self::Horiz => write!(f, "horizontal"),
            Self::Vert => write!(f, "vertical"),
        }
    }
}

impl std::ops::Not for Dir {
    type Output = Self;
    fn not(self) -> Self::Output {
        self.other()
    }
}

/// Enumeration over possible signs.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Hash, PartialEq, Eq)]
#[repr(u8)]
#[derive(Indexable)]
pub enum Sign {
    /// Positive.
    Pos,
    /// Negative.
    Neg,
}

impl std::ops::Not for Sign {
    type Output = Self;
    fn not(self) -> Self::Output {
        match self {
            Self::Pos => Self::Neg,
            Self::Neg => Self::Pos,
        }
    }
}

/// An enumeration of the sides of a axis-aligned rectangle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Hash, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
#[derive(Indexable)]
pub enum Side {
    Top,
    Right,
    Bot,
    Left,
}

impl Side {
    /// All four sides, in clockwise order starting at the top.
    pub const ALL: [Side; 4] = [Side::Top, Side::Right, Side::Bot, Side::Left];

    /// Gets the direction of the coordinate corresponding to this side.
    ///
    /// Top and bottom edges are y-coordinates, so they are on the **vertical** axis.
    pub fn coord_dir(&self) -> Dir {
        match self {
            Side::Top | Side::Bot => Dir::Vert,
            Side::Left | Side::Right => Dir::Horiz,
        }
    }

    /// Gets the direction of the edge corresponding to this side.
    pub fn edge_dir(&self) -> Dir {
        !self.coord_dir()
    }

    /// Returns the opposite side.
    pub fn other(&self) -> Self {
        match self {
            Side::Top => Side::Bot,
            Side::Right => Side::Left,
            Side::Bot => Side::Top,
            Side::Left => Side::Right,
        }
    }

    /// Returns the sign corresponding to moving towards this side.
    pub fn sign(&self) -> Sign {
        match self {
            Side::Top | Side::Right => Sign::Pos,
            Side::Bot | Side::Left => Sign::Neg,
        }
    }
}

impl std::ops::Not for Side {
    type Output = Self;
    fn not(self) -> Self::Output {
        self.other()
    }
}

/// An association of a value with type `T` to each of the four [`Side`]s.
#[derive(Default, Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
pub struct Sides<T> {
    inner: ArrayMap<Side, T, 4>,
}

impl<T> Sides<T> {
    /// Creates a new [`Sides`] with with the provided values for each side.
    pub const fn new(top: T, right: T, bot: T, left: T) -> Self {
        // The array order must match the variant order of [`Side`].
        Self {
            inner: ArrayMap::new([top, right, bot, left]),
        }
    }

    /// Maps a function over the provided [`Sides`], returning a new [`Sides`].
    pub fn map<B>(self, f: impl FnMut(&Side, T) -> B) -> Sides<B> {
        Sides {
            inner: self.inner.map(f),
        }
    }
}

impl<T> std::ops::Index<Side> for Sides<T> {
    type Output = T;
    fn index(&self, index: Side) -> &Self::Output {
        self.inner.index(index)
    }
}

impl<T> std::ops::IndexMut<Side> for Sides<T> {
    fn index_mut(&mut self, index: Side) -> &mut Self::Output {
        self.inner.index_mut(index)
    }
}

/// An enumeration of the corners of an axis-aligned rectangle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Hash, PartialEq, Eq)]
#[repr(u8)]
#[derive(Indexable)]
pub enum Corner {
    LowerLeft,
    LowerRight,
    UpperLeft,
    UpperRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::LowerLeft,
        Corner::LowerRight,
        Corner::UpperLeft,
        Corner::UpperRight,
    ];

    /// Returns the side of the corner bounding the given direction.
    pub fn side(&self, dir: Dir) -> Side {
        match (self, dir) {
            (Corner::LowerLeft | Corner::UpperLeft, Dir::Horiz) => Side::Left,
            (Corner::LowerRight | Corner::UpperRight, Dir::Horiz) => Side::Right,
            (Corner::LowerLeft | Corner::LowerRight, Dir::Vert) => Side::Bot,
            (Corner::UpperLeft | Corner::UpperRight, Dir::Vert) => Side::Top,
        }
    }
}

/// An axis-aligned rectangle, specified by lower-left and upper-right corners.
#[derive(
    Debug, Default, Copy, Clone, Hash, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord,
)]
pub struct Rect {
    /// The lower-left corner.
    pub p0: Point,
    /// The upper-right corner.
    pub p1: Point,
}

impl Rect {
    /// Creates a new rectangle from any two opposite corners.
    pub fn new(p0: Point, p1: Point) -> Self {
        Self {
            p0: Point::new(p0.x.min(p1.x), p0.y.min(p1.y)),
            p1: Point::new(p0.x.max(p1.x), p0.y.max(p1.y)),
        }
    }

    /// Creates a rectangle with points `(0, 0), (dims.w(), dims.h())`.
    pub fn with_dims(dims: Dims) -> Self {
        Self::new(Point::zero(), Point::new(dims.w(), dims.h()))
    }

    /// Creates a rectangle of the given dimensions centered on `center`.
    pub fn from_center_dims(center: Point, dims: Dims) -> Self {
        Self::from_spans(
            Span::from_center_span(center.x, dims.w()),
            Span::from_center_span(center.y, dims.h()),
        )
    }

    /// Creates a rectangle from horizontal and vertical [`Span`]s.
    pub fn from_spans(h: Span, v: Span) -> Self {
        Self {
            p0: Point::new(h.start(), v.start()),
            p1: Point::new(h.stop(), v.stop()),
        }
    }

    /// Returns the center point of the rectangle.
    pub fn center(&self) -> Point {
        Point::new(self.hspan().center(), self.vspan().center())
    }

    #[inline]
    pub fn bottom(&self) -> i64 {
        self.p0.y
    }

    #[inline]
    pub fn top(&self) -> i64 {
        self.p1.y
    }

    #[inline]
    pub fn left(&self) -> i64 {
        self.p0.x
    }

    #[inline]
    pub fn right(&self) -> i64 {
        self.p1.x
    }

    pub fn hspan(&self) -> Span {
        Span::new(self.p0.x, self.p1.x)
    }

    pub fn vspan(&self) -> Span {
        Span::new(self.p0.y, self.p1.y)
    }

    /// Returns the span of the rectangle along direction `dir`.
    pub fn span(&self, dir: Dir) -> Span {
        match dir {
            Dir::Horiz => self.hspan(),
            Dir::Vert => self.vspan(),
        }
    }

    pub fn with_hspan(self, hspan: Span) -> Self {
        Self::from_spans(hspan, self.vspan())
    }

    pub fn with_vspan(self, vspan: Span) -> Self {
        Self::from_spans(self.hspan(), vspan)
    }

    #[inline]
    pub fn width(&self) -> i64 {
        self.p1.x - self.p0.x
    }

    #[inline]
    pub fn height(&self) -> i64 {
        self.p1.y - self.p0.y
    }

    #[inline]
    pub fn dims(&self) -> Dims {
        Dims::new(self.width(), self.height())
    }

    /// Returns the coordinate of the given side.
    #[inline]
    pub fn side(&self, side: Side) -> i64 {
        match side {
            Side::Top => self.top(),
            Side::Bot => self.bottom(),
            Side::Right => self.right(),
            Side::Left => self.left(),
        }
    }

    /// Returns the midpoint of the edge on the given side.
    pub fn edge_center(&self, side: Side) -> Point {
        let c = self.center();
        match side.coord_dir() {
            Dir::Horiz => Point::new(self.side(side), c.y),
            Dir::Vert => Point::new(c.x, self.side(side)),
        }
    }

    /// Returns the desired corner of the rectangle.
    pub fn corner(&self, corner: Corner) -> Point {
        match corner {
            Corner::LowerLeft => self.p0,
            Corner::LowerRight => Point::new(self.p1.x, self.p0.y),
            Corner::UpperLeft => Point::new(self.p0.x, self.p1.y),
            Corner::UpperRight => self.p1,
        }
    }

    /// Expands the rectangle by `amount` on all sides.
    #[inline]
    pub fn expand(&self, amount: i64) -> Self {
        Self::from_spans(
            self.hspan().expand_all(amount),
            self.vspan().expand_all(amount),
        )
    }

    /// Expands the rectangle by `amount` on both sides associated with the direction `dir`.
    pub fn expand_dir(&self, dir: Dir, amount: i64) -> Self {
        match dir {
            Dir::Horiz => self.with_hspan(self.hspan().expand_all(amount)),
            Dir::Vert => self.with_vspan(self.vspan().expand_all(amount)),
        }
    }

    /// Expands the rectangle by `amount` on the given side.
    pub fn expand_side(&self, side: Side, amount: i64) -> Self {
        let mut r = *self;
        match side {
            Side::Top => r.p1.y += amount,
            Side::Bot => r.p0.y -= amount,
            Side::Right => r.p1.x += amount,
            Side::Left => r.p0.x -= amount,
        }
        Self::new(r.p0, r.p1)
    }

    /// Returns `true` if the rectangles overlap or touch.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.hspan().intersects(&other.hspan()) && self.vspan().intersects(&other.vspan())
    }

    /// Snaps the corners of this rectangle to the given grid.
    ///
    /// Note that the rectangle may have zero area after snapping.
    #[inline]
    pub fn snap_to_grid(&self, grid: i64) -> Self {
        Self::new(self.p0.snap_to_grid(grid), self.p1.snap_to_grid(grid))
    }
}

impl From<Bbox> for Rect {
    fn from(b: Bbox) -> Self {
        debug_assert!(!b.is_empty());
        Self::new(b.p0, b.p1)
    }
}

/// The primary geometric primitive comprising raw layout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[enum_dispatch(ShapeTrait)]
pub enum Shape {
    Rect(Rect),
    Ring(Ring),
}

impl Translate for Shape {
    fn translate(&mut self, p: Point) {
        match self {
            Self::Rect(s) => s.translate(p),
            Self::Ring(s) => s.translate(p),
        }
    }
}

impl TranslateOwned for Shape {
    fn translate_owned(mut self, p: Point) -> Self {
        self.translate(p);
        self
    }
}

impl BoundBox for Shape {
    fn bbox(&self) -> Bbox {
        match self {
            Self::Rect(r) => r.bbox(),
            Self::Ring(r) => r.bbox(),
        }
    }
}

impl Shape {
    pub fn as_rect(&self) -> Option<Rect> {
        if let Shape::Rect(rect) = self {
            Some(*rect)
        } else {
            None
        }
    }

    /// Decomposes the shape into rectangles.
    pub fn rects(&self) -> Vec<Rect> {
        match self {
            Self::Rect(r) => vec![*r],
            Self::Ring(r) => r.rects().to_vec(),
        }
    }
}

/// Common shape operations, dispatched from the [`Shape`] enum to its variants by [mod@enum_dispatch].
#[enum_dispatch]
pub trait ShapeTrait {
    /// Returns an arbitrary reference [`Point`] on the shape.
    fn point0(&self) -> Point;
    /// Returns `true` if the shape contains [`Point`] `pt`.
    ///
    /// Containment is inclusive of the shape boundary.
    fn contains(&self, pt: Point) -> bool;
    /// Returns `true` if every vertex of the shape lies on the given grid.
    fn is_on_grid(&self, grid: i64) -> bool;
}

impl ShapeTrait for Rect {
    fn point0(&self) -> Point {
        self.p0
    }

    fn contains(&self, pt: Point) -> bool {
        self.p0.x <= pt.x && pt.x <= self.p1.x && self.p0.y <= pt.y && pt.y <= self.p1.y
    }

    fn is_on_grid(&self, grid: i64) -> bool {
        self.p0.is_on_grid(grid) && self.p1.is_on_grid(grid)
    }
}

/// A horizontal and vertical rectangular dimension with no specified location.
#[derive(
    Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Default, Serialize, Deserialize,
)]
pub struct Dims {
    w: i64,
    h: i64,
}

impl Dims {
    pub const fn new(w: i64, h: i64) -> Self {
        Self { w, h }
    }

    pub const fn square(value: i64) -> Self {
        Self { w: value, h: value }
    }

    /// Returns the dimension in the specified direction.
    pub fn dim(&self, dir: Dir) -> i64 {
        match dir {
            Dir::Vert => self.h,
            Dir::Horiz => self.w,
        }
    }

    #[inline]
    pub fn w(&self) -> i64 {
        self.w
    }

    #[inline]
    pub fn h(&self) -> i64 {
        self.h
    }

    /// Returns a rectangle with these dimensions whose lower-left corner is the origin.
    #[inline]
    pub fn into_rect(self) -> Rect {
        Rect::with_dims(self)
    }
}

impl std::ops::Add<Dims> for Dims {
    type Output = Self;
    fn add(self, rhs: Dims) -> Self::Output {
        Self::new(self.w + rhs.w, self.h + rhs.h)
    }
}

impl std::ops::Mul<i64> for Dims {
    type Output = Self;
    fn mul(self, rhs: i64) -> Self::Output {
        Self::new(self.w * rhs, self.h * rhs)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;

    #[test]
    fn test_snap_to_grid() {
        assert_eq!(snap_to_grid(1, 5), 0);
        assert_eq!(snap_to_grid(3, 5), 5);
        assert_eq!(snap_to_grid(-3, 5), -5);
        assert_eq!(snap_to_grid(-2, 5), 0);
        assert_eq!(snap_to_grid(1_234, 10), 1_230);
        assert_eq!(snap_to_grid(1_236, 10), 1_240);

        let pt = Point::new(999, 260).snap_to_grid(500);
        assert_eq!(pt, Point::new(1_000, 500));
    }

    #[test]
    fn test_rect_edges_and_expansion() {
        let r = Rect::from_spans(Span::new(0, 100), Span::new(0, 40));
        assert_eq!(r.edge_center(Side::Left), Point::new(0, 20));
        assert_eq!(r.edge_center(Side::Top), Point::new(50, 40));
        assert_eq!(r.expand(10), Rect::new(Point::new(-10, -10), Point::new(110, 50)));
        assert_eq!(
            r.expand_side(Side::Right, 5),
            Rect::new(Point::zero(), Point::new(105, 40))
        );
        assert_eq!(r.expand_dir(Dir::Vert, 5).height(), 50);
    }

    #[test]
    fn test_rect_from_center_dims() {
        let r = Rect::from_center_dims(Point::new(10, 10), Dims::new(20, 40));
        assert_eq!(r.p0, Point::new(0, -10));
        assert_eq!(r.p1, Point::new(20, 30));
        assert_eq!(r.center(), Point::new(10, 10));
    }

    #[test]
    fn test_span_with_point_and_length() {
        assert_eq!(Span::with_point_and_length(Sign::Pos, 10, 5), Span::new(10, 15));
        assert_eq!(Span::with_point_and_length(Sign::Neg, 10, 5), Span::new(5, 10));
        assert!(Span::new(0, 10).intersects(&Span::new(10, 20)));
        assert!(!Span::new(0, 10).intersects(&Span::new(11, 20)));
    }

    #[test]
    fn test_sides_indexing() {
        let sides = Sides::new(1, 2, 3, 4);
        assert_eq!(sides[Side::Top], 1);
        assert_eq!(sides[Side::Left], 4);
        let doubled = sides.map(|_, v| v * 2);
        assert_eq!(doubled[Side::Bot], 6);
    }

    #[test]
    fn test_dir_parse() {
        assert_eq!("horiz".parse::<Dir>().unwrap(), Dir::Horiz);
        assert_eq!(" V ".parse::<Dir>().unwrap(), Dir::Vert);
        assert!("diagonal".parse::<Dir>().is_err());
    }
}
