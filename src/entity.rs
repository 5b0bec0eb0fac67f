use crate::bbox::{BBox, Ltrb};

use nalgebra as na;
use std::fmt;

/// Position on the map canvas, in canvas pixels.
pub type CanvasPoint = na::Point2<i32>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const RED: Color = Color::new(255, 0, 0);
    pub const BLACK: Color = Color::new(0, 0, 0);
    pub const WHITE: Color = Color::new(255, 255, 255);

    #[inline]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.r, self.g, self.b)
    }
}

/// Something a tracker follows across frames and the map can place.
pub trait Entity {
    fn new(id: i32, bbox: BBox<Ltrb>, mapped: Option<CanvasPoint>, color: Color) -> Self
    where
        Self: Sized;

    fn id(&self) -> i32;
    fn bbox(&self) -> &BBox<Ltrb>;
    fn color(&self) -> Color;
    fn set_color(&mut self, color: Color);

    /// `None` when the ground point is outside the calibrated region.
    fn mapped(&self) -> Option<CanvasPoint>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Person {
    pub id: i32,
    pub bbox: BBox<Ltrb>,
    pub color: Color,
    pub mapped: Option<CanvasPoint>,
}

impl Entity for Person {
    fn new(id: i32, bbox: BBox<Ltrb>, mapped: Option<CanvasPoint>, color: Color) -> Self {
        Self {
            id,
            bbox,
            color,
            mapped,
        }
    }

    #[inline]
    fn id(&self) -> i32 {
        self.id
    }

    #[inline]
    fn bbox(&self) -> &BBox<Ltrb> {
        &self.bbox
    }

    #[inline]
    fn color(&self) -> Color {
        self.color
    }

    #[inline]
    fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    #[inline]
    fn mapped(&self) -> Option<CanvasPoint> {
        self.mapped
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Person {} at {:?} with color {}",
            self.id,
            self.bbox.as_slice(),
            self.color
        )
    }
}

/// An object that should stay with a person, e.g. a suitcase.
#[derive(Debug, Clone, PartialEq)]
pub struct SecondaryObject {
    pub id: i32,
    pub bbox: BBox<Ltrb>,
    pub color: Color,
    pub mapped: Option<CanvasPoint>,

    // no person nearby at the last evaluation
    pub lost: bool,
}

impl SecondaryObject {
    #[inline]
    pub fn lost(&self) -> bool {
        self.lost
    }

    #[inline]
    pub fn set_lost(&mut self, lost: bool) {
        self.lost = lost;
    }
}

impl Entity for SecondaryObject {
    fn new(id: i32, bbox: BBox<Ltrb>, mapped: Option<CanvasPoint>, color: Color) -> Self {
        Self {
            id,
            bbox,
            color,
            mapped,
            lost: false,
        }
    }

    #[inline]
    fn id(&self) -> i32 {
        self.id
    }

    #[inline]
    fn bbox(&self) -> &BBox<Ltrb> {
        &self.bbox
    }

    #[inline]
    fn color(&self) -> Color {
        self.color
    }

    #[inline]
    fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    #[inline]
    fn mapped(&self) -> Option<CanvasPoint> {
        self.mapped
    }
}

impl fmt::Display for SecondaryObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Object {} at {:?}", self.id, self.bbox.as_slice())?;
        if self.lost {
            write!(f, " (lost)")?;
        }
        Ok(())
    }
}
