//! Math utilities and types
//!
//! Provides the small set of 2D math types the scene engine works with.

use serde::{Deserialize, Serialize};

pub use nalgebra::Vector2;

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// Linear interpolation between two scalars
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// RGBA color with components in `0.0..=1.0`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color(pub [f32; 4]);

impl Color {
    /// Opaque white
    pub const WHITE: Self = Self([1.0, 1.0, 1.0, 1.0]);

    /// Fully transparent black
    pub const TRANSPARENT: Self = Self([0.0, 0.0, 0.0, 0.0]);

    /// Create a color from its components
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self([r, g, b, a])
    }

    /// Component-wise linear interpolation with a shared ratio
    pub fn lerp(self, other: Self, t: f32) -> Self {
        let mut out = [0.0; 4];
        for (i, c) in out.iter_mut().enumerate() {
            *c = lerp(self.0[i], other.0[i], t);
        }
        Self(out)
    }

    /// Same color with alpha multiplied by `opacity`
    pub fn with_opacity(self, opacity: f32) -> Self {
        let [r, g, b, a] = self.0;
        Self([r, g, b, a * opacity.clamp(0.0, 1.0)])
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Axis-aligned rectangle in surface pixels
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge
    pub x: f32,
    /// Top edge
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Check whether the rectangle covers any area
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}
