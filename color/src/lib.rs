use serde::{Deserialize, Serialize};

/// Linear RGBA colour with components in [0, 1].
#[derive(Clone, Copy, Debug, Deserialize, Serialize, PartialEq)]
pub struct Color {
    r: f32,
    g: f32,
    b: f32,
    a: f32,
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Color {
    pub const BLACK: Self = Self { r: 0.0, g: 0.0, b: 0.0, a: 1.0 };

    pub const YELLOW: Self = Self { r: 1.0, g: 1.0, b: 0.0, a: 1.0 };

    pub const ORANGE: Self = Self { r: 1.0, g: 0.65, b: 0.0, a: 1.0 };

    pub const WHITE: Self = Self { r: 1.0, g: 1.0, b: 1.0, a: 1.0 };

    pub const GREY: Self = Self { r: 0.75, g: 0.75, b: 0.75, a: 1.0 };

    /// Daylit limb haze
    pub const SKY_BLUE: Self = Self { r: 0.529, g: 0.808, b: 0.922, a: 1.0 };

    /// Unlit limb haze
    pub const MIDNIGHT_BLUE: Self = Self { r: 0.098, g: 0.098, b: 0.439, a: 1.0 };

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque colour from 8-bit channels.
    pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
        Self {
            r: r as f32 / 255.0,
            g: g as f32 / 255.0,
            b: b as f32 / 255.0,
            a: 1.0,
        }
    }

    /// RGB scaled to [0, 255], the range the sensor image is composited in.
    pub fn to_rgb255(&self) -> [f32; 3] {
        [
            (self.r * 255.0).clamp(0.0, 255.0),
            (self.g * 255.0).clamp(0.0, 255.0),
            (self.b * 255.0).clamp(0.0, 255.0),
        ]
    }
}

/// Alpha-blends `over` onto `under`, both in [0, 255]; the result is clipped to [0, 255].
pub fn blend(over: [f32; 3], under: [f32; 3], alpha: f32) -> [f32; 3] {
    std::array::from_fn(|k| (alpha * over[k] + (1.0 - alpha) * under[k]).clamp(0.0, 255.0))
}

impl From<&Color> for [f32; 4] {
    fn from(color: &Color) -> Self {
        [color.r, color.g, color.b, color.a]
    }
}
