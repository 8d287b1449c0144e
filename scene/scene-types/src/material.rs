//! Materials, textures, attribute metadata and texture mapping.

use std::collections::BTreeMap;
use std::path::PathBuf;

use nalgebra::{Point3, Vector3};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// RGBA color with 8-bit components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Color {
    /// Red component (0-255).
    pub r: u8,
    /// Green component (0-255).
    pub g: u8,
    /// Blue component (0-255).
    pub b: u8,
    /// Alpha component (0-255).
    pub a: u8,
}

impl Color {
    /// Create an opaque color.
    #[must_use]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Create a color with explicit alpha.
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Components as `[r, g, b, a]`.
    #[must_use]
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// White (255, 255, 255, 255).
    pub const WHITE: Self = Self::rgb(255, 255, 255);
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// How a material combines color and texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MaterialType {
    /// Plain color.
    #[default]
    Solid,
    /// Texture image as-is.
    Textured,
    /// Texture image tinted by the material color.
    ColorizedTexture,
}

/// Texture descriptor attached to a material.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Texture {
    /// Path the image was loaded from. The file may no longer exist.
    pub filename: PathBuf,
    /// Stored width of one texture tile, in model units.
    pub width: f64,
    /// Stored height of one texture tile, in model units.
    pub height: f64,
    /// Image width in pixels.
    pub image_width: u32,
    /// Image height in pixels.
    pub image_height: u32,
    /// Embedded image bytes kept by the model, if any.
    pub image_data: Option<Vec<u8>>,
}

impl Texture {
    /// Create a texture descriptor with no embedded image.
    #[must_use]
    pub fn new(filename: impl Into<PathBuf>, width: f64, height: f64) -> Self {
        Self {
            filename: filename.into(),
            width,
            height,
            image_width: 0,
            image_height: 0,
            image_data: None,
        }
    }

    /// Set the pixel dimensions.
    #[must_use]
    pub const fn with_image_size(mut self, image_width: u32, image_height: u32) -> Self {
        self.image_width = image_width;
        self.image_height = image_height;
        self
    }

    /// Attach embedded image bytes.
    #[must_use]
    pub fn with_image_data(mut self, data: Vec<u8>) -> Self {
        self.image_data = Some(data);
        self
    }

    /// Whether two descriptors name the same image at the same sizes.
    ///
    /// Embedded bytes are not compared.
    #[must_use]
    #[allow(clippy::float_cmp)]
    pub fn same_image(&self, other: &Self) -> bool {
        self.filename == other.filename
            && self.width == other.width
            && self.height == other.height
            && self.image_width == other.image_width
            && self.image_height == other.image_height
    }
}

/// A metadata value. Dictionaries nest.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum AttributeValue {
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point.
    Float(f64),
    /// Text.
    Text(String),
    /// Ordered list.
    List(Vec<AttributeValue>),
    /// Nested dictionary.
    Dict(Attributes),
}

/// Attribute dictionaries: name → value, compared independent of insertion order.
pub type Attributes = BTreeMap<String, AttributeValue>;

/// A surface material.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Material {
    /// Display name.
    pub name: String,
    /// Base color.
    pub color: Color,
    /// Opacity in `[0, 1]`.
    pub alpha: f64,
    /// Color/texture combination mode.
    pub material_type: MaterialType,
    /// Texture, if any.
    pub texture: Option<Texture>,
    /// Arbitrary metadata (render engine settings and the like).
    pub attributes: Attributes,
}

impl Material {
    /// Create an opaque solid-color material.
    #[must_use]
    pub fn new(name: impl Into<String>, color: Color) -> Self {
        Self {
            name: name.into(),
            color,
            alpha: 1.0,
            material_type: MaterialType::Solid,
            texture: None,
            attributes: Attributes::new(),
        }
    }

    /// Attach a texture and switch to [`MaterialType::Textured`].
    #[must_use]
    pub fn with_texture(mut self, texture: Texture) -> Self {
        self.texture = Some(texture);
        self.material_type = MaterialType::Textured;
        self
    }

    /// Set the opacity.
    #[must_use]
    pub const fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    /// Add one attribute entry.
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

/// Planar projection from model space to texture space.
///
/// `u = (p - origin) · u_axis`, `v = (p - origin) · v_axis`, `q = 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct UvMapping {
    /// Model-space point mapped to `(0, 0)`.
    pub origin: Point3<f64>,
    /// Gradient of `u`; its length is one over the tile width.
    pub u_axis: Vector3<f64>,
    /// Gradient of `v`; its length is one over the tile height.
    pub v_axis: Vector3<f64>,
}

impl UvMapping {
    /// Default projection for a face with `normal`, tiling every
    /// `width` × `height` model units.
    ///
    /// Horizontal faces project along world X/Y; other faces use the
    /// horizontal direction in the face plane as `u` and "up the face" as `v`.
    #[must_use]
    pub fn planar(normal: &Vector3<f64>, width: f64, height: f64) -> Self {
        let up = Vector3::z();
        let horizontal = up.cross(normal);
        let (u_dir, v_dir) = if horizontal.norm() < 1e-9 {
            (Vector3::x(), Vector3::y())
        } else {
            let u = horizontal.normalize();
            (u, normal.cross(&u).normalize())
        };
        let w = if width.abs() < f64::EPSILON { 1.0 } else { width };
        let h = if height.abs() < f64::EPSILON { 1.0 } else { height };
        Self {
            origin: Point3::origin(),
            u_axis: u_dir / w,
            v_axis: v_dir / h,
        }
    }

    /// Texture coordinate `(u, v, q)` of a model-space point.
    #[must_use]
    pub fn uvq(&self, point: &Point3<f64>) -> Vector3<f64> {
        let d = point - self.origin;
        Vector3::new(d.dot(&self.u_axis), d.dot(&self.v_axis), 1.0)
    }
}
