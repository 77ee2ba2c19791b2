//! Engine-independent scene description.
//!
//! Factories in this module produce [`MeshGroup`]s: plain data describing
//! shapes, materials and placement. The renderer turns them into real meshes;
//! everything here can be built and inspected without a GPU.

pub mod builder;
pub mod objects;
pub mod tree;

use crate::color::Rgb;
use crate::memory::MemoryId;
use crate::zone::Emotion;
use glam::{Quat, Vec3};

pub use builder::{build_scene, GroundPlane, Scene};
pub use objects::{ObjectBuilder, ObjectFactory};
pub use tree::{create_tree, TreeBounds};

/// A primitive shape, centered on its local origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Sphere { radius: f32 },
    /// A cylinder with possibly different end radii, axis along +Y.
    Frustum {
        top_radius: f32,
        bottom_radius: f32,
        height: f32,
    },
    Cuboid { x: f32, y: f32, z: f32 },
    /// A flat circle in the XY plane, facing +Z. Rotate it to lie on the ground.
    Disk { radius: f32 },
    Dodecahedron { radius: f32 },
    Octahedron { radius: f32 },
}

/// Surface appearance of a part.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialSpec {
    pub base_color: Rgb,
    /// 1.0 is opaque.
    pub alpha: f32,
    pub emissive: Option<Emissive>,
    /// Ignore scene lighting.
    pub unlit: bool,
}

/// Self-illumination of a material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Emissive {
    pub color: Rgb,
    pub intensity: f32,
}

impl MaterialSpec {
    /// An opaque lit material.
    pub fn solid(color: Rgb) -> Self {
        Self {
            base_color: color,
            alpha: 1.0,
            emissive: None,
            unlit: false,
        }
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha.clamp(0.0, 1.0);
        self
    }

    pub fn with_emissive(mut self, color: Rgb, intensity: f32) -> Self {
        self.emissive = Some(Emissive { color, intensity });
        self
    }

    pub fn unlit(mut self) -> Self {
        self.unlit = true;
        self
    }

    pub fn is_transparent(&self) -> bool {
        self.alpha < 1.0
    }
}

/// One mesh within a group, placed relative to the group origin.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshPart {
    pub shape: Shape,
    pub material: MaterialSpec,
    pub offset: Vec3,
    pub rotation: Quat,
}

impl MeshPart {
    pub fn new(shape: Shape, material: MaterialSpec) -> Self {
        Self {
            shape,
            material,
            offset: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }

    pub fn at(mut self, offset: Vec3) -> Self {
        self.offset = offset;
        self
    }

    /// Shorthand for an offset straight up.
    pub fn raised(self, y: f32) -> Self {
        self.at(Vec3::new(0.0, y, 0.0))
    }

    pub fn rotated(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }
}

/// What a group represents, used for hit-testing and bookkeeping.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupTag {
    Ground { emotion: Emotion },
    Decoration { tag: String },
    Tree { memory_id: MemoryId, emotion: Emotion },
}

impl GroupTag {
    pub fn is_tree(&self) -> bool {
        matches!(self, GroupTag::Tree { .. })
    }

    pub fn memory_id(&self) -> Option<MemoryId> {
        match self {
            GroupTag::Tree { memory_id, .. } => Some(*memory_id),
            _ => None,
        }
    }
}

/// A positioned collection of parts.
#[derive(Debug, Clone, PartialEq)]
pub struct MeshGroup {
    pub translation: Vec3,
    pub parts: Vec<MeshPart>,
    pub tag: GroupTag,
}

impl MeshGroup {
    pub fn new(tag: GroupTag) -> Self {
        Self {
            translation: Vec3::ZERO,
            parts: Vec::new(),
            tag,
        }
    }

    pub fn with_parts(mut self, parts: Vec<MeshPart>) -> Self {
        self.parts = parts;
        self
    }

    pub fn at(mut self, translation: Vec3) -> Self {
        self.translation = translation;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_builders() {
        let m = MaterialSpec::solid(Rgb::WHITE)
            .with_alpha(1.5)
            .with_emissive(Rgb::SKY, 0.3);
        assert_eq!(m.alpha, 1.0);
        assert!(!m.is_transparent());
        assert_eq!(m.emissive.unwrap().intensity, 0.3);
        assert!(MaterialSpec::solid(Rgb::WHITE).with_alpha(0.6).is_transparent());
    }

    #[test]
    fn test_group_tag_memory_id() {
        let tag = GroupTag::Tree {
            memory_id: MemoryId::new(7),
            emotion: Emotion::Joy,
        };
        assert!(tag.is_tree());
        assert_eq!(tag.memory_id(), Some(MemoryId::new(7)));
        assert_eq!(GroupTag::Ground { emotion: Emotion::Fear }.memory_id(), None);
    }
}
