//! Environmental object factory.
//!
//! Decorations are produced by small builder functions registered per tag.
//! Tags without a builder fall through to the default builder, so every tag
//! a zone lists yields something visible.

use super::{GroupTag, MaterialSpec, MeshGroup, MeshPart, Shape};
use crate::color::Rgb;
use crate::zone::Zone;
use glam::{Quat, Vec3};
use rand::{Rng, RngCore};
use std::collections::HashMap;
use std::f32::consts::{FRAC_PI_2, PI};

/// Builds the parts of one decoration. Receives the tag so a builder can
/// serve several related tags.
pub type ObjectBuilder = fn(tag: &str, zone: &Zone, rng: &mut dyn RngCore) -> Vec<MeshPart>;

/// Tag-indexed table of decoration builders with a default entry.
#[derive(Clone)]
pub struct ObjectFactory {
    builders: HashMap<String, ObjectBuilder>,
    default: ObjectBuilder,
}

impl std::fmt::Debug for ObjectFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tags: Vec<_> = self.builders.keys().collect();
        tags.sort();
        f.debug_struct("ObjectFactory").field("tags", &tags).finish()
    }
}

impl Default for ObjectFactory {
    fn default() -> Self {
        Self::standard()
    }
}

impl ObjectFactory {
    /// A factory with only the default builder.
    pub fn empty() -> Self {
        Self {
            builders: HashMap::new(),
            default: default_marker,
        }
    }

    /// The garden's standard decorations.
    pub fn standard() -> Self {
        let mut factory = Self::empty();
        for tag in ["butterflies", "sparkles"] {
            factory.register(tag, particle_cluster);
        }
        for tag in ["hammocks", "swings"] {
            factory.register(tag, hanging_seat);
        }
        factory.register("benches", bench);
        factory.register("rain_puddles", puddle);
        for tag in ["lanterns", "floating_lanterns"] {
            factory.register(tag, lantern);
        }
        factory.register("smoldering_rocks", smoldering_rock);
        factory.register("crystals", crystal);
        for tag in ["koi_ponds", "streams"] {
            factory.register(tag, water_body);
        }
        factory.register("glowing_mushrooms", glowing_mushroom);
        factory
    }

    /// Add or replace the builder for a tag.
    pub fn register(&mut self, tag: impl Into<String>, builder: ObjectBuilder) -> &mut Self {
        self.builders.insert(tag.into(), builder);
        self
    }

    /// Whether a tag has its own builder (rather than the default).
    pub fn handles(&self, tag: &str) -> bool {
        self.builders.contains_key(tag)
    }

    /// Build the decoration for `tag`, themed by `zone`, at the local origin.
    ///
    /// Returns `None` only if the selected builder produced no parts.
    pub fn create_object(&self, tag: &str, zone: &Zone, rng: &mut dyn RngCore) -> Option<MeshGroup> {
        let builder = self.builders.get(tag).copied().unwrap_or(self.default);
        let group = MeshGroup::new(GroupTag::Decoration {
            tag: tag.to_string(),
        })
        .with_parts(builder(tag, zone, rng));

        (!group.is_empty()).then_some(group)
    }
}

fn flat() -> Quat {
    Quat::from_rotation_x(-FRAC_PI_2)
}

fn particle_cluster(_tag: &str, zone: &Zone, rng: &mut dyn RngCore) -> Vec<MeshPart> {
    let material = MaterialSpec::solid(zone.palette.accent)
        .with_alpha(0.8)
        .unlit();
    (0..5)
        .map(|_| {
            let offset = Vec3::new(
                (rng.gen::<f32>() - 0.5) * 4.0,
                1.0 + rng.gen::<f32>() * 3.0,
                (rng.gen::<f32>() - 0.5) * 4.0,
            );
            MeshPart::new(Shape::Sphere { radius: 0.1 }, material).at(offset)
        })
        .collect()
}

fn hanging_seat(_tag: &str, _zone: &Zone, _rng: &mut dyn RngCore) -> Vec<MeshPart> {
    vec![
        MeshPart::new(
            Shape::Frustum {
                top_radius: 0.05,
                bottom_radius: 0.05,
                height: 3.0,
            },
            MaterialSpec::solid(Rgb::BARK),
        )
        .raised(1.5),
        MeshPart::new(
            Shape::Cuboid {
                x: 1.5,
                y: 0.1,
                z: 0.5,
            },
            MaterialSpec::solid(Rgb::from_hex(0x654321)),
        )
        .raised(0.5),
    ]
}

fn bench(_tag: &str, _zone: &Zone, _rng: &mut dyn RngCore) -> Vec<MeshPart> {
    vec![MeshPart::new(
        Shape::Cuboid {
            x: 2.0,
            y: 0.2,
            z: 0.8,
        },
        MaterialSpec::solid(Rgb::BARK),
    )
    .raised(0.5)]
}

fn puddle(_tag: &str, _zone: &Zone, _rng: &mut dyn RngCore) -> Vec<MeshPart> {
    vec![MeshPart::new(
        Shape::Disk { radius: 1.0 },
        MaterialSpec::solid(Rgb::from_hex(0x4682B4)).with_alpha(0.6),
    )
    .raised(0.01)
    .rotated(flat())]
}

fn lantern(tag: &str, zone: &Zone, rng: &mut dyn RngCore) -> Vec<MeshPart> {
    let height = if tag == "floating_lanterns" {
        3.0 + rng.gen::<f32>() * 2.0
    } else {
        1.5
    };
    vec![MeshPart::new(
        Shape::Frustum {
            top_radius: 0.3,
            bottom_radius: 0.4,
            height: 0.8,
        },
        MaterialSpec::solid(zone.palette.accent).with_emissive(zone.palette.accent, 0.3),
    )
    .raised(height)]
}

fn smoldering_rock(_tag: &str, _zone: &Zone, _rng: &mut dyn RngCore) -> Vec<MeshPart> {
    vec![MeshPart::new(
        Shape::Dodecahedron { radius: 0.5 },
        MaterialSpec::solid(Rgb::from_hex(0x8B0000)).with_emissive(Rgb::from_hex(0xFF4500), 0.2),
    )
    .raised(0.3)]
}

fn crystal(_tag: &str, _zone: &Zone, rng: &mut dyn RngCore) -> Vec<MeshPart> {
    vec![MeshPart::new(
        Shape::Octahedron { radius: 0.8 },
        MaterialSpec::solid(Rgb::from_hex(0x9932CC))
            .with_alpha(0.7)
            .with_emissive(Rgb::from_hex(0x40E0D0), 0.3),
    )
    .raised(1.0)
    .rotated(Quat::from_rotation_y(rng.gen::<f32>() * PI))]
}

fn water_body(_tag: &str, _zone: &Zone, _rng: &mut dyn RngCore) -> Vec<MeshPart> {
    vec![MeshPart::new(
        Shape::Disk { radius: 2.0 },
        MaterialSpec::solid(Rgb::from_hex(0x40E0D0)).with_alpha(0.8),
    )
    .raised(-0.1)
    .rotated(flat())]
}

fn glowing_mushroom(_tag: &str, _zone: &Zone, _rng: &mut dyn RngCore) -> Vec<MeshPart> {
    vec![
        MeshPart::new(
            Shape::Sphere { radius: 0.4 },
            MaterialSpec::solid(Rgb::from_hex(0x9932CC)).with_emissive(Rgb::from_hex(0x40E0D0), 0.4),
        )
        .raised(0.6),
        MeshPart::new(
            Shape::Frustum {
                top_radius: 0.1,
                bottom_radius: 0.1,
                height: 0.5,
            },
            MaterialSpec::solid(Rgb::from_hex(0xF5F5DC)),
        )
        .raised(0.25),
    ]
}

fn default_marker(_tag: &str, zone: &Zone, _rng: &mut dyn RngCore) -> Vec<MeshPart> {
    vec![MeshPart::new(
        Shape::Sphere { radius: 0.2 },
        MaterialSpec::solid(zone.palette.secondary),
    )
    .raised(0.2)]
}
