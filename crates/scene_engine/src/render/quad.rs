//! Quad instance data

use bytemuck::{Pod, Zeroable};
use std::collections::HashMap;

use crate::foundation::math::Color;
use crate::scene::entity::Entity;

/// One textured or colored quad, laid out for direct upload
///
/// `position` is the quad's center in surface units. `texture_index` 0 means
/// untextured; see [`TextureTable`].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct QuadInstance {
    /// Center
    pub position: [f32; 2],
    /// Width and height
    pub size: [f32; 2],
    /// Rotation in radians around the center
    pub rotation: f32,
    /// RGBA tint, alpha already multiplied by scene opacity
    pub color: [f32; 4],
    /// Slot in the texture table
    pub texture_index: u32,
}

impl QuadInstance {
    /// Quad covering an entity's bounding box
    pub fn from_entity(entity: &Entity, texture_index: u32) -> Self {
        Self {
            position: [entity.position.x, entity.position.y],
            size: [entity.properties.width, entity.properties.height],
            rotation: entity.rotation.unwrap_or(0.0),
            color: entity.properties.color.0,
            texture_index,
        }
    }

    /// Same quad with alpha multiplied by `opacity`
    pub fn with_opacity(mut self, opacity: f32) -> Self {
        self.color = Color(self.color).with_opacity(opacity).0;
        self
    }

    /// Raw bytes for buffer upload
    pub fn as_bytes(quads: &[Self]) -> &[u8] {
        bytemuck::cast_slice(quads)
    }
}

/// Texture id to rasterizer slot mapping
///
/// Slots are handed out on first use and stay stable; slot 0 is reserved for
/// untextured quads.
#[derive(Debug, Clone, Default)]
pub struct TextureTable {
    slots: HashMap<String, u32>,
}

impl TextureTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Slot of `texture`, allocating one if needed
    pub fn slot(&mut self, texture: &str) -> u32 {
        let next = u32::try_from(self.slots.len() + 1).unwrap_or(u32::MAX);
        *self.slots.entry(texture.to_string()).or_insert(next)
    }

    /// Slot for an optional texture id
    pub fn slot_for(&mut self, texture: Option<&str>) -> u32 {
        texture.map_or(0, |t| self.slot(t))
    }

    /// Slot of an already known texture
    pub fn get(&self, texture: &str) -> Option<u32> {
        self.slots.get(texture).copied()
    }

    /// Number of known textures
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check whether no texture is known
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_quad_layout_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<QuadInstance>(), 40);
        let quads = [QuadInstance::zeroed(); 3];
        assert_eq!(QuadInstance::as_bytes(&quads).len(), 120);
    }

    #[test]
    fn test_quad_from_entity() {
        let mut entity = Entity::sprite("a").at(10.0, 20.0).with_size(4.0, 8.0);
        entity.rotation = Some(1.5);
        let quad = QuadInstance::from_entity(&entity, 2).with_opacity(0.5);

        assert_eq!(quad.position, [10.0, 20.0]);
        assert_eq!(quad.size, [4.0, 8.0]);
        assert_relative_eq!(quad.rotation, 1.5);
        assert_relative_eq!(quad.color[3], 0.5);
        assert_eq!(quad.texture_index, 2);
    }

    #[test]
    fn test_texture_slots_are_stable() {
        let mut table = TextureTable::new();
        assert_eq!(table.slot_for(None), 0);
        assert_eq!(table.slot("hero.png"), 1);
        assert_eq!(table.slot("coin.png"), 2);
        assert_eq!(table.slot("hero.png"), 1);
        assert_eq!(table.len(), 2);
    }
}
