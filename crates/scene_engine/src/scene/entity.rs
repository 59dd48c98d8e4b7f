//! Scene entities and their components

use serde::{Deserialize, Serialize};

use crate::animation::AnimationPlayback;
use crate::foundation::math::Color;
use crate::foundation::collections::new_key_type;

new_key_type! {
    /// Generation-checked handle to an entity inside one scene
    pub struct EntityKey;
}

/// Entity type tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EntityKind {
    /// Textured or colored quad
    Sprite,
    /// Clickable button
    UiButton,
    /// Text input field
    UiInput,
    /// Static text label
    UiText,
}

/// 2D position
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate
    pub x: f32,
    /// Vertical coordinate
    pub y: f32,
}

impl Point {
    /// Create a point
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Type-specific properties
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntityProps {
    /// Bounding box width
    pub width: f32,
    /// Bounding box height
    pub height: f32,
    /// Fill or tint color
    pub color: Color,
    /// Texture id, if textured
    pub texture: Option<String>,
    /// Label or input text
    pub text: Option<String>,
    /// Font family for text entities
    pub font: Option<String>,
}

impl Default for EntityProps {
    fn default() -> Self {
        Self {
            width: 50.0,
            height: 50.0,
            color: Color::WHITE,
            texture: None,
            text: None,
            font: None,
        }
    }
}

/// Rigid-body flavour of a physics component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyType {
    /// Moved by the simulation
    #[default]
    Dynamic,
    /// Never moves
    Static,
    /// Moved by the owner, pushes dynamic bodies
    Kinematic,
}

/// Declarative physics settings of an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PhysicsComponent {
    /// Body flavour
    pub body_type: BodyType,
    /// Fixture density
    pub density: f32,
    /// Fixture friction coefficient
    pub friction: f32,
    /// Fixture bounciness
    pub restitution: f32,
    /// Lock the body's rotation
    pub fixed_rotation: bool,
}

impl Default for PhysicsComponent {
    fn default() -> Self {
        Self {
            body_type: BodyType::Dynamic,
            density: 1.0,
            friction: 0.3,
            restitution: 0.0,
            fixed_rotation: false,
        }
    }
}

impl PhysicsComponent {
    /// Dynamic body with default material
    pub fn dynamic() -> Self {
        Self::default()
    }

    /// Static body with default material
    pub fn fixed() -> Self {
        Self {
            body_type: BodyType::Static,
            ..Self::default()
        }
    }

    /// Describe why these parameters cannot build a body, if they cannot
    pub fn invalid_reason(&self) -> Option<String> {
        let fields = [
            ("density", self.density),
            ("friction", self.friction),
            ("restitution", self.restitution),
        ];
        for (name, value) in fields {
            if !value.is_finite() {
                return Some(format!("{name} is not finite"));
            }
            if value < 0.0 {
                return Some(format!("{name} is negative ({value})"));
            }
        }
        None
    }
}

/// Component attached to an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Component {
    /// Rigid body shadowed in the physics world
    Physics(PhysicsComponent),
    /// Editor component this engine carries but does not interpret
    Custom {
        /// Component name
        name: String,
        /// Opaque payload
        #[serde(default)]
        data: serde_json::Value,
    },
}

/// An object placed in a scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Id, unique within its scene
    pub id: String,
    /// Type tag
    #[serde(rename = "type")]
    pub kind: EntityKind,
    /// Position
    #[serde(default)]
    pub position: Point,
    /// Rotation in radians
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f32>,
    /// Type-specific properties
    #[serde(default)]
    pub properties: EntityProps,
    /// Attached components
    #[serde(default)]
    pub components: Vec<Component>,
    /// Animation playback, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub animation: Option<AnimationPlayback>,
}

impl Entity {
    /// Create an entity with default properties
    pub fn new(id: impl Into<String>, kind: EntityKind) -> Self {
        Self {
            id: id.into(),
            kind,
            position: Point::default(),
            rotation: None,
            properties: EntityProps::default(),
            components: Vec::new(),
            animation: None,
        }
    }

    /// Create a sprite (builder entry point)
    pub fn sprite(id: impl Into<String>) -> Self {
        Self::new(id, EntityKind::Sprite)
    }

    /// Set position (builder pattern)
    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.position = Point::new(x, y);
        self
    }

    /// Set size (builder pattern)
    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.properties.width = width;
        self.properties.height = height;
        self
    }

    /// Attach a component (builder pattern)
    pub fn with_component(mut self, component: Component) -> Self {
        self.components.push(component);
        self
    }

    /// Attach a physics component (builder pattern)
    pub fn with_physics(self, physics: PhysicsComponent) -> Self {
        self.with_component(Component::Physics(physics))
    }

    /// Attach playback state (builder pattern)
    pub fn with_animation(mut self, playback: AnimationPlayback) -> Self {
        self.animation = Some(playback);
        self
    }

    /// The physics component, if one is attached
    pub fn physics(&self) -> Option<&PhysicsComponent> {
        self.components.iter().find_map(|c| match c {
            Component::Physics(p) => Some(p),
            Component::Custom { .. } => None,
        })
    }

    /// Drop any physics component
    pub fn remove_physics(&mut self) {
        self.components.retain(|c| !matches!(c, Component::Physics(_)));
    }

    /// Half extents of the bounding box
    pub fn half_extents(&self) -> (f32, f32) {
        (self.properties.width / 2.0, self.properties.height / 2.0)
    }

    /// Apply a partial update
    pub fn apply_patch(&mut self, patch: &EntityPatch) {
        if let Some(position) = patch.position {
            self.position = position;
        }
        if let Some(rotation) = patch.rotation {
            self.rotation = Some(rotation);
        }
        if let Some(width) = patch.width {
            self.properties.width = width;
        }
        if let Some(height) = patch.height {
            self.properties.height = height;
        }
        if let Some(color) = patch.color {
            self.properties.color = color;
        }
        if let Some(texture) = &patch.texture {
            self.properties.texture = Some(texture.clone());
        }
        if let Some(animation) = &patch.animation {
            self.animation = Some(animation.clone());
        }
    }
}

/// Partial entity update emitted by the simulation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EntityPatch {
    /// New position
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Point>,
    /// New rotation
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f32>,
    /// New width
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<f32>,
    /// New height
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f32>,
    /// New color
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    /// New texture id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub texture: Option<String>,
    /// New playback state
    #[serde(skip_serializing_if = "Option::is_none")]
    pub animation: Option<AnimationPlayback>,
}

impl EntityPatch {
    /// Check whether the patch changes nothing
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Fold a later patch into this one; later fields win
    pub fn merge(&mut self, later: Self) {
        let Self {
            position,
            rotation,
            width,
            height,
            color,
            texture,
            animation,
        } = later;
        if position.is_some() {
            self.position = position;
        }
        if rotation.is_some() {
            self.rotation = rotation;
        }
        if width.is_some() {
            self.width = width;
        }
        if height.is_some() {
            self.height = height;
        }
        if color.is_some() {
            self.color = color;
        }
        if texture.is_some() {
            self.texture = texture;
        }
        if animation.is_some() {
            self.animation = animation;
        }
    }
}
