pub mod pick;

use glam::{Mat4, Quat, Vec2, Vec3};
use std::path::PathBuf;
use thiserror::Error;

/// Handle referencing a node owned by the [`SceneGraph`].
///
/// Handles are generational: once a node is removed its handle never
/// resolves again, even if the slot is reused by a later node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Handle {
    index: u32,
    generation: u32,
}

impl Handle {
    pub const fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    pub const fn index(self) -> u32 {
        self.index
    }

    pub const fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeTransform {
    pub translation: Vec3,
    pub rotation: Quat,
}

impl Default for NodeTransform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl NodeTransform {
    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            ..Self::default()
        }
    }

    pub fn matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.translation)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Geometry {
    /// Box of `size`, centered on `offset` in the node's local frame.
    Cuboid { size: Vec3, offset: Vec3 },
    /// Flat rectangle in the local XZ plane, facing +Y.
    Plane { size: Vec2 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum TextureSlot {
    None,
    Pending(PathBuf),
    Loaded { path: PathBuf, byte_len: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub color: u32,
    pub emissive: u32,
    pub roughness: f32,
    pub metalness: f32,
    pub texture: TextureSlot,
}

impl Material {
    pub fn flat(color: u32) -> Self {
        Self {
            color,
            emissive: 0x000000,
            roughness: 0.9,
            metalness: 0.1,
            texture: TextureSlot::None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Mesh {
        geometry: Geometry,
        material: Material,
    },
    AmbientLight {
        color: u32,
        intensity: f32,
    },
    DirectionalLight {
        color: u32,
        intensity: f32,
        target: Vec3,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub label: String,
    pub transform: NodeTransform,
    pub kind: NodeKind,
}

impl SceneNode {
    pub fn mesh(label: impl Into<String>, geometry: Geometry, material: Material) -> Self {
        Self {
            label: label.into(),
            transform: NodeTransform::default(),
            kind: NodeKind::Mesh { geometry, material },
        }
    }

    pub fn with_transform(mut self, transform: NodeTransform) -> Self {
        self.transform = transform;
        self
    }

    pub fn material(&self) -> Option<&Material> {
        match &self.kind {
            NodeKind::Mesh { material, .. } => Some(material),
            _ => None,
        }
    }

    pub fn material_mut(&mut self) -> Option<&mut Material> {
        match &mut self.kind {
            NodeKind::Mesh { material, .. } => Some(material),
            _ => None,
        }
    }

    pub fn geometry(&self) -> Option<&Geometry> {
        match &self.kind {
            NodeKind::Mesh { geometry, .. } => Some(geometry),
            _ => None,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SceneError {
    #[error("scene node {0:?} is not live in this scene")]
    StaleHandle(Handle),
}

#[derive(Default)]
struct Slot {
    generation: u32,
    node: Option<SceneNode>,
}

/// Owner of every renderable node. Components hold [`Handle`]s and go
/// through the graph to read or mutate their node.
#[derive(Default)]
pub struct SceneGraph {
    slots: Vec<Slot>,
    free_list: Vec<u32>,
    live: usize,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: SceneNode) -> Handle {
        log::trace!("[scene] add {}", node.label);
        self.live += 1;
        if let Some(index) = self.free_list.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            Handle::new(index, slot.generation)
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                node: Some(node),
            });
            Handle::new(index, 0)
        }
    }

    /// Detaches the node and hands it back to the caller, invalidating
    /// `handle` and every copy of it.
    pub fn remove(&mut self, handle: Handle) -> Result<SceneNode, SceneError> {
        if !self.contains(handle) {
            return Err(SceneError::StaleHandle(handle));
        }
        let slot = &mut self.slots[handle.index as usize];
        let node = slot.node.take().ok_or(SceneError::StaleHandle(handle))?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(handle.index);
        self.live -= 1;
        log::trace!("[scene] remove {}", node.label);
        Ok(node)
    }

    pub fn contains(&self, handle: Handle) -> bool {
        self.slots
            .get(handle.index as usize)
            .map(|slot| slot.node.is_some() && slot.generation == handle.generation)
            .unwrap_or(false)
    }

    pub fn get(&self, handle: Handle) -> Option<&SceneNode> {
        if !self.contains(handle) {
            return None;
        }
        self.slots[handle.index as usize].node.as_ref()
    }

    pub fn get_mut(&mut self, handle: Handle) -> Option<&mut SceneNode> {
        if !self.contains(handle) {
            return None;
        }
        self.slots[handle.index as usize].node.as_mut()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (Handle, &SceneNode)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.node
                .as_ref()
                .map(|node| (Handle::new(index as u32, slot.generation), node))
        })
    }

    /// Removes every remaining node and returns how many were released.
    pub fn clear(&mut self) -> usize {
        let handles: Vec<Handle> = self.iter().map(|(handle, _)| handle).collect();
        let released = handles
            .into_iter()
            .filter(|handle| self.remove(*handle).is_ok())
            .count();
        if released > 0 {
            log::debug!("[scene] released {released} remaining node(s)");
        }
        released
    }
}
