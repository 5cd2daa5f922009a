use crate::assets::{AssetLoader, TextureLoadEvent};
use crate::config::GroundConfig;
use crate::scene::{Geometry, Handle, Material, SceneGraph, SceneNode, TextureSlot};
use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroundTexture {
    /// No texture configured; flat ground color.
    Untextured,
    Pending,
    Loaded,
    /// Load failed; flat fallback color.
    Fallback,
}

/// The placement surface: a square plane at y = 0.
pub struct Ground {
    handle: Option<Handle>,
    fallback_color: u32,
    texture: GroundTexture,
}

impl Ground {
    pub fn new(scene: &mut SceneGraph, config: &GroundConfig, loader: &mut dyn AssetLoader) -> Self {
        let mut material = Material::flat(config.color);
        let path = config.texture_path.clone();
        if let Some(path) = &path {
            material.color = 0xffffff;
            material.texture = TextureSlot::Pending(path.clone());
        }

        let handle = scene.add(SceneNode::mesh(
            "GroundPlane",
            Geometry::Plane {
                size: Vec2::splat(config.size),
            },
            material,
        ));

        let mut ground = Self {
            handle: Some(handle),
            fallback_color: config.fallback_color,
            texture: GroundTexture::Untextured,
        };

        if let Some(path) = path {
            match loader.request_texture(handle, &path) {
                Ok(()) => ground.texture = GroundTexture::Pending,
                Err(err) => {
                    log::error!(
                        "[ground] failed to start loading {}: {err}",
                        path.display()
                    );
                    ground.apply_fallback(scene);
                }
            }
        }

        log::info!(
            "[ground] initialized ({} x {}, texture {:?})",
            config.size,
            config.size,
            ground.texture
        );
        ground
    }

    pub fn handle(&self) -> Option<Handle> {
        self.handle
    }

    pub fn texture(&self) -> GroundTexture {
        self.texture
    }

    /// Applies a texture completion. Returns `false` when the completion is
    /// not for this ground or the ground node is no longer live.
    pub fn apply_texture(&mut self, scene: &mut SceneGraph, event: TextureLoadEvent) -> bool {
        let live = self
            .handle
            .is_some_and(|handle| handle == event.owner && scene.contains(handle));
        if !live {
            log::debug!(
                "[ground] dropping texture completion for {} (owner released)",
                event.path.display()
            );
            return false;
        }

        match event.result {
            Ok(data) => {
                let Some(material) = self.material_mut(scene) else {
                    return false;
                };
                material.texture = TextureSlot::Loaded {
                    path: data.path,
                    byte_len: data.bytes.len(),
                };
                self.texture = GroundTexture::Loaded;
                log::info!("[ground] texture loaded from {}", event.path.display());
            }
            Err(err) => {
                log::error!(
                    "[ground] error loading texture from {}: {err}",
                    event.path.display()
                );
                self.apply_fallback(scene);
            }
        }
        true
    }

    pub fn dispose(&mut self, scene: &mut SceneGraph) {
        if let Some(handle) = self.handle.take() {
            if scene.remove(handle).is_err() {
                log::debug!("[ground] ground node was already released");
            }
        }
    }

    fn apply_fallback(&mut self, scene: &mut SceneGraph) {
        let color = self.fallback_color;
        if let Some(material) = self.material_mut(scene) {
            *material = Material::flat(color);
        }
        self.texture = GroundTexture::Fallback;
    }

    fn material_mut<'a>(&self, scene: &'a mut SceneGraph) -> Option<&'a mut Material> {
        scene.get_mut(self.handle?)?.material_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetError, DeferredAssetLoader, TextureData};
    use std::path::PathBuf;

    fn textured_config(path: PathBuf) -> GroundConfig {
        GroundConfig {
            texture_path: Some(path),
            ..GroundConfig::default()
        }
    }

    fn material(scene: &SceneGraph, ground: &Ground) -> Material {
        scene
            .get(ground.handle().unwrap())
            .and_then(SceneNode::material)
            .cloned()
            .expect("ground material")
    }

    #[test]
    fn untextured_ground_uses_flat_color() {
        let mut scene = SceneGraph::new();
        let mut loader = DeferredAssetLoader::new();
        let config = GroundConfig {
            texture_path: None,
            ..GroundConfig::default()
        };
        let ground = Ground::new(&mut scene, &config, &mut loader);

        assert_eq!(ground.texture(), GroundTexture::Untextured);
        assert_eq!(material(&scene, &ground).color, config.color);
        assert_eq!(loader.pending(), 0);
    }

    #[test]
    fn successful_load_marks_texture_loaded() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), b"texels").unwrap();
        let mut scene = SceneGraph::new();
        let mut loader = DeferredAssetLoader::new();
        let mut ground = Ground::new(&mut scene, &textured_config(file.path().into()), &mut loader);
        assert_eq!(ground.texture(), GroundTexture::Pending);

        for event in loader.poll_completed() {
            assert!(ground.apply_texture(&mut scene, event));
        }

        assert_eq!(ground.texture(), GroundTexture::Loaded);
        assert!(matches!(
            material(&scene, &ground).texture,
            TextureSlot::Loaded { byte_len: 6, .. }
        ));
    }

    #[test]
    fn failed_load_falls_back_to_flat_material() {
        let dir = tempfile::tempdir().unwrap();
        let mut scene = SceneGraph::new();
        let mut loader = DeferredAssetLoader::new();
        let config = textured_config(dir.path().join("missing.png"));
        let mut ground = Ground::new(&mut scene, &config, &mut loader);

        for event in loader.poll_completed() {
            assert!(ground.apply_texture(&mut scene, event));
        }

        assert_eq!(ground.texture(), GroundTexture::Fallback);
        let material = material(&scene, &ground);
        assert_eq!(material.color, config.fallback_color);
        assert_eq!(material.texture, TextureSlot::None);
        assert!(scene.contains(ground.handle().unwrap()));
    }

    #[test]
    fn completion_after_dispose_is_dropped() {
        let mut scene = SceneGraph::new();
        let mut loader = DeferredAssetLoader::new();
        let mut ground = Ground::new(
            &mut scene,
            &textured_config(PathBuf::from("late.png")),
            &mut loader,
        );
        let owner = ground.handle().unwrap();
        ground.dispose(&mut scene);

        // A new node may reuse the slot; the generation keeps it distinct.
        let reused = scene.add(SceneNode::mesh(
            "other",
            Geometry::Plane { size: Vec2::ONE },
            Material::flat(0x123456),
        ));
        assert_eq!(reused.index(), owner.index());

        let late = TextureLoadEvent {
            owner,
            path: PathBuf::from("late.png"),
            result: Ok(TextureData {
                path: PathBuf::from("late.png"),
                bytes: vec![1, 2, 3],
            }),
        };
        assert!(!ground.apply_texture(&mut scene, late));
        assert_eq!(
            scene.get(reused).and_then(SceneNode::material).map(|m| m.color),
            Some(0x123456)
        );
    }

    #[test]
    fn completion_for_live_node_with_stale_generation_is_dropped() {
        let mut scene = SceneGraph::new();
        let mut loader = DeferredAssetLoader::new();
        let mut ground = Ground::new(
            &mut scene,
            &textured_config(PathBuf::from("a.png")),
            &mut loader,
        );
        let owner = ground.handle().unwrap();
        let stale_owner = Handle::new(owner.index(), owner.generation() + 1);

        let event = TextureLoadEvent {
            owner: stale_owner,
            path: PathBuf::from("a.png"),
            result: Err(AssetError::Empty(PathBuf::from("a.png"))),
        };
        assert!(!ground.apply_texture(&mut scene, event));
        assert_eq!(ground.texture(), GroundTexture::Pending);
    }

    #[test]
    fn dispose_is_idempotent() {
        let mut scene = SceneGraph::new();
        let mut loader = DeferredAssetLoader::new();
        let mut ground = Ground::new(&mut scene, &GroundConfig::default(), &mut loader);

        ground.dispose(&mut scene);
        ground.dispose(&mut scene);
        assert!(ground.handle().is_none());
        assert!(scene.is_empty());
    }
}
