use super::panels::{PanelId, PanelStore};
use crate::render::{Camera, SurfaceRect};
use crate::scene::pick::PickingBackend;
use crate::scene::{Handle, SceneGraph};
use glam::Vec2;

/// Element a pointer event landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    RenderSurface,
    /// The control overlay drawn above the surface.
    Overlay,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub target: PointerTarget,
    pub client_x: f32,
    pub client_y: f32,
}

impl PointerEvent {
    pub fn on_surface(client_x: f32, client_y: f32) -> Self {
        Self {
            target: PointerTarget::RenderSurface,
            client_x,
            client_y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickOutcome {
    /// Event did not target the render surface.
    Ignored,
    Selected(PanelId),
    Created(PanelId),
    Deselected,
}

/// What a pick needs to see of the world for one event.
pub struct PickScene<'a> {
    pub camera: &'a Camera,
    pub bounds: SurfaceRect,
    pub ground: Option<Handle>,
    pub backend: &'a dyn PickingBackend,
}

/// Maps a client position to normalized device coordinates relative to the
/// surface's displayed rectangle.
pub fn normalized_device_coords(bounds: SurfaceRect, client_x: f32, client_y: f32) -> Option<Vec2> {
    if !bounds.is_usable() || !client_x.is_finite() || !client_y.is_finite() {
        return None;
    }
    Some(Vec2::new(
        (client_x - bounds.left) / bounds.width * 2.0 - 1.0,
        -((client_y - bounds.top) / bounds.height) * 2.0 + 1.0,
    ))
}

#[derive(Debug, Default)]
pub struct PickingController {
    placement_mode: bool,
}

impl PickingController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn placement_mode(&self) -> bool {
        self.placement_mode
    }

    pub fn set_placement_mode(&mut self, enabled: bool) {
        if self.placement_mode != enabled {
            log::debug!("[picking] placement mode {}", if enabled { "on" } else { "off" });
        }
        self.placement_mode = enabled;
    }

    /// Routes a pointer press to the store. Panels always win over the
    /// ground; the ground is only consulted in placement mode.
    pub fn pointer_down(
        &mut self,
        event: &PointerEvent,
        pick: &PickScene<'_>,
        store: &mut PanelStore,
        scene: &mut SceneGraph,
    ) -> PickOutcome {
        if event.target != PointerTarget::RenderSurface {
            return PickOutcome::Ignored;
        }
        let Some(ndc) = normalized_device_coords(pick.bounds, event.client_x, event.client_y) else {
            log::debug!("[picking] pointer event without a usable surface");
            return PickOutcome::Ignored;
        };
        let ray = pick.camera.ray_from_ndc(ndc);

        let panel_hits = pick.backend.intersect(scene, &ray, &store.pickable_handles());
        if let Some(nearest) = panel_hits.first() {
            match store.panel_for_handle(nearest.handle) {
                Some(id) => {
                    store.select_panel(scene, id);
                    self.set_placement_mode(false);
                    return PickOutcome::Selected(id);
                }
                None => log::warn!("[picking] hit {:?} has no owning panel", nearest.handle),
            }
        } else if self.placement_mode {
            if let Some(ground) = pick.ground {
                if let Some(hit) = pick.backend.intersect(scene, &ray, &[ground]).first() {
                    let id = store.create_panel(scene, hit.point).id();
                    self.set_placement_mode(false);
                    return PickOutcome::Created(id);
                }
            }
        }

        store.deselect_panel(scene);
        PickOutcome::Deselected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CameraConfig, PanelConfig};
    use crate::scene::pick::{GeometricPicker, Hit, Ray};
    use crate::scene::{Geometry, Material, SceneNode};
    use glam::Vec3;

    const BOUNDS: SurfaceRect = SurfaceRect::new(0.0, 0.0, 800.0, 600.0);

    struct Fixture {
        scene: SceneGraph,
        store: PanelStore,
        ground: Handle,
        camera: Camera,
        picking: PickingController,
    }

    impl Fixture {
        fn new() -> Self {
            let mut scene = SceneGraph::new();
            let ground = scene.add(SceneNode::mesh(
                "ground",
                Geometry::Plane {
                    size: Vec2::splat(50.0),
                },
                Material::flat(0x808080),
            ));
            Self {
                scene,
                store: PanelStore::new(PanelConfig::default()),
                ground,
                camera: Camera::new(&CameraConfig::default(), BOUNDS.aspect()),
                picking: PickingController::new(),
            }
        }

        fn click_world(&mut self, point: Vec3) -> PickOutcome {
            let client = self.camera.world_to_surface(point, BOUNDS).unwrap();
            self.click(PointerEvent::on_surface(client.x, client.y), &GeometricPicker)
        }

        fn click(&mut self, event: PointerEvent, backend: &dyn PickingBackend) -> PickOutcome {
            let pick = PickScene {
                camera: &self.camera,
                bounds: BOUNDS,
                ground: Some(self.ground),
                backend,
            };
            self.picking
                .pointer_down(&event, &pick, &mut self.store, &mut self.scene)
        }
    }

    #[test]
    fn ndc_uses_displayed_rectangle() {
        let bounds = SurfaceRect::new(100.0, 20.0, 400.0, 200.0);
        assert_eq!(normalized_device_coords(bounds, 100.0, 20.0), Some(Vec2::new(-1.0, 1.0)));
        assert_eq!(normalized_device_coords(bounds, 300.0, 120.0), Some(Vec2::ZERO));
        assert_eq!(normalized_device_coords(bounds, 500.0, 220.0), Some(Vec2::new(1.0, -1.0)));
        assert_eq!(normalized_device_coords(SurfaceRect::from_size(0.0, 10.0), 1.0, 1.0), None);
    }

    #[test]
    fn overlay_clicks_are_ignored() {
        let mut fixture = Fixture::new();
        fixture.picking.set_placement_mode(true);

        let event = PointerEvent {
            target: PointerTarget::Overlay,
            client_x: 400.0,
            client_y: 300.0,
        };
        assert_eq!(fixture.click(event, &GeometricPicker), PickOutcome::Ignored);
        assert!(fixture.store.is_empty());
        assert!(fixture.picking.placement_mode());
    }

    #[test]
    fn ground_click_in_placement_mode_creates_once() {
        let mut fixture = Fixture::new();
        fixture.picking.set_placement_mode(true);

        let outcome = fixture.click_world(Vec3::new(2.0, 0.0, 1.0));
        let PickOutcome::Created(id) = outcome else {
            panic!("expected creation, got {outcome:?}");
        };
        assert!(!fixture.picking.placement_mode());
        assert_eq!(fixture.store.selected_id(), Some(id));
        let anchor = fixture.store.get(id).unwrap().anchor();
        assert!(anchor.abs_diff_eq(Vec3::new(2.0, 0.0, 1.0), 1e-2));

        // Placement disengaged: the next ground click only deselects.
        assert_eq!(fixture.click_world(Vec3::new(-5.0, 0.0, -5.0)), PickOutcome::Deselected);
        assert_eq!(fixture.store.len(), 1);
        assert_eq!(fixture.store.selected_id(), None);
    }

    #[test]
    fn ground_click_outside_placement_mode_deselects() {
        let mut fixture = Fixture::new();
        fixture.store.create_panel(&mut fixture.scene, Vec3::new(-8.0, 0.0, -8.0));

        assert_eq!(fixture.click_world(Vec3::new(3.0, 0.0, 3.0)), PickOutcome::Deselected);
        assert_eq!(fixture.store.selected_id(), None);
    }

    #[test]
    fn selecting_a_panel_turns_placement_off() {
        let mut fixture = Fixture::new();
        let id = fixture.store.create_panel(&mut fixture.scene, Vec3::ZERO).id();
        fixture.store.deselect_panel(&mut fixture.scene);
        fixture.picking.set_placement_mode(true);

        let center = Vec3::new(0.0, PanelConfig::default().depth * 0.5, 0.0);
        assert_eq!(fixture.click_world(center), PickOutcome::Selected(id));
        assert!(!fixture.picking.placement_mode());
        assert_eq!(fixture.store.len(), 1);
    }

    #[test]
    fn missing_the_ground_deselects() {
        let mut fixture = Fixture::new();
        fixture.picking.set_placement_mode(true);

        // Top edge of the surface looks above the horizon.
        let outcome = fixture.click(PointerEvent::on_surface(400.0, 0.0), &GeometricPicker);
        assert_eq!(outcome, PickOutcome::Deselected);
        assert!(fixture.store.is_empty());
        assert!(fixture.picking.placement_mode());
    }

    /// Reports every live candidate as hit, the ground nearest of all.
    struct EverythingHit {
        ground: Handle,
    }

    impl PickingBackend for EverythingHit {
        fn intersect(&self, scene: &SceneGraph, ray: &Ray, candidates: &[Handle]) -> Vec<Hit> {
            let mut hits: Vec<Hit> = candidates
                .iter()
                .filter(|handle| scene.contains(**handle))
                .enumerate()
                .map(|(i, &handle)| {
                    let distance = if handle == self.ground { 0.5 } else { 10.0 - i as f32 };
                    Hit {
                        handle,
                        distance,
                        point: ray.at(distance),
                    }
                })
                .collect();
            hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
            hits
        }
    }

    #[test]
    fn panels_take_priority_over_a_nearer_ground() {
        let mut fixture = Fixture::new();
        let first = fixture.store.create_panel(&mut fixture.scene, Vec3::ZERO).id();
        let second = fixture.store.create_panel(&mut fixture.scene, Vec3::X).id();
        fixture.store.deselect_panel(&mut fixture.scene);
        fixture.picking.set_placement_mode(true);

        let backend = EverythingHit {
            ground: fixture.ground,
        };
        let outcome = fixture.click(PointerEvent::on_surface(400.0, 300.0), &backend);

        // The later candidate is nearer (9.0 < 10.0).
        assert_eq!(outcome, PickOutcome::Selected(second));
        assert_ne!(outcome, PickOutcome::Selected(first));
        assert_eq!(fixture.store.len(), 2);
    }

    /// Answers every query with a hit on one fixed node.
    struct StrayHit {
        handle: Handle,
    }

    impl PickingBackend for StrayHit {
        fn intersect(&self, _scene: &SceneGraph, ray: &Ray, _candidates: &[Handle]) -> Vec<Hit> {
            vec![Hit {
                handle: self.handle,
                distance: 4.0,
                point: ray.at(4.0),
            }]
        }
    }

    #[test]
    fn hit_without_an_owning_panel_counts_as_a_miss() {
        let mut fixture = Fixture::new();
        let stray = fixture.scene.add(SceneNode::mesh(
            "marker",
            Geometry::Cuboid {
                size: Vec3::ONE,
                offset: Vec3::ZERO,
            },
            Material::flat(0xff0000),
        ));
        fixture.store.create_panel(&mut fixture.scene, Vec3::new(5.0, 0.0, 5.0));
        fixture.picking.set_placement_mode(true);

        let outcome = fixture.click(PointerEvent::on_surface(400.0, 300.0), &StrayHit { handle: stray });

        assert_eq!(outcome, PickOutcome::Deselected);
        assert_eq!(fixture.store.selected_id(), None);
        assert_eq!(fixture.store.len(), 1);
        assert!(fixture.picking.placement_mode());
    }
}
