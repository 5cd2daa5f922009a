use super::events::{NotificationChannel, PanelNotification, SubscriberId};
use crate::config::PanelConfig;
use crate::scene::{Geometry, Handle, Material, NodeTransform, SceneGraph, SceneNode};
use crate::world::orientation::{clamp_tilt, orient, wrap_azimuth};
use glam::{Quat, Vec3};
use std::fmt;

const UNSELECTED_EMISSIVE: u32 = 0x000000;

/// Identifier of a placed panel. Assigned at creation and never reused
/// within a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PanelId(u64);

impl PanelId {
    pub(crate) const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for PanelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "panel-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Panel {
    id: PanelId,
    anchor: Vec3,
    tilt_degrees: f32,
    azimuth_degrees: f32,
    handle: Handle,
}

impl Panel {
    pub fn id(&self) -> PanelId {
        self.id
    }

    /// Ground point chosen at placement.
    pub fn anchor(&self) -> Vec3 {
        self.anchor
    }

    pub fn tilt_degrees(&self) -> f32 {
        self.tilt_degrees
    }

    pub fn azimuth_degrees(&self) -> f32 {
        self.azimuth_degrees
    }

    /// Scene node carrying the panel's geometry, material and transform.
    pub fn handle(&self) -> Handle {
        self.handle
    }

    pub fn orientation(&self) -> Quat {
        orient(self.tilt_degrees, self.azimuth_degrees)
    }
}

/// Owns the placed panels and the single selection.
pub struct PanelStore {
    panels: Vec<Panel>,
    selected: Option<PanelId>,
    next_id: u64,
    style: PanelConfig,
    channel: NotificationChannel,
}

impl PanelStore {
    pub fn new(style: PanelConfig) -> Self {
        Self {
            panels: Vec::new(),
            selected: None,
            next_id: 1,
            style,
            channel: NotificationChannel::new(),
        }
    }

    pub fn subscribe(&mut self) -> SubscriberId {
        self.channel.subscribe()
    }

    pub fn unsubscribe(&mut self, subscriber: SubscriberId) -> bool {
        self.channel.unsubscribe(subscriber)
    }

    pub fn drain_notifications(&mut self, subscriber: SubscriberId) -> Vec<PanelNotification> {
        self.channel.drain(subscriber)
    }

    pub fn subscriber_count(&self) -> usize {
        self.channel.subscriber_count()
    }

    /// Places a new panel at `point` with both angles at zero and selects it.
    pub fn create_panel(&mut self, scene: &mut SceneGraph, point: Vec3) -> &Panel {
        let id = PanelId(self.next_id);
        self.next_id += 1;

        let style = &self.style;
        let geometry = Geometry::Cuboid {
            size: Vec3::new(style.width, style.thickness, style.depth),
            offset: Vec3::new(0.0, style.thickness * 0.5, 0.0),
        };
        let material = Material {
            roughness: 0.5,
            metalness: 0.1,
            ..Material::flat(style.color)
        };
        let transform = NodeTransform {
            translation: point + Vec3::Y * (style.depth * 0.5),
            rotation: orient(0.0, 0.0),
        };
        let handle = scene.add(
            SceneNode::mesh(format!("SolarPanel {id}"), geometry, material).with_transform(transform),
        );

        let index = self.panels.len();
        self.panels.push(Panel {
            id,
            anchor: point,
            tilt_degrees: 0.0,
            azimuth_degrees: 0.0,
            handle,
        });
        log::info!(
            "[panels] created {id} at ({:.2}, {:.2})",
            point.x,
            point.z
        );

        self.transition_selection(scene, Some(id));
        &self.panels[index]
    }

    /// Selects `id`, replacing any current selection in a single transition.
    /// Unknown or already-selected ids are ignored.
    pub fn select_panel(&mut self, scene: &mut SceneGraph, id: PanelId) {
        if self.selected == Some(id) || self.get(id).is_none() {
            return;
        }
        self.transition_selection(scene, Some(id));
    }

    pub fn deselect_panel(&mut self, scene: &mut SceneGraph) {
        if self.selected.is_none() {
            return;
        }
        self.transition_selection(scene, None);
    }

    /// Deselects and removes the selected panel, releasing its scene node.
    pub fn remove_selected(&mut self, scene: &mut SceneGraph) -> Option<PanelId> {
        let id = self.selected?;
        self.deselect_panel(scene);

        let Some(index) = self.panels.iter().position(|panel| panel.id == id) else {
            log::debug!("[panels] {id} was not in the store during removal");
            return None;
        };
        let panel = self.panels.remove(index);
        release(scene, &panel);
        log::info!("[panels] removed {id}");
        Some(id)
    }

    pub fn update_tilt(&mut self, scene: &mut SceneGraph, degrees: f32) {
        if !degrees.is_finite() {
            log::warn!("[panels] ignoring non-finite tilt {degrees}");
            return;
        }
        if let Some(panel) = self.selected_mut() {
            panel.tilt_degrees = clamp_tilt(degrees);
            let panel = panel.clone();
            apply_orientation(scene, &panel);
        }
    }

    pub fn update_azimuth(&mut self, scene: &mut SceneGraph, degrees: f32) {
        if !degrees.is_finite() {
            log::warn!("[panels] ignoring non-finite azimuth {degrees}");
            return;
        }
        if let Some(panel) = self.selected_mut() {
            panel.azimuth_degrees = wrap_azimuth(degrees);
            let panel = panel.clone();
            apply_orientation(scene, &panel);
        }
    }

    pub fn selected(&self) -> Option<&Panel> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn selected_id(&self) -> Option<PanelId> {
        self.selected
    }

    pub fn get(&self, id: PanelId) -> Option<&Panel> {
        self.panels.iter().find(|panel| panel.id == id)
    }

    pub fn panels(&self) -> &[Panel] {
        &self.panels
    }

    pub fn pickable_handles(&self) -> Vec<Handle> {
        self.panels.iter().map(|panel| panel.handle).collect()
    }

    pub fn panel_for_handle(&self, handle: Handle) -> Option<PanelId> {
        self.panels
            .iter()
            .find(|panel| panel.handle == handle)
            .map(|panel| panel.id)
    }

    pub fn len(&self) -> usize {
        self.panels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panels.is_empty()
    }

    /// Removes and releases every panel in insertion order.
    pub fn dispose(&mut self, scene: &mut SceneGraph) {
        if self.panels.is_empty() && self.selected.is_none() {
            return;
        }
        self.deselect_panel(scene);
        let count = self.panels.len();
        for panel in self.panels.drain(..) {
            release(scene, &panel);
        }
        log::info!("[panels] disposed {count} panel(s)");
    }

    fn selected_mut(&mut self) -> Option<&mut Panel> {
        let id = self.selected?;
        self.panels.iter_mut().find(|panel| panel.id == id)
    }

    fn transition_selection(&mut self, scene: &mut SceneGraph, next: Option<PanelId>) {
        let previous = self.selected;
        if previous == next {
            return;
        }

        if let Some(panel) = previous.and_then(|id| self.get(id)) {
            set_emissive(scene, panel, UNSELECTED_EMISSIVE);
        }
        self.selected = next;
        if let Some(panel) = self.selected() {
            set_emissive(scene, panel, self.style.selected_emissive);
        }

        match (previous, next) {
            (Some(from), Some(to)) => log::debug!("[panels] selection {from} -> {to}"),
            (None, Some(to)) => log::debug!("[panels] selected {to}"),
            (Some(from), None) => log::debug!("[panels] deselected {from}"),
            (None, None) => {}
        }
        self.channel.publish(PanelNotification::SelectionChanged {
            previous,
            current: next,
        });
    }
}

fn apply_orientation(scene: &mut SceneGraph, panel: &Panel) {
    match scene.get_mut(panel.handle) {
        Some(node) => node.transform.rotation = panel.orientation(),
        None => log::debug!("[panels] {} has no live node to orient", panel.id),
    }
}

fn set_emissive(scene: &mut SceneGraph, panel: &Panel, emissive: u32) {
    if let Some(material) = scene.get_mut(panel.handle).and_then(SceneNode::material_mut) {
        material.emissive = emissive;
    }
}

fn release(scene: &mut SceneGraph, panel: &Panel) {
    if scene.remove(panel.handle).is_err() {
        log::debug!("[panels] {} node was already released", panel.id);
    }
}
