use super::events::{PanelNotification, SubscriberId};
use super::panels::{Panel, PanelStore};
use super::picking::PickingController;
use crate::scene::SceneGraph;
use crate::world::lighting::{LightRig, SUN_ALTITUDE_RANGE, SUN_AZIMUTH_RANGE};
use crate::world::orientation::{FULL_TURN_DEGREES, TILT_MAX_DEGREES, TILT_MIN_DEGREES};

/// Displayed content of a numeric field. `Inert` means there is nothing to
/// show and the field does not accept edits.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Inert,
    Value(f32),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumericField {
    label: &'static str,
    min: f32,
    max: f32,
    value: FieldValue,
}

impl NumericField {
    fn new(label: &'static str, (min, max): (f32, f32), value: FieldValue) -> Self {
        Self {
            label,
            min,
            max,
            value,
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn range(&self) -> (f32, f32) {
        (self.min, self.max)
    }

    pub fn value(&self) -> FieldValue {
        self.value
    }

    pub fn is_inert(&self) -> bool {
        self.value == FieldValue::Inert
    }

    fn clamp(&self, value: f32) -> f32 {
        value.clamp(self.min, self.max)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlEdit {
    PanelTilt(f32),
    PanelAzimuth(f32),
    SunAzimuth(f32),
    SunAltitude(f32),
    PlacementMode(bool),
    RemovePanel,
}

/// Components a control edit writes through to.
pub struct ControlTargets<'a> {
    pub store: &'a mut PanelStore,
    pub scene: &'a mut SceneGraph,
    pub lights: &'a mut LightRig,
    pub picking: &'a mut PickingController,
}

/// Property panel bound to the store, the light rig and the picking
/// controller. Selection-dependent fields refresh from the store's
/// notifications; the placement toggle re-reads the controller on every
/// sync.
pub struct ControlSurface {
    subscription: Option<SubscriberId>,
    tilt: NumericField,
    azimuth: NumericField,
    sun_azimuth: NumericField,
    sun_altitude: NumericField,
    placement_mode: bool,
    panel_section_open: bool,
}

impl ControlSurface {
    pub fn attach(store: &mut PanelStore, lights: &LightRig, picking: &PickingController) -> Self {
        let angles = lights.sun_angles();
        let mut surface = Self {
            subscription: Some(store.subscribe()),
            tilt: NumericField::new(
                "Tilt",
                (TILT_MIN_DEGREES, TILT_MAX_DEGREES),
                FieldValue::Inert,
            ),
            azimuth: NumericField::new("Azimuth", (0.0, FULL_TURN_DEGREES), FieldValue::Inert),
            sun_azimuth: NumericField::new(
                "Sun Azimuth",
                SUN_AZIMUTH_RANGE,
                FieldValue::Value(angles.azimuth_degrees),
            ),
            sun_altitude: NumericField::new(
                "Sun Altitude",
                SUN_ALTITUDE_RANGE,
                FieldValue::Value(angles.altitude_degrees),
            ),
            placement_mode: picking.placement_mode(),
            panel_section_open: false,
        };
        surface.show_selection(store.selected());
        log::debug!("[controls] attached");
        surface
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Forwards a user edit. Returns `false` when the edit was ignored
    /// (inert field, nothing to remove, or a detached surface).
    pub fn apply(&mut self, edit: ControlEdit, targets: ControlTargets<'_>) -> bool {
        if !self.is_attached() {
            return false;
        }
        let ControlTargets {
            store,
            scene,
            lights,
            picking,
        } = targets;

        let accepted = match edit {
            ControlEdit::PanelTilt(value) if !self.tilt.is_inert() && value.is_finite() => {
                store.update_tilt(scene, self.tilt.clamp(value));
                true
            }
            ControlEdit::PanelAzimuth(value) if !self.azimuth.is_inert() && value.is_finite() => {
                store.update_azimuth(scene, self.azimuth.clamp(value));
                true
            }
            ControlEdit::SunAzimuth(value) if value.is_finite() => {
                let altitude = lights.sun_angles().altitude_degrees;
                lights.set_sun_angles(scene, self.sun_azimuth.clamp(value), altitude);
                true
            }
            ControlEdit::SunAltitude(value) if value.is_finite() => {
                let azimuth = lights.sun_angles().azimuth_degrees;
                lights.set_sun_angles(scene, azimuth, self.sun_altitude.clamp(value));
                true
            }
            ControlEdit::PlacementMode(enabled) => {
                picking.set_placement_mode(enabled);
                true
            }
            ControlEdit::RemovePanel => store.remove_selected(scene).is_some(),
            _ => false,
        };

        if !accepted {
            log::debug!("[controls] ignored {edit:?}");
        }
        if matches!(edit, ControlEdit::PanelTilt(_) | ControlEdit::PanelAzimuth(_)) {
            self.show_selection(store.selected());
        }
        self.refresh_environment(lights);
        self.sync(store, picking);
        accepted
    }

    /// Drains pending store notifications and re-reads the placement flag.
    /// The panel fields follow the latest selection change. Returns the
    /// number of notifications consumed.
    pub fn sync(&mut self, store: &mut PanelStore, picking: &PickingController) -> usize {
        let Some(subscription) = self.subscription else {
            return 0;
        };
        let notifications = store.drain_notifications(subscription);
        if let Some(PanelNotification::SelectionChanged { previous, current }) = notifications.last() {
            log::trace!("[controls] selection {previous:?} -> {current:?}");
            let panel = current.and_then(|id| store.get(id));
            self.show_selection(panel);
        }
        self.placement_mode = picking.placement_mode();
        notifications.len()
    }

    /// Unsubscribes from the store. Later calls are no-ops.
    pub fn detach(&mut self, store: &mut PanelStore) {
        let Some(subscription) = self.subscription.take() else {
            return;
        };
        store.unsubscribe(subscription);
        self.show_selection(None);
        log::debug!("[controls] detached");
    }

    pub fn tilt(&self) -> &NumericField {
        &self.tilt
    }

    pub fn azimuth(&self) -> &NumericField {
        &self.azimuth
    }

    pub fn sun_azimuth(&self) -> &NumericField {
        &self.sun_azimuth
    }

    pub fn sun_altitude(&self) -> &NumericField {
        &self.sun_altitude
    }

    pub fn placement_mode(&self) -> bool {
        self.placement_mode
    }

    /// Whether the selected-panel section is expanded.
    pub fn panel_section_open(&self) -> bool {
        self.panel_section_open
    }

    fn show_selection(&mut self, panel: Option<&Panel>) {
        match panel {
            Some(panel) => {
                self.tilt.value = FieldValue::Value(panel.tilt_degrees());
                self.azimuth.value = FieldValue::Value(panel.azimuth_degrees());
                self.panel_section_open = true;
            }
            None => {
                self.tilt.value = FieldValue::Inert;
                self.azimuth.value = FieldValue::Inert;
                self.panel_section_open = false;
            }
        }
    }

    fn refresh_environment(&mut self, lights: &LightRig) {
        let angles = lights.sun_angles();
        self.sun_azimuth.value = FieldValue::Value(angles.azimuth_degrees);
        self.sun_altitude.value = FieldValue::Value(angles.altitude_degrees);
    }
}
