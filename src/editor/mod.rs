pub mod controls;
pub mod events;
pub mod panels;
pub mod picking;

pub use controls::{ControlEdit, ControlSurface, ControlTargets, FieldValue, NumericField};
pub use events::{NotificationChannel, PanelNotification, SubscriberId};
pub use panels::{Panel, PanelId, PanelStore};
pub use picking::{
    PickOutcome, PickScene, PickingController, PointerEvent, PointerTarget,
    normalized_device_coords,
};
