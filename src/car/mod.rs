mod classify;
mod lighting;
mod materials;
mod steering;

#[cfg(test)]
pub(crate) mod fixtures;

pub use classify::{AuxiliaryPart, CarParts, WheelSet};
pub use lighting::LightRig;
pub use materials::{BindingSummary, MaterialBinder, PaintAnimation, PaintColor, BODY_PANEL_NODE};
pub use steering::{plan_steer, SteerCommand, SteerDirection, SteeringAnimation};
