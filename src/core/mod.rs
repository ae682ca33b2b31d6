//! Core recipe logic — types, patching, version gates, resolution, validation, scaling.

pub mod patch;
pub mod render;
pub mod resolver;
pub mod scale;
pub mod types;
pub mod validate;
pub mod version;
