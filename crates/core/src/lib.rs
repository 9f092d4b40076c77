//! Core shared types and errors (renderer-agnostic).

pub use glam::{Vec2, Vec3, vec2, vec3};

pub mod error;

pub use error::{AssetError, AssetResult, MaterialFieldError};
