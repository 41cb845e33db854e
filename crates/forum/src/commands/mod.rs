//! CLI command implementations.

pub(crate) mod render;
pub(crate) mod tags;

pub(crate) use render::RenderArgs;
