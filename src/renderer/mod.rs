//! Rendering
//!
//! Backend-agnostic: the game builds colored triangle lists in world space and
//! submits them through [`RenderTarget`]. Projection, fonts and GPU upload are
//! the target's business.

pub mod dispatch;
pub mod shapes;
pub mod vertex;

pub use dispatch::{
    forward, render_run, FrameCollector, HudInfo, Layer, RenderTarget, TextItem, TextKind,
};
pub use vertex::Vertex;
