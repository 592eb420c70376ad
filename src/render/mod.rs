pub mod canvas;
pub mod color;
pub mod compositor;
pub mod skeleton;
pub mod sprite;
#[cfg(feature = "desktop")]
pub mod window;

pub use canvas::Canvas;
pub use color::Color;
pub use compositor::{Compositor, Style};
pub use skeleton::{LegJoint, BONE_CONNECTIONS};
pub use sprite::{FillRatios, SegmentRole, Sprite, SpriteSet};
#[cfg(feature = "desktop")]
pub use window::PreviewWindow;
