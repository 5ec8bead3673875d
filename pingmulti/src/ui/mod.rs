//! Terminal user interface: scroll state, frame building, diff-based
//! drawing and the input and render tasks.

pub mod input;
pub mod render;
pub mod screen;
pub mod scroll;
pub mod view;

pub use input::Key;
pub use render::Renderer;
pub use screen::{Ctrl, Row, Screen, Segment};
pub use scroll::Scroller;
pub use view::View;
