pub mod frame;
pub mod hit;
pub mod raster;
pub mod svg;
pub mod viewport;

pub use frame::{CanvasTheme, Decoration, RenderOptions};
pub use hit::{
    Handle, HandleKind, PointerTarget, RubberBandMode, container_at, hit_test, hit_test_rect,
    resolve_pointer,
};
pub use raster::{RasterError, render_png};
pub use svg::render_svg;
pub use viewport::{ViewState, Viewport};
