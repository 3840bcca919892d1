pub mod background;
pub mod color;
pub mod glass;
pub mod params;
pub mod renderer;
pub mod surface;

pub use background::BackgroundImage;
pub use params::{GlassSurfaceParameters, ParamAdjustment, ResolvedGlass};
