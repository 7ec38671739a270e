//! Shared pieces of the two OpenGL demo binaries: SDL2/GL abstractions,
//! OBJ model loading, the viewer's scene math, and the render-loop driver
//! that hands the GL context between threads.

pub mod abs;
pub mod driver;
pub mod logging;
pub mod model;
pub mod scene;
