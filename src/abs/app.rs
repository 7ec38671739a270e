//! SDL2 and OpenGL application bootstrap.
//!
//! This module defines the [`App`] struct which encapsulates the SDL2
//! and OpenGL context necessary for creating a windowed application.

use std::sync::Arc;

/// The [`App`] struct encapsulates the SDL2 and OpenGL context.
pub struct App {
    pub sdl: sdl2::Sdl,
    pub video_subsystem: sdl2::VideoSubsystem,
    pub window: sdl2::video::Window,
    pub gl_context: sdl2::video::GLContext,
    pub gl: Arc<glow::Context>,
    pub event_pump: sdl2::EventPump,
}

impl App {
    /// Creates a resizable window of the given size with a core-profile
    /// OpenGL 3.3 context made current on the calling thread.
    ///
    /// Every fallible step surfaces the SDL error text; callers treat any
    /// of them as fatal.
    pub fn new(title: &str, width: u32, height: u32) -> Result<Self, String> {
        let sdl = sdl2::init()?;
        let video_subsystem = sdl.video()?;
        let gl_attr = video_subsystem.gl_attr();
        gl_attr.set_context_profile(sdl2::video::GLProfile::Core);
        gl_attr.set_context_version(3, 3);
        let window = video_subsystem
            .window(title, width, height)
            .opengl()
            .resizable()
            .build()
            .map_err(|e| e.to_string())?;
        let gl_context = window.gl_create_context()?;
        window.gl_make_current(&gl_context)?;
        let gl = unsafe {
            glow::Context::from_loader_function(|s| {
                video_subsystem.gl_get_proc_address(s) as *const _
            })
        };
        let event_pump = sdl.event_pump()?;

        Ok(Self {
            sdl,
            video_subsystem,
            window,
            gl_context,
            gl: Arc::new(gl),
            event_pump,
        })
    }
}
