//! Hello-quad tutorial: compiles an inline shader pair, uploads a static
//! quad and draws it until the window closes or Escape is pressed.

use std::process::ExitCode;

use anyhow::anyhow;
use glam::Vec3;
use glow::HasContext;
use hello_modern_gl::abs::{App, Mesh, ShaderProgram, Vertex};
use hello_modern_gl::logging;
use log::{error, info};
use sdl2::event::{Event, WindowEvent};
use sdl2::keyboard::Keycode;

const WINDOW_WIDTH: u32 = 1024;
const WINDOW_HEIGHT: u32 = 768;

const VS_SOURCE: &str = r#"#version 330 core
layout (location = 0) in vec3 aPos;

void main()
{
    gl_Position = vec4(aPos.x, aPos.y, aPos.z, 1.0);
}
"#;

const FS_SOURCE: &str = r#"#version 330 core
out vec4 FragColor;

void main()
{
    FragColor = vec4(1.0, 0.5, 0.2, 1.0);
}
"#;

/// Clip-space position, the only attribute the tutorial shaders read.
#[derive(Clone, Copy)]
#[repr(C)]
struct QuadVertex {
    position: Vec3,
}

impl Vertex for QuadVertex {
    fn vertex_attribs(gl: &glow::Context) {
        unsafe {
            gl.vertex_attrib_pointer_f32(
                0,
                3,
                glow::FLOAT,
                false,
                std::mem::size_of::<QuadVertex>() as i32,
                0,
            );
            gl.enable_vertex_attrib_array(0);
        }
    }
}

const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex {
        position: Vec3::new(0.5, 0.5, 0.0), // top right
    },
    QuadVertex {
        position: Vec3::new(0.5, -0.5, 0.0), // bottom right
    },
    QuadVertex {
        position: Vec3::new(-0.5, -0.5, 0.0), // bottom left
    },
    QuadVertex {
        position: Vec3::new(-0.5, 0.5, 0.0), // top left
    },
];

const QUAD_INDICES: [u32; 6] = [0, 1, 3, 3, 2, 1];

fn run() -> anyhow::Result<()> {
    let mut app =
        App::new("hello", WINDOW_WIDTH, WINDOW_HEIGHT).map_err(|err| anyhow!(err))?;

    let program = ShaderProgram::from_sources(&app.gl, VS_SOURCE, FS_SOURCE)
        .map_err(|log| anyhow!("shader build failed: {log}"))?;
    let quad = Mesh::new(&app.gl, &QUAD_VERTICES, &QUAD_INDICES);

    unsafe {
        app.gl.clear_color(0.1, 0.1, 0.1, 1.0);
    }

    info!("entering render loop");
    'running: loop {
        for event in app.event_pump.poll_iter() {
            match event {
                Event::Quit { .. }
                | Event::KeyDown {
                    keycode: Some(Keycode::Escape),
                    ..
                } => break 'running,
                Event::Window {
                    win_event: WindowEvent::Resized(width, height),
                    ..
                } => unsafe {
                    app.gl.viewport(0, 0, width, height);
                },
                _ => {}
            }
        }

        unsafe {
            app.gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }
        program.use_program();
        quad.draw();

        app.window.gl_swap_window();
    }

    Ok(())
}

fn main() -> ExitCode {
    if let Err(err) = logging::init() {
        eprintln!("failed to set up logging: {err}");
        return ExitCode::FAILURE;
    }
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
