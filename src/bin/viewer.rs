//! Textured model viewer: spins an OBJ model in front of a fixed camera
//! while the GL context is handed across two worker threads and finally
//! back to the main thread.

use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::{Duration, Instant};

use anyhow::{Context, anyhow};
use glow::HasContext;
use hello_modern_gl::abs::{App, ShaderProgram, Texture};
use hello_modern_gl::driver::{self, ExitFlag, RenderSurface};
use hello_modern_gl::model::{Model, ObjData};
use hello_modern_gl::{logging, scene};
use log::{error, info};

const WINDOW_WIDTH: u32 = 1024;
const WINDOW_HEIGHT: u32 = 768;

const MESH_PATH: &str = "res/models/alliance.obj";
const TEXTURE_PATH: &str = "res/models/alliance.png";
const VERT_PATH: &str = "res/shaders/basic.vert";
const FRAG_PATH: &str = "res/shaders/basic.frag";

/// How long each worker thread owns the render loop.
const FIRST_PHASE: Duration = Duration::from_secs(5);
const SECOND_PHASE: Duration = Duration::from_secs(6);

/// Everything a render thread needs to draw frames: the window, its GL
/// context, the loaded resources and the inputs fed in from the event pump.
///
/// Fields drop in declaration order: the GL resources must be listed
/// before the context and window they delete against.
struct ViewerSurface {
    program: ShaderProgram,
    texture: Texture,
    model: Model,
    gl: Arc<glow::Context>,
    gl_context: sdl2::video::GLContext,
    window: sdl2::video::Window,
    started: Instant,
    resizes: Receiver<(u32, u32)>,
    close: Arc<AtomicBool>,
}

// SAFETY: the surface moves between threads as a whole and is only touched
// by the thread currently holding it; the GL context is made current in
// `bind` and released in `unbind` before the value reaches the next owner.
unsafe impl Send for ViewerSurface {}

impl ViewerSurface {
    fn apply_resize(&mut self, width: u32, height: u32) {
        unsafe {
            self.gl.viewport(0, 0, width as i32, height as i32);
        }
        self.program.use_program();
        self.program.set_uniform(
            "viewProj",
            scene::projection_matrix(width, height) * scene::view_matrix(),
        );
    }
}

impl RenderSurface for ViewerSurface {
    fn bind(&mut self) {
        if let Err(err) = self.window.gl_make_current(&self.gl_context) {
            error!("failed to make the GL context current: {err}");
        }
    }

    fn unbind(&mut self) {
        unsafe {
            sdl2::sys::SDL_GL_MakeCurrent(std::ptr::null_mut(), std::ptr::null_mut());
        }
    }

    fn draw_frame(&mut self) {
        while let Ok((width, height)) = self.resizes.try_recv() {
            self.apply_resize(width, height);
        }

        unsafe {
            self.gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);
        }

        let world = scene::world_matrix(self.started.elapsed().as_secs_f32());
        self.program.use_program();
        self.program.set_uniform("world", world);
        self.program
            .set_uniform("normalMatrix", scene::normal_matrix(&world));
        self.texture.bind_to_unit(0);
        self.model.draw();

        self.window.gl_swap_window();
    }

    fn close_requested(&self) -> bool {
        self.close.load(Ordering::Acquire)
    }
}

fn pump_events(
    event_pump: &mut sdl2::EventPump,
    resizes: &Sender<(u32, u32)>,
    close: &AtomicBool,
) {
    for event in event_pump.poll_iter() {
        match event {
            sdl2::event::Event::Quit { .. } => {
                close.store(true, Ordering::Release);
            }
            sdl2::event::Event::Window {
                win_event: sdl2::event::WindowEvent::Resized(width, height),
                ..
            } => {
                let _ = resizes.send((width as u32, height as u32));
            }
            _ => {}
        }
    }
}

/// Pumps window events on the main thread for the given wall-clock span
/// while a worker owns the render surface.
fn pump_events_for(
    span: Duration,
    event_pump: &mut sdl2::EventPump,
    resizes: &Sender<(u32, u32)>,
    close: &AtomicBool,
) {
    let deadline = Instant::now() + span;
    while Instant::now() < deadline && !close.load(Ordering::Acquire) {
        pump_events(event_pump, resizes, close);
        std::thread::sleep(Duration::from_millis(10));
    }
}

fn run() -> anyhow::Result<()> {
    let app = App::new("Hello Modern GL!", WINDOW_WIDTH, WINDOW_HEIGHT)
        .map_err(|err| anyhow!(err))
        .context("window and GL context setup failed")?;
    let App {
        sdl: _sdl,
        video_subsystem: _video,
        window,
        gl_context,
        gl,
        mut event_pump,
    } = app;

    unsafe {
        gl.clear_color(0.6784, 0.8, 1.0, 1.0);
        gl.viewport(0, 0, WINDOW_WIDTH as i32, WINDOW_HEIGHT as i32);
        gl.enable(glow::DEPTH_TEST);
    }

    info!("loading {MESH_PATH}");
    let mesh_data = ObjData::open(MESH_PATH).map_err(|err| anyhow!(err))?;
    let model = Model::new(&gl, &mesh_data);
    let texture = Texture::open(&gl, TEXTURE_PATH).map_err(|err| anyhow!(err))?;

    let vertex_src =
        std::fs::read_to_string(VERT_PATH).with_context(|| format!("reading {VERT_PATH}"))?;
    let fragment_src =
        std::fs::read_to_string(FRAG_PATH).with_context(|| format!("reading {FRAG_PATH}"))?;
    let program = ShaderProgram::from_sources(&gl, &vertex_src, &fragment_src)
        .map_err(|log| anyhow!("shader build failed: {log}"))?;

    program.use_program();
    let world = scene::world_matrix(0.0);
    program.set_uniform("world", world);
    program.set_uniform("normalMatrix", scene::normal_matrix(&world));
    program.set_uniform(
        "viewProj",
        scene::projection_matrix(WINDOW_WIDTH, WINDOW_HEIGHT) * scene::view_matrix(),
    );
    program.set_uniform("cam_pos", scene::CAM_POSITION);
    program.set_uniform("tex", 0);

    let (resize_tx, resize_rx) = mpsc::channel();
    let close = Arc::new(AtomicBool::new(false));

    let mut surface = ViewerSurface {
        program,
        texture,
        model,
        gl,
        gl_context,
        window,
        started: Instant::now(),
        resizes: resize_rx,
        close: Arc::clone(&close),
    };

    // release the context so the first worker can claim it
    surface.unbind();

    info!("handing the context to render worker 1");
    let first = ExitFlag::new();
    let worker = driver::spawn_driver(surface, first.clone());
    pump_events_for(FIRST_PHASE, &mut event_pump, &resize_tx, &close);
    first.lower();
    let surface = worker
        .join()
        .map_err(|_| anyhow!("render worker 1 panicked"))?;

    info!("handing the context to render worker 2");
    let second = ExitFlag::new();
    let worker = driver::spawn_driver(surface, second.clone());
    pump_events_for(SECOND_PHASE, &mut event_pump, &resize_tx, &close);
    second.lower();
    let mut surface = worker
        .join()
        .map_err(|_| anyhow!("render worker 2 panicked"))?;

    info!("main thread reclaiming the context");
    surface.bind();
    while !surface.close_requested() {
        pump_events(&mut event_pump, &resize_tx, &close);
        surface.draw_frame();
    }

    // the context stays current on the main thread so the GL resource
    // drops can delete against it
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
