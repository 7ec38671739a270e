//! Render-loop driving and single-owner context handoff.
//!
//! OpenGL only accepts calls from the thread the context is current on, so
//! at most one thread may drive rendering at any instant. The surface value
//! itself acts as the ownership token: it moves onto a worker through
//! [`spawn_driver`] and comes back through `join`, so the next owner can
//! only claim the context after the previous one has released it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

/// One-way exit signal for a render loop.
///
/// The flag starts raised and can only ever be lowered; there is no way to
/// raise it again, so a loop that observed the lowered state never resumes.
#[derive(Clone)]
pub struct ExitFlag(Arc<AtomicBool>);

impl ExitFlag {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    /// Tells the owning loop to finish its current frame and stop.
    pub fn lower(&self) {
        self.0.store(false, Ordering::Release);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl Default for ExitFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// A render target claimed by exactly one thread at a time.
pub trait RenderSurface {
    /// Makes the GL context current on the calling thread.
    fn bind(&mut self);

    /// Releases the GL context from the calling thread.
    fn unbind(&mut self);

    /// Renders and presents one frame.
    fn draw_frame(&mut self);

    /// True once the window manager has asked to close the window.
    fn close_requested(&self) -> bool;
}

/// Drives the render loop on the calling thread until `flag` is lowered or
/// the window is closing. The context is bound before the first frame and
/// released after the last one.
pub fn drive<S: RenderSurface>(surface: &mut S, flag: &ExitFlag) {
    surface.bind();
    while flag.is_raised() && !surface.close_requested() {
        surface.draw_frame();
    }
    surface.unbind();
}

/// Moves the surface onto a worker thread and drives it there. The surface
/// is handed back through the returned handle's `join`.
pub fn spawn_driver<S>(mut surface: S, flag: ExitFlag) -> JoinHandle<S>
where
    S: RenderSurface + Send + 'static,
{
    thread::spawn(move || {
        drive(&mut surface, &flag);
        surface
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    struct StubSurface {
        binds: u32,
        unbinds: u32,
        frames: Arc<AtomicU32>,
        close_after: Option<u32>,
    }

    impl StubSurface {
        fn new() -> Self {
            Self {
                binds: 0,
                unbinds: 0,
                frames: Arc::new(AtomicU32::new(0)),
                close_after: None,
            }
        }
    }

    impl RenderSurface for StubSurface {
        fn bind(&mut self) {
            assert_eq!(self.binds, self.unbinds, "bound while already bound");
            self.binds += 1;
        }

        fn unbind(&mut self) {
            assert_eq!(self.binds, self.unbinds + 1, "released while not bound");
            self.unbinds += 1;
        }

        fn draw_frame(&mut self) {
            assert_eq!(self.binds, self.unbinds + 1, "rendered while not bound");
            self.frames.fetch_add(1, Ordering::Relaxed);
            thread::sleep(Duration::from_millis(1));
        }

        fn close_requested(&self) -> bool {
            self.close_after
                .is_some_and(|n| self.frames.load(Ordering::Relaxed) >= n)
        }
    }

    #[test]
    fn exit_flag_transitions_exactly_once() {
        let flag = ExitFlag::new();
        let handle = flag.clone();

        assert!(flag.is_raised());
        handle.lower();
        assert!(!flag.is_raised());

        // lowering again keeps it down
        handle.lower();
        assert!(!flag.is_raised());
        assert!(!handle.is_raised());
    }

    #[test]
    fn lowered_flag_is_visible_across_threads() {
        let flag = ExitFlag::new();
        let handle = flag.clone();
        let watcher = thread::spawn(move || {
            while handle.is_raised() {
                thread::yield_now();
            }
        });
        flag.lower();
        watcher.join().unwrap();
    }

    #[test]
    fn drive_stops_at_close_request() {
        let mut surface = StubSurface::new();
        surface.close_after = Some(3);
        let flag = ExitFlag::new();

        drive(&mut surface, &flag);

        assert_eq!(surface.frames.load(Ordering::Relaxed), 3);
        assert_eq!(surface.binds, 1);
        assert_eq!(surface.unbinds, 1);
    }

    #[test]
    fn drive_renders_nothing_when_already_closing() {
        let mut surface = StubSurface::new();
        surface.close_after = Some(0);
        let flag = ExitFlag::new();

        drive(&mut surface, &flag);

        assert_eq!(surface.frames.load(Ordering::Relaxed), 0);
        assert_eq!(surface.binds, 1);
        assert_eq!(surface.unbinds, 1);
    }

    #[test]
    fn drive_renders_nothing_once_lowered() {
        let flag = ExitFlag::new();
        flag.lower();
        let mut surface = StubSurface::new();

        drive(&mut surface, &flag);

        assert_eq!(surface.frames.load(Ordering::Relaxed), 0);
        assert_eq!(surface.binds, 1);
        assert_eq!(surface.unbinds, 1);
    }

    #[test]
    fn worker_hands_the_surface_back_through_join() {
        let surface = StubSurface::new();
        let frames = Arc::clone(&surface.frames);

        let first = ExitFlag::new();
        let worker = spawn_driver(surface, first.clone());
        while frames.load(Ordering::Relaxed) == 0 {
            thread::yield_now();
        }
        first.lower();
        let surface = worker.join().unwrap();

        assert!(surface.frames.load(Ordering::Relaxed) >= 1);
        assert_eq!(surface.binds, 1);
        assert_eq!(surface.unbinds, 1);

        // the next claim happens strictly after the first owner released
        let second = ExitFlag::new();
        second.lower();
        let surface = spawn_driver(surface, second).join().unwrap();

        assert_eq!(surface.binds, 2);
        assert_eq!(surface.unbinds, 2);
    }
}
