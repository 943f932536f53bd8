//! Mount lifecycle of the scene.
//!
//! Mounting binds a [`SceneRenderer`] to a drawing surface, a frame scheduler and a viewport
//! observer. From then on every scheduled frame draws the scene and schedules the next one, until
//! the scene is unmounted.

use crate::config::SceneConfig;
use crate::random::RandomSource;
use crate::scene::SceneRenderer;
use crate::scheduler::{FrameHandle, FrameScheduler};
use crate::surface::{DrawingContext, apply_viewport};
use crate::viewport::{SubscriptionId, ViewportObserver};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

struct SceneState {
    renderer: SceneRenderer,
    surface: Box<dyn DrawingContext>,
}

/// The self-rescheduling draw loop.
///
/// The pending callback owns an `Rc` to the loop, so cancelling it also releases the loop.
struct FrameLoop {
    state: Rc<RefCell<SceneState>>,
    scheduler: Rc<dyn FrameScheduler>,
    pending: Cell<Option<FrameHandle>>,
    cancelled: Cell<bool>,
}

impl FrameLoop {
    fn schedule(this: &Rc<Self>) {
        let next = Rc::clone(this);
        let handle = this.scheduler.schedule_next(Box::new(move || FrameLoop::run_frame(&next)));
        this.pending.set(Some(handle));
    }

    fn run_frame(this: &Rc<Self>) {
        this.pending.set(None);
        if this.cancelled.get() {
            return;
        }
        this.draw();
        Self::schedule(this);
    }

    fn draw(&self) {
        let mut state = self.state.borrow_mut();
        let SceneState { renderer, surface } = &mut *state;
        renderer.draw_frame(surface.as_mut());
    }

    fn cancel(&self) {
        self.cancelled.set(true);
        if let Some(handle) = self.pending.take() {
            self.scheduler.cancel(handle);
        }
    }
}

/// A scene that is currently mounted. Dropping it unmounts it.
pub struct MountedScene {
    frame_loop: Rc<FrameLoop>,
    viewport: Rc<dyn ViewportObserver>,
    subscription: Option<SubscriptionId>,
}

/// Mount the scene onto `surface`.
///
/// Returns `None` without touching the scheduler, the viewport or the random source when no surface
/// is available; the host region simply stays empty. Otherwise the surface is sized to the
/// viewport, the particle field is generated, the first frame is drawn immediately and the next one
/// is scheduled.
pub fn mount<S, F, V>(
    surface: Option<S>,
    scheduler: F,
    viewport: V,
    rng: Box<dyn RandomSource>,
    config: SceneConfig,
) -> Option<MountedScene>
where
    S: DrawingContext + 'static,
    F: FrameScheduler + 'static,
    V: ViewportObserver + 'static,
{
    let Some(surface) = surface else {
        tracing::debug!("drawing surface unavailable, scene not mounted");
        return None;
    };

    let mut surface: Box<dyn DrawingContext> = Box::new(surface);
    let size = viewport.current();
    apply_viewport(surface.as_mut(), size);

    let renderer = SceneRenderer::new(config, size, rng);
    tracing::debug!(
        width = size.width,
        height = size.height,
        pixel_ratio = size.pixel_ratio,
        particles = renderer.particles().len(),
        "scene mounted"
    );
    let state = Rc::new(RefCell::new(SceneState { renderer, surface }));

    let viewport: Rc<dyn ViewportObserver> = Rc::new(viewport);
    let listener_state = Rc::downgrade(&state);
    let subscription = viewport.subscribe(Box::new(move |size| {
        let Some(state) = listener_state.upgrade() else {
            return;
        };
        let mut state = state.borrow_mut();
        let SceneState { renderer, surface } = &mut *state;
        apply_viewport(surface.as_mut(), size);
        renderer.resize(size);
        tracing::debug!(width = size.width, height = size.height, pixel_ratio = size.pixel_ratio, "scene resized");
    }));

    let frame_loop = Rc::new(FrameLoop {
        state,
        scheduler: Rc::new(scheduler),
        pending: Cell::new(None),
        cancelled: Cell::new(false),
    });
    frame_loop.draw();
    FrameLoop::schedule(&frame_loop);

    Some(MountedScene { frame_loop, viewport, subscription: Some(subscription) })
}

impl MountedScene {
    /// Frames drawn so far
    pub fn frame(&self) -> u64 {
        self.frame_loop.state.borrow().renderer.frame()
    }

    pub fn particle_count(&self) -> usize {
        self.frame_loop.state.borrow().renderer.particles().len()
    }

    /// Whether the draw loop is still running
    pub fn is_active(&self) -> bool {
        !self.frame_loop.cancelled.get()
    }

    /// Run `f` against the renderer, e.g. to inspect particles
    pub fn with_renderer<T>(&self, f: impl FnOnce(&SceneRenderer) -> T) -> T {
        f(&self.frame_loop.state.borrow().renderer)
    }

    /// Stop drawing: cancels the pending frame and detaches the resize listener. Idempotent.
    pub fn unmount(&mut self) {
        let Some(subscription) = self.subscription.take() else {
            return;
        };
        self.frame_loop.cancel();
        self.viewport.unsubscribe(subscription);
        tracing::debug!(frames = self.frame(), "scene unmounted");
    }
}

impl Drop for MountedScene {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::SequenceSource;
    use crate::scheduler::ManualScheduler;
    use crate::surface::{DrawOperation, RecordingSurface};
    use crate::viewport::{SharedViewport, ViewportSize};

    struct Host {
        surface: Rc<RefCell<RecordingSurface>>,
        scheduler: ManualScheduler,
        viewport: SharedViewport,
    }

    impl Host {
        fn new(width: f64, height: f64, ratio: f64) -> Self {
            Self {
                surface: Rc::new(RefCell::new(RecordingSurface::new())),
                scheduler: ManualScheduler::new(),
                viewport: SharedViewport::new(ViewportSize::new(width, height, ratio).expect("valid size")),
            }
        }

        fn mount(&self) -> MountedScene {
            mount(
                Some(self.surface.clone()),
                self.scheduler.clone(),
                self.viewport.clone(),
                Box::new(fastrand::Rng::with_seed(99)),
                SceneConfig::default(),
            )
            .expect("surface is available")
        }

        fn clear_count(&self) -> usize {
            self.surface.borrow().operations().iter().filter(|op| matches!(op, DrawOperation::ClearRect { .. })).count()
        }
    }

    #[test]
    fn mount_draws_first_frame_and_schedules_next() {
        let host = Host::new(800.0, 600.0, 1.0);
        let scene = host.mount();

        assert_eq!(scene.frame(), 1);
        assert_eq!(scene.particle_count(), 80);
        assert_eq!(host.clear_count(), 1);
        assert_eq!(host.scheduler.pending(), 1);
        assert_eq!(host.viewport.listener_count(), 1);
        assert_eq!(host.surface.borrow().backing_size(), (800, 600));
    }

    #[test]
    fn each_tick_draws_one_frame() {
        let host = Host::new(800.0, 600.0, 1.0);
        let scene = host.mount();
        for expected in 2..=50 {
            assert_eq!(host.scheduler.tick(), 1);
            assert_eq!(scene.frame(), expected);
        }
        assert_eq!(host.clear_count(), 50);
        assert_eq!(host.scheduler.pending(), 1);
    }

    #[test]
    fn no_work_after_unmount() {
        let host = Host::new(800.0, 600.0, 1.0);
        let mut scene = host.mount();
        host.scheduler.tick_many(10);
        scene.unmount();

        let frames = scene.frame();
        let draws = host.surface.borrow().operations().len();
        assert_eq!(host.scheduler.tick_many(100), 0);
        assert_eq!(scene.frame(), frames);
        assert_eq!(host.surface.borrow().operations().len(), draws);
        assert_eq!(host.scheduler.pending(), 0);
        assert_eq!(host.viewport.listener_count(), 0);
        assert!(!scene.is_active());

        // Unmounting twice is harmless.
        scene.unmount();
    }

    #[test]
    fn dropping_unmounts() {
        let host = Host::new(800.0, 600.0, 1.0);
        let scene = host.mount();
        drop(scene);
        assert_eq!(host.scheduler.pending(), 0);
        assert_eq!(host.viewport.listener_count(), 0);
        assert_eq!(host.scheduler.tick_many(10), 0);
    }

    #[test]
    fn resize_rescales_backing_store() {
        let host = Host::new(800.0, 600.0, 1.0);
        let scene = host.mount();
        for (width, height, ratio) in [(1024.0, 768.0, 2.0), (300.0, 200.0, 1.5), (640.0, 480.0, 0.5)] {
            host.viewport.resize(ViewportSize::new(width, height, ratio).expect("valid size"));
            let surface = host.surface.borrow();
            assert_eq!(surface.backing_size(), ((width * ratio) as u32, (height * ratio) as u32));
            assert_eq!(surface.scale(), ratio);
        }
        assert_eq!(scene.with_renderer(|renderer| renderer.viewport().width), 640.0);
    }

    #[test]
    fn resize_applies_to_next_frame() {
        let host = Host::new(800.0, 600.0, 1.0);
        let _scene = host.mount();
        host.viewport.resize(ViewportSize::new(1200.0, 900.0, 1.0).expect("valid size"));
        host.surface.borrow_mut().take_operations();
        host.scheduler.tick();

        let surface = host.surface.borrow();
        assert!(matches!(
            surface.operations()[0],
            DrawOperation::ClearRect { width, height, .. } if width == 1200.0 && height == 900.0
        ));
    }

    #[test]
    fn missing_surface_is_a_silent_no_op() {
        let scheduler = ManualScheduler::new();
        let viewport = SharedViewport::new(ViewportSize::new(800.0, 600.0, 1.0).expect("valid size"));
        let scene = mount::<RecordingSurface, _, _>(
            None,
            scheduler.clone(),
            viewport.clone(),
            Box::new(SequenceSource::new(vec![0.5])),
            SceneConfig::default(),
        );

        assert!(scene.is_none());
        assert_eq!(scheduler.pending(), 0);
        assert_eq!(viewport.listener_count(), 0);
    }

    #[test]
    fn remount_starts_from_scratch() {
        let host = Host::new(800.0, 600.0, 1.0);
        let mut first = host.mount();
        host.scheduler.tick_many(20);
        first.unmount();

        let second = host.mount();
        assert_eq!(second.frame(), 1);
        assert_eq!(second.particle_count(), 80);
        assert_eq!(host.scheduler.pending(), 1);
    }
}
