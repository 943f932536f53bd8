use std::cell::RefCell;
use std::rc::Rc;
use std::thread;
use std::time::{Duration, Instant};

/// A callback to be run on the next frame
pub type FrameCallback = Box<dyn FnOnce()>;

/// Identifies a scheduled frame callback so it can be cancelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(u64);

/// Runs callbacks once per display frame.
///
/// Implementations run callbacks on the thread that drives them; cancelling a handle guarantees
/// its callback never runs.
pub trait FrameScheduler {
    fn schedule_next(&self, callback: FrameCallback) -> FrameHandle;

    fn cancel(&self, handle: FrameHandle);
}

#[derive(Default)]
struct FrameQueue {
    next_id: u64,
    pending: Vec<(FrameHandle, FrameCallback)>,
}

/// A scheduler that only advances when told to.
///
/// Each [`ManualScheduler::tick`] behaves like one display refresh: it runs the callbacks that were
/// pending when the tick started. Callbacks scheduled while ticking wait for the next tick.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    queue: Rc<RefCell<FrameQueue>>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run one frame's worth of callbacks, returning how many ran
    pub fn tick(&self) -> usize {
        let due: Vec<FrameHandle> = self.queue.borrow().pending.iter().map(|(handle, _)| *handle).collect();
        let mut ran = 0;
        for handle in due {
            // Take the callback out before running it so it can schedule or cancel freely.
            let callback = {
                let mut queue = self.queue.borrow_mut();
                let position = queue.pending.iter().position(|(pending, _)| *pending == handle);
                position.map(|index| queue.pending.remove(index).1)
            };
            if let Some(callback) = callback {
                callback();
                ran += 1;
            }
        }
        ran
    }

    /// Run `frames` ticks, returning the total number of callbacks run
    pub fn tick_many(&self, frames: usize) -> usize {
        (0..frames).map(|_| self.tick()).sum()
    }

    /// Number of callbacks waiting for the next tick
    pub fn pending(&self) -> usize {
        self.queue.borrow().pending.len()
    }
}

impl FrameScheduler for ManualScheduler {
    fn schedule_next(&self, callback: FrameCallback) -> FrameHandle {
        let mut queue = self.queue.borrow_mut();
        let handle = FrameHandle(queue.next_id);
        queue.next_id += 1;
        queue.pending.push((handle, callback));
        handle
    }

    fn cancel(&self, handle: FrameHandle) {
        self.queue.borrow_mut().pending.retain(|(pending, _)| *pending != handle);
    }
}

/// Frame interval for a 60Hz display
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_micros(16_667);

/// Drives a [`ManualScheduler`] at a fixed cadence on the calling thread
#[derive(Clone)]
pub struct PacedScheduler {
    queue: ManualScheduler,
    interval: Duration,
}

impl PacedScheduler {
    pub fn new(interval: Duration) -> Self {
        Self { queue: ManualScheduler::new(), interval: interval.max(Duration::from_millis(1)) }
    }

    /// A scheduler ticking `fps` times per second
    pub fn with_fps(fps: u32) -> Self {
        Self::new(Duration::from_secs(1) / fps.max(1))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Tick at the configured cadence until `keep_going` returns false.
    ///
    /// `keep_going` is consulted before every tick and is the place for hosts to pump their own
    /// events (input, resizes) so that everything stays on this thread.
    pub fn run_while(&self, mut keep_going: impl FnMut() -> bool) {
        let mut deadline = Instant::now();
        while keep_going() {
            self.queue.tick();
            deadline += self.interval;
            let now = Instant::now();
            if deadline > now {
                thread::sleep(deadline - now);
            } else {
                // Fell behind: skip the missed frames rather than bursting to catch up.
                deadline = now;
            }
        }
    }

    /// Number of callbacks waiting for the next tick
    pub fn pending(&self) -> usize {
        self.queue.pending()
    }
}

impl FrameScheduler for PacedScheduler {
    fn schedule_next(&self, callback: FrameCallback) -> FrameHandle {
        self.queue.schedule_next(callback)
    }

    fn cancel(&self, handle: FrameHandle) {
        self.queue.cancel(handle)
    }
}
