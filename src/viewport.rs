use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// The size of the region a scene fills, in display pixels, plus the display's pixel density
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportSize {
    pub width: f64,
    pub height: f64,
    pub pixel_ratio: f64,
}

impl ViewportSize {
    pub fn new(width: f64, height: f64, pixel_ratio: f64) -> Result<Self, ViewportError> {
        if !width.is_finite() || !height.is_finite() || width < 0.0 || height < 0.0 {
            return Err(ViewportError::InvalidDimensions(width, height));
        }
        if !pixel_ratio.is_finite() || pixel_ratio <= 0.0 {
            return Err(ViewportError::InvalidPixelRatio(pixel_ratio));
        }
        Ok(Self { width, height, pixel_ratio })
    }

    /// Backing store resolution in physical pixels
    pub fn backing_size(&self) -> (u32, u32) {
        ((self.width * self.pixel_ratio).floor() as u32, (self.height * self.pixel_ratio).floor() as u32)
    }
}

/// Errors produced when building a viewport size
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ViewportError {
    #[error("invalid viewport dimensions {0}x{1}")]
    InvalidDimensions(f64, f64),

    #[error("invalid pixel ratio {0}: must be a finite value greater than zero")]
    InvalidPixelRatio(f64),
}

/// Invoked with the new size every time the viewport changes
pub type ResizeListener = Box<dyn FnMut(ViewportSize)>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Observes the size of the region a scene is mounted on
pub trait ViewportObserver {
    /// The current size
    fn current(&self) -> ViewportSize;

    /// Register a listener called on every resize
    fn subscribe(&self, listener: ResizeListener) -> SubscriptionId;

    /// Detach a listener; unknown ids are ignored
    fn unsubscribe(&self, id: SubscriptionId);
}

struct ViewportState {
    size: ViewportSize,
    next_id: u64,
    listeners: Vec<(SubscriptionId, ResizeListener)>,
    notifying: bool,
    resize_pending: bool,
    removed_while_notifying: Vec<SubscriptionId>,
}

/// A single-threaded viewport whose size is pushed by the host.
///
/// Listeners run synchronously inside [`SharedViewport::resize`], on the same thread that drives
/// the frame scheduler, so a resize can never interleave with a frame being drawn.
#[derive(Clone)]
pub struct SharedViewport {
    state: Rc<RefCell<ViewportState>>,
}

impl SharedViewport {
    pub fn new(size: ViewportSize) -> Self {
        Self {
            state: Rc::new(RefCell::new(ViewportState {
                size,
                next_id: 0,
                listeners: Vec::new(),
                notifying: false,
                resize_pending: false,
                removed_while_notifying: Vec::new(),
            })),
        }
    }

    /// Store a new size and notify every listener.
    ///
    /// A resize requested by a listener is not delivered re-entrantly: the size is stored at once
    /// and every listener is notified again with the latest size after the current pass.
    pub fn resize(&self, size: ViewportSize) {
        {
            let mut state = self.state.borrow_mut();
            state.size = size;
            if state.notifying {
                state.resize_pending = true;
                return;
            }
            state.notifying = true;
        }

        loop {
            let (size, mut listeners) = {
                let mut state = self.state.borrow_mut();
                state.resize_pending = false;
                (state.size, std::mem::take(&mut state.listeners))
            };
            for (id, listener) in listeners.iter_mut() {
                if self.state.borrow().removed_while_notifying.contains(id) {
                    continue;
                }
                listener(size);
            }

            let mut state = self.state.borrow_mut();
            let removed = std::mem::take(&mut state.removed_while_notifying);
            listeners.retain(|(id, _)| !removed.contains(id));
            // Listeners subscribed during notification were pushed into the now empty vector.
            listeners.append(&mut state.listeners);
            state.listeners = listeners;
            if !state.resize_pending {
                state.notifying = false;
                return;
            }
        }
    }

    /// Number of attached listeners
    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }
}

impl ViewportObserver for SharedViewport {
    fn current(&self) -> ViewportSize {
        self.state.borrow().size
    }

    fn subscribe(&self, listener: ResizeListener) -> SubscriptionId {
        let mut state = self.state.borrow_mut();
        let id = SubscriptionId(state.next_id);
        state.next_id += 1;
        state.listeners.push((id, listener));
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        let mut state = self.state.borrow_mut();
        state.listeners.retain(|(existing, _)| *existing != id);
        if state.notifying {
            state.removed_while_notifying.push(id);
        }
    }
}
