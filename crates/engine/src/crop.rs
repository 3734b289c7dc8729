//! Interactive crop geometry.
//!
//! A [`CropTracker`] follows an overlay rectangle that the user drags and
//! resizes over a previewed image. Continuous drag events are debounced so
//! the listener only sees the geometry once the pointer has been quiet for
//! [`CropConfig::debounce`]. Terminal events (drag end, resize end) commit
//! straight away and supersede any pending debounce.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use core_types::CropRect;
use tokio::task::JoinHandle;

/// Receives every committed geometry, including the unset state.
pub type CropListener = Arc<dyn Fn(Option<CropRect>) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CropConfig {
    pub debounce: Duration,
    /// Width / height. `None` leaves the rectangle unconstrained.
    pub aspect: Option<f64>,
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(100),
            aspect: Some(1.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSize {
    pub width: u32,
    pub height: u32,
}

impl SourceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Overlay rectangle in display coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplayRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl DisplayRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Surface {
    source: SourceSize,
    display_width: f64,
    display_height: f64,
}

#[derive(Default)]
struct TrackerState {
    surface: Option<Surface>,
    latest: Option<DisplayRect>,
    committed: Option<CropRect>,
    generation: u64,
    pending: Option<JoinHandle<()>>,
}

impl TrackerState {
    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

pub struct CropTracker {
    config: CropConfig,
    state: Arc<Mutex<TrackerState>>,
    listener: CropListener,
}

impl CropTracker {
    pub fn new(config: CropConfig, listener: CropListener) -> Self {
        Self {
            config,
            state: Arc::new(Mutex::new(TrackerState::default())),
            listener,
        }
    }

    pub fn config(&self) -> CropConfig {
        self.config
    }

    pub fn current(&self) -> Option<CropRect> {
        self.state.lock().expect("crop state poisoned").committed
    }

    /// Start tracking a new source image, clearing any previous rectangle.
    ///
    /// `display` is the size the preview is drawn at; `None` means the
    /// preview is shown at the source's natural size.
    pub fn load_source(&self, source: SourceSize, display: Option<(f64, f64)>) {
        let (display_width, display_height) = match display {
            Some((w, h)) if w > 0.0 && h > 0.0 => (w, h),
            _ => (source.width as f64, source.height as f64),
        };
        self.reset(Some(Surface {
            source,
            display_width,
            display_height,
        }));
    }

    /// Drop the source image and report the unset state.
    pub fn clear(&self) {
        self.reset(None);
    }

    /// Continuous move/resize. Committed after the debounce window elapses
    /// with no further interaction.
    ///
    /// Outside a Tokio runtime there is no timer to debounce with, so the
    /// geometry is committed immediately.
    pub fn drag(&self, rect: DisplayRect) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no Tokio runtime for crop debounce; committing immediately");
            self.commit_now(rect);
            return;
        };

        let mut state = self.state.lock().expect("crop state poisoned");
        if state.surface.is_none() {
            return;
        }
        state.cancel_pending();
        state.generation += 1;
        state.latest = Some(rect);

        let generation = state.generation;
        let shared = Arc::clone(&self.state);
        let listener = Arc::clone(&self.listener);
        let config = self.config;
        state.pending = Some(runtime.spawn(async move {
            tokio::time::sleep(config.debounce).await;
            let rect = {
                let mut state = shared.lock().expect("crop state poisoned");
                // superseded by a later event
                if state.generation != generation {
                    return;
                }
                state.pending = None;
                commit(&mut state, &config)
            };
            listener(rect);
        }));
    }

    /// Pointer released after a drag. Commits immediately.
    pub fn drag_end(&self, rect: DisplayRect) {
        self.commit_now(rect);
    }

    /// Resize handle released. Commits immediately.
    pub fn resize_end(&self, rect: DisplayRect) {
        self.commit_now(rect);
    }

    fn commit_now(&self, rect: DisplayRect) {
        let committed = {
            let mut state = self.state.lock().expect("crop state poisoned");
            if state.surface.is_none() {
                return;
            }
            state.cancel_pending();
            state.generation += 1;
            state.latest = Some(rect);
            commit(&mut state, &self.config)
        };
        (self.listener)(committed);
    }

    fn reset(&self, surface: Option<Surface>) {
        {
            let mut state = self.state.lock().expect("crop state poisoned");
            state.cancel_pending();
            state.generation += 1;
            state.surface = surface;
            state.latest = None;
            state.committed = None;
        }
        (self.listener)(None);
    }
}

impl Drop for CropTracker {
    fn drop(&mut self) {
        if let Ok(mut state) = self.state.lock() {
            state.cancel_pending();
        }
    }
}

// Callers notify the listener after releasing the state lock.
fn commit(state: &mut TrackerState, config: &CropConfig) -> Option<CropRect> {
    let rect = match (state.surface, state.latest) {
        (Some(surface), Some(latest)) => to_source_rect(&surface, latest, config.aspect),
        _ => None,
    };
    state.committed = rect;
    tracing::trace!(?rect, "crop geometry committed");
    rect
}

/// Map a display-space rectangle onto source pixels.
///
/// The result honours `aspect`, lies within the source bounds, and has
/// integer coordinates. Degenerate input yields `None`.
fn to_source_rect(surface: &Surface, rect: DisplayRect, aspect: Option<f64>) -> Option<CropRect> {
    let source = surface.source;
    if source.width == 0 || source.height == 0 {
        return None;
    }
    let src_w = source.width as f64;
    let src_h = source.height as f64;
    let scale_x = src_w / surface.display_width;
    let scale_y = src_h / surface.display_height;

    let mut width = (rect.width * scale_x).clamp(0.0, src_w);
    let mut height = (rect.height * scale_y).clamp(0.0, src_h);
    if let Some(aspect) = aspect.filter(|a| a.is_finite() && *a > 0.0) {
        if width > height * aspect {
            width = height * aspect;
        } else {
            height = width / aspect;
        }
    }

    let width = width.round() as u32;
    let height = height.round() as u32;
    if width == 0 || height == 0 {
        return None;
    }

    let x = (rect.x * scale_x).round().clamp(0.0, (source.width - width) as f64) as u32;
    let y = (rect.y * scale_y).round().clamp(0.0, (source.height - height) as f64) as u32;
    Some(CropRect::new(x, y, width, height))
}
