use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

/// Width thresholds in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Breakpoints {
    pub sm: u32,
    pub md: u32,
    pub lg: u32,
    pub xl: u32,
    #[serde(rename = "2xl")]
    pub xxl: u32,
}

impl Default for Breakpoints {
    fn default() -> Self {
        Self {
            sm: 640,
            md: 768,
            lg: 1024,
            xl: 1280,
            xxl: 1536,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    /// Assumed when no real viewport can be observed.
    fn default() -> Self {
        Self {
            width: 1024,
            height: 768,
        }
    }
}

impl Viewport {
    /// Pixel-equivalent viewport of a terminal of `cols` x `rows` cells.
    pub fn from_cells(cols: u16, rows: u16, cell_width_px: u16, cell_height_px: u16) -> Self {
        Self {
            width: cols as u32 * cell_width_px as u32,
            height: rows as u32 * cell_height_px as u32,
        }
    }
}

/// Layout flags recomputed for every observed viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutFlags {
    pub is_mobile: bool,
    pub is_tablet: bool,
    pub is_desktop: bool,
    pub is_xl: bool,
    pub is_2xl: bool,
}

impl LayoutFlags {
    pub fn compute(width: u32, bp: &Breakpoints) -> Self {
        Self {
            is_mobile: width < bp.sm,
            is_tablet: width >= bp.sm && width < bp.lg,
            is_desktop: width >= bp.lg,
            is_xl: width >= bp.xl,
            is_2xl: width >= bp.xxl,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Responsive {
    breakpoints: Breakpoints,
    viewport: Viewport,
    flags: LayoutFlags,
}

impl Responsive {
    pub fn new(breakpoints: Breakpoints) -> Self {
        Self::with_viewport(breakpoints, Viewport::default())
    }

    pub fn with_viewport(breakpoints: Breakpoints, viewport: Viewport) -> Self {
        Self {
            breakpoints,
            viewport,
            flags: LayoutFlags::compute(viewport.width, &breakpoints),
        }
    }

    /// Recompute flags for a new viewport size.
    pub fn observe(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.flags = LayoutFlags::compute(viewport.width, &self.breakpoints);
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn flags(&self) -> LayoutFlags {
        self.flags
    }

    pub fn is_mobile(&self) -> bool {
        self.flags.is_mobile
    }

    pub fn is_tablet(&self) -> bool {
        self.flags.is_tablet
    }

    pub fn is_desktop(&self) -> bool {
        self.flags.is_desktop
    }

    /// Grid columns for card layouts: 1, 2, 3, 4 or 6 as the width grows.
    pub fn columns_grid(&self) -> usize {
        let w = self.viewport.width;
        let bp = &self.breakpoints;
        if w < bp.sm {
            1
        } else if w < bp.md {
            2
        } else if w < bp.lg {
            3
        } else if w < bp.xxl {
            4
        } else {
            6
        }
    }

    pub fn should_stack_vertically(&self) -> bool {
        self.viewport.width < self.breakpoints.md
    }

    pub fn should_use_compact_layout(&self) -> bool {
        self.flags.is_mobile
    }
}

// ---------------------------------------------------------------------------
// Resize notifications
// ---------------------------------------------------------------------------

type Listener = Box<dyn FnMut(Viewport) + Send>;

/// Fan-out of viewport changes to registered listeners.
#[derive(Clone, Default)]
pub struct ResizeBus {
    listeners: Arc<Mutex<Vec<(u64, Listener)>>>,
    next_id: Arc<AtomicU64>,
}

/// Keeps a listener registered; removes it when dropped.
pub struct ResizeSubscription {
    id: u64,
    listeners: Arc<Mutex<Vec<(u64, Listener)>>>,
}

impl ResizeBus {
    pub fn subscribe(&self, listener: impl FnMut(Viewport) + Send + 'static) -> ResizeSubscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        if let Ok(mut l) = self.listeners.lock() {
            l.push((id, Box::new(listener)));
        }
        ResizeSubscription {
            id,
            listeners: Arc::clone(&self.listeners),
        }
    }

    pub fn emit(&self, viewport: Viewport) {
        if let Ok(mut l) = self.listeners.lock() {
            for (_, listener) in l.iter_mut() {
                listener(viewport);
            }
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().map(|l| l.len()).unwrap_or(0)
    }
}

impl Drop for ResizeSubscription {
    fn drop(&mut self) {
        if let Ok(mut l) = self.listeners.lock() {
            l.retain(|(id, _)| *id != self.id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(width: u32) -> Responsive {
        Responsive::with_viewport(Breakpoints::default(), Viewport { width, height: 800 })
    }

    #[test]
    fn test_bands_exclusive_and_exhaustive() {
        let bp = Breakpoints::default();
        for w in (0..2000).step_by(7).chain([639, 640, 1023, 1024]) {
            let f = LayoutFlags::compute(w, &bp);
            assert_eq!(f.is_mobile, w < bp.sm);
            assert_eq!(f.is_tablet, bp.sm <= w && w < bp.lg);
            assert_eq!(f.is_desktop, w >= bp.lg);
            let count = [f.is_mobile, f.is_tablet, f.is_desktop]
                .iter()
                .filter(|b| **b)
                .count();
            assert_eq!(count, 1, "width {w}");
        }
    }

    #[test]
    fn test_default_viewport_is_desktop() {
        let r = Responsive::new(Breakpoints::default());
        assert_eq!(r.viewport(), Viewport { width: 1024, height: 768 });
        assert!(r.is_desktop());
        assert!(!r.flags().is_xl);
    }

    #[test]
    fn test_columns_grid() {
        assert_eq!(at(320).columns_grid(), 1);
        assert_eq!(at(700).columns_grid(), 2);
        assert_eq!(at(800).columns_grid(), 3);
        assert_eq!(at(1100).columns_grid(), 4);
        assert_eq!(at(1400).columns_grid(), 4);
        assert_eq!(at(1600).columns_grid(), 6);
    }

    #[test]
    fn test_stack_and_compact() {
        assert!(at(500).should_stack_vertically());
        assert!(at(500).should_use_compact_layout());
        assert!(at(700).should_stack_vertically());
        assert!(!at(700).should_use_compact_layout());
        assert!(!at(900).should_stack_vertically());
    }

    #[test]
    fn test_observe_recomputes() {
        let mut r = at(1200);
        assert!(r.is_desktop());
        r.observe(Viewport { width: 600, height: 400 });
        assert!(r.is_mobile());
        assert!(!r.is_desktop());
    }

    #[test]
    fn test_terminal_cells_to_viewport() {
        let v = Viewport::from_cells(80, 24, 8, 16);
        assert_eq!(v, Viewport { width: 640, height: 384 });
        assert!(LayoutFlags::compute(v.width, &Breakpoints::default()).is_tablet);
    }

    #[test]
    fn test_custom_breakpoints_from_json() {
        let bp: Breakpoints =
            serde_json::from_str(r#"{"sm":500,"md":700,"lg":900,"xl":1100,"2xl":1300}"#).unwrap();
        let r = Responsive::with_viewport(bp, Viewport { width: 950, height: 600 });
        assert!(r.is_desktop());
    }

    #[test]
    fn test_subscription_removed_on_drop() {
        let bus = ResizeBus::default();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sub = {
            let seen = Arc::clone(&seen);
            bus.subscribe(move |v| seen.lock().unwrap().push(v.width))
        };
        bus.emit(Viewport { width: 700, height: 400 });
        assert_eq!(bus.listener_count(), 1);
        drop(sub);
        assert_eq!(bus.listener_count(), 0);
        bus.emit(Viewport { width: 900, height: 400 });
        assert_eq!(*seen.lock().unwrap(), vec![700]);
    }
}
