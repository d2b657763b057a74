//! # Interactive Editing
//!
//! Pointer and keyboard gestures over the elements of the current template.
//!
//! ## State Machine
//!
//! ```text
//!            pointer_down(element)            pointer_up
//!   ┌──────┐ ─────────────────────▶ ┌──────────┐ ───────────┐
//!   │ Idle │                        │ Dragging │            │
//!   └──────┘ ─────────────────────▶ ├──────────┤            │
//!      ▲     pointer_down_handle    │ Resizing │ ───────────┤
//!      │                            └──────────┘            │
//!      └────────────────────────────────────────────────────┘
//! ```
//!
//! A gesture records the element's geometry when it started. Every
//! `pointer_move` derives a new [`TextElement`] from that snapshot and the
//! pointer delta, and swaps it into the [`ElementList`].
//!
//! | Gesture | Update |
//! |---------|--------|
//! | Drag | `x = startX + dx / containerW * 100`, same for `y`, clamped to 0-100 |
//! | Resize right | `width = max(30, startWidth + dx)` |
//! | Resize bottom | `height = max(20, startHeight + dy)` |
//! | Resize corner | both |

use serde::{Deserialize, Serialize};

use crate::model::{ElementList, TextElement, clamp_percent};

/// Smallest width a resize can produce, in pixels.
pub const MIN_WIDTH: f32 = 30.0;
/// Smallest height a resize can produce, in pixels.
pub const MIN_HEIGHT: f32 = 20.0;
/// Box width assumed for elements that have none.
pub const DEFAULT_BOX_WIDTH: f32 = 200.0;
/// Box height assumed for elements that have none.
pub const DEFAULT_BOX_HEIGHT: f32 = 40.0;

/// A pointer position in container pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeHandle {
    /// Width only.
    Right,
    /// Height only.
    Bottom,
    /// Width and height.
    Corner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    Dragging {
        id: String,
        origin: Point,
        start_x: f32,
        start_y: f32,
    },
    Resizing {
        id: String,
        handle: ResizeHandle,
        origin: Point,
        start_width: f32,
        start_height: f32,
    },
}

/// Editing state for one canvas.
#[derive(Debug, Clone)]
pub struct Editor {
    container_width: f32,
    container_height: f32,
    gesture: Gesture,
    selected: Option<String>,
}

impl Editor {
    /// Create an editor for a canvas of the given on-screen size.
    pub fn new(container_width: f32, container_height: f32) -> Self {
        Self {
            container_width,
            container_height,
            gesture: Gesture::Idle,
            selected: None,
        }
    }

    /// Update the on-screen canvas size (e.g. after a window resize).
    pub fn set_container(&mut self, width: f32, height: f32) {
        self.container_width = width;
        self.container_height = height;
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn select(&mut self, id: Option<String>) {
        self.selected = id;
    }

    /// Start dragging `element`. Any gesture in progress is abandoned.
    pub fn pointer_down(&mut self, element: &TextElement, at: Point) {
        let (start_x, start_y) = element.clamped_position();
        self.selected = Some(element.id.clone());
        self.gesture = Gesture::Dragging {
            id: element.id.clone(),
            origin: at,
            start_x,
            start_y,
        };
    }

    /// Start resizing `element` from one of its handles.
    pub fn pointer_down_handle(&mut self, element: &TextElement, handle: ResizeHandle, at: Point) {
        self.selected = Some(element.id.clone());
        self.gesture = Gesture::Resizing {
            id: element.id.clone(),
            handle,
            origin: at,
            start_width: element.width.unwrap_or(DEFAULT_BOX_WIDTH),
            start_height: element.height.unwrap_or(DEFAULT_BOX_HEIGHT),
        };
    }

    /// Apply the active gesture for a pointer at `at`.
    ///
    /// Returns the updated element, or `None` when idle or when the
    /// element is no longer in the list.
    pub fn pointer_move(&self, elements: &mut ElementList, at: Point) -> Option<TextElement> {
        let updated = match &self.gesture {
            Gesture::Idle => return None,
            Gesture::Dragging {
                id,
                origin,
                start_x,
                start_y,
            } => {
                let current = elements.get(id)?.clone();
                let x = drag_axis(*start_x, at.x - origin.x, self.container_width);
                let y = drag_axis(*start_y, at.y - origin.y, self.container_height);
                current.with_position(x, y)
            }
            Gesture::Resizing {
                id,
                handle,
                origin,
                start_width,
                start_height,
            } => {
                let mut current = elements.get(id)?.clone();
                let (dx, dy) = (at.x - origin.x, at.y - origin.y);
                if matches!(handle, ResizeHandle::Right | ResizeHandle::Corner) {
                    current = current.with_width(Some((start_width + dx).max(MIN_WIDTH)));
                }
                if matches!(handle, ResizeHandle::Bottom | ResizeHandle::Corner) {
                    current = current.with_height(Some((start_height + dy).max(MIN_HEIGHT)));
                }
                current
            }
        };

        elements.replace(updated.clone());
        Some(updated)
    }

    /// End the active gesture. The selection is kept.
    pub fn pointer_up(&mut self) {
        self.gesture = Gesture::Idle;
    }

    /// Move the selected element by `amount` percentage points.
    pub fn nudge(
        &self,
        elements: &mut ElementList,
        direction: Direction,
        amount: f32,
    ) -> Option<TextElement> {
        let current = elements.get(self.selected.as_deref()?)?.clone();
        let (x, y) = current.clamped_position();
        let (x, y) = match direction {
            Direction::Up => (x, y - amount),
            Direction::Down => (x, y + amount),
            Direction::Left => (x - amount, y),
            Direction::Right => (x + amount, y),
        };
        let updated = current.with_position(x, y);
        elements.replace(updated.clone());
        Some(updated)
    }

    /// Append a starter element and select it.
    pub fn add_element(&mut self, elements: &mut ElementList) -> String {
        let element = TextElement::editor_default();
        let id = element.id.clone();
        elements.push(element);
        self.selected = Some(id.clone());
        id
    }

    /// Remove the selected element and select the first remaining one.
    pub fn remove_selected(&mut self, elements: &mut ElementList) -> bool {
        let Some(id) = self.selected.take() else {
            return false;
        };
        let removed = elements.get(&id).is_some();
        self.selected = elements.remove(&id);
        if removed && self.gesture_targets(&id) {
            self.gesture = Gesture::Idle;
        }
        removed
    }

    fn gesture_targets(&self, target: &str) -> bool {
        match &self.gesture {
            Gesture::Idle => false,
            Gesture::Dragging { id, .. } | Gesture::Resizing { id, .. } => id == target,
        }
    }
}

fn drag_axis(start: f32, delta_px: f32, container_px: f32) -> f32 {
    if container_px <= 0.0 || !container_px.is_finite() {
        return start;
    }
    clamp_percent(start + delta_px / container_px * 100.0)
}
