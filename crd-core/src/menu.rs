//! Popup menu layout: item geometry, hit testing and screen placement.
//!
//! Coordinates are in pixels. Item rectangles are client-relative to
//! the popup; [`menu_position`] produces a screen coordinate.

use crate::status::{Rgb, ServiceStatus};

// ── Geometry ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle; `right`/`bottom` are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    pub const fn from_xywh(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            left: x,
            top: y,
            right: x + width,
            bottom: y + height,
        }
    }

    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.left && p.x < self.right && p.y >= self.top && p.y < self.bottom
    }
}

// ── Metrics ──────────────────────────────────────────────────────

const BORDER: i32 = 1;
const PAD_X: i32 = 8;
const PAD_Y: i32 = 4;
const ITEM_WIDTH: i32 = 180;
const BUTTON_HEIGHT: i32 = 32;
const BUTTON_MARGIN: i32 = 2;
const LABEL_HEIGHT: i32 = 16;

/// Font used for every item.
pub const FONT_FACE: &str = "Segoe UI";
/// Point size of [`FONT_FACE`].
pub const FONT_POINTS: i32 = 9;

/// Distance the popup's right edge extends past the cursor.
pub const CURSOR_INSET_X: i32 = 10;
/// Gap between the popup's bottom edge and the cursor.
pub const CURSOR_GAP_Y: i32 = 5;

// ── Items ────────────────────────────────────────────────────────

/// Action a button performs when clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuAction {
    Toggle,
    Exit,
}

/// A single row of the popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuItem {
    Label { text: String, color: Rgb, rect: Rect },
    Separator { rect: Rect },
    Button { text: String, action: MenuAction, rect: Rect },
}

impl MenuItem {
    pub fn rect(&self) -> Rect {
        match self {
            MenuItem::Label { rect, .. }
            | MenuItem::Separator { rect }
            | MenuItem::Button { rect, .. } => *rect,
        }
    }
}

/// Laid-out content of one popup, top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuLayout {
    pub items: Vec<MenuItem>,
    pub width: i32,
    pub height: i32,
}

impl MenuLayout {
    /// Lay out the status line, toggle button and exit button for `status`.
    ///
    /// `name` is the short service name shown to the user (e.g. `CRD`).
    pub fn for_status(status: ServiceStatus, name: &str) -> Self {
        let x = BORDER + PAD_X + BUTTON_MARGIN;
        let mut y = BORDER + PAD_Y;
        let mut items = Vec::with_capacity(5);

        // label margin: 2 above, 6 below
        y += 2;
        items.push(MenuItem::Label {
            text: status.headline(name),
            color: status.color(),
            rect: Rect::from_xywh(x, y, ITEM_WIDTH, LABEL_HEIGHT),
        });
        y += LABEL_HEIGHT + 6;

        items.push(MenuItem::Separator {
            rect: Rect::from_xywh(x, y, ITEM_WIDTH, 1),
        });
        y += 1 + 4;

        y += BUTTON_MARGIN;
        items.push(MenuItem::Button {
            text: status.toggle_label(name),
            action: MenuAction::Toggle,
            rect: Rect::from_xywh(x, y, ITEM_WIDTH, BUTTON_HEIGHT),
        });
        y += BUTTON_HEIGHT + BUTTON_MARGIN;

        y += 4;
        items.push(MenuItem::Separator {
            rect: Rect::from_xywh(x, y, ITEM_WIDTH, 1),
        });
        y += 1 + 4;

        y += BUTTON_MARGIN;
        items.push(MenuItem::Button {
            text: "Exit".into(),
            action: MenuAction::Exit,
            rect: Rect::from_xywh(x, y, ITEM_WIDTH, BUTTON_HEIGHT),
        });
        y += BUTTON_HEIGHT + BUTTON_MARGIN;

        let width = x + ITEM_WIDTH + BUTTON_MARGIN + PAD_X + BORDER;
        let height = y + PAD_Y + BORDER;

        Self { items, width, height }
    }

    /// Index of the button under `p`, if any.
    pub fn button_at(&self, p: Point) -> Option<usize> {
        self.items
            .iter()
            .position(|item| matches!(item, MenuItem::Button { rect, .. } if rect.contains(p)))
    }

    /// Action bound to the item at `index`, if it is a button.
    pub fn action_of(&self, index: usize) -> Option<MenuAction> {
        match self.items.get(index) {
            Some(MenuItem::Button { action, .. }) => Some(*action),
            _ => None,
        }
    }
}

// ── Placement ────────────────────────────────────────────────────

/// Top-left screen position that puts the popup's bottom-right corner
/// just above and slightly right of `cursor`.
///
/// When the monitor work area is known the popup is shifted to stay
/// fully inside it.
pub fn menu_position(cursor: Point, width: i32, height: i32, work_area: Option<Rect>) -> Point {
    let mut x = cursor.x - width + CURSOR_INSET_X;
    let mut y = cursor.y - height - CURSOR_GAP_Y;

    if let Some(area) = work_area {
        x = x.min(area.right - width).max(area.left);
        y = y.min(area.bottom - height).max(area.top);
    }

    Point::new(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_form_metrics() {
        let layout = MenuLayout::for_status(ServiceStatus::Running, "CRD");
        assert_eq!(layout.width, 202);
        assert_eq!(layout.height, 120);
        assert_eq!(layout.items.len(), 5);

        let toggle = layout.items[2].rect();
        assert_eq!(toggle, Rect::from_xywh(11, 36, 180, 32));
        let exit = layout.items[4].rect();
        assert_eq!(exit, Rect::from_xywh(11, 81, 180, 32));
    }

    #[test]
    fn layout_texts_follow_status() {
        let layout = MenuLayout::for_status(ServiceStatus::Stopped, "CRD");
        match &layout.items[0] {
            MenuItem::Label { text, color, .. } => {
                assert_eq!(text, "CRD is disabled");
                assert_eq!(*color, Rgb::RED);
            }
            other => panic!("expected label, got {other:?}"),
        }
        match &layout.items[2] {
            MenuItem::Button { text, action, .. } => {
                assert_eq!(text, "Enable CRD");
                assert_eq!(*action, MenuAction::Toggle);
            }
            other => panic!("expected button, got {other:?}"),
        }
    }

    #[test]
    fn hit_testing_only_finds_buttons() {
        let layout = MenuLayout::for_status(ServiceStatus::Running, "CRD");
        assert_eq!(layout.button_at(Point::new(50, 40)), Some(2));
        assert_eq!(layout.button_at(Point::new(50, 90)), Some(4));
        // status line and separator gap
        assert_eq!(layout.button_at(Point::new(50, 10)), None);
        assert_eq!(layout.button_at(Point::new(50, 72)), None);
        // outside horizontally
        assert_eq!(layout.button_at(Point::new(5, 40)), None);

        assert_eq!(layout.action_of(2), Some(MenuAction::Toggle));
        assert_eq!(layout.action_of(4), Some(MenuAction::Exit));
        assert_eq!(layout.action_of(0), None);
        assert_eq!(layout.action_of(9), None);
    }

    #[test]
    fn position_anchors_bottom_right_at_cursor() {
        let p = menu_position(Point::new(1800, 1060), 202, 120, None);
        assert_eq!(p, Point::new(1800 - 202 + 10, 1060 - 120 - 5));
    }

    #[test]
    fn position_is_clamped_into_work_area() {
        let area = Rect::from_xywh(0, 40, 1920, 1040);
        // taskbar at the top: the popup would go above the screen
        let p = menu_position(Point::new(1900, 20), 202, 120, Some(area));
        assert_eq!(p, Point::new(1900 - 202 + 10, 40));

        // cursor near the left edge
        let p = menu_position(Point::new(30, 1000), 202, 120, Some(area));
        assert_eq!(p.x, 0);
    }
}
