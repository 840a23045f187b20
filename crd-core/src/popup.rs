//! Popup menu state machine.
//!
//! One [`PopupMenu`] is created per right-click and never reused. It
//! starts [`Visibility::Hidden`], becomes `Shown` when the window is
//! displayed, and returns to `Hidden` on a button click or when the
//! window loses focus. Once hidden after being shown it ignores
//! further input.

use tracing::debug;

use crate::menu::{MenuAction, MenuLayout, Point, Rect, menu_position};
use crate::status::ServiceStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Hidden,
    Shown,
}

/// Why a popup was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// A button was clicked.
    Selected(MenuAction),
    /// The window lost input focus.
    Deactivated,
    /// Replaced by a newer popup or torn down at exit.
    Dismissed,
}

#[derive(Debug, Clone)]
pub struct PopupMenu {
    status: ServiceStatus,
    layout: MenuLayout,
    origin: Point,
    visibility: Visibility,
    hovered: Option<usize>,
    closed: Option<CloseReason>,
}

impl PopupMenu {
    /// Build a popup for `status`, anchored at `cursor`.
    pub fn new(status: ServiceStatus, name: &str, cursor: Point, work_area: Option<Rect>) -> Self {
        let layout = MenuLayout::for_status(status, name);
        let origin = menu_position(cursor, layout.width, layout.height, work_area);
        Self {
            status,
            layout,
            origin,
            visibility: Visibility::Hidden,
            hovered: None,
            closed: None,
        }
    }

    pub fn status(&self) -> ServiceStatus {
        self.status
    }

    pub fn layout(&self) -> &MenuLayout {
        &self.layout
    }

    /// Screen position of the top-left corner.
    pub fn origin(&self) -> Point {
        self.origin
    }

    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Index of the highlighted button.
    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn close_reason(&self) -> Option<CloseReason> {
        self.closed
    }

    pub fn is_shown(&self) -> bool {
        self.visibility == Visibility::Shown
    }

    /// Mark the window as displayed. A closed popup cannot be reopened.
    pub fn show(&mut self) {
        if self.closed.is_none() {
            self.visibility = Visibility::Shown;
        }
    }

    /// `true` when `p` is over a button of a shown popup; the window
    /// shows the hand cursor there and the arrow everywhere else.
    pub fn over_button(&self, p: Point) -> bool {
        self.is_shown() && self.layout.button_at(p).is_some()
    }

    /// Update the hover highlight. Returns `true` when a repaint is needed.
    pub fn pointer_moved(&mut self, p: Point) -> bool {
        if !self.is_shown() {
            return false;
        }
        let hovered = self.layout.button_at(p);
        let changed = hovered != self.hovered;
        self.hovered = hovered;
        changed
    }

    /// The pointer left the window. Returns `true` when a repaint is needed.
    pub fn pointer_left(&mut self) -> bool {
        self.hovered.take().is_some()
    }

    /// Handle a click at client position `p`.
    ///
    /// A click on a button closes the popup and returns the bound
    /// action; the caller runs it after the popup is already hidden,
    /// so the popup closes whatever the action's outcome.
    pub fn click(&mut self, p: Point) -> Option<MenuAction> {
        if !self.is_shown() {
            return None;
        }
        let action = self.layout.button_at(p).and_then(|i| self.layout.action_of(i))?;
        self.close(CloseReason::Selected(action));
        Some(action)
    }

    /// The window lost focus: close without an action.
    pub fn deactivate(&mut self) {
        if self.is_shown() {
            self.close(CloseReason::Deactivated);
        }
    }

    /// Close without an action for any other reason.
    pub fn dismiss(&mut self) {
        if self.closed.is_none() {
            self.close(CloseReason::Dismissed);
        }
    }

    fn close(&mut self, reason: CloseReason) {
        debug!(?reason, "popup closed");
        self.visibility = Visibility::Hidden;
        self.hovered = None;
        self.closed = Some(reason);
    }
}

/// The popup on screen, paired with the native window drawing it.
///
/// At most one popup is open: showing a new one dismisses the previous
/// one first, and the window is dropped as soon as its menu closes.
#[derive(Debug)]
pub struct PopupSlot<W> {
    open: Option<(PopupMenu, W)>,
}

impl<W> Default for PopupSlot<W> {
    fn default() -> Self {
        Self { open: None }
    }
}

impl<W> PopupSlot<W> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    /// Mark `menu` shown and keep it with `window`. Any popup still open
    /// is dismissed and its window dropped before the new one is stored.
    pub fn show(&mut self, mut menu: PopupMenu, window: W) -> (&PopupMenu, &W) {
        self.dismiss();
        menu.show();
        let (menu, window) = self.open.insert((menu, window));
        (&*menu, &*window)
    }

    pub fn current_mut(&mut self) -> Option<(&mut PopupMenu, &mut W)> {
        self.open.as_mut().map(|(menu, window)| (menu, window))
    }

    /// Drop the window if its menu has closed, returning the menu.
    pub fn release_closed(&mut self) -> Option<PopupMenu> {
        if self.open.as_ref().is_some_and(|(menu, _)| !menu.is_shown()) {
            return self.open.take().map(|(menu, _window)| menu);
        }
        None
    }

    /// Close the open popup without an action and drop its window.
    pub fn dismiss(&mut self) -> Option<PopupMenu> {
        let (mut menu, _window) = self.open.take()?;
        menu.dismiss();
        Some(menu)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;

    const TOGGLE: Point = Point::new(50, 40);
    const EXIT: Point = Point::new(50, 90);
    const LABEL: Point = Point::new(50, 10);

    fn shown(status: ServiceStatus) -> PopupMenu {
        let mut popup = PopupMenu::new(status, "CRD", Point::new(1000, 1000), None);
        popup.show();
        popup
    }

    #[test]
    fn starts_hidden_then_shows() {
        let mut popup = PopupMenu::new(ServiceStatus::Running, "CRD", Point::new(500, 500), None);
        assert_eq!(popup.visibility(), Visibility::Hidden);
        assert_eq!(popup.origin(), Point::new(500 - 202 + 10, 500 - 120 - 5));
        popup.show();
        assert!(popup.is_shown());
    }

    #[test]
    fn click_on_toggle_closes_and_yields_action() {
        let mut popup = shown(ServiceStatus::Stopped);
        assert_eq!(popup.click(TOGGLE), Some(MenuAction::Toggle));
        assert_eq!(popup.visibility(), Visibility::Hidden);
        assert_eq!(popup.close_reason(), Some(CloseReason::Selected(MenuAction::Toggle)));
    }

    #[test]
    fn click_on_exit_yields_exit() {
        let mut popup = shown(ServiceStatus::Running);
        assert_eq!(popup.click(EXIT), Some(MenuAction::Exit));
        assert!(!popup.is_shown());
    }

    #[test]
    fn click_on_label_keeps_popup_open() {
        let mut popup = shown(ServiceStatus::Running);
        assert_eq!(popup.click(LABEL), None);
        assert!(popup.is_shown());
    }

    #[test]
    fn deactivate_closes_without_action() {
        let mut popup = shown(ServiceStatus::Unknown);
        popup.deactivate();
        assert_eq!(popup.visibility(), Visibility::Hidden);
        assert_eq!(popup.close_reason(), Some(CloseReason::Deactivated));
        // a late click after focus loss does nothing
        assert_eq!(popup.click(TOGGLE), None);
    }

    #[test]
    fn closed_popup_is_never_reshown() {
        let mut popup = shown(ServiceStatus::Running);
        popup.deactivate();
        popup.show();
        assert_eq!(popup.visibility(), Visibility::Hidden);
    }

    #[test]
    fn hand_cursor_only_over_buttons() {
        let mut popup = shown(ServiceStatus::Running);
        assert!(popup.over_button(TOGGLE));
        assert!(popup.over_button(EXIT));
        assert!(!popup.over_button(LABEL));
        // left padding
        assert!(!popup.over_button(Point::new(3, 40)));

        popup.deactivate();
        assert!(!popup.over_button(TOGGLE));
    }

    #[test]
    fn hover_tracks_buttons() {
        let mut popup = shown(ServiceStatus::Running);
        assert!(popup.pointer_moved(TOGGLE));
        assert_eq!(popup.hovered(), Some(2));
        // same button: no repaint
        assert!(!popup.pointer_moved(Point::new(60, 45)));
        assert!(popup.pointer_moved(EXIT));
        assert_eq!(popup.hovered(), Some(4));
        assert!(popup.pointer_left());
        assert_eq!(popup.hovered(), None);
        assert!(!popup.pointer_left());
    }

    /// Stand-in window that counts how many times it was destroyed.
    struct CountedWindow(Rc<Cell<u32>>);

    impl Drop for CountedWindow {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    fn unshown(status: ServiceStatus) -> PopupMenu {
        PopupMenu::new(status, "CRD", Point::new(1000, 1000), None)
    }

    #[test]
    fn new_popup_closes_the_previous_one_first() {
        let destroyed = Rc::new(Cell::new(0));
        let mut slot = PopupSlot::new();

        slot.show(unshown(ServiceStatus::Stopped), CountedWindow(destroyed.clone()));
        assert_eq!(destroyed.get(), 0);

        let (menu, _) = slot.show(unshown(ServiceStatus::Running), CountedWindow(destroyed.clone()));
        assert!(menu.is_shown());
        assert_eq!(menu.status(), ServiceStatus::Running);
        assert_eq!(destroyed.get(), 1);

        let (current, _) = slot.current_mut().unwrap();
        assert_eq!(current.status(), ServiceStatus::Running);
    }

    #[test]
    fn exit_dismisses_the_open_popup() {
        let destroyed = Rc::new(Cell::new(0));
        let mut slot = PopupSlot::new();
        slot.show(unshown(ServiceStatus::Running), CountedWindow(destroyed.clone()));

        let menu = slot.dismiss().unwrap();
        assert_eq!(menu.close_reason(), Some(CloseReason::Dismissed));
        assert!(!slot.is_open());
        assert_eq!(destroyed.get(), 1);
        assert!(slot.dismiss().is_none());
    }

    #[test]
    fn closed_menu_releases_its_window() {
        let destroyed = Rc::new(Cell::new(0));
        let mut slot = PopupSlot::new();
        slot.show(unshown(ServiceStatus::Stopped), CountedWindow(destroyed.clone()));

        // still shown: nothing to release
        assert!(slot.release_closed().is_none());
        assert!(slot.is_open());

        let (menu, _) = slot.current_mut().unwrap();
        assert_eq!(menu.click(EXIT), Some(MenuAction::Exit));

        let released = slot.release_closed().unwrap();
        assert_eq!(released.close_reason(), Some(CloseReason::Selected(MenuAction::Exit)));
        assert!(!slot.is_open());
        assert_eq!(destroyed.get(), 1);
    }

    #[test]
    fn dismiss_records_reason_once() {
        let mut popup = shown(ServiceStatus::Running);
        popup.deactivate();
        popup.dismiss();
        assert_eq!(popup.close_reason(), Some(CloseReason::Deactivated));
    }
}
