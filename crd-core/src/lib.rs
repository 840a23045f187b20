//! # crd-core
//!
//! Platform-independent core of the CRD tray utility.
//!
//! This crate contains:
//! - **Status**: `ServiceState` (service manager states) and `ServiceStatus` (what the menu shows)
//! - **Service**: the `ServiceControl` seam, status query, toggle and wait-for-state
//! - **Menu**: popup layout, hit testing and cursor-relative placement
//! - **Popup**: the `PopupMenu` show/close state machine and the single-popup `PopupSlot`
//! - **Controller**: `TrayController`, in-flight toggle guard and `ToggleReport`s
//! - **Error**: `CrdError` — typed, `thiserror`-based error hierarchy

pub mod controller;
pub mod error;
pub mod menu;
pub mod popup;
pub mod service;
pub mod status;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use controller::{ERROR_DIALOG_TITLE, LoopControl, ToggleReport, TrayController};
pub use error::CrdError;
pub use menu::{MenuAction, MenuItem, MenuLayout, Point, Rect, menu_position};
pub use popup::{CloseReason, PopupMenu, PopupSlot, Visibility};
pub use service::{
    DEFAULT_POLL_INTERVAL, DEFAULT_TOGGLE_TIMEOUT, ServiceControl, ToggleTiming, query_status,
    toggle_service, wait_for_state,
};
pub use status::{Rgb, ServiceState, ServiceStatus};
