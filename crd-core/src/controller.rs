//! Tray controller: turns tray clicks and menu selections into
//! service queries and toggles.
//!
//! The controller holds no window handles. The binary owns the native
//! tray icon and popup window and calls in here; toggle outcomes come
//! back over the channel returned by [`TrayController::new`] so the UI
//! loop keeps pumping messages while the service settles.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::error::CrdError;
use crate::menu::{MenuAction, Point, Rect};
use crate::popup::PopupMenu;
use crate::service::{ServiceControl, ToggleTiming, query_status, toggle_service};
use crate::status::ServiceState;

/// Title of the toggle failure dialog.
pub const ERROR_DIALOG_TITLE: &str = "Error";

/// Result of one toggle, delivered to the UI loop.
#[derive(Debug)]
pub struct ToggleReport {
    pub service: String,
    pub outcome: Result<ServiceState, CrdError>,
}

impl ToggleReport {
    /// Text for the error dialog, or `None` when the toggle succeeded.
    pub fn dialog_text(&self) -> Option<String> {
        self.outcome
            .as_ref()
            .err()
            .map(|e| format!("Error toggling service:\n{e}"))
    }
}

/// What the UI loop should do after a menu action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Exit,
}

/// Clears the in-flight flag when the toggle task ends, however it ends.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct TrayController<S: ServiceControl + ?Sized> {
    service: Arc<S>,
    display_name: String,
    timing: ToggleTiming,
    in_flight: Arc<AtomicBool>,
    report_tx: mpsc::UnboundedSender<ToggleReport>,
}

impl<S: ServiceControl + ?Sized + 'static> TrayController<S> {
    /// Create a controller for `service`. `display_name` is the short
    /// name shown in the popup (e.g. `CRD`).
    pub fn new(
        service: Arc<S>,
        display_name: impl Into<String>,
        timing: ToggleTiming,
    ) -> (Self, mpsc::UnboundedReceiver<ToggleReport>) {
        let (report_tx, report_rx) = mpsc::unbounded_channel();
        let controller = Self {
            service,
            display_name: display_name.into(),
            timing,
            in_flight: Arc::new(AtomicBool::new(false)),
            report_tx,
        };
        (controller, report_rx)
    }

    /// `true` while a toggle is waiting for the service to settle.
    pub fn is_toggling(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Query the service and build a popup anchored at `cursor`.
    ///
    /// Query failures never surface here; the popup shows the service as
    /// disabled.
    pub async fn open_menu(&self, cursor: Point, work_area: Option<Rect>) -> PopupMenu {
        let status = query_status(self.service.as_ref()).await;
        info!(service = self.service.name(), %status, "opening menu");
        PopupMenu::new(status, &self.display_name, cursor, work_area)
    }

    /// Start a toggle in the background.
    ///
    /// Fails with [`CrdError::ToggleInFlight`] while a previous toggle
    /// is still running. The outcome is sent as a [`ToggleReport`].
    pub fn toggle(&self) -> Result<JoinHandle<()>, CrdError> {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(CrdError::ToggleInFlight);
        }
        let guard = InFlightGuard(self.in_flight.clone());

        let service = self.service.clone();
        let timing = self.timing;
        let report_tx = self.report_tx.clone();

        Ok(tokio::spawn(async move {
            let outcome = toggle_service(service.as_ref(), timing).await;
            if let Err(e) = &outcome {
                warn!(service = service.name(), "toggle failed: {e}");
            }
            // clear the flag before the UI can observe the report
            drop(guard);
            let _ = report_tx.send(ToggleReport {
                service: service.name().to_string(),
                outcome,
            });
        }))
    }

    /// Run the action bound to a clicked menu button.
    pub fn handle_action(&self, action: MenuAction) -> LoopControl {
        match action {
            MenuAction::Toggle => {
                if let Err(e) = self.toggle() {
                    warn!("toggle ignored: {e}");
                }
                LoopControl::Continue
            }
            MenuAction::Exit => {
                info!("exit requested");
                LoopControl::Exit
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dialog_text_only_for_failures() {
        let ok = ToggleReport {
            service: "chromoting".into(),
            outcome: Ok(ServiceState::Running),
        };
        assert_eq!(ok.dialog_text(), None);

        let failed = ToggleReport {
            service: "chromoting".into(),
            outcome: Err(CrdError::AccessDenied("chromoting".into())),
        };
        let text = failed.dialog_text().unwrap();
        assert!(text.starts_with("Error toggling service:\n"));
        assert!(text.contains("access denied"));
    }
}
