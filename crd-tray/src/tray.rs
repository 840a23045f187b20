//! Notification area icon.
//!
//! A hidden host window owns the icon and receives its callback
//! messages. Right-clicks surface as [`TrayEvent::RightClick`] with the
//! cursor position at the time of the click.

#[cfg(target_os = "windows")]
mod platform {
    use std::path::Path;
    use std::sync::OnceLock;
    use std::sync::mpsc;

    use tracing::{debug, info};
    use windows::Win32::Foundation::*;
    use windows::Win32::UI::Shell::{
        NIF_ICON, NIF_MESSAGE, NIF_TIP, NIM_ADD, NIM_DELETE, NOTIFYICONDATAW, Shell_NotifyIconW,
    };
    use windows::Win32::UI::WindowsAndMessaging::*;
    use windows::core::{HSTRING, PCWSTR, w};

    use crd_core::{CrdError, Point};

    use crate::window::{cursor_position, register_class, wide};

    /// Events produced by the tray host window.
    #[derive(Debug, Clone)]
    pub enum TrayEvent {
        /// Right button released over the icon, at this screen position.
        RightClick(Point),
        /// Explorer restarted; the icon must be added again.
        TaskbarCreated,
        /// The host window was asked to close (session end).
        Close,
    }

    const WM_TRAYICON: u32 = WM_APP + 1;
    const TRAY_ID: u32 = 1;

    /// Message id of the shell's `TaskbarCreated` broadcast.
    static TASKBAR_CREATED: OnceLock<u32> = OnceLock::new();

    /// `WM_ENDSESSION` with a zero `wParam` means the session end was
    /// cancelled; only a real end (or `WM_CLOSE`) stops the utility.
    fn closes_host(msg: u32, wparam: WPARAM) -> bool {
        match msg {
            WM_CLOSE => true,
            WM_ENDSESSION => wparam.0 != 0,
            _ => false,
        }
    }

    unsafe extern "system" fn wndproc(
        hwnd: HWND,
        msg: u32,
        wparam: WPARAM,
        lparam: LPARAM,
    ) -> LRESULT {
        let tx_ptr = unsafe { GetWindowLongPtrW(hwnd, GWLP_USERDATA) } as *const mpsc::Sender<TrayEvent>;

        if tx_ptr.is_null() {
            return unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) };
        }

        let tx = unsafe { &*tx_ptr };

        match msg {
            WM_TRAYICON => {
                if (lparam.0 & 0xFFFF) as u32 == WM_RBUTTONUP {
                    let _ = tx.send(TrayEvent::RightClick(cursor_position()));
                }
                LRESULT(0)
            }
            WM_CLOSE | WM_ENDSESSION => {
                if closes_host(msg, wparam) {
                    let _ = tx.send(TrayEvent::Close);
                }
                LRESULT(0)
            }
            m if Some(&m) == TASKBAR_CREATED.get() => {
                let _ = tx.send(TrayEvent::TaskbarCreated);
                LRESULT(0)
            }
            _ => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
        }
    }

    /// The tray icon and its hidden host window.
    pub struct TrayIcon {
        hwnd: HWND,
        icon: HICON,
        tooltip: String,
        event_rx: mpsc::Receiver<TrayEvent>,
    }

    impl TrayIcon {
        /// Load `icon_path` and add the icon to the notification area.
        ///
        /// A missing or unreadable icon file is an error; there is no
        /// fallback icon.
        pub fn create(icon_path: &Path, tooltip: &str) -> Result<Self, CrdError> {
            let icon = load_icon(icon_path)?;

            TASKBAR_CREATED.get_or_init(|| unsafe { RegisterWindowMessageW(w!("TaskbarCreated")) });

            let class_name = wide("CrdTrayHostClass");
            let hinstance = register_class(&class_name, Some(wndproc), WNDCLASS_STYLES(0), IDC_ARROW)?;

            let title = wide("CRD Tray");
            // Not a message-only window: those miss the TaskbarCreated broadcast.
            let hwnd = unsafe {
                CreateWindowExW(
                    WINDOW_EX_STYLE(0),
                    PCWSTR(class_name.as_ptr()),
                    PCWSTR(title.as_ptr()),
                    WINDOW_STYLE(0),
                    0,
                    0,
                    0,
                    0,
                    None,
                    None,
                    hinstance,
                    None,
                )
            }
            .map_err(|e| CrdError::Window(format!("CreateWindowExW failed: {e}")))?;

            let (event_tx, event_rx) = mpsc::channel();
            let tx_ptr = Box::into_raw(Box::new(event_tx));
            unsafe {
                SetWindowLongPtrW(hwnd, GWLP_USERDATA, tx_ptr as isize);
            }

            let tray = Self {
                hwnd,
                icon,
                tooltip: tooltip.to_string(),
                event_rx,
            };
            tray.add()?;
            info!(icon = %icon_path.display(), "tray icon added");
            Ok(tray)
        }

        /// Collect events queued since the last call.
        pub fn poll_events(&self) -> Vec<TrayEvent> {
            let mut events = Vec::new();
            while let Ok(ev) = self.event_rx.try_recv() {
                events.push(ev);
            }
            events
        }

        /// Add the icon again after the shell restarted.
        pub fn restore(&self) -> Result<(), CrdError> {
            debug!("taskbar recreated; re-adding tray icon");
            self.add()
        }

        fn notify_data(&self) -> NOTIFYICONDATAW {
            let mut nid = NOTIFYICONDATAW {
                cbSize: std::mem::size_of::<NOTIFYICONDATAW>() as u32,
                hWnd: self.hwnd,
                uID: TRAY_ID,
                uFlags: NIF_MESSAGE | NIF_ICON | NIF_TIP,
                uCallbackMessage: WM_TRAYICON,
                hIcon: self.icon,
                ..Default::default()
            };
            let tip: Vec<u16> = self.tooltip.encode_utf16().collect();
            let len = tip.len().min(nid.szTip.len() - 1);
            nid.szTip[..len].copy_from_slice(&tip[..len]);
            nid
        }

        fn add(&self) -> Result<(), CrdError> {
            let nid = self.notify_data();
            if unsafe { Shell_NotifyIconW(NIM_ADD, &nid) }.as_bool() {
                Ok(())
            } else {
                Err(CrdError::Window("Shell_NotifyIconW(NIM_ADD) failed".into()))
            }
        }
    }

    impl Drop for TrayIcon {
        fn drop(&mut self) {
            unsafe {
                let nid = self.notify_data();
                let _ = Shell_NotifyIconW(NIM_DELETE, &nid);
                let _ = DestroyIcon(self.icon);

                let ptr = GetWindowLongPtrW(self.hwnd, GWLP_USERDATA) as *mut mpsc::Sender<TrayEvent>;
                if !ptr.is_null() {
                    drop(Box::from_raw(ptr));
                    SetWindowLongPtrW(self.hwnd, GWLP_USERDATA, 0);
                }
                let _ = DestroyWindow(self.hwnd);
            }
            info!("tray icon removed");
        }
    }

    fn load_icon(path: &Path) -> Result<HICON, CrdError> {
        if !path.is_file() {
            return Err(CrdError::IconLoad {
                path: path.to_path_buf(),
                reason: "file not found".into(),
            });
        }

        let name = HSTRING::from(path.as_os_str());
        let handle = unsafe {
            LoadImageW(None, &name, IMAGE_ICON, 0, 0, LR_LOADFROMFILE | LR_DEFAULTSIZE)
        }
        .map_err(|e| CrdError::IconLoad {
            path: path.to_path_buf(),
            reason: e.message().to_string(),
        })?;

        Ok(HICON(handle.0))
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn cancelled_session_end_keeps_running() {
            assert!(!closes_host(WM_ENDSESSION, WPARAM(0)));
            assert!(closes_host(WM_ENDSESSION, WPARAM(1)));
            assert!(closes_host(WM_CLOSE, WPARAM(0)));
            assert!(!closes_host(WM_TRAYICON, WPARAM(1)));
        }

        #[test]
        fn missing_icon_fails_fast() {
            let err = load_icon(Path::new("definitely/not/here/crd.ico")).unwrap_err();
            assert!(matches!(err, CrdError::IconLoad { .. }));
        }
    }
}

#[cfg(target_os = "windows")]
pub use platform::*;

// ── Non-Windows stub ─────────────────────────────────────────────

#[cfg(not(target_os = "windows"))]
pub mod stub {
    use std::path::Path;

    use crd_core::{CrdError, Point};

    #[derive(Debug, Clone)]
    pub enum TrayEvent {
        RightClick(Point),
        TaskbarCreated,
        Close,
    }

    pub struct TrayIcon;

    impl TrayIcon {
        pub fn create(_icon_path: &Path, _tooltip: &str) -> Result<Self, CrdError> {
            Err(CrdError::Unsupported)
        }

        pub fn poll_events(&self) -> Vec<TrayEvent> {
            Vec::new()
        }

        pub fn restore(&self) -> Result<(), CrdError> {
            Ok(())
        }
    }
}

#[cfg(not(target_os = "windows"))]
pub use stub::*;
