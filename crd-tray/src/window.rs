//! Win32 plumbing shared by the tray host window and the popup.
//!
//! Both windows forward messages as events over an `mpsc` channel
//! whose sender lives in `GWLP_USERDATA`; the main loop drains them
//! after [`pump_messages`].

#[cfg(target_os = "windows")]
mod platform {
    use windows::Win32::Foundation::*;
    use windows::Win32::Graphics::Gdi::{GetMonitorInfoW, MONITOR_DEFAULTTONEAREST, MONITORINFO, MonitorFromPoint};
    use windows::Win32::System::LibraryLoader::GetModuleHandleW;
    use windows::Win32::UI::WindowsAndMessaging::*;
    use windows::core::PCWSTR;

    use crd_core::{CrdError, Point, Rect};

    /// NUL-terminated UTF-16 copy of `s`.
    pub fn wide(s: &str) -> Vec<u16> {
        s.encode_utf16().chain(std::iter::once(0)).collect()
    }

    /// Dispatch every queued message for this thread (non-blocking).
    /// Returns `false` once `WM_QUIT` has been seen.
    pub fn pump_messages() -> bool {
        unsafe {
            let mut msg = MSG::default();
            while PeekMessageW(&mut msg, None, 0, 0, PM_REMOVE).as_bool() {
                if msg.message == WM_QUIT {
                    return false;
                }
                let _ = TranslateMessage(&msg);
                DispatchMessageW(&msg);
            }
        }
        true
    }

    /// Current cursor position in screen coordinates.
    pub fn cursor_position() -> Point {
        let mut pt = POINT::default();
        unsafe {
            let _ = GetCursorPos(&mut pt);
        }
        Point::new(pt.x, pt.y)
    }

    /// Work area (screen minus taskbar) of the monitor nearest to `p`.
    pub fn work_area_at(p: Point) -> Option<Rect> {
        unsafe {
            let monitor = MonitorFromPoint(POINT { x: p.x, y: p.y }, MONITOR_DEFAULTTONEAREST);
            let mut info = MONITORINFO {
                cbSize: std::mem::size_of::<MONITORINFO>() as u32,
                ..Default::default()
            };
            if !GetMonitorInfoW(monitor, &mut info).as_bool() {
                return None;
            }
            let rc = info.rcWork;
            Some(Rect {
                left: rc.left,
                top: rc.top,
                right: rc.right,
                bottom: rc.bottom,
            })
        }
    }

    /// Register a window class once per process.
    pub fn register_class(
        class_name: &[u16],
        wndproc: WNDPROC,
        style: WNDCLASS_STYLES,
        cursor: PCWSTR,
    ) -> Result<HINSTANCE, CrdError> {
        let hinstance = unsafe { GetModuleHandleW(None) }
            .map_err(|e| CrdError::Window(format!("GetModuleHandle: {e}")))?;

        let wc = WNDCLASSW {
            style,
            lpfnWndProc: wndproc,
            hInstance: hinstance.into(),
            lpszClassName: PCWSTR(class_name.as_ptr()),
            hCursor: unsafe { LoadCursorW(None, cursor) }.unwrap_or_default(),
            ..Default::default()
        };

        let atom = unsafe { RegisterClassW(&wc) };
        if atom == 0 && unsafe { GetLastError() } != ERROR_CLASS_ALREADY_EXISTS {
            return Err(CrdError::Window("RegisterClassW failed".into()));
        }
        Ok(hinstance.into())
    }
}

#[cfg(target_os = "windows")]
pub use platform::*;

// ── Non-Windows stub ─────────────────────────────────────────────

#[cfg(not(target_os = "windows"))]
pub mod stub {
    use crd_core::{Point, Rect};

    pub fn pump_messages() -> bool {
        true
    }

    pub fn work_area_at(_p: Point) -> Option<Rect> {
        None
    }
}

#[cfg(not(target_os = "windows"))]
pub use stub::*;
