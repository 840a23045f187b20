//! Borderless popup window that draws a [`PopupMenu`].
//!
//! The window only draws and reports input; the menu's state machine
//! lives in `crd-core` and is driven by the main loop. Painting uses
//! plain GDI `FillRect` / `DrawTextW`.

#[cfg(target_os = "windows")]
mod platform {
    use std::cell::RefCell;
    use std::sync::mpsc;

    use tracing::debug;
    use windows::Win32::Foundation::*;
    use windows::Win32::Graphics::Gdi::*;
    use windows::Win32::UI::Input::KeyboardAndMouse::{TME_LEAVE, TRACKMOUSEEVENT, TrackMouseEvent};
    use windows::Win32::UI::WindowsAndMessaging::*;
    use windows::core::PCWSTR;

    use crd_core::menu::{FONT_FACE, FONT_POINTS};
    use crd_core::{CrdError, MenuItem, Point, PopupMenu, Rect, Rgb};

    use crate::window::{register_class, wide};

    /// Input reported by the popup window (client coordinates).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum PopupEvent {
        PointerMoved(Point),
        PointerLeft,
        Clicked(Point),
        /// The window lost input focus.
        Deactivated,
    }

    /// State reachable from the window procedure.
    struct Shared {
        tx: mpsc::Sender<PopupEvent>,
        scene: RefCell<PopupMenu>,
        font: HFONT,
    }

    fn lparam_point(lparam: LPARAM) -> Point {
        let x = (lparam.0 & 0xFFFF) as i16 as i32;
        let y = ((lparam.0 >> 16) & 0xFFFF) as i16 as i32;
        Point::new(x, y)
    }

    unsafe extern "system" fn wndproc(
        hwnd: HWND,
        msg: u32,
        wparam: WPARAM,
        lparam: LPARAM,
    ) -> LRESULT {
        let shared_ptr = unsafe { GetWindowLongPtrW(hwnd, GWLP_USERDATA) } as *const Shared;

        if shared_ptr.is_null() {
            return unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) };
        }

        let shared = unsafe { &*shared_ptr };

        match msg {
            WM_PAINT => {
                unsafe { paint(hwnd, shared) };
                LRESULT(0)
            }
            WM_ERASEBKGND => LRESULT(1),
            WM_SETCURSOR if (lparam.0 & 0xFFFF) as u32 == HTCLIENT => {
                let mut pt = POINT::default();
                let over_button = unsafe {
                    GetCursorPos(&mut pt).is_ok() && ScreenToClient(hwnd, &mut pt).as_bool()
                } && shared.scene.borrow().over_button(Point::new(pt.x, pt.y));
                let cursor = if over_button { IDC_HAND } else { IDC_ARROW };
                unsafe {
                    if let Ok(c) = LoadCursorW(None, cursor) {
                        SetCursor(c);
                    }
                }
                LRESULT(1)
            }
            WM_MOUSEMOVE => {
                let mut tme = TRACKMOUSEEVENT {
                    cbSize: std::mem::size_of::<TRACKMOUSEEVENT>() as u32,
                    dwFlags: TME_LEAVE,
                    hwndTrack: hwnd,
                    dwHoverTime: 0,
                };
                unsafe {
                    let _ = TrackMouseEvent(&mut tme);
                }
                let _ = shared.tx.send(PopupEvent::PointerMoved(lparam_point(lparam)));
                LRESULT(0)
            }
            WM_MOUSELEAVE => {
                let _ = shared.tx.send(PopupEvent::PointerLeft);
                LRESULT(0)
            }
            WM_LBUTTONUP => {
                let _ = shared.tx.send(PopupEvent::Clicked(lparam_point(lparam)));
                LRESULT(0)
            }
            WM_ACTIVATE => {
                if (wparam.0 & 0xFFFF) as u32 == WA_INACTIVE {
                    let _ = shared.tx.send(PopupEvent::Deactivated);
                }
                LRESULT(0)
            }
            _ => unsafe { DefWindowProcW(hwnd, msg, wparam, lparam) },
        }
    }

    fn to_rect(r: Rect) -> RECT {
        RECT {
            left: r.left,
            top: r.top,
            right: r.right,
            bottom: r.bottom,
        }
    }

    unsafe fn fill(hdc: HDC, r: Rect, color: Rgb) {
        unsafe {
            let brush = CreateSolidBrush(COLORREF(color.to_colorref()));
            FillRect(hdc, &to_rect(r), brush);
            let _ = DeleteObject(brush);
        }
    }

    unsafe fn text(hdc: HDC, s: &str, r: Rect, color: Rgb, format: DRAW_TEXT_FORMAT) {
        let mut buf: Vec<u16> = s.encode_utf16().collect();
        let mut rc = to_rect(r);
        unsafe {
            SetTextColor(hdc, COLORREF(color.to_colorref()));
            DrawTextW(hdc, &mut buf, &mut rc, format | DT_SINGLELINE | DT_VCENTER | DT_NOPREFIX);
        }
    }

    unsafe fn paint(hwnd: HWND, shared: &Shared) {
        let menu = shared.scene.borrow();
        let layout = menu.layout();

        unsafe {
            let mut ps = PAINTSTRUCT::default();
            let hdc = BeginPaint(hwnd, &mut ps);

            // 1 px border, then the dark body
            let outer = Rect::from_xywh(0, 0, layout.width, layout.height);
            fill(hdc, outer, Rgb::GRAY);
            let inner = Rect::from_xywh(1, 1, outer.width() - 2, outer.height() - 2);
            fill(hdc, inner, Rgb::BACKGROUND);

            SetBkMode(hdc, TRANSPARENT);
            let old_font = SelectObject(hdc, shared.font);

            for (i, item) in layout.items.iter().enumerate() {
                match item {
                    MenuItem::Label { text: s, color, rect } => {
                        text(hdc, s, *rect, *color, DT_LEFT);
                    }
                    MenuItem::Separator { rect } => fill(hdc, *rect, Rgb::DIM_GRAY),
                    MenuItem::Button { text: s, rect, .. } => {
                        let bg = if menu.hovered() == Some(i) {
                            Rgb::HOVER
                        } else {
                            Rgb::BACKGROUND
                        };
                        fill(hdc, *rect, bg);
                        text(hdc, s, *rect, Rgb::WHITE, DT_CENTER);
                    }
                }
            }

            SelectObject(hdc, old_font);
            let _ = EndPaint(hwnd, &ps);
        }
    }

    fn create_font() -> HFONT {
        unsafe {
            let screen = GetDC(None);
            let dpi = GetDeviceCaps(screen, LOGPIXELSY);
            ReleaseDC(None, screen);

            let mut lf = LOGFONTW {
                lfHeight: -(FONT_POINTS * dpi / 72),
                lfWeight: 400,
                ..Default::default()
            };
            let face: Vec<u16> = FONT_FACE.encode_utf16().collect();
            let len = face.len().min(lf.lfFaceName.len() - 1);
            lf.lfFaceName[..len].copy_from_slice(&face[..len]);
            CreateFontIndirectW(&lf)
        }
    }

    /// A visible popup window.
    pub struct PopupWindow {
        hwnd: HWND,
        event_rx: mpsc::Receiver<PopupEvent>,
    }

    impl PopupWindow {
        /// Create the window at the menu's origin, show it, and give it
        /// focus so that a later click elsewhere deactivates it.
        pub fn open(menu: &PopupMenu) -> Result<Self, CrdError> {
            let class_name = wide("CrdPopupMenuClass");
            let hinstance = register_class(&class_name, Some(wndproc), CS_DROPSHADOW, IDC_ARROW)?;

            let origin = menu.origin();
            let layout = menu.layout();
            let title = wide("CRD Menu");

            let hwnd = unsafe {
                CreateWindowExW(
                    WS_EX_TOPMOST | WS_EX_TOOLWINDOW,
                    PCWSTR(class_name.as_ptr()),
                    PCWSTR(title.as_ptr()),
                    WS_POPUP,
                    origin.x,
                    origin.y,
                    layout.width,
                    layout.height,
                    None,
                    None,
                    hinstance,
                    None,
                )
            }
            .map_err(|e| CrdError::Window(format!("CreateWindowExW failed: {e}")))?;

            let (tx, event_rx) = mpsc::channel();
            let shared = Box::new(Shared {
                tx,
                scene: RefCell::new(menu.clone()),
                font: create_font(),
            });
            unsafe {
                SetWindowLongPtrW(hwnd, GWLP_USERDATA, Box::into_raw(shared) as isize);
                let _ = ShowWindow(hwnd, SW_SHOW);
                let _ = SetForegroundWindow(hwnd);
            }
            debug!(x = origin.x, y = origin.y, "popup window shown");

            Ok(Self { hwnd, event_rx })
        }

        /// Collect events queued since the last call.
        pub fn poll_events(&self) -> Vec<PopupEvent> {
            let mut events = Vec::new();
            while let Ok(ev) = self.event_rx.try_recv() {
                events.push(ev);
            }
            events
        }

        /// Replace the drawn menu state and schedule a repaint.
        pub fn render(&self, menu: &PopupMenu) {
            unsafe {
                let ptr = GetWindowLongPtrW(self.hwnd, GWLP_USERDATA) as *const Shared;
                if let Some(shared) = ptr.as_ref() {
                    *shared.scene.borrow_mut() = menu.clone();
                }
                let _ = InvalidateRect(self.hwnd, None, FALSE);
            }
        }
    }

    impl Drop for PopupWindow {
        fn drop(&mut self) {
            unsafe {
                let ptr = GetWindowLongPtrW(self.hwnd, GWLP_USERDATA) as *mut Shared;
                if !ptr.is_null() {
                    SetWindowLongPtrW(self.hwnd, GWLP_USERDATA, 0);
                    let shared = Box::from_raw(ptr);
                    let _ = DeleteObject(shared.font);
                }
                let _ = DestroyWindow(self.hwnd);
            }
        }
    }
}

#[cfg(target_os = "windows")]
pub use platform::*;

// ── Non-Windows stub ─────────────────────────────────────────────

#[cfg(not(target_os = "windows"))]
pub mod stub {
    use crd_core::{CrdError, Point, PopupMenu};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum PopupEvent {
        PointerMoved(Point),
        PointerLeft,
        Clicked(Point),
        Deactivated,
    }

    pub struct PopupWindow;

    impl PopupWindow {
        pub fn open(_menu: &PopupMenu) -> Result<Self, CrdError> {
            Err(CrdError::Unsupported)
        }

        pub fn poll_events(&self) -> Vec<PopupEvent> {
            Vec::new()
        }

        pub fn render(&self, _menu: &PopupMenu) {}
    }
}

#[cfg(not(target_os = "windows"))]
pub use stub::*;
