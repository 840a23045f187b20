//! Modal message boxes.

#[cfg(target_os = "windows")]
pub fn show_error(title: &str, text: &str) {
    use windows::Win32::UI::WindowsAndMessaging::{
        MB_ICONERROR, MB_OK, MB_SETFOREGROUND, MB_TOPMOST, MessageBoxW,
    };
    use windows::core::HSTRING;

    let text = HSTRING::from(text);
    let title = HSTRING::from(title);
    unsafe {
        MessageBoxW(None, &text, &title, MB_OK | MB_ICONERROR | MB_SETFOREGROUND | MB_TOPMOST);
    }
}

#[cfg(not(target_os = "windows"))]
pub fn show_error(title: &str, text: &str) {
    tracing::error!("{title}: {text}");
}
