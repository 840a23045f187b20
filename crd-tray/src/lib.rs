//! # crd-tray — Chrome Remote Desktop Tray Toggle
//!
//! Sits in the Windows notification area. A right-click on the icon
//! shows a small popup with the host service's status and a button to
//! start or stop it; toggle failures are reported in a message box.

pub mod config;
pub mod dialog;
pub mod popup;
pub mod scm;
pub mod tray;
pub mod window;
