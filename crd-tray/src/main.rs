//! CRD Tray — entry point.
//!
//! ```text
//! crd-tray                        Run with defaults (service "chromoting")
//! crd-tray --config <path>        Use custom config TOML
//! crd-tray --service <name>       Control another service
//! crd-tray --gen-config           Dump default config and exit
//! crd-tray --write-config         Write default config to the config path and exit
//! ```

#![cfg_attr(all(target_os = "windows", not(debug_assertions)), windows_subsystem = "windows")]

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crd_core::{ERROR_DIALOG_TITLE, LoopControl, PopupSlot, TrayController};

use crd_tray::config::{LoggingConfig, TrayConfig, install_dir, log_fallback, resolve};
use crd_tray::dialog;
use crd_tray::popup::{PopupEvent, PopupWindow};
use crd_tray::scm::ScmService;
use crd_tray::tray::{TrayEvent, TrayIcon};
use crd_tray::window;

// ── CLI ──────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "crd-tray", about = "Toggle the Chrome Remote Desktop host service from the tray")]
struct Cli {
    /// Path to configuration TOML file (relative to the executable's directory).
    #[arg(short, long, default_value = "crd-tray.toml")]
    config: PathBuf,

    /// Service name (overrides config).
    #[arg(short, long)]
    service: Option<String>,

    /// Print the default configuration to stdout and exit.
    #[arg(long)]
    gen_config: bool,

    /// Write the default configuration to the config path and exit.
    #[arg(long)]
    write_config: bool,
}

// ── Logging ──────────────────────────────────────────────────────

fn init_tracing(logging: &LoggingConfig, base: &Path) -> std::io::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    if logging.file.is_empty() {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    } else {
        let path = resolve(base, Path::new(&logging.file));
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }
    Ok(())
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.gen_config {
        let text = toml::to_string_pretty(&TrayConfig::default())?;
        println!("{text}");
        return Ok(());
    }

    let base = install_dir();
    let config_path = resolve(&base, &cli.config);

    if cli.write_config {
        TrayConfig::write_default(&config_path)?;
        println!("Default config written to {}", config_path.display());
        return Ok(());
    }

    let (mut config, config_error) = match TrayConfig::load(&config_path) {
        Ok(config) => (config, None),
        Err(e) => (TrayConfig::default(), Some(e)),
    };
    if let Some(name) = cli.service {
        config.service.name = name;
    }

    init_tracing(&config.logging, &base)?;
    if let Some(e) = &config_error {
        log_fallback(&config_path, e);
    }

    info!("crd-tray v{}", env!("CARGO_PKG_VERSION"));
    info!("service: {}", config.service.name);
    info!("toggle timeout: {} ms", config.service.toggle_timeout_ms);

    // ── 1. Tray icon ────────────────────────────────────────────

    let tray = TrayIcon::create(&config.icon_path(&base), &config.tray.tooltip).inspect_err(|e| {
        error!("startup failed: {e}");
    })?;

    // ── 2. Controller ───────────────────────────────────────────

    let service = Arc::new(ScmService::new(config.service.name.clone()));
    let (controller, mut reports) = TrayController::new(
        service,
        config.service.display_name.clone(),
        config.toggle_timing(),
    );

    // ── 3. Event loop ───────────────────────────────────────────

    let mut popup: PopupSlot<PopupWindow> = PopupSlot::new();

    'event_loop: loop {
        if !window::pump_messages() {
            break;
        }

        for ev in tray.poll_events() {
            match ev {
                TrayEvent::RightClick(cursor) => {
                    popup.dismiss();
                    let menu = controller.open_menu(cursor, window::work_area_at(cursor)).await;
                    match PopupWindow::open(&menu) {
                        Ok(win) => {
                            let (menu, win) = popup.show(menu, win);
                            win.render(menu);
                        }
                        Err(e) => warn!("cannot open menu: {e}"),
                    }
                }
                TrayEvent::TaskbarCreated => {
                    if let Err(e) = tray.restore() {
                        warn!("cannot restore tray icon: {e}");
                    }
                }
                TrayEvent::Close => break 'event_loop,
            }
        }

        // Drive the popup; drop the window as soon as the menu closes.
        let mut selected = None;
        if let Some((menu, win)) = popup.current_mut() {
            for ev in win.poll_events() {
                match ev {
                    PopupEvent::PointerMoved(p) => {
                        if menu.pointer_moved(p) {
                            win.render(menu);
                        }
                    }
                    PopupEvent::PointerLeft => {
                        if menu.pointer_left() {
                            win.render(menu);
                        }
                    }
                    PopupEvent::Clicked(p) => selected = menu.click(p),
                    PopupEvent::Deactivated => menu.deactivate(),
                }
                if !menu.is_shown() {
                    break;
                }
            }
        }
        popup.release_closed();

        if let Some(action) = selected {
            if controller.handle_action(action) == LoopControl::Exit {
                break;
            }
        }

        // Toggle results; failures block on a message box like the
        // rest of the UI.
        while let Ok(report) = reports.try_recv() {
            match report.dialog_text() {
                Some(text) => {
                    error!(service = %report.service, "toggle failed; showing error dialog");
                    dialog::show_error(ERROR_DIALOG_TITLE, &text);
                }
                None => info!(service = %report.service, "toggle complete"),
            }
        }

        // Yield briefly so Tokio can make progress.
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    // ── 4. Shutdown ─────────────────────────────────────────────

    info!("shutting down");
    popup.dismiss();
    drop(tray);

    Ok(())
}
