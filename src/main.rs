//! Retro OBD-II dashboard in a desktop window.
//!
//! Runs the dashboard on the embedded-graphics simulator window. The polling
//! worker starts with the dashboard; this thread only handles input, drains
//! updates and repaints, once per UI tick.
//!
//! # Controls
//!
//! | Input            | Action                          |
//! |------------------|---------------------------------|
//! | Mouse click      | Toggle red / white theme        |
//! | Ctrl+C, Escape   | Quit                            |
//! | Close window     | Quit                            |

use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Instant;

use clap::Parser;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::prelude::*;
use embedded_graphics_simulator::sdl2::{Keycode, Mod};
use embedded_graphics_simulator::{OutputSettingsBuilder, SimulatorDisplay, SimulatorEvent, Window};
use retro_dash::dashboard::Dashboard;
use retro_dash::error::DashError;
use retro_dash::logging;
use retro_dash::obd::connector_from_settings;
use retro_dash::settings::{AdapterKind, Overrides, Settings};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "retro-dash", version)]
#[command(about = "Retro digital gauge dashboard for OBD-II adapters", long_about = None)]
struct Args {
    /// Settings file (default: config/dashboard.toml if present)
    #[arg(short, long, env = "RETRO_DASH_CONFIG")]
    config: Option<PathBuf>,

    /// Adapter implementation
    #[arg(long, value_enum)]
    adapter: Option<AdapterKind>,

    /// ELM327 TCP address, e.g. 192.168.0.10:35000
    #[arg(long, conflicts_with = "device")]
    address: Option<String>,

    /// ELM327 serial device node, e.g. /dev/rfcomm0
    #[arg(long)]
    device: Option<PathBuf>,

    /// Window pixel scale
    #[arg(long)]
    scale: Option<u32>,

    /// Log filter (overridden by RUST_LOG)
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            adapter: self.adapter,
            address: self.address.clone(),
            device: self.device.clone(),
            scale: self.scale,
            log_level: self.log_level.clone(),
        }
    }
}

/// What the window asked for this tick.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Input {
    None,
    ToggleTheme,
    Quit,
}

fn main() -> ExitCode {
    let args = Args::parse();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), DashError> {
    let source = Settings::source_path(args.config.as_deref());
    let mut settings = match &source {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    settings.apply(args.overrides());
    settings.validate()?;

    logging::init(&settings.logging.level)?;
    match &source {
        Some(path) => info!(path = %path.display(), "loaded settings"),
        None => info!("no settings file found, using defaults"),
    }

    let connector = connector_from_settings(&settings.adapter)?;
    info!(adapter = %connector.describe(), "dashboard v{} starting", env!("CARGO_PKG_VERSION"));

    let display_size = Size::new(settings.display.width, settings.display.height);
    let mut display: SimulatorDisplay<Rgb565> = SimulatorDisplay::new(display_size);
    let output_settings = OutputSettingsBuilder::new().scale(settings.display.scale).build();
    let mut window = Window::new(&settings.display.title, &output_settings);

    let mut dashboard = Dashboard::start(&settings, connector)?;
    let ui_tick = settings.display.ui_tick();

    loop {
        let tick_start = Instant::now();

        dashboard.process_updates();
        dashboard.draw(&mut display);
        window.update(&display);

        match poll_input(&mut window) {
            Input::Quit => break,
            Input::ToggleTheme => dashboard.toggle_theme(),
            Input::None => {}
        }

        if let Some(remaining) = ui_tick.checked_sub(tick_start.elapsed()) {
            thread::sleep(remaining);
        }
    }

    dashboard.stop();
    info!("dashboard closed");
    Ok(())
}

fn poll_input(window: &mut Window) -> Input {
    let mut input = Input::None;
    for ev in window.events() {
        match ev {
            SimulatorEvent::Quit => return Input::Quit,
            SimulatorEvent::KeyDown { keycode, keymod, repeat } => {
                if repeat {
                    continue;
                }
                let ctrl = keymod.intersects(Mod::LCTRLMOD | Mod::RCTRLMOD);
                if keycode == Keycode::Escape || (ctrl && keycode == Keycode::C) {
                    return Input::Quit;
                }
            }
            // Two clicks in one tick cancel out
            SimulatorEvent::MouseButtonDown { .. } => {
                input = if input == Input::ToggleTheme { Input::None } else { Input::ToggleTheme };
            }
            _ => {}
        }
    }
    input
}
