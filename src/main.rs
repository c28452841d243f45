mod app;
mod clock;
mod config;
mod density;
mod engine;
mod error;
mod logging;
mod particle;
mod pool;
mod settings;
mod ui;
mod wind;

use app::{Action, App};
use clap::Parser;
use config::AppConfig;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use engine::{Engine, SimulationConfig};
use error::ConfigError;
use log::{info, warn, LevelFilter};
use particle::Bounds;
use ratatui::{backend::CrosstermBackend, Terminal};
use settings::{DensityTier, WindTuning};
use std::io::{self, IsTerminal, Stdout};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use ui::TerminalAdapter;

#[derive(Parser, Debug)]
#[command(name = "cbreeze")]
#[command(about = "Layered wind particle simulation in the terminal")]
struct Args {
    /// Wind color (cyan, blue, white, magenta, green, yellow, red)
    #[arg(long)]
    color: Option<String>,

    /// Start in density visualization mode
    #[arg(long)]
    density: bool,

    /// Use the normal particle tier instead of high density
    #[arg(long = "normal-density")]
    normal_density: bool,

    /// Seed for reproducible wind and particles
    #[arg(long)]
    seed: Option<u64>,

    /// JSON config file (defaults to <config dir>/cbreeze/config.json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Append debug logs to this file
    #[arg(long = "log-file")]
    log_file: Option<PathBuf>,
}

/// Startup settings after merging the config file and command-line flags
struct Startup {
    config: SimulationConfig,
    tuning: WindTuning,
    seed: Option<u64>,
}

/// Flags win over the config file, which wins over defaults
fn resolve(args: &Args, bounds: Bounds) -> Result<Startup, ConfigError> {
    let file = AppConfig::discover(args.config.as_deref())?;

    let color = match &args.color {
        Some(name) => name.clone(),
        None => file.color.unwrap_or_default().name().to_string(),
    };
    let density_mode = args.density || file.density_mode.unwrap_or(false);
    let high_tier = !args.normal_density && file.density_tier.unwrap_or_default() == DensityTier::High;
    let config = SimulationConfig::new(&color, density_mode, high_tier, bounds)?;

    Ok(Startup {
        config,
        seed: args.seed.or(file.seed),
        tuning: file.tuning,
    })
}

/// Dumb terminals cannot position the cursor
fn terminal_supported(term: Option<&str>) -> bool {
    !matches!(term, Some(t) if t.eq_ignore_ascii_case("dumb"))
}

/// Raw mode and the alternate screen, released on drop
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        if let Err(err) = execute!(stdout, EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(err);
        }
        let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
        terminal.hide_cursor()?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Restore the terminal before the default hook prints the panic
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        default_hook(info);
    }));
}

fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(path) = &args.log_file {
        if let Err(err) = logging::init(path, LevelFilter::Debug) {
            eprintln!("Error: cannot open log file {}: {}", path.display(), err);
            return ExitCode::FAILURE;
        }
    }

    let term = std::env::var("TERM").ok();
    if !io::stdout().is_terminal() || !terminal_supported(term.as_deref()) {
        eprintln!("Error: cbreeze needs an interactive terminal");
        return ExitCode::FAILURE;
    }

    let (cols, rows) = crossterm::terminal::size().unwrap_or((80, 24));
    let startup = match resolve(&args, Bounds::new(cols, rows)) {
        Ok(startup) => startup,
        Err(err) => {
            eprintln!("Error: {}", err);
            return ExitCode::FAILURE;
        }
    };
    let engine = match Engine::new(startup.config, startup.tuning, startup.seed) {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("Error: {}", err);
            return ExitCode::FAILURE;
        }
    };
    let mut app = App::new(engine);

    // SIGINT, SIGTERM and SIGHUP end the loop so the guard can restore the terminal
    let shutdown = Arc::new(AtomicBool::new(false));
    let flag = shutdown.clone();
    if let Err(err) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
        warn!("termination handler not installed: {}", err);
    }

    install_panic_hook();
    let result = TerminalGuard::enter()
        .and_then(|mut guard| run_app(&mut guard.terminal, &mut app, &shutdown));

    match result {
        Ok(()) => {
            info!(
                "exited cleanly: {} particles, wind {:.1} {}",
                app.engine.particle_count(),
                app.engine.wind_state().strength,
                app.engine.config().color.name()
            );
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    shutdown: &AtomicBool,
) -> io::Result<()> {
    // Target ~60fps for smooth animation
    const FRAME_DURATION: Duration = Duration::from_millis(16);

    let size = terminal.size()?;
    app.engine.handle_resize(size.width, size.height);

    loop {
        if shutdown.load(Ordering::SeqCst) {
            app.apply(Action::Quit);
        }
        if app.should_quit {
            break;
        }

        if event::poll(FRAME_DURATION)? {
            match event::read()? {
                Event::Key(key) => app.handle_key(key),
                Event::Resize(width, height) => app.engine.handle_resize(width, height),
                _ => {}
            }
        }
        if app.should_quit {
            break;
        }

        app.engine.step(Instant::now());
        app.engine
            .render(&mut TerminalAdapter::new(terminal, app.show_help))?;
    }
    Ok(())
}
