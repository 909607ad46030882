mod app;
mod cli;
mod ui;

use anyhow::{Context, Result, bail};
use app::{AppState, BannerSlot, TerminalNotifier, handle_input};
use clap::Parser;
use cli::Args;
use crossterm::{
    event::{self, DisableFocusChange, EnableFocusChange, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use rtomato::{DesktopNotifier, JsonDirStore, Persistence, SessionController, SystemClock};
use std::{
    fs::{self, OpenOptions},
    io,
    path::Path,
    time::{Duration, Instant},
};

const FRAME_INTERVAL: Duration = Duration::from_millis(250);
const CLOCK_REFRESH: Duration = Duration::from_secs(1);

fn init_logging(data_dir: &Path) {
    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));

    // stderr belongs to the terminal UI
    let file = fs::create_dir_all(data_dir).and_then(|_| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(data_dir.join("rtomato.log"))
    });
    if let Ok(file) = file {
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }

    builder.init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(&args.data_dir);
    log::info!("rtomato starting, data in {}", args.data_dir.display());

    let store = JsonDirStore::new(&args.data_dir);
    let banner = BannerSlot::default();
    let notifier = TerminalNotifier::new(DesktopNotifier::new(!args.no_sound), banner.clone());

    let mut controller = SessionController::restore(SystemClock, Persistence::new(store.clone()), notifier);

    let patch = args.config_patch();
    if !patch.is_empty() {
        if let Err(e) = controller.update_config(&patch) {
            bail!("invalid option: {e}");
        }
    }

    if args.print_stats {
        println!("{}", serde_json::to_string_pretty(&controller.snapshot())?);
        return Ok(());
    }

    let mut app = AppState::new(Persistence::new(store), args.theme.clone(), banner);
    app.attach(&mut controller);

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange).context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run(&mut terminal, &mut app, &mut controller);

    controller.shutdown();
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableFocusChange)?;
    terminal.show_cursor()?;

    log::info!("rtomato exiting");
    res
}

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
    controller: &mut SessionController,
) -> Result<()> {
    let mut last_frame = Instant::now();
    let mut last_draw = Instant::now();

    loop {
        if app.redraw.replace(false) || last_draw.elapsed() >= CLOCK_REFRESH {
            let snapshot = controller.snapshot();
            terminal.draw(|f| ui::render_ui(f, app, &snapshot, controller.config()))?;
            last_draw = Instant::now();
        }

        let until_frame = FRAME_INTERVAL.saturating_sub(last_frame.elapsed());
        let timeout = controller
            .next_wakeup_in()
            .map_or(until_frame, |due| due.min(until_frame));

        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) if key.kind == KeyEventKind::Press => {
                    if handle_input(key, app, controller) {
                        return Ok(());
                    }
                }
                Event::FocusGained => controller.resume(),
                Event::Resize(_, _) => app.redraw.set(true),
                _ => {}
            }
        }

        controller.poll();

        if last_frame.elapsed() >= FRAME_INTERVAL {
            app.update();
            if controller.status() != rtomato::Status::Idle {
                app.redraw.set(true);
            }
            last_frame = Instant::now();
        }
    }
}
