//! `courtwatch`: watch public tennis court availability and ring when a slot
//! matching your filters opens up.
//!
//! # Usage
//!
//! ```
//! courtwatch                                # interactive TUI
//! courtwatch --config ~/.config/courtwatch.toml
//! courtwatch --headless --notify --district "Wan Chai" --time 19:00
//! ```

mod app;
mod driver;
mod notifier;
mod settings;
mod ui;

use std::{
  fs::File,
  io,
  path::PathBuf,
  sync::{Arc, Mutex},
  time::Duration,
};

use anyhow::{Context, Result};
use app::{Action, App};
use clap::Parser;
use courtwatch_core::{
  cache::CacheStore,
  monitor::AvailabilityMonitor,
  notify::Permission,
  session::SessionContext,
};
use courtwatch_smartplay::{SmartPlaySource, SourceConfig};
use crossterm::{
  event::{self, Event, KeyEventKind},
  execute,
  terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use driver::{Command, Driver, Outcome, Update};
use notifier::TerminalNotifier;
use ratatui::{Terminal, backend::CrosstermBackend};
use settings::Settings;
use tokio::sync::mpsc;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "courtwatch", version, about = "Tennis court availability monitor")]
struct Args {
  /// Path to a TOML config file.
  #[arg(short, long, value_name = "FILE", default_value = "courtwatch.toml")]
  config: PathBuf,

  /// Availability feed URL.
  #[arg(long, env = "COURTWATCH_URL")]
  url: Option<String>,

  /// Seconds between checks while monitoring.
  #[arg(long, value_name = "SECS")]
  interval: Option<u64>,

  /// Seconds a fetched dataset is reused before refetching.
  #[arg(long, value_name = "SECS")]
  ttl: Option<u64>,

  /// Log to stderr and monitor without the TUI.
  #[arg(long)]
  headless: bool,

  /// Allow alerts from the start.
  #[arg(long)]
  notify: bool,

  #[arg(long, value_name = "NAME")]
  district: Vec<String>,

  #[arg(long, value_name = "NAME")]
  venue: Vec<String>,

  /// `YYYY-MM-DD`
  #[arg(long, value_name = "DATE")]
  date: Vec<String>,

  /// `HH:MM`
  #[arg(long, value_name = "TIME")]
  time: Vec<String>,
}

impl Args {
  /// Flags override the file and environment.
  fn apply(self, settings: &mut Settings) {
    if let Some(url) = self.url {
      settings.source_url = url;
    }
    if let Some(secs) = self.interval {
      settings.poll_interval_secs = secs;
    }
    if let Some(secs) = self.ttl {
      settings.cache_ttl_secs = secs;
    }
    settings.notifications |= self.notify;
    for (flag, level) in [
      (self.district, &mut settings.district),
      (self.venue, &mut settings.venue),
      (self.date, &mut settings.date),
      (self.time, &mut settings.time),
    ] {
      if !flag.is_empty() {
        *level = flag;
      }
    }
  }
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
  let args = Args::parse();
  let headless = args.headless;

  let mut settings = Settings::load(&args.config)?;
  args.apply(&mut settings);

  init_tracing(headless, &settings)?;

  let source = SmartPlaySource::new(SourceConfig {
    url:     settings.source_url.clone(),
    timeout: settings.request_timeout(),
  })
  .context("building HTTP client")?;
  tracing::info!(url = source.url(), "using availability feed");

  let cache = CacheStore::new(source, settings.cache_ttl());
  let monitor = AvailabilityMonitor::new(cache, Arc::new(TerminalNotifier::stderr(headless)));

  let mut ctx = SessionContext::new(settings.initial_selection());
  if settings.notifications {
    ctx.permission = Permission::Granted;
  }
  let permission = ctx.permission;
  let selection = ctx.selection.clone();

  let (cmd_tx, cmd_rx) = mpsc::channel(32);
  let (upd_tx, upd_rx) = mpsc::channel(32);
  let task = tokio::spawn(driver::run(
    Driver::new(monitor, ctx),
    settings.poll_interval(),
    cmd_rx,
    upd_tx,
  ));

  let result = if headless {
    run_headless(cmd_tx, upd_rx).await
  } else {
    let mut app = App::new(selection, permission);
    run_tui(&mut app, cmd_tx, upd_rx).await
  };

  task.await.context("monitor task panicked")?;
  result
}

/// Headless mode logs to stderr. The TUI owns the terminal, so it logs only
/// when `log_file` is configured.
fn init_tracing(headless: bool, settings: &Settings) -> Result<()> {
  let filter = EnvFilter::builder()
    .with_default_directive(LevelFilter::INFO.into())
    .from_env_lossy();

  if headless {
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).init();
  } else if let Some(path) = &settings.log_file {
    let file = File::options()
      .create(true)
      .append(true)
      .open(path)
      .with_context(|| format!("opening log file {}", path.display()))?;
    tracing_subscriber::fmt()
      .with_env_filter(filter)
      .with_ansi(false)
      .with_writer(Mutex::new(file))
      .init();
  }
  Ok(())
}

// ─── Headless ─────────────────────────────────────────────────────────────────

async fn run_headless(
  commands: mpsc::Sender<Command>,
  mut updates: mpsc::Receiver<Update>,
) -> Result<()> {
  commands.send(Command::SetMonitoring(true)).await.context("monitor task stopped")?;

  loop {
    tokio::select! {
      update = updates.recv() => match update {
        Some(update) => log_update(&update),
        None => break,
      },
      signal = tokio::signal::ctrl_c() => {
        signal.context("listening for ctrl-c")?;
        tracing::info!("shutting down");
        commands.send(Command::Shutdown).await.ok();
        break;
      }
    }
  }
  Ok(())
}

fn log_update(update: &Update) {
  match &update.outcome {
    Outcome::Evaluated(report) => {
      tracing::info!(
        matches = report.funnel.filtered.len(),
        data = ?report.data,
        active = report.active,
        "checked availability"
      );
      if let Some(alert) = &report.alert {
        tracing::info!(venue = %alert.venue, delivered = report.delivered, "{}", alert.body);
      }
    }
    Outcome::Failed { error, fallback, .. } => {
      tracing::warn!(%error, stale = fallback.is_some(), "check failed");
    }
  }
}

// ─── TUI ──────────────────────────────────────────────────────────────────────

async fn run_tui(
  app: &mut App,
  commands: mpsc::Sender<Command>,
  updates: mpsc::Receiver<Update>,
) -> Result<()> {
  enable_raw_mode().context("enabling raw mode")?;
  let mut stdout = io::stdout();
  execute!(stdout, EnterAlternateScreen).context("entering alternate screen")?;
  let backend = CrosstermBackend::new(stdout);
  let mut terminal = Terminal::new(backend).context("creating terminal")?;

  let result = run_event_loop(&mut terminal, app, &commands, updates).await;

  // Restore terminal regardless of result.
  disable_raw_mode().ok();
  execute!(terminal.backend_mut(), LeaveAlternateScreen).ok();
  terminal.show_cursor().ok();

  commands.send(Command::Shutdown).await.ok();
  result
}

async fn run_event_loop(
  terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
  app: &mut App,
  commands: &mpsc::Sender<Command>,
  mut updates: mpsc::Receiver<Update>,
) -> Result<()> {
  loop {
    while let Ok(update) = updates.try_recv() {
      app.apply_update(update);
    }

    terminal.draw(|f| ui::draw(f, app)).context("drawing frame")?;

    // Poll for an event, yielding control to tokio while waiting.
    let maybe_event = tokio::task::block_in_place(|| {
      if event::poll(Duration::from_millis(50))? {
        Ok::<_, io::Error>(Some(event::read()?))
      } else {
        Ok(None)
      }
    })?;

    let Some(Event::Key(key)) = maybe_event else {
      continue;
    };
    if key.kind != KeyEventKind::Press {
      continue;
    }

    match app.handle_key(key) {
      Action::None => {}
      Action::Send(command) => {
        if commands.send(command).await.is_err() {
          anyhow::bail!("monitor task stopped unexpectedly");
        }
      }
      Action::Quit => break,
    }
  }

  Ok(())
}
