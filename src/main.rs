mod render;

use std::io::{self, Stdout};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use clap::Parser;
use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use gesture_pacman::config::LogConfig;
use gesture_pacman::remote::{
    CameraSelector, FeedToggle, GestureServer, ManualPrediction, PredictionSource, VideoFeed,
};
use gesture_pacman::{Config, Direction, Game, Layout, Result, Session, Snapshot, Transition};

use render::{Hud, Renderer};

#[derive(Parser, Debug)]
#[command(name = "gesture-pacman", about = "Pac-Man steered by hand gestures")]
struct Args {
    /// Config file (defaults to ./gesture-pacman.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for the ghosts' random walk
    #[arg(long)]
    seed: Option<u64>,

    /// Steer with h/j/k/l or the arrow keys instead of the recognizer
    #[arg(long)]
    offline: bool,
}

struct App {
    session: Session,
    manual: Arc<ManualPrediction>,
    cameras: Arc<CameraSelector>,
    feed: Arc<FeedToggle>,
    offline: bool,
    frame_time: Duration,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut config = Config::load(args.config.as_deref())?;
    if args.seed.is_some() {
        config.game.seed = args.seed;
    }
    config.game.offline |= args.offline;
    init_logging(&config.log)?;

    let layout = match &config.game.maze_file {
        Some(path) => load_maze(path)?,
        None => Layout::classic()?,
    };
    let rng = match config.game.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let server = Arc::new(GestureServer::new(&config.server)?);
    let manual = Arc::new(ManualPrediction::default());
    let source: Arc<dyn PredictionSource> = if config.game.offline {
        manual.clone()
    } else {
        server.clone()
    };
    let feed = Arc::new(FeedToggle::new(&config.server));
    let session = Session::new(Game::new(layout, rng), source, feed.clone(), &config.timing);
    info!(offline = config.game.offline, server = %config.server.base_url, "gesture-pacman ready");

    let app = App {
        session,
        manual,
        cameras: Arc::new(CameraSelector::new(server)),
        feed,
        offline: config.game.offline,
        frame_time: config.timing.frame_time(),
    };

    let mut stdout = io::stdout();
    terminal::enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(Hide)?;

    let result = run(&mut stdout, &app).await;
    app.session.stop();

    stdout.execute(Show)?;
    stdout.execute(LeaveAlternateScreen)?;
    terminal::disable_raw_mode()?;
    result
}

fn init_logging(log: &LogConfig) -> Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log.file)?;
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn load_maze(path: &Path) -> Result<Layout> {
    let text = std::fs::read_to_string(path)?;
    let rows: Vec<&str> = text.lines().filter(|line| !line.is_empty()).collect();
    Layout::from_ascii(&rows)
}

async fn run(stdout: &mut Stdout, app: &App) -> Result<()> {
    let cells = app.session.with_game(|game| game.maze().len());
    let mut renderer = Renderer::new(cells);
    let (note_tx, mut note_rx) = mpsc::unbounded_channel::<String>();
    let mut camera_note = String::from("camera: default");

    loop {
        while event::poll(Duration::from_millis(0))? {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if !matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                KeyCode::Char('s') | KeyCode::Char(' ') | KeyCode::Enter => {
                    match app.session.toggle() {
                        Transition::Started => info!("toggle: game started"),
                        Transition::Stopped(outcome) => info!(?outcome, "toggle: game stopped"),
                    }
                }
                KeyCode::Char('c') => switch_camera(app, note_tx.clone()),
                code if app.offline => {
                    if let Some(dir) = key_direction(code) {
                        app.manual.set(Some(dir));
                    }
                }
                _ => {}
            }
        }

        while let Ok(note) = note_rx.try_recv() {
            camera_note = note;
        }

        let snap = app.session.snapshot();
        let hud = hud_for(app, &snap, &camera_note);
        renderer.render(stdout, &snap, &hud)?;
        tokio::time::sleep(app.frame_time).await;
    }
}

fn switch_camera(app: &App, notes: mpsc::UnboundedSender<String>) {
    let cameras = app.cameras.clone();
    let feed = app.feed.clone();
    tokio::spawn(async move {
        let note = match cameras.cycle().await {
            Ok(Some(id)) => {
                // a live feed has to be reopened to pick up the new camera
                if feed.is_live() {
                    feed.start();
                }
                format!("camera: {id}")
            }
            Ok(None) => "camera: none available".to_string(),
            Err(e) => {
                warn!(error = %e, "could not switch camera");
                "camera: switch failed".to_string()
            }
        };
        if notes.send(note).is_err() {
            debug!("camera note dropped, front-end already gone");
        }
    });
}

fn key_direction(code: KeyCode) -> Option<Direction> {
    match code {
        KeyCode::Char('k') | KeyCode::Up => Some(Direction::Up),
        KeyCode::Char('j') | KeyCode::Down => Some(Direction::Down),
        KeyCode::Char('h') | KeyCode::Left => Some(Direction::Left),
        KeyCode::Char('l') | KeyCode::Right => Some(Direction::Right),
        _ => None,
    }
}

fn hud_for(app: &App, snap: &Snapshot, camera_note: &str) -> Hud {
    let heading = match snap.direction {
        Some(dir) => dir.as_str(),
        None => "-",
    };
    let hint = match app.session.hint() {
        Some(dir) if snap.turn_pending => format!(" (waiting to turn {dir})"),
        _ => String::new(),
    };
    let top = format!(
        "Score: {}  Heading: {}{}  [s] {}  [c] camera  [q] quit{}",
        snap.score,
        heading,
        hint,
        app.session.label(),
        if app.offline { "  (keys)" } else { "" },
    );
    let bottom = match snap.notice {
        Some(outcome) => outcome.message().to_string(),
        None => format!("video: {}  {}", app.feed.current_url(), camera_note),
    };
    Hud { top, bottom }
}
