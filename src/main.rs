use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use scanlog::capture::desktop::{ConsoleSurface, FixedLocation, PathPicker};
use scanlog::capture::{DecodeEvent, LocationProvider};
use scanlog::cli::{Cli, Command};
use scanlog::config::Config;
use scanlog::lifecycle::{AppState, LifecycleBus};
use scanlog::recorder::HistoryRecorder;
use scanlog::report;
use scanlog::scanner::ScanTransition;
use scanlog::screen::{GalleryOutcome, SaveOutcome, ScannerScreen};
use scanlog::store;

fn init_logging(verbose: bool) {
    let default = if verbose { "scanlog=debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_writer(std::io::stderr)
        .init();
}

fn build_recorder(config: &Config) -> Result<HistoryRecorder> {
    let store = store::open(config.backend, config.data_dir.as_deref()).context("failed to open history store")?;

    let location: Box<dyn LocationProvider> = if config.location_enabled {
        Box::new(FixedLocation::new(true, config.position))
    } else {
        Box::new(FixedLocation::denied())
    };

    Ok(HistoryRecorder::new(store, location, config.recorder.clone()))
}

struct Session {
    screen: ScannerScreen,
    surface: Arc<ConsoleSurface>,
    picker: Arc<PathPicker>,
}

fn mount(config: &Config, bus: &LifecycleBus) -> Result<Session> {
    let surface = Arc::new(ConsoleSurface::new());
    let picker = Arc::new(PathPicker::new());
    let screen = ScannerScreen::mount(
        build_recorder(config)?,
        Box::new(surface.clone()),
        Box::new(picker.clone()),
        bus,
    );
    Ok(Session { screen, surface, picker })
}

async fn run_scan(session: &Session, bus: &LifecycleBus) -> Result<()> {
    let screen = &session.screen;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    eprintln!("Scanning. Enter payloads, or :save, :again, :resume, :gallery <path>, :quit");

    while let Some(line) = lines.next_line().await.context("failed to read stdin")? {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            continue;
        }

        match line.split_once(' ').unwrap_or((line, "")) {
            (":quit", _) => break,
            (":again", _) => {
                screen.scan_again();
                eprintln!("Scanning.");
            }
            (":resume", _) => {
                bus.publish(AppState::Background);
                bus.publish(AppState::Active);
                eprintln!("Resumed. Scanning.");
            }
            (":save", _) => match screen.confirm_save().await {
                SaveOutcome::Saved(_) | SaveOutcome::Failed(_) => {}
                SaveOutcome::Skipped => eprintln!("Nothing to save."),
            },
            (":gallery", path) => {
                if !path.trim().is_empty() {
                    session.picker.choose(PathBuf::from(path.trim()));
                }
                if screen.import_from_gallery().await == GalleryOutcome::Cancelled {
                    eprintln!("No image selected.");
                }
            }
            _ => {
                if screen.on_decode(&DecodeEvent::parse_line(line)) == ScanTransition::Accepted {
                    if let Some(pending) = screen.pending() {
                        println!("Scanned QR Code: {pending}");
                    }
                }
            }
        }

        if session.surface.back_requested() {
            break;
        }
    }

    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::from_args(&cli.global).context("failed to load configuration")?;
    let bus = LifecycleBus::default();

    match cli.command {
        Command::Scan => {
            let session = mount(&config, &bus)?;
            run_scan(&session, &bus).await?;
            session.screen.unmount();
        }
        Command::Record(args) => {
            let session = mount(&config, &bus)?;
            if session.screen.on_decode(&DecodeEvent::qr(args.payload)) != ScanTransition::Accepted {
                eprintln!("Payload is empty, nothing to record.");
                std::process::exit(1);
            }
            let outcome = session.screen.confirm_save().await;
            session.screen.unmount();
            if let SaveOutcome::Failed(e) = outcome {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Command::History(args) => {
            let recorder = build_recorder(&config)?;
            let log = recorder.history().await.context("failed to read history")?;
            report::print(&log, args.json);
        }
        Command::Import(args) => {
            let session = mount(&config, &bus)?;
            session.picker.choose(args.path);
            let outcome = session.screen.import_from_gallery().await;
            session.screen.unmount();
            match outcome {
                GalleryOutcome::Cancelled => {
                    eprintln!("No image selected.");
                    std::process::exit(1);
                }
                GalleryOutcome::Unsupported => std::process::exit(2),
            }
        }
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}
