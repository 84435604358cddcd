use bevy::log::LogPlugin;
use bevy::prelude::*;
use clap::Parser;
use nebula_render::NebulaRenderPlugin;
use nebula_sim::{PendingSurface, SimulationPlugin};
use nebula_sync::{BroadcastChannel, DirChannel, SessionRegistry, SyncError};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// One window of a particle field shared by every window of the session
#[derive(Parser, Debug)]
#[command(name = "nebula", version)]
struct Cli {
    /// Directory shared by all windows of a session
    #[arg(long)]
    session_dir: Option<PathBuf>,

    /// Wipe the saved controls and window records, then exit
    #[arg(long)]
    clear: bool,

    /// Seed for reproducible particle layouts
    #[arg(long)]
    seed: Option<u64>,

    /// Log filter passed to the tracing subscriber
    #[arg(long, default_value = "wgpu=error,naga=warn,nebula=info")]
    log_filter: String,
}

fn channel_dir(session: &Path) -> PathBuf {
    session.join("channel")
}

fn windows_dir(session: &Path) -> PathBuf {
    session.join("windows")
}

fn clear_session(session: &Path) -> Result<usize, SyncError> {
    DirChannel::open(channel_dir(session))?.clear()?;
    SessionRegistry::clear_all(windows_dir(session))
}

/// Open the session backends. Registration waits until the window is placed.
fn prepare_session(session: &Path, seed: Option<u64>) -> Result<PendingSurface, SyncError> {
    let registry = SessionRegistry::open(windows_dir(session))?;
    let channel = DirChannel::open(channel_dir(session))?;
    let metadata = format!("pid={}", std::process::id());
    Ok(PendingSurface::new(
        Box::new(registry),
        Box::new(channel),
        metadata,
        seed,
    ))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let session = cli
        .session_dir
        .unwrap_or_else(|| std::env::temp_dir().join("nebula-session"));

    if cli.clear {
        return match clear_session(&session) {
            Ok(windows) => {
                println!(
                    "Cleared session {} ({windows} window records)",
                    session.display()
                );
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Failed to clear session {}: {e}", session.display());
                ExitCode::FAILURE
            }
        };
    }

    let pending = match prepare_session(&session, cli.seed) {
        Ok(pending) => pending,
        Err(e) => {
            eprintln!("Failed to open session {}: {e}", session.display());
            return ExitCode::FAILURE;
        }
    };

    let exit = App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Nebula".into(),
                        resolution: (800.0, 600.0).into(),
                        ..default()
                    }),
                    ..default()
                })
                .set(LogPlugin {
                    filter: cli.log_filter,
                    ..default()
                }),
        )
        .insert_resource(ClearColor(Color::BLACK))
        .insert_resource(pending)
        .add_plugins(SimulationPlugin)
        .add_plugins(NebulaRenderPlugin)
        .run();

    match exit {
        AppExit::Success => ExitCode::SUCCESS,
        AppExit::Error(_) => ExitCode::FAILURE,
    }
}
