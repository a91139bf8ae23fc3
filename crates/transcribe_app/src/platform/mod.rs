mod app;
mod effects;
mod persistence;
mod render;

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use log::LevelFilter;
use tokio::sync::mpsc;
use transcribe_engine::{HttpRemoteService, RemoteSettings};

use crate::cli::{parse_address, Cli, Command};
use app::App;
use effects::EffectRunner;
use persistence::SessionFile;

pub async fn run_app(cli: Cli) -> anyhow::Result<()> {
    let destination = match &cli.log_file {
        Some(path) => engine_logging::LogDestination::Both(path.clone()),
        None => engine_logging::LogDestination::Terminal,
    };
    engine_logging::initialize(destination, level_for(cli.verbose));

    let state_dir = match &cli.state_dir {
        Some(dir) => dir.clone(),
        None => std::env::current_dir().context("resolving the current directory")?,
    };
    let remote = HttpRemoteService::new(RemoteSettings {
        base_url: cli.server.clone(),
        ..RemoteSettings::default()
    })
    .with_context(|| format!("invalid --server {}", cli.server))?;

    let (msg_tx, msg_rx) = mpsc::unbounded_channel();
    let runner = EffectRunner::new(Arc::new(remote), SessionFile::open(&state_dir), msg_tx);
    let mut app = App::new(runner, msg_rx);

    app.boot(cli.address.as_deref().map(parse_address));
    for action in cli.view_actions() {
        app.perform(action);
    }
    let command = cli.command.unwrap_or(Command::Show);
    for action in command.actions(Utc::now()) {
        app.perform(action);
    }
    app.drain().await;
    app.shutdown();

    print!("{}", render::summary(&app.view()));
    Ok(())
}

fn level_for(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}
