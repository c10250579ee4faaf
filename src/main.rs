#[macro_use]
extern crate tracing;

use std::env;
use std::io::{self, Write};

use anyhow::Context;
use clap::Parser;
use niri_windows::cli::{Cli, Sub};
use niri_windows::config::{Config, ConfigPath, Mode};
use niri_windows::ipc::client::{handle_msg, ActionSocket};
use niri_windows::ipc::listener;
use niri_windows::render::graphical::click_action;
use niri_windows::shared::SharedState;
use niri_windows::utils::version;
use serde_json::json;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let directives =
        env::var("RUST_LOG").unwrap_or_else(|_| "niri_windows=debug,info".to_owned());
    let env_filter = EnvFilter::builder().parse_lossy(directives);
    // Stdout belongs to the bar.
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .compact()
        .with_env_filter(env_filter)
        .init();

    let cli = Cli::parse();

    if let Some(subcommand) = cli.subcommand {
        match subcommand {
            Sub::Msg { msg } => handle_msg(msg)?,
            Sub::Click { id, button } => {
                let Some(action) = click_action(button, id) else {
                    debug!("nothing to do for {button:?} click on window {id}");
                    return Ok(());
                };
                ActionSocket::new()?.send(action)?;
            }
            Sub::Validate { config } => {
                let path = ConfigPath::new(config)?;
                path.load()
                    .with_context(|| format!("error loading config from {:?}", path.path()))?;
                info!("config is valid");
            }
        }

        return Ok(());
    }

    info!("starting version {}", &version());

    let path = ConfigPath::new(cli.config.clone())?;
    let mut config = path.load()?;
    cli.merge_into(&mut config);
    if config.mode == Mode::Graphical {
        warn!("graphical mode needs a bar that draws column tiles, printing text instead");
    }

    let reader = listener::connect()?;

    let shared = SharedState::new();
    print_text(&shared, &config);

    shared.on_update("stdout", move |shared| {
        if shared.needs_redraw() {
            print_text(shared, &config);
        }
    });

    listener::listen(&shared, reader)
}

fn print_text(shared: &SharedState, config: &Config) {
    let line = json!({ "text": shared.bar_text(config) });

    let mut stdout = io::stdout().lock();
    if let Err(err) = writeln!(stdout, "{line}").and_then(|()| stdout.flush()) {
        warn!("error writing to stdout: {err}");
    }
}
