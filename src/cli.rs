use std::path::PathBuf;

use clap::{Parser, Subcommand};
use niri_windows_ipc::Action;

use crate::config::Config;
use crate::render::graphical::MouseButton;
use crate::utils::version;

#[derive(Parser)]
#[command(author, version = version(), about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
#[command(subcommand_value_name = "SUBCOMMAND")]
#[command(subcommand_help_heading = "Subcommands")]
pub struct Cli {
    /// Path to config file (default: `$XDG_CONFIG_HOME/niri-windows/config.json`).
    ///
    /// This can also be set with the `NIRI_WINDOWS_CONFIG` environment variable. If both are set,
    /// the command line argument takes precedence.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Output to show, instead of the output of the focused workspace.
    #[arg(short, long)]
    pub output: Option<String>,
    /// Symbol for an unfocused column.
    #[arg(short, long)]
    pub unfocused: Option<String>,
    /// Symbol for the focused column.
    #[arg(short, long)]
    pub focused: Option<String>,
    /// Symbol for an unfocused floating window.
    #[arg(short = 'U', long)]
    pub unfocused_floating: Option<String>,
    /// Symbol for the focused floating window.
    #[arg(short = 'F', long)]
    pub focused_floating: Option<String>,

    #[command(subcommand)]
    pub subcommand: Option<Sub>,
}

impl Cli {
    /// Overrides the config values that were given on the command line.
    pub fn merge_into(&self, config: &mut Config) {
        let symbols = &mut config.symbols;
        let overrides = [
            (&self.unfocused, &mut symbols.unfocused),
            (&self.focused, &mut symbols.focused),
            (&self.unfocused_floating, &mut symbols.unfocused_floating),
            (&self.focused_floating, &mut symbols.focused_floating),
        ];
        for (flag, symbol) in overrides {
            if let Some(value) = flag {
                symbol.clone_from(value);
            }
        }

        if let Some(output) = &self.output {
            config.output = Some(output.clone());
        }
    }
}

#[derive(Subcommand)]
pub enum Sub {
    /// Communicate with the running niri instance.
    Msg {
        #[command(subcommand)]
        msg: Msg,
    },
    /// Act on a click on a window tile.
    Click {
        /// Id of the clicked window.
        id: u64,
        #[arg(short, long, value_enum, default_value_t = MouseButton::Primary)]
        button: MouseButton,
    },
    /// Validate the config file.
    Validate {
        /// Path to config file (default: `$XDG_CONFIG_HOME/niri-windows/config.json`).
        ///
        /// This can also be set with the `NIRI_WINDOWS_CONFIG` environment variable. If both are
        /// set, the command line argument takes precedence.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum Msg {
    /// Perform an action.
    Action {
        #[command(subcommand)]
        action: Action,
    },
    /// Perform an action that takes no arguments, by its niri name.
    ActionName {
        /// Action name, for example FocusWorkspaceDown.
        name: String,
    },
    /// Print the version of the running niri instance.
    Version,
}
