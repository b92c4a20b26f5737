#![forbid(unsafe_code)]

//! `sphere-debug`: offline inspection of a project's debugging metadata.
//!
//! Resolves and unresolves script paths, reads and writes persisted
//! breakpoints, and queries line maps. It never attaches to a debuggee.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use sphere_debug::paths::{LineMapper, PathResolver};
use sphere_debug::persistence::{BreakpointStore, TomlSettingsStore};
use sphere_debug::{AppError, DebuggerConfig, Result};

#[derive(Debug, Copy, Clone, Eq, PartialEq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "sphere-debug", about = "Sphere debugger project tools", version, long_about = None)]
struct Cli {
    /// Path to the debugger TOML configuration file.
    #[arg(long, default_value = "debugger.toml")]
    config: PathBuf,

    /// Log output format (text or json).
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Map a virtual script path (`~/`, `~sgm/`, `~sys/`, `~usr/`) to a real path.
    Resolve {
        /// Virtual path as reported by the engine.
        path: String,
    },
    /// Map a real path to the virtual path the engine expects.
    Unresolve {
        /// Real file-system path.
        path: PathBuf,
    },
    /// Print the persisted breakpoint lines of a script as JSON.
    Breakpoints {
        /// Script path the breakpoints were saved under.
        script: String,
    },
    /// Replace the persisted breakpoint lines of a script.
    SetBreakpoints {
        /// Script path to save the breakpoints under.
        script: String,
        /// Line numbers; none clears the list.
        lines: Vec<u32>,
    },
    /// Map a line through the script's configured line map.
    MapLine {
        /// Virtual script path with a `[line_maps]` entry.
        script: String,
        /// 1-based line number.
        line: u32,
        /// Map from the original source into the generated script instead.
        #[arg(long)]
        to_target: bool,
    },
}

fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.log_format)?;

    let config = DebuggerConfig::load_from_path(&args.config)?;
    info!(project_root = %config.project_root.display(), "configuration loaded");

    run(&config, args.command)
}

fn run(config: &DebuggerConfig, command: Command) -> Result<()> {
    match command {
        Command::Resolve { path } => {
            let resolver = PathResolver::from_config(config);
            println!("{}", resolver.resolve(&path).display());
        }
        Command::Unresolve { path } => {
            let resolver = PathResolver::from_config(config);
            println!("{}", resolver.unresolve(&path));
        }
        Command::Breakpoints { script } => {
            let mut store = BreakpointStore::new(TomlSettingsStore::open(config.settings_path())?);
            let lines = store.breakpoints(&script);
            let report = serde_json::json!({ "script": script, "lines": lines });
            let rendered = serde_json::to_string_pretty(&report)
                .map_err(|err| AppError::Io(format!("cannot render breakpoints: {err}")))?;
            println!("{rendered}");
        }
        Command::SetBreakpoints { script, lines } => {
            let mut store = BreakpointStore::new(TomlSettingsStore::open(config.settings_path())?);
            store.set_breakpoints(&script, &lines);
            store.save()?;
            info!(%script, count = store.breakpoints(&script).len(), "breakpoints saved");
        }
        Command::MapLine {
            script,
            line,
            to_target,
        } => {
            let mapper = LineMapper::from_config(config);
            if !mapper.contains(&script) {
                debug!(%script, "no line map configured; line passes through");
            }
            let mapped = if to_target {
                mapper.line_in_target(&script, line)
            } else {
                mapper.line_in_source(&script, line)
            };
            println!("{mapped}");
        }
    }
    Ok(())
}

fn init_tracing(log_format: LogFormat) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);

    match log_format {
        LogFormat::Text => subscriber
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
        LogFormat::Json => subscriber
            .json()
            .try_init()
            .map_err(|err| AppError::Config(format!("failed to init tracing: {err}")))?,
    }

    Ok(())
}
