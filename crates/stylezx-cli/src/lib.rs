//! Command-line host for the stylezx compiler.
//!
//! Drives the same hooks a bundler plugin would, over a directory tree:
//!
//! ```text
//! stylezx build src --out dist --theme theme.yaml --html index.html
//! stylezx check src
//! stylezx compile '{"mx": 10, "&:hover": {"opacity": 0.5}}'
//! stylezx theme theme.yaml --override dark.yaml --inline
//! ```

mod commands;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use stylezx::StyleConfig;

pub use commands::{build, check, compile, theme, BuildSummary};

#[derive(Debug, Parser)]
#[command(name = "stylezx")]
#[command(about = "Compile static JSX style objects to CSS at build time")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (.yaml, .yml, or .json)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Transform a source tree and write it with a pruned stylesheet
    Build {
        /// Source directory
        src: PathBuf,

        /// Output directory
        #[arg(short, long)]
        out: PathBuf,

        /// Theme file whose variables are emitted as a :root block
        #[arg(long)]
        theme: Option<PathBuf>,

        /// HTML page to copy into the output with the stylesheet linked
        #[arg(long)]
        html: Option<PathBuf>,
    },

    /// Report unsupported style declarations without writing anything
    Check {
        /// Source directory
        src: PathBuf,
    },

    /// Compile one style object given as JSON
    Compile {
        /// The style object
        json: String,

        /// Class name to compile under instead of the generated one
        #[arg(long = "class")]
        class_name: Option<String>,
    },

    /// Print the CSS variables of a theme file
    Theme {
        /// Theme file (.yaml, .yml, or .json)
        file: PathBuf,

        /// Theme file deep-merged over the first
        #[arg(long = "override")]
        overrides: Option<PathBuf>,

        /// Print an inline style instead of a :root block
        #[arg(long)]
        inline: bool,
    },
}

impl Cli {
    /// The configuration named by `--config`, or the defaults.
    pub fn load_config(&self) -> Result<StyleConfig> {
        match &self.config {
            Some(path) => StyleConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display())),
            None => Ok(StyleConfig::default()),
        }
    }
}

/// Installs the logger. `RUST_LOG` takes precedence over `verbose`.
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .try_init();
}

/// Runs a parsed command line, writing its report to `out`.
///
/// Returns `Ok(false)` when the command completed but found problems (for
/// `check`, any error).
pub fn run(cli: &Cli, out: &mut dyn Write) -> Result<bool> {
    let config = cli.load_config()?;
    match &cli.command {
        Command::Build {
            src,
            out: dest,
            theme: theme_file,
            html,
        } => {
            let summary = build(&config, src, dest, theme_file.as_deref(), html.as_deref())?;
            writeln!(out, "{}", summary)?;
            Ok(true)
        }
        Command::Check { src } => check(&config, src, out),
        Command::Compile { json, class_name } => {
            compile(&config, json, class_name.as_deref(), out)?;
            Ok(true)
        }
        Command::Theme {
            file,
            overrides,
            inline,
        } => {
            theme(&config, file, overrides.as_deref(), *inline, out)?;
            Ok(true)
        }
    }
}
