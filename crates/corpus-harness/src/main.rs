//! `corpus-harness` — binaire
//!
//! Ici on fait uniquement : parsing d'arguments, initialisation (logger,
//! couleur), chargement de la config et délégation à `corpus_harness` (lib).

#![forbid(unsafe_code)]

use std::process::ExitCode;

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::{ArgAction, Parser, ValueEnum};

use corpus_harness as harness;

// ──────────────────────────── CLI (clap) ────────────────────────────

#[derive(Debug, Parser)]
#[command(
    name = "corpus-harness",
    version,
    about = "Build le toolchain puis passe chaque fixture du corpus dans compile → process",
    long_about = None
)]
struct Opt {
    /// Fichier de config (sinon `corpus.toml` cherché en remontant)
    #[arg(short = 'c', long = "config")]
    config: Option<Utf8PathBuf>,

    /// Remplace `corpus.pattern`
    #[arg(long)]
    pattern: Option<String>,

    /// Remplace `scratch.strategy`
    #[arg(long, value_enum)]
    scratch: Option<ScratchChoice>,

    /// Rappelle la fin de la sortie capturée sous chaque échec
    #[arg(long = "show-output")]
    show_output: bool,

    /// Augmente la verbosité (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    /// Mode silencieux (pas d'écho des commandes, erreurs seulement)
    #[arg(short = 'q', long = "quiet", action = ArgAction::SetTrue)]
    quiet: bool,

    /// Force la couleur (si la feature `color` est compilée)
    #[arg(long = "color", value_enum, default_value_t = ColorChoice::Auto)]
    color: ColorChoice,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ColorChoice {
    Auto,
    Always,
    Never,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ScratchChoice {
    Fixed,
    PerEntry,
}

impl From<ScratchChoice> for harness::ScratchStrategy {
    fn from(c: ScratchChoice) -> Self {
        match c {
            ScratchChoice::Fixed => Self::Fixed,
            ScratchChoice::PerEntry => Self::PerEntry,
        }
    }
}

// ──────────────────────────── Logger / Couleur ────────────────────────────

const fn log_level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn init_color(choice: ColorChoice) {
    // `Auto` : owo-colors détecte le TTY et respecte NO_COLOR / FORCE_COLOR
    #[cfg(feature = "color")]
    {
        match choice {
            ColorChoice::Auto => {},
            ColorChoice::Always => owo_colors::set_override(true),
            ColorChoice::Never => owo_colors::set_override(false),
        }
    }
    #[cfg(not(feature = "color"))]
    {
        let _ = choice;
    }
}

// ──────────────────────────── main ────────────────────────────

fn main() -> ExitCode {
    if let Err(e) = real_main() {
        eprintln!("error: {:#}", e);
        return ExitCode::from(1);
    }
    ExitCode::from(0)
}

fn real_main() -> Result<()> {
    let opt = Opt::parse();

    init_color(opt.color);
    harness::init_logger(log_level(opt.verbose, opt.quiet));

    let mut config =
        harness::Config::load(opt.config.as_deref()).context("chargement de la configuration")?;
    if let Some(p) = opt.pattern {
        config.corpus.pattern = p;
    }
    if let Some(s) = opt.scratch {
        config.scratch.strategy = s.into();
    }
    config.validate().context("configuration invalide")?;
    log::debug!("{config:#?}");

    let runner = harness::ProcessRunner::new().cwd(config.root.clone()).echo(!opt.quiet);
    let report = harness::ConsoleReport::new(opt.show_output);

    harness::Harness::new(config, runner, report).run()?;
    Ok(())
}
