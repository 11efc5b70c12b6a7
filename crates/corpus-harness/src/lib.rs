//! corpus-harness — harnais de régression sur corpus de fixtures
//!
//! Déroulé d'un run :
//! 1. **build** du sujet testé (`./c3/c3c build` par défaut) ; un échec est fatal ;
//! 2. **découverte** des fixtures via un glob (`./resources/**/*.lua`) ;
//! 3. pour chaque fixture, **compile** vers un artefact intermédiaire
//!    (`luac -o out.luac <fixture>`) puis **process** (`yue out.luac`) ;
//!    l'artefact est supprimé ensuite, succès ou non.
//!
//! Un échec de fixture est rapporté (stderr) puis le run continue ; le code de
//! sortie ne dépend que du build.
//!
//! Points d'extension :
//! - `Runner` : lancement des commandes (`ProcessRunner` par défaut)
//! - `Report` : rendu des évènements (`ConsoleReport` par défaut)

#![deny(unused_must_use)]
#![forbid(unsafe_code)]

pub mod config;
pub mod corpus;
pub mod error;
pub mod harness;
pub mod report;
pub mod runner;
pub mod scratch;

pub use config::{Config, ScratchConfig, ScratchStrategy, CONFIG_FILE};
pub use corpus::{discover, CorpusEntry};
pub use error::{CommandError, ConfigError, HarnessError};
pub use harness::Harness;
pub use report::{error_chain, ConsoleReport, Report, RunOutcome};
pub use runner::{CommandSpec, ProcessRunner, Runner};
pub use scratch::Scratch;

/// Initialise `env_logger` ; `RUST_LOG` garde la main sur `default_level`.
pub fn init_logger(default_level: &str) {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .try_init();
}
