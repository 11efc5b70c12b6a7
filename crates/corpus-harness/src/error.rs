//! Erreurs du harnais.
//!
//! Trois familles :
//! - `CommandError` : échec d'un process enfant (lancement ou code de sortie) ;
//! - `ConfigError`  : lecture / validation de `corpus.toml` ;
//! - `HarnessError` : taxonomie du run (fatal vs. par fixture).

use std::io;

use camino::Utf8PathBuf;
use thiserror::Error;

/// Échec d'une commande externe.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Le process n'a pas pu démarrer (binaire absent, droits…).
    #[error("impossible de lancer `{program}`")]
    Spawn {
        /// Programme demandé.
        program: String,
        /// Erreur OS d'origine.
        #[source]
        source: io::Error,
    },

    /// Le process a démarré mais son statut n'a pas pu être récupéré.
    #[error("attente de `{program}` interrompue")]
    Wait {
        program: String,
        #[source]
        source: io::Error,
    },

    /// Le process s'est terminé avec un statut non nul.
    #[error("`{program}` a échoué ({})", describe_code(.code))]
    Exit {
        /// Programme lancé.
        program: String,
        /// Code de sortie (`None` si tué par un signal).
        code: Option<i32>,
        /// Copie de la sortie standard.
        stdout: String,
        /// Copie de la sortie d'erreur.
        stderr: String,
    },
}

impl CommandError {
    /// Sortie capturée (stdout puis stderr), vide pour un échec de lancement.
    pub fn captured_output(&self) -> String {
        match self {
            Self::Spawn { .. } | Self::Wait { .. } => String::new(),
            Self::Exit { stdout, stderr, .. } => {
                let mut out = String::with_capacity(stdout.len() + stderr.len());
                out.push_str(stdout);
                out.push_str(stderr);
                out
            },
        }
    }

    /// Code de sortie si le process a tourné jusqu'au bout.
    pub const fn exit_code(&self) -> Option<i32> {
        match self {
            Self::Spawn { .. } | Self::Wait { .. } => None,
            Self::Exit { code, .. } => *code,
        }
    }
}

fn describe_code(code: &Option<i32>) -> String {
    match *code {
        Some(c) => format!("code {c}"),
        None => "tué par un signal".to_string(),
    }
}

/// Erreurs de configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("lecture config {path}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("TOML invalide dans {path}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("répertoire courant inutilisable: {0}")]
    Cwd(String),

    #[error("champ `{0}` vide")]
    Empty(&'static str),
}

/// Taxonomie du run.
///
/// Seul `BuildFailed` (et `InvalidPattern`, qui survient avant toute fixture)
/// arrête le harnais ; le reste est rattaché à une fixture puis rapporté.
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Le build du sujet testé a échoué : aucune fixture n'est traitée.
    #[error("échec du build")]
    BuildFailed(#[source] CommandError),

    /// Étape A (compilation vers l'artefact intermédiaire).
    #[error("compilation échouée pour {entry}")]
    CompileFailed {
        entry: String,
        #[source]
        source: CommandError,
    },

    /// Étape B (traitement de l'artefact intermédiaire).
    #[error("traitement échoué pour {entry}")]
    ProcessFailed {
        entry: String,
        #[source]
        source: CommandError,
    },

    /// Suppression de l'artefact ; best-effort, jamais un échec de run.
    #[error("nettoyage de {path} impossible")]
    CleanupFailed {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    /// Pas d'emplacement temporaire pour l'artefact de cette fixture.
    #[error("emplacement scratch indisponible pour {entry}")]
    ScratchUnavailable {
        entry: String,
        #[source]
        source: io::Error,
    },

    #[error("motif de corpus invalide `{0}`")]
    InvalidPattern(String),
}

impl HarnessError {
    /// Erreur de commande sous-jacente, le cas échéant.
    pub const fn command_error(&self) -> Option<&CommandError> {
        match self {
            Self::BuildFailed(e)
            | Self::CompileFailed { source: e, .. }
            | Self::ProcessFailed { source: e, .. } => Some(e),
            _ => None,
        }
    }
}
