//! Configuration du harnais (`corpus.toml`).
//!
//! Tous les champs ont une valeur par défaut : un fichier vide (ou absent)
//! reproduit le run historique `c3c build` → `luac` → `yue`.
//!
//! ```toml
//! [build]
//! program = "./c3/c3c"
//! args = ["build"]
//!
//! [corpus]
//! pattern = "./resources/**/*.lua"
//!
//! [compile]
//! program = "./bin/luac"
//!
//! [process]
//! program = "./build/yue"
//!
//! [scratch]
//! strategy = "fixed"   # ou "per-entry"
//! path = "out.luac"
//! ```

use std::fs;

use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use serde::Deserialize;

use crate::corpus::CorpusEntry;
use crate::error::ConfigError;
use crate::runner::CommandSpec;

/// Nom du fichier cherché en remontant depuis le répertoire courant.
pub const CONFIG_FILE: &str = "corpus.toml";

// ───────────────────────────── Sections ─────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ToolConfig {
    #[serde(default = "d_build_program")]
    pub program: Utf8PathBuf,
    #[serde(default = "d_build_args")]
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorpusConfig {
    #[serde(default = "d_pattern")]
    pub pattern: String,
}

/// Outil d'une étape du pipeline ; ses arguments sont imposés par l'étape.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StageConfig {
    pub program: Utf8PathBuf,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScratchStrategy {
    /// Un seul artefact, même chemin pour toutes les fixtures.
    #[default]
    Fixed,
    /// Un dossier temporaire par fixture.
    PerEntry,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScratchConfig {
    #[serde(default)]
    pub strategy: ScratchStrategy,
    #[serde(default = "d_scratch_path")]
    pub path: Utf8PathBuf,
}

fn d_pattern() -> String { "./resources/**/*.lua".into() }
fn d_scratch_path() -> Utf8PathBuf { "out.luac".into() }
fn d_build_program() -> Utf8PathBuf { "./c3/c3c".into() }
fn d_build_args() -> Vec<String> { vec!["build".into()] }
fn d_build() -> ToolConfig { ToolConfig { program: d_build_program(), args: d_build_args() } }
fn d_corpus() -> CorpusConfig { CorpusConfig { pattern: d_pattern() } }
fn d_compile() -> StageConfig { StageConfig { program: "./bin/luac".into() } }
fn d_process() -> StageConfig { StageConfig { program: "./build/yue".into() } }
fn d_scratch() -> ScratchConfig { ScratchConfig { strategy: ScratchStrategy::Fixed, path: d_scratch_path() } }

/// Contenu brut du fichier.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default = "d_build")]
    build: ToolConfig,
    #[serde(default = "d_corpus")]
    corpus: CorpusConfig,
    #[serde(default = "d_compile")]
    compile: StageConfig,
    #[serde(default = "d_process")]
    process: StageConfig,
    #[serde(default = "d_scratch")]
    scratch: ScratchConfig,
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            build: d_build(),
            corpus: d_corpus(),
            compile: d_compile(),
            process: d_process(),
            scratch: d_scratch(),
        }
    }
}

// ───────────────────────────── Config ─────────────────────────────

/// Configuration explicite passée au harnais (pas d'état global).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Base de résolution de tous les chemins relatifs.
    pub root: Utf8PathBuf,
    pub build: ToolConfig,
    pub corpus: CorpusConfig,
    pub compile: StageConfig,
    pub process: StageConfig,
    pub scratch: ScratchConfig,
}

impl Config {
    /// Valeurs historiques, ancrées sur `root`.
    pub fn with_root<P: Into<Utf8PathBuf>>(root: P) -> Self {
        Self::from_file(root.into(), ConfigFile::default())
    }

    fn from_file(root: Utf8PathBuf, f: ConfigFile) -> Self {
        Self {
            root,
            build: f.build,
            corpus: f.corpus,
            compile: f.compile,
            process: f.process,
            scratch: f.scratch,
        }
    }

    /// Parse un TOML ; `root` sert de base aux chemins relatifs.
    pub fn from_toml(root: &Utf8Path, text: &str, origin: &Utf8Path) -> Result<Self, ConfigError> {
        let f: ConfigFile = toml::from_str(text)
            .map_err(|source| ConfigError::Parse { path: origin.to_path_buf(), source })?;
        Ok(Self::from_file(root.to_path_buf(), f))
    }

    /// Charge la config : fichier explicite, sinon recherche ascendante de
    /// `corpus.toml`, sinon valeurs par défaut sur le répertoire courant.
    pub fn load(explicit: Option<&Utf8Path>) -> Result<Self, ConfigError> {
        let cwd = current_dir()?;
        if let Some(p) = explicit {
            let p = cwd.join(p);
            return Self::read(&p);
        }
        let mut cur = cwd.clone();
        loop {
            let cand = cur.join(CONFIG_FILE);
            if cand.is_file() {
                return Self::read(&cand);
            }
            if !cur.pop() {
                break;
            }
        }
        debug!("aucun {CONFIG_FILE} trouvé, valeurs par défaut sur {cwd}");
        Ok(Self::with_root(cwd))
    }

    fn read(path: &Utf8Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        let root = path.parent().map_or_else(Utf8PathBuf::new, Utf8Path::to_path_buf);
        debug!("config {path} (racine {root})");
        Self::from_toml(&root, &text, path)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.build.program.as_str().is_empty() {
            return Err(ConfigError::Empty("build.program"));
        }
        if self.compile.program.as_str().is_empty() {
            return Err(ConfigError::Empty("compile.program"));
        }
        if self.process.program.as_str().is_empty() {
            return Err(ConfigError::Empty("process.program"));
        }
        if self.corpus.pattern.trim().is_empty() {
            return Err(ConfigError::Empty("corpus.pattern"));
        }
        if self.scratch.path.as_str().is_empty() {
            return Err(ConfigError::Empty("scratch.path"));
        }
        Ok(())
    }

    // ── commandes ──

    /// `<build.program> <build.args…>`
    pub fn build_command(&self) -> CommandSpec {
        CommandSpec::new(self.resolve_program(&self.build.program))
            .args(self.build.args.iter().cloned())
    }

    /// Étape A : `<compile.program> -o <artifact> <entry>`
    pub fn compile_command(&self, entry: &CorpusEntry, artifact: &Utf8Path) -> CommandSpec {
        CommandSpec::new(self.resolve_program(&self.compile.program))
            .arg("-o")
            .arg(artifact.as_str())
            .arg(entry.path().as_str())
    }

    /// Étape B : `<process.program> <artifact>`
    pub fn process_command(&self, artifact: &Utf8Path) -> CommandSpec {
        CommandSpec::new(self.resolve_program(&self.process.program)).arg(artifact.as_str())
    }

    /// Un chemin (`./bin/luac`) est ancré sur la racine ; un nom nu (`sh`)
    /// est laissé au `PATH`.
    pub fn resolve_program(&self, program: &Utf8Path) -> Utf8PathBuf {
        if program.is_absolute() || program.components().count() == 1 {
            program.to_path_buf()
        } else {
            self.root.join(program.strip_prefix(".").unwrap_or(program))
        }
    }
}

fn current_dir() -> Result<Utf8PathBuf, ConfigError> {
    let cwd = std::env::current_dir().map_err(|e| ConfigError::Cwd(e.to_string()))?;
    Utf8PathBuf::from_path_buf(cwd)
        .map_err(|p| ConfigError::Cwd(format!("chemin non UTF-8: {}", p.display())))
}

// ───────────────────────────── Tests ─────────────────────────────
