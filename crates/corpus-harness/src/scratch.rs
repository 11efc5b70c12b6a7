//! Emplacement de l'artefact intermédiaire (sortie de l'étape A).
//!
//! `Scratch` est un garde : l'artefact disparaît à `release()` ou, à défaut,
//! au `Drop`. Une absence de fichier n'est jamais une erreur.

use std::{fs, io};

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, warn};
use tempfile::TempDir;

use crate::config::{ScratchConfig, ScratchStrategy};
use crate::corpus::CorpusEntry;
use crate::error::HarnessError;

/// Nom de repli si `scratch.path` n'a pas de composant fichier.
const FALLBACK_NAME: &str = "out.artifact";

#[derive(Debug)]
pub struct Scratch {
    path: Utf8PathBuf,
    dir: Option<TempDir>,
    released: bool,
}

impl Scratch {
    /// Réserve l'emplacement de l'artefact de `entry`.
    ///
    /// - `Fixed` : `root/path`, partagé (et écrasé) d'une fixture à l'autre ;
    /// - `PerEntry` : fichier du même nom dans un dossier temporaire neuf.
    pub fn acquire(
        cfg: &ScratchConfig,
        root: &Utf8Path,
        entry: &CorpusEntry,
    ) -> Result<Self, HarnessError> {
        match cfg.strategy {
            ScratchStrategy::Fixed => {
                Ok(Self { path: root.join(&cfg.path), dir: None, released: false })
            },
            ScratchStrategy::PerEntry => {
                let unavailable =
                    |source: io::Error| HarnessError::ScratchUnavailable { entry: entry.to_string(), source };
                let dir = tempfile::Builder::new()
                    .prefix("corpus-harness-")
                    .tempdir()
                    .map_err(unavailable)?;
                let name = cfg.path.file_name().unwrap_or(FALLBACK_NAME);
                let path = Utf8PathBuf::from_path_buf(dir.path().join(name))
                    .map_err(|_| unavailable(io::Error::other("dossier temporaire non UTF-8")))?;
                debug!("scratch {path} pour {entry}");
                Ok(Self { path, dir: Some(dir), released: false })
            },
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Supprime l'artefact (et le dossier temporaire éventuel).
    pub fn release(mut self) -> Result<(), HarnessError> {
        self.released = true;
        self.cleanup()
    }

    fn cleanup(&mut self) -> Result<(), HarnessError> {
        remove_artifact(&self.path)?;
        if let Some(dir) = self.dir.take() {
            let path = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).unwrap_or_default();
            dir.close().map_err(|source| HarnessError::CleanupFailed { path, source })?;
        }
        Ok(())
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = self.cleanup() {
            warn!("{}", crate::report::error_chain(&e));
        }
    }
}

/// `rm -f` : absent = déjà propre.
pub fn remove_artifact(path: &Utf8Path) -> Result<(), HarnessError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(HarnessError::CleanupFailed { path: path.to_path_buf(), source }),
    }
}
