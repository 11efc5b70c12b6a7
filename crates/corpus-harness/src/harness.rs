//! Orchestration : build unique → découverte → pipeline par fixture.
//!
//! Strictement séquentiel : une fixture à la fois, étape A terminée avant
//! l'étape B. Avec `ScratchStrategy::Fixed`, c'est ce séquencement qui
//! garantit qu'aucun artefact n'en écrase un autre encore utilisé.

use log::{debug, info, warn};

use crate::config::Config;
use crate::corpus::{discover, CorpusEntry};
use crate::error::HarnessError;
use crate::report::{error_chain, Report, RunOutcome};
use crate::runner::Runner;
use crate::scratch::Scratch;

pub struct Harness<R, P> {
    config: Config,
    runner: R,
    report: P,
}

impl<R: Runner, P: Report> Harness<R, P> {
    pub const fn new(config: Config, runner: R, report: P) -> Self {
        Self { config, runner, report }
    }

    /// Run complet. `Err` uniquement sur erreur fatale (build, motif) :
    /// les échecs de fixtures sont rapportés puis oubliés.
    pub fn run(&mut self) -> Result<(), HarnessError> {
        self.build()?;

        let entries = discover(&self.config.root, &self.config.corpus.pattern)?;
        self.report.corpus_discovered(entries.len());

        let mut failed = 0usize;
        for entry in &entries {
            let outcome = self.process_entry(entry);
            if !outcome.is_success() {
                failed += 1;
            }
            self.report.entry_finished(entry, &outcome);
        }
        info!("corpus terminé ({} fixture(s), {failed} en échec)", entries.len());
        Ok(())
    }

    /// Build du sujet testé ; un échec est fatal.
    pub fn build(&mut self) -> Result<(), HarnessError> {
        let cmd = self.config.build_command();
        self.report.build_started(&cmd.to_string());
        self.runner.run(&cmd).map_err(HarnessError::BuildFailed)?;
        self.report.build_succeeded();
        Ok(())
    }

    /// Étapes A puis B pour une fixture. L'artefact est libéré quoi qu'il arrive.
    pub fn process_entry(&mut self, entry: &CorpusEntry) -> RunOutcome {
        let scratch = match Scratch::acquire(&self.config.scratch, &self.config.root, entry) {
            Ok(s) => s,
            Err(e) => return RunOutcome::Failure(e),
        };

        let result = self.run_stages(entry, &scratch);

        if let Err(e) = scratch.release() {
            warn!("{}", error_chain(&e));
        }

        match result {
            Ok(()) => RunOutcome::Success,
            Err(e) => {
                debug!("{entry}: {e:?}");
                RunOutcome::Failure(e)
            },
        }
    }

    fn run_stages(&mut self, entry: &CorpusEntry, scratch: &Scratch) -> Result<(), HarnessError> {
        let compile = self.config.compile_command(entry, scratch.path());
        self.runner
            .run(&compile)
            .map_err(|source| HarnessError::CompileFailed { entry: entry.to_string(), source })?;

        let process = self.config.process_command(scratch.path());
        self.runner
            .run(&process)
            .map_err(|source| HarnessError::ProcessFailed { entry: entry.to_string(), source })
    }
}

// ───────────────────────────── Tests ─────────────────────────────
