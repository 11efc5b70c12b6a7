//! Rapport immédiat des résultats (rien n'est agrégé ni persisté).

use std::error::Error as StdError;

#[cfg(feature = "color")]
use owo_colors::{OwoColorize, Stream, Style};

use crate::corpus::CorpusEntry;
use crate::error::HarnessError;

/// Résultat d'une fixture.
#[derive(Debug)]
pub enum RunOutcome {
    Success,
    Failure(HarnessError),
}

impl RunOutcome {
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }
}

/// Évènements du run, dans l'ordre où ils arrivent.
pub trait Report {
    fn build_started(&mut self, command: &str) {
        let _ = command;
    }
    fn build_succeeded(&mut self) {}
    fn corpus_discovered(&mut self, count: usize) {
        let _ = count;
    }
    fn entry_finished(&mut self, entry: &CorpusEntry, outcome: &RunOutcome);
}

impl<P: Report + ?Sized> Report for &mut P {
    fn build_started(&mut self, command: &str) {
        (**self).build_started(command);
    }
    fn build_succeeded(&mut self) {
        (**self).build_succeeded();
    }
    fn corpus_discovered(&mut self, count: usize) {
        (**self).corpus_discovered(count);
    }
    fn entry_finished(&mut self, entry: &CorpusEntry, outcome: &RunOutcome) {
        (**self).entry_finished(entry, outcome);
    }
}

// ───────────────────────────── Console ─────────────────────────────

/// Nombre de lignes de sortie capturée rappelées sous un `FAIL`.
const OUTPUT_TAIL_LINES: usize = 20;

/// Lignes de statut sur stderr (les sorties des outils passent déjà en direct).
#[derive(Debug, Default)]
pub struct ConsoleReport {
    /// Rappelle la fin de la sortie capturée sous chaque échec.
    pub show_output: bool,
}

impl ConsoleReport {
    pub const fn new(show_output: bool) -> Self {
        Self { show_output }
    }
}

impl Report for ConsoleReport {
    fn build_started(&mut self, command: &str) {
        status(Tone::Info, "BUILD", command);
    }

    fn build_succeeded(&mut self) {
        status(Tone::Ok, "BUILD", "ok");
    }

    fn corpus_discovered(&mut self, count: usize) {
        log::info!("{count} fixture(s) à traiter");
    }

    fn entry_finished(&mut self, entry: &CorpusEntry, outcome: &RunOutcome) {
        match outcome {
            RunOutcome::Success => status(Tone::Ok, "PASS", &entry.to_string()),
            RunOutcome::Failure(err) => {
                status(Tone::Err, "FAIL", &format!("{entry}: {}", error_chain(err)));
                if self.show_output {
                    if let Some(cmd) = err.command_error() {
                        let captured = cmd.captured_output();
                        for line in tail(&captured, OUTPUT_TAIL_LINES) {
                            eprintln!("    | {line}");
                        }
                    }
                }
            },
        }
    }
}

/// `cause: cause: cause` sur une ligne.
pub fn error_chain(err: &dyn StdError) -> String {
    let mut out = err.to_string();
    let mut cur = err.source();
    while let Some(e) = cur {
        out.push_str(": ");
        out.push_str(&e.to_string());
        cur = e.source();
    }
    out
}

fn tail(text: &str, n: usize) -> Vec<&str> {
    let lines: Vec<&str> = text.lines().collect();
    let skip = lines.len().saturating_sub(n);
    lines[skip..].to_vec()
}

// ───────────────────────────── Sorties jolies ─────────────────────────────

#[derive(Clone, Copy)]
enum Tone {
    Ok,
    Info,
    Err,
}

fn status(tone: Tone, tag: &str, msg: &str) {
    #[cfg(feature = "color")]
    {
        let style = match tone {
            Tone::Ok => Style::new().green().bold(),
            Tone::Info => Style::new().blue().bold(),
            Tone::Err => Style::new().red().bold(),
        };
        eprintln!("{} {}", tag.if_supports_color(Stream::Stderr, |t| t.style(style)), msg);
    }
    #[cfg(not(feature = "color"))]
    {
        let _ = tone;
        eprintln!("{} {}", tag, msg);
    }
}
