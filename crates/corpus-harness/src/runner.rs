//! Lancement de commandes externes.
//!
//! `Runner` est la couture du harnais : `ProcessRunner` lance de vrais process
//! (sorties relayées en direct *et* capturées), les tests branchent un faux.

use std::fmt;
use std::io::{self, Read, Write};
use std::process::{Command, Stdio};
use std::thread;

use camino::Utf8PathBuf;
use log::debug;

use crate::error::CommandError;

// ───────────────────────────── CommandSpec ─────────────────────────────

/// Programme + arguments, sans état d'exécution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: Utf8PathBuf,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<P: Into<Utf8PathBuf>>(program: P) -> Self {
        Self { program: program.into(), args: Vec::new() }
    }

    pub fn arg<S: Into<String>>(mut self, a: S) -> Self {
        self.args.push(a.into());
        self
    }

    pub fn args<I, S>(mut self, it: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for a in it {
            self.args.push(a.into());
        }
        self
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for a in &self.args {
            write!(f, " {a}")?;
        }
        Ok(())
    }
}

// ───────────────────────────── Runner ─────────────────────────────

/// Exécute une commande jusqu'à sa fin. `Ok` uniquement sur statut zéro.
pub trait Runner {
    fn run(&mut self, cmd: &CommandSpec) -> Result<(), CommandError>;
}

impl<R: Runner + ?Sized> Runner for &mut R {
    fn run(&mut self, cmd: &CommandSpec) -> Result<(), CommandError> {
        (**self).run(cmd)
    }
}

/// Runner "réel" : un process enfant par appel, aucune relance.
#[derive(Clone, Debug)]
pub struct ProcessRunner {
    cwd: Option<Utf8PathBuf>,
    echo: bool,
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self { cwd: None, echo: true }
    }
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Répertoire de travail des enfants (sinon celui du harnais).
    pub fn cwd<P: Into<Utf8PathBuf>>(mut self, dir: P) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Affiche `$ cmd args…` sur stderr avant chaque lancement.
    pub const fn echo(mut self, yes: bool) -> Self {
        self.echo = yes;
        self
    }
}

impl Runner for ProcessRunner {
    fn run(&mut self, cmd: &CommandSpec) -> Result<(), CommandError> {
        if self.echo {
            eprintln!("$ {cmd}");
        }
        debug!("spawn `{cmd}` (cwd={:?})", self.cwd);

        let program = cmd.program.to_string();
        let mut c = Command::new(cmd.program.as_std_path());
        c.args(&cmd.args).stdin(Stdio::null()).stdout(Stdio::piped()).stderr(Stdio::piped());
        if let Some(dir) = &self.cwd {
            c.current_dir(dir.as_std_path());
        }

        let mut child =
            c.spawn().map_err(|source| CommandError::Spawn { program: program.clone(), source })?;

        let out = child.stdout.take();
        let err = child.stderr.take();
        let (stdout, stderr) = thread::scope(|s| {
            let h_out = s.spawn(move || tee(out, io::stdout()));
            let h_err = s.spawn(move || tee(err, io::stderr()));
            (h_out.join().unwrap_or_default(), h_err.join().unwrap_or_default())
        });

        let status =
            child.wait().map_err(|source| CommandError::Wait { program: program.clone(), source })?;
        debug!("`{program}` terminé: {status}");

        if status.success() {
            Ok(())
        } else {
            Err(CommandError::Exit {
                program,
                code: status.code(),
                stdout: String::from_utf8_lossy(&stdout).into_owned(),
                stderr: String::from_utf8_lossy(&stderr).into_owned(),
            })
        }
    }
}

/// Relaie `src` vers `dst` au fil de l'eau et garde une copie.
fn tee<R: Read, W: Write>(src: Option<R>, mut dst: W) -> Vec<u8> {
    let Some(mut src) = src else {
        return Vec::new();
    };
    let mut kept = Vec::new();
    let mut buf = [0u8; 8192];
    loop {
        match src.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                // la copie prime : un stdout parent fermé ne doit pas tronquer la capture
                let _ = dst.write_all(&buf[..n]).and_then(|()| dst.flush());
                kept.extend_from_slice(&buf[..n]);
            },
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(_) => break,
        }
    }
    kept
}

// ───────────────────────────── Tests ─────────────────────────────
