//! Découverte du corpus : motif glob → liste ordonnée de fixtures.
//!
//! Syntaxe : `**` (0..n dossiers), `*`, `?` et classes `[a-z]` / `[!x]` à
//! l'intérieur d'un composant (jamais à travers `/`), alternatives `{a,b}`
//! développées avant tout parcours. Comme les globs du monde JS, les noms cachés
//! (`.foo`) ne sont atteints que par un composant qui commence lui-même par `.`.
//!
//! L'ordre est celui d'un parcours trié par nom : stable tant que le disque
//! ne bouge pas. Les liens vers des dossiers sont suivis (boucles ignorées).

use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, warn};
use walkdir::WalkDir;

use crate::error::HarnessError;

/// Une fixture découverte. Immuable.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CorpusEntry {
    path: Utf8PathBuf,
    rel: Utf8PathBuf,
}

impl CorpusEntry {
    /// Chemin utilisable pour lancer les outils (joint à la racine).
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl fmt::Display for CorpusEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.rel)
    }
}

// ───────────────────────────── Motif ─────────────────────────────

/// Motif découpé : préfixe littéral (parcouru) + composants à filtrer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    base: Utf8PathBuf,
    tail: Vec<String>,
}

impl Pattern {
    pub fn parse(raw: &str) -> Result<Self, HarnessError> {
        let norm = raw.trim().replace('\\', "/");
        let absolute = norm.starts_with('/');
        let comps: Vec<&str> = norm.split('/').filter(|c| !c.is_empty() && *c != ".").collect();
        if comps.is_empty() {
            return Err(HarnessError::InvalidPattern(raw.to_string()));
        }

        let mut split = comps.iter().position(|c| has_wildcard(c)).unwrap_or(comps.len());
        // motif 100 % littéral : le dernier composant devient le filtre
        if split == comps.len() {
            split -= 1;
        }

        let mut base = if absolute { Utf8PathBuf::from("/") } else { Utf8PathBuf::new() };
        for c in &comps[..split] {
            base.push(c);
        }
        let tail = comps[split..].iter().map(|c| (*c).to_string()).collect();
        Ok(Self { base, tail })
    }

    fn recursive(&self) -> bool {
        self.tail.iter().any(|c| c == "**")
    }

    /// Vrai si le chemin relatif au préfixe est accepté.
    pub fn matches(&self, rel: &Utf8Path) -> bool {
        let parts: Vec<&str> = rel.components().map(|c| c.as_str()).collect();
        match_components(&self.tail, &parts)
    }
}

fn has_wildcard(c: &str) -> bool {
    c.contains(['*', '?', '['])
}

/// `a{b,c{d,e}}f` → `abf`, `acdf`, `acef`. Une accolade sans virgule (ou non
/// fermée) reste littérale.
fn expand_braces(pat: &str) -> Vec<String> {
    let mut depth = 0usize;
    let mut open = 0usize;
    for (i, b) in pat.bytes().enumerate() {
        match b {
            b'{' => {
                if depth == 0 {
                    open = i;
                }
                depth += 1;
            },
            b'}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    let alts = split_top_level(&pat[open + 1..i]);
                    if alts.len() > 1 {
                        let (head, tail) = (&pat[..open], &pat[i + 1..]);
                        return alts
                            .iter()
                            .flat_map(|a| expand_braces(&format!("{head}{a}{tail}")))
                            .collect();
                    }
                }
            },
            _ => {},
        }
    }
    vec![pat.to_string()]
}

fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, b) in body.bytes().enumerate() {
        match b {
            b'{' => depth += 1,
            b'}' => depth = depth.saturating_sub(1),
            b',' if depth == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            },
            _ => {},
        }
    }
    parts.push(&body[start..]);
    parts
}

fn match_components(pat: &[String], parts: &[&str]) -> bool {
    match pat.split_first() {
        None => parts.is_empty(),
        Some((head, rest)) if head == "**" => {
            // `**` consomme 0..n dossiers, sans entrer dans les dossiers cachés
            let mut i = 0;
            loop {
                if match_components(rest, &parts[i..]) {
                    return true;
                }
                if i == parts.len() || parts[i].starts_with('.') {
                    return false;
                }
                i += 1;
            }
        },
        Some((head, rest)) => parts
            .split_first()
            .is_some_and(|(p, prest)| glob_match(head, p) && match_components(rest, prest)),
    }
}

/// Classe `[...]` déjà découpée.
struct Class<'a> {
    negated: bool,
    body: &'a [char],
}

impl Class<'_> {
    fn contains(&self, c: char) -> bool {
        let b = self.body;
        let mut hit = false;
        let mut i = 0;
        while i < b.len() {
            if i + 2 < b.len() && b[i + 1] == '-' {
                hit |= (b[i]..=b[i + 2]).contains(&c);
                i += 3;
            } else {
                hit |= b[i] == c;
                i += 1;
            }
        }
        hit != self.negated
    }
}

/// Découpe une classe (le `[` est déjà consommé) ; `None` si elle n'est pas fermée.
fn class(p: &[char]) -> Option<(Class<'_>, &[char])> {
    let (negated, start) = match p.first() {
        Some('!' | '^') => (true, 1),
        _ => (false, 0),
    };
    // `]` en tête de classe est littéral
    let close = p.iter().skip(start + 1).position(|c| *c == ']')? + start + 1;
    Some((Class { negated, body: &p[start..close] }, &p[close + 1..]))
}

/// Wildcards `*` / `?` / `[...]` sur un seul composant.
fn glob_match(pat: &str, name: &str) -> bool {
    if name.starts_with('.') && !pat.starts_with('.') {
        return false;
    }
    fn m(p: &[char], n: &[char]) -> bool {
        match p.split_first() {
            None => n.is_empty(),
            Some(('*', _)) => {
                let p2 = {
                    let mut i = 0;
                    while i < p.len() && p[i] == '*' {
                        i += 1;
                    }
                    &p[i..]
                };
                if p2.is_empty() {
                    return true;
                }
                (0..=n.len()).any(|j| m(p2, &n[j..]))
            },
            Some(('?', prest)) => !n.is_empty() && m(prest, &n[1..]),
            Some(('[', prest)) => match class(prest) {
                Some((set, after)) => n
                    .split_first()
                    .is_some_and(|(c, nrest)| set.contains(*c) && m(after, nrest)),
                None => n.first() == Some(&'[') && m(prest, &n[1..]),
            },
            Some((c, prest)) => n.first() == Some(c) && m(prest, &n[1..]),
        }
    }
    let p: Vec<char> = pat.chars().collect();
    let n: Vec<char> = name.chars().collect();
    m(&p, &n)
}

// ───────────────────────────── Découverte ─────────────────────────────

/// Résout `pattern` sous `root`. Zéro correspondance n'est pas une erreur.
pub fn discover(root: &Utf8Path, pattern: &str) -> Result<Vec<CorpusEntry>, HarnessError> {
    let alternatives = expand_braces(pattern);
    let mut out = Vec::new();
    for alt in &alternatives {
        walk(root, &Pattern::parse(alt)?, &mut out);
    }
    if alternatives.len() > 1 {
        // même ordre qu'un parcours unique, sans doublons entre branches
        out.sort_by(|a, b| a.rel.cmp(&b.rel));
        out.dedup_by(|a, b| a.rel == b.rel);
    }
    debug!("corpus: {} fixture(s) pour `{pattern}`", out.len());
    Ok(out)
}

fn walk(root: &Utf8Path, pat: &Pattern, out: &mut Vec<CorpusEntry>) {
    let base = root.join(&pat.base);
    if !base.is_dir() {
        debug!("corpus: {base} absent");
        return;
    }

    let max_depth = if pat.recursive() { usize::MAX } else { pat.tail.len() };
    let walker = WalkDir::new(&base)
        .follow_links(true)
        .min_depth(1)
        .max_depth(max_depth)
        .sort_by_file_name();
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                warn!("corpus: entrée ignorée ({err})");
                continue;
            },
        };
        if !entry.path().is_file() {
            continue;
        }
        let Ok(rel) = entry.path().strip_prefix(base.as_std_path()) else {
            continue;
        };
        let Some(rel) = Utf8Path::from_path(rel) else {
            warn!("corpus: nom non UTF-8 ignoré: {}", entry.path().display());
            continue;
        };
        if pat.matches(rel) {
            out.push(CorpusEntry { path: base.join(rel), rel: pat.base.join(rel) });
        }
    }
}

// ───────────────────────────── Tests ─────────────────────────────
