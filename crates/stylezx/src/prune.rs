//! Bundle-time dead-rule elimination.
//!
//! After the host has written its final artifacts, every candidate rule is
//! kept only if its class name appears as a substring of some artifact. This
//! can keep a rule whose name shows up by coincidence, but it never drops a
//! rule that is really referenced.
//!
//! All class names are matched in one pass with an Aho-Corasick automaton
//! using overlapping search, which finds exactly the names a per-name
//! substring search would.
//!
//! # Example
//!
//! ```rust
//! use stylezx::prune::link_stylesheet;
//!
//! let html = "<html><HEAD><title>x</title></HEAD><body></body></html>";
//! assert_eq!(
//!     link_stylesheet(html, "/style-zx.css"),
//!     "<html><HEAD><title>x</title><link rel=\"stylesheet\" href=\"/style-zx.css\"></HEAD><body></body></html>"
//! );
//! ```

use std::collections::{BTreeMap, BTreeSet};

use aho_corasick::AhoCorasick;

use crate::compile::CompiledRule;
use crate::identity::ClassIdentity;

/// One output file of the host's final bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleArtifact {
    pub file_name: String,
    pub contents: String,
}

impl BundleArtifact {
    pub fn new(file_name: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            contents: contents.into(),
        }
    }

    /// Stylesheets are not scanned; the unpruned style asset would otherwise
    /// keep every rule alive.
    pub fn is_stylesheet(&self) -> bool {
        self.file_name.to_ascii_lowercase().ends_with(".css")
    }

    pub fn is_markup(&self) -> bool {
        let name = self.file_name.to_ascii_lowercase();
        name.ends_with(".html") || name.ends_with(".htm")
    }
}

/// The pruned stylesheet plus markup artifacts with the stylesheet linked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizedBundle {
    pub css: String,
    pub markup: Vec<BundleArtifact>,
    /// Number of rules kept.
    pub retained: usize,
}

/// Returns the identities whose class name occurs in at least one text.
pub fn reachable<S: AsRef<str>>(
    candidates: &BTreeMap<ClassIdentity, CompiledRule>,
    texts: &[S],
) -> BTreeSet<ClassIdentity> {
    let entries: Vec<(&ClassIdentity, &str)> = candidates
        .iter()
        .map(|(id, rule)| (id, rule.class_name()))
        .filter(|(_, name)| !name.is_empty())
        .collect();
    if entries.is_empty() {
        return BTreeSet::new();
    }

    let mut found = BTreeSet::new();
    match AhoCorasick::new(entries.iter().map(|(_, name)| name)) {
        Ok(automaton) => {
            for text in texts {
                for m in automaton.find_overlapping_iter(text.as_ref()) {
                    found.insert(*entries[m.pattern().as_usize()].0);
                }
                if found.len() == entries.len() {
                    break;
                }
            }
        }
        Err(err) => {
            log::debug!("falling back to substring search: {}", err);
            for (id, name) in &entries {
                if texts.iter().any(|text| text.as_ref().contains(name)) {
                    found.insert(**id);
                }
            }
        }
    }
    found
}

/// Retains only the candidate rules whose class name appears in `texts`.
///
/// Rules are emitted in ascending identity order, each followed by a newline,
/// so identical inputs produce byte-identical output.
pub fn prune<S: AsRef<str>>(
    candidates: &BTreeMap<ClassIdentity, CompiledRule>,
    texts: &[S],
) -> String {
    let keep = reachable(candidates, texts);
    render(candidates, &keep)
}

fn render(
    candidates: &BTreeMap<ClassIdentity, CompiledRule>,
    keep: &BTreeSet<ClassIdentity>,
) -> String {
    let mut css = String::new();
    for (id, rule) in candidates {
        if keep.contains(id) {
            css.push_str(rule.css());
            css.push('\n');
        }
    }
    log::info!("retained {} of {} style rules", keep.len(), candidates.len());
    css
}

/// Prunes against every non-stylesheet artifact and links `href` into every
/// markup artifact.
pub fn finalize(
    candidates: &BTreeMap<ClassIdentity, CompiledRule>,
    artifacts: &[BundleArtifact],
    href: &str,
) -> FinalizedBundle {
    let texts: Vec<&str> = artifacts
        .iter()
        .filter(|a| !a.is_stylesheet())
        .map(|a| a.contents.as_str())
        .collect();
    let keep = reachable(candidates, &texts);
    let css = render(candidates, &keep);
    let markup = artifacts
        .iter()
        .filter(|a| a.is_markup())
        .map(|a| BundleArtifact::new(a.file_name.clone(), link_stylesheet(&a.contents, href)))
        .collect();
    FinalizedBundle {
        css,
        markup,
        retained: keep.len(),
    }
}

/// Inserts a stylesheet link immediately before the first `</head>`.
///
/// The match is case-insensitive. Markup without a head section is returned
/// unchanged.
pub fn link_stylesheet(html: &str, href: &str) -> String {
    let lower = html.to_ascii_lowercase();
    match lower.find("</head>") {
        Some(at) => format!(
            "{}<link rel=\"stylesheet\" href=\"{}\">{}",
            &html[..at],
            href,
            &html[at..]
        ),
        None => html.to_string(),
    }
}
