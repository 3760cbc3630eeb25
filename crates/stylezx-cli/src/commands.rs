use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use console::style;
use stylezx::theme::{derive_scoped, ThemeStore, ThemeValue};
use stylezx::{BundleArtifact, ClassIdentity, StyleCompiler, StyleConfig, StyleLiteral, StylePipeline};
use walkdir::WalkDir;

/// What `build` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    pub files: usize,
    pub transformed: usize,
    pub rules: usize,
    pub retained: usize,
    pub stylesheet: PathBuf,
}

impl fmt::Display for BuildSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} files ({} transformed), kept {} of {} rules in {}",
            style("built").green().bold(),
            self.files,
            self.transformed,
            self.retained,
            self.rules,
            self.stylesheet.display()
        )
    }
}

/// A source file under the walked root.
struct SourceFile {
    path: PathBuf,
    /// Path relative to the root, with `/` separators.
    relative: String,
}

/// Lists the files under `root`, leaving out everything under `skip`.
///
/// Both paths are canonicalized first so that `.` and `..` segments cannot
/// hide an output directory nested in the source tree.
fn walk_sources(root: &Path, skip: Option<&Path>) -> Result<Vec<SourceFile>> {
    if !root.is_dir() {
        bail!("{} is not a directory", root.display());
    }
    let root = root
        .canonicalize()
        .with_context(|| format!("failed to resolve {}", root.display()))?;
    // an output directory that does not exist yet holds nothing to skip
    let skip = skip.and_then(|path| path.canonicalize().ok());
    let mut files = Vec::new();
    let walker = WalkDir::new(&root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            skip.as_deref()
                .map_or(true, |skip| !entry.path().starts_with(skip))
        });
    for entry in walker {
        let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.into_path();
        let relative = path
            .strip_prefix(&root)
            .unwrap_or(&path)
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.push(SourceFile { path, relative });
    }
    Ok(files)
}

/// Reads a file as text, or `None` when it is not UTF-8.
fn read_text(path: &Path) -> Result<Option<String>> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    Ok(String::from_utf8(bytes).ok())
}

fn write_file(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

// =============================================================================
// build
// =============================================================================

/// Transforms every file under `src` into `out` and writes the pruned
/// stylesheet next to them.
///
/// Files the configuration does not handle are copied verbatim. Any
/// transform error aborts the build before the stylesheet is written.
pub fn build(
    config: &StyleConfig,
    src: &Path,
    out: &Path,
    theme_file: Option<&Path>,
    html: Option<&Path>,
) -> Result<BuildSummary> {
    let mut pipeline = StylePipeline::new(config.clone());
    if let Some(path) = theme_file {
        let value = ThemeValue::load(path)
            .with_context(|| format!("failed to load theme {}", path.display()))?;
        pipeline = pipeline.with_theme(Arc::new(ThemeStore::with_theme(
            config.theme_prefix.clone(),
            value,
        )));
    }

    let sources = walk_sources(src, Some(out))?;
    let mut artifacts = Vec::new();
    let mut transformed = 0;
    let mut failures = Vec::new();

    for file in &sources {
        let dest = out.join(&file.relative);
        let text = match read_text(&file.path)? {
            Some(text) => text,
            None => {
                copy_file(&file.path, &dest)?;
                continue;
            }
        };
        let code = match pipeline.transform_file(Path::new(&file.relative), &text) {
            Ok(Some(result)) => {
                transformed += 1;
                result.code
            }
            Ok(None) => text,
            Err(err) => {
                failures.push(err);
                continue;
            }
        };
        artifacts.push(BundleArtifact::new(file.relative.clone(), code));
    }

    if !failures.is_empty() {
        for err in &failures {
            log::error!("{}", err);
        }
        bail!(
            "{} file(s) failed to transform; first: {}",
            failures.len(),
            failures[0]
        );
    }

    if let Some(path) = html {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| format!("{} has no file name", path.display()))?;
        let contents =
            fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        artifacts.retain(|a| a.file_name != name);
        artifacts.push(BundleArtifact::new(name, contents));
    }

    let bundle = pipeline.finalize_artifacts(&artifacts);
    for artifact in &artifacts {
        if !artifact.is_markup() {
            write_file(&out.join(&artifact.file_name), &artifact.contents)?;
        }
    }
    for page in &bundle.markup {
        write_file(&out.join(&page.file_name), &page.contents)?;
    }
    let stylesheet = out.join(&config.css_file_name);
    write_file(&stylesheet, &bundle.css)?;

    let summary = BuildSummary {
        files: sources.len(),
        transformed,
        rules: pipeline.registry().len(),
        retained: bundle.retained,
        stylesheet,
    };
    log::info!("{:?}", summary);
    Ok(summary)
}

fn copy_file(from: &Path, to: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::copy(from, to)
        .with_context(|| format!("failed to copy {} to {}", from.display(), to.display()))?;
    Ok(())
}

// =============================================================================
// check
// =============================================================================

/// Transforms every handled file without writing anything, reporting errors
/// and warnings to `out`. Returns `Ok(false)` if any file failed.
pub fn check(config: &StyleConfig, src: &Path, out: &mut dyn Write) -> Result<bool> {
    let pipeline = StylePipeline::new(config.clone());
    let mut errors = 0;
    let mut warnings = 0;
    let mut checked = 0;

    for file in walk_sources(src, None)? {
        if !config.handles(&file.path) {
            continue;
        }
        let Some(text) = read_text(&file.path)? else {
            continue;
        };
        checked += 1;
        match pipeline.transform_file(Path::new(&file.relative), &text) {
            Ok(Some(result)) => {
                for declaration in &result.declarations {
                    for warning in &declaration.warnings {
                        warnings += 1;
                        writeln!(
                            out,
                            "{}: {}:{}: {}",
                            style("warning").yellow().bold(),
                            file.relative,
                            declaration.location,
                            warning
                        )?;
                    }
                }
            }
            Ok(None) => {}
            Err(err) => {
                errors += 1;
                writeln!(out, "{}: {}", style("error").red().bold(), err)?;
            }
        }
    }

    writeln!(
        out,
        "checked {} files: {} error(s), {} warning(s)",
        checked, errors, warnings
    )?;
    Ok(errors == 0)
}

// =============================================================================
// compile
// =============================================================================

/// Compiles one JSON style object and prints its class name and CSS.
pub fn compile(
    config: &StyleConfig,
    json: &str,
    class_name: Option<&str>,
    out: &mut dyn Write,
) -> Result<()> {
    let literal: StyleLiteral = serde_json::from_str(json).context("invalid style JSON")?;
    let Some(style) = literal.as_object() else {
        bail!("style must be a JSON object");
    };
    let class_name = match class_name {
        Some(name) => name.to_string(),
        None => ClassIdentity::of(&literal).class_name(&config.class_prefix),
    };
    let compiler = StyleCompiler::new(config.theme_prefix.clone());
    let (rule, warnings) = compiler.compile_with_warnings(style, &class_name);
    for warning in &warnings {
        log::warn!("{}", warning);
    }
    writeln!(out, "{}", rule.class_name())?;
    writeln!(out, "{}", rule.css())?;
    Ok(())
}

// =============================================================================
// theme
// =============================================================================

/// Prints the flattened variables of a theme, optionally scoped by an
/// override file.
pub fn theme(
    config: &StyleConfig,
    file: &Path,
    overrides: Option<&Path>,
    inline: bool,
    out: &mut dyn Write,
) -> Result<()> {
    let load = |path: &Path| {
        ThemeValue::load(path).with_context(|| format!("failed to load theme {}", path.display()))
    };
    let base = load(file)?;
    let variables = match overrides {
        Some(path) => derive_scoped(&base, &load(path)?, &config.theme_prefix)
            .variables()
            .clone(),
        None => base.flatten(&config.theme_prefix),
    };
    if inline {
        writeln!(out, "{}", variables.to_inline_style())?;
    } else {
        writeln!(out, "{}", variables.to_root_block())?;
    }
    Ok(())
}
