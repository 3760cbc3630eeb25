//! The host-facing hook surface.
//!
//! A [`StylePipeline`] owns the shared state of one build (registry, usage
//! tracker, optional theme store) and exposes the four calls a bundler makes:
//!
//! | hook | when |
//! |---|---|
//! | [`transform_file`](StylePipeline::transform_file) | once per source file |
//! | [`on_file_changed`](StylePipeline::on_file_changed) | a watched file was edited |
//! | [`resolve_style_asset`](StylePipeline::resolve_style_asset) | the virtual stylesheet is loaded |
//! | [`finalize_bundle`](StylePipeline::finalize_bundle) | all output artifacts exist |
//!
//! Every method takes `&self`; a host may transform different files from
//! several threads at once.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::Arc;

use crate::config::StyleConfig;
use crate::identity::ClassIdentity;
use crate::prune::{self, BundleArtifact, FinalizedBundle};
use crate::registry::StyleRegistry;
use crate::syntax::{JsxScanner, SourceParser};
use crate::theme::{self, ThemeStore};
use crate::transform::{FileTransform, TransformError, Transformer};
use crate::usage::UsageTracker;

enum ThemeSource {
    Shared(Arc<ThemeStore>),
    Global,
}

impl ThemeSource {
    fn store(&self) -> &ThemeStore {
        match self {
            ThemeSource::Shared(store) => store,
            ThemeSource::Global => theme::global(),
        }
    }
}

/// Build state plus the host hooks.
pub struct StylePipeline {
    config: StyleConfig,
    parser: Box<dyn SourceParser>,
    registry: StyleRegistry,
    usage: UsageTracker,
    theme: Option<ThemeSource>,
}

impl std::fmt::Debug for StylePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StylePipeline")
            .field("config", &self.config)
            .field("registry", &self.registry.len())
            .field("files", &self.usage.len())
            .field("theme", &self.theme.is_some())
            .finish()
    }
}

impl Default for StylePipeline {
    fn default() -> Self {
        Self::new(StyleConfig::default())
    }
}

impl StylePipeline {
    /// Creates a pipeline using the built-in [`JsxScanner`].
    pub fn new(config: StyleConfig) -> Self {
        let scanner = JsxScanner::new(config.attribute.clone())
            .with_styles_factory(config.styles_factory.clone());
        Self::with_parser(config, scanner)
    }

    pub fn with_parser(config: StyleConfig, parser: impl SourceParser + 'static) -> Self {
        Self {
            config,
            parser: Box::new(parser),
            registry: StyleRegistry::new(),
            usage: UsageTracker::new(),
            theme: None,
        }
    }

    /// Emits `store`'s variables as a `:root` block ahead of the rules.
    pub fn with_theme(mut self, store: Arc<ThemeStore>) -> Self {
        self.theme = Some(ThemeSource::Shared(store));
        self
    }

    /// Like [`with_theme`](Self::with_theme), using [`theme::global`].
    pub fn with_global_theme(mut self) -> Self {
        self.theme = Some(ThemeSource::Global);
        self
    }

    pub fn config(&self) -> &StyleConfig {
        &self.config
    }

    pub fn registry(&self) -> &StyleRegistry {
        &self.registry
    }

    pub fn usage(&self) -> &UsageTracker {
        &self.usage
    }

    // =========================================================================
    // Hooks
    // =========================================================================

    /// Transforms one source file and records what it uses.
    ///
    /// Returns `Ok(None)` when the file is not handled or contains nothing to
    /// rewrite. On error nothing is registered and the file's previous usage
    /// is kept.
    pub fn transform_file(
        &self,
        path: &Path,
        source: &str,
    ) -> Result<Option<FileTransform>, TransformError> {
        if !self.config.handles(path) {
            return Ok(None);
        }
        let result = self.run(path, source)?;
        Ok(result.is_changed().then_some(result))
    }

    /// Re-transforms an edited file.
    ///
    /// Returns the ids of the style assets a live session must reload: the
    /// resolved virtual stylesheet when the file's set of classes changed,
    /// nothing otherwise.
    pub fn on_file_changed(&self, path: &Path, source: &str) -> Result<Vec<String>, TransformError> {
        if !self.config.handles(path) {
            return Ok(Vec::new());
        }
        let file_id = file_id(path);
        let before = self.usage.usage_of(&file_id).unwrap_or_default();
        self.run(path, source)?;
        let after = self.usage.usage_of(&file_id).unwrap_or_default();
        Ok(self.invalidated(&file_id, before, after))
    }

    /// Forgets a deleted file. Returns the assets to reload, as
    /// [`on_file_changed`](Self::on_file_changed) does.
    pub fn remove_file(&self, path: &Path) -> Vec<String> {
        let file_id = file_id(path);
        let before = self.usage.remove_file(&file_id).unwrap_or_default();
        self.invalidated(&file_id, before, BTreeSet::new())
    }

    /// Maps the injected import to its resolved id.
    pub fn resolve_id(&self, id: &str) -> Option<String> {
        (id == self.config.virtual_module).then(|| self.config.resolved_virtual_module())
    }

    /// Returns the live stylesheet: the CSS of every class some tracked file
    /// references, in identity order.
    ///
    /// Accepts the virtual module name or its resolved id; any other id
    /// returns `None`.
    pub fn resolve_style_asset(&self, id: &str) -> Option<String> {
        if id != self.config.virtual_module && id != self.config.resolved_virtual_module() {
            return None;
        }
        let live = self.usage.all_live_identities();
        Some(self.with_root_block(self.registry.css_for(&live)))
    }

    /// Prunes every registered rule against the final artifact texts.
    pub fn finalize_bundle<S: AsRef<str>>(&self, artifact_texts: &[S]) -> String {
        let css = prune::prune(&self.registry.snapshot(), artifact_texts);
        self.with_root_block(css)
    }

    /// Prunes against the non-stylesheet artifacts and links the stylesheet
    /// (named by `css_file_name`) into every markup artifact.
    pub fn finalize_artifacts(&self, artifacts: &[BundleArtifact]) -> FinalizedBundle {
        let mut bundle = prune::finalize(
            &self.registry.snapshot(),
            artifacts,
            &self.config.css_file_name,
        );
        bundle.css = self.with_root_block(bundle.css);
        bundle
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn run(&self, path: &Path, source: &str) -> Result<FileTransform, TransformError> {
        let result = Transformer::new(&self.config, self.parser.as_ref()).transform(path, source)?;
        for declaration in &result.declarations {
            self.registry
                .register(declaration.identity, declaration.rule.clone());
        }
        self.usage.recompute(&file_id(path), result.identities());
        Ok(result)
    }

    fn invalidated(
        &self,
        file_id: &str,
        before: BTreeSet<ClassIdentity>,
        after: BTreeSet<ClassIdentity>,
    ) -> Vec<String> {
        if before == after {
            return Vec::new();
        }
        log::debug!(
            "{}: classes changed ({} -> {}), invalidating {}",
            file_id,
            before.len(),
            after.len(),
            self.config.virtual_module
        );
        vec![self.config.resolved_virtual_module()]
    }

    fn with_root_block(&self, css: String) -> String {
        match &self.theme {
            Some(source) => format!("{}\n{}", source.store().root_block(), css),
            None => css,
        }
    }
}

fn file_id(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
