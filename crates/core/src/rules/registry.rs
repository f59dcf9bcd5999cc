use std::path::{Path, PathBuf};

use crate::compiler::{compile_file, CompileError, CompileResult};
use crate::message::RenderOptions;
use crate::rules::{KernelRules, MagicDatabase, Rule, RuleGroup};

/// Something that supplies compiled rules to the database.
pub trait RuleContributor: Send + Sync {
    /// Human-readable name, reported in detections and errors.
    fn name(&self) -> &str;
    fn rules(&self) -> CompileResult<Vec<Rule>>;
}

/// Precompiled rules can be registered directly.
impl RuleContributor for RuleGroup {
    fn name(&self) -> &str {
        &self.name
    }

    fn rules(&self) -> CompileResult<Vec<Rule>> {
        Ok(self.rules.clone())
    }
}

/// Rules compiled from a magic file on disk.
#[derive(Debug, Clone)]
pub struct MagicFileRules {
    path: PathBuf,
    name: String,
}

impl MagicFileRules {
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let name = path.display().to_string();
        Self { path, name }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RuleContributor for MagicFileRules {
    fn name(&self) -> &str {
        &self.name
    }

    fn rules(&self) -> CompileResult<Vec<Rule>> {
        compile_file(&self.path)
    }
}

/// Ordered set of contributors; built once into a [`MagicDatabase`].
///
/// Contributors are probed in registration order.
#[derive(Default)]
pub struct RuleRegistry {
    contributors: Vec<Box<dyn RuleContributor>>,
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self { contributors: Vec::new() }
    }

    pub fn register<C: RuleContributor + 'static>(&mut self, contributor: C) -> &mut Self {
        self.contributors.push(Box::new(contributor));
        self
    }

    /// Contributor names in probe order.
    pub fn names(&self) -> Vec<String> {
        self.contributors.iter().map(|c| c.name().to_string()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.contributors.is_empty()
    }

    /// Compile every contributor; the first failure aborts the build.
    pub fn build(&self) -> CompileResult<MagicDatabase> {
        self.build_with(RenderOptions::default())
    }

    pub fn build_with(&self, options: RenderOptions) -> CompileResult<MagicDatabase> {
        let mut groups = Vec::with_capacity(self.contributors.len());
        for contributor in &self.contributors {
            let name = contributor.name().to_string();
            let rules = contributor.rules().map_err(|source| CompileError::Group {
                name: name.clone(),
                source: Box::new(source),
            })?;
            tracing::debug!(group = %name, rules = rules.len(), "registered rule group");
            groups.push(RuleGroup::new(name, rules));
        }
        Ok(MagicDatabase::new(groups).with_render_options(options))
    }
}

/// Registry holding the built-in rule groups.
pub fn default_registry() -> RuleRegistry {
    let mut registry = RuleRegistry::new();
    registry.register(KernelRules);
    registry
}
