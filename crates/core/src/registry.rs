//! Compiled-in pipelines and the stage catalogue manifests draw from.

use std::collections::HashMap;
use std::sync::Arc;

use crate::contract::{PipelineFactory, Stage, StageHandler};
use crate::error::{Error, Result};

/// Namespace prefix of published pipeline packages.
pub const PACKAGE_PREFIX: &str = "genapi-";

/// Package name a short pipeline identifier resolves to first.
pub fn package_name(identifier: &str) -> String {
    format!("{PACKAGE_PREFIX}{identifier}")
}

/// Pipelines known at compile time, keyed by package name, plus named stage
/// handlers that pipeline manifests can assemble.
#[derive(Debug, Default)]
pub struct PipelineRegistry {
    pipelines: HashMap<String, Arc<dyn PipelineFactory>>,
    stages: HashMap<(Stage, String), StageHandler>,
}

impl PipelineRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes `factory` under `genapi-<name>`. A later registration with the
    /// same name replaces the earlier one.
    pub fn register_pipeline(&mut self, factory: Arc<dyn PipelineFactory>) {
        let package = package_name(factory.name());
        tracing::trace!(%package, "Registered pipeline.");
        self.pipelines.insert(package, factory);
    }

    /// Adds `handler` to the catalogue as the `stage` implementation called `name`.
    pub fn register_stage(
        &mut self,
        stage: Stage,
        name: impl Into<String>,
        handler: StageHandler,
    ) -> Result<()> {
        let name = name.into();
        if !handler.fits(stage) {
            return Err(Error::Config(format!(
                "{handler:?} `{name}` cannot be registered as a `{stage}` stage"
            )));
        }
        self.stages.insert((stage, name), handler);
        Ok(())
    }

    /// Looks up a published pipeline by its full package name.
    pub fn pipeline(&self, package: &str) -> Option<Arc<dyn PipelineFactory>> {
        self.pipelines.get(package).cloned()
    }

    /// Looks up the catalogue entry `name` for `stage`.
    pub fn stage(&self, stage: Stage, name: &str) -> Option<&StageHandler> {
        self.stages.get(&(stage, name.to_string()))
    }

    /// Package names of every published pipeline, sorted.
    pub fn pipeline_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.pipelines.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Catalogue names available for `stage`, sorted.
    pub fn stage_names(&self, stage: Stage) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .stages
            .keys()
            .filter(|(s, _)| *s == stage)
            .map(|(_, name)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::contract::StagePipeline;

    #[test]
    fn test_pipelines_are_published_under_the_prefix() {
        let mut registry = PipelineRegistry::new();
        registry.register_pipeline(Arc::new(StagePipeline::new("swag-demo")));

        assert!(registry.pipeline("genapi-swag-demo").is_some());
        assert!(registry.pipeline("swag-demo").is_none());
        assert_eq!(registry.pipeline_names(), vec!["genapi-swag-demo"]);
    }

    #[test]
    fn test_stage_catalogue_rejects_mismatched_handlers() {
        let mut registry = PipelineRegistry::new();
        let identity = StageHandler::flow(|record| async move { Ok(record) });

        registry
            .register_stage(Stage::Original, "identity", identity.clone())
            .unwrap();
        registry
            .register_stage(Stage::Parser, "identity", identity.clone())
            .unwrap();
        assert!(registry
            .register_stage(Stage::ReadConfig, "identity", identity)
            .is_err());

        assert!(registry.stage(Stage::Parser, "identity").is_some());
        assert!(registry.stage(Stage::ReadConfig, "identity").is_none());
        assert_eq!(registry.stage_names(Stage::Original), vec!["identity"]);
    }
}
