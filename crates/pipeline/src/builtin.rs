//! The stage catalogue and the published `swag-*` pipelines.
//!
//! Every stage is registered under a catalogue name so pipeline manifests can
//! mix them; the published pipelines are assembled from the same entries.

use std::sync::{Arc, LazyLock};
use tracing::debug;

use genapi_core::{
    ConfigRead, Error, PipelineRegistry, Resolver, Result, Stage, StageHandler, StagePipeline,
};

use crate::dest::write_outputs;
use crate::emit::Emit;
use crate::original::load_source;
use crate::parser::{HttpClient, parse};
use crate::read_config::read_config;
use crate::synthesize::dispatcher;

/// Pipelines registered by [`register_builtin`], each with its stage names.
pub const BUILTIN_PIPELINES: &[(&str, [&str; 6])] = &[
    (
        "swag-axios-ts",
        ["default", "source", "swagger-axios", "typescript", "typescript", "fs"],
    ),
    (
        "swag-fetch-ts",
        ["default", "source", "swagger-fetch", "typescript", "typescript", "fs"],
    ),
];

static RESOLVER: LazyLock<Result<Resolver, String>> = LazyLock::new(|| {
    builtin_registry()
        .map(|registry| Resolver::new(Arc::new(registry)))
        .map_err(|err| err.to_string())
});

/// Process-wide resolver over the built-in registry. Its module cache lives
/// as long as the process.
pub fn resolver() -> Result<&'static Resolver> {
    RESOLVER.as_ref().map_err(|reason| {
        Error::Config(format!("built-in pipelines could not be registered: {reason}"))
    })
}

/// A registry holding the built-in stage catalogue and pipelines.
pub fn builtin_registry() -> Result<PipelineRegistry> {
    let mut registry = PipelineRegistry::new();
    register_builtin(&mut registry)?;
    Ok(registry)
}

/// Adds the built-in catalogue and pipelines to an existing registry.
/// Entries with the same names are replaced.
pub fn register_builtin(registry: &mut PipelineRegistry) -> Result<()> {
    for (stage, name, handler) in catalogue() {
        registry.register_stage(stage, name, handler)?;
    }
    register_pipelines(registry, BUILTIN_PIPELINES)
}

/// Assembles each `(name, stage names)` entry from the registry's catalogue
/// and publishes it.
fn register_pipelines(
    registry: &mut PipelineRegistry,
    pipelines: &[(&str, [&str; 6])],
) -> Result<()> {
    for (name, stages) in pipelines {
        let mut pipeline = StagePipeline::new(*name);
        for (stage, stage_name) in Stage::ALL.into_iter().zip(stages) {
            let handler = registry.stage(stage, stage_name).ok_or_else(|| {
                Error::Config(format!("no `{stage}` stage named `{stage_name}` in the catalogue"))
            })?;
            pipeline = pipeline.with_stage(stage, handler.clone())?;
        }
        registry.register_pipeline(Arc::new(pipeline));
    }
    Ok(())
}

fn catalogue() -> Vec<(Stage, &'static str, StageHandler)> {
    vec![
        (
            Stage::ReadConfig,
            "default",
            StageHandler::read_config(|config| async move { read_config(config) }),
        ),
        (
            Stage::Original,
            "source",
            StageHandler::flow(load_source),
        ),
        (
            Stage::Parser,
            "swagger-axios",
            StageHandler::flow(|record| async move { parse(record, HttpClient::Axios) }),
        ),
        (
            Stage::Parser,
            "swagger-fetch",
            StageHandler::flow(|record| async move { parse(record, HttpClient::Fetch) }),
        ),
        (
            Stage::Compiler,
            "typescript",
            StageHandler::flow(|record| async move { dispatcher().compile(record) }),
        ),
        (
            Stage::Compiler,
            "typescript-parallel",
            StageHandler::flow(|record| async move { dispatcher().compile_parallel(record) }),
        ),
        (
            Stage::Generate,
            "typescript",
            StageHandler::flow(|record| async move { Ok(render(record)) }),
        ),
        (Stage::Dest, "fs", StageHandler::dest(write_outputs)),
    ]
}

/// The `generate` stage: renders every compiled output into its text slot.
pub fn render(mut record: ConfigRead) -> ConfigRead {
    for output in &mut record.outputs {
        if !output.render_with(Emit::emit) {
            debug!(kind = %output.kind, path = %output.path.display(), "No syntax tree, skipping render.");
        }
    }
    record
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use genapi_core::registry::package_name;

    #[test]
    fn test_builtin_registry_contents() {
        let registry = builtin_registry().unwrap();
        assert_eq!(
            registry.pipeline_names(),
            vec!["genapi-swag-axios-ts", "genapi-swag-fetch-ts"]
        );
        assert_eq!(
            registry.stage_names(Stage::Parser),
            vec!["swagger-axios", "swagger-fetch"]
        );
        assert_eq!(
            registry.stage_names(Stage::Compiler),
            vec!["typescript", "typescript-parallel"]
        );
        assert!(registry.stage(Stage::Dest, "fs").is_some());
    }

    #[test]
    fn test_register_builtin_into_custom_registry() {
        let mut registry = PipelineRegistry::new();
        register_builtin(&mut registry).unwrap();
        let factory = registry.pipeline(&package_name("swag-fetch-ts")).unwrap();
        assert_eq!(factory.name(), "swag-fetch-ts");

        register_builtin(&mut registry).unwrap();
        assert_eq!(registry.pipeline_names().len(), 2);
    }

    #[test]
    fn test_unknown_catalogue_entry_fails_registration() {
        let mut registry = builtin_registry().unwrap();
        let err = register_pipelines(
            &mut registry,
            &[(
                "swag-broken-ts",
                ["default", "source", "swagger-graphql", "typescript", "typescript", "fs"],
            )],
        )
        .unwrap_err();
        assert!(matches!(err, Error::Config(ref reason) if reason.contains("swagger-graphql")));
        assert!(registry.pipeline(&package_name("swag-broken-ts")).is_none());
    }

    #[test]
    fn test_static_resolver_caches() {
        let resolver = resolver().unwrap();
        let first = resolver.resolve("swag-axios-ts").unwrap().unwrap();
        let second = resolver.resolve("swag-axios-ts").unwrap().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }
}
