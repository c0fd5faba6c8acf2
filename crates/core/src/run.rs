//! Runs pipelines: one configuration through all six stages, or a whole
//! configuration file fanned out across its servers.

use futures_util::future::join_all;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::{Config, DefineConfig};
use crate::contract::{Pipeline, Stage, StageFuture};
use crate::error::Result;
use crate::record::ConfigRead;
use crate::resolver::Resolver;

/// Runs `config` through every stage of `pipeline`, strictly in order, and
/// returns the final record.
///
/// A failing stage aborts the run; its error comes back wrapped as
/// [`Error::StageFailed`](crate::Error::StageFailed) and later stages never start.
pub async fn run(pipeline: &dyn Pipeline, config: Config) -> Result<ConfigRead> {
    let name = pipeline.name();
    let started = Instant::now();
    info!(pipeline = name, "Running pipeline.");

    let record = stage(name, Stage::ReadConfig, pipeline.read_config(config)).await?;
    let record = stage(name, Stage::Original, pipeline.original(record)).await?;
    let record = stage(name, Stage::Parser, pipeline.parser(record)).await?;
    let record = stage(name, Stage::Compiler, pipeline.compiler(record)).await?;
    let record = stage(name, Stage::Generate, pipeline.generate(record)).await?;

    let record = Arc::new(record);
    stage(name, Stage::Dest, pipeline.dest(Arc::clone(&record))).await?;

    info!(
        pipeline = name,
        outputs = record.outputs.len(),
        elapsed_ms = started.elapsed().as_millis(),
        "Pipeline finished."
    );
    Ok(Arc::try_unwrap(record).unwrap_or_else(|shared| {
        debug!(
            pipeline = name,
            "Dest stage still holds the record, returning a copy."
        );
        ConfigRead::clone(&shared)
    }))
}

async fn stage<T>(pipeline: &str, stage: Stage, future: StageFuture<'_, T>) -> Result<T> {
    let started = Instant::now();
    match future.await {
        Ok(value) => {
            debug!(pipeline, %stage, elapsed_ms = started.elapsed().as_millis(), "Stage finished.");
            Ok(value)
        }
        Err(err) => {
            warn!(pipeline, %stage, error = %err, "Stage failed.");
            Err(err.in_stage(stage))
        }
    }
}

/// Expands `define` into one run per server, resolves each run's pipeline and
/// drives all runs concurrently.
///
/// Results come back in server order. A failed run, including one whose
/// pipeline could not be found, does not affect its siblings.
pub async fn run_define(resolver: &Resolver, define: DefineConfig) -> Vec<Result<ConfigRead>> {
    let configs = define.into_configs();
    debug!(runs = configs.len(), "Fanning out configuration.");

    let runs = configs.into_iter().map(move |config| async move {
        let factory = resolver.require(config.pipeline_id())?;
        let pipeline = factory.create();
        run(pipeline.as_ref(), config).await
    });
    join_all(runs).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::{ConfigServers, InputOption, Inputs};
    use crate::contract::StagePipeline;
    use crate::error::Error;
    use crate::record::Output;
    use crate::registry::PipelineRegistry;
    use std::sync::Mutex;

    /// Records every stage it is asked to run.
    struct Recording {
        calls: Arc<Mutex<Vec<Stage>>>,
        fail_at: Option<Stage>,
    }

    impl Recording {
        fn step(&self, stage: Stage) -> Result<()> {
            self.calls.lock().unwrap().push(stage);
            match self.fail_at {
                Some(failing) if failing == stage => Err(Error::Parse("boom".into())),
                _ => Ok(()),
            }
        }
    }

    impl Pipeline for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        fn read_config(&self, config: Config) -> StageFuture<'_, ConfigRead> {
            Box::pin(async move {
                self.step(Stage::ReadConfig)?;
                let outputs = vec![Output::new("request", "api.ts")];
                Ok(ConfigRead::new(config.inputs()?, config, outputs))
            })
        }

        fn original(&self, record: ConfigRead) -> StageFuture<'_, ConfigRead> {
            Box::pin(async move { self.step(Stage::Original).map(|()| record) })
        }

        fn parser(&self, record: ConfigRead) -> StageFuture<'_, ConfigRead> {
            Box::pin(async move { self.step(Stage::Parser).map(|()| record) })
        }

        fn compiler(&self, record: ConfigRead) -> StageFuture<'_, ConfigRead> {
            Box::pin(async move { self.step(Stage::Compiler).map(|()| record) })
        }

        fn generate(&self, record: ConfigRead) -> StageFuture<'_, ConfigRead> {
            Box::pin(async move { self.step(Stage::Generate).map(|()| record) })
        }

        fn dest(&self, _record: Arc<ConfigRead>) -> StageFuture<'_, ()> {
            Box::pin(async move { self.step(Stage::Dest) })
        }
    }

    fn config(input: &str) -> Config {
        Config {
            input: Some(InputOption::Uri(input.into())),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_stages_run_in_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Recording {
            calls: Arc::clone(&calls),
            fail_at: None,
        };

        let record = run(&pipeline, config("spec.json")).await.unwrap();
        assert_eq!(record.inputs, Inputs::Uri("spec.json".into()));
        assert_eq!(*calls.lock().unwrap(), Stage::ALL.to_vec());
    }

    #[tokio::test]
    async fn test_failure_skips_remaining_stages() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let pipeline = Recording {
            calls: Arc::clone(&calls),
            fail_at: Some(Stage::Parser),
        };

        let err = run(&pipeline, config("spec.json")).await.unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Parser));
        assert!(matches!(err, Error::StageFailed { .. }));
        assert_eq!(
            *calls.lock().unwrap(),
            vec![Stage::ReadConfig, Stage::Original, Stage::Parser]
        );
    }

    fn echo_pipeline() -> StagePipeline {
        StagePipeline::new("echo")
            .with_read_config(|config: Config| async move {
                let inputs = config.inputs()?;
                Ok(ConfigRead::new(inputs, config, Vec::new()))
            })
            .with_parser(|mut record: ConfigRead| async move {
                if let Inputs::Uri(uri) = &record.inputs {
                    if uri == "broken.json" {
                        return Err(Error::Parse(format!("{uri} is not a description")));
                    }
                    record.graphs.comments.push(uri.clone());
                }
                Ok(record)
            })
            .with_compiler(|record: ConfigRead| async move { Ok(record) })
            .with_generate(|record: ConfigRead| async move { Ok(record) })
    }

    #[tokio::test]
    async fn test_fan_out_produces_independent_records() {
        let mut registry = PipelineRegistry::new();
        registry.register_pipeline(Arc::new(echo_pipeline()));
        let resolver = Resolver::new(Arc::new(registry));

        let define = DefineConfig::Servers(ConfigServers {
            pipeline: Some("echo".into()),
            servers: vec![
                config("a.json"),
                Config {
                    pipeline: Some("does-not-exist".into()),
                    ..config("b.json")
                },
                config("broken.json"),
                config("c.json"),
            ],
            ..ConfigServers::default()
        });

        let results = run_define(&resolver, define).await;
        assert_eq!(results.len(), 4);

        let first = results[0].as_ref().unwrap();
        assert_eq!(first.graphs.comments, vec!["a.json".to_string()]);
        assert!(matches!(
            &results[1],
            Err(Error::PipelineNotFound(id)) if id == "does-not-exist"
        ));
        let err = results[2].as_ref().unwrap_err();
        assert_eq!(err.stage(), Some(Stage::Parser));
        let last = results[3].as_ref().unwrap();
        assert_eq!(last.graphs.comments, vec!["c.json".to_string()]);
    }

    #[tokio::test]
    async fn test_record_kept_by_dest_is_copied_back() {
        let kept = Arc::new(Mutex::new(Vec::new()));
        let pipeline = echo_pipeline().with_dest({
            let kept = Arc::clone(&kept);
            move |record: Arc<ConfigRead>| {
                kept.lock().unwrap().push(record);
                async { Ok(()) }
            }
        });

        let record = run(&pipeline, config("a.json")).await.unwrap();
        assert_eq!(record.graphs.comments, vec!["a.json".to_string()]);
        let kept = kept.lock().unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(*kept[0], record);
    }

    #[tokio::test]
    async fn test_missing_stage_surfaces_as_contract_violation() {
        let pipeline = StagePipeline::new("half").with_read_config(|config: Config| async move {
            Ok(ConfigRead::new(config.inputs()?, config, Vec::new()))
        });

        let err = run(&pipeline, config("spec.json")).await.unwrap_err();
        assert!(matches!(
            err,
            Error::ContractViolation {
                stage: Stage::Parser,
                ..
            }
        ));
    }
}
