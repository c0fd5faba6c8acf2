//! The six-stage pipeline contract.
//!
//! A pipeline turns a [`Config`] into written files through six stages that
//! always run in this order:
//!
//! ```text
//! read_config -> original -> parser -> compiler -> generate -> dest
//! ```
//!
//! Each stage takes the working record by value and hands it back, so no stage
//! can hold on to it after returning. Stages return boxed futures and may
//! suspend on I/O; the orchestrator awaits one stage before starting the next.
//!
//! Pipelines are either types implementing [`Pipeline`] directly, where the
//! compiler enforces the contract, or a [`StagePipeline`] assembled from stage
//! handlers, where a missing load-bearing stage is reported as
//! [`Error::ContractViolation`] when it is invoked.

use futures_util::future::BoxFuture;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::record::ConfigRead;

/// Future returned by every stage.
pub type StageFuture<'a, T> = BoxFuture<'a, Result<T>>;

/// The stages of a run, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Stage {
    /// Builds the working record from the configuration.
    ReadConfig,
    /// Loads the raw API description.
    Original,
    /// Fills the graph from the raw description.
    Parser,
    /// Attaches a syntax tree to each output.
    Compiler,
    /// Renders syntax trees to text.
    Generate,
    /// Writes the rendered outputs.
    Dest,
}

impl Stage {
    /// Every stage in execution order.
    pub const ALL: [Self; 6] = [
        Self::ReadConfig,
        Self::Original,
        Self::Parser,
        Self::Compiler,
        Self::Generate,
        Self::Dest,
    ];

    /// Stage name as it appears in logs and pipeline manifests.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReadConfig => "readConfig",
            Self::Original => "original",
            Self::Parser => "parser",
            Self::Compiler => "compiler",
            Self::Generate => "generate",
            Self::Dest => "dest",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A pipeline instance: the object a factory hands out for one run.
pub trait Pipeline: Send + Sync {
    /// Name used in logs and error messages.
    fn name(&self) -> &str;

    /// Seeds the working record from a configuration.
    fn read_config(&self, config: Config) -> StageFuture<'_, ConfigRead>;

    /// Fetches or normalizes the raw description. Identity unless overridden.
    fn original(&self, record: ConfigRead) -> StageFuture<'_, ConfigRead> {
        Box::pin(async move { Ok(record) })
    }

    /// Populates the graph from the raw source.
    fn parser(&self, record: ConfigRead) -> StageFuture<'_, ConfigRead>;

    /// Attaches a syntax tree to every output it knows how to compile.
    fn compiler(&self, record: ConfigRead) -> StageFuture<'_, ConfigRead>;

    /// Renders each output's syntax tree into text.
    fn generate(&self, record: ConfigRead) -> StageFuture<'_, ConfigRead>;

    /// Persists rendered text. A no-op unless overridden.
    fn dest(&self, _record: Arc<ConfigRead>) -> StageFuture<'_, ()> {
        Box::pin(async { Ok(()) })
    }
}

/// A loadable pipeline: invoked with no arguments, yields a fresh [`Pipeline`].
pub trait PipelineFactory: Send + Sync + fmt::Debug {
    /// Name of the pipelines this factory creates.
    fn name(&self) -> &str;

    /// A new pipeline instance for one run.
    fn create(&self) -> Box<dyn Pipeline>;
}

/// Handler for the `read_config` stage.
pub type ReadConfigHandler =
    Arc<dyn Fn(Config) -> BoxFuture<'static, Result<ConfigRead>> + Send + Sync>;
/// Handler for the record-in, record-out stages.
pub type FlowHandler =
    Arc<dyn Fn(ConfigRead) -> BoxFuture<'static, Result<ConfigRead>> + Send + Sync>;
/// Handler for the terminal `dest` stage.
///
/// The record is shared with the orchestrator, which takes it back once the
/// handler's future completes. A handler must not keep its clone of the `Arc`
/// past that point.
pub type DestHandler =
    Arc<dyn Fn(Arc<ConfigRead>) -> BoxFuture<'static, Result<()>> + Send + Sync>;

/// A stage implementation that can be plugged into any [`StagePipeline`].
#[derive(Clone)]
pub enum StageHandler {
    /// Serves [`Stage::ReadConfig`].
    ReadConfig(ReadConfigHandler),
    /// Serves `original`, `parser`, `compiler` or `generate`.
    Flow(FlowHandler),
    /// Serves [`Stage::Dest`].
    Dest(DestHandler),
}

impl StageHandler {
    /// Wraps an async `read_config` function.
    pub fn read_config<F, Fut>(handler: F) -> Self
    where
        F: Fn(Config) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ConfigRead>> + Send + 'static,
    {
        Self::ReadConfig(Arc::new(
            move |config: Config| -> BoxFuture<'static, Result<ConfigRead>> { Box::pin(handler(config)) },
        ))
    }

    /// Wraps an async record-in, record-out function.
    pub fn flow<F, Fut>(handler: F) -> Self
    where
        F: Fn(ConfigRead) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ConfigRead>> + Send + 'static,
    {
        Self::Flow(Arc::new(
            move |record: ConfigRead| -> BoxFuture<'static, Result<ConfigRead>> { Box::pin(handler(record)) },
        ))
    }

    /// Wraps an async `dest` function.
    pub fn dest<F, Fut>(handler: F) -> Self
    where
        F: Fn(Arc<ConfigRead>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        Self::Dest(Arc::new(move |record: Arc<ConfigRead>| -> BoxFuture<'static, Result<()>> {
            Box::pin(handler(record))
        }))
    }

    /// Whether this handler has the right shape for `stage`.
    pub fn fits(&self, stage: Stage) -> bool {
        match self {
            Self::ReadConfig(_) => stage == Stage::ReadConfig,
            Self::Flow(_) => matches!(
                stage,
                Stage::Original | Stage::Parser | Stage::Compiler | Stage::Generate
            ),
            Self::Dest(_) => stage == Stage::Dest,
        }
    }
}

impl fmt::Debug for StageHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ReadConfig(_) => "StageHandler::ReadConfig",
            Self::Flow(_) => "StageHandler::Flow",
            Self::Dest(_) => "StageHandler::Dest",
        })
    }
}

/// A pipeline assembled from individual stage handlers.
///
/// Missing `original` is identity and missing `dest` is a no-op; any other
/// missing stage fails with [`Error::ContractViolation`] when invoked.
#[derive(Clone)]
pub struct StagePipeline {
    name: String,
    read_config: Option<ReadConfigHandler>,
    original: Option<FlowHandler>,
    parser: Option<FlowHandler>,
    compiler: Option<FlowHandler>,
    generate: Option<FlowHandler>,
    dest: Option<DestHandler>,
}

impl StagePipeline {
    /// A pipeline named `name` with no stages yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            read_config: None,
            original: None,
            parser: None,
            compiler: None,
            generate: None,
            dest: None,
        }
    }

    /// The pipeline name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Plugs `handler` in as `stage`. Fails if the handler has the wrong shape.
    pub fn with_stage(mut self, stage: Stage, handler: StageHandler) -> Result<Self> {
        match (stage, handler) {
            (Stage::ReadConfig, StageHandler::ReadConfig(h)) => self.read_config = Some(h),
            (Stage::Original, StageHandler::Flow(h)) => self.original = Some(h),
            (Stage::Parser, StageHandler::Flow(h)) => self.parser = Some(h),
            (Stage::Compiler, StageHandler::Flow(h)) => self.compiler = Some(h),
            (Stage::Generate, StageHandler::Flow(h)) => self.generate = Some(h),
            (Stage::Dest, StageHandler::Dest(h)) => self.dest = Some(h),
            (stage, handler) => {
                return Err(Error::Config(format!(
                    "{handler:?} cannot serve as the `{stage}` stage of `{}`",
                    self.name
                )));
            }
        }
        Ok(self)
    }

    /// Sets the `read_config` stage.
    pub fn with_read_config<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Config) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ConfigRead>> + Send + 'static,
    {
        if let StageHandler::ReadConfig(h) = StageHandler::read_config(handler) {
            self.read_config = Some(h);
        }
        self
    }

    /// Sets the `original` stage.
    pub fn with_original<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(ConfigRead) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ConfigRead>> + Send + 'static,
    {
        self.original = flow_handler(handler);
        self
    }

    /// Sets the `parser` stage.
    pub fn with_parser<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(ConfigRead) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ConfigRead>> + Send + 'static,
    {
        self.parser = flow_handler(handler);
        self
    }

    /// Sets the `compiler` stage.
    pub fn with_compiler<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(ConfigRead) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ConfigRead>> + Send + 'static,
    {
        self.compiler = flow_handler(handler);
        self
    }

    /// Sets the `generate` stage.
    pub fn with_generate<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(ConfigRead) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ConfigRead>> + Send + 'static,
    {
        self.generate = flow_handler(handler);
        self
    }

    /// Sets the `dest` stage.
    pub fn with_dest<F, Fut>(mut self, handler: F) -> Self
    where
        F: Fn(Arc<ConfigRead>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        if let StageHandler::Dest(h) = StageHandler::dest(handler) {
            self.dest = Some(h);
        }
        self
    }

    /// Stages this pipeline has a handler for.
    pub fn provided_stages(&self) -> Vec<Stage> {
        let present = [
            self.read_config.is_some(),
            self.original.is_some(),
            self.parser.is_some(),
            self.compiler.is_some(),
            self.generate.is_some(),
            self.dest.is_some(),
        ];
        Stage::ALL
            .into_iter()
            .zip(present)
            .filter_map(|(stage, present)| present.then_some(stage))
            .collect()
    }

    fn missing<T: Send + 'static>(&self, stage: Stage) -> StageFuture<'static, T> {
        let err = Error::ContractViolation {
            pipeline: self.name.clone(),
            stage,
        };
        Box::pin(async move { Err(err) })
    }

    fn flow(
        &self,
        stage: Stage,
        handler: Option<&FlowHandler>,
        record: ConfigRead,
    ) -> StageFuture<'static, ConfigRead> {
        match handler {
            Some(handler) => handler(record),
            None => self.missing(stage),
        }
    }
}

fn flow_handler<F, Fut>(handler: F) -> Option<FlowHandler>
where
    F: Fn(ConfigRead) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<ConfigRead>> + Send + 'static,
{
    match StageHandler::flow(handler) {
        StageHandler::Flow(h) => Some(h),
        StageHandler::ReadConfig(_) | StageHandler::Dest(_) => None,
    }
}

impl fmt::Debug for StagePipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StagePipeline")
            .field("name", &self.name)
            .field("stages", &self.provided_stages())
            .finish()
    }
}

impl Pipeline for StagePipeline {
    fn name(&self) -> &str {
        &self.name
    }

    fn read_config(&self, config: Config) -> StageFuture<'_, ConfigRead> {
        match &self.read_config {
            Some(handler) => handler(config),
            None => self.missing(Stage::ReadConfig),
        }
    }

    fn original(&self, record: ConfigRead) -> StageFuture<'_, ConfigRead> {
        match &self.original {
            Some(handler) => handler(record),
            None => Box::pin(async move { Ok(record) }),
        }
    }

    fn parser(&self, record: ConfigRead) -> StageFuture<'_, ConfigRead> {
        self.flow(Stage::Parser, self.parser.as_ref(), record)
    }

    fn compiler(&self, record: ConfigRead) -> StageFuture<'_, ConfigRead> {
        self.flow(Stage::Compiler, self.compiler.as_ref(), record)
    }

    fn generate(&self, record: ConfigRead) -> StageFuture<'_, ConfigRead> {
        self.flow(Stage::Generate, self.generate.as_ref(), record)
    }

    fn dest(&self, record: Arc<ConfigRead>) -> StageFuture<'_, ()> {
        match &self.dest {
            Some(handler) => handler(record),
            None => Box::pin(async { Ok(()) }),
        }
    }
}

impl PipelineFactory for StagePipeline {
    fn name(&self) -> &str {
        &self.name
    }

    fn create(&self) -> Box<dyn Pipeline> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::Inputs;

    fn seed(config: Config) -> ConfigRead {
        ConfigRead::new(Inputs::Uri("spec.json".into()), config, Vec::new())
    }

    #[tokio::test]
    async fn test_missing_original_and_dest_are_pass_through() {
        let pipeline = StagePipeline::new("partial").with_read_config(|config| async move {
            Ok(seed(config))
        });

        let record = Pipeline::read_config(&pipeline, Config::default())
            .await
            .unwrap();
        let record = pipeline.original(record).await.unwrap();
        assert!(record.source.is_none());
        pipeline.dest(Arc::new(record)).await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_parser_is_a_contract_violation() {
        let pipeline = StagePipeline::new("partial");
        let err = pipeline.parser(seed(Config::default())).await.unwrap_err();
        assert!(matches!(
            err,
            Error::ContractViolation { ref pipeline, stage: Stage::Parser } if pipeline == "partial"
        ));

        let err = Pipeline::read_config(&pipeline, Config::default())
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Some(Stage::ReadConfig));
    }

    #[test]
    fn test_with_stage_checks_handler_shape() {
        let parser = StageHandler::flow(|record| async move { Ok(record) });
        assert!(parser.fits(Stage::Parser));
        assert!(!parser.fits(Stage::Dest));

        let pipeline = StagePipeline::new("manual")
            .with_stage(Stage::Parser, parser.clone())
            .unwrap();
        assert_eq!(pipeline.provided_stages(), vec![Stage::Parser]);

        assert!(StagePipeline::new("manual")
            .with_stage(Stage::Dest, parser)
            .is_err());
    }

    #[test]
    fn test_factory_creates_independent_instances() {
        let factory = StagePipeline::new("demo").with_parser(|record| async move { Ok(record) });
        let first = factory.create();
        let second = factory.create();
        assert_eq!(first.name(), "demo");
        assert_eq!(second.name(), "demo");
        assert!(!std::ptr::addr_eq(first.as_ref(), second.as_ref()));
    }
}
