//! Core of genapi: the pipeline contract, pipeline resolution, the graph and
//! working record shared by every stage, and the output dispatcher.
//!
//! The core knows nothing about particular API description formats, does not
//! render source text and performs no writes of its own. Concrete stages live
//! in pipeline crates and plug in through [`Pipeline`], [`StagePipeline`] and
//! [`Synthesizer`].

pub mod ast;
pub mod config;
pub mod contract;
pub mod dispatch;
pub mod error;
pub mod graph;
pub mod record;
pub mod registry;
pub mod resolver;
pub mod run;

pub use config::{Config, ConfigServers, DefineConfig, Inputs};
pub use contract::{Pipeline, PipelineFactory, Stage, StageFuture, StageHandler, StagePipeline};
pub use dispatch::{Dispatcher, Synthesizer};
pub use error::{Error, Result};
pub use graph::Graph;
pub use record::{AstSlot, ConfigRead, Output, OutputKind};
pub use registry::PipelineRegistry;
pub use resolver::Resolver;
pub use run::{run, run_define};
