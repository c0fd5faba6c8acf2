//! Output compilation: one syntax tree per requested output, chosen by kind.

use rayon::prelude::*;
use std::sync::Arc;
use tracing::debug;

use crate::ast::TsModule;
use crate::error::Result;
use crate::record::{AstSlot, ConfigRead, Output, OutputKind};

/// Builds the syntax tree for one output from the finished graph.
///
/// Synthesizers see the record read-only; the dispatcher alone writes the
/// result into the output being processed.
pub trait Synthesizer: Send + Sync {
    /// The syntax tree for `output`.
    fn synthesize(&self, record: &ConfigRead, output: &Output) -> Result<TsModule>;
}

impl<F> Synthesizer for F
where
    F: Fn(&ConfigRead, &Output) -> Result<TsModule> + Send + Sync,
{
    fn synthesize(&self, record: &ConfigRead, output: &Output) -> Result<TsModule> {
        self(record, output)
    }
}

/// Routes each output to the synthesizer for its kind.
#[derive(Clone)]
pub struct Dispatcher {
    request: Arc<dyn Synthesizer>,
    typings: Arc<dyn Synthesizer>,
}

impl Dispatcher {
    /// A dispatcher routing `request` and `typings` outputs to the given synthesizers.
    pub fn new(request: Arc<dyn Synthesizer>, typings: Arc<dyn Synthesizer>) -> Self {
        Self { request, typings }
    }

    /// The AST slot value for `output`. Unknown kinds are [`AstSlot::Unhandled`].
    pub fn dispatch(&self, record: &ConfigRead, output: &Output) -> Result<AstSlot> {
        match &output.kind {
            OutputKind::Request => self.request.synthesize(record, output).map(AstSlot::Request),
            OutputKind::Typings => self.typings.synthesize(record, output).map(AstSlot::Typings),
            OutputKind::Other(tag) => {
                debug!(kind = %tag, path = %output.path.display(), "No synthesizer for output kind, skipping.");
                Ok(AstSlot::Unhandled)
            }
        }
    }

    /// Compiles every output in order.
    pub fn compile(&self, mut record: ConfigRead) -> Result<ConfigRead> {
        for index in 0..record.outputs.len() {
            let slot = self.dispatch(&record, &record.outputs[index])?;
            record.outputs[index].set_ast(slot);
        }
        Ok(record)
    }

    /// Same result as [`compile`](Self::compile), with the trees built on the
    /// rayon pool and assigned back in output order.
    pub fn compile_parallel(&self, mut record: ConfigRead) -> Result<ConfigRead> {
        let slots = record
            .outputs
            .par_iter()
            .map(|output| self.dispatch(&record, output))
            .collect::<Result<Vec<_>>>()?;

        for (output, slot) in record.outputs.iter_mut().zip(slots) {
            output.set_ast(slot);
        }
        Ok(record)
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher").finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::{Config, Inputs};
    use crate::error::Error;

    fn tagged(label: &'static str) -> Arc<dyn Synthesizer> {
        Arc::new(move |record: &ConfigRead, output: &Output| -> Result<TsModule> {
            Ok(TsModule {
                header: vec![
                    label.to_string(),
                    output.path.display().to_string(),
                    record.graphs.functions.len().to_string(),
                ],
                ..TsModule::default()
            })
        })
    }

    fn record(outputs: Vec<Output>) -> ConfigRead {
        ConfigRead::new(Inputs::Uri("spec.json".into()), Config::default(), outputs)
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(tagged("request"), tagged("typings"))
    }

    #[test]
    fn test_every_known_output_gets_its_tree() {
        let compiled = dispatcher()
            .compile(record(vec![
                Output::new("request", "api.ts"),
                Output::new("graphql-operation", "ops.graphql"),
                Output::new("typings", "api.d.ts"),
            ]))
            .unwrap();

        assert_eq!(compiled.outputs.len(), 3);
        assert!(matches!(compiled.outputs[0].ast_slot(), AstSlot::Request(m) if m.header[0] == "request"));
        assert_eq!(compiled.outputs[1].ast_slot(), &AstSlot::Unhandled);
        assert!(compiled.outputs[1].ast().is_none());
        assert!(matches!(compiled.outputs[2].ast_slot(), AstSlot::Typings(m) if m.header[1] == "api.d.ts"));
    }

    #[test]
    fn test_no_outputs_is_a_no_op() {
        let compiled = dispatcher().compile(record(Vec::new())).unwrap();
        assert!(compiled.outputs.is_empty());
        assert!(compiled.graphs.is_empty());
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let outputs: Vec<Output> = (0..16)
            .map(|i| {
                let kind = match i % 3 {
                    0 => "request",
                    1 => "typings",
                    _ => "other",
                };
                Output::new(kind, format!("out/{i}.ts"))
            })
            .collect();

        let sequential = dispatcher().compile(record(outputs.clone())).unwrap();
        let parallel = dispatcher().compile_parallel(record(outputs)).unwrap();
        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_synthesizer_failure_propagates() {
        let failing: Arc<dyn Synthesizer> = Arc::new(|_: &ConfigRead, _: &Output| -> Result<TsModule> {
            Err(Error::Serialize("cannot synthesize".into()))
        });
        let dispatcher = Dispatcher::new(tagged("request"), failing);
        let err = dispatcher
            .compile(record(vec![Output::new("typings", "api.d.ts")]))
            .unwrap_err();
        assert!(matches!(err, Error::Serialize(_)));
    }
}
