//! The `dest` stage: writes every rendered output to disk.

use std::sync::Arc;
use tracing::{debug, info};

use genapi_core::{ConfigRead, Error, Result};

/// Writes each output that has code, creating parent directories. Outputs
/// without code (unknown kinds) are skipped.
pub async fn write_outputs(record: Arc<ConfigRead>) -> Result<()> {
    for output in &record.outputs {
        let Some(code) = output.code() else {
            debug!(kind = %output.kind, path = %output.path.display(), "Nothing rendered, skipping write.");
            continue;
        };
        if let Some(parent) = output.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| Error::io(parent, err))?;
        }
        tokio::fs::write(&output.path, code)
            .await
            .map_err(|err| Error::io(&output.path, err))?;
        info!(kind = %output.kind, path = %output.path.display(), bytes = code.len(), "Wrote output.");
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use genapi_core::ast::TsModule;
    use genapi_core::{AstSlot, Config, Inputs, Output};

    #[tokio::test]
    async fn test_writes_rendered_outputs_only() {
        let dir = tempfile::tempdir().unwrap();
        let request_path = dir.path().join("nested/api/index.ts");
        let other_path = dir.path().join("ops.graphql");

        let mut request = Output::new("request", &request_path);
        request.set_ast(AstSlot::Request(TsModule::default()));
        request.render_with(|_| "export {}\n".into());
        let mut other = Output::new("graphql-operation", &other_path);
        other.set_ast(AstSlot::Unhandled);

        let record = ConfigRead::new(
            Inputs::Uri("spec.json".into()),
            Config::default(),
            vec![request, other],
        );
        write_outputs(Arc::new(record)).await.unwrap();

        assert_eq!(std::fs::read_to_string(&request_path).unwrap(), "export {}\n");
        assert!(!other_path.exists());
    }
}
