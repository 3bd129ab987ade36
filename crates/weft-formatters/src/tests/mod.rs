//! Crate-level integration and BDD tests.

use std::sync::Arc;

use crate::backend::{CommandSpec, FormatterBackend, FormatterDefinition};
use crate::error::FormatError;
use crate::options::FormatOptions;
use crate::plugin::UnavailablePluginLoader;
use crate::registry::FormatterRegistry;
use crate::runner::{CommandExecutor, FormatterDispatch, FormatterRunner};


/// Executor that stands in for a formatter by transforming its input
/// according to the command name.
struct ScriptedExecutor;

impl CommandExecutor for ScriptedExecutor {
    fn run(
        &self,
        spec: &CommandSpec,
        args: &[String],
        input: &[u8],
    ) -> Result<Vec<u8>, FormatError> {
        match spec.cmd() {
            "upper" => Ok(input.to_ascii_uppercase()),
            "trim" => Ok(input.trim_ascii().to_vec()),
            "suffix" => {
                let mut out = input.to_vec();
                for arg in args {
                    out.extend_from_slice(arg.as_bytes());
                }
                Ok(out)
            }
            other => Err(FormatError::ExternalToolFailed {
                cmd: other.to_owned(),
                exit_code: Some(2),
                diagnostics: String::from("unsupported input"),
            }),
        }
    }
}

fn command(id: &str, args: Vec<String>) -> FormatterDefinition {
    FormatterDefinition::new(id, FormatterBackend::ExternalCommand(CommandSpec::new(id, args)))
}

#[test]
fn end_to_end_runner_with_scripted_executor() {
    let mut registry = FormatterRegistry::new();
    registry.register(command("upper", vec![])).expect("register");
    registry.assign("sql", vec!["upper".into()]).expect("assign");

    let runner = FormatterRunner::new(registry, ScriptedExecutor, Arc::new(UnavailablePluginLoader));
    let chain = runner.formatters_for("sql").to_vec();
    assert_eq!(chain, ["upper"]);

    let output = runner
        .invoke("upper", b"select 1", &FormatOptions::default())
        .expect("invoke");
    assert_eq!(output, b"SELECT 1");
}
