//! Environment acquisition.
//!
//! The environment the transcript statements run against comes from two
//! optional sources, applied in order: a context script executed ahead of
//! the run (its output discarded, its bindings kept) and an inline JSON
//! object of extra bindings. Failure of either aborts before the core
//! engine ever runs.

use std::fs;
use std::io;
use std::path::Path;

use anyhow::{anyhow, bail};

use transcript_eval::{default_env, parse, Env, ExecError, Interpreter, Value};

/// Build the evaluation environment from the optional context sources.
pub fn build_env(script: Option<&Path>, json: Option<&str>) -> anyhow::Result<Env> {
    let mut env = default_env();
    if let Some(path) = script {
        load_script(&mut env, path)
            .map_err(|e| anyhow!("loading context {}: {:#}", path.display(), e))?;
    }
    if let Some(text) = json {
        merge_json(&mut env, text)
            .map_err(|e| anyhow!("parsing --context-json: {:#}", e))?;
    }
    tracing::debug!(bindings = env.len(), "environment ready");
    Ok(env)
}

/// Run a context script and keep whatever bindings it leaves behind.
fn load_script(env: &mut Env, path: &Path) -> anyhow::Result<()> {
    let source = fs::read_to_string(path)?;
    let program = parse(&source).map_err(|e| anyhow!("{}", e))?;
    let mut interp = Interpreter::new(std::mem::take(env));
    let mut sink = io::sink();
    let result = interp.run(&program, &mut sink, false);
    *env = interp.into_globals();
    match result {
        Ok(()) => Ok(()),
        Err(ExecError::Raised(err)) => Err(anyhow!("{}", err)),
        Err(ExecError::Io(err)) => Err(err.into()),
    }
}

/// Merge a JSON object's members into the environment as bindings.
fn merge_json(env: &mut Env, text: &str) -> anyhow::Result<()> {
    let parsed: serde_json::Value = serde_json::from_str(text)?;
    let serde_json::Value::Object(members) = parsed else {
        bail!("context must be a JSON object");
    };
    for (name, value) in members {
        env.insert(name, json_to_value(value));
    }
    Ok(())
}

fn json_to_value(value: serde_json::Value) -> Value {
    match value {
        serde_json::Value::Null => Value::Null,
        serde_json::Value::Bool(b) => Value::Bool(b),
        serde_json::Value::Number(n) => Value::Num(n.as_f64().unwrap_or(f64::NAN)),
        serde_json::Value::String(s) => Value::Str(s),
        serde_json::Value::Array(items) => {
            Value::List(items.into_iter().map(json_to_value).collect())
        }
        // No object type in the statement language; keep the JSON text.
        object @ serde_json::Value::Object(_) => Value::Str(object.to_string()),
    }
}
