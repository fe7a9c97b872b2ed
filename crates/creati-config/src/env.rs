use std::sync::OnceLock;

use regex::{Captures, Regex};
use thiserror::Error;

/// Failure to expand a configuration placeholder
#[derive(Debug, PartialEq, Eq, Error)]
pub enum ExpandError {
    /// `{{ env.VAR }}` without a default and `VAR` unset
    #[error("environment variable not found: `{0}`")]
    MissingVar(String),
    /// Placeholder scoped to something other than `env.`
    #[error("only variables scoped with 'env.' are supported: `{0}`")]
    UnsupportedScope(String),
}

/// Expand `{{ env.VAR }}` placeholders in raw TOML from the process environment
///
/// `{{ env.VAR | default("fallback") }}` falls back when `VAR` is unset.
/// Comment lines are left untouched so documented-but-unused secrets do not
/// have to exist.
pub fn expand_env(input: &str) -> Result<String, ExpandError> {
    expand_with(input, |name| std::env::var(name).ok())
}

/// Expand placeholders using an arbitrary variable lookup
pub fn expand_with<F>(input: &str, lookup: F) -> Result<String, ExpandError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut output = String::with_capacity(input.len());

    for line in input.split_inclusive('\n') {
        if line.trim_start().starts_with('#') {
            output.push_str(line);
        } else {
            expand_line(line, &lookup, &mut output)?;
        }
    }

    Ok(output)
}

fn placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // 1: dotted key, 2: optional default("...") value
    RE.get_or_init(|| {
        Regex::new(r#"\{\{\s*([A-Za-z0-9_.]+)\s*(?:\|\s*default\("([^"]*)"\))?\s*\}\}"#).expect("must be valid regex")
    })
}

fn expand_line<F>(line: &str, lookup: &F, output: &mut String) -> Result<(), ExpandError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut cursor = 0;

    for captures in placeholder().captures_iter(line) {
        let Some(whole) = captures.get(0) else { continue };
        output.push_str(&line[cursor..whole.start()]);
        output.push_str(&resolve(&captures, lookup)?);
        cursor = whole.end();
    }

    output.push_str(&line[cursor..]);
    Ok(())
}

fn resolve<F>(captures: &Captures<'_>, lookup: &F) -> Result<String, ExpandError>
where
    F: Fn(&str) -> Option<String>,
{
    let key = captures.get(1).map_or("", |m| m.as_str());

    let Some(name) = key.strip_prefix("env.").filter(|name| !name.is_empty() && !name.contains('.')) else {
        return Err(ExpandError::UnsupportedScope(key.to_string()));
    };

    lookup(name)
        .or_else(|| captures.get(2).map(|m| m.as_str().to_string()))
        .ok_or_else(|| ExpandError::MissingVar(name.to_string()))
}
