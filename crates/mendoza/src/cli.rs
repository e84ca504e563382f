//! Logic behind the `mendoza-apply` binary.
//!
//! ```text
//! mendoza-apply [--rebase] '<patch-json>' < document.json
//! ```
//!
//! The document is read from stdin, the patch is the JSON array given as the
//! positional argument. With `--rebase` the result is rebased onto the input
//! before printing (which only matters for sharing, not for the output text).

use serde_json::Value as Json;

use crate::error::MendozaError;
use crate::patch::RawPatch;
use crate::{apply_patch, rebase_value, unwrap, wrap};

// ── Errors ────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub enum CliError {
    Json(serde_json::Error),
    Patch(MendozaError),
    Usage(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Json(e)  => write!(f, "{e}"),
            CliError::Patch(e) => write!(f, "{e}"),
            CliError::Usage(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for CliError {}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self { CliError::Json(e) }
}

impl From<MendozaError> for CliError {
    fn from(e: MendozaError) -> Self { CliError::Patch(e) }
}

// ── Arguments ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub patch: String,
    pub rebase: bool,
}

/// Parses the arguments following the program name.
pub fn parse_args<I, S>(args: I) -> Result<CliArgs, CliError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut patch = None;
    let mut rebase = false;
    for arg in args.into_iter().map(Into::into) {
        if arg == "--rebase" {
            rebase = true;
        } else if arg.starts_with("--") {
            return Err(CliError::Usage(format!("Unknown flag: {arg}")));
        } else if patch.is_none() {
            patch = Some(arg);
        } else {
            return Err(CliError::Usage("Unexpected extra argument.".into()));
        }
    }
    let patch =
        patch.ok_or_else(|| CliError::Usage("First argument must be a patch array.".into()))?;
    Ok(CliArgs { patch, rebase })
}

// ── mendoza-apply ─────────────────────────────────────────────────────────

/// Applies the patch in `patch` (JSON text) to the document in `doc` and
/// returns the patched document as JSON text.
pub fn apply_patch_json(doc: &str, patch: &str, rebase: bool) -> Result<String, CliError> {
    let data: Json = serde_json::from_str(doc)?;
    let patch = RawPatch::from_json(patch)?;
    let input = wrap(data, ());
    let mut output = apply_patch(&input, &patch, ())?;
    if rebase {
        output = rebase_value(&input, &output);
    }
    Ok(serde_json::to_string(unwrap(&output))?)
}
