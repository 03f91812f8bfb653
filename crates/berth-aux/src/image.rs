//! Image allow-list validation.
//!
//! The module declares source patterns; an auxiliary image must match at
//! least one. A pattern containing `*` is treated as a glob; a pattern
//! without a wildcard matches the exact repository, with or without an
//! explicit `:tag` suffix.

use regex::Regex;

use crate::error::{AuxError, AuxResult};

/// Compile one allow-list pattern into an anchored regex.
fn compile_pattern(pattern: &str) -> AuxResult<Regex> {
    let escaped = regex::escape(pattern);
    let source = if pattern.contains('*') {
        format!("^{}$", escaped.replace(r"\*", ".*"))
    } else {
        // An exact repository, optionally followed by a tag.
        format!("^{escaped}(:[^/]+)?$")
    };
    Regex::new(&source)
        .map_err(|e| AuxError::InvalidInput(format!("bad image pattern {pattern:?}: {e}")))
}

/// Check `image` against the module's allow-list.
///
/// No match is `InvalidInput`; nothing has been created at this point.
pub fn validate_image(patterns: &[String], image: &str) -> AuxResult<()> {
    for pattern in patterns {
        if compile_pattern(pattern)?.is_match(image) {
            return Ok(());
        }
    }
    Err(AuxError::InvalidInput(format!(
        "image {image:?} matches no allow-list pattern"
    )))
}
