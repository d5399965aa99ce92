//! Agent name handling: alias normalization, effective-name computation,
//! and remote-name validation.

use crate::error::SyncError;

/// Normalize an arbitrary reference string into the identifier alphabet
/// accepted inside connected-agent tool entries.
///
/// Every character outside `[A-Za-z0-9_]` becomes `_`, runs of adjacent
/// replaced characters collapse to a single `_`, and a leading digit gains a
/// `_` prefix. Total for any input; the empty string normalizes to `"_"`.
pub fn normalize_alias(raw: &str) -> String {
    let trimmed = raw.trim();
    let mut out = String::with_capacity(trimmed.len());
    let mut last_replaced = false;
    for ch in trimmed.chars() {
        if ch.is_ascii_alphanumeric() || ch == '_' {
            out.push(ch);
            last_replaced = false;
        } else if !last_replaced {
            out.push('_');
            last_replaced = true;
        }
    }
    if out.is_empty() {
        return "_".to_string();
    }
    if out.as_bytes()[0].is_ascii_digit() {
        out.insert(0, '_');
    }
    out
}

/// Validate that a remote agent name contains only letters, numbers, and
/// hyphens. Applied to effective names (after prefix/suffix).
pub fn validate_agent_name(name: &str) -> Result<(), SyncError> {
    if name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
        Ok(())
    } else {
        Err(SyncError::ValidationError {
            agent: name.to_string(),
            reason: "only letters, numbers, and hyphens are allowed".to_string(),
        })
    }
}

/// Compute the remote name for a definition: `prefix + name + suffix`.
pub fn effective_agent_name(name: &str, prefix: &str, suffix: &str) -> String {
    format!("{}{}{}", prefix, name, suffix)
}

/// Strip prefix and suffix from a remote name when present.
pub fn trim_agent_name(name: &str, prefix: &str, suffix: &str) -> String {
    let trimmed = if !prefix.is_empty() {
        name.strip_prefix(prefix).unwrap_or(name)
    } else {
        name
    };
    let trimmed = if !suffix.is_empty() {
        trimmed.strip_suffix(suffix).unwrap_or(trimmed)
    } else {
        trimmed
    };
    trimmed.to_string()
}
