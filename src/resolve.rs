use tracing::warn;

use crate::error::GeseError;
use crate::index::AliasMap;

/// Aliases are matched on the lower-cased input; an alias whose target is not
/// in `canonical` is rejected rather than returned.
pub fn resolve_species<S: AsRef<str>>(
    input: &str,
    canonical: &[S],
    aliases: &AliasMap,
) -> Result<String, GeseError> {
    if input.trim().is_empty() {
        return Err(GeseError::InvalidArgument(
            "species name must be a non-empty string".to_string(),
        ));
    }

    let lowered = input.to_lowercase();
    if let Some(target) = aliases.get(&lowered) {
        if canonical.iter().any(|name| name.as_ref() == target) {
            return Ok(target.to_string());
        }
        warn!(
            alias = %lowered,
            canonical = %target,
            "species alias points to a name missing from the index"
        );
        return Err(unknown(input, canonical));
    }

    // Canonical names the alias map does not list, e.g. "WHEATG" -> "wheatG".
    canonical
        .iter()
        .map(AsRef::as_ref)
        .find(|name| name.to_lowercase() == lowered)
        .map(str::to_string)
        .ok_or_else(|| unknown(input, canonical))
}

fn unknown<S: AsRef<str>>(input: &str, canonical: &[S]) -> GeseError {
    let mut available = canonical
        .iter()
        .map(|name| name.as_ref().to_string())
        .collect::<Vec<_>>();
    available.sort();
    GeseError::UnknownSpecies {
        input: input.to_string(),
        available,
    }
}
