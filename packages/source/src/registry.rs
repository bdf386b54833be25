//! Source registry. Loads every dataset definition from embedded TOML.
//!
//! Each `.toml` file in `packages/source/sources/` is baked into the binary
//! at compile time via [`include_str!`].

use conflict_map_event_models::EventCategory;

use crate::SourceError;
use crate::source_def::{SourceDefinition, parse_source_toml};

/// TOML configs embedded at compile time.
const SOURCE_TOMLS: &[(&str, &str)] = &[
    ("battles", include_str!("../sources/battles.toml")),
    ("explosions", include_str!("../sources/explosions.toml")),
];

/// Parses every embedded dataset definition.
///
/// # Errors
///
/// Returns [`SourceError::Normalization`] naming the file whose TOML does
/// not parse.
pub fn all_sources() -> Result<Vec<SourceDefinition>, SourceError> {
    SOURCE_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_source_toml(toml).map_err(|e| SourceError::Normalization {
                message: format!("Failed to parse {name}.toml: {e}"),
            })
        })
        .collect()
}

/// The dataset definition for `category`, if one is registered.
///
/// # Errors
///
/// Returns [`SourceError`] if an embedded definition does not parse.
pub fn source_for(category: EventCategory) -> Result<Option<SourceDefinition>, SourceError> {
    Ok(all_sources()?.into_iter().find(|s| s.category == category))
}
