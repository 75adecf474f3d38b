use serde::Deserialize;

use crate::parser::ParserOptions;

/// Settings for a [`crate::Resolver`].
///
/// Deserializable so host applications can keep it in their own config
/// files; every field has a default.
///
/// ```yaml
/// governing_filename: OWNERS.yml
/// owner_sections: [owners]
/// parallel_fetch: true
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Basename of the stewards file looked for in every directory. Matched
    /// exactly and case-sensitively.
    pub governing_filename: String,
    /// Top-level keys holding the list of declarations.
    pub owner_sections: Vec<String>,
    /// Keys naming the owner in a mapping declaration.
    pub owner_keys: Vec<String>,
    /// Fetch stewards files concurrently. Only has an effect when the crate
    /// is built with the `rayon` feature.
    pub parallel_fetch: bool,
}

impl ResolverConfig {
    pub fn parser_options(&self) -> ParserOptions {
        ParserOptions {
            owner_sections: self.owner_sections.clone(),
            owner_keys: self.owner_keys.clone(),
        }
    }
}

impl Default for ResolverConfig {
    fn default() -> Self {
        let ParserOptions {
            owner_sections,
            owner_keys,
        } = ParserOptions::default();
        Self {
            governing_filename: "stewards.yml".to_owned(),
            owner_sections,
            owner_keys,
            parallel_fetch: false,
        }
    }
}
