use serde_yaml::Value;
use thiserror::Error;

use crate::glob::GlobFilter;

/// Parse a stewards file with the default section and owner keys.
pub fn parse(source: &str) -> Result<GoverningFile, ParseError> {
    parse_with(source, &ParserOptions::default())
}

/// Parse a stewards file.
///
/// The file is a YAML mapping whose `stewards` (or `owners`) key holds a list
/// of declarations. Each declaration is either a bare owner identifier, or a
/// mapping with the owner identifier and optional `include` / `exclude`
/// patterns, each a single pattern or a list of them:
///
/// ```yaml
/// stewards:
///   - alice
///   - github_username: bob
///     include: "**.rb"
///     exclude: ["**.txt", "vendor/**"]
/// ```
pub fn parse_with(source: &str, options: &ParserOptions) -> Result<GoverningFile, ParseError> {
    if source.trim().is_empty() {
        return Err(ParseError::Empty);
    }

    let document: Value =
        serde_yaml::from_str(source).map_err(|err| ParseError::Syntax(err.to_string()))?;
    if !document.is_mapping() {
        return Err(ParseError::invalid("stewards file must contain a mapping"));
    }

    let mut declarations = Vec::new();
    for section in &options.owner_sections {
        match document.get(section.as_str()) {
            None | Some(Value::Null) => {}
            Some(Value::Sequence(entries)) => {
                for entry in entries {
                    declarations.push(parse_declaration(entry, options)?);
                }
            }
            Some(_) => {
                return Err(ParseError::invalid(format!("`{}` must be a list", section)));
            }
        }
    }

    Ok(GoverningFile { declarations })
}

fn parse_declaration(
    entry: &Value,
    options: &ParserOptions,
) -> Result<OwnerDeclaration, ParseError> {
    match entry {
        Value::Mapping(_) => {
            let owner = options
                .owner_keys
                .iter()
                .find_map(|key| entry.get(key.as_str()).and_then(owner_identifier))
                .ok_or_else(|| ParseError::missing_owner(options))?;

            let include = patterns(entry, "include")?;
            let exclude = patterns(entry, "exclude")?;
            let filter = GlobFilter::new(include, exclude).map_err(|err| {
                ParseError::invalid(format!("invalid pattern for {}: {}", owner, err))
            })?;

            Ok(OwnerDeclaration { owner, filter })
        }
        _ => match owner_identifier(entry) {
            Some(owner) => Ok(OwnerDeclaration::new(owner)),
            None if matches!(entry, Value::String(_) | Value::Null) => {
                Err(ParseError::missing_owner(options))
            }
            None => Err(ParseError::invalid("declarations must be an owner or a mapping")),
        },
    }
}

fn owner_identifier(value: &Value) -> Option<String> {
    let owner = match value {
        Value::String(s) => s.trim().to_owned(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    if owner.is_empty() {
        None
    } else {
        Some(owner)
    }
}

// Blank patterns are dropped, so `exclude: ""` excludes nothing.
fn patterns(entry: &Value, key: &str) -> Result<Vec<String>, ParseError> {
    let patterns = match entry.get(key) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(pattern)) => vec![pattern.clone()],
        Some(Value::Sequence(values)) => values
            .iter()
            .map(|value| match value {
                Value::String(pattern) => Ok(pattern.clone()),
                _ => Err(ParseError::invalid(format!(
                    "`{}` must contain only patterns",
                    key
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?,
        Some(_) => {
            return Err(ParseError::invalid(format!(
                "`{}` must be a pattern or a list of patterns",
                key
            )))
        }
    };

    Ok(patterns
        .into_iter()
        .filter(|pattern| !pattern.trim().is_empty())
        .collect())
}

/// Keys recognised when parsing a stewards file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParserOptions {
    /// Top-level keys holding the declaration list. Declarations under every
    /// present key are read, in this order.
    pub owner_sections: Vec<String>,
    /// Keys naming the owner inside a mapping declaration. The first present,
    /// non-blank key wins.
    pub owner_keys: Vec<String>,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            owner_sections: vec!["owners".to_owned(), "stewards".to_owned()],
            owner_keys: vec!["owner".to_owned(), "github_username".to_owned()],
        }
    }
}

/// The declarations from one version of one stewards file, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoverningFile {
    pub declarations: Vec<OwnerDeclaration>,
}

impl GoverningFile {
    pub fn iter(&self) -> std::slice::Iter<'_, OwnerDeclaration> {
        self.declarations.iter()
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

impl IntoIterator for GoverningFile {
    type Item = OwnerDeclaration;
    type IntoIter = std::vec::IntoIter<OwnerDeclaration>;

    fn into_iter(self) -> Self::IntoIter {
        self.declarations.into_iter()
    }
}

/// One owner and the filter describing which paths under the stewards file's
/// directory they look after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerDeclaration {
    pub owner: String,
    pub filter: GlobFilter,
}

impl OwnerDeclaration {
    /// A declaration owning everything under the stewards file's directory.
    pub fn new(owner: impl Into<String>) -> OwnerDeclaration {
        OwnerDeclaration {
            owner: owner.into(),
            filter: GlobFilter::everything(),
        }
    }
}

/// An error encountered while parsing a stewards file. The whole file is
/// rejected; none of its declarations are used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("cannot parse empty file")]
    Empty,
    #[error("{0}")]
    InvalidStructure(String),
    #[error("failed parsing file: {0}")]
    Syntax(String),
}

impl ParseError {
    fn invalid(message: impl Into<String>) -> ParseError {
        ParseError::InvalidStructure(message.into())
    }

    fn missing_owner(options: &ParserOptions) -> ParseError {
        ParseError::invalid(format!(
            "missing required key: {}",
            options.owner_keys.join(" or ")
        ))
    }
}
