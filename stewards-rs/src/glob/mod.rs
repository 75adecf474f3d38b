mod pattern;

use std::{
    collections::BTreeSet,
    fmt,
    hash::{Hash, Hasher},
};

use serde::{ser::SerializeStruct, Serialize, Serializer};

pub use self::pattern::{Pattern, PatternError};

/// The jurisdiction of one owner declaration: a set of include patterns and a
/// set of exclude patterns, matched against paths relative to the directory
/// of the stewards file that declared them.
///
/// - a path matching any exclude pattern is never included;
/// - otherwise, with no include patterns every path is included;
/// - otherwise a path is included when it matches at least one include
///   pattern.
///
/// Two filters are equal when their include and exclude pattern sets are
/// equal, regardless of the order the patterns were declared in.
#[derive(Clone, Default)]
pub struct GlobFilter {
    include: Vec<Pattern>,
    exclude: Vec<Pattern>,
}

impl GlobFilter {
    /// Compile a filter from include and exclude patterns. Duplicate patterns
    /// are collapsed.
    pub fn new<I, E>(include: I, exclude: E) -> Result<GlobFilter, PatternError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        Ok(GlobFilter {
            include: compile(include)?,
            exclude: compile(exclude)?,
        })
    }

    /// A filter with no patterns, including every path.
    pub fn everything() -> GlobFilter {
        GlobFilter::default()
    }

    pub fn matches(&self, path: &str) -> bool {
        if self.exclude.iter().any(|pattern| pattern.is_match(path)) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|pattern| pattern.is_match(path))
    }

    pub fn include_patterns(&self) -> impl Iterator<Item = &str> {
        self.include.iter().map(Pattern::as_str)
    }

    pub fn exclude_patterns(&self) -> impl Iterator<Item = &str> {
        self.exclude.iter().map(Pattern::as_str)
    }

    /// Whether the filter declares no patterns at all.
    pub fn is_unrestricted(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }
}

// Patterns are kept sorted and deduplicated so that comparing and hashing the
// pattern strings in order is a set comparison.
fn compile<P>(patterns: P) -> Result<Vec<Pattern>, PatternError>
where
    P: IntoIterator,
    P::Item: AsRef<str>,
{
    let globs = patterns
        .into_iter()
        .map(|p| p.as_ref().to_owned())
        .collect::<BTreeSet<_>>();
    globs.iter().map(|glob| Pattern::new(glob)).collect()
}

impl PartialEq for GlobFilter {
    fn eq(&self, other: &Self) -> bool {
        self.include_patterns().eq(other.include_patterns())
            && self.exclude_patterns().eq(other.exclude_patterns())
    }
}

impl Eq for GlobFilter {}

impl Hash for GlobFilter {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for pattern in self.include_patterns() {
            pattern.hash(state);
        }
        // Separates the two sets so ([a], []) and ([], [a]) hash differently
        state.write_u8(0xff);
        for pattern in self.exclude_patterns() {
            pattern.hash(state);
        }
    }
}

impl fmt::Debug for GlobFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GlobFilter")
            .field("include", &self.include_patterns().collect::<Vec<_>>())
            .field("exclude", &self.exclude_patterns().collect::<Vec<_>>())
            .finish()
    }
}

impl Serialize for GlobFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("GlobFilter", 2)?;
        state.serialize_field("include", &self.include_patterns().collect::<Vec<_>>())?;
        state.serialize_field("exclude", &self.exclude_patterns().collect::<Vec<_>>())?;
        state.end()
    }
}
