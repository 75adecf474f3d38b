use regex::Regex;
use thiserror::Error;

/// An error encountered while compiling a glob pattern.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("patterns cannot be empty")]
    Empty,
    #[error("unclosed character class in `{0}`")]
    UnclosedClass(String),
    #[error("unclosed alternation in `{0}`")]
    UnclosedAlternation(String),
    #[error("invalid pattern `{pattern}`: {message}")]
    Invalid { pattern: String, message: String },
}

/// A single compiled glob pattern, matched against `/`-separated relative
/// paths.
///
/// `*` and `?` never cross a path separator. `**` matches any run of
/// characters including separators, and `**/` at the start of a path segment
/// matches zero or more whole directories. Character classes (`[abc]`,
/// `[!a-z]`), alternations (`{rb,erb}`) and backslash escapes are supported.
///
/// Most patterns seen in practice (`**.rb`, `docs/**`, literal paths) are
/// matched with plain string operations; everything else is translated to a
/// regex.
#[derive(Debug, Clone)]
pub struct Pattern {
    glob: String,
    condition: MatchCondition,
}

impl Pattern {
    pub fn new(glob: &str) -> Result<Pattern, PatternError> {
        if glob.is_empty() {
            return Err(PatternError::Empty);
        }

        let tokens = Tokenizer::new(glob).tokenize()?;
        let condition = MatchCondition::new(glob, &tokens)?;
        Ok(Pattern {
            glob: glob.to_owned(),
            condition,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.glob
    }

    pub fn is_match(&self, candidate: &str) -> bool {
        self.condition.is_match(candidate)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Char(char),
    Star,
    Globstar,
    // `**/` at the start of a segment, zero or more directories
    GlobstarDir,
    AnyChar,
    Class { negated: bool, body: Vec<ClassMember> },
    Alternation(Vec<Vec<Token>>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ClassMember {
    Char(char),
    // An unescaped `-`, a range unless it is first or last
    Dash,
}

struct Tokenizer<'a> {
    source: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    fn new(source: &'a str) -> Self {
        Self { source, pos: 0 }
    }

    fn tokenize(mut self) -> Result<Vec<Token>, PatternError> {
        self.parse_sequence(true, false)
    }

    // Inside an alternation the sequence stops (without consuming) at an
    // unescaped `,` or `}`.
    fn parse_sequence(
        &mut self,
        mut segment_start: bool,
        in_group: bool,
    ) -> Result<Vec<Token>, PatternError> {
        let mut tokens = Vec::new();
        while let Some(c) = self.peek() {
            match c {
                ',' | '}' if in_group => break,
                '\\' => {
                    self.next();
                    // A trailing backslash matches itself
                    let escaped = self.next().unwrap_or('\\');
                    tokens.push(Token::Char(escaped));
                }
                '*' => {
                    let token = self.parse_stars(segment_start);
                    tokens.push(token);
                }
                '?' => {
                    self.next();
                    tokens.push(Token::AnyChar);
                }
                '[' => {
                    let token = self.parse_class()?;
                    tokens.push(token);
                }
                '{' => {
                    let token = self.parse_alternation(segment_start)?;
                    tokens.push(token);
                }
                _ => {
                    self.next();
                    tokens.push(Token::Char(c));
                }
            }
            segment_start = matches!(tokens.last(), Some(Token::Char('/') | Token::GlobstarDir));
        }
        Ok(tokens)
    }

    fn parse_stars(&mut self, segment_start: bool) -> Token {
        let mut count = 0;
        while self.peek() == Some('*') {
            self.next();
            count += 1;
        }

        if count == 1 {
            Token::Star
        } else if segment_start && self.peek() == Some('/') {
            self.next();
            Token::GlobstarDir
        } else {
            Token::Globstar
        }
    }

    fn parse_class(&mut self) -> Result<Token, PatternError> {
        self.next();
        let negated = matches!(self.peek(), Some('!' | '^'));
        if negated {
            self.next();
        }

        let mut body = Vec::new();
        // A `]` directly after the opening bracket is a member of the class
        if self.peek() == Some(']') {
            self.next();
            body.push(ClassMember::Char(']'));
        }
        let mut closed = false;
        while let Some(c) = self.next() {
            match c {
                ']' => {
                    closed = true;
                    break;
                }
                '\\' => {
                    if let Some(escaped) = self.next() {
                        body.push(ClassMember::Char(escaped));
                    }
                }
                '-' => body.push(ClassMember::Dash),
                _ => body.push(ClassMember::Char(c)),
            }
        }

        if !closed {
            return Err(PatternError::UnclosedClass(self.source.to_owned()));
        }
        Ok(Token::Class { negated, body })
    }

    fn parse_alternation(&mut self, segment_start: bool) -> Result<Token, PatternError> {
        self.next();
        let mut alternatives = Vec::new();
        loop {
            alternatives.push(self.parse_sequence(segment_start, true)?);
            match self.next() {
                Some(',') => continue,
                Some('}') => break,
                _ => return Err(PatternError::UnclosedAlternation(self.source.to_owned())),
            }
        }
        Ok(Token::Alternation(alternatives))
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn next(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }
}

#[derive(Debug, Clone)]
enum MatchCondition {
    Everything,
    Literal(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
    Regex(Regex),
}

impl MatchCondition {
    fn new(glob: &str, tokens: &[Token]) -> Result<Self, PatternError> {
        let (leading, rest) = match tokens.split_first() {
            Some((Token::Globstar, rest)) => (true, rest),
            _ => (false, tokens),
        };
        let (trailing, middle) = match rest.split_last() {
            Some((Token::Globstar, middle)) => (true, middle),
            _ => (false, rest),
        };

        if let Some(literal) = literal_text(middle) {
            if literal.is_empty() && (leading || trailing) {
                return Ok(Self::Everything);
            }
            return Ok(match (leading, trailing) {
                (false, false) => Self::Literal(literal),
                (false, true) => Self::Prefix(literal),
                (true, false) => Self::Suffix(literal),
                (true, true) => Self::Contains(literal),
            });
        }

        let mut regex = String::with_capacity(glob.len() + 16);
        regex.push_str(r"(?s)\A");
        push_tokens(&mut regex, tokens);
        regex.push_str(r"\z");
        Regex::new(&regex)
            .map(Self::Regex)
            .map_err(|err| PatternError::Invalid {
                pattern: glob.to_owned(),
                message: err.to_string(),
            })
    }

    fn is_match(&self, candidate: &str) -> bool {
        match self {
            Self::Everything => true,
            Self::Literal(literal) => candidate == literal,
            Self::Prefix(prefix) => candidate.starts_with(prefix.as_str()),
            Self::Suffix(suffix) => candidate.ends_with(suffix.as_str()),
            Self::Contains(needle) => {
                memchr::memmem::find(candidate.as_bytes(), needle.as_bytes()).is_some()
            }
            Self::Regex(re) => re.is_match(candidate),
        }
    }
}

fn literal_text(tokens: &[Token]) -> Option<String> {
    tokens
        .iter()
        .map(|token| match token {
            Token::Char(c) => Some(*c),
            _ => None,
        })
        .collect()
}

fn push_tokens(regex: &mut String, tokens: &[Token]) {
    for token in tokens {
        match token {
            Token::Char(c) => push_literal(regex, *c),
            Token::Star => regex.push_str("[^/]*"),
            Token::Globstar => regex.push_str(".*"),
            Token::GlobstarDir => regex.push_str("(?:.*/)?"),
            Token::AnyChar => regex.push_str("[^/]"),
            Token::Class { negated, body } => {
                regex.push('[');
                if *negated {
                    regex.push_str("^/");
                }
                for (idx, member) in body.iter().enumerate() {
                    match member {
                        ClassMember::Dash if idx > 0 && idx + 1 < body.len() => regex.push('-'),
                        ClassMember::Dash => push_literal(regex, '-'),
                        ClassMember::Char(c) => push_literal(regex, *c),
                    }
                }
                regex.push(']');
            }
            Token::Alternation(alternatives) => {
                regex.push_str("(?:");
                for (idx, alternative) in alternatives.iter().enumerate() {
                    if idx > 0 {
                        regex.push('|');
                    }
                    push_tokens(regex, alternative);
                }
                regex.push(')');
            }
        }
    }
}

fn push_literal(regex: &mut String, c: char) {
    if regex_syntax::is_meta_character(c) {
        regex.push('\\');
    }
    regex.push(c);
}
