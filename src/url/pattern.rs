//! Blacklist patterns and configuration-time lint
//!
//! Blacklist entries are regular expressions searched for in a URL path. An
//! entry that does not compile is kept as a literal substring so a single bad
//! pattern never takes the crawl down.

use super::ARTICLE_ID_DIGITS;
use regex::Regex;
use std::fmt;

/// File extensions that mark a path segment as a file name
const FILE_EXTENSIONS: &[&str] = &["html", "htm", "php", "asp", "aspx", "jsp", "cms"];

/// A compiled blacklist entry
#[derive(Debug, Clone)]
pub enum BlacklistPattern {
    /// Compiled regular expression, searched anywhere in the path
    Regex(Regex),
    /// Pattern that failed to compile, matched as a plain substring
    Literal(String),
}

impl BlacklistPattern {
    /// Compiles a pattern, falling back to a literal match on failure
    pub fn compile(pattern: &str) -> Self {
        match Regex::new(pattern) {
            Ok(regex) => Self::Regex(regex),
            Err(e) => {
                tracing::debug!("Pattern '{}' kept as literal: {}", pattern, e);
                Self::Literal(pattern.to_string())
            }
        }
    }

    /// Returns true if the pattern occurs in `path`
    pub fn is_match(&self, path: &str) -> bool {
        match self {
            Self::Regex(regex) => regex.is_match(path),
            Self::Literal(literal) => path.contains(literal.as_str()),
        }
    }

    /// The pattern as written in the configuration
    pub fn as_str(&self) -> &str {
        match self {
            Self::Regex(regex) => regex.as_str(),
            Self::Literal(literal) => literal,
        }
    }
}

/// Union of blacklist patterns; order carries no meaning
#[derive(Debug, Clone, Default)]
pub struct Blacklist {
    patterns: Vec<BlacklistPattern>,
}

impl Blacklist {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Self {
        Self {
            patterns: patterns
                .iter()
                .map(|p| BlacklistPattern::compile(p.as_ref()))
                .collect(),
        }
    }

    /// Returns the first pattern found in `path`, if any
    pub fn find(&self, path: &str) -> Option<&BlacklistPattern> {
        self.patterns.iter().find(|p| p.is_match(path))
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

/// What the lint found wrong with a pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternIssueKind {
    /// Not a valid regular expression; matched literally
    InvalidRegex,
    /// Same segment twice in a row, typically two entries run together
    RepeatedSegment,
    /// A file name followed by more path, typically two entries run together
    EmbeddedFileName,
    /// Contains a host name, which never occurs in a path
    HostInPath,
    /// Matches article URLs, either the suffix itself or articles filed
    /// under a blacklisted section; the article shape still wins
    OverlapsArticleShape,
    /// Every path it matches is already matched by the named entry
    Shadowed(String),
}

/// A lint finding for one blacklist entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternIssue {
    pub pattern: String,
    pub kind: PatternIssueKind,
}

impl PatternIssueKind {
    /// True for findings that point at a broken entry rather than at
    /// scope precedence
    pub fn is_malformed(&self) -> bool {
        !matches!(self, Self::OverlapsArticleShape)
    }
}

impl fmt::Display for PatternIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            PatternIssueKind::InvalidRegex => {
                write!(f, "'{}' is not a valid regex; matching it literally", self.pattern)
            }
            PatternIssueKind::RepeatedSegment => write!(
                f,
                "'{}' repeats a path segment; it may be two entries missing a separator",
                self.pattern
            ),
            PatternIssueKind::EmbeddedFileName => write!(
                f,
                "'{}' continues after a file name; it may be two entries missing a separator",
                self.pattern
            ),
            PatternIssueKind::HostInPath => write!(
                f,
                "'{}' contains a host name and can never match a path",
                self.pattern
            ),
            PatternIssueKind::OverlapsArticleShape => write!(
                f,
                "'{}' also matches article URLs; article URLs ignore the blacklist",
                self.pattern
            ),
            PatternIssueKind::Shadowed(by) => {
                write!(f, "'{}' is redundant with '{}'", self.pattern, by)
            }
        }
    }
}

/// Lints blacklist entries without changing how they are applied
///
/// # Arguments
///
/// * `patterns` - Blacklist entries as written in the configuration
/// * `article_suffix` - Literal suffix of article URLs
///
/// # Returns
///
/// One finding per (pattern, problem) pair, in configuration order
pub fn lint_blacklist<S: AsRef<str>>(patterns: &[S], article_suffix: &str) -> Vec<PatternIssue> {
    let article_tail = format!("-{}{}", "0".repeat(ARTICLE_ID_DIGITS), article_suffix);
    let mut issues = Vec::new();

    for raw in patterns {
        let pattern = raw.as_ref();
        let mut push = |kind| {
            issues.push(PatternIssue {
                pattern: pattern.to_string(),
                kind,
            })
        };

        let compiled = BlacklistPattern::compile(pattern);
        if matches!(compiled, BlacklistPattern::Literal(_)) {
            push(PatternIssueKind::InvalidRegex);
        }

        let text = unescape_dots(pattern);
        let segments: Vec<&str> = text.split('/').filter(|s| !s.is_empty()).collect();

        if segments.windows(2).any(|pair| pair[0] == pair[1]) {
            push(PatternIssueKind::RepeatedSegment);
        }

        if segments.len() > 1
            && segments[..segments.len() - 1]
                .iter()
                .any(|s| is_file_name(s))
        {
            push(PatternIssueKind::EmbeddedFileName);
        }

        if segments.iter().any(|s| is_host_name(s)) {
            push(PatternIssueKind::HostInPath);
        }

        let section_article = format!("{}/x{}", text, article_tail);
        if compiled.is_match(&article_tail)
            || (is_plain(pattern) && compiled.is_match(&section_article))
        {
            push(PatternIssueKind::OverlapsArticleShape);
        }

        if is_plain(pattern) {
            let shadowed_by = patterns.iter().map(|p| p.as_ref()).find(|other| {
                *other != pattern && is_plain(other) && text.contains(&unescape_dots(other))
            });
            if let Some(by) = shadowed_by {
                push(PatternIssueKind::Shadowed(by.to_string()));
            }
        }
    }

    issues
}

fn unescape_dots(pattern: &str) -> String {
    pattern.replace("\\.", ".")
}

/// True when the pattern has no regex syntax beyond escaped dots
fn is_plain(pattern: &str) -> bool {
    !unescape_dots(pattern)
        .chars()
        .any(|c| "\\^$*+?()[]{}|".contains(c))
}

fn extension(segment: &str) -> Option<&str> {
    segment.rsplit_once('.').map(|(_, ext)| ext)
}

fn is_file_name(segment: &str) -> bool {
    extension(segment)
        .map(|ext| FILE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

fn is_host_name(segment: &str) -> bool {
    let labels: Vec<&str> = segment.split('.').collect();
    let tld = labels.last().copied().unwrap_or_default();

    labels.len() >= 2
        && labels.iter().all(|l| !l.is_empty())
        && (2..=6).contains(&tld.len())
        && tld.chars().all(|c| c.is_ascii_alphabetic())
        && !is_file_name(segment)
}
