//! Version label normalisation and archive naming.
//!
//! Version labels look like `UE 5.4`. The manifest receives the label without
//! its `UE` prefix (`5.4`); file names receive a token with punctuation
//! flattened to underscores (`5_4`).
//!
//! Archive names come from a small pattern language with two placeholders,
//! `{project}` and `{ueversion}`. Literal braces are written `{{` and `}}`.
//! A pattern that cannot be rendered falls back to
//! [`uepack::DEFAULT_NAME_PATTERN`].

use camino::Utf8Path;
use thiserror::Error;

/// Prefix removed from version labels.
pub const VERSION_LABEL_PREFIX: &str = "UE";

/// Extension appended to every produced archive.
pub const ARCHIVE_EXTENSION: &str = "zip";

/// Project name used when the source directory has no usable name.
pub const FALLBACK_PROJECT_NAME: &str = "Project";

/// Reasons a naming pattern cannot be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    /// A `{...}` placeholder other than `{project}` or `{ueversion}`.
    #[error("unknown placeholder {{{name}}}")]
    UnknownPlaceholder {
        /// Text between the braces.
        name: String,
    },

    /// A `{` without a matching `}`.
    #[error("unclosed '{{' in pattern")]
    UnclosedBrace,

    /// A lone `}` outside a placeholder.
    #[error("single '}}' encountered in pattern")]
    UnmatchedClosingBrace,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Project,
    Version,
}

/// A parsed naming pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePattern {
    segments: Vec<Segment>,
}

impl NamePattern {
    /// Parses `pattern`.
    ///
    /// # Errors
    ///
    /// Returns a [`PatternError`] for unknown placeholders or unbalanced
    /// braces.
    ///
    /// # Examples
    ///
    /// ```
    /// use uepack_packager::naming::NamePattern;
    ///
    /// let pattern = NamePattern::parse("{project}-UE{ueversion}")?;
    /// assert_eq!(pattern.render("MyGame", "5_4"), "MyGame-UE5_4");
    /// assert!(NamePattern::parse("{project}_{date}").is_err());
    /// # Ok::<(), uepack_packager::naming::PatternError>(())
    /// ```
    pub fn parse(pattern: &str) -> Result<Self, PatternError> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = pattern.chars().peekable();

        while let Some(ch) = chars.next() {
            match ch {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') | None => return Err(PatternError::UnclosedBrace),
                            Some(other) => name.push(other),
                        }
                    }
                    let segment = match name.as_str() {
                        "project" => Segment::Project,
                        "ueversion" => Segment::Version,
                        _ => return Err(PatternError::UnknownPlaceholder { name }),
                    };
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(segment);
                }
                '}' => return Err(PatternError::UnmatchedClosingBrace),
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }
        Ok(Self { segments })
    }

    /// Renders the pattern for one project and version token.
    #[must_use]
    pub fn render(&self, project: &str, version_token: &str) -> String {
        self.segments
            .iter()
            .map(|segment| match segment {
                Segment::Literal(text) => text.as_str(),
                Segment::Project => project,
                Segment::Version => version_token,
            })
            .collect()
    }
}

/// An archive file name together with the pattern problem that forced the
/// default pattern, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveName {
    /// File name including the `.zip` extension.
    pub file_name: String,
    /// Set when the requested pattern was rejected.
    pub fallback: Option<PatternError>,
}

/// Removes surrounding whitespace and the `UE` prefix from a version label.
///
/// # Examples
///
/// ```
/// use uepack_packager::naming::engine_association;
///
/// assert_eq!(engine_association("UE 5.4"), "5.4");
/// assert_eq!(engine_association(" UE5.6 "), "5.6");
/// assert_eq!(engine_association("5.3"), "5.3");
/// ```
#[must_use]
pub fn engine_association(label: &str) -> &str {
    let trimmed = label.trim();
    trimmed
        .strip_prefix(VERSION_LABEL_PREFIX)
        .unwrap_or(trimmed)
        .trim()
}

/// Derives the file-name token for a version label: the engine association
/// with ASCII punctuation and whitespace replaced by `_`.
///
/// # Examples
///
/// ```
/// use uepack_packager::naming::version_token;
///
/// assert_eq!(version_token("UE 5.4"), "5_4");
/// ```
#[must_use]
pub fn version_token(label: &str) -> String {
    engine_association(label)
        .chars()
        .map(|ch| {
            if ch.is_ascii_punctuation() || ch.is_whitespace() {
                '_'
            } else {
                ch
            }
        })
        .collect()
}

/// Returns the project name used in archive names: the final component of
/// `source_dir`, or `"Project"` when it has none.
#[must_use]
pub fn project_name(source_dir: &Utf8Path) -> String {
    source_dir
        .file_name()
        .filter(|name| !name.is_empty())
        .unwrap_or(FALLBACK_PROJECT_NAME)
        .to_owned()
}

/// Renders `pattern` for a project and version label, falling back to the
/// default pattern when `pattern` is invalid.
#[must_use]
pub fn archive_file_name(pattern: &str, project: &str, version_label: &str) -> ArchiveName {
    let token = version_token(version_label);
    let (stem, fallback) = NamePattern::parse(pattern).map_or_else(
        |err| (format!("{project}_{token}"), Some(err)),
        |parsed| (parsed.render(project, &token), None),
    );
    ArchiveName {
        file_name: format!("{stem}.{ARCHIVE_EXTENSION}"),
        fallback,
    }
}

/// Lists the archive file names a build of `source_dir` would produce for
/// `labels`, in order.
#[must_use]
pub fn preview<S: AsRef<str>>(source_dir: &Utf8Path, pattern: &str, labels: &[S]) -> Vec<String> {
    let project = project_name(source_dir);
    labels
        .iter()
        .map(|label| archive_file_name(pattern, &project, label.as_ref()).file_name)
        .collect()
}
