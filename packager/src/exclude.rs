//! Top-level exclusion rules for the base archive.
//!
//! Names are matched against the immediate children of the project root only.
//! An excluded directory drops its whole subtree; nested entries that happen
//! to share an excluded name are kept.

/// Entries that never belong in a distributable project template.
pub const DEFAULT_EXCLUDES: [&str; 13] = [
    "Binaries",
    "Build",
    "Intermediate",
    "Saved",
    "DerivedDataCache",
    ".git",
    ".gitattributes",
    ".gitignore",
    ".github",
    ".gitlab",
    ".vs",
    ".idea",
    "__pycache__",
];

/// Ordered, de-duplicated set of top-level entry names to omit.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExcludeSet {
    names: Vec<String>,
}

impl ExcludeSet {
    /// Creates an empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self { names: Vec::new() }
    }

    /// Creates a set seeded with [`DEFAULT_EXCLUDES`].
    ///
    /// # Examples
    ///
    /// ```
    /// use uepack_packager::exclude::ExcludeSet;
    ///
    /// let mut excludes = ExcludeSet::with_defaults();
    /// excludes.extend(["Docs", "Saved"]);
    /// assert!(excludes.contains("Docs"));
    /// assert_eq!(excludes.iter().filter(|name| *name == "Saved").count(), 1);
    /// ```
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut set = Self::empty();
        set.extend(DEFAULT_EXCLUDES);
        set
    }

    /// Adds a name, ignoring blanks and names already present.
    pub fn insert(&mut self, name: &str) {
        let trimmed = name.trim();
        if trimmed.is_empty() || self.contains(trimmed) {
            return;
        }
        self.names.push(trimmed.to_owned());
    }

    /// Unions caller-supplied names into the set.
    pub fn extend<I, S>(&mut self, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.insert(name.as_ref());
        }
    }

    /// Returns true when `name` is excluded.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.names.iter().any(|candidate| candidate == name)
    }

    /// Iterates the names in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Returns the number of names.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.names.len()
    }

    /// Returns true when nothing is excluded.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for ExcludeSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::empty();
        set.extend(iter);
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn defaults_cover_build_artifacts_and_vcs() {
        let set = ExcludeSet::with_defaults();
        for name in ["Binaries", "Intermediate", "Saved", "DerivedDataCache", ".git"] {
            assert!(set.contains(name), "missing default {name}");
        }
        assert_eq!(set.len(), DEFAULT_EXCLUDES.len());
    }

    #[test]
    fn extend_keeps_defaults_first_and_skips_duplicates() {
        let mut set = ExcludeSet::with_defaults();
        set.extend(["Docs", "Binaries", "Docs"]);

        let names: Vec<&str> = set.iter().collect();
        assert_eq!(names.first(), Some(&"Binaries"));
        assert_eq!(names.last(), Some(&"Docs"));
        assert_eq!(set.len(), DEFAULT_EXCLUDES.len() + 1);
    }

    #[rstest]
    #[case::blank("")]
    #[case::whitespace("   ")]
    fn blank_names_are_ignored(#[case] name: &str) {
        let mut set = ExcludeSet::empty();
        set.insert(name);
        assert!(set.is_empty());
    }

    #[test]
    fn matching_is_exact() {
        let set: ExcludeSet = ["Saved"].into_iter().collect();
        assert!(set.contains("Saved"));
        assert!(!set.contains("saved"));
        assert!(!set.contains("Saved/Logs"));
    }
}
