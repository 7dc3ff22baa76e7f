//! Mapping manifest rows to destination paths and source URLs.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::download::WorkItem;
use crate::manifest::ManifestRow;

/// Longest file name, in characters, the planner will produce.
///
/// 255 is the ecryptfs limit; most filesystems allow at least that.
pub const MAX_FILENAME_LENGTH: usize = 255;

static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\-&,()\. ]").expect("static regex is valid"));

/// Replaces characters that are unsafe in file names with `_`.
///
/// Word characters, `-`, `&`, `,`, `(`, `)`, `.` and space are kept. The
/// result is trimmed of surrounding whitespace, then of periods at either
/// end, so no name becomes a hidden file.
#[must_use]
pub fn sanitize_path(name: &str) -> String {
    let replaced = UNSAFE_CHARS.replace_all(name, "_");
    replaced.trim().trim_matches('.').to_string()
}

/// Builds a file name from a description and a suffix.
///
/// The sanitized description is cut so the whole name stays within
/// [`MAX_FILENAME_LENGTH`] characters.
#[must_use]
pub fn build_filename(description: &str, suffix: &str) -> String {
    let budget = MAX_FILENAME_LENGTH.saturating_sub(suffix.chars().count());
    let mut name: String = sanitize_path(description).chars().take(budget).collect();
    name.push_str(suffix);
    name
}

/// Turns manifest rows into work items.
#[derive(Debug, Clone)]
pub struct PathPlanner {
    sounds_root: PathBuf,
    base_url: String,
}

impl PathPlanner {
    /// Creates a planner placing files under `sounds_root` and fetching from
    /// `base_url` + row location.
    #[must_use]
    pub fn new(sounds_root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            sounds_root: sounds_root.into(),
            base_url: base_url.into(),
        }
    }

    /// Root directory of the planned layout.
    #[must_use]
    pub fn sounds_root(&self) -> &Path {
        &self.sounds_root
    }

    /// Destination path for a row.
    #[must_use]
    pub fn destination(&self, row: &ManifestRow) -> PathBuf {
        let folder = sanitize_path(&row.cd_name);
        let suffix = format!(" - {}", row.location);
        self.sounds_root
            .join(folder)
            .join(build_filename(&row.description, &suffix))
    }

    /// Source URL for a row.
    #[must_use]
    pub fn source(&self, row: &ManifestRow) -> String {
        format!("{}{}", self.base_url, row.location)
    }

    /// Plans a single row.
    #[must_use]
    pub fn plan(&self, row: &ManifestRow) -> WorkItem {
        WorkItem::new(self.source(row), self.destination(row))
    }

    /// Plans every row, keeping manifest order.
    #[must_use]
    pub fn plan_all(&self, rows: &[ManifestRow]) -> Vec<WorkItem> {
        rows.iter().map(|row| self.plan(row)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cd: &str, description: &str, location: &str) -> ManifestRow {
        ManifestRow {
            cd_name: cd.to_string(),
            description: description.to_string(),
            location: location.to_string(),
        }
    }

    #[test]
    fn sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize_path("A/B: Test*?"), "A_B_ Test__");
        assert_eq!(sanitize_path("Rock & Roll (Live), pt.2"), "Rock & Roll (Live), pt.2");
    }

    #[test]
    fn sanitize_trims_whitespace_and_periods() {
        assert_eq!(sanitize_path("  Owl hoots.  "), "Owl hoots");
        assert_eq!(sanitize_path("Wind..."), "Wind");
        assert_eq!(sanitize_path("..."), "");
        assert_eq!(sanitize_path("...and then silence"), "and then silence");
        assert_eq!(sanitize_path(" .hidden. "), "hidden");
        assert_eq!(sanitize_path("Car 2.5 litre"), "Car 2.5 litre");
    }

    #[test]
    fn sanitize_keeps_unicode_word_characters() {
        assert_eq!(sanitize_path("Café crème"), "Café crème");
        assert_eq!(sanitize_path("tab\there"), "tab_here");
    }

    #[test]
    fn filename_with_suffix() {
        assert_eq!(build_filename("A/B: Test*?", " - 001.wav"), "A_B_ Test__ - 001.wav");
    }

    #[test]
    fn long_description_is_truncated() {
        let suffix = " - 07076051.wav";
        let name = build_filename(&"x".repeat(400), suffix);
        assert_eq!(name.chars().count(), MAX_FILENAME_LENGTH);
        assert!(name.ends_with(suffix));
    }

    #[test]
    fn plan_builds_destination_and_url() {
        let planner = PathPlanner::new("sounds", "http://host/assets/");
        let item = planner.plan(&row("Birds: Vol 1", "Robin song.", "07076051.wav"));

        assert_eq!(item.source_location(), "http://host/assets/07076051.wav");
        assert_eq!(
            item.destination_path(),
            Path::new("sounds/Birds_ Vol 1/Robin song - 07076051.wav")
        );
    }

    #[test]
    fn plan_all_keeps_order() {
        let planner = PathPlanner::new("out", "http://h/");
        let items = planner.plan_all(&[row("a", "one", "1.wav"), row("b", "two", "2.wav")]);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].source_location(), "http://h/1.wav");
        assert_eq!(items[1].source_location(), "http://h/2.wav");
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn filename_never_exceeds_limit(description in ".{0,600}", location in "[0-9]{1,12}\\.wav") {
                let suffix = format!(" - {location}");
                let name = build_filename(&description, &suffix);
                prop_assert!(name.chars().count() <= MAX_FILENAME_LENGTH);
                prop_assert!(name.ends_with(&suffix));
            }

            #[test]
            fn sanitized_names_have_no_separators(name in ".{0,200}") {
                let clean = sanitize_path(&name);
                prop_assert!(!clean.contains('/'));
                prop_assert!(!clean.contains('\\'));
                prop_assert!(!clean.ends_with('.'));
                prop_assert!(!clean.starts_with('.'));
            }
        }
    }
}
