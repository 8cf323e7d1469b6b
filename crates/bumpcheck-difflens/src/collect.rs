//! Selection and bounding of dependency-file diffs.

use bumpcheck_core::{ChangedFile, FileDiff};

use crate::classify::classify;

/// Maximum characters of a single file's diff passed on to the prompt.
pub const MAX_DIFF_CHARS: usize = 2000;

/// Appended to a diff that was cut at [`MAX_DIFF_CHARS`].
pub const DIFF_TRUNCATION_MARKER: &str = "\n... (diff truncated)";

/// Output of [`collect`].
///
/// # Examples
///
/// ```
/// use bumpcheck_difflens::collect::Collected;
///
/// let collected = Collected { files_seen: 3, diffs: vec![] };
/// assert!(collected.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Collected {
    /// Total number of changed files inspected.
    pub files_seen: usize,
    /// Retained dependency diffs, in input order.
    pub diffs: Vec<FileDiff>,
}

impl Collected {
    /// `true` when no dependency file was retained.
    pub fn is_empty(&self) -> bool {
        self.diffs.is_empty()
    }
}

/// Keep the dependency files that have a patch, bounding each diff.
///
/// Order is preserved and duplicates are kept. An empty result is a normal
/// outcome, not an error.
///
/// # Examples
///
/// ```
/// use bumpcheck_core::ChangedFile;
/// use bumpcheck_difflens::collect::collect;
///
/// let files = vec![
///     ChangedFile::new("README.md", Some("+docs".into())),
///     ChangedFile::new("go.mod", Some("-v1.2.0\n+v2.0.0".into())),
///     ChangedFile::new("go.sum", None),
/// ];
/// let collected = collect(&files);
/// assert_eq!(collected.files_seen, 3);
/// assert_eq!(collected.diffs.len(), 1);
/// assert_eq!(collected.diffs[0].file_name, "go.mod");
/// ```
pub fn collect(files: &[ChangedFile]) -> Collected {
    tracing::info!(files = files.len(), "processing changed files");

    let mut diffs = Vec::new();
    for file in files {
        let Some(patch) = &file.patch else {
            tracing::debug!(file = %file.name, "no patch available, skipping");
            continue;
        };
        let Some(kind) = classify(&file.name) else {
            continue;
        };

        tracing::info!(file = %file.name, %kind, "collecting diff");
        diffs.push(FileDiff {
            file_name: file.name.clone(),
            diff_text: truncate_diff(patch),
        });
    }

    tracing::info!(
        dependency_files = diffs.len(),
        total_files = files.len(),
        "found {} dependency-related file(s) out of {} total file(s)",
        diffs.len(),
        files.len(),
    );

    Collected {
        files_seen: files.len(),
        diffs,
    }
}

/// Bound a diff to [`MAX_DIFF_CHARS`] characters, marking any cut.
///
/// Applying it to its own output changes nothing.
///
/// # Examples
///
/// ```
/// use bumpcheck_difflens::collect::{truncate_diff, DIFF_TRUNCATION_MARKER, MAX_DIFF_CHARS};
///
/// let long = "+".repeat(MAX_DIFF_CHARS + 10);
/// let cut = truncate_diff(&long);
/// assert!(cut.ends_with(DIFF_TRUNCATION_MARKER));
/// assert_eq!(truncate_diff(&cut), cut);
/// assert_eq!(truncate_diff("+short"), "+short");
/// ```
pub fn truncate_diff(diff: &str) -> String {
    match truncate_chars(diff, MAX_DIFF_CHARS) {
        Some(head) => format!("{head}{DIFF_TRUNCATION_MARKER}"),
        None => diff.to_string(),
    }
}

/// Return the first `max` characters of `text` if it is longer than that.
///
/// Cuts on a character boundary, never inside a UTF-8 sequence.
///
/// # Examples
///
/// ```
/// use bumpcheck_difflens::collect::truncate_chars;
///
/// assert_eq!(truncate_chars("héllo", 2), Some("hé"));
/// assert_eq!(truncate_chars("hi", 2), None);
/// ```
pub fn truncate_chars(text: &str, max: usize) -> Option<&str> {
    text.char_indices().nth(max).map(|(idx, _)| &text[..idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, patch: Option<&str>) -> ChangedFile {
        ChangedFile::new(name, patch.map(str::to_string))
    }

    #[test]
    fn keeps_only_dependency_files_with_patches() {
        let files = vec![
            file("README.md", Some("+hello")),
            file("go.mod", Some("-v1.2.0\n+v2.0.0")),
            file("package.json", None),
            file("src/main.go", Some("+func main() {}")),
        ];
        let collected = collect(&files);
        assert_eq!(collected.files_seen, 4);
        assert_eq!(collected.diffs.len(), 1);
        assert_eq!(collected.diffs[0].file_name, "go.mod");
        assert_eq!(collected.diffs[0].diff_text, "-v1.2.0\n+v2.0.0");
    }

    #[test]
    fn empty_when_nothing_matches() {
        let collected = collect(&[file("docs/readme.md", Some("+x"))]);
        assert!(collected.is_empty());
        assert_eq!(collected.files_seen, 1);
    }

    #[test]
    fn empty_input() {
        let collected = collect(&[]);
        assert!(collected.is_empty());
        assert_eq!(collected.files_seen, 0);
    }

    #[test]
    fn preserves_order_and_duplicates() {
        let files = vec![
            file("yarn.lock", Some("a")),
            file("Dockerfile", Some("b")),
            file("yarn.lock", Some("c")),
        ];
        let names: Vec<String> = collect(&files)
            .diffs
            .into_iter()
            .map(|d| d.file_name)
            .collect();
        assert_eq!(names, vec!["yarn.lock", "Dockerfile", "yarn.lock"]);
    }

    #[test]
    fn long_diff_is_truncated_with_marker() {
        let patch = "x".repeat(MAX_DIFF_CHARS * 2);
        let collected = collect(&[file("Cargo.lock", Some(&patch))]);
        let text = &collected.diffs[0].diff_text;
        assert!(text.ends_with(DIFF_TRUNCATION_MARKER));
        assert_eq!(
            text.chars().count(),
            MAX_DIFF_CHARS + DIFF_TRUNCATION_MARKER.chars().count()
        );
    }

    #[test]
    fn diff_at_limit_is_untouched() {
        let patch = "y".repeat(MAX_DIFF_CHARS);
        assert_eq!(truncate_diff(&patch), patch);
    }

    #[test]
    fn truncation_is_stable() {
        let patch = "z".repeat(MAX_DIFF_CHARS + 1);
        let once = truncate_diff(&patch);
        let twice = truncate_diff(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn truncation_respects_multibyte_chars() {
        let patch = "é".repeat(MAX_DIFF_CHARS + 5);
        let cut = truncate_diff(&patch);
        let head = cut.strip_suffix(DIFF_TRUNCATION_MARKER).unwrap();
        assert_eq!(head.chars().count(), MAX_DIFF_CHARS);
        assert!(head.chars().all(|c| c == 'é'));
    }

    #[test]
    fn truncate_chars_boundaries() {
        assert_eq!(truncate_chars("", 0), None);
        assert_eq!(truncate_chars("abc", 0), Some(""));
        assert_eq!(truncate_chars("abc", 3), None);
        assert_eq!(truncate_chars("abcd", 3), Some("abc"));
    }
}
