//! Output file naming.

use chrono::NaiveDateTime;

use crate::config::{ExportFormat, StatusFilter};

/// Prefix shared by every export file.
pub const FILE_PREFIX: &str = "asana_tasks";

/// Slug used when a project name has no alphanumeric characters.
const EMPTY_SLUG: &str = "project";

/// Filesystem-safe form of a project name.
///
/// Lowercases, collapses every run of non-alphanumeric characters into a
/// single `_` and trims underscores from both ends.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_sep = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_sep && !slug.is_empty() {
                slug.push('_');
            }
            pending_sep = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_sep = true;
        }
    }

    if slug.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        slug
    }
}

/// Where and under what name one project's export is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTarget {
    /// Project slug.
    pub slug: String,
    /// Status label and timestamp, when the timestamped scheme is used.
    pub stamp: Option<(StatusFilter, NaiveDateTime)>,
}

impl ExportTarget {
    /// `asana_tasks_<slug>.<ext>`.
    #[must_use]
    pub fn plain(project_name: &str) -> Self {
        Self {
            slug: slugify(project_name),
            stamp: None,
        }
    }

    /// `asana_tasks_<slug>_<status>_<YYYYmmdd_HHMMSS>.<ext>`.
    #[must_use]
    pub fn stamped(project_name: &str, status: StatusFilter, at: NaiveDateTime) -> Self {
        Self {
            slug: slugify(project_name),
            stamp: Some((status, at)),
        }
    }

    /// File name for `format`.
    #[must_use]
    pub fn file_name(&self, format: ExportFormat) -> String {
        match &self.stamp {
            Some((status, at)) => format!(
                "{FILE_PREFIX}_{}_{}_{}.{}",
                self.slug,
                status.file_label(),
                at.format("%Y%m%d_%H%M%S"),
                format.extension()
            ),
            None => format!("{FILE_PREFIX}_{}.{}", self.slug, format.extension()),
        }
    }

    /// Same target with `_<suffix>` appended to the slug.
    #[must_use]
    pub fn with_suffix(&self, suffix: &str) -> Self {
        Self {
            slug: format!("{}_{}", self.slug, slugify(suffix)),
            stamp: self.stamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    #[test]
    fn test_slug_collapses_symbol_runs() {
        assert_eq!(slugify("Q1 Launch / Beta!!"), "q1_launch_beta");
        assert_eq!(slugify("  Marketing -- 2024  "), "marketing_2024");
        assert_eq!(slugify("already_slugged"), "already_slugged");
        assert_eq!(slugify("__a__b__"), "a_b");
    }

    #[test]
    fn test_slug_of_symbols_only() {
        assert_eq!(slugify("!!!"), "project");
        assert_eq!(slugify(""), "project");
    }

    #[test]
    fn test_slug_drops_non_ascii() {
        assert_eq!(slugify("Café Roadmap"), "caf_roadmap");
    }

    #[test]
    fn test_plain_file_name() {
        let target = ExportTarget::plain("Q1 Launch / Beta!!");
        assert_eq!(
            target.file_name(ExportFormat::Json),
            "asana_tasks_q1_launch_beta.json"
        );
    }

    #[test]
    fn test_suffix_keeps_stamp() {
        let at = NaiveDate::from_ymd_opt(2024, 1, 31)
            .unwrap()
            .and_hms_opt(8, 5, 9)
            .unwrap();
        let target = ExportTarget::stamped("Alpha", StatusFilter::All, at).with_suffix("1207");
        assert_eq!(
            target.file_name(ExportFormat::Csv),
            "asana_tasks_alpha_1207_All_Tasks_20240131_080509.csv"
        );
    }

    #[test]
    fn test_stamped_file_name() {
        let at = NaiveDate::from_ymd_opt(2024, 1, 31)
            .unwrap()
            .and_hms_opt(8, 5, 9)
            .unwrap();
        let target = ExportTarget::stamped("Roadmap", StatusFilter::Incomplete, at);
        assert_eq!(
            target.file_name(ExportFormat::Yaml),
            "asana_tasks_roadmap_Incomplete_Tasks_20240131_080509.yaml"
        );
    }
}
