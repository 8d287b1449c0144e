//! Cleanup statistics.

use std::fmt;
use std::time::Duration;

#[cfg(feature = "serde")]
use serde::Serialize;

/// What a cleanup run did.
///
/// A count is `None` when its stage did not run. The formatted report lists
/// only stages that ran, sorted by label, followed by the elapsed time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct CleanupReport {
    /// Hidden entities erased.
    pub hidden_entities_erased: Option<usize>,
    /// Component definitions purged, across both purge stages.
    pub purged_components: Option<usize>,
    /// Component definitions renamed to resolve name clashes. Reported only
    /// when nonzero.
    pub duplicate_component_names_fixed: Option<usize>,
    /// Orphan material references repaired or stripped.
    pub orphan_materials_fixed: Option<usize>,
    /// Materials merged into an identical one.
    pub materials_merged: Option<usize>,
    /// Edges removed by face merging, lonely-edge erasure and split repair.
    pub edges_reduced: Option<usize>,
    /// Faces removed by face merging and duplicate erasure.
    pub faces_reduced: Option<usize>,
    /// Layers purged.
    pub purged_layers: Option<usize>,
    /// Materials purged.
    pub purged_materials: Option<usize>,
    /// Wall-clock time of the run.
    pub elapsed: Duration,
}

impl CleanupReport {
    /// Create an empty report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages that ran as `(label, count)`, sorted by label.
    #[must_use]
    pub fn entries(&self) -> Vec<(&'static str, usize)> {
        let mut entries: Vec<(&'static str, usize)> = [
            ("Hidden Entities Erased", self.hidden_entities_erased),
            ("Purged Components", self.purged_components),
            (
                "Duplicate Component Names Fixed",
                self.duplicate_component_names_fixed.filter(|&n| n > 0),
            ),
            ("Orphan Materials Fixed", self.orphan_materials_fixed),
            ("Materials Merged", self.materials_merged),
            ("Edges Reduced", self.edges_reduced),
            ("Faces Reduced", self.faces_reduced),
            ("Purged Layers", self.purged_layers),
            ("Purged Materials", self.purged_materials),
        ]
        .into_iter()
        .filter_map(|(label, count)| count.map(|n| (label, n)))
        .collect();
        entries.sort_unstable_by_key(|&(label, _)| label);
        entries
    }

    /// Whether any stage changed the model.
    #[must_use]
    pub fn had_changes(&self) -> bool {
        self.entries().iter().any(|&(_, n)| n > 0)
    }

    /// Sum of all stage counts.
    #[must_use]
    pub fn total_changes(&self) -> usize {
        self.entries().iter().map(|&(_, n)| n).sum()
    }

    /// Add `n` to a count, starting it at zero if its stage had not run.
    pub(crate) fn add(count: &mut Option<usize>, n: usize) {
        *count = Some(count.unwrap_or(0) + n);
    }
}

/// Human-readable duration: seconds with millisecond precision, or minutes
/// and seconds past one minute.
#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs_f64();
    if secs < 60.0 {
        format!("{secs:.3}s")
    } else {
        let whole = elapsed.as_secs();
        format!("{}m {:02}s", whole / 60, whole % 60)
    }
}

impl fmt::Display for CleanupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut lines: Vec<String> = self
            .entries()
            .into_iter()
            .map(|(label, n)| format!("> {label}: {n}"))
            .collect();
        lines.push(format!("> Total Elapsed Time: {}", format_elapsed(self.elapsed)));
        lines.sort();
        write!(f, "Cleanup Statistics:")?;
        for line in lines {
            write!(f, "\n{line}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_stages_that_ran_are_listed() {
        let report = CleanupReport {
            edges_reduced: Some(3),
            faces_reduced: Some(0),
            duplicate_component_names_fixed: Some(0),
            ..CleanupReport::default()
        };
        assert_eq!(report.entries(), vec![("Edges Reduced", 3), ("Faces Reduced", 0)]);
        assert!(report.had_changes());
        assert_eq!(report.total_changes(), 3);
        assert!(!CleanupReport::new().had_changes());
    }

    #[test]
    fn formatted_lines_are_sorted() {
        let report = CleanupReport {
            purged_components: Some(2),
            edges_reduced: Some(5),
            materials_merged: Some(1),
            elapsed: Duration::from_millis(1500),
            ..CleanupReport::default()
        };
        let text = report.to_string();
        assert_eq!(
            text,
            "Cleanup Statistics:\n\
             > Edges Reduced: 5\n\
             > Materials Merged: 1\n\
             > Purged Components: 2\n\
             > Total Elapsed Time: 1.500s"
        );
    }

    #[test]
    fn elapsed_formats() {
        assert_eq!(format_elapsed(Duration::from_millis(250)), "0.250s");
        assert_eq!(format_elapsed(Duration::from_secs(125)), "2m 05s");
    }

    #[test]
    fn counts_accumulate() {
        let mut count = None;
        CleanupReport::add(&mut count, 2);
        CleanupReport::add(&mut count, 3);
        assert_eq!(count, Some(5));
    }
}
