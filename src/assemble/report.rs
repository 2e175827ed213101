//! Assembly report types for tracking lossiness and merge decisions.
//!
//! Folding an export into tracks is mostly mechanical, but a few steps
//! silently change data: polygons become boxes, repeated frames and answers
//! overwrite earlier ones, and out-of-frame boxes pass through unclamped.
//! Each of these is recorded here so the user can see it.

use serde::Serialize;
use std::fmt;

/// A report generated while assembling tracks.
#[derive(Clone, Debug, Default, Serialize)]
pub struct AssemblyReport {
    /// Counts of what was read and what was produced.
    pub counts: AssemblyCounts,
    /// Issues discovered during assembly.
    pub issues: Vec<AssemblyIssue>,
}

impl AssemblyReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an issue to the report.
    pub fn add(&mut self, issue: AssemblyIssue) {
        self.issues.push(issue);
    }

    /// Count of warning-level issues (data that may be wrong or was dropped).
    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == AssemblySeverity::Warning)
            .count()
    }

    /// Count of info-level issues (merge policy notes).
    pub fn info_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == AssemblySeverity::Info)
            .count()
    }

    /// Number of issues with the given code.
    pub fn count_of(&self, code: AssemblyIssueCode) -> usize {
        self.issues.iter().filter(|i| i.code == code).count()
    }
}

impl fmt::Display for AssemblyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.counts;
        writeln!(
            f,
            "  read: {} media, {} records, {} metadata entries",
            c.media, c.records, c.metadata_entries
        )?;
        writeln!(
            f,
            "  assembled: {} files, {} tracks, {} frames, {} answers",
            c.files, c.tracks, c.frames, c.answers
        )?;

        let warnings = self.warning_count();
        if warnings > 0 {
            writeln!(f)?;
            writeln!(f, "Warnings ({}):", warnings)?;
            for issue in self
                .issues
                .iter()
                .filter(|i| i.severity == AssemblySeverity::Warning)
            {
                writeln!(f, "  - {}", issue.message)?;
            }
        }

        let infos = self.info_count();
        if infos > 0 {
            writeln!(f)?;
            writeln!(f, "Notes ({}):", infos)?;
            for issue in self
                .issues
                .iter()
                .filter(|i| i.severity == AssemblySeverity::Info)
            {
                writeln!(f, "  - {}", issue.message)?;
            }
        }

        Ok(())
    }
}

/// Counts of export elements in and assembled elements out.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AssemblyCounts {
    pub media: usize,
    pub records: usize,
    pub metadata_entries: usize,
    pub files: usize,
    pub tracks: usize,
    pub frames: usize,
    pub answers: usize,
}

/// A single issue discovered during assembly.
#[derive(Clone, Debug, Serialize)]
pub struct AssemblyIssue {
    pub severity: AssemblySeverity,
    pub code: AssemblyIssueCode,
    pub message: String,
}

impl AssemblyIssue {
    pub fn warning(code: AssemblyIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: AssemblySeverity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn info(code: AssemblyIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: AssemblySeverity::Info,
            code,
            message: message.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblySeverity {
    Warning,
    Info,
}

/// Stable issue codes for programmatic consumption.
///
/// These codes are part of the JSON report and should remain stable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AssemblyIssueCode {
    // Warnings
    /// A record named a file with no `video_meta` entry and was skipped.
    MissingMedia,
    /// A normalized box extends outside the frame.
    OutOfBounds,

    // Policy notes
    /// Non-rectangular polygons were replaced by their bounding box.
    PolygonApproximated,
    /// A later record replaced the box of an already-seen frame.
    DuplicateFrame,
    /// A later metadata entry replaced an earlier answer.
    DuplicateAnswer,
    /// Metadata referenced a track with no annotation records.
    UnmatchedMetadata,
}
