//! Upload report types.
//!
//! Skipped files are warnings here, never errors: an upload that skips a
//! file still succeeds unless strict mode is on.

use serde::Serialize;
use std::fmt;

use crate::ir::FileId;

/// What an upload did, file by file.
#[derive(Clone, Debug, Default, Serialize)]
pub struct UploadReport {
    /// Files whose tracks were committed, in upload order.
    pub uploaded: Vec<UploadedFile>,
    /// Skipped files and policy notes.
    pub issues: Vec<UploadIssue>,
}

impl UploadReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, issue: UploadIssue) {
        self.issues.push(issue);
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == UploadSeverity::Warning)
            .count()
    }

    pub fn info_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == UploadSeverity::Info)
            .count()
    }

    /// Number of files skipped for lack of a target.
    pub fn skipped_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.code == UploadIssueCode::NoTarget)
            .count()
    }
}

impl fmt::Display for UploadReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for file in &self.uploaded {
            writeln!(
                f,
                "  {} -> {}: {} tracks, {} frames, {} answers",
                file.file_id, file.target, file.tracks, file.frames, file.answers
            )?;
        }

        let warnings = self.warning_count();
        if warnings > 0 {
            writeln!(f)?;
            writeln!(f, "Warnings ({}):", warnings)?;
            for issue in self
                .issues
                .iter()
                .filter(|i| i.severity == UploadSeverity::Warning)
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
                .filter(|i| i.severity == UploadSeverity::Info)
            {
                writeln!(f, "  - {}", issue.message)?;
            }
        }

        Ok(())
    }
}

/// Counts for one committed file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UploadedFile {
    pub file_id: FileId,
    /// Display name of the target the file was committed to.
    pub target: String,
    pub tracks: usize,
    pub frames: usize,
    pub answers: usize,
}

impl UploadedFile {
    pub fn new(file_id: FileId, target: String) -> Self {
        Self {
            file_id,
            target,
            tracks: 0,
            frames: 0,
            answers: 0,
        }
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct UploadIssue {
    pub severity: UploadSeverity,
    pub code: UploadIssueCode,
    pub message: String,
}

impl UploadIssue {
    pub fn warning(code: UploadIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: UploadSeverity::Warning,
            code,
            message: message.into(),
        }
    }

    pub fn info(code: UploadIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: UploadSeverity::Info,
            code,
            message: message.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadSeverity {
    Warning,
    Info,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadIssueCode {
    /// No label row matched the file; its tracks were not uploaded.
    NoTarget,
    /// Answers to a question outside the attribute list were not uploaded.
    IgnoredQuestion,
}
