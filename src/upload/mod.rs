//! Emitting assembled tracks to a label store.
//!
//! The store is reached only through the [`LabelStore`] trait. For each
//! media file the emitter resolves a target, binds the target's schema once,
//! creates one instance per track, attaches a box per frame in ascending
//! frame order, attaches the track's answers, and commits the target.
//!
//! A file with no matching target is skipped with a warning (or fails in
//! strict mode). Any other error stops the upload; targets committed before
//! the error stay committed.

mod local;
mod memory;
pub mod report;
mod schema;

pub use local::LocalStore;
pub use memory::{MemoryStore, StoreEvent, StoredInstance};
pub use report::{UploadIssue, UploadIssueCode, UploadReport, UploadedFile};
pub use schema::{AttributeSpec, ObjectClass, Ontology, SchemaBindings};

use std::collections::BTreeMap;

use crate::error::TrackliftError;
use crate::ir::{AssembledExport, NormalizedBox};

/// A label container for one media file.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TargetHandle {
    pub id: usize,
    /// Display name of the container, usually the media file name.
    pub title: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassDescriptor {
    pub target: TargetHandle,
    pub id: usize,
    pub title: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeDescriptor {
    pub class_id: usize,
    pub id: usize,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionDescriptor {
    pub attribute_id: usize,
    pub id: usize,
    pub label: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceHandle(pub u64);

/// The capabilities the emitter needs from an annotation backend.
pub trait LabelStore {
    /// Maps a media key (see [`media_key`]) to its label container.
    fn resolve_target(&self, media_key: &str) -> Option<TargetHandle>;

    fn lookup_class(
        &self,
        target: &TargetHandle,
        class_name: &str,
    ) -> Result<ClassDescriptor, TrackliftError>;

    fn lookup_attribute(
        &self,
        class: &ClassDescriptor,
        attribute_name: &str,
    ) -> Result<AttributeDescriptor, TrackliftError>;

    fn lookup_option(
        &self,
        attribute: &AttributeDescriptor,
        option_text: &str,
    ) -> Result<OptionDescriptor, TrackliftError>;

    fn create_instance(&mut self, class: &ClassDescriptor)
        -> Result<InstanceHandle, TrackliftError>;

    /// Sets the instance's box for one frame. Called once per frame.
    fn attach_geometry(
        &mut self,
        instance: InstanceHandle,
        bbox: &NormalizedBox,
        frame: u64,
    ) -> Result<(), TrackliftError>;

    fn attach_answer(
        &mut self,
        instance: InstanceHandle,
        attribute: &AttributeDescriptor,
        option: &OptionDescriptor,
    ) -> Result<(), TrackliftError>;

    /// Persists every instance created on `target` since its last commit.
    fn commit(&mut self, target: &TargetHandle) -> Result<(), TrackliftError>;
}

/// Derives the key a target is matched by from its display name: everything
/// before the first `.`, so `"clip_01.mp4"` becomes `"clip_01"`.
pub fn media_key(display_name: &str) -> &str {
    display_name
        .split_once('.')
        .map_or(display_name, |(stem, _)| stem)
}

/// Options for upload behavior.
#[derive(Clone, Debug)]
pub struct UploadOptions {
    /// Ontology class every track is created as.
    pub class_name: String,
    /// Questions to upload. Empty means every question found in the tracks.
    pub attributes: Vec<String>,
    /// Fail instead of skipping a file with no matching target.
    pub strict: bool,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            class_name: "Person".to_string(),
            attributes: Vec::new(),
            strict: false,
        }
    }
}

/// Emits every assembled track to `store`.
///
/// # Errors
/// - [`TrackliftError::UnresolvedTarget`] in strict mode for a file with no target
/// - [`TrackliftError::UnresolvedSchema`] if the class, an attribute or an
///   option is missing from a target's ontology
/// - any error the store returns while creating, attaching or committing
pub fn upload<S: LabelStore + ?Sized>(
    export: &AssembledExport,
    store: &mut S,
    opts: &UploadOptions,
) -> Result<UploadReport, TrackliftError> {
    let mut report = UploadReport::new();
    let mut ignored: BTreeMap<String, usize> = BTreeMap::new();

    for file in &export.files {
        let Some(target) = store.resolve_target(file.file_id.as_str()) else {
            if opts.strict {
                return Err(TrackliftError::UnresolvedTarget {
                    media_key: file.file_id.to_string(),
                });
            }
            tracing::warn!(file_id = %file.file_id, "no label row found, skipping");
            report.add(UploadIssue::warning(
                UploadIssueCode::NoTarget,
                format!(
                    "no label row found for file '{}'; {} track(s) skipped",
                    file.file_id,
                    file.tracks.len()
                ),
            ));
            continue;
        };

        let mut bindings =
            SchemaBindings::bind(&*store, &target, &opts.class_name, &opts.attributes)
                .map_err(|err| in_context(err, format!("file '{}'", file.file_id)))?;
        let mut uploaded = UploadedFile::new(file.file_id.clone(), target.title.clone());

        for track in &file.tracks {
            let instance = store.create_instance(&bindings.class)?;
            tracing::debug!(track_id = %track.track_id, frames = track.frames.len(), "creating instance");

            for (&frame, bbox) in &track.frames {
                store.attach_geometry(instance, bbox, frame)?;
            }
            uploaded.frames += track.frames.len();

            for (question, answer) in &track.attributes {
                let resolved = bindings.resolve(&*store, question, answer).map_err(|err| {
                    in_context(
                        err,
                        format!("annotation '{}' in file '{}'", track.track_id, file.file_id),
                    )
                })?;
                match resolved {
                    Some((attribute, option)) => {
                        store.attach_answer(instance, attribute, option)?;
                        uploaded.answers += 1;
                    }
                    None => *ignored.entry(question.clone()).or_default() += 1,
                }
            }
            uploaded.tracks += 1;
        }

        store.commit(&target)?;
        tracing::info!(
            file_id = %file.file_id,
            target = %target.title,
            tracks = uploaded.tracks,
            "uploaded annotations"
        );
        report.uploaded.push(uploaded);
    }

    for (question, count) in ignored {
        report.add(UploadIssue::info(
            UploadIssueCode::IgnoredQuestion,
            format!("{count} answer(s) to question '{question}' ignored: not in the attribute list"),
        ));
    }

    Ok(report)
}

/// Appends the record a schema lookup was made for to its error context.
fn in_context(err: TrackliftError, record: String) -> TrackliftError {
    match err {
        TrackliftError::UnresolvedSchema {
            kind,
            name,
            context,
        } => TrackliftError::UnresolvedSchema {
            kind,
            name,
            context: format!("{context}, {record}"),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaKind;
    use crate::ir::{FileId, FileTracks, TrackId, TrackInstance};

    fn track(id: &str, file: &str, frames: &[u64], answers: &[(&str, &str)]) -> TrackInstance {
        let mut track = TrackInstance::new(TrackId::from(id), FileId::from(file));
        for &frame in frames {
            track
                .frames
                .insert(frame, NormalizedBox::new(0.1, 0.1, 0.2, 0.2));
        }
        for &(q, a) in answers {
            track.attributes.insert(q.to_string(), a.to_string());
        }
        track
    }

    fn export(files: Vec<(&str, Vec<TrackInstance>)>) -> AssembledExport {
        AssembledExport {
            files: files
                .into_iter()
                .map(|(id, tracks)| FileTracks {
                    file_id: FileId::from(id),
                    tracks,
                })
                .collect(),
        }
    }

    fn store(rows: &[&str]) -> MemoryStore {
        MemoryStore::new(
            rows.iter().copied(),
            Ontology::single_class(
                "Person",
                &[
                    ("Shoes", &["Sneakers", "Boots"][..]),
                    ("Hat", &["Cap", "None"][..]),
                ],
            ),
        )
    }

    #[test]
    fn test_media_key_strips_from_first_dot() {
        assert_eq!(media_key("clip_01.mp4"), "clip_01");
        assert_eq!(media_key("clip.final.mov"), "clip");
        assert_eq!(media_key("no_extension"), "no_extension");
    }

    #[test]
    fn test_frames_are_emitted_in_ascending_order() {
        let export = export(vec![("clip", vec![track("t1", "clip", &[5, 1, 3], &[])])]);
        let mut store = store(&["clip.mp4"]);
        upload(&export, &mut store, &UploadOptions::default()).unwrap();

        let frames: Vec<u64> = store
            .events()
            .iter()
            .filter_map(|e| match e {
                StoreEvent::AttachGeometry { frame, .. } => Some(*frame),
                _ => None,
            })
            .collect();
        assert_eq!(frames, vec![1, 3, 5]);
    }

    #[test]
    fn test_missing_target_is_skipped() {
        let export = export(vec![
            ("ghost", vec![track("t1", "ghost", &[0], &[])]),
            ("clip", vec![track("t2", "clip", &[0], &[])]),
        ]);
        let mut store = store(&["clip.mp4"]);
        let report = upload(&export, &mut store, &UploadOptions::default()).unwrap();

        assert_eq!(report.uploaded.len(), 1);
        assert_eq!(report.uploaded[0].file_id.as_str(), "clip");
        assert_eq!(report.skipped_count(), 1);
        assert_eq!(store.committed("clip").len(), 1);
    }

    #[test]
    fn test_missing_target_fails_in_strict_mode() {
        let export = export(vec![("ghost", vec![track("t1", "ghost", &[0], &[])])]);
        let mut store = store(&["clip.mp4"]);
        let opts = UploadOptions {
            strict: true,
            ..Default::default()
        };
        let err = upload(&export, &mut store, &opts).unwrap_err();
        assert!(matches!(err, TrackliftError::UnresolvedTarget { ref media_key } if media_key == "ghost"));
    }

    #[test]
    fn test_unknown_option_is_fatal() {
        let export = export(vec![(
            "clip",
            vec![track("t1", "clip", &[0], &[("Shoes", "Sandals")])],
        )]);
        let mut store = store(&["clip.mp4"]);
        let err = upload(&export, &mut store, &UploadOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            TrackliftError::UnresolvedSchema {
                kind: SchemaKind::Option,
                ..
            }
        ));
        assert!(store.committed("clip").is_empty());
    }

    #[test]
    fn test_schema_errors_name_file_and_track() {
        let export = export(vec![(
            "clip",
            vec![track("trk_42", "clip", &[0], &[("Shoes", "Sandals")])],
        )]);
        let mut store = store(&["clip.mp4"]);
        let err = upload(&export, &mut store, &UploadOptions::default()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("'Sandals'"), "{msg}");
        assert!(msg.contains("annotation 'trk_42'"), "{msg}");
        assert!(msg.contains("file 'clip'"), "{msg}");

        let opts = UploadOptions {
            class_name: "Vehicle".to_string(),
            ..Default::default()
        };
        let err = upload(&export, &mut store, &opts).unwrap_err();
        assert!(err.to_string().contains("file 'clip'"), "{err}");
    }

    #[test]
    fn test_earlier_files_stay_committed_after_failure() {
        let export = export(vec![
            ("a", vec![track("t1", "a", &[0], &[("Shoes", "Boots")])]),
            ("b", vec![track("t2", "b", &[0], &[("Shoes", "Sandals")])]),
        ]);
        let mut store = store(&["a.mp4", "b.mp4"]);
        assert!(upload(&export, &mut store, &UploadOptions::default()).is_err());
        assert_eq!(store.committed("a").len(), 1);
        assert!(store.committed("b").is_empty());
    }

    #[test]
    fn test_unlisted_questions_are_ignored() {
        let export = export(vec![(
            "clip",
            vec![track(
                "t1",
                "clip",
                &[0],
                &[("Shoes", "Boots"), ("Mood", "Happy")],
            )],
        )]);
        let mut store = store(&["clip.mp4"]);
        let opts = UploadOptions {
            attributes: vec!["Shoes".to_string()],
            ..Default::default()
        };
        let report = upload(&export, &mut store, &opts).unwrap();

        assert_eq!(report.uploaded[0].answers, 1);
        assert_eq!(report.info_count(), 1);
        let stored = &store.committed("clip")[0];
        assert_eq!(stored.answers.get("Shoes"), Some(&"Boots".to_string()));
        assert!(!stored.answers.contains_key("Mood"));
    }
}
