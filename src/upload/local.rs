//! File-backed label store.
//!
//! A project file lists the label rows and their shared ontology:
//!
//! ```yaml
//! rows:
//!   - data_title: clip_01.mp4
//!   - data_title: clip_02.mp4
//! ontology:
//!   objects:
//!     - title: Person
//!       attributes:
//!         - name: Shoes
//!           options: [Sneakers, Boots]
//! ```
//!
//! Each commit writes `<out_dir>/<media key>.labels.json` holding every
//! instance committed to that row so far.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::memory::{MemoryStore, StoredInstance};
use super::schema::Ontology;
use super::{
    media_key, AttributeDescriptor, ClassDescriptor, InstanceHandle, LabelStore, OptionDescriptor,
    TargetHandle,
};
use crate::error::TrackliftError;
use crate::ir::NormalizedBox;

#[derive(Debug, Deserialize)]
struct ProjectFile {
    #[serde(default)]
    rows: Vec<RowSpec>,
    #[serde(default)]
    ontology: Ontology,
}

#[derive(Debug, Deserialize)]
struct RowSpec {
    data_title: String,
}

#[derive(Debug, Serialize)]
struct LabelsFile<'a> {
    data_title: &'a str,
    objects: &'a [StoredInstance],
}

/// A [`MemoryStore`] that persists each committed row as JSON.
#[derive(Debug)]
pub struct LocalStore {
    inner: MemoryStore,
    out_dir: PathBuf,
    written: Vec<PathBuf>,
}

impl LocalStore {
    /// Opens a YAML project file; committed rows are written under `out_dir`.
    pub fn open(project: &Path, out_dir: &Path) -> Result<Self, TrackliftError> {
        let file = File::open(project).map_err(TrackliftError::Io)?;
        let reader = BufReader::new(file);

        let parsed: ProjectFile =
            serde_yaml::from_reader(reader).map_err(|source| TrackliftError::ProjectParse {
                path: project.to_path_buf(),
                source,
            })?;

        Ok(Self::from_project(parsed, out_dir))
    }

    /// Parses a YAML project description from a string.
    pub fn from_project_str(yaml: &str, out_dir: &Path) -> Result<Self, TrackliftError> {
        let parsed: ProjectFile =
            serde_yaml::from_str(yaml).map_err(|source| TrackliftError::ProjectParse {
                path: PathBuf::from("<string>"),
                source,
            })?;
        Ok(Self::from_project(parsed, out_dir))
    }

    fn from_project(project: ProjectFile, out_dir: &Path) -> Self {
        let titles: Vec<String> = project.rows.into_iter().map(|row| row.data_title).collect();
        for title in &titles {
            tracing::debug!(title = %title, "discovered label row");
        }

        Self {
            inner: MemoryStore::new(titles, project.ontology),
            out_dir: out_dir.to_path_buf(),
            written: Vec::new(),
        }
    }

    /// Labels files written so far, in commit order (repeats included).
    pub fn written(&self) -> &[PathBuf] {
        &self.written
    }

    /// The underlying in-memory store.
    pub fn memory(&self) -> &MemoryStore {
        &self.inner
    }

    fn write_row(&mut self, target: &TargetHandle) -> Result<(), TrackliftError> {
        let key = media_key(&target.title);
        fs::create_dir_all(&self.out_dir).map_err(TrackliftError::Io)?;
        let path = self.out_dir.join(format!("{key}.labels.json"));

        let labels = LabelsFile {
            data_title: &target.title,
            objects: self.inner.committed(key),
        };
        let file = File::create(&path).map_err(TrackliftError::Io)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &labels).map_err(|source| {
            TrackliftError::LabelsWrite {
                path: path.clone(),
                source,
            }
        })?;
        writer.flush().map_err(TrackliftError::Io)?;

        self.written.push(path);
        Ok(())
    }
}

impl LabelStore for LocalStore {
    fn resolve_target(&self, media_key: &str) -> Option<TargetHandle> {
        self.inner.resolve_target(media_key)
    }

    fn lookup_class(
        &self,
        target: &TargetHandle,
        class_name: &str,
    ) -> Result<ClassDescriptor, TrackliftError> {
        self.inner.lookup_class(target, class_name)
    }

    fn lookup_attribute(
        &self,
        class: &ClassDescriptor,
        attribute_name: &str,
    ) -> Result<AttributeDescriptor, TrackliftError> {
        self.inner.lookup_attribute(class, attribute_name)
    }

    fn lookup_option(
        &self,
        attribute: &AttributeDescriptor,
        option_text: &str,
    ) -> Result<OptionDescriptor, TrackliftError> {
        self.inner.lookup_option(attribute, option_text)
    }

    fn create_instance(
        &mut self,
        class: &ClassDescriptor,
    ) -> Result<InstanceHandle, TrackliftError> {
        self.inner.create_instance(class)
    }

    fn attach_geometry(
        &mut self,
        instance: InstanceHandle,
        bbox: &NormalizedBox,
        frame: u64,
    ) -> Result<(), TrackliftError> {
        self.inner.attach_geometry(instance, bbox, frame)
    }

    fn attach_answer(
        &mut self,
        instance: InstanceHandle,
        attribute: &AttributeDescriptor,
        option: &OptionDescriptor,
    ) -> Result<(), TrackliftError> {
        self.inner.attach_answer(instance, attribute, option)
    }

    fn commit(&mut self, target: &TargetHandle) -> Result<(), TrackliftError> {
        self.inner.commit(target)?;
        self.write_row(target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROJECT: &str = "rows:
  - data_title: clip_01.mp4
  - data_title: clip_02.mp4
ontology:
  objects:
    - title: Person
      attributes:
        - name: Shoes
          options: [Sneakers, Boots]
";

    #[test]
    fn reads_rows_and_ontology() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::from_project_str(PROJECT, dir.path()).unwrap();

        let titles: Vec<&str> = store.memory().titles().collect();
        assert_eq!(titles, vec!["clip_01.mp4", "clip_02.mp4"]);

        let target = store.resolve_target("clip_02").unwrap();
        let class = store.lookup_class(&target, "Person").unwrap();
        let attribute = store.lookup_attribute(&class, "Shoes").unwrap();
        assert!(store.lookup_option(&attribute, "Boots").is_ok());
    }

    #[test]
    fn commit_writes_labels_file() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("labels");
        let mut store = LocalStore::from_project_str(PROJECT, &out).unwrap();

        let target = store.resolve_target("clip_01").unwrap();
        let class = store.lookup_class(&target, "Person").unwrap();
        let instance = store.create_instance(&class).unwrap();
        store
            .attach_geometry(instance, &NormalizedBox::new(0.25, 0.5, 0.25, 0.25), 3)
            .unwrap();
        store.commit(&target).unwrap();

        let path = out.join("clip_01.labels.json");
        assert_eq!(store.written(), &[path.clone()]);

        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["data_title"], "clip_01.mp4");
        assert_eq!(written["objects"][0]["class"], "Person");
        assert_eq!(written["objects"][0]["frames"]["3"]["top_left_y"], 0.5);
    }

    #[test]
    fn recommit_rewrites_complete_labels_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = LocalStore::from_project_str(PROJECT, dir.path()).unwrap();
        let target = store.resolve_target("clip_02").unwrap();
        let class = store.lookup_class(&target, "Person").unwrap();

        for frame in 0..2 {
            let instance = store.create_instance(&class).unwrap();
            store
                .attach_geometry(instance, &NormalizedBox::new(0.1, 0.1, 0.3, 0.3), frame)
                .unwrap();
            store.commit(&target).unwrap();
        }

        // Each commit leaves a fully flushed, parseable file behind.
        let path = dir.path().join("clip_02.labels.json");
        let written: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written["objects"].as_array().unwrap().len(), 2);
        assert_eq!(store.written().len(), 2);
    }

    #[test]
    fn unwritable_out_dir_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, "").unwrap();
        let mut store = LocalStore::from_project_str(PROJECT, &blocker).unwrap();

        let target = store.resolve_target("clip_01").unwrap();
        let err = store.commit(&target).unwrap_err();
        assert!(matches!(err, TrackliftError::Io(_)), "{err:?}");
    }

    #[test]
    fn invalid_project_yaml_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = LocalStore::from_project_str("rows: {not: a list}", dir.path()).unwrap_err();
        assert!(matches!(err, TrackliftError::ProjectParse { .. }));
    }
}
