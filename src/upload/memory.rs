//! In-memory label store.
//!
//! Holds a list of rows (one per media file) sharing a single ontology, and
//! records every mutating call as a [`StoreEvent`]. It backs [`LocalStore`]
//! and is what tests observe emission order through.
//!
//! [`LocalStore`]: super::LocalStore

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::schema::Ontology;
use super::{
    media_key, AttributeDescriptor, ClassDescriptor, InstanceHandle, LabelStore, OptionDescriptor,
    TargetHandle,
};
use crate::error::{SchemaKind, TrackliftError};
use crate::ir::NormalizedBox;

/// A mutating call made against a [`MemoryStore`].
#[derive(Clone, Debug, PartialEq)]
pub enum StoreEvent {
    CreateInstance {
        instance: InstanceHandle,
        target: String,
        class: String,
    },
    AttachGeometry {
        instance: InstanceHandle,
        frame: u64,
        bbox: NormalizedBox,
    },
    AttachAnswer {
        instance: InstanceHandle,
        attribute: String,
        option: String,
    },
    Commit {
        target: String,
    },
}

/// An object instance with its per-frame boxes and answers.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StoredInstance {
    pub instance: u64,
    pub class: String,
    pub frames: BTreeMap<u64, NormalizedBox>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub answers: BTreeMap<String, String>,
}

#[derive(Debug)]
struct Row {
    title: String,
    committed: Vec<StoredInstance>,
}

#[derive(Debug)]
struct Pending {
    row: usize,
    instance: StoredInstance,
}

#[derive(Debug)]
pub struct MemoryStore {
    rows: Vec<Row>,
    by_key: HashMap<String, usize>,
    ontology: Ontology,
    pending: BTreeMap<InstanceHandle, Pending>,
    next_instance: u64,
    events: Vec<StoreEvent>,
}

impl MemoryStore {
    /// Creates a store with one row per display name.
    ///
    /// Rows are matched by [`media_key`]; if two display names share a key,
    /// the later row wins.
    pub fn new<I, T>(titles: I, ontology: Ontology) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let rows: Vec<Row> = titles
            .into_iter()
            .map(|title| Row {
                title: title.into(),
                committed: Vec::new(),
            })
            .collect();
        let by_key = rows
            .iter()
            .enumerate()
            .map(|(idx, row)| (media_key(&row.title).to_string(), idx))
            .collect();

        Self {
            rows,
            by_key,
            ontology,
            pending: BTreeMap::new(),
            next_instance: 1,
            events: Vec::new(),
        }
    }

    /// Every mutating call so far, in call order.
    pub fn events(&self) -> &[StoreEvent] {
        &self.events
    }

    /// Committed instances of the row matching `key`, in creation order.
    pub fn committed(&self, key: &str) -> &[StoredInstance] {
        self.by_key
            .get(key)
            .map(|&idx| self.rows[idx].committed.as_slice())
            .unwrap_or(&[])
    }

    /// Display names of all rows, in the order given.
    pub fn titles(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|row| row.title.as_str())
    }

    fn pending_mut(
        &mut self,
        instance: InstanceHandle,
    ) -> Result<&mut StoredInstance, TrackliftError> {
        self.pending
            .get_mut(&instance)
            .map(|p| &mut p.instance)
            .ok_or(TrackliftError::UnknownHandle {
                kind: "instance",
                id: instance.0,
            })
    }

    fn row(&self, target: &TargetHandle) -> Result<&Row, TrackliftError> {
        self.rows
            .get(target.id)
            .ok_or(TrackliftError::UnknownHandle {
                kind: "target",
                id: target.id as u64,
            })
    }
}

impl LabelStore for MemoryStore {
    fn resolve_target(&self, media_key: &str) -> Option<TargetHandle> {
        let &id = self.by_key.get(media_key)?;
        Some(TargetHandle {
            id,
            title: self.rows[id].title.clone(),
        })
    }

    fn lookup_class(
        &self,
        target: &TargetHandle,
        class_name: &str,
    ) -> Result<ClassDescriptor, TrackliftError> {
        let row = self.row(target)?;
        let id = self
            .ontology
            .objects
            .iter()
            .position(|object| object.title == class_name)
            .ok_or_else(|| TrackliftError::UnresolvedSchema {
                kind: SchemaKind::Class,
                name: class_name.to_string(),
                context: format!("label row '{}'", row.title),
            })?;

        Ok(ClassDescriptor {
            target: target.clone(),
            id,
            title: class_name.to_string(),
        })
    }

    fn lookup_attribute(
        &self,
        class: &ClassDescriptor,
        attribute_name: &str,
    ) -> Result<AttributeDescriptor, TrackliftError> {
        let object = self
            .ontology
            .objects
            .get(class.id)
            .ok_or(TrackliftError::UnknownHandle {
                kind: "class",
                id: class.id as u64,
            })?;
        let id = object
            .attributes
            .iter()
            .position(|attribute| attribute.name == attribute_name)
            .ok_or_else(|| TrackliftError::UnresolvedSchema {
                kind: SchemaKind::Attribute,
                name: attribute_name.to_string(),
                context: format!("class '{}'", object.title),
            })?;

        Ok(AttributeDescriptor {
            class_id: class.id,
            id,
            name: attribute_name.to_string(),
        })
    }

    fn lookup_option(
        &self,
        attribute: &AttributeDescriptor,
        option_text: &str,
    ) -> Result<OptionDescriptor, TrackliftError> {
        let spec = self
            .ontology
            .objects
            .get(attribute.class_id)
            .and_then(|object| object.attributes.get(attribute.id))
            .ok_or(TrackliftError::UnknownHandle {
                kind: "attribute",
                id: attribute.id as u64,
            })?;
        let id = spec
            .options
            .iter()
            .position(|option| option == option_text)
            .ok_or_else(|| TrackliftError::UnresolvedSchema {
                kind: SchemaKind::Option,
                name: option_text.to_string(),
                context: format!("attribute '{}'", spec.name),
            })?;

        Ok(OptionDescriptor {
            attribute_id: attribute.id,
            id,
            label: option_text.to_string(),
        })
    }

    fn create_instance(
        &mut self,
        class: &ClassDescriptor,
    ) -> Result<InstanceHandle, TrackliftError> {
        let target = self.row(&class.target)?.title.clone();
        let handle = InstanceHandle(self.next_instance);
        self.next_instance += 1;

        self.pending.insert(
            handle,
            Pending {
                row: class.target.id,
                instance: StoredInstance {
                    instance: handle.0,
                    class: class.title.clone(),
                    frames: BTreeMap::new(),
                    answers: BTreeMap::new(),
                },
            },
        );
        self.events.push(StoreEvent::CreateInstance {
            instance: handle,
            target,
            class: class.title.clone(),
        });
        Ok(handle)
    }

    fn attach_geometry(
        &mut self,
        instance: InstanceHandle,
        bbox: &NormalizedBox,
        frame: u64,
    ) -> Result<(), TrackliftError> {
        self.pending_mut(instance)?.frames.insert(frame, *bbox);
        self.events.push(StoreEvent::AttachGeometry {
            instance,
            frame,
            bbox: *bbox,
        });
        Ok(())
    }

    fn attach_answer(
        &mut self,
        instance: InstanceHandle,
        attribute: &AttributeDescriptor,
        option: &OptionDescriptor,
    ) -> Result<(), TrackliftError> {
        self.pending_mut(instance)?
            .answers
            .insert(attribute.name.clone(), option.label.clone());
        self.events.push(StoreEvent::AttachAnswer {
            instance,
            attribute: attribute.name.clone(),
            option: option.label.clone(),
        });
        Ok(())
    }

    fn commit(&mut self, target: &TargetHandle) -> Result<(), TrackliftError> {
        let title = self.row(target)?.title.clone();

        // Handles are issued in increasing order, so this keeps creation order.
        let handles: Vec<InstanceHandle> = self
            .pending
            .iter()
            .filter(|(_, p)| p.row == target.id)
            .map(|(&handle, _)| handle)
            .collect();
        for handle in handles {
            if let Some(pending) = self.pending.remove(&handle) {
                self.rows[target.id].committed.push(pending.instance);
            }
        }

        self.events.push(StoreEvent::Commit { target: title });
        Ok(())
    }
}
