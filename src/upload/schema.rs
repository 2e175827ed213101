//! Target ontology types and per-target schema bindings.

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{AttributeDescriptor, ClassDescriptor, LabelStore, OptionDescriptor, TargetHandle};
use crate::error::TrackliftError;

/// Object classes a label store accepts, each with its single-choice
/// attributes.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Ontology {
    #[serde(default)]
    pub objects: Vec<ObjectClass>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ObjectClass {
    pub title: String,
    #[serde(default)]
    pub attributes: Vec<AttributeSpec>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AttributeSpec {
    pub name: String,
    #[serde(default)]
    pub options: Vec<String>,
}

impl Ontology {
    /// Ontology with one class whose attributes are given as
    /// `(name, options)` pairs.
    pub fn single_class(title: &str, attributes: &[(&str, &[&str])]) -> Self {
        Self {
            objects: vec![ObjectClass {
                title: title.to_string(),
                attributes: attributes
                    .iter()
                    .map(|(name, options)| AttributeSpec {
                        name: name.to_string(),
                        options: options.iter().map(|o| o.to_string()).collect(),
                    })
                    .collect(),
            }],
        }
    }
}

/// A question bound to its attribute, with options resolved on first use.
#[derive(Debug)]
struct AttributeBinding {
    attribute: AttributeDescriptor,
    options: BTreeMap<String, OptionDescriptor>,
}

/// Question -> attribute map for one target, built once before any of the
/// target's tracks are emitted.
///
/// With a non-empty question list, exactly those questions are bound up
/// front and answers to any other question are ignored. With an empty list,
/// every question is bound the first time an answer for it appears.
#[derive(Debug)]
pub struct SchemaBindings {
    pub class: ClassDescriptor,
    bindings: BTreeMap<String, AttributeBinding>,
    bind_on_demand: bool,
}

impl SchemaBindings {
    /// Looks up the class and every listed question on `target`.
    ///
    /// # Errors
    /// [`TrackliftError::UnresolvedSchema`] if the class or any listed
    /// attribute is missing.
    pub fn bind<S: LabelStore + ?Sized>(
        store: &S,
        target: &TargetHandle,
        class_name: &str,
        questions: &[String],
    ) -> Result<Self, TrackliftError> {
        let class = store.lookup_class(target, class_name)?;

        let mut bindings = BTreeMap::new();
        for question in questions {
            let attribute = store.lookup_attribute(&class, question)?;
            bindings.insert(
                question.clone(),
                AttributeBinding {
                    attribute,
                    options: BTreeMap::new(),
                },
            );
        }

        Ok(Self {
            class,
            bindings,
            bind_on_demand: questions.is_empty(),
        })
    }

    /// Resolves an answer to its attribute and option.
    ///
    /// Returns `Ok(None)` for a question outside the bound set.
    ///
    /// # Errors
    /// [`TrackliftError::UnresolvedSchema`] if the attribute (on-demand mode)
    /// or the option is missing from the ontology.
    pub fn resolve<S: LabelStore + ?Sized>(
        &mut self,
        store: &S,
        question: &str,
        answer: &str,
    ) -> Result<Option<(&AttributeDescriptor, &OptionDescriptor)>, TrackliftError> {
        let binding = match self.bindings.entry(question.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                if !self.bind_on_demand {
                    return Ok(None);
                }
                let attribute = store.lookup_attribute(&self.class, question)?;
                entry.insert(AttributeBinding {
                    attribute,
                    options: BTreeMap::new(),
                })
            }
        };

        let AttributeBinding { attribute, options } = binding;
        let option = match options.entry(answer.to_string()) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(store.lookup_option(attribute, answer)?),
        };

        Ok(Some((&*attribute, &*option)))
    }
}
