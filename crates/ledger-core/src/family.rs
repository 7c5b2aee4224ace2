//! Genealogy registry. Unrelated to the ledger and shares no state with it.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub id: String,
    pub name: String,
    pub birthdate: String,
    pub gender: String,
}

#[derive(Clone, Debug, Default)]
struct Relations {
    parents: Vec<String>,
    children: Vec<String>,
}

/// People keyed by id, with parent/child edges stored as id lists.
#[derive(Debug, Default)]
pub struct FamilyTree {
    people: HashMap<String, Person>,
    relations: HashMap<String, Relations>,
}

impl FamilyTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.people.len()
    }

    pub fn is_empty(&self) -> bool {
        self.people.is_empty()
    }

    /// Returns false if a person with the same id is already registered.
    pub fn add_person(&mut self, person: Person) -> bool {
        if self.people.contains_key(&person.id) {
            return false;
        }
        self.relations.insert(person.id.clone(), Relations::default());
        self.people.insert(person.id.clone(), person);
        true
    }

    /// Returns false if either id is unknown.
    pub fn add_relationship(&mut self, parent_id: &str, child_id: &str) -> bool {
        if !self.people.contains_key(parent_id) || !self.people.contains_key(child_id) {
            return false;
        }
        if let Some(parent) = self.relations.get_mut(parent_id) {
            parent.children.push(child_id.to_string());
        }
        if let Some(child) = self.relations.get_mut(child_id) {
            child.parents.push(parent_id.to_string());
        }
        true
    }

    pub fn person(&self, id: &str) -> Option<&Person> {
        self.people.get(id)
    }

    pub fn parents(&self, id: &str) -> Vec<&Person> {
        self.related(id, |r| &r.parents)
    }

    pub fn children(&self, id: &str) -> Vec<&Person> {
        self.related(id, |r| &r.children)
    }

    fn related(&self, id: &str, edges: impl Fn(&Relations) -> &Vec<String>) -> Vec<&Person> {
        self.relations
            .get(id)
            .map(|r| edges(r).iter().filter_map(|i| self.people.get(i)).collect())
            .unwrap_or_default()
    }
}
