//! Person entity.

use crate::model::entity::Entity;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const PERSON_COLLECTION: &str = "Persons";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Female,
    Male,
}

/// A person document stored in the `Persons` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub firstname: String,
    pub lastname: String,
    pub gender: Gender,
    pub dob: NaiveDate,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Ids of other persons.
    #[serde(default)]
    pub connections: Vec<String>,
}

/// Mutable person fields accepted by insert/update use-cases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonInput {
    pub firstname: String,
    pub lastname: String,
    pub gender: Gender,
    pub dob: NaiveDate,
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub connections: Vec<String>,
}

impl Person {
    /// Creates an unsaved person from input fields.
    pub fn from_input(input: PersonInput) -> Self {
        Self {
            id: None,
            firstname: input.firstname,
            lastname: input.lastname,
            gender: input.gender,
            dob: input.dob,
            country: input.country,
            latitude: input.latitude,
            longitude: input.longitude,
            connections: input.connections,
        }
    }

    /// Replaces every mutable field, keeping the identifier.
    pub fn apply(&mut self, input: PersonInput) {
        let id = self.id.take();
        *self = Self::from_input(input);
        self.id = id;
    }
}

impl Entity for Person {
    fn collection_name(&self) -> &str {
        PERSON_COLLECTION
    }

    fn identifier(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn identifier_slot(&mut self) -> &mut Option<String> {
        &mut self.id
    }
}
