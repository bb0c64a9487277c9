//! Company entity and its expanded detail view.

use crate::model::entity::Entity;
use crate::model::person::Person;
use serde::{Deserialize, Serialize};

pub const COMPANY_COLLECTION: &str = "Companies";

/// A company document stored in the `Companies` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub address: String,
    /// Id of the owning person.
    pub owner_id: String,
    /// Ids of member persons.
    #[serde(default)]
    pub person_ids: Vec<String>,
}

/// Mutable company fields accepted by insert/update use-cases.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyInput {
    pub name: String,
    pub address: String,
    pub owner_id: String,
    #[serde(default)]
    pub person_ids: Vec<String>,
}

/// Company with owner and members loaded from the `Persons` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompanyDetail {
    pub id: String,
    pub name: String,
    pub address: String,
    /// `None` when the owner document no longer exists.
    pub owner: Option<Person>,
    /// Members that still exist, in `person_ids` order.
    pub persons: Vec<Person>,
}

impl Entity for Company {
    fn collection_name(&self) -> &str {
        COMPANY_COLLECTION
    }

    fn identifier(&self) -> Option<&str> {
        self.id.as_deref()
    }

    fn identifier_slot(&mut self) -> &mut Option<String> {
        &mut self.id
    }
}
