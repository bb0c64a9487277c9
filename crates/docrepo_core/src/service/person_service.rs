//! Person use-case service.
//!
//! # Responsibility
//! - Paginate persons with name search and an optional radius filter.
//! - Provide get/insert/update/delete/add-connection use-cases.
//! - Seed random persons through the bulk channel.
//!
//! # Invariants
//! - Search always covers `firstname` and `lastname`.
//! - The radius filter applies only when latitude, longitude and radius are
//!   all present.

use crate::model::person::{Gender, Person, PersonInput, PERSON_COLLECTION};
use crate::repo::document_repo::{QueryBuilder, Repository};
use crate::repo::error::RepoError;
use crate::repo::pagination::{Page, PaginationParams};
use crate::repo::predicate::SpatialPredicate;
use crate::service::{ServiceError, ServiceResult};
use crate::store::{DocumentStore, Session};
use chrono::{Duration as ChronoDuration, Local, NaiveDate};
use log::info;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

pub const PERSON_ENTITY: &str = "Person";
const PERSON_SEARCH_FIELDS: [&str; 2] = ["firstname", "lastname"];

const FEMALE_NAMES: &[&str] = &[
    "Alice", "Beatriz", "Camila", "Casey", "Daniela", "Elena", "Fatima", "Grace", "Hana", "Ines",
    "Julia", "Katya", "Lucia", "Maya", "Nora", "Olivia", "Paula", "Rosa", "Sofia", "Yuki",
];
const MALE_NAMES: &[&str] = &[
    "Andres", "Bruno", "Carlos", "Diego", "Ethan", "Felix", "Gabriel", "Hugo", "Ivan", "John",
    "Jon", "Kenji", "Liam", "Mateo", "Noah", "Omar", "Pablo", "Rafael", "Samuel", "Tomas",
];
const LAST_NAMES: &[&str] = &[
    "Alvarez", "Brown", "Castro", "Dubois", "Evans", "Fernandez", "Garcia", "Hoffmann", "Ito",
    "Johnson", "Kowalski", "Lopez", "Moreno", "Nakamura", "Okafor", "Perez", "Quispe", "Rossi",
    "Smith", "Torres",
];
const COUNTRIES: &[&str] = &[
    "Argentina", "Brazil", "Canada", "Chile", "France", "Germany", "Japan", "Kenya", "Mexico",
    "Nigeria", "Peru", "Poland", "Spain", "United Kingdom", "United States",
];

/// Optional radius filter for person pagination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PersonFilter {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Kilometers.
    pub radius: Option<f64>,
}

impl PersonFilter {
    fn spatial(&self) -> Option<SpatialPredicate> {
        match (self.latitude, self.longitude, self.radius) {
            (Some(latitude), Some(longitude), Some(radius)) => {
                Some(SpatialPredicate::new(latitude, longitude, radius))
            }
            _ => None,
        }
    }
}

/// Outcome of one seeding run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedSummary {
    pub inserted: usize,
    pub elapsed: Duration,
}

/// Person use-cases over a shared document store.
pub struct PersonService<'a> {
    store: &'a DocumentStore,
}

impl<'a> PersonService<'a> {
    pub fn new(store: &'a DocumentStore) -> Self {
        Self { store }
    }

    /// One page of persons matching the search term and optional radius.
    pub fn paginate(
        &self,
        params: &PaginationParams,
        filter: &PersonFilter,
    ) -> ServiceResult<Page<Person>> {
        let session = self.store.open_session()?;
        let mut builder = persons(&session).search_fields(PERSON_SEARCH_FIELDS);
        if let Some(predicate) = filter.spatial() {
            builder = builder.where_spatial(predicate);
        }
        Ok(builder.paginate(params)?)
    }

    pub fn get_by_id(&self, id: &str) -> ServiceResult<Person> {
        let session = self.store.open_session()?;
        require_person(&session, id)
    }

    /// Stores a new person under a generated id.
    pub fn insert(&self, input: PersonInput) -> ServiceResult<Person> {
        let session = self.store.open_session()?;
        let mut person = Person::from_input(input);
        session.store(&mut person, None)?;
        session.save_changes()?;
        Ok(person)
    }

    /// Replaces every mutable field of an existing person.
    pub fn update(&self, id: &str, input: PersonInput) -> ServiceResult<Person> {
        let session = self.store.open_session()?;
        let mut person = require_person(&session, id)?;
        person.apply(input);
        session.store(&mut person, None)?;
        session.save_changes()?;
        Ok(person)
    }

    /// Deletes an existing person and returns its last state.
    pub fn delete(&self, id: &str) -> ServiceResult<Person> {
        let session = self.store.open_session()?;
        let person = require_person(&session, id)?;
        session.delete(&person)?;
        session.save_changes()?;
        Ok(person)
    }

    /// Appends `connection_id` to the connections of person `id`.
    ///
    /// Both persons must exist; an already present connection is kept once.
    pub fn add_connection(&self, id: &str, connection_id: &str) -> ServiceResult<Person> {
        if id == connection_id {
            return Err(ServiceError::InvalidInput(format!(
                "person `{id}` cannot be connected to itself"
            )));
        }
        let session = self.store.open_session()?;
        let mut person = require_person(&session, id)?;
        require_person(&session, connection_id)?;

        if !person.connections.iter().any(|existing| existing == connection_id) {
            person.connections.push(connection_id.to_string());
            session.store(&mut person, None)?;
            session.save_changes()?;
        }
        Ok(person)
    }

    /// Inserts `total` random persons through the bulk channel.
    pub fn seed_persons(&self, total: usize) -> ServiceResult<SeedSummary> {
        if total == 0 {
            return Err(ServiceError::InvalidInput(
                "total persons must be greater than zero".to_string(),
            ));
        }
        let started_at = Instant::now();
        let mut rng = rand::thread_rng();
        let persons = (0..total)
            .map(|_| random_person(&mut rng))
            .collect::<Vec<_>>();
        let ids = self.store.bulk_insert(&persons)?;

        let summary = SeedSummary {
            inserted: ids.len(),
            elapsed: started_at.elapsed(),
        };
        info!(
            "event=seed module=service status=ok collection={} inserted={} duration_ms={}",
            PERSON_COLLECTION,
            summary.inserted,
            summary.elapsed.as_millis()
        );
        Ok(summary)
    }
}

fn persons(session: &Session) -> QueryBuilder<'_, Person> {
    Repository::<Person>::new(PERSON_COLLECTION, session).builder()
}

pub(crate) fn require_person(session: &Session, id: &str) -> ServiceResult<Person> {
    persons(session)
        .get_by_id(id)?
        .ok_or_else(|| RepoError::not_found(PERSON_ENTITY, id).into())
}

fn random_person(rng: &mut impl Rng) -> Person {
    let gender = if rng.gen_bool(0.5) {
        Gender::Female
    } else {
        Gender::Male
    };
    let names = match gender {
        Gender::Female => FEMALE_NAMES,
        Gender::Male => MALE_NAMES,
    };
    let today = Local::now().date_naive();
    let age_days = rng.gen_range(20 * 365..=65 * 365);
    let dob = today
        .checked_sub_signed(ChronoDuration::days(age_days))
        .unwrap_or(NaiveDate::MIN);

    Person::from_input(PersonInput {
        firstname: pick(rng, names),
        lastname: pick(rng, LAST_NAMES),
        gender,
        dob,
        country: pick(rng, COUNTRIES),
        latitude: round_coordinate(rng.gen_range(-90.0..=90.0)),
        longitude: round_coordinate(rng.gen_range(-180.0..=180.0)),
        connections: Vec::new(),
    })
}

fn pick(rng: &mut impl Rng, values: &[&str]) -> String {
    values.choose(rng).copied().unwrap_or_default().to_string()
}

fn round_coordinate(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}
