//! Company use-case service.
//!
//! # Invariants
//! - Insert and update verify that the owner and every member person exist.
//! - Company details never expose storage metadata of the company, its owner
//!   or its members.

use crate::model::company::{Company, CompanyDetail, CompanyInput, COMPANY_COLLECTION};
use crate::model::person::{Person, PERSON_COLLECTION};
use crate::repo::document_repo::{QueryBuilder, Repository};
use crate::repo::error::RepoError;
use crate::repo::pagination::{Page, PaginationParams};
use crate::service::person_service::require_person;
use crate::service::ServiceResult;
use crate::store::{DocumentStore, Session};

pub const COMPANY_ENTITY: &str = "Company";

/// Company use-cases over a shared document store.
pub struct CompanyService<'a> {
    store: &'a DocumentStore,
}

impl<'a> CompanyService<'a> {
    pub fn new(store: &'a DocumentStore) -> Self {
        Self { store }
    }

    /// One page of companies; the search term is ignored.
    pub fn paginate(&self, params: &PaginationParams) -> ServiceResult<Page<Company>> {
        let session = self.store.open_session()?;
        Ok(companies(&session).paginate(params)?)
    }

    /// Company with its owner and members loaded.
    pub fn get_detail(&self, id: &str) -> ServiceResult<CompanyDetail> {
        let session = self.store.open_session()?;
        let company = require_company(&session, id)?;
        let people = Repository::<Person>::new(PERSON_COLLECTION, &session).builder();

        let owner = people.get_by_id(&company.owner_id)?;
        let mut persons = Vec::with_capacity(company.person_ids.len());
        for person_id in &company.person_ids {
            if let Some(person) = people.get_by_id(person_id)? {
                persons.push(person);
            }
        }

        Ok(CompanyDetail {
            id: company.id.unwrap_or_else(|| id.to_string()),
            name: company.name,
            address: company.address,
            owner,
            persons,
        })
    }

    /// Stores a new company under a generated id.
    pub fn insert(&self, input: CompanyInput) -> ServiceResult<Company> {
        let session = self.store.open_session()?;
        check_people(&session, &input)?;

        let mut company = Company {
            id: None,
            name: input.name,
            address: input.address,
            owner_id: input.owner_id,
            person_ids: input.person_ids,
        };
        session.store(&mut company, None)?;
        session.save_changes()?;
        Ok(company)
    }

    /// Replaces every mutable field of an existing company.
    pub fn update(&self, id: &str, input: CompanyInput) -> ServiceResult<Company> {
        let session = self.store.open_session()?;
        let mut company = require_company(&session, id)?;
        check_people(&session, &input)?;

        company.name = input.name;
        company.address = input.address;
        company.owner_id = input.owner_id;
        company.person_ids = input.person_ids;
        session.store(&mut company, None)?;
        session.save_changes()?;
        Ok(company)
    }

    /// Deletes an existing company and returns its last state.
    pub fn delete(&self, id: &str) -> ServiceResult<Company> {
        let session = self.store.open_session()?;
        let company = require_company(&session, id)?;
        session.delete(&company)?;
        session.save_changes()?;
        Ok(company)
    }
}

fn companies(session: &Session) -> QueryBuilder<'_, Company> {
    Repository::<Company>::new(COMPANY_COLLECTION, session).builder()
}

fn require_company(session: &Session, id: &str) -> ServiceResult<Company> {
    companies(session)
        .get_by_id(id)?
        .ok_or_else(|| RepoError::not_found(COMPANY_ENTITY, id).into())
}

fn check_people(session: &Session, input: &CompanyInput) -> ServiceResult<()> {
    require_person(session, &input.owner_id)?;
    for person_id in &input.person_ids {
        require_person(session, person_id)?;
    }
    Ok(())
}
