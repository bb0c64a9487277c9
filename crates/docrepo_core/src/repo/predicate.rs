//! Immutable query predicate set.
//!
//! # Responsibility
//! - Hold the equality, spatial, search-field and fuzzy settings of one
//!   repository query.
//! - Translate itself onto a store `DeferredQuery`.
//!
//! # Invariants
//! - Predicates are only ever added, never removed.
//! - Fuzzy similarity applies to every equality predicate of the query.

use crate::repo::error::{RepoError, RepoResult};
use crate::search::fuzzy::DEFAULT_FUZZY_SIMILARITY;
use crate::store::{DeferredQuery, SpatialClause};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct EqualsPredicate {
    pub field: String,
    pub value: Value,
}

/// Within-radius constraint; `radius` is in kilometers.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialPredicate {
    pub latitude_field: String,
    pub longitude_field: String,
    pub latitude: f64,
    pub longitude: f64,
    pub radius: f64,
}

impl SpatialPredicate {
    /// Predicate over the conventional `latitude`/`longitude` fields.
    pub fn new(latitude: f64, longitude: f64, radius: f64) -> Self {
        Self {
            latitude_field: "latitude".to_string(),
            longitude_field: "longitude".to_string(),
            latitude,
            longitude,
            radius,
        }
    }

    /// Same predicate over another field pair.
    pub fn on_fields(mut self, latitude_field: &str, longitude_field: &str) -> Self {
        self.latitude_field = latitude_field.to_string();
        self.longitude_field = longitude_field.to_string();
        self
    }

    fn validate(&self) -> RepoResult<()> {
        if !(-90.0..=90.0).contains(&self.latitude) || !(-180.0..=180.0).contains(&self.longitude)
        {
            return Err(RepoError::InvalidArgument(format!(
                "spatial center ({}, {}) is not a valid coordinate",
                self.latitude, self.longitude
            )));
        }
        if !self.radius.is_finite() || self.radius < 0.0 {
            return Err(RepoError::InvalidArgument(format!(
                "spatial radius must be a non-negative number, got {}",
                self.radius
            )));
        }
        Ok(())
    }
}

/// Everything a repository query filters on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuerySpec {
    pub equals: Vec<EqualsPredicate>,
    pub spatial: Vec<SpatialPredicate>,
    pub search_fields: Vec<String>,
    pub fuzzy: Option<f64>,
}

impl QuerySpec {
    pub fn with_equals(mut self, field: &str, value: Value) -> Self {
        self.equals.push(EqualsPredicate {
            field: field.to_string(),
            value,
        });
        self
    }

    pub fn with_spatial(mut self, predicate: SpatialPredicate) -> Self {
        self.spatial.push(predicate);
        self
    }

    /// Adds search fields, skipping ones already present.
    pub fn with_search_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for field in fields {
            let field = field.into();
            if !self.search_fields.contains(&field) {
                self.search_fields.push(field);
            }
        }
        self
    }

    pub fn with_fuzzy(mut self, similarity: f64) -> Self {
        self.fuzzy = Some(similarity);
        self
    }

    pub fn with_default_fuzzy(self) -> Self {
        self.with_fuzzy(DEFAULT_FUZZY_SIMILARITY)
    }

    /// Checks predicate values before any I/O.
    ///
    /// # Errors
    /// - `InvalidArgument` for a fuzzy similarity outside `(0, 1]`, a
    ///   non-finite or out-of-range center, or a negative radius.
    pub fn validate(&self) -> RepoResult<()> {
        if let Some(similarity) = self.fuzzy {
            if !(similarity > 0.0 && similarity <= 1.0) {
                return Err(RepoError::InvalidArgument(format!(
                    "fuzzy similarity must be in (0, 1], got {similarity}"
                )));
            }
        }
        for predicate in &self.spatial {
            predicate.validate()?;
        }
        for predicate in &self.equals {
            if predicate.field.trim().is_empty() {
                return Err(RepoError::InvalidArgument(
                    "equality field name cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Applies equality (with fuzzy) and spatial predicates to `query`.
    pub(crate) fn apply<'s>(&self, mut query: DeferredQuery<'s>) -> DeferredQuery<'s> {
        for predicate in &self.equals {
            query = query.where_equals(&predicate.field, predicate.value.clone());
        }
        if let Some(similarity) = self.fuzzy {
            query = query.fuzzy(similarity);
        }
        for predicate in &self.spatial {
            query = query.spatial(SpatialClause {
                latitude_field: predicate.latitude_field.clone(),
                longitude_field: predicate.longitude_field.clone(),
                latitude: predicate.latitude,
                longitude: predicate.longitude,
                radius: predicate.radius,
            });
        }
        query
    }

    /// Applies an OR search over the search fields when `term` is non-blank.
    pub(crate) fn apply_search<'s>(
        &self,
        query: DeferredQuery<'s>,
        term: Option<&str>,
    ) -> DeferredQuery<'s> {
        match term.map(str::trim) {
            Some(term) if !term.is_empty() => query.search_any(&self.search_fields, term),
            _ => query,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{QuerySpec, SpatialPredicate};
    use crate::repo::error::RepoError;
    use serde_json::json;

    #[test]
    fn accumulates_without_removing() {
        let spec = QuerySpec::default()
            .with_equals("firstname", json!("Ann"))
            .with_equals("country", json!("PE"))
            .with_search_fields(["firstname", "lastname", "firstname"]);
        assert_eq!(spec.equals.len(), 2);
        assert_eq!(spec.search_fields, vec!["firstname", "lastname"]);
        assert!(spec.validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_fuzzy() {
        for similarity in [0.0, -0.1, 1.5, f64::NAN] {
            let spec = QuerySpec::default().with_fuzzy(similarity);
            assert!(matches!(spec.validate(), Err(RepoError::InvalidArgument(_))));
        }
        assert!(QuerySpec::default().with_fuzzy(1.0).validate().is_ok());
    }

    #[test]
    fn rejects_invalid_spatial_values() {
        let cases = [
            SpatialPredicate::new(f64::NAN, 0.0, 1.0),
            SpatialPredicate::new(91.0, 0.0, 1.0),
            SpatialPredicate::new(0.0, 0.0, -1.0),
            SpatialPredicate::new(0.0, 0.0, f64::INFINITY),
        ];
        for predicate in cases {
            let spec = QuerySpec::default().with_spatial(predicate);
            assert!(matches!(spec.validate(), Err(RepoError::InvalidArgument(_))));
        }
    }
}
