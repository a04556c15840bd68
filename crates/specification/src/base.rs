//! Reusable specification values and the builder that produces them.
//!
//! A specification is configured entirely through [`SpecificationBuilder`] (or
//! [`ProjectedSpecificationBuilder`]) and frozen by `build()`. The built values only
//! expose accessors, so a named specification can be cached, shared across threads
//! and reused without anyone reconfiguring it after the fact.

use crate::contract::{ProjectedQuerySpecification, ProjectionOutput, QuerySpecification};
use crate::expression::{KeySelector, Predicate, Projection};

/// Immutable query shape over `T`.
#[derive(Debug)]
pub struct Specification<T> {
    criteria: Option<Predicate<T>>,
    order_by: Option<KeySelector<T>>,
    order_by_desc: Option<KeySelector<T>>,
    distinct: bool,
}

impl<T> Clone for Specification<T> {
    fn clone(&self) -> Self {
        Self {
            criteria: self.criteria.clone(),
            order_by: self.order_by.clone(),
            order_by_desc: self.order_by_desc.clone(),
            distinct: self.distinct,
        }
    }
}

impl<T: 'static> Specification<T> {
    /// Specification matching every entity, in data-source order.
    pub fn all() -> Self {
        SpecificationBuilder::unfiltered().build()
    }
}

impl<T> QuerySpecification<T> for Specification<T> {
    fn criteria(&self) -> Option<&Predicate<T>> {
        self.criteria.as_ref()
    }

    fn order_by(&self) -> Option<&KeySelector<T>> {
        self.order_by.as_ref()
    }

    fn order_by_desc(&self) -> Option<&KeySelector<T>> {
        self.order_by_desc.as_ref()
    }

    fn is_distinct(&self) -> bool {
        self.distinct
    }
}

/// Builder for [`Specification`].
///
/// Repeated `order_by`/`order_by_desc`/`select` calls overwrite the previous value.
#[derive(Debug)]
pub struct SpecificationBuilder<T> {
    spec: Specification<T>,
}

impl<T: 'static> SpecificationBuilder<T> {
    pub fn new(criteria: Option<Predicate<T>>) -> Self {
        Self {
            spec: Specification {
                criteria,
                order_by: None,
                order_by_desc: None,
                distinct: false,
            },
        }
    }

    pub fn unfiltered() -> Self {
        Self::new(None)
    }

    pub fn matching<F>(label: &'static str, criteria: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self::new(Some(Predicate::new(label, criteria)))
    }

    pub fn order_by<K, F>(mut self, label: &'static str, key: F) -> Self
    where
        K: Ord + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.spec.order_by = Some(KeySelector::new(label, key));
        self
    }

    pub fn order_by_desc<K, F>(mut self, label: &'static str, key: F) -> Self
    where
        K: Ord + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.spec.order_by_desc = Some(KeySelector::new(label, key));
        self
    }

    pub fn distinct(mut self) -> Self {
        self.spec.distinct = true;
        self
    }

    /// Switch to a projected specification returning `R`.
    pub fn select<R, F>(self, label: &'static str, projection: F) -> ProjectedSpecificationBuilder<T, R>
    where
        R: ProjectionOutput,
        F: Fn(&T) -> R + Send + Sync + 'static,
    {
        self.projected().select(label, projection)
    }

    /// Switch to a projected specification without declaring its projection yet.
    pub fn projected<R: ProjectionOutput>(self) -> ProjectedSpecificationBuilder<T, R> {
        ProjectedSpecificationBuilder {
            base: self,
            select: None,
        }
    }

    pub fn build(self) -> Specification<T> {
        self.spec
    }
}

/// Immutable query shape over `T` carrying a projection to `R`.
#[derive(Debug)]
pub struct ProjectedSpecification<T, R> {
    base: Specification<T>,
    select: Option<Projection<T, R>>,
}

impl<T, R> Clone for ProjectedSpecification<T, R> {
    fn clone(&self) -> Self {
        Self {
            base: self.base.clone(),
            select: self.select.clone(),
        }
    }
}

impl<T, R> ProjectedSpecification<T, R> {
    /// The entity-level part of this specification.
    pub fn base(&self) -> &Specification<T> {
        &self.base
    }
}

impl<T, R> QuerySpecification<T> for ProjectedSpecification<T, R> {
    fn criteria(&self) -> Option<&Predicate<T>> {
        self.base.criteria()
    }

    fn order_by(&self) -> Option<&KeySelector<T>> {
        self.base.order_by()
    }

    fn order_by_desc(&self) -> Option<&KeySelector<T>> {
        self.base.order_by_desc()
    }

    fn is_distinct(&self) -> bool {
        self.base.is_distinct()
    }
}

impl<T, R: ProjectionOutput> ProjectedQuerySpecification<T> for ProjectedSpecification<T, R> {
    type Output = R;

    fn select(&self) -> Option<&Projection<T, R>> {
        self.select.as_ref()
    }
}

/// Builder for [`ProjectedSpecification`].
#[derive(Debug)]
pub struct ProjectedSpecificationBuilder<T, R> {
    base: SpecificationBuilder<T>,
    select: Option<Projection<T, R>>,
}

impl<T: 'static, R: ProjectionOutput> ProjectedSpecificationBuilder<T, R> {
    pub fn new(criteria: Option<Predicate<T>>) -> Self {
        SpecificationBuilder::new(criteria).projected()
    }

    pub fn unfiltered() -> Self {
        Self::new(None)
    }

    pub fn order_by<K, F>(mut self, label: &'static str, key: F) -> Self
    where
        K: Ord + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.base = self.base.order_by(label, key);
        self
    }

    pub fn order_by_desc<K, F>(mut self, label: &'static str, key: F) -> Self
    where
        K: Ord + 'static,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        self.base = self.base.order_by_desc(label, key);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.base = self.base.distinct();
        self
    }

    pub fn select<F>(mut self, label: &'static str, projection: F) -> Self
    where
        F: Fn(&T) -> R + Send + Sync + 'static,
    {
        self.select = Some(Projection::new(label, projection));
        self
    }

    pub fn build(self) -> ProjectedSpecification<T, R> {
        ProjectedSpecification {
            base: self.base.build(),
            select: self.select,
        }
    }
}
