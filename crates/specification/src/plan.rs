//! Executable query plans.
//!
//! A plan is the owned, data-source-facing form of a specification: it snapshots the
//! specification's expressions (cheap `Arc` clones) and adds execution-only concerns
//! such as `take`. Plans also carry the in-memory evaluation used by stores that hold
//! their rows in process.
//!
//! Evaluation order is fixed:
//! 1. filter by criteria
//! 2. stable sort by the ascending key
//! 3. stable sort by the descending key
//! 4. project (projected plans only)
//! 5. remove duplicates, keeping the first occurrence
//! 6. take
//!
//! Because both sorts are stable, a specification declaring both keys ends up ordered
//! primarily by the descending key, with the ascending key breaking ties.

use std::collections::HashSet;

use storefront_core::Entity;

use crate::contract::{ProjectedQuerySpecification, ProjectionOutput, QuerySpecification};
use crate::error::SpecificationError;
use crate::expression::{KeySelector, Predicate, Projection};

/// Entity query ready for execution.
#[derive(Debug)]
pub struct QueryPlan<T> {
    criteria: Option<Predicate<T>>,
    order_by: Option<KeySelector<T>>,
    order_by_desc: Option<KeySelector<T>>,
    distinct: bool,
    take: Option<usize>,
}

impl<T> Clone for QueryPlan<T> {
    fn clone(&self) -> Self {
        Self {
            criteria: self.criteria.clone(),
            order_by: self.order_by.clone(),
            order_by_desc: self.order_by_desc.clone(),
            distinct: self.distinct,
            take: self.take,
        }
    }
}

impl<T> QueryPlan<T> {
    pub fn from_specification<S>(spec: &S) -> Self
    where
        S: QuerySpecification<T> + ?Sized,
    {
        Self {
            criteria: spec.criteria().cloned(),
            order_by: spec.order_by().cloned(),
            order_by_desc: spec.order_by_desc().cloned(),
            distinct: spec.is_distinct(),
            take: None,
        }
    }

    /// Plan returning every entity in data-source order.
    pub fn unfiltered() -> Self {
        Self {
            criteria: None,
            order_by: None,
            order_by_desc: None,
            distinct: false,
            take: None,
        }
    }

    /// Limit the plan to its first result.
    pub fn first(self) -> Self {
        self.take(1)
    }

    pub fn take(mut self, limit: usize) -> Self {
        self.take = Some(limit);
        self
    }

    pub fn criteria(&self) -> Option<&Predicate<T>> {
        self.criteria.as_ref()
    }

    pub fn order_by(&self) -> Option<&KeySelector<T>> {
        self.order_by.as_ref()
    }

    pub fn order_by_desc(&self) -> Option<&KeySelector<T>> {
        self.order_by_desc.as_ref()
    }

    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    pub fn limit(&self) -> Option<usize> {
        self.take
    }

    /// Steps 1-3: filter then order, by reference.
    fn select_rows<'a, I>(&self, items: I) -> Vec<&'a T>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let mut rows: Vec<&'a T> = match &self.criteria {
            Some(criteria) => items.into_iter().filter(|item| criteria.matches(item)).collect(),
            None => items.into_iter().collect(),
        };

        if let Some(key) = &self.order_by {
            rows.sort_by(|a, b| key.compare(a, b));
        }
        if let Some(key) = &self.order_by_desc {
            rows.sort_by(|a, b| key.compare(b, a));
        }

        rows
    }
}

impl<T: Entity> QueryPlan<T> {
    /// Evaluate the plan over rows held in memory.
    ///
    /// `items` must be yielded in the data source's default order; that order is
    /// preserved for rows the plan does not reorder. Distinct entity queries
    /// deduplicate by identity.
    pub fn evaluate<'a, I>(&self, items: I) -> Vec<T>
    where
        I: IntoIterator<Item = &'a T>,
    {
        let rows = self.select_rows(items);
        let limit = self.take.unwrap_or(usize::MAX);

        if self.distinct {
            let mut seen = HashSet::new();
            rows.into_iter()
                .filter(|row| seen.insert(row.id().clone()))
                .take(limit)
                .cloned()
                .collect()
        } else {
            rows.into_iter().take(limit).cloned().collect()
        }
    }
}

/// Projected query ready for execution.
#[derive(Debug)]
pub struct ProjectedPlan<T, R> {
    plan: QueryPlan<T>,
    projection: Projection<T, R>,
}

impl<T, R> Clone for ProjectedPlan<T, R> {
    fn clone(&self) -> Self {
        Self {
            plan: self.plan.clone(),
            projection: self.projection.clone(),
        }
    }
}

impl<T, R: ProjectionOutput> ProjectedPlan<T, R> {
    /// Fails when the specification never declared a projection.
    pub fn from_specification<S>(spec: &S) -> Result<Self, SpecificationError>
    where
        S: ProjectedQuerySpecification<T, Output = R> + ?Sized,
    {
        let projection = spec
            .select()
            .cloned()
            .ok_or(SpecificationError::MissingProjection {
                specification: core::any::type_name::<S>(),
            })?;

        Ok(Self {
            plan: QueryPlan::from_specification(spec),
            projection,
        })
    }

    pub fn first(self) -> Self {
        self.take(1)
    }

    pub fn take(mut self, limit: usize) -> Self {
        self.plan = self.plan.take(limit);
        self
    }

    /// The entity-level part of the plan (criteria, ordering, distinct, take).
    pub fn query(&self) -> &QueryPlan<T> {
        &self.plan
    }

    pub fn projection(&self) -> &Projection<T, R> {
        &self.projection
    }

    /// Evaluate over rows held in memory; distinct applies to projected values.
    pub fn evaluate<'a, I>(&self, items: I) -> Vec<R>
    where
        I: IntoIterator<Item = &'a T>,
        T: 'a,
    {
        let projected = self
            .plan
            .select_rows(items)
            .into_iter()
            .map(|row| self.projection.apply(row));
        let limit = self.plan.take.unwrap_or(usize::MAX);

        if self.plan.distinct {
            let mut seen = HashSet::new();
            projected
                .filter(|value| seen.insert(value.clone()))
                .take(limit)
                .collect()
        } else {
            projected.take(limit).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use storefront_core::RecordId;

    use super::*;
    use crate::base::{Specification, SpecificationBuilder};

    #[derive(Debug, Clone, PartialEq, Eq)]
    struct Item {
        id: RecordId,
        brand: String,
        price: u64,
    }

    impl Entity for Item {
        type Id = RecordId;

        fn id(&self) -> &RecordId {
            &self.id
        }

        fn assign_id(&mut self, id: RecordId) {
            self.id = id;
        }
    }

    fn item(id: u64, brand: &str, price: u64) -> Item {
        Item {
            id: RecordId::new(id),
            brand: brand.to_string(),
            price,
        }
    }

    fn ids(items: &[Item]) -> Vec<u64> {
        items.iter().map(|i| i.id.get()).collect()
    }

    #[test]
    fn unfiltered_plan_preserves_source_order() {
        let rows = vec![item(1, "A", 30), item(2, "B", 10), item(3, "A", 20)];
        let out = QueryPlan::unfiltered().evaluate(&rows);
        assert_eq!(ids(&out), vec![1, 2, 3]);

        let plan = QueryPlan::from_specification(&Specification::all());
        assert!(plan.criteria().is_none());
        assert!(!plan.is_distinct());
        assert_eq!(ids(&plan.evaluate(&rows)), vec![1, 2, 3]);
    }

    #[test]
    fn plans_expose_their_shape() {
        let spec = SpecificationBuilder::matching("brand", |i: &Item| i.brand == "A")
            .order_by_desc("price", |i: &Item| i.price)
            .select("brand", |i: &Item| i.brand.clone())
            .distinct()
            .build();

        let plan = ProjectedPlan::from_specification(&spec).unwrap();
        assert_eq!(plan.query().limit(), None);
        assert_eq!(plan.projection().label(), "brand");

        let plan = plan.first();
        let query = plan.query();
        assert_eq!(query.limit(), Some(1));
        assert_eq!(query.criteria().unwrap().label(), "brand");
        assert!(query.order_by().is_none());
        assert_eq!(query.order_by_desc().unwrap().label(), "price");
        assert!(query.is_distinct());
    }

    #[test]
    fn criteria_filters_rows() {
        let rows = vec![item(1, "A", 30), item(2, "B", 10), item(3, "A", 20)];
        let spec = SpecificationBuilder::matching("brand", |i: &Item| i.brand == "A").build();
        let out = QueryPlan::from_specification(&spec).evaluate(&rows);
        assert_eq!(ids(&out), vec![1, 3]);
    }

    #[test]
    fn order_by_sorts_ascending_and_is_stable() {
        let rows = vec![item(1, "B", 10), item(2, "A", 10), item(3, "A", 5)];
        let spec = SpecificationBuilder::<Item>::unfiltered().order_by("price", |i: &Item| i.price).build();
        let out = QueryPlan::from_specification(&spec).evaluate(&rows);
        assert_eq!(ids(&out), vec![3, 1, 2]);
    }

    #[test]
    fn order_by_desc_sorts_descending() {
        let rows = vec![item(1, "A", 10), item(2, "B", 30), item(3, "C", 20)];
        let spec = SpecificationBuilder::<Item>::unfiltered()
            .order_by_desc("price", |i: &Item| i.price)
            .build();
        let out = QueryPlan::from_specification(&spec).evaluate(&rows);
        assert_eq!(ids(&out), vec![2, 3, 1]);
    }

    #[test]
    fn descending_key_is_primary_when_both_are_declared() {
        let rows = vec![
            item(1, "B", 10),
            item(2, "A", 20),
            item(3, "A", 10),
            item(4, "B", 20),
        ];
        let spec = SpecificationBuilder::<Item>::unfiltered()
            .order_by("brand", |i: &Item| i.brand.clone())
            .order_by_desc("price", |i: &Item| i.price)
            .build();
        let out = QueryPlan::from_specification(&spec).evaluate(&rows);
        assert_eq!(ids(&out), vec![2, 4, 3, 1]);
    }

    #[test]
    fn first_takes_head_of_ordered_result() {
        let rows = vec![item(1, "A", 30), item(2, "B", 10), item(3, "A", 20)];
        let spec = SpecificationBuilder::<Item>::unfiltered().order_by("price", |i: &Item| i.price).build();
        let out = QueryPlan::from_specification(&spec).first().evaluate(&rows);
        assert_eq!(ids(&out), vec![2]);
    }

    #[test]
    fn distinct_entity_plan_deduplicates_by_identity() {
        let rows = vec![item(1, "A", 30), item(1, "A", 30), item(2, "B", 10)];
        let spec = SpecificationBuilder::<Item>::unfiltered().distinct().build();
        let out = QueryPlan::from_specification(&spec).evaluate(&rows);
        assert_eq!(ids(&out), vec![1, 2]);
    }

    #[test]
    fn distinct_projection_keeps_first_occurrence() {
        let rows = vec![item(1, "A", 30), item(2, "B", 10), item(3, "A", 20)];
        let spec = SpecificationBuilder::<Item>::unfiltered()
            .select("brand", |i: &Item| i.brand.clone())
            .distinct()
            .build();
        let plan = ProjectedPlan::from_specification(&spec).unwrap();
        assert_eq!(plan.evaluate(&rows), vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn distinct_applies_before_take() {
        let rows = vec![item(1, "A", 30), item(2, "A", 10), item(3, "B", 20)];
        let spec = SpecificationBuilder::<Item>::unfiltered()
            .select("brand", |i: &Item| i.brand.clone())
            .distinct()
            .build();
        let plan = ProjectedPlan::from_specification(&spec).unwrap().take(2);
        assert_eq!(plan.evaluate(&rows), vec!["A".to_string(), "B".to_string()]);
    }

    #[test]
    fn projection_without_distinct_keeps_duplicates() {
        let rows = vec![item(1, "A", 30), item(2, "B", 10), item(3, "A", 20)];
        let spec = SpecificationBuilder::<Item>::unfiltered()
            .select("brand", |i: &Item| i.brand.clone())
            .build();
        let plan = ProjectedPlan::from_specification(&spec).unwrap();
        assert_eq!(plan.evaluate(&rows).len(), 3);
    }

    #[test]
    fn projected_plan_requires_a_projection() {
        let spec = SpecificationBuilder::<Item>::unfiltered().projected::<String>().distinct().build();
        let err = ProjectedPlan::from_specification(&spec).unwrap_err();
        match err {
            SpecificationError::MissingProjection { specification } => {
                assert!(specification.contains("ProjectedSpecification"));
            }
        }
    }

    fn arb_items() -> impl Strategy<Value = Vec<Item>> {
        prop::collection::vec(("[A-D]", 0u64..100), 0..40).prop_map(|rows| {
            rows.into_iter()
                .enumerate()
                .map(|(idx, (brand, price))| item(idx as u64 + 1, &brand, price))
                .collect()
        })
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: the result is exactly the matching subset, in source order.
        #[test]
        fn filter_returns_exact_subset(rows in arb_items(), threshold in 0u64..100) {
            let spec = SpecificationBuilder::matching("price", move |i: &Item| i.price >= threshold).build();
            let out = QueryPlan::from_specification(&spec).evaluate(&rows);
            let expected: Vec<Item> = rows.iter().filter(|i| i.price >= threshold).cloned().collect();
            prop_assert_eq!(out, expected);
        }

        /// Property: distinct projection yields every projected value exactly once.
        #[test]
        fn distinct_projection_yields_each_value_once(rows in arb_items()) {
            let spec = SpecificationBuilder::<Item>::unfiltered()
                .select("brand", |i: &Item| i.brand.clone())
                .distinct()
                .build();
            let out = ProjectedPlan::from_specification(&spec).unwrap().evaluate(&rows);

            let unique: HashSet<&String> = out.iter().collect();
            prop_assert_eq!(unique.len(), out.len());

            let all: HashSet<String> = rows.iter().map(|i| i.brand.clone()).collect();
            prop_assert_eq!(all, out.iter().cloned().collect::<HashSet<String>>());
        }

        /// Property: the same plan over unchanged rows yields the same result.
        #[test]
        fn evaluation_is_repeatable(rows in arb_items()) {
            let spec = SpecificationBuilder::<Item>::unfiltered()
                .order_by_desc("price", |i: &Item| i.price)
                .build();
            let plan = QueryPlan::from_specification(&spec);
            prop_assert_eq!(plan.evaluate(&rows), plan.evaluate(&rows));
        }
    }
}
