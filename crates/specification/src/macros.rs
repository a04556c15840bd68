//! Delegation for named specifications.

/// Implement the specification contracts for a named specification by delegating to
/// the built value it wraps.
///
/// ```ignore
/// pub struct BrandListSpecification {
///     inner: ProjectedSpecification<Product, String>,
/// }
///
/// delegate_specification!(projected BrandListSpecification => Product, String; inner);
/// ```
#[macro_export]
macro_rules! delegate_specification {
    (query $name:ty => $entity:ty; $field:ident) => {
        impl $crate::QuerySpecification<$entity> for $name {
            fn criteria(&self) -> Option<&$crate::Predicate<$entity>> {
                $crate::QuerySpecification::criteria(&self.$field)
            }

            fn order_by(&self) -> Option<&$crate::KeySelector<$entity>> {
                $crate::QuerySpecification::order_by(&self.$field)
            }

            fn order_by_desc(&self) -> Option<&$crate::KeySelector<$entity>> {
                $crate::QuerySpecification::order_by_desc(&self.$field)
            }

            fn is_distinct(&self) -> bool {
                $crate::QuerySpecification::is_distinct(&self.$field)
            }
        }
    };
    (projected $name:ty => $entity:ty, $output:ty; $field:ident) => {
        $crate::delegate_specification!(query $name => $entity; $field);

        impl $crate::ProjectedQuerySpecification<$entity> for $name {
            type Output = $output;

            fn select(&self) -> Option<&$crate::Projection<$entity, $output>> {
                $crate::ProjectedQuerySpecification::select(&self.$field)
            }
        }
    };
}
