//! Opaque, labelled query expressions.
//!
//! A data source receives these as closure handles it can evaluate directly. The
//! label names the attribute the expression reads, so a backend that translates
//! queries (or just logs them) has something stable to key on.

use core::cmp::Ordering;
use core::fmt;
use std::sync::Arc;

/// Filter predicate over `T`.
pub struct Predicate<T> {
    label: &'static str,
    test: Arc<dyn Fn(&T) -> bool + Send + Sync>,
}

impl<T> Predicate<T> {
    pub fn new<F>(label: &'static str, test: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            label,
            test: Arc::new(test),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn matches(&self, item: &T) -> bool {
        (self.test)(item)
    }
}

impl<T> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Self {
            label: self.label,
            test: Arc::clone(&self.test),
        }
    }
}

impl<T> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Predicate").field(&self.label).finish()
    }
}

/// Sort key selector over `T`.
///
/// Built from any `Fn(&T) -> K` with `K: Ord`; the key type is erased into a
/// comparator so selectors with different key types can live in one specification.
pub struct KeySelector<T> {
    label: &'static str,
    compare: Arc<dyn Fn(&T, &T) -> Ordering + Send + Sync>,
}

impl<T> KeySelector<T> {
    pub fn new<K, F>(label: &'static str, key: F) -> Self
    where
        K: Ord,
        F: Fn(&T) -> K + Send + Sync + 'static,
    {
        Self {
            label,
            compare: Arc::new(move |a, b| key(a).cmp(&key(b))),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Compare two items by their selected keys (ascending).
    pub fn compare(&self, a: &T, b: &T) -> Ordering {
        (self.compare)(a, b)
    }
}

impl<T> Clone for KeySelector<T> {
    fn clone(&self) -> Self {
        Self {
            label: self.label,
            compare: Arc::clone(&self.compare),
        }
    }
}

impl<T> fmt::Debug for KeySelector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("KeySelector").field(&self.label).finish()
    }
}

/// Projection from `T` to a derived result shape `R`.
pub struct Projection<T, R> {
    label: &'static str,
    map: Arc<dyn Fn(&T) -> R + Send + Sync>,
}

impl<T, R> Projection<T, R> {
    pub fn new<F>(label: &'static str, map: F) -> Self
    where
        F: Fn(&T) -> R + Send + Sync + 'static,
    {
        Self {
            label,
            map: Arc::new(map),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn apply(&self, item: &T) -> R {
        (self.map)(item)
    }
}

impl<T, R> Clone for Projection<T, R> {
    fn clone(&self) -> Self {
        Self {
            label: self.label,
            map: Arc::clone(&self.map),
        }
    }
}

impl<T, R> fmt::Debug for Projection<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Projection").field(&self.label).finish()
    }
}
