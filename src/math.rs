use std::collections::{BTreeMap, BTreeSet};

/// Type alias for sets, we use this to hide which type of `HashSet` we are actually using.
pub type Set<S> = fxhash::FxHashSet<S>;
/// Type alias for maps, we use this to hide which type of `HashMap` we are actually using.
pub type Map<K, V> = fxhash::FxHashMap<K, V>;

/// Sets that remember the order in which elements were inserted.
pub type IndexedSet<S> = indexmap::IndexSet<S>;
/// Maps that remember the order in which keys were inserted.
pub type IndexedMap<K, V> = indexmap::IndexMap<K, V>;

/// Type alias for sets that iterate in sorted order.
pub type OrderedSet<S> = BTreeSet<S>;
/// Type alias for maps that iterate in sorted key order.
pub type OrderedMap<K, V> = BTreeMap<K, V>;

/// Represents a bijective mapping between `L` and `R`, that is a mapping which associates
/// each `L` with precisely one `R` and vice versa.
pub type Bijection<L, R> = bimap::BiBTreeMap<L, R>;

/// A partition is a different view on an equivalence relation, by grouping elements of
/// type `I` into their respective classes under the relation.
///
/// Classes are kept in a vector so that they can be addressed by position. A class is
/// only ever split, never merged, which is what partition refinement relies on.
#[derive(Debug, Clone)]
pub struct Partition<I: Ord>(Vec<BTreeSet<I>>);

impl<I: Ord> std::ops::Deref for Partition<I> {
    type Target = Vec<BTreeSet<I>>;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<'a, I: Ord> IntoIterator for &'a Partition<I> {
    type Item = &'a BTreeSet<I>;
    type IntoIter = std::slice::Iter<'a, BTreeSet<I>>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl<I: Ord> PartialEq for Partition<I> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|o| other.contains(o))
    }
}
impl<I: Ord> Eq for Partition<I> {}

impl<I: Ord + Clone> Partition<I> {
    /// Returns the size of the partition, i.e. the number of classes.
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Builds a new partition from an iterator that yields iterators which yield
    /// elements of type `I`. Empty classes are dropped.
    pub fn new<X: IntoIterator<Item = I>, Y: IntoIterator<Item = X>>(iter: Y) -> Self {
        Self(
            iter.into_iter()
                .map(|it| it.into_iter().collect::<BTreeSet<_>>())
                .filter(|class| !class.is_empty())
                .collect(),
        )
    }

    /// Returns the position of the class containing `element`, if any.
    pub fn class_of(&self, element: &I) -> Option<usize> {
        self.0.iter().position(|class| class.contains(element))
    }

    /// Splits the class at position `class` into the elements that are contained in
    /// `splitter` and those that are not. If both parts are non-empty, the class at
    /// `class` is replaced by the intersection and the difference is appended. Returns
    /// the position of the appended class in that case and `None` if nothing changed.
    pub fn split(&mut self, class: usize, splitter: &BTreeSet<I>) -> Option<usize> {
        let (inside, outside): (BTreeSet<I>, BTreeSet<I>) = self
            .0
            .get(class)?
            .iter()
            .cloned()
            .partition(|q| splitter.contains(q));
        if inside.is_empty() || outside.is_empty() {
            return None;
        }
        self.0[class] = inside;
        self.0.push(outside);
        Some(self.0.len() - 1)
    }
}
