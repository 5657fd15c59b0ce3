/// Cycles a fixed pool of values over a larger batch.
///
/// When fewer parameter sets exist than accounts, slot `i` wraps around
/// with plain modulo indexing, matching how asset pools are assigned:
/// unique first, then reused in order.
#[derive(Debug, Clone)]
pub struct Rotation<T> {
    items: Vec<T>,
}

impl<T> Rotation<T> {
    /// Returns `None` for an empty pool, which keeps `get` panic-free.
    pub fn new(items: Vec<T>) -> Option<Self> {
        if items.is_empty() {
            None
        } else {
            Some(Self { items })
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Value for slot `index`, wrapping around the pool.
    pub fn get(&self, index: usize) -> &T {
        &self.items[index % self.items.len()]
    }

    /// Whether `count` consumers would reuse values. Callers use this to
    /// warn before a run starts.
    pub fn wraps_for(&self, count: usize) -> bool {
        count > self.items.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_pools_are_rejected_at_construction() {
        assert!(Rotation::<u8>::new(vec![]).is_none());
    }

    #[test]
    fn indexing_wraps_with_modulo() {
        let rotation = Rotation::new(vec!["a", "b", "c"]).unwrap();
        let assigned: Vec<&str> = (0..7).map(|i| *rotation.get(i)).collect();
        assert_eq!(assigned, vec!["a", "b", "c", "a", "b", "c", "a"]);
    }

    #[test]
    fn wrap_detection_compares_against_the_pool_size() {
        let rotation = Rotation::new(vec![1, 2, 3]).unwrap();
        assert!(!rotation.wraps_for(2));
        assert!(!rotation.wraps_for(3));
        assert!(rotation.wraps_for(4));
    }
}
