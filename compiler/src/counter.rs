/// Item counters of the ordered lists currently open, innermost last.
#[derive(Debug, Default)]
pub struct ListCounters {
    counters: Vec<u64>,
}

impl ListCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an ordered list whose first item is numbered `start`.
    pub fn open(&mut self, start: u64) {
        self.counters.push(start);
    }

    /// Number for the next item of the innermost ordered list.
    ///
    /// Returns `None` when no ordered list is open.
    pub fn next(&mut self) -> Option<u64> {
        let top = self.counters.last_mut()?;
        let n = *top;
        *top = top.saturating_add(1);
        Some(n)
    }

    pub fn close(&mut self) -> Option<u64> {
        self.counters.pop()
    }

    pub fn depth(&self) -> usize {
        self.counters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counters.is_empty()
    }

    pub fn clear(&mut self) {
        self.counters.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_from_start() {
        let mut c = ListCounters::new();
        c.open(1);
        assert_eq!(c.next(), Some(1));
        assert_eq!(c.next(), Some(2));
        assert_eq!(c.close(), Some(3));
        assert!(c.is_empty());
    }

    #[test]
    fn nested_lists_keep_separate_counts() {
        let mut c = ListCounters::new();
        c.open(1);
        c.next();
        c.next();
        c.open(1);
        assert_eq!(c.next(), Some(1));
        c.close();
        assert_eq!(c.next(), Some(3));
    }

    #[test]
    fn count_stops_at_the_largest_number() {
        let mut c = ListCounters::new();
        c.open(u64::MAX - 1);
        assert_eq!(c.next(), Some(u64::MAX - 1));
        assert_eq!(c.next(), Some(u64::MAX));
        assert_eq!(c.next(), Some(u64::MAX));
    }

    #[test]
    fn next_without_open_list() {
        let mut c = ListCounters::new();
        assert_eq!(c.next(), None);
        assert_eq!(c.close(), None);
    }
}
