//! Position bookkeeping shared by every iterator backend.

/// Direction of iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

/// Cursor over `[base, base + num)`.
///
/// `pos` counts the steps taken from the starting end. It is meaningless
/// until the first advance primes the cursor, and equals `num` once the
/// range is exhausted. The reverse direction reports `base + (num - pos - 1)`
/// so both directions visit the same indices.
#[derive(Debug, Clone)]
pub(crate) struct Cursor {
    base: u64,
    num: u64,
    pos: u64,
    primed: bool,
    direction: Direction,
}

impl Cursor {
    /// # Panics
    /// If `i > j`.
    pub(crate) fn new(i: u64, j: u64, direction: Direction) -> Self {
        assert!(i <= j, "invalid iteration range: i > j: i={} j={}", i, j);
        Self {
            base: i,
            num: j - i,
            pos: 0,
            primed: false,
            direction,
        }
    }

    /// Moves `n` steps and returns the new index, or None once the range is
    /// exhausted. The first call primes the cursor so that `advance(1)` lands
    /// on the first index of the range.
    ///
    /// # Panics
    /// If called with `n == 0` before the cursor is primed.
    pub(crate) fn advance(&mut self, n: u64) -> Option<u64> {
        assert!(n > 0 || self.primed, "must call next() before skip(0)");

        let mut n = n;
        if !self.primed {
            n -= 1;
            self.primed = true;
        }
        if n >= self.num - self.pos {
            self.pos = self.num;
            return None;
        }
        self.pos += n;
        Some(self.current())
    }

    /// Marks the range as exhausted.
    pub(crate) fn exhaust(&mut self) {
        self.primed = true;
        self.pos = self.num;
    }

    /// Index of the current position.
    ///
    /// # Panics
    /// If the cursor is unprimed or exhausted.
    pub(crate) fn index(&self) -> u64 {
        self.check_active("index");
        self.current()
    }

    pub(crate) fn check_active(&self, op: &str) {
        assert!(self.primed, "must call next() before {}()", op);
        assert!(
            self.pos < self.num,
            "must not call {}() after next() returns false",
            op
        );
    }

    #[cfg(test)]
    pub(crate) fn is_active(&self) -> bool {
        self.primed && self.pos < self.num
    }

    fn current(&self) -> u64 {
        match self.direction {
            Direction::Forward => self.base + self.pos,
            Direction::Reverse => self.base + (self.num - self.pos - 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(mut cursor: Cursor) -> Vec<u64> {
        let mut out = Vec::new();
        while let Some(index) = cursor.advance(1) {
            out.push(index);
        }
        out
    }

    #[test]
    fn test_forward_and_reverse_visit_same_indices() {
        let forward = collect(Cursor::new(3, 9, Direction::Forward));
        let mut reverse = collect(Cursor::new(3, 9, Direction::Reverse));

        assert_eq!(forward, vec![3, 4, 5, 6, 7, 8]);
        assert_eq!(reverse, vec![8, 7, 6, 5, 4, 3]);

        reverse.reverse();
        assert_eq!(forward, reverse);
    }

    #[test]
    fn test_empty_range() {
        assert!(collect(Cursor::new(5, 5, Direction::Forward)).is_empty());
        assert!(collect(Cursor::new(0, 0, Direction::Reverse)).is_empty());
    }

    #[test]
    fn test_skip_matches_repeated_next() {
        for direction in [Direction::Forward, Direction::Reverse] {
            for n in 1..12 {
                let mut skipped = Cursor::new(2, 10, direction);
                let mut stepped = Cursor::new(2, 10, direction);

                let by_skip = skipped.advance(n);
                let mut by_next = None;
                for _ in 0..n {
                    by_next = stepped.advance(1);
                }

                assert_eq!(by_skip, by_next, "n={} direction={:?}", n, direction);
                assert_eq!(skipped.is_active(), stepped.is_active());
            }
        }
    }

    #[test]
    fn test_skip_zero_rereads_current() {
        let mut cursor = Cursor::new(0, 4, Direction::Forward);
        assert_eq!(cursor.advance(2), Some(1));
        assert_eq!(cursor.advance(0), Some(1));
        assert_eq!(cursor.index(), 1);
    }

    #[test]
    fn test_exhausted_stays_exhausted() {
        let mut cursor = Cursor::new(0, 2, Direction::Reverse);
        assert_eq!(cursor.advance(5), None);
        assert_eq!(cursor.advance(1), None);
        assert_eq!(cursor.advance(0), None);
        assert!(!cursor.is_active());
    }

    #[test]
    #[should_panic(expected = "must call next() before index()")]
    fn test_index_before_priming_panics() {
        Cursor::new(0, 4, Direction::Forward).index();
    }

    #[test]
    #[should_panic(expected = "must not call index() after next() returns false")]
    fn test_index_after_exhaustion_panics() {
        let mut cursor = Cursor::new(0, 1, Direction::Forward);
        cursor.advance(1);
        cursor.advance(1);
        cursor.index();
    }

    #[test]
    #[should_panic(expected = "must call next() before skip(0)")]
    fn test_skip_zero_before_priming_panics() {
        Cursor::new(0, 4, Direction::Forward).advance(0);
    }

    #[test]
    #[should_panic(expected = "i > j")]
    fn test_inverted_range_panics() {
        Cursor::new(4, 3, Direction::Forward);
    }
}
