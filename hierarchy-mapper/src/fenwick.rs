use alloc::vec::Vec;
use core::cmp;

/// Prefix sums over the visible row counts of one branch's children.
///
/// Slot `i` holds the subtree size of the `i`-th child, so `prefix_rows(i)` is the number of
/// rows emitted by the siblings before it.
#[derive(Clone, Debug)]
pub(crate) struct Fenwick {
    tree: Vec<u64>, // 1-indexed
    total: u64,
    max_bit: usize,
}

impl Fenwick {
    pub(crate) fn from_rows(rows: impl ExactSizeIterator<Item = u64>) -> Self {
        let n = rows.len();
        let mut tree = alloc::vec![0u64; n + 1];
        let mut total = 0u64;
        for (i, v) in (1..=n).zip(rows) {
            total = total.saturating_add(v);
            tree[i] = tree[i].saturating_add(v);
            let j = i + lsb(i);
            if j <= n {
                tree[j] = tree[j].saturating_add(tree[i]);
            }
        }
        Self {
            tree,
            total,
            max_bit: highest_power_of_two_leq(n),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.tree.len().saturating_sub(1)
    }

    pub(crate) fn add(&mut self, slot: usize, delta: i64) {
        let n = self.len();
        if slot >= n || delta == 0 {
            return;
        }
        if delta > 0 {
            self.total = self.total.saturating_add(delta as u64);
        } else {
            self.total = self.total.saturating_sub(delta.unsigned_abs());
        }
        let mut i = slot + 1;
        while i <= n {
            let next = self.tree[i] as i128 + delta as i128;
            debug_assert!(next >= 0, "row count underflow (slot={slot}, delta={delta})");
            self.tree[i] = next.clamp(0, u64::MAX as i128) as u64;
            i += lsb(i);
        }
    }

    /// Sum of the first `count` slots.
    pub(crate) fn prefix_rows(&self, count: usize) -> u64 {
        let mut i = cmp::min(count, self.len());
        let mut sum = 0u64;
        while i > 0 {
            sum = sum.saturating_add(self.tree[i]);
            i &= i - 1;
        }
        sum
    }

    pub(crate) fn total(&self) -> u64 {
        self.total
    }

    /// Returns the number of leading slots whose combined rows are `<= target`.
    ///
    /// Every slot holds at least one row, so for `target < total()` this is the slot whose
    /// subtree contains relative row `target`.
    pub(crate) fn slot_for_row(&self, mut target: u64) -> usize {
        let n = self.len();
        let mut idx = 0usize;
        let mut bit = self.max_bit;
        while bit != 0 {
            let next = idx + bit;
            if next <= n && self.tree[next] <= target {
                target -= self.tree[next];
                idx = next;
            }
            bit >>= 1;
        }
        idx
    }
}

fn lsb(i: usize) -> usize {
    i & i.wrapping_neg()
}

fn highest_power_of_two_leq(n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    let mut p = 1usize;
    while p <= n / 2 {
        p <<= 1;
    }
    p
}

#[cfg(test)]
mod tests {
    use super::Fenwick;

    #[test]
    fn prefix_rows_and_slot_lookup_agree() {
        let rows = [1u64, 3, 1, 5];
        let mut f = Fenwick::from_rows(rows.iter().copied());
        assert_eq!(f.total(), 10);
        assert_eq!(f.prefix_rows(2), 4);
        assert_eq!(f.slot_for_row(0), 0);
        assert_eq!(f.slot_for_row(3), 1);
        assert_eq!(f.slot_for_row(4), 2);
        assert_eq!(f.slot_for_row(9), 3);

        f.add(1, -2);
        assert_eq!(f.total(), 8);
        assert_eq!(f.prefix_rows(2), 2);
        assert_eq!(f.slot_for_row(2), 2);
    }

    #[test]
    fn empty_branch_has_no_rows() {
        let f = Fenwick::from_rows(core::iter::empty());
        assert_eq!(f.len(), 0);
        assert_eq!(f.total(), 0);
        assert_eq!(f.slot_for_row(0), 0);
    }
}
