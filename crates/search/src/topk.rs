use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use toolbelt_catalog::ToolId;

/// Candidate retained by the bounded selection
#[derive(Debug, Clone)]
pub(crate) struct HeapEntry {
    pub score: f64,
    pub name: String,
    pub id: ToolId,
}

impl HeapEntry {
    /// Total order matching the final ranking: higher score first, then
    /// ascending name, then ascending id. "Less" here means "worse".
    fn cmp_rank(&self, other: &Self) -> Ordering {
        self.score
            .total_cmp(&other.score)
            .then_with(|| other.name.cmp(&self.name))
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp_rank(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cmp_rank(other)
    }
}

/// Bounded min-heap keeping the `capacity` best candidates
///
/// Selecting a limit+offset window this way avoids sorting the whole
/// candidate set and lets the caller skip building explanations for
/// non-finalists.
pub(crate) struct TopK {
    capacity: usize,
    heap: BinaryHeap<Reverse<HeapEntry>>,
}

impl TopK {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            heap: BinaryHeap::with_capacity(capacity + 1),
        }
    }

    pub(crate) fn push(&mut self, entry: HeapEntry) {
        if self.capacity == 0 {
            return;
        }
        if self.heap.len() < self.capacity {
            self.heap.push(Reverse(entry));
            return;
        }
        if let Some(worst) = self.heap.peek() {
            if entry > worst.0 {
                self.heap.pop();
                self.heap.push(Reverse(entry));
            }
        }
    }

    /// Retained entries, best first
    pub(crate) fn into_sorted(self) -> Vec<HeapEntry> {
        let mut entries: Vec<HeapEntry> = self
            .heap
            .into_iter()
            .map(|Reverse(entry)| entry)
            .collect();
        entries.sort_by(|a, b| b.cmp(a));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use toolbelt_catalog::{Catalog, Tool};

    fn ids(n: usize) -> Vec<ToolId> {
        let mut catalog = Catalog::new();
        (0..n)
            .map(|i| catalog.register(Tool::new(format!("t{i}"), "")))
            .collect()
    }

    #[test]
    fn keeps_the_best_k_by_score() {
        let ids = ids(5);
        let mut topk = TopK::new(2);
        for (i, id) in ids.iter().enumerate() {
            topk.push(HeapEntry {
                score: i as f64,
                name: format!("t{i}"),
                id: *id,
            });
        }

        let kept = topk.into_sorted();
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].score, 4.0);
        assert_eq!(kept[1].score, 3.0);
    }

    #[test]
    fn ties_prefer_ascending_names() {
        let ids = ids(3);
        let mut topk = TopK::new(2);
        for (name, id) in ["zeta", "alpha", "mid"].iter().zip(&ids) {
            topk.push(HeapEntry {
                score: 1.0,
                name: (*name).to_string(),
                id: *id,
            });
        }

        let kept = topk.into_sorted();
        assert_eq!(kept[0].name, "alpha");
        assert_eq!(kept[1].name, "mid");
    }

    #[test]
    fn zero_capacity_retains_nothing() {
        let ids = ids(1);
        let mut topk = TopK::new(0);
        topk.push(HeapEntry {
            score: 9.0,
            name: "t0".to_string(),
            id: ids[0],
        });
        assert!(topk.into_sorted().is_empty());
    }
}
