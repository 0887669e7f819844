//! Top-K selection of episodes by cumulative reward.
use crate::Episode;
use ordered_float::OrderedFloat;
use std::{
    cmp::{Ordering, Reverse},
    collections::BinaryHeap,
};

/// Ranking key of an episode: negated cumulative reward, then arrival order.
///
/// The smallest key belongs to the episode with the largest reward; among
/// equal rewards the one pushed first wins. A NaN reward ranks last.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct EpisodeKey {
    neg_reward: OrderedFloat<f64>,
    seq: u64,
}

#[derive(Debug)]
struct Entry {
    key: EpisodeKey,
    episode: Episode,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

/// Keeps the episodes of one generation and yields the best `topn`.
///
/// Pushing is unbounded; only [`drain_top`](EpisodeSelector::drain_top) is
/// capped. Draining empties the selector, so nothing carries over into the
/// next generation.
#[derive(Debug)]
pub struct EpisodeSelector {
    topn: usize,
    heap: BinaryHeap<Reverse<Entry>>,
    seq: u64,
}

impl EpisodeSelector {
    /// Constructs a selector yielding at most `topn` episodes per drain.
    pub fn new(topn: usize) -> Self {
        Self {
            topn,
            heap: BinaryHeap::new(),
            seq: 0,
        }
    }

    /// Capacity of a drain.
    pub fn topn(&self) -> usize {
        self.topn
    }

    /// Adds an episode of the current generation.
    pub fn push(&mut self, episode: Episode) {
        let key = EpisodeKey {
            neg_reward: OrderedFloat(-episode.total_reward()),
            seq: self.seq,
        };
        self.seq += 1;
        self.heap.push(Reverse(Entry { key, episode }));
    }

    /// Number of episodes held.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Returns `true` if no episode is held.
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Yields up to `topn` episodes by descending cumulative reward, then clears.
    pub fn drain_top(&mut self) -> Vec<Episode> {
        let mut top = Vec::with_capacity(self.topn.min(self.heap.len()));
        while top.len() < self.topn {
            match self.heap.pop() {
                Some(Reverse(entry)) => top.push(entry.episode),
                None => break,
            }
        }
        self.clear();
        top
    }

    /// Discards every episode held.
    pub fn clear(&mut self) {
        self.heap.clear();
        self.seq = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StepRecord;

    fn episode(tag: f64, rewards: &[f64]) -> Episode {
        rewards
            .iter()
            .map(|&r| StepRecord::new(vec![tag], 0.0, r))
            .collect()
    }

    fn tag(episode: &Episode) -> f64 {
        episode.steps()[0].state[0]
    }

    #[test]
    fn test_drain_top_two_of_four() {
        let mut selector = EpisodeSelector::new(2);
        selector.push(episode(0.0, &[10.0]));
        selector.push(episode(1.0, &[20.0, 20.0]));
        selector.push(episode(2.0, &[25.0]));
        selector.push(episode(3.0, &[40.0]));

        let top = selector.drain_top();
        assert_eq!(top.len(), 2);
        assert!(top.iter().all(|e| e.total_reward() == 40.0));
        // Equal rewards come out in arrival order.
        assert_eq!(tag(&top[0]), 1.0);
        assert_eq!(tag(&top[1]), 3.0);
        assert!(selector.is_empty());
    }

    #[test]
    fn test_drain_is_sorted_and_bounded() {
        let mut selector = EpisodeSelector::new(4);
        let returns = [3.0, -1.0, 8.0, 0.5, 8.0, 12.0, -7.0];
        for (i, r) in returns.iter().enumerate() {
            selector.push(episode(i as f64, &[*r]));
        }
        assert_eq!(selector.len(), returns.len());

        let top: Vec<f64> = selector.drain_top().iter().map(|e| e.total_reward()).collect();
        assert_eq!(top, vec![12.0, 8.0, 8.0, 3.0]);
    }

    #[test]
    fn test_fewer_episodes_than_topn() {
        let mut selector = EpisodeSelector::new(5);
        selector.push(episode(0.0, &[1.0]));
        selector.push(episode(1.0, &[2.0]));
        let top = selector.drain_top();
        assert_eq!(top.len(), 2);
        assert_eq!(tag(&top[0]), 1.0);
        assert!(EpisodeSelector::new(0).drain_top().is_empty());
    }

    #[test]
    fn test_no_carry_over_between_generations() {
        let mut selector = EpisodeSelector::new(1);
        selector.push(episode(0.0, &[100.0]));
        selector.push(episode(1.0, &[50.0]));
        assert_eq!(tag(&selector.drain_top()[0]), 0.0);

        selector.push(episode(2.0, &[1.0]));
        let top = selector.drain_top();
        assert_eq!(top.len(), 1);
        assert_eq!(tag(&top[0]), 2.0);
    }

    #[test]
    fn test_nan_ranks_last() {
        let mut selector = EpisodeSelector::new(3);
        selector.push(episode(0.0, &[f64::NAN]));
        selector.push(episode(1.0, &[-5.0]));
        selector.push(episode(2.0, &[5.0]));
        let tags: Vec<f64> = selector.drain_top().iter().map(tag).collect();
        assert_eq!(tags, vec![2.0, 1.0, 0.0]);
    }
}
