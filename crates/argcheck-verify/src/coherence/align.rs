//! Element alignment between two artifacts
//!
//! Structural links (shared labels or ids) come first. An element without
//! a structural link falls back to the closest text on the other side,
//! within the Levenshtein tolerance.

use crate::text::best_match;
use std::collections::BTreeSet;

/// Counterparts of every element on both sides
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Alignment {
    /// For each first-side element, its second-side counterparts
    pub forward: Vec<Vec<usize>>,
    /// For each second-side element, its first-side counterparts
    pub backward: Vec<Vec<usize>>,
}

impl Alignment {
    /// First-side elements without counterpart
    pub fn uncovered_forward(&self) -> impl Iterator<Item = usize> + '_ {
        self.forward.iter().enumerate().filter(|(_, c)| c.is_empty()).map(|(i, _)| i)
    }

    /// Second-side elements without counterpart
    pub fn uncovered_backward(&self) -> impl Iterator<Item = usize> + '_ {
        self.backward.iter().enumerate().filter(|(_, c)| c.is_empty()).map(|(i, _)| i)
    }

    /// Aligned pairs `(first, second)` in first-side order
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.forward
            .iter()
            .enumerate()
            .flat_map(|(i, targets)| targets.iter().map(move |j| (i, *j)))
    }
}

/// Align `first` with `second`
///
/// `links` are structural `(first, second)` index pairs; out-of-range
/// links are ignored. Texts are `None` for elements that cannot be
/// compared textually.
#[must_use]
pub fn align(
    first: &[Option<&str>],
    second: &[Option<&str>],
    links: &[(usize, usize)],
    tolerance: f64,
) -> Alignment {
    let mut forward = vec![BTreeSet::new(); first.len()];
    let mut backward = vec![BTreeSet::new(); second.len()];
    for &(i, j) in links {
        if i < first.len() && j < second.len() {
            forward[i].insert(j);
            backward[j].insert(i);
        }
    }
    fallback(&mut forward, first, second, tolerance);
    fallback(&mut backward, second, first, tolerance);
    Alignment {
        forward: forward.into_iter().map(|s| s.into_iter().collect()).collect(),
        backward: backward.into_iter().map(|s| s.into_iter().collect()).collect(),
    }
}

fn fallback(resolved: &mut [BTreeSet<usize>], from: &[Option<&str>], to: &[Option<&str>], tolerance: f64) {
    for (targets, text) in resolved.iter_mut().zip(from) {
        if !targets.is_empty() {
            continue;
        }
        let Some(text) = text else {
            continue;
        };
        if let Some((j, _)) = best_match(text, to.iter().copied(), tolerance) {
            targets.insert(j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn structural_links_win_over_text() {
        let first = [Some("the sky is blue"), Some("grass is green")];
        let second = [Some("grass is green"), Some("the sky is blue")];
        let a = align(&first, &second, &[(1, 1)], 0.1);
        assert_eq!(a.forward, vec![vec![1], vec![1]]);
        assert_eq!(a.backward, vec![vec![], vec![0, 1]]);
        assert_eq!(a.uncovered_backward().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn text_fallback_respects_tolerance() {
        let first = [Some("Taxes rise."), Some("Something unrelated"), None];
        let second = [Some("taxes  rise"), Some("prices go up")];
        let a = align(&first, &second, &[], 0.1);
        assert_eq!(a.forward, vec![vec![0], vec![], vec![]]);
        assert_eq!(a.uncovered_forward().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(a.pairs().collect::<Vec<_>>(), vec![(0, 0)]);
    }

    #[test]
    fn out_of_range_links_are_ignored() {
        let a = align(&[Some("a")], &[Some("b")], &[(0, 5), (3, 0)], 0.0);
        assert_eq!(a.forward, vec![Vec::<usize>::new()]);
    }

    fn texts() -> impl Strategy<Value = Vec<Option<String>>> {
        prop::collection::vec(prop::option::of("[ab ]{1,6}"), 0..6)
    }

    proptest! {
        #[test]
        fn coverage_is_symmetric(
            first in texts(),
            second in texts(),
            raw_links in prop::collection::vec((0usize..6, 0usize..6), 0..4),
            tolerance in 0.0f64..0.5,
        ) {
            let a: Vec<Option<&str>> = first.iter().map(Option::as_deref).collect();
            let b: Vec<Option<&str>> = second.iter().map(Option::as_deref).collect();
            let swapped: Vec<(usize, usize)> = raw_links.iter().map(|&(i, j)| (j, i)).collect();

            let ab = align(&a, &b, &raw_links, tolerance);
            let ba = align(&b, &a, &swapped, tolerance);
            let covered = |v: &[Vec<usize>]| v.iter().map(|c| !c.is_empty()).collect::<Vec<_>>();
            prop_assert_eq!(covered(&ab.forward), covered(&ba.backward));
            prop_assert_eq!(covered(&ab.backward), covered(&ba.forward));
        }
    }
}
