//! Randomisation helpers used by `PlayMode::Shuffled`.

use rand::Rng;
use rand::seq::SliceRandom;

use crate::library::Track;

/// Return a uniformly random permutation of `tracks` (Fisher-Yates).
pub(super) fn shuffled<R: Rng + ?Sized>(tracks: &[Track], rng: &mut R) -> Vec<Track> {
    let mut order = tracks.to_vec();
    order.shuffle(rng);
    order
}

/// Pick a position in `0..len` that is neither `cursor` nor in `visited`.
///
/// When every other position has been visited, `visited` is cleared and the
/// pick is retried once, so a non-empty queue keeps making progress. A queue
/// of one track replays that track.
pub(super) fn pick_unvisited<R: Rng + ?Sized>(
    len: usize,
    cursor: Option<usize>,
    visited: &mut Vec<usize>,
    rng: &mut R,
) -> Option<usize> {
    if len == 0 {
        return None;
    }
    if len == 1 {
        visited.clear();
        return Some(0);
    }

    let candidates = |visited: &[usize]| -> Vec<usize> {
        (0..len)
            .filter(|p| Some(*p) != cursor && !visited.contains(p))
            .collect()
    };

    let mut open = candidates(visited);
    if open.is_empty() {
        visited.clear();
        open = candidates(visited);
    }
    open.choose(rng).copied()
}
