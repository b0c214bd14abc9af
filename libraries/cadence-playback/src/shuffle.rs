//! Shuffled projection of the linear list
//!
//! Fisher-Yates over everything except an optional pinned first track.

use cadence_core::TrackId;
use rand::seq::SliceRandom;
use rand::{thread_rng, Rng};

/// Random permutation of `ids` with `first` (if present) forced to the front
pub fn shuffled_with_first(ids: &[TrackId], first: Option<&TrackId>) -> Vec<TrackId> {
    shuffled_with_first_rng(ids, first, &mut thread_rng())
}

/// Same as [`shuffled_with_first`] with a caller-supplied RNG
///
/// Only the first occurrence of `first` is pinned, so lists with duplicate
/// ids keep the same multiset.
pub fn shuffled_with_first_rng<R: Rng + ?Sized>(
    ids: &[TrackId],
    first: Option<&TrackId>,
    rng: &mut R,
) -> Vec<TrackId> {
    let mut rest = ids.to_vec();
    let head = first
        .and_then(|first| rest.iter().position(|id| id == first))
        .map(|pos| rest.remove(pos));

    rest.shuffle(rng);

    if let Some(head) = head {
        rest.insert(0, head);
    }
    rest
}
