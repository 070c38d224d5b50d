use rand::seq::SliceRandom;
use rand::Rng;

/// Pick `need` out of `now` indices without replacement: shuffle 0..now and
/// take the prefix. Caller guarantees need <= now.
pub fn downsample_indices<R: Rng>(now: usize, need: usize, rng: &mut R) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..now).collect();
    indices.shuffle(rng);
    indices.truncate(need);
    indices
}

/// Grow `now` indices to `need` by sampling with replacement: tile the full
/// range 0..now floor(deficit / now) + 1 whole times, then append a shuffled
/// prefix of length deficit % now. Caller guarantees need > now > 0.
pub fn upsample_indices<R: Rng>(now: usize, need: usize, rng: &mut R) -> Vec<usize> {
    let deficit = need - now;
    let repeats = deficit / now + 1;
    let remainder = deficit % now;

    let mut indices = Vec::with_capacity(need);
    for _ in 0..repeats {
        indices.extend(0..now);
    }

    let mut extra: Vec<usize> = (0..now).collect();
    extra.shuffle(rng);
    indices.extend_from_slice(&extra[..remainder]);

    indices
}
