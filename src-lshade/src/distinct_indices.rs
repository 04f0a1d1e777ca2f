use rand::Rng;

/// Uniform index in `0..pool_size` that is not in `exclude`.
pub(crate) fn random_index_excluding<R: Rng + ?Sized>(
    pool_size: usize,
    exclude: &[usize],
    rng: &mut R,
) -> usize {
    debug_assert!(
        (0..pool_size).any(|idx| !exclude.contains(&idx)),
        "no index left to draw from"
    );
    loop {
        let idx = rng.random_range(0..pool_size);
        if !exclude.contains(&idx) {
            return idx;
        }
    }
}
