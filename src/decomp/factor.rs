//! Balanced factorization of a block count into per-axis block counts.
//!
//! Works like `MPI_Dims_create`: prime factors, largest first, are handed to
//! whichever free axis currently has the smallest product. Pinned axes stay
//! at 1. Free axes come back in non-increasing order.

/// Prime factors of `n`, largest first.
fn prime_factors(mut n: usize) -> Vec<usize> {
    let mut out = Vec::new();
    let mut p = 2;
    while p * p <= n {
        while n % p == 0 {
            out.push(p);
            n /= p;
        }
        p += 1;
    }
    if n > 1 {
        out.push(n);
    }
    out.reverse();
    out
}

/// Factor `n` over the axes where `free[q]` is true.
///
/// Returns `None` for `n == 0`, or when `n > 1` and no axis is free.
pub fn balanced_dims(n: usize, free: [bool; 3]) -> Option<[usize; 3]> {
    if n == 0 {
        return None;
    }
    let axes: Vec<usize> = (0..3).filter(|&q| free[q]).collect();
    if axes.is_empty() {
        return (n == 1).then_some([1, 1, 1]);
    }
    let mut prods = vec![1usize; axes.len()];
    for f in prime_factors(n) {
        if let Some(slot) = prods
            .iter_mut()
            .enumerate()
            .min_by_key(|(i, p)| (**p, *i))
            .map(|(_, p)| p)
        {
            *slot *= f;
        }
    }
    prods.sort_unstable_by(|a, b| b.cmp(a));
    let mut dims = [1usize; 3];
    for (q, p) in axes.into_iter().zip(prods) {
        dims[q] = p;
    }
    Some(dims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factors_are_descending_primes() {
        assert_eq!(prime_factors(12), vec![3, 2, 2]);
        assert_eq!(prime_factors(1), Vec::<usize>::new());
        assert_eq!(prime_factors(97), vec![97]);
    }

    #[test]
    fn cubes_and_near_cubes() {
        assert_eq!(balanced_dims(8, [true; 3]), Some([2, 2, 2]));
        assert_eq!(balanced_dims(12, [true; 3]), Some([3, 2, 2]));
        assert_eq!(balanced_dims(3, [true; 3]), Some([3, 1, 1]));
        assert_eq!(balanced_dims(1, [true; 3]), Some([1, 1, 1]));
    }

    #[test]
    fn pinned_axes_stay_one() {
        assert_eq!(balanced_dims(6, [true, true, false]), Some([3, 2, 1]));
        assert_eq!(balanced_dims(6, [false, true, true]), Some([1, 3, 2]));
        assert_eq!(balanced_dims(4, [false; 3]), None);
        assert_eq!(balanced_dims(1, [false; 3]), Some([1, 1, 1]));
    }

    #[test]
    fn zero_is_rejected() {
        assert_eq!(balanced_dims(0, [true; 3]), None);
    }

    #[test]
    fn product_is_preserved() {
        for n in 1..200 {
            let d = balanced_dims(n, [true; 3]).unwrap();
            assert_eq!(d.iter().product::<usize>(), n);
            assert!(d[0] >= d[1] && d[1] >= d[2]);
        }
    }
}
