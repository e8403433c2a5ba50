// THEORY:
// Every worker runs identical code, so the only thing that tells two workers apart
// is their id. The partitioner turns that id into a contiguous, half-open slice of
// some index range. Because the slices never overlap and always cover the whole
// range, workers can write straight into shared buffers without taking a lock.
//
// The ratio is computed in f64 and truncated on both ends, so neighbouring slices
// share a boundary exactly: worker `t`'s end is worker `t + 1`'s start. The last
// worker always ends at `range`; `(1.0 / 49.0) * 49.0` is not 1.0 in f64.

use std::ops::Range;

/// Returns the slice of `[0, range)` owned by worker `tid` out of `workers`.
///
/// `workers` must be at least 1; `RunConfig::validate` guarantees this for the pipeline.
pub fn slice(tid: usize, workers: usize, range: usize) -> Range<usize> {
    debug_assert!(workers > 0, "partitioning over zero workers");
    let ratio = range as f64 / workers as f64;
    let start = (tid as f64 * ratio) as usize;
    let end = if tid + 1 == workers {
        range
    } else {
        (((tid + 1) as f64 * ratio) as usize).min(range)
    };
    start..end
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slices_cover_range_disjointly_in_order() {
        for workers in 1..=17 {
            for range in 0..=300 {
                let mut expected_start = 0;
                for tid in 0..workers {
                    let s = slice(tid, workers, range);
                    assert!(s.start <= s.end);
                    assert_eq!(
                    s.start, expected_start,
                    "gap or overlap at n={workers} r={range} t={tid}"
                );
                    expected_start = s.end;
                }
                assert_eq!(expected_start, range);
            }
        }
    }

    #[test]
    fn last_slice_absorbs_float_rounding() {
        assert!((1.0f64 / 49.0) * 49.0 < 1.0);
        assert_eq!(slice(48, 49, 1), 0..1);
    }

    #[test]
    fn empty_range_yields_empty_slices() {
        for tid in 0..4 {
            assert!(slice(tid, 4, 0).is_empty());
        }
    }

    #[test]
    fn more_workers_than_items() {
        let owned: Vec<usize> = (0..8).map(|t| slice(t, 8, 3).len()).collect();
        assert_eq!(owned.iter().sum::<usize>(), 3);
        assert_eq!(slice(7, 8, 3).end, 3);
    }

    #[test]
    fn large_pixel_ranges_stay_exact() {
        let range = 2048 * 2048;
        let s = slice(2, 3, range);
        assert_eq!(s.end, range);
        assert_eq!(s.start, (2.0 * (range as f64 / 3.0)) as usize);
    }
}
