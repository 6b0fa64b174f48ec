/// Squeeze the most recent `window` samples into a fixed number of bins.
/// Use a dumb 'max' strategy that simply takes the maximum value in each bin.
///
/// Bins with no sample (when there are fewer samples than bins) are `None`
/// and the data is right-aligned, so the newest sample is always in the last bin.
pub fn resample(samples: &[u64], window: usize, num_bins: usize) -> Vec<Option<u64>> {
    if samples.is_empty() || window == 0 || num_bins == 0 {
        return Vec::new();
    }

    let recent = &samples[samples.len().saturating_sub(window)..];
    let mut result = vec![None; num_bins];

    if recent.len() <= num_bins {
        let offset = num_bins - recent.len();
        for (i, &sample) in recent.iter().enumerate() {
            result[offset + i] = Some(sample);
        }
        return result;
    }

    for (i, bin) in result.iter_mut().enumerate() {
        let start = i * recent.len() / num_bins;
        let end = (i + 1) * recent.len() / num_bins;
        *bin = recent[start..end].iter().copied().max();
    }
    result
}

#[cfg(test)]
mod tests {

    use super::*;

    fn assert_bins(actual: &[Option<u64>], expected: &[Option<u64>], msg: &str) {
        assert_eq!(actual.len(), expected.len(), "{}: length mismatch", msg);
        for (i, (a, e)) in actual.iter().zip(expected.iter()).enumerate() {
            assert_eq!(a, e, "{} at index {}", msg, i);
        }
    }

    #[test]
    fn test_exact_fit() {
        let samples = vec![0, 1, 2, 3];
        let result = resample(&samples, 10, 4);
        assert_bins(&result, &[Some(0), Some(1), Some(2), Some(3)], "exact fit");
    }

    macro_rules! resample_tests {
        ($($name:ident: $value:expr,)*) => {
            $(
                #[test]
                fn $name() {
                    let (samples, window, num_bins, expected): (Vec<u64>, usize, usize, Vec<Option<u64>>) = $value;
                    let result = resample(&samples, window, num_bins);
                    assert_bins(&result, &expected, stringify!($name));
                }
            )*
        }
    }

    resample_tests! {
        no_samples: (
            vec![],
            10,
            4,
            vec![],
        ),
        no_bins: (
            vec![1, 2],
            10,
            0,
            vec![],
        ),
        single_sample_is_right_aligned: (
            vec![42],
            10,
            4,
            vec![None, None, None, Some(42)],
        ),
        two_samples_per_bin: (
            vec![1, 5, 2, 2, 9, 3],
            10,
            3,
            vec![Some(5), Some(2), Some(9)],
        ),
        uneven_bins: (
            vec![1, 2, 3, 4, 5],
            10,
            2,
            vec![Some(2), Some(5)],
        ),
        window_drops_old_samples: (
            vec![100, 100, 1, 2, 3],
            3,
            3,
            vec![Some(1), Some(2), Some(3)],
        ),
        window_then_bins: (
            vec![100, 4, 1, 8, 2],
            4,
            2,
            vec![Some(4), Some(8)],
        ),
    }
}
