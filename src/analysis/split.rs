//! Seeded train/test partition

use crate::error::{PipelineError, Result};
use crate::random::RandomSource;
use serde::{Deserialize, Serialize};

/// Row indices of the training and test subsets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainTestSplit {
    pub train_indices: Vec<usize>,
    pub test_indices: Vec<usize>,
}

impl TrainTestSplit {
    pub fn n_train(&self) -> usize {
        self.train_indices.len()
    }

    pub fn n_test(&self) -> usize {
        self.test_indices.len()
    }
}

/// Number of test rows for `n_samples` rows: `ceil(n * test_fraction)`,
/// kept within `1..n`
pub fn test_size(n_samples: usize, test_fraction: f64) -> usize {
    let n_test = (n_samples as f64 * test_fraction).ceil() as usize;
    n_test.clamp(1, n_samples.saturating_sub(1).max(1))
}

/// Shuffle `0..n_samples` and hold out the first `test_size` indices
///
/// The same source state, row count and fraction always give the same split.
/// Fewer than two rows cannot be split: every row trains and the test set
/// is empty.
pub fn train_test_split<R: RandomSource + ?Sized>(
    n_samples: usize,
    test_fraction: f64,
    rng: &mut R,
) -> Result<TrainTestSplit> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(PipelineError::InvalidParameter {
            name: "test_fraction".to_string(),
            value: test_fraction.to_string(),
            reason: "must lie strictly between 0 and 1".to_string(),
        });
    }
    if n_samples < 2 {
        return Ok(TrainTestSplit {
            train_indices: (0..n_samples).collect(),
            test_indices: Vec::new(),
        });
    }

    let mut indices: Vec<usize> = (0..n_samples).collect();
    rng.shuffle(&mut indices);

    let n_test = test_size(n_samples, test_fraction);
    let train_indices = indices.split_off(n_test);

    Ok(TrainTestSplit {
        train_indices,
        test_indices: indices,
    })
}
