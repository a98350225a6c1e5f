//! Helper functions for integration tests

use cme_rs::operator::MasterOperator;

/// Compute relative error: |actual - expected| / |expected|
pub fn relative_error(actual: f64, expected: f64) -> f64 {
    if expected.abs() < 1e-10 {
        (actual - expected).abs()
    } else {
        (actual - expected).abs() / expected.abs()
    }
}

/// Assert the two generator invariants: zero column sums (within
/// tolerance) and non-negative off-diagonal entries.
pub fn assert_valid_generator(operator: &MasterOperator, tolerance: f64, message: &str) {
    assert!(
        operator.column_sum_defect() <= tolerance,
        "{}: column sum defect {} above tolerance {}",
        message,
        operator.column_sum_defect(),
        tolerance
    );
    assert!(
        operator.min_off_diagonal() >= 0.0,
        "{}: negative off-diagonal entry {}",
        message,
        operator.min_off_diagonal()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relative_error() {
        assert!((relative_error(1.0, 1.0) - 0.0).abs() < 1e-10);
        assert!((relative_error(1.1, 1.0) - 0.1).abs() < 1e-10);
        assert!((relative_error(0.9, 1.0) - 0.1).abs() < 1e-10);
    }
}
