//! Utility functions and types

pub mod data_loader;

pub use data_loader::{DataLoader, DataSaver};

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_to() {
        assert_eq!(round_to(7.123456789, 5), 7.12346);
        assert_eq!(round_to(-0.00004, 4), -0.0);
        assert_eq!(round_to(2.5, 0), 3.0);
    }
}
