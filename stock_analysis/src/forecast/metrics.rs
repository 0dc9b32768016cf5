//! Fit metrics in price units.

/// Mean squared error. 0 for empty input.
pub fn mse(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let sum: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    sum / y_true.len() as f64
}

/// Root mean squared error.
pub fn rmse(y_true: &[f64], y_pred: &[f64]) -> f64 {
    mse(y_true, y_pred).sqrt()
}

/// Mean absolute error. 0 for empty input.
pub fn mae(y_true: &[f64], y_pred: &[f64]) -> f64 {
    if y_true.is_empty() {
        return 0.0;
    }
    let sum: f64 = y_true.iter().zip(y_pred).map(|(t, p)| (t - p).abs()).sum();
    sum / y_true.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn metrics_on_known_values() {
        let t = [1.0, 2.0, 3.0];
        let p = [1.0, 3.0, 1.0];
        assert_eq!(mse(&t, &p), 5.0 / 3.0);
        assert_eq!(rmse(&t, &p), (5.0f64 / 3.0).sqrt());
        assert_eq!(mae(&t, &p), 1.0);
        assert_eq!(mae(&[], &[]), 0.0);
    }
}
