//! Momentum indicator calculations for the scan pipeline
//!
//! RSI is the only oscillator computed. Values follow Wilder's smoothing:
//! the first average gain/loss is a simple mean over the lookback window,
//! every later average decays with weight 1/period.

/// Calculate Wilder's RSI over a close series
///
/// Returns one slot per input bar. Slots before the window is filled are
/// `None`. A window with zero average loss yields 100, zero average gain
/// yields 0, and a window with neither gains nor losses (flat prices) is
/// undefined rather than a division by zero.
///
/// # Arguments
/// * `closes` - Closing prices, ascending by time
/// * `period` - Lookback window (e.g. 14)
pub fn calculate_rsi(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut rsi = vec![None; closes.len()];

    if period == 0 || closes.len() <= period {
        return rsi;
    }

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for i in 1..=period {
        let change = closes[i] - closes[i - 1];
        if change > 0.0 {
            avg_gain += change;
        } else {
            avg_loss -= change;
        }
    }
    avg_gain /= period as f64;
    avg_loss /= period as f64;

    rsi[period] = rsi_from_averages(avg_gain, avg_loss);

    for i in (period + 1)..closes.len() {
        let change = closes[i] - closes[i - 1];
        let (gain, loss) = if change > 0.0 {
            (change, 0.0)
        } else {
            (0.0, -change)
        };

        avg_gain = (avg_gain * (period as f64 - 1.0) + gain) / period as f64;
        avg_loss = (avg_loss * (period as f64 - 1.0) + loss) / period as f64;

        rsi[i] = rsi_from_averages(avg_gain, avg_loss);
    }

    rsi
}

fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> Option<f64> {
    if avg_loss == 0.0 && avg_gain == 0.0 {
        // Flat window: RSI undefined
        None
    } else if avg_loss == 0.0 {
        Some(100.0)
    } else {
        Some(100.0 - 100.0 / (1.0 + avg_gain / avg_loss))
    }
}

/// Latest RSI value for a close series, or `None` when unavailable
///
/// Non-finite closes (missing data from a source) are dropped before the
/// calculation. Unavailable means: too few cleaned closes for the window,
/// or an all-undefined RSI column. Both are data-insufficiency outcomes,
/// not errors.
pub fn latest_rsi(closes: &[f64], period: usize) -> Option<f64> {
    let cleaned: Vec<f64> = closes.iter().copied().filter(|c| c.is_finite()).collect();

    if cleaned.len() < period {
        return None;
    }

    calculate_rsi(&cleaned, period).into_iter().flatten().last()
}

/// Oversold classification against a threshold
pub fn is_oversold(rsi: f64, threshold: f64) -> bool {
    rsi <= threshold
}

/// Overbought classification against a threshold
///
/// Inclusive comparison, matching the oversold side.
pub fn is_overbought(rsi: f64, threshold: f64) -> bool {
    rsi >= threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rsi_declining_series_is_oversold() {
        // Monotonically declining closes: every change is a loss
        let closes: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        let latest = latest_rsi(&closes, 14).unwrap();

        assert_eq!(latest, 0.0);
        assert!(is_oversold(latest, 30.0));
    }

    #[test]
    fn test_rsi_rising_series_is_overbought() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let latest = latest_rsi(&closes, 14).unwrap();

        assert_eq!(latest, 100.0);
        assert!(is_overbought(latest, 70.0));
    }

    #[test]
    fn test_rsi_flat_series_is_undefined() {
        let closes = vec![50.0; 30];
        assert_eq!(latest_rsi(&closes, 14), None);
    }

    #[test]
    fn test_rsi_insufficient_data() {
        let closes = vec![10.0, 11.0, 12.0];
        assert_eq!(latest_rsi(&closes, 14), None);

        let empty: Vec<f64> = Vec::new();
        assert_eq!(latest_rsi(&empty, 14), None);
    }

    #[test]
    fn test_rsi_bounded_and_leading_slots_undefined() {
        let closes = vec![
            44.34, 44.09, 44.15, 43.61, 44.33, 44.83, 45.10, 45.42, 45.84, 46.08, 45.89, 46.03,
            45.61, 46.28, 46.28, 46.00, 46.03, 46.41, 46.22, 45.64,
        ];
        let rsi = calculate_rsi(&closes, 14);

        for slot in rsi.iter().take(14) {
            assert!(slot.is_none());
        }
        for value in rsi.iter().skip(14).flatten() {
            assert!(*value >= 0.0 && *value <= 100.0);
        }
        // Classic Wilder worked example: first value near 70
        let first = rsi[14].unwrap();
        assert!((first - 70.46).abs() < 0.5, "first RSI was {}", first);
    }

    #[test]
    fn test_latest_rsi_drops_non_finite_closes() {
        let mut closes: Vec<f64> = (0..20).map(|i| 100.0 - i as f64).collect();
        closes.insert(5, f64::NAN);
        closes.insert(12, f64::INFINITY);

        let latest = latest_rsi(&closes, 14).unwrap();
        assert_eq!(latest, 0.0);
    }

    #[test]
    fn test_classification_comparators_are_inclusive() {
        assert!(is_oversold(30.0, 30.0));
        assert!(!is_oversold(30.01, 30.0));
        assert!(is_overbought(70.0, 70.0));
        assert!(!is_overbought(69.99, 70.0));
    }
}
