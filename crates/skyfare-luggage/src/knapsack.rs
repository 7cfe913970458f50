//! Exact 0/1 selection by dynamic programming over (pieces, weight).

use crate::error::LuggageError;

/// Weights are discretised to this many steps per kilogram
const STEPS_PER_KG: f64 = 100.0;

/// Upper bound on the size of the decision table
const MAX_TABLE_CELLS: usize = 20_000_000;

/// Slack when converting to steps so that e.g. 0.1 kg stays 10 steps
const ROUNDING_SLACK: f64 = 1e-6;

/// Best subset of at most `max_pieces` items whose total weight stays within `max_weight`.
///
/// Item weights are rounded up and the capacity rounded down, so the chosen subset is
/// feasible for the unrounded weights. Items with a non-positive value are never chosen.
pub(crate) fn select(
    weights: &[f64],
    values: &[f64],
    max_weight: f64,
    max_pieces: u32,
) -> Result<Vec<bool>, LuggageError> {
    let n = weights.len();
    let pieces = (max_pieces as usize).min(n);
    let capacity = (max_weight * STEPS_PER_KG + ROUNDING_SLACK).floor() as usize;
    let steps: Vec<usize> = weights
        .iter()
        .map(|w| (w * STEPS_PER_KG - ROUNDING_SLACK).ceil().max(0.0) as usize)
        .collect();

    let width = capacity.saturating_add(1);
    let layer = (pieces + 1).saturating_mul(width);
    let cells = n.saturating_mul(layer);
    if cells > MAX_TABLE_CELLS || layer > MAX_TABLE_CELLS {
        return Err(LuggageError::invalid(format!(
            "selection of {n} pieces within {max_weight} kg is too large for exact solving"
        )));
    }

    // best[k * width + w]: highest value using at most k pieces and w weight steps
    let mut best = vec![0.0_f64; layer];
    let mut take = vec![false; cells];

    for (i, (&step, &value)) in steps.iter().zip(values).enumerate() {
        if value <= 0.0 || step > capacity {
            continue;
        }
        for k in (1..=pieces).rev() {
            for w in (step..=capacity).rev() {
                let candidate = best[(k - 1) * width + w - step] + value;
                if candidate > best[k * width + w] {
                    best[k * width + w] = candidate;
                    take[i * layer + k * width + w] = true;
                }
            }
        }
    }

    let mut selected = vec![false; n];
    let (mut k, mut w) = (pieces, capacity);
    for i in (0..n).rev() {
        if k > 0 && take[i * layer + k * width + w] {
            selected[i] = true;
            k -= 1;
            w -= steps[i];
        }
    }

    Ok(selected)
}
