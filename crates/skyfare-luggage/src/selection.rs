//! Luggage piece selection under a weight and piece-count budget.
//!
//! The default strategy solves the LP relaxation of the 0/1 selection problem with the
//! simplex solver and keeps every piece whose relaxed value exceeds one half. Rounding a
//! relaxation is only a heuristic: two fractional pieces can both round up and push the
//! total past `max_weight`, which is then billed through `excess_charge`.
//! [`SelectionStrategy::Exact`] solves the 0/1 problem directly and never exceeds either
//! budget.

use serde::{Deserialize, Serialize};
use skyfare_solver::{ConstraintOp, LpProblem, Solver};
use tracing::debug;

use crate::error::LuggageError;
use crate::knapsack;

/// Surcharge per kilogram above `max_weight` for a rounded selection
pub const DEFAULT_EXCESS_RATE_PER_KG: f64 = 25.0;

/// Relaxed values above this are kept
const SELECTION_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionConstraint {
    pub max_weight: f64,
    pub max_pieces: u32,
    pub base_price: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionStrategy {
    /// Round the simplex relaxation at 0.5
    #[default]
    Relaxation,
    /// Exact 0/1 knapsack over both budgets
    Exact,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionResult {
    pub selected_pieces: Vec<bool>,
    pub total_weight: f64,
    pub total_value: f64,
    pub total_pieces: usize,
    pub excess_charge: f64,
}

impl SelectionResult {
    /// Indices of the kept pieces
    pub fn selected_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.selected_pieces
            .iter()
            .enumerate()
            .filter(|(_, kept)| **kept)
            .map(|(i, _)| i)
    }
}

/// Chooses which luggage pieces to keep
#[derive(Debug, Clone)]
pub struct LuggageSelector {
    weights: Vec<f64>,
    values: Vec<f64>,
    constraint: SelectionConstraint,
    strategy: SelectionStrategy,
    excess_rate_per_kg: f64,
    solver: Solver,
}

impl LuggageSelector {
    pub fn new(
        weights: Vec<f64>,
        values: Vec<f64>,
        constraint: SelectionConstraint,
    ) -> Result<Self, LuggageError> {
        if weights.len() != values.len() {
            return Err(LuggageError::invalid(format!(
                "{} weights but {} values",
                weights.len(),
                values.len()
            )));
        }
        if let Some(i) = weights.iter().position(|w| !w.is_finite() || *w < 0.0) {
            return Err(LuggageError::invalid(format!(
                "weight of piece {i} must be a non-negative number"
            )));
        }
        if let Some(i) = values.iter().position(|v| !v.is_finite()) {
            return Err(LuggageError::invalid(format!(
                "value of piece {i} must be a finite number"
            )));
        }
        if !constraint.max_weight.is_finite() || constraint.max_weight < 0.0 {
            return Err(LuggageError::invalid("maxWeight must be a non-negative number"));
        }
        if !constraint.base_price.is_finite() {
            return Err(LuggageError::invalid("basePrice must be a finite number"));
        }

        Ok(Self {
            weights,
            values,
            constraint,
            strategy: SelectionStrategy::default(),
            excess_rate_per_kg: DEFAULT_EXCESS_RATE_PER_KG,
            solver: Solver::new(),
        })
    }

    pub fn with_strategy(mut self, strategy: SelectionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_excess_rate(mut self, rate_per_kg: f64) -> Self {
        self.excess_rate_per_kg = rate_per_kg;
        self
    }

    pub fn with_solver(mut self, solver: Solver) -> Self {
        self.solver = solver;
        self
    }

    pub fn constraint(&self) -> &SelectionConstraint {
        &self.constraint
    }

    /// The relaxation: maximize total value subject to the weight row and the piece-count row
    pub fn problem(&self) -> LpProblem {
        let mut problem = LpProblem::new(self.values.clone(), true);
        problem.add_constraint(
            "weight",
            self.weights.clone(),
            ConstraintOp::Le,
            self.constraint.max_weight,
        );
        problem.add_constraint(
            "pieces",
            vec![1.0; self.weights.len()],
            ConstraintOp::Le,
            f64::from(self.constraint.max_pieces),
        );
        problem
    }

    pub fn solve(&self) -> Result<SelectionResult, LuggageError> {
        let selected = match self.strategy {
            SelectionStrategy::Relaxation => {
                let solution = self.solver.solve(&self.problem())?;
                solution
                    .values
                    .iter()
                    .map(|&x| x > SELECTION_THRESHOLD)
                    .collect()
            }
            SelectionStrategy::Exact => knapsack::select(
                &self.weights,
                &self.values,
                self.constraint.max_weight,
                self.constraint.max_pieces,
            )?,
        };

        let result = self.summarize(selected);
        debug!(
            strategy = ?self.strategy,
            pieces = result.total_pieces,
            weight = result.total_weight,
            excess_charge = result.excess_charge,
            "luggage selection complete"
        );
        Ok(result)
    }

    fn summarize(&self, selected_pieces: Vec<bool>) -> SelectionResult {
        let mut total_weight = 0.0;
        let mut total_value = 0.0;
        let mut total_pieces = 0;
        for ((&kept, &w), &v) in selected_pieces.iter().zip(&self.weights).zip(&self.values) {
            if kept {
                total_weight += w;
                total_value += v;
                total_pieces += 1;
            }
        }

        let excess_weight = (total_weight - self.constraint.max_weight).max(0.0);

        SelectionResult {
            selected_pieces,
            total_weight,
            total_value,
            total_pieces,
            excess_charge: excess_weight * self.excess_rate_per_kg,
        }
    }
}
