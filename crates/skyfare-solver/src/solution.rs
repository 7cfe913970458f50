#[cfg(feature = "serde")]
use serde::Serialize;

/// The result of solving an LP problem to optimality
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Solution {
    /// Optimal values for each decision variable
    pub values: Vec<f64>,
    /// Optimal objective value
    pub objective_value: f64,
    /// Number of pivots performed across both phases
    pub iterations: usize,
    /// Per-constraint analysis at the optimum
    pub analysis: Analysis,
}

#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Analysis {
    pub constraints: Vec<ConstraintAnalysis>,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct ConstraintAnalysis {
    /// Constraint name
    pub name: String,
    /// Left-hand side evaluated at the optimum
    pub activity: f64,
    /// Distance to the bound (zero for equality rows)
    pub slack: f64,
    /// Change in the objective per unit increase of the right-hand side
    pub shadow_price: f64,
    /// Whether the row is tight at the optimum
    pub binding: bool,
}

impl Analysis {
    /// Names of the constraints that are tight at the optimum
    pub fn binding_constraints(&self) -> impl Iterator<Item = &str> {
        self.constraints
            .iter()
            .filter(|c| c.binding)
            .map(|c| c.name.as_str())
    }
}
