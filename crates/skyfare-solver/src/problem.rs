use crate::error::SolveError;

/// Represents a linear programming problem over non-negative variables
#[derive(Debug, Clone)]
pub struct LpProblem {
    /// Objective function coefficients
    pub objective: Objective,
    /// Constraint rows
    pub constraints: Vec<Constraint>,
}

#[derive(Debug, Clone)]
pub struct Objective {
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Whether to maximize or minimize
    pub maximize: bool,
}

#[derive(Debug, Clone)]
pub struct Constraint {
    /// Name/label for the constraint (for diagnostics)
    pub name: String,
    /// Coefficients for each variable
    pub coefficients: Vec<f64>,
    /// Comparison operator
    pub op: ConstraintOp,
    /// Right-hand side value
    pub rhs: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    /// Less than or equal (<=)
    Le,
    /// Greater than or equal (>=)
    Ge,
    /// Equal (=)
    Eq,
}

impl LpProblem {
    pub fn new(objective: Vec<f64>, maximize: bool) -> Self {
        Self {
            objective: Objective {
                coefficients: objective,
                maximize,
            },
            constraints: Vec::new(),
        }
    }

    /// Build a problem from a dense `A x <= b` description.
    ///
    /// Rows are named `c1`, `c2`, ... in order.
    pub fn from_dense(
        objective: Vec<f64>,
        constraints: Vec<Vec<f64>>,
        rhs: Vec<f64>,
        maximize: bool,
    ) -> Result<Self, SolveError> {
        if constraints.len() != rhs.len() {
            return Err(SolveError::invalid(format!(
                "{} constraint rows but {} right-hand side values",
                constraints.len(),
                rhs.len()
            )));
        }

        let mut problem = Self::new(objective, maximize);
        for (i, (row, b)) in constraints.into_iter().zip(rhs).enumerate() {
            problem.add_constraint(format!("c{}", i + 1), row, ConstraintOp::Le, b);
        }
        Ok(problem)
    }

    pub fn add_constraint(
        &mut self,
        name: impl Into<String>,
        coefficients: Vec<f64>,
        op: ConstraintOp,
        rhs: f64,
    ) {
        self.constraints.push(Constraint {
            name: name.into(),
            coefficients,
            op,
            rhs,
        });
    }

    pub fn num_variables(&self) -> usize {
        self.objective.coefficients.len()
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    /// Objective value of `values` under this problem's coefficients
    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.objective
            .coefficients
            .iter()
            .zip(values)
            .map(|(c, x)| c * x)
            .sum()
    }

    /// Check dimensions and finiteness.
    ///
    /// Without `general` the problem must be in standard form: only `<=` rows with
    /// non-negative right-hand sides, so the all-slack basis at the origin is feasible.
    pub(crate) fn validate(&self, general: bool) -> Result<(), SolveError> {
        let n = self.num_variables();
        if let Some(j) = self.objective.coefficients.iter().position(|c| !c.is_finite()) {
            return Err(SolveError::invalid(format!(
                "objective coefficient {j} is not a finite number"
            )));
        }

        for c in &self.constraints {
            if c.coefficients.len() != n {
                return Err(SolveError::invalid(format!(
                    "constraint {} has {} coefficients, expected {}",
                    c.name,
                    c.coefficients.len(),
                    n
                )));
            }
            if c.coefficients.iter().any(|a| !a.is_finite()) || !c.rhs.is_finite() {
                return Err(SolveError::invalid(format!(
                    "constraint {} contains a non-finite value",
                    c.name
                )));
            }
            if general {
                continue;
            }
            if c.op != ConstraintOp::Le {
                return Err(SolveError::invalid(format!(
                    "constraint {} is not a <= row; enable phase one to solve it",
                    c.name
                )));
            }
            if c.rhs < 0.0 {
                return Err(SolveError::invalid(format!(
                    "constraint {} has negative right-hand side {}; enable phase one to solve it",
                    c.name, c.rhs
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_dense_names_rows() {
        let problem = LpProblem::from_dense(
            vec![1.0, 2.0],
            vec![vec![1.0, 1.0], vec![2.0, 0.5]],
            vec![4.0, 3.0],
            true,
        )
        .unwrap();

        assert_eq!(problem.num_variables(), 2);
        assert_eq!(problem.num_constraints(), 2);
        assert_eq!(problem.constraints[1].name, "c2");
        assert_eq!(problem.constraints[1].op, ConstraintOp::Le);
        assert!(problem.objective.maximize);
    }

    #[test]
    fn test_from_dense_rejects_rhs_mismatch() {
        let err = LpProblem::from_dense(vec![1.0], vec![vec![1.0]], vec![], true).unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[test]
    fn test_validate_standard_form() {
        let mut problem = LpProblem::new(vec![1.0, 1.0], true);
        problem.add_constraint("ok", vec![1.0, 1.0], ConstraintOp::Le, 2.0);
        assert!(problem.validate(false).is_ok());

        problem.add_constraint("ragged", vec![1.0], ConstraintOp::Le, 2.0);
        assert!(problem.validate(false).is_err());
        assert!(problem.validate(true).is_err());
    }

    #[test]
    fn test_validate_rejects_negative_rhs_unless_general() {
        let mut problem = LpProblem::new(vec![1.0], false);
        problem.add_constraint("neg", vec![-1.0], ConstraintOp::Le, -2.0);

        let err = problem.validate(false).unwrap_err();
        assert!(err.to_string().contains("negative right-hand side"));
        assert!(problem.validate(true).is_ok());
    }

    #[test]
    fn test_validate_rejects_non_finite() {
        let problem = LpProblem::new(vec![f64::NAN], true);
        assert!(problem.validate(true).is_err());
    }

    #[test]
    fn test_evaluate() {
        let problem = LpProblem::new(vec![3.0, 2.0], true);
        assert_eq!(problem.evaluate(&[3.0, 1.0]), 11.0);
    }
}
