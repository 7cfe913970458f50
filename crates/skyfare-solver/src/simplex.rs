use tracing::{debug, info, warn};

use crate::error::SolveError;
use crate::problem::{ConstraintOp, LpProblem};
use crate::solution::{Analysis, ConstraintAnalysis, Solution};

/// Pivots allowed per decision variable and constraint row when no explicit budget is set
const ITERATIONS_PER_DIMENSION: usize = 50;
const MIN_ITERATIONS: usize = 100;

/// Largest phase-one objective still treated as zero
const FEASIBILITY_EPS: f64 = 1e-7;

/// Relative slack below which a constraint counts as binding
const BINDING_EPS: f64 = 1e-7;

/// Tableau simplex solver for linear programming problems.
///
/// By default only standard-form problems are accepted (every row `<=` with a
/// non-negative right-hand side), so the slack basis at the origin is the starting
/// vertex. [`Solver::with_phase_one`] enables surplus and artificial columns for
/// `>=`/`=` rows and negative right-hand sides.
#[derive(Debug, Clone)]
pub struct Solver {
    /// Maximum pivots before giving up; derived from the problem size when unset
    max_iterations: Option<usize>,
    /// Tolerance for floating point comparisons
    tolerance: f64,
    /// Accept general constraints via a phase-one feasibility search
    phase_one: bool,
}

impl Default for Solver {
    fn default() -> Self {
        Self {
            max_iterations: None,
            tolerance: 1e-9,
            phase_one: false,
        }
    }
}

impl Solver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = Some(max);
        self
    }

    pub fn with_tolerance(mut self, tol: f64) -> Self {
        self.tolerance = tol;
        self
    }

    pub fn with_phase_one(mut self, enabled: bool) -> Self {
        self.phase_one = enabled;
        self
    }

    pub fn phase_one(&self) -> bool {
        self.phase_one
    }

    /// Pivot budget for `problem`
    pub fn iteration_budget(&self, problem: &LpProblem) -> usize {
        self.max_iterations.unwrap_or_else(|| {
            (ITERATIONS_PER_DIMENSION * (problem.num_variables() + problem.num_constraints()))
                .max(MIN_ITERATIONS)
        })
    }

    /// Solve the LP problem, running phase one first when artificial columns are present
    pub fn solve(&self, problem: &LpProblem) -> Result<Solution, SolveError> {
        problem.validate(self.phase_one)?;

        let budget = self.iteration_budget(problem);
        let mut tableau = Tableau::build(problem);
        let mut iterations = 0;

        debug!(
            variables = tableau.n_vars,
            constraints = tableau.basis.len(),
            artificial = tableau.n_artificial,
            budget,
            "solving linear program"
        );

        if tableau.n_artificial > 0 {
            self.phase1(&mut tableau, budget, &mut iterations)?;
        }

        let entering_limit = tableau.n_vars + tableau.n_slack;
        match self.iterate(&mut tableau, entering_limit, budget, &mut iterations) {
            Termination::Optimal => {}
            Termination::Unbounded(column) => {
                warn!(column, iterations, "linear program is unbounded");
                return Err(SolveError::Unbounded { column });
            }
            Termination::BudgetExceeded => {
                warn!(iterations, "simplex iteration budget exhausted");
                return Err(SolveError::DidNotConverge { iterations });
            }
        }

        let solution = self.extract_solution(&tableau, problem, iterations);
        info!(
            iterations,
            objective = solution.objective_value,
            "simplex reached optimum"
        );
        Ok(solution)
    }

    /// Pivot until no entering column below `entering_limit` can improve the objective row
    fn iterate(
        &self,
        tableau: &mut Tableau,
        entering_limit: usize,
        budget: usize,
        iterations: &mut usize,
    ) -> Termination {
        loop {
            let Some(pivot_col) = self.find_pivot_column(tableau, entering_limit) else {
                return Termination::Optimal;
            };
            if *iterations >= budget {
                return Termination::BudgetExceeded;
            }
            let Some(pivot_row) = self.find_pivot_row(tableau, pivot_col) else {
                return Termination::Unbounded(pivot_col);
            };
            debug!(iteration = *iterations, pivot_row, pivot_col, "pivot");
            self.pivot(tableau, pivot_row, pivot_col);
            *iterations += 1;
        }
    }

    fn phase1(
        &self,
        tableau: &mut Tableau,
        budget: usize,
        iterations: &mut usize,
    ) -> Result<(), SolveError> {
        let art_start = tableau.n_vars + tableau.n_slack;
        let n_cols = tableau.n_cols();
        let rhs_col = n_cols - 1;

        // Minimize the sum of artificials, priced out against their basic rows
        let mut objective = vec![0.0; n_cols];
        for cell in &mut objective[art_start..rhs_col] {
            *cell = 1.0;
        }
        for (i, &basic) in tableau.basis.iter().enumerate() {
            if basic >= art_start {
                for (cell, &a) in objective.iter_mut().zip(&tableau.data[i + 1]) {
                    *cell -= a;
                }
            }
        }
        tableau.data[0] = objective;

        match self.iterate(tableau, art_start, budget, iterations) {
            Termination::Optimal => {}
            // The phase-one objective is bounded below by zero, so this only follows numerical trouble
            Termination::Unbounded(_) => return Err(SolveError::Infeasible),
            Termination::BudgetExceeded => {
                return Err(SolveError::DidNotConverge {
                    iterations: *iterations,
                });
            }
        }

        let infeasibility = -tableau.data[0][rhs_col];
        if infeasibility > FEASIBILITY_EPS {
            debug!(infeasibility, "phase one left artificial variables positive");
            return Err(SolveError::Infeasible);
        }

        // Drive zero-level artificials out of the basis where a real column can replace them
        for row in 1..tableau.data.len() {
            if tableau.basis[row - 1] < art_start {
                continue;
            }
            if let Some(col) = (0..art_start).find(|&j| tableau.data[row][j].abs() > self.tolerance) {
                self.pivot(tableau, row, col);
            }
        }

        // Restore the real objective and price out the current basis
        let mut objective = tableau.costs.clone();
        for (i, &basic) in tableau.basis.iter().enumerate() {
            let factor = objective[basic];
            if factor != 0.0 {
                for (cell, &a) in objective.iter_mut().zip(&tableau.data[i + 1]) {
                    *cell -= factor * a;
                }
            }
        }
        tableau.data[0] = objective;

        Ok(())
    }

    /// Leftmost column whose objective-row entry is negative; `None` means optimal
    fn find_pivot_column(&self, tableau: &Tableau, entering_limit: usize) -> Option<usize> {
        tableau.data[0][..entering_limit]
            .iter()
            .position(|&reduced_cost| reduced_cost < -self.tolerance)
    }

    /// Minimum-ratio test over rows with a positive entry in `col`; ties keep the first row
    fn find_pivot_row(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let rhs_col = tableau.n_cols() - 1;

        let mut min_ratio = f64::INFINITY;
        let mut min_row = None;

        for (i, row) in tableau.data.iter().enumerate().skip(1) {
            let val = row[col];
            if val <= self.tolerance {
                continue;
            }
            let ratio = row[rhs_col] / val;
            if ratio < min_ratio {
                min_ratio = ratio;
                min_row = Some(i);
            }
        }

        min_row
    }

    fn pivot(&self, tableau: &mut Tableau, row: usize, col: usize) {
        tableau.basis[row - 1] = col;

        let pivot_val = tableau.data[row][col];
        if pivot_val != 1.0 {
            for cell in &mut tableau.data[row] {
                *cell /= pivot_val;
            }
        }

        let pivot_row = tableau.data[row].clone();
        for (i, other) in tableau.data.iter_mut().enumerate() {
            if i == row {
                continue;
            }
            let factor = other[col];
            if factor == 0.0 {
                continue;
            }
            for (cell, &p) in other.iter_mut().zip(&pivot_row) {
                *cell -= factor * p;
            }
        }
    }

    /// Row holding the single 1 of a unit column, if `col` is one
    fn unit_row(&self, tableau: &Tableau, col: usize) -> Option<usize> {
        let mut found = None;
        for (i, row) in tableau.data.iter().enumerate().skip(1) {
            let val = row[col];
            if (val - 1.0).abs() <= self.tolerance {
                if found.is_some() {
                    return None;
                }
                found = Some(i);
            } else if val.abs() > self.tolerance {
                return None;
            }
        }
        found
    }

    fn extract_solution(&self, tableau: &Tableau, problem: &LpProblem, iterations: usize) -> Solution {
        let n_vars = problem.num_variables();
        let rhs_col = tableau.n_cols() - 1;

        let mut values = vec![0.0; n_vars];
        for (j, value) in values.iter_mut().enumerate() {
            // A duplicated column also looks like a unit vector; only the basic one reads the row
            if let Some(row) = self.unit_row(tableau, j) {
                if tableau.basis[row - 1] == j {
                    *value = tableau.data[row][rhs_col];
                }
            }
        }

        // Row 0 holds -c'x; undo the sign flip applied to maximization costs
        let corner = tableau.data[0][rhs_col];
        let objective_value = (if tableau.maximize { corner } else { -corner }) + 0.0;

        let analysis = self.analyze(tableau, problem, &values);

        Solution {
            values,
            objective_value,
            iterations,
            analysis,
        }
    }

    fn analyze(&self, tableau: &Tableau, problem: &LpProblem, values: &[f64]) -> Analysis {
        let direction = if tableau.maximize { 1.0 } else { -1.0 };

        let constraints = problem
            .constraints
            .iter()
            .zip(&tableau.duals)
            .map(|(c, &(dual_col, scale))| {
                let activity: f64 = c.coefficients.iter().zip(values).map(|(a, x)| a * x).sum();
                let slack = match c.op {
                    ConstraintOp::Le => c.rhs - activity,
                    ConstraintOp::Ge => activity - c.rhs,
                    ConstraintOp::Eq => 0.0,
                };
                ConstraintAnalysis {
                    name: c.name.clone(),
                    activity,
                    slack,
                    shadow_price: direction * tableau.data[0][dual_col] * scale + 0.0,
                    binding: slack.abs() <= BINDING_EPS * (1.0 + c.rhs.abs()),
                }
            })
            .collect();

        Analysis { constraints }
    }
}

/// Row 0 is the objective row; rows 1..=m are constraint rows.
///
/// Columns: decision variables, one slack/surplus column per row, artificial columns,
/// then the right-hand side.
struct Tableau {
    data: Vec<Vec<f64>>,
    /// Basic column of each constraint row (`basis[i]` belongs to row `i + 1`)
    basis: Vec<usize>,
    /// Initial objective row, restored after phase one
    costs: Vec<f64>,
    /// Per constraint row: column whose reduced cost yields its dual, and the sign/scale to apply
    duals: Vec<(usize, f64)>,
    n_vars: usize,
    n_slack: usize,
    n_artificial: usize,
    maximize: bool,
}

impl Tableau {
    fn build(problem: &LpProblem) -> Self {
        let n_vars = problem.num_variables();
        let n_constraints = problem.num_constraints();

        // Rows with a negative rhs are negated, which flips their direction
        let rows: Vec<(f64, ConstraintOp)> = problem
            .constraints
            .iter()
            .map(|c| {
                if c.rhs < 0.0 {
                    let op = match c.op {
                        ConstraintOp::Le => ConstraintOp::Ge,
                        ConstraintOp::Ge => ConstraintOp::Le,
                        ConstraintOp::Eq => ConstraintOp::Eq,
                    };
                    (-1.0, op)
                } else {
                    (1.0, c.op)
                }
            })
            .collect();

        let n_artificial = rows.iter().filter(|(_, op)| *op != ConstraintOp::Le).count();
        let total_cols = n_vars + n_constraints + n_artificial + 1;
        let rhs_col = total_cols - 1;

        let mut data = vec![vec![0.0; total_cols]; n_constraints + 1];
        let mut basis = vec![0; n_constraints];
        let mut duals = Vec::with_capacity(n_constraints);

        // Maximization is driven as minimization of -c
        let maximize = problem.objective.maximize;
        let sign = if maximize { -1.0 } else { 1.0 };
        for (j, &coef) in problem.objective.coefficients.iter().enumerate() {
            data[0][j] = sign * coef;
        }

        let mut artificial_idx = n_vars + n_constraints;
        for (i, (c, &(flip, op))) in problem.constraints.iter().zip(&rows).enumerate() {
            let row = &mut data[i + 1];
            for (j, &coef) in c.coefficients.iter().enumerate() {
                row[j] = flip * coef;
            }
            row[rhs_col] = flip * c.rhs;

            let slack_idx = n_vars + i;
            match op {
                ConstraintOp::Le => {
                    row[slack_idx] = 1.0;
                    basis[i] = slack_idx;
                    duals.push((slack_idx, flip));
                }
                ConstraintOp::Ge => {
                    row[slack_idx] = -1.0;
                    row[artificial_idx] = 1.0;
                    basis[i] = artificial_idx;
                    duals.push((slack_idx, -flip));
                    artificial_idx += 1;
                }
                ConstraintOp::Eq => {
                    row[artificial_idx] = 1.0;
                    basis[i] = artificial_idx;
                    duals.push((artificial_idx, flip));
                    artificial_idx += 1;
                }
            }
        }

        let costs = data[0].clone();

        Self {
            data,
            basis,
            costs,
            duals,
            n_vars,
            n_slack: n_constraints,
            n_artificial,
            maximize,
        }
    }

    fn n_cols(&self) -> usize {
        self.data[0].len()
    }
}

enum Termination {
    Optimal,
    Unbounded(usize),
    BudgetExceeded,
}
