//! Request handling for the HTTP endpoints, independent of any web framework.
//!
//! Bodies arrive as raw JSON so that missing and mistyped fields can be answered with the
//! endpoint's own 400 messages instead of a generic deserialization failure.

use serde::Serialize;
use serde_json::Value;
use skyfare_solver::{LpProblem, SolveError, Solver};
use thiserror::Error;
use tracing::warn;

use crate::error::LuggageError;
use crate::fare::{
    FareBreakdown, INVALID_CLASS_MESSAGE, INVALID_WEIGHT_MESSAGE, LuggageCalculator, TravelClass,
};

pub const SIMPLEX_ROUTE: &str = "/api/simplex";
pub const LUGGAGE_CHARGE_ROUTE: &str = "/api/calculate-luggage-charge";

const MISSING_PARAMETERS: &str = "Missing required parameters: objective, constraints, b";
const NOT_ARRAYS: &str = "Invalid input: objective, constraints, and b must be arrays";

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::Internal(_) => 500,
        }
    }

    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            message: self.to_string(),
        }
    }
}

impl From<SolveError> for ApiError {
    fn from(err: SolveError) -> Self {
        if err.is_invalid_input() {
            Self::BadRequest(err.to_string())
        } else {
            Self::Internal(err.to_string())
        }
    }
}

impl From<LuggageError> for ApiError {
    fn from(err: LuggageError) -> Self {
        if err.is_invalid_input() {
            Self::BadRequest(err.to_string())
        } else {
            Self::Internal(err.to_string())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimplexResponse {
    pub values: Vec<f64>,
    pub objective_value: f64,
}

/// `POST /api/simplex`: `{objective, constraints, b, isMaximization?}`
pub fn solve_simplex(body: &Value, solver: &Solver) -> Result<SimplexResponse, ApiError> {
    let problem = parse_simplex_request(body)?;
    let solution = solver.solve(&problem).inspect_err(|e| {
        if !e.is_invalid_input() {
            warn!(error = %e, "simplex request failed");
        }
    })?;

    Ok(SimplexResponse {
        values: solution.values,
        objective_value: solution.objective_value,
    })
}

/// Build the program described by a `/api/simplex` body
pub fn parse_simplex_request(body: &Value) -> Result<LpProblem, ApiError> {
    let (Some(objective), Some(constraints), Some(b)) = (
        present(body, "objective"),
        present(body, "constraints"),
        present(body, "b"),
    )
    else {
        return Err(ApiError::BadRequest(MISSING_PARAMETERS.into()));
    };

    let (Some(objective), Some(constraints), Some(b)) =
        (objective.as_array(), constraints.as_array(), b.as_array())
    else {
        return Err(ApiError::BadRequest(NOT_ARRAYS.into()));
    };

    let maximize = match present(body, "isMaximization") {
        None => true,
        Some(Value::Bool(flag)) => *flag,
        Some(_) => {
            return Err(ApiError::BadRequest(
                "Invalid input: isMaximization must be a boolean".into(),
            ));
        }
    };

    let objective = numbers(objective, "objective")?;
    let rows = constraints
        .iter()
        .enumerate()
        .map(|(i, row)| match row.as_array() {
            Some(row) => numbers(row, &format!("constraints[{i}]")),
            None => Err(ApiError::BadRequest(format!(
                "Invalid input: constraints[{i}] must be an array"
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;
    let rhs = numbers(b, "b")?;

    Ok(LpProblem::from_dense(objective, rows, rhs, maximize)?)
}

/// `POST /api/calculate-luggage-charge`: `{luggageWeight, travelClass}`
pub fn calculate_luggage_charge(
    body: &Value,
    calculator: &LuggageCalculator,
) -> Result<FareBreakdown, ApiError> {
    let weight = body
        .get("luggageWeight")
        .and_then(Value::as_f64)
        .filter(|w| *w > 0.0)
        .ok_or_else(|| ApiError::BadRequest(INVALID_WEIGHT_MESSAGE.into()))?;

    let class = body
        .get("travelClass")
        .and_then(Value::as_str)
        .ok_or_else(|| ApiError::BadRequest(INVALID_CLASS_MESSAGE.into()))?
        .parse::<TravelClass>()?;

    Ok(calculator.calculate_fare(weight, class)?)
}

/// A field counts as missing when absent or `null`
fn present<'a>(body: &'a Value, name: &str) -> Option<&'a Value> {
    body.get(name).filter(|v| !v.is_null())
}

fn numbers(items: &[Value], field: &str) -> Result<Vec<f64>, ApiError> {
    items
        .iter()
        .enumerate()
        .map(|(i, v)| {
            v.as_f64().ok_or_else(|| {
                ApiError::BadRequest(format!("Invalid input: {field}[{i}] must be a number"))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_solve_simplex() {
        let body = json!({
            "objective": [3, 2],
            "constraints": [[1, 1], [1, 0], [0, 1]],
            "b": [4, 3, 3]
        });

        let response = solve_simplex(&body, &Solver::new()).unwrap();

        assert!((response.values[0] - 3.0).abs() < 1e-9);
        assert!((response.values[1] - 1.0).abs() < 1e-9);
        assert!((response.objective_value - 11.0).abs() < 1e-9);

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("objectiveValue").is_some());
    }

    #[test]
    fn test_solve_simplex_minimization() {
        let body = json!({
            "objective": [1, -2],
            "constraints": [[1, 1], [0, 1]],
            "b": [4, 3],
            "isMaximization": false
        });

        let response = solve_simplex(&body, &Solver::new()).unwrap();
        assert!((response.objective_value + 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_parse_simplex_request() {
        let body = json!({"objective": [1, 2], "constraints": [[1, 1]], "b": [4]});
        let problem = parse_simplex_request(&body).unwrap();

        assert!(problem.objective.maximize);
        assert_eq!(problem.num_variables(), 2);
        assert_eq!(problem.constraints[0].name, "c1");

        let body = json!({"objective": [1], "constraints": [[1]], "b": [1], "isMaximization": "no"});
        assert_eq!(parse_simplex_request(&body).unwrap_err().status(), 400);
    }

    #[test]
    fn test_missing_parameters() {
        for body in [
            json!({"constraints": [[1]], "b": [1]}),
            json!({"objective": [1], "b": [1]}),
            json!({"objective": [1], "constraints": [[1]], "b": null}),
        ] {
            let err = solve_simplex(&body, &Solver::new()).unwrap_err();
            assert_eq!(err, ApiError::BadRequest(MISSING_PARAMETERS.into()));
            assert_eq!(err.status(), 400);
        }
    }

    #[test]
    fn test_non_array_parameters() {
        let body = json!({"objective": "1,2", "constraints": [[1, 1]], "b": [1]});
        let err = solve_simplex(&body, &Solver::new()).unwrap_err();
        assert_eq!(err, ApiError::BadRequest(NOT_ARRAYS.into()));
    }

    #[test]
    fn test_malformed_rows() {
        let body = json!({"objective": [1, 1], "constraints": [[1, "x"]], "b": [1]});
        let err = solve_simplex(&body, &Solver::new()).unwrap_err();
        assert_eq!(err.status(), 400);
        assert!(err.to_string().contains("constraints[0][1]"));

        let body = json!({"objective": [1, 1], "constraints": [[1]], "b": [1]});
        let err = solve_simplex(&body, &Solver::new()).unwrap_err();
        assert_eq!(err.status(), 400);

        let body = json!({"objective": [1], "constraints": [[1]], "b": [-1]});
        let err = solve_simplex(&body, &Solver::new()).unwrap_err();
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn test_unbounded_is_internal_error() {
        let body = json!({"objective": [1, 1], "constraints": [[1, 0]], "b": [5]});
        let err = solve_simplex(&body, &Solver::new()).unwrap_err();

        assert_eq!(err.status(), 500);
        assert_eq!(err.body().message, "Problem is unbounded");
    }

    #[test]
    fn test_budget_exhaustion_is_internal_error() {
        let body = json!({
            "objective": [3, 2],
            "constraints": [[1, 1], [1, 0], [0, 1]],
            "b": [4, 3, 3]
        });
        let err = solve_simplex(&body, &Solver::new().with_max_iterations(1)).unwrap_err();
        assert_eq!(err.status(), 500);
    }

    #[test]
    fn test_calculate_luggage_charge() {
        let body = json!({"luggageWeight": 25, "travelClass": "ECONOMY"});
        let fare = calculate_luggage_charge(&body, &LuggageCalculator::default()).unwrap();

        assert_eq!(fare.excess_weight, 5.0);
        assert_eq!(fare.excess_charge, 7500.0);
        assert_eq!(fare.total_fare, 17500.0);
    }

    #[test]
    fn test_invalid_luggage_weight() {
        let calc = LuggageCalculator::default();
        for weight in [json!(-3), json!(0), json!("20"), Value::Null] {
            let body = json!({"luggageWeight": weight, "travelClass": "ECONOMY"});
            let err = calculate_luggage_charge(&body, &calc).unwrap_err();
            assert_eq!(err, ApiError::BadRequest(INVALID_WEIGHT_MESSAGE.into()));
        }
    }

    #[test]
    fn test_invalid_travel_class() {
        let calc = LuggageCalculator::default();
        for class in [json!("VIP"), json!(1), Value::Null] {
            let body = json!({"luggageWeight": 10, "travelClass": class});
            let err = calculate_luggage_charge(&body, &calc).unwrap_err();
            assert_eq!(err, ApiError::BadRequest(INVALID_CLASS_MESSAGE.into()));
        }
    }
}
