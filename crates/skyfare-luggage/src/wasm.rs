//! WASM bindings for skyfare
//!
//! Exposes the same request shapes as the HTTP endpoints so a browser client can price
//! luggage and solve programs without a server round trip.

use serde_json::Value;
use skyfare_solver::Solver;
use wasm_bindgen::prelude::*;

use crate::api;
use crate::fare::LuggageCalculator;
use crate::selection::{LuggageSelector, SelectionConstraint, SelectionStrategy};

fn to_js_error(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&e.to_string())
}

/// Solve a `{objective, constraints, b, isMaximization?}` request and return `{values, objectiveValue}`
#[wasm_bindgen(js_name = solveSimplex)]
pub fn solve_simplex(request: JsValue) -> Result<JsValue, JsValue> {
    let body: Value = serde_wasm_bindgen::from_value(request).map_err(to_js_error)?;
    let response = api::solve_simplex(&body, &Solver::new()).map_err(to_js_error)?;
    serde_wasm_bindgen::to_value(&response).map_err(to_js_error)
}

/// Price a `{luggageWeight, travelClass}` request with the default fare table
#[wasm_bindgen(js_name = calculateLuggageCharge)]
pub fn calculate_luggage_charge(request: JsValue) -> Result<JsValue, JsValue> {
    let body: Value = serde_wasm_bindgen::from_value(request).map_err(to_js_error)?;
    let fare = api::calculate_luggage_charge(&body, &LuggageCalculator::default())
        .map_err(to_js_error)?;
    serde_wasm_bindgen::to_value(&fare).map_err(to_js_error)
}

/// Choose which pieces to keep within the weight and piece budgets
#[wasm_bindgen(js_name = selectLuggage)]
pub fn select_luggage(
    weights: Vec<f64>,
    values: Vec<f64>,
    max_weight: f64,
    max_pieces: u32,
    exact: bool,
) -> Result<JsValue, JsValue> {
    let constraint = SelectionConstraint {
        max_weight,
        max_pieces,
        base_price: 0.0,
    };
    let strategy = if exact {
        SelectionStrategy::Exact
    } else {
        SelectionStrategy::Relaxation
    };

    let result = LuggageSelector::new(weights, values, constraint)
        .map_err(to_js_error)?
        .with_strategy(strategy)
        .solve()
        .map_err(to_js_error)?;
    serde_wasm_bindgen::to_value(&result).map_err(to_js_error)
}
