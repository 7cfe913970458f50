//! Excess-baggage fare pricing per travel class.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LuggageError;
use crate::selection::{SelectionConstraint, SelectionResult};

pub const INVALID_WEIGHT_MESSAGE: &str = "Invalid luggage weight";
pub const INVALID_CLASS_MESSAGE: &str = "Invalid travel class. Must be ECONOMY, BUSINESS, or FIRST";

/// The warning message shows paise, the formatted breakdown does not
const MESSAGE_FRACTION_DIGITS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TravelClass {
    Economy,
    Business,
    First,
}

impl TravelClass {
    pub const ALL: [TravelClass; 3] = [Self::Economy, Self::Business, Self::First];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Economy => "ECONOMY",
            Self::Business => "BUSINESS",
            Self::First => "FIRST",
        }
    }
}

impl fmt::Display for TravelClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TravelClass {
    type Err = LuggageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|class| class.as_str() == s)
            .ok_or_else(|| LuggageError::invalid(INVALID_CLASS_MESSAGE))
    }
}

/// Baggage allowance and pricing for one travel class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassAllowance {
    /// Free weight allowance in kilograms
    pub standard_limit: f64,
    pub base_price: f64,
    pub excess_charge_per_kg: f64,
    pub max_pieces: u32,
}

impl ClassAllowance {
    pub fn economy() -> Self {
        Self {
            standard_limit: 20.0,
            base_price: 10000.0,
            excess_charge_per_kg: 1500.0,
            max_pieces: 2,
        }
    }

    pub fn business() -> Self {
        Self {
            standard_limit: 30.0,
            base_price: 25000.0,
            excess_charge_per_kg: 1750.0,
            max_pieces: 2,
        }
    }

    pub fn first() -> Self {
        Self {
            standard_limit: 40.0,
            base_price: 45000.0,
            excess_charge_per_kg: 2000.0,
            max_pieces: 3,
        }
    }
}

/// Allowances for every travel class. Loadable from the `[fares]` config section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FareTable {
    #[serde(rename = "ECONOMY", default = "ClassAllowance::economy")]
    pub economy: ClassAllowance,
    #[serde(rename = "BUSINESS", default = "ClassAllowance::business")]
    pub business: ClassAllowance,
    #[serde(rename = "FIRST", default = "ClassAllowance::first")]
    pub first: ClassAllowance,
}

impl Default for FareTable {
    fn default() -> Self {
        Self {
            economy: ClassAllowance::economy(),
            business: ClassAllowance::business(),
            first: ClassAllowance::first(),
        }
    }
}

impl FareTable {
    pub fn get(&self, class: TravelClass) -> &ClassAllowance {
        match class {
            TravelClass::Economy => &self.economy,
            TravelClass::Business => &self.business,
            TravelClass::First => &self.first,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormattedFare {
    pub base_fare: String,
    pub excess_charge: String,
    pub total_fare: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FareBreakdown {
    pub travel_class: TravelClass,
    pub luggage_weight: f64,
    pub weight_limit: f64,
    pub is_excess: bool,
    pub excess_weight: f64,
    pub base_fare: f64,
    pub excess_charge: f64,
    pub total_fare: f64,
    pub message: String,
    pub weight_limit_message: String,
    pub breakdown: FormattedFare,
}

/// Prices luggage against a [`FareTable`]
#[derive(Debug, Clone, Default)]
pub struct LuggageCalculator {
    table: FareTable,
}

impl LuggageCalculator {
    pub fn new(table: FareTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &FareTable {
        &self.table
    }

    /// Selection budget matching the class allowance
    pub fn constraint_for(&self, class: TravelClass) -> SelectionConstraint {
        let allowance = self.table.get(class);
        SelectionConstraint {
            max_weight: allowance.standard_limit,
            max_pieces: allowance.max_pieces,
            base_price: allowance.base_price,
        }
    }

    /// Price a single traveller's luggage. The weight must be a positive number.
    pub fn calculate_fare(
        &self,
        luggage_weight: f64,
        class: TravelClass,
    ) -> Result<FareBreakdown, LuggageError> {
        if !luggage_weight.is_finite() || luggage_weight <= 0.0 {
            return Err(LuggageError::invalid(INVALID_WEIGHT_MESSAGE));
        }
        Ok(self.breakdown(luggage_weight, class))
    }

    /// Price the pieces kept by a selection; an empty selection pays the base fare only
    pub fn price_selection(
        &self,
        selection: &SelectionResult,
        class: TravelClass,
    ) -> Result<FareBreakdown, LuggageError> {
        if !selection.total_weight.is_finite() || selection.total_weight < 0.0 {
            return Err(LuggageError::invalid(INVALID_WEIGHT_MESSAGE));
        }
        Ok(self.breakdown(selection.total_weight, class))
    }

    fn breakdown(&self, luggage_weight: f64, class: TravelClass) -> FareBreakdown {
        let allowance = self.table.get(class);
        let limit = allowance.standard_limit;
        let base_fare = allowance.base_price;

        let is_excess = luggage_weight > limit;
        let excess_weight = (luggage_weight - limit).max(0.0);
        let excess_charge = excess_weight * allowance.excess_charge_per_kg;
        let total_fare = base_fare + excess_charge;

        let message = if is_excess {
            format!(
                "Warning: Luggage weight ({luggage_weight}kg) exceeds {class} class limit of {limit}kg. \
                 Extra charge of ₹{} applies.",
                group_indian(excess_charge, MESSAGE_FRACTION_DIGITS)
            )
        } else {
            format!(
                "Luggage weight ({luggage_weight}kg) is within {class} class limit of {limit}kg. No extra charges."
            )
        };

        FareBreakdown {
            travel_class: class,
            luggage_weight,
            weight_limit: limit,
            is_excess,
            excess_weight,
            base_fare,
            excess_charge,
            total_fare,
            message,
            weight_limit_message: format!("Maximum allowed weight for {class} class is {limit}kg"),
            breakdown: FormattedFare {
                base_fare: format_inr(base_fare),
                excess_charge: format_inr(excess_charge),
                total_fare: format_inr(total_fare),
            },
        }
    }
}

/// Format rupees with Indian digit grouping and no fraction digits, e.g. `₹12,34,567`
pub fn format_inr(amount: f64) -> String {
    let rounded = amount.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{sign}₹{}", group_indian(rounded, 0))
}

/// Indian digit grouping of `|amount|` with at most `max_fraction_digits` decimals,
/// trailing zeros dropped
fn group_indian(amount: f64, max_fraction_digits: usize) -> String {
    let fixed = format!("{:.*}", max_fraction_digits, amount.abs());
    let (whole, fraction) = match fixed.split_once('.') {
        Some((whole, fraction)) => (whole, fraction.trim_end_matches('0')),
        None => (fixed.as_str(), ""),
    };

    let grouped = if whole.len() <= 3 {
        whole.to_string()
    } else {
        let (head, tail) = whole.split_at(whole.len() - 3);
        let mut groups: Vec<&str> = Vec::new();
        let mut end = head.len();
        while end > 0 {
            let start = end.saturating_sub(2);
            groups.push(&head[start..end]);
            end = start;
        }
        groups.reverse();
        format!("{},{}", groups.join(","), tail)
    };

    if fraction.is_empty() {
        grouped
    } else {
        format!("{grouped}.{fraction}")
    }
}
