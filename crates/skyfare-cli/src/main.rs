use clap::{Parser, Subcommand};
use serde::Deserialize;
use serde_json::{Value, json};
use skyfare_luggage::api;
use skyfare_luggage::{
    Config, FareBreakdown, LuggageSelector, SelectionConstraint, SelectionResult,
    SelectionStrategy, TravelClass,
};
use skyfare_solver::Solution;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use tracing::{debug, error};

#[derive(Parser)]
#[command(name = "skyfare")]
#[command(about = "Simplex solver and excess-baggage fares", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a linear program written as an /api/simplex request body
    Solve {
        /// JSON file with objective, constraints, b and optional isMaximization
        file: PathBuf,
        /// Output format (json, pretty)
        #[arg(short, long, default_value = "pretty")]
        format: String,
        /// Show shadow prices and binding constraints
        #[arg(short, long)]
        analysis: bool,
    },
    /// Choose which luggage pieces to keep
    Select {
        /// JSON file with weights, values and an optional constraint
        file: PathBuf,
        /// Use this class's allowance as the budget and price the result
        #[arg(short, long)]
        class: Option<String>,
        /// Selection strategy (relaxation, exact)
        #[arg(short, long)]
        strategy: Option<String>,
        /// Output format (json, pretty)
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },
    /// Price luggage for a travel class
    Fare {
        /// Luggage weight in kilograms
        #[arg(short, long)]
        weight: f64,
        /// Travel class (ECONOMY, BUSINESS, FIRST)
        #[arg(short, long)]
        class: String,
        /// Output format (json, pretty)
        #[arg(short, long, default_value = "pretty")]
        format: String,
    },
}

#[derive(Debug, Deserialize)]
struct SelectInput {
    weights: Vec<f64>,
    values: Vec<f64>,
    #[serde(default)]
    constraint: Option<SelectionConstraint>,
}

fn main() {
    let cli = Cli::parse();

    let config = match Config::load_or_default(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => fail("Config error", e),
    };
    config.init_logging();
    debug!(config = ?cli.config, "configuration loaded");

    match cli.command {
        Commands::Solve {
            file,
            format,
            analysis,
        } => {
            let body = read_json(&file);
            let problem = match api::parse_simplex_request(&body) {
                Ok(p) => p,
                Err(e) => fail("Input error", e),
            };

            let solution = match config.solver.build().solve(&problem) {
                Ok(s) => s,
                Err(e) => {
                    println!("Status: FAILED");
                    fail("Solve error", e);
                }
            };

            if format == "json" {
                print_json(&solution);
            } else {
                print_solution(&solution, analysis);
            }
        }
        Commands::Select {
            file,
            class,
            strategy,
            format,
        } => {
            let input: SelectInput = match serde_json::from_value(read_json(&file)) {
                Ok(i) => i,
                Err(e) => fail("Input error", e),
            };
            let class = class.map(|c| parse_class(&c));
            let strategy = match strategy {
                Some(s) => parse_strategy(&s),
                None => config.selection.strategy,
            };

            let calculator = config.calculator();
            let constraint = match (input.constraint, class) {
                (Some(constraint), _) => constraint,
                (None, Some(class)) => calculator.constraint_for(class),
                (None, None) => fail(
                    "Input error",
                    "a constraint is required in the file when --class is not given",
                ),
            };

            let selector = match LuggageSelector::new(input.weights, input.values, constraint) {
                Ok(s) => s
                    .with_strategy(strategy)
                    .with_excess_rate(config.selection.excess_rate_per_kg)
                    .with_solver(config.solver.build()),
                Err(e) => fail("Input error", e),
            };

            let selection = match selector.solve() {
                Ok(s) => s,
                Err(e) => fail("Selection error", e),
            };

            let fare = class.map(|class| match calculator.price_selection(&selection, class) {
                Ok(f) => f,
                Err(e) => fail("Pricing error", e),
            });

            if format == "json" {
                print_json(&json!({ "selection": selection, "fare": fare }));
            } else {
                print_selection(&selection, selector.constraint());
                if let Some(fare) = fare {
                    println!();
                    print_fare(&fare);
                }
            }
        }
        Commands::Fare {
            weight,
            class,
            format,
        } => {
            let class = parse_class(&class);
            let fare = match config.calculator().calculate_fare(weight, class) {
                Ok(f) => f,
                Err(e) => fail("Input error", e),
            };

            if format == "json" {
                print_json(&fare);
            } else {
                print_fare(&fare);
            }
        }
    }
}

fn fail(context: &str, error: impl Display) -> ! {
    report(context, &error);
    std::process::exit(1);
}

/// Log a failure; falls back to plain stderr before the subscriber is installed
fn report(context: &str, error: &dyn Display) {
    error!(error = %error, "{}", context);
    if !tracing::dispatcher::has_been_set() {
        eprintln!("{}: {}", context, error);
    }
}

fn read_json(path: &Path) -> Value {
    let source = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => fail("Error reading file", e),
    };
    debug!(path = %path.display(), bytes = source.len(), "read request file");
    match serde_json::from_str(&source) {
        Ok(v) => v,
        Err(e) => fail("Invalid JSON", e),
    }
}

fn parse_class(name: &str) -> TravelClass {
    match name.to_ascii_uppercase().parse() {
        Ok(c) => c,
        Err(e) => fail("Input error", e),
    }
}

fn parse_strategy(name: &str) -> SelectionStrategy {
    match name.to_ascii_lowercase().as_str() {
        "relaxation" => SelectionStrategy::Relaxation,
        "exact" => SelectionStrategy::Exact,
        other => fail(
            "Input error",
            format!("unknown strategy '{}', expected relaxation or exact", other),
        ),
    }
}

fn print_json(value: &impl serde::Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(s) => println!("{}", s),
        Err(e) => fail("Output error", e),
    }
}

fn print_solution(solution: &Solution, analysis: bool) {
    println!("Status: OPTIMAL");
    println!("Objective value: {:.4}", solution.objective_value);
    println!("Iterations: {}", solution.iterations);
    println!();
    println!("Variables:");
    for (i, value) in solution.values.iter().enumerate() {
        println!("  x{:<19} {:12.4}", i + 1, value);
    }

    if analysis {
        println!();
        println!("Analysis:");
        println!();

        let binding: Vec<&str> = solution.analysis.binding_constraints().collect();
        if !binding.is_empty() {
            println!("Binding constraints:");
            for name in binding {
                println!("  - {}", name);
            }
            println!();
        }

        println!("Constraints:");
        println!(
            "  {:20} {:>12} {:>12} {:>12}",
            "name", "activity", "slack", "shadow price"
        );
        for row in &solution.analysis.constraints {
            println!(
                "  {:20} {:12.4} {:12.4} {:12.4}",
                row.name, row.activity, row.slack, row.shadow_price
            );
        }
    }
}

fn print_selection(selection: &SelectionResult, constraint: &SelectionConstraint) {
    let kept: Vec<String> = selection
        .selected_indices()
        .map(|i| (i + 1).to_string())
        .collect();

    println!(
        "Selected pieces: {}",
        if kept.is_empty() {
            "none".to_string()
        } else {
            kept.join(", ")
        }
    );
    println!(
        "Total weight: {}kg (limit {}kg)",
        selection.total_weight, constraint.max_weight
    );
    println!(
        "Pieces: {} (limit {})",
        selection.total_pieces, constraint.max_pieces
    );
    println!("Total value: {}", selection.total_value);
    if selection.excess_charge > 0.0 {
        println!("Excess charge: {:.2}", selection.excess_charge);
    }
}

fn print_fare(fare: &FareBreakdown) {
    println!("Class: {}", fare.travel_class);
    println!("{}", fare.message);
    println!("{}", fare.weight_limit_message);
    println!();
    println!("  Base fare:     {:>12}", fare.breakdown.base_fare);
    println!("  Excess charge: {:>12}", fare.breakdown.excess_charge);
    println!("  Total fare:    {:>12}", fare.breakdown.total_fare);
}
