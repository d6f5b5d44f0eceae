use std::fmt::Write as _;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::config::{
    ConditionsSettings, ConfigError, DEFAULT_MAX_PERIODS, InvestmentSettings, ScenarioSet,
    TargetSettings, validate_max_periods,
};
use crate::core::{FireError, run_simulation};
use crate::report::{
    ScenarioSummary, compare, format_currency, render_comparison, render_table,
};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Model(#[from] FireError),

    #[error("failed to encode output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

#[derive(Parser, Debug)]
#[command(
    name = "fire-projection",
    about = "Projects the year a portfolio can fund retirement, and its value afterwards"
)]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error); RUST_LOG overrides it
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Simulate one investment / target / conditions combination
    Run(RunArgs),
    /// Tabulate retirement ages for every investment and target pairing
    Compare(CompareArgs),
    /// Serve the JSON API
    Serve {
        #[arg(long, default_value_t = 8080)]
        port: u16,
    },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Args, Debug)]
pub struct ScenarioFiles {
    /// JSON file of named investment scenarios
    #[arg(long)]
    pub investments: PathBuf,
    /// JSON file of named target scenarios
    #[arg(long)]
    pub targets: PathBuf,
    /// JSON file of named economic conditions
    #[arg(long)]
    pub conditions: PathBuf,
}

#[derive(Args, Debug)]
pub struct RunArgs {
    #[command(flatten)]
    pub files: ScenarioFiles,
    #[arg(long)]
    pub investment_scenario: String,
    #[arg(long)]
    pub target_scenario: String,
    #[arg(long)]
    pub conditions_scenario: String,
    #[arg(long, default_value_t = DEFAULT_MAX_PERIODS)]
    pub max_periods: u32,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

#[derive(Args, Debug)]
pub struct CompareArgs {
    #[command(flatten)]
    pub files: ScenarioFiles,
    #[arg(long)]
    pub conditions_scenario: String,
    /// Comma separated; all scenarios in the file when omitted
    #[arg(long, value_delimiter = ',')]
    pub investment_scenarios: Vec<String>,
    /// Comma separated; all scenarios in the file when omitted
    #[arg(long, value_delimiter = ',')]
    pub target_scenarios: Vec<String>,
    #[arg(long, default_value_t = DEFAULT_MAX_PERIODS)]
    pub max_periods: u32,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    pub format: OutputFormat,
}

pub async fn execute(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Run(args) => print!("{}", run_command(&args)?),
        Command::Compare(args) => print!("{}", compare_command(&args)?),
        Command::Serve { port } => crate::api::run_http_server(port).await?,
    }
    Ok(())
}

pub fn run_command(args: &RunArgs) -> Result<String, CliError> {
    let max_periods = validate_max_periods(args.max_periods)?;
    let investments = ScenarioSet::<InvestmentSettings>::load(&args.files.investments)?;
    let targets = ScenarioSet::<TargetSettings>::load(&args.files.targets)?;
    let conditions = ScenarioSet::<ConditionsSettings>::load(&args.files.conditions)?;

    let portfolio = investments.select(&args.investment_scenario)?.build()?;
    let target = targets.select(&args.target_scenario)?.build()?;
    let conditions = conditions.select(&args.conditions_scenario)?.build()?;
    tracing::info!(
        investment = %args.investment_scenario,
        target = %args.target_scenario,
        conditions = %args.conditions_scenario,
        max_periods,
        "running projection"
    );

    let series = run_simulation(&portfolio, &target, &conditions, max_periods)?;
    let summary = ScenarioSummary::new(&portfolio, &target, &conditions, &series);

    if args.format == OutputFormat::Json {
        let body = serde_json::json!({ "summary": summary, "series": series });
        return Ok(format!("{}\n", serde_json::to_string_pretty(&body)?));
    }

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Target value at retirement: {} (nominal, FIRE factor {:.1})",
        format_currency(summary.target_value_at_retirement),
        summary.fire_factor
    );
    if let Some(real) = summary.real_average_yield_perc {
        let _ = writeln!(
            out,
            "Average yield after {:.2}% inflation: {real:.2}% per year",
            conditions.inflation_rate_average_perc
        );
    }
    if summary.retirement_net_loss_warning {
        let _ = writeln!(out, "WARNING: yearly net loss expected during retirement!");
    }
    match (summary.retirement_time, summary.retirement_age) {
        (Some(time), Some(age)) => {
            let _ = writeln!(out, "Retirement possible after {time} years, at age {age}");
        }
        _ => {
            let _ = writeln!(out, "Retirement target not reached within {max_periods} years");
        }
    }
    out.push('\n');
    out.push_str(&render_table(&series));
    Ok(out)
}

pub fn compare_command(args: &CompareArgs) -> Result<String, CliError> {
    let max_periods = validate_max_periods(args.max_periods)?;
    let investments = ScenarioSet::<InvestmentSettings>::load(&args.files.investments)?;
    let targets = ScenarioSet::<TargetSettings>::load(&args.files.targets)?;
    let conditions = ScenarioSet::<ConditionsSettings>::load(&args.files.conditions)?
        .select(&args.conditions_scenario)?
        .build()?;

    let investment_names = selected_names(&investments.names(), &args.investment_scenarios);
    let target_names = selected_names(&targets.names(), &args.target_scenarios);

    let portfolios = investment_names
        .iter()
        .map(|name| Ok((name.as_str(), investments.select(name)?.build()?)))
        .collect::<Result<Vec<_>, CliError>>()?;
    let profiles = target_names
        .iter()
        .map(|name| Ok((name.as_str(), targets.select(name)?.build()?)))
        .collect::<Result<Vec<_>, CliError>>()?;

    let rows = compare(&portfolios, &profiles, &conditions, max_periods)?;
    match args.format {
        OutputFormat::Json => Ok(format!("{}\n", serde_json::to_string_pretty(&rows)?)),
        OutputFormat::Table => Ok(render_comparison(&rows)),
    }
}

fn selected_names(available: &[&str], requested: &[String]) -> Vec<String> {
    if requested.is_empty() {
        available.iter().map(|name| name.to_string()).collect()
    } else {
        requested.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const INVESTMENTS: &str = r#"{
      "steady": {
        "investment_opportunities": { "ETF": { "yield_per_year_perc": 6 } },
        "investment_structure_fix": [[1.0, "ETF"]],
        "investment_structure_var": [[1.0, "ETF"]],
        "initial_assets": 0,
        "investments_monthly": 1000
      },
      "cautious": {
        "investment_opportunities": { "BONDS": { "yield_per_year_perc": 2 } },
        "investment_structure_fix": [[1.0, "BONDS"]],
        "investment_structure_var": [[1.0, "BONDS"]],
        "initial_assets": 0,
        "investments_monthly": 200
      }
    }"#;

    const TARGETS: &str = r#"{
      "lean": {
        "target_value_arr": {
          "living": { "value": 1200, "frequency": "YEARLY" },
          "car": { "value": 5000, "frequency": "ONE_TIME" }
        },
        "withdrawal_rate_perc": 4
      }
    }"#;

    const CONDITIONS: &str = r#"{
      "germany": {
        "average_inflation_rate_perc": 2,
        "capital_tax_rate_perc": 26,
        "tax_mode": "TAX_ON_REALIZATION",
        "start_age": 30
      }
    }"#;

    fn scenario_dir() -> (TempDir, ScenarioFiles) {
        let dir = tempfile::tempdir().expect("temp dir");
        let investments = dir.path().join("investments.json");
        let targets = dir.path().join("targets.json");
        let conditions = dir.path().join("conditions.json");
        fs::write(&investments, INVESTMENTS).expect("write investments");
        fs::write(&targets, TARGETS).expect("write targets");
        fs::write(&conditions, CONDITIONS).expect("write conditions");
        (
            dir,
            ScenarioFiles {
                investments,
                targets,
                conditions,
            },
        )
    }

    #[test]
    fn cli_parses_run_subcommand() {
        let cli = Cli::try_parse_from([
            "fire-projection",
            "run",
            "--investments",
            "i.json",
            "--targets",
            "t.json",
            "--conditions",
            "c.json",
            "--investment-scenario",
            "steady",
            "--target-scenario",
            "lean",
            "--conditions-scenario",
            "germany",
            "--format",
            "json",
        ])
        .expect("valid args");

        match cli.command {
            Command::Run(args) => {
                assert_eq!(args.investment_scenario, "steady");
                assert_eq!(args.max_periods, DEFAULT_MAX_PERIODS);
                assert_eq!(args.format, OutputFormat::Json);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn cli_parses_comma_separated_scenarios() {
        let cli = Cli::try_parse_from([
            "fire-projection",
            "compare",
            "--investments",
            "i.json",
            "--targets",
            "t.json",
            "--conditions",
            "c.json",
            "--conditions-scenario",
            "germany",
            "--investment-scenarios",
            "steady,cautious",
        ])
        .expect("valid args");

        match cli.command {
            Command::Compare(args) => {
                assert_eq!(args.investment_scenarios, vec!["steady", "cautious"]);
                assert!(args.target_scenarios.is_empty());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn run_command_prints_retirement_age_and_table() {
        let (_dir, files) = scenario_dir();
        let args = RunArgs {
            files,
            investment_scenario: "steady".to_string(),
            target_scenario: "lean".to_string(),
            conditions_scenario: "germany".to_string(),
            max_periods: 10,
            format: OutputFormat::Table,
        };

        let out = run_command(&args).expect("run");
        assert!(out.contains("35,000€"));
        assert!(out.contains("at age 33"));
        assert!(out.contains("12,397€"));
    }

    #[test]
    fn run_command_json_contains_series() {
        let (_dir, files) = scenario_dir();
        let args = RunArgs {
            files,
            investment_scenario: "steady".to_string(),
            target_scenario: "lean".to_string(),
            conditions_scenario: "germany".to_string(),
            max_periods: 5,
            format: OutputFormat::Json,
        };

        let out = run_command(&args).expect("run");
        let value: serde_json::Value = serde_json::from_str(&out).expect("json output");
        assert_eq!(value["summary"]["retirementTime"], 3);
        assert_eq!(value["series"]["records"].as_array().map(Vec::len), Some(6));
    }

    #[test]
    fn run_command_reports_missing_scenario() {
        let (_dir, files) = scenario_dir();
        let args = RunArgs {
            files,
            investment_scenario: "yolo".to_string(),
            target_scenario: "lean".to_string(),
            conditions_scenario: "germany".to_string(),
            max_periods: 5,
            format: OutputFormat::Table,
        };

        let err = run_command(&args).expect_err("yolo is not defined");
        assert!(matches!(
            err,
            CliError::Config(ConfigError::MissingScenario { kind: "investment", .. })
        ));
    }

    #[test]
    fn compare_command_covers_all_scenarios_by_default() {
        let (_dir, files) = scenario_dir();
        let args = CompareArgs {
            files,
            conditions_scenario: "germany".to_string(),
            investment_scenarios: Vec::new(),
            target_scenarios: Vec::new(),
            max_periods: 20,
            format: OutputFormat::Json,
        };

        let out = compare_command(&args).expect("compare");
        let rows: serde_json::Value = serde_json::from_str(&out).expect("json output");
        let rows = rows.as_array().expect("array");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["investment"], "cautious");
        assert_eq!(rows[1]["retirementAge"], 33);
    }
}
