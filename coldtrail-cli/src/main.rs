use anyhow::{Context, Result, bail};
use clap::Parser;
use colored::Colorize;
use serde::Deserialize;
use std::fs::File;
use std::io::{BufWriter, Read, Write, stdout};
use std::path::PathBuf;

use coldtrail_engine::numbers::{format_thousands, round_f64_to_i64};
use coldtrail_engine::{
    DEFAULT_CARGO_TONS, EPA_CARBON_MULTIPLIER, EvaluationParams, ImpactParams, ScenarioResult,
    ScenarioRow, SkippedTruck, TelemetrySnapshot, TruckEnvironmentalImpact,
    compute_fleet_environmental_impact, compute_truck_environmental_impact, evaluate_fleet,
    evaluate_scenario,
};

const DEFAULT_COST_SAMPLES: u32 = 20_000;
const DEFAULT_ENV_SAMPLES: u32 = coldtrail_engine::DEFAULT_ENVIRONMENTAL_SAMPLES;

#[derive(Debug, Parser)]
#[command(name = "coldtrail", version)]
#[command(about = "Risk-aware batch evaluation for cold-chain fleets - JSON in, decisions out")]
struct Args {
    /// JSON input path, or '-' for stdin. Accepts a telemetry snapshot
    /// array, {"trucks": [...]}, or (with --scenario-rows) scenario rows.
    #[arg(long, default_value = "-")]
    input: String,

    /// Treat the input as pre-derived scenario rows instead of telemetry
    #[arg(long)]
    scenario_rows: bool,

    /// Tolerated cost-tail risk in [0,1]; 0.25 safe, 0.50 balanced, 0.75 cheap
    #[arg(long, default_value_t = 0.5)]
    risk_threshold: f64,

    /// Monte Carlo samples per action (default 20000, or 5000 with --environmental)
    #[arg(long)]
    samples: Option<u32>,

    /// Base seed; each truck evaluates at seed + truck_id
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Emit per-truck environmental impact instead of cost evaluations
    #[arg(long)]
    environmental: bool,

    /// Cargo weight assumption for carbon figures
    #[arg(long, default_value_t = DEFAULT_CARGO_TONS)]
    cargo_tons: f64,

    /// Carbon price in dollars per metric ton CO2
    #[arg(long, default_value_t = EPA_CARBON_MULTIPLIER)]
    carbon_price: f64,

    /// Output report format
    #[arg(long, default_value = "json")]
    #[arg(value_parser = ["json", "console"])]
    report: String,

    /// Optional path to write the report instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Verbose output (full rationale per truck in console reports)
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn evaluation_params(&self) -> EvaluationParams {
        let fallback = if self.environmental {
            DEFAULT_ENV_SAMPLES
        } else {
            DEFAULT_COST_SAMPLES
        };
        EvaluationParams {
            risk_threshold: self.risk_threshold,
            samples: self.samples.unwrap_or(fallback),
            seed: self.seed,
        }
    }

    const fn impact_params(&self) -> ImpactParams {
        ImpactParams {
            cargo_tons: self.cargo_tons,
            carbon_price: self.carbon_price,
        }
    }
}

/// Either report payload the run can produce.
enum BatchOutcome {
    Cost {
        results: Vec<ScenarioResult>,
        skipped: Vec<SkippedTruck>,
    },
    Environmental {
        impacts: Vec<TruckEnvironmentalImpact>,
        skipped_count: usize,
    },
}

impl BatchOutcome {
    fn evaluated_count(&self) -> usize {
        match self {
            Self::Cost { results, .. } => results.len(),
            Self::Environmental { impacts, .. } => impacts.len(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FleetRequest {
    Wrapped { trucks: Vec<TelemetrySnapshot> },
    Bare(Vec<TelemetrySnapshot>),
}

impl FleetRequest {
    fn into_trucks(self) -> Vec<TelemetrySnapshot> {
        match self {
            Self::Wrapped { trucks } | Self::Bare(trucks) => trucks,
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let payload = read_input(&args.input)?;
    let outcome = run_batch(&args, &payload)?;

    if let BatchOutcome::Cost { skipped, .. } = &outcome {
        for skip in skipped {
            log::warn!("truck {} skipped: {}", skip.truck_id, skip.reason);
        }
    }

    let mut output_target = OutputTarget::new(args.output.clone())?;
    write_report(&args, &outcome, &mut output_target)?;
    output_target.flush_inner()?;

    if outcome.evaluated_count() == 0 {
        eprintln!("{}", "No truck produced a result".red());
        std::process::exit(1);
    }
    Ok(())
}

fn read_input(input: &str) -> Result<String> {
    let mut payload = String::new();
    if input == "-" {
        std::io::stdin()
            .read_to_string(&mut payload)
            .context("failed to read stdin")?;
    } else {
        File::open(input)
            .and_then(|mut file| file.read_to_string(&mut payload))
            .with_context(|| format!("failed to read {input}"))?;
    }
    if payload.trim().is_empty() {
        bail!("input is empty");
    }
    Ok(payload)
}

fn run_batch(args: &Args, payload: &str) -> Result<BatchOutcome> {
    let params = args.evaluation_params();
    if args.scenario_rows {
        let rows: Vec<ScenarioRow> =
            serde_json::from_str(payload).context("input is not a scenario-row array")?;
        run_scenario_rows(args, &params, &rows)
    } else {
        let trucks = serde_json::from_str::<FleetRequest>(payload)
            .context("input is not a telemetry batch")?
            .into_trucks();
        run_telemetry(args, &params, &trucks)
    }
}

fn run_scenario_rows(
    args: &Args,
    params: &EvaluationParams,
    rows: &[ScenarioRow],
) -> Result<BatchOutcome> {
    let mut results = Vec::with_capacity(rows.len());
    for row in rows {
        results.push(evaluate_scenario(row, &params.for_truck(row.truck_id))?);
    }
    if args.environmental {
        let impact_params = args.impact_params();
        let mut impacts = Vec::with_capacity(results.len());
        for (row, result) in rows.iter().zip(&results) {
            impacts.push(compute_truck_environmental_impact(
                result,
                row.distance_base_miles,
                &impact_params,
            )?);
        }
        return Ok(BatchOutcome::Environmental {
            impacts,
            skipped_count: 0,
        });
    }
    Ok(BatchOutcome::Cost {
        results,
        skipped: Vec::new(),
    })
}

fn run_telemetry(
    args: &Args,
    params: &EvaluationParams,
    trucks: &[TelemetrySnapshot],
) -> Result<BatchOutcome> {
    if args.environmental {
        let impacts =
            compute_fleet_environmental_impact(trucks, params, &args.impact_params())?;
        let skipped_count = trucks.len() - impacts.len();
        return Ok(BatchOutcome::Environmental {
            impacts,
            skipped_count,
        });
    }
    let outcome = evaluate_fleet(trucks, params)?;
    Ok(BatchOutcome::Cost {
        results: outcome.results,
        skipped: outcome.skipped,
    })
}

fn write_report(args: &Args, outcome: &BatchOutcome, target: &mut OutputTarget) -> Result<()> {
    match args.report.as_str() {
        "console" => write_console_report(args, outcome, target),
        _ => write_json_report(outcome, target),
    }
}

fn write_json_report(outcome: &BatchOutcome, target: &mut OutputTarget) -> Result<()> {
    match outcome {
        BatchOutcome::Cost { results, .. } => {
            serde_json::to_writer_pretty(target.writer(), results)?;
        }
        BatchOutcome::Environmental { impacts, .. } => {
            serde_json::to_writer_pretty(target.writer(), impacts)?;
        }
    }
    writeln!(target.writer())?;
    Ok(())
}

fn write_console_report(
    args: &Args,
    outcome: &BatchOutcome,
    target: &mut OutputTarget,
) -> Result<()> {
    match outcome {
        BatchOutcome::Cost { results, skipped } => {
            writeln!(target, "{}", "🚚 Coldtrail Fleet Evaluation".bright_cyan().bold())?;
            writeln!(target, "{}", "=".repeat(32).cyan())?;
            for result in results {
                let chosen = &result.per_action[&result.recommended_action];
                writeln!(
                    target,
                    "✅ truck {:>4}  {}  {} cost ${}",
                    result.truck_id,
                    format!("{:>8}", result.recommended_action.name()).bright_green(),
                    result.quantile_used,
                    format_thousands(round_f64_to_i64(chosen.score)),
                )?;
                if args.verbose {
                    writeln!(target, "    {}", result.rationale.dimmed())?;
                }
            }
            for skip in skipped {
                writeln!(
                    target,
                    "⚠️  truck {:>4}  {}",
                    skip.truck_id,
                    skip.reason.to_string().yellow()
                )?;
            }
            writeln!(
                target,
                "🏁 {} evaluated, {} skipped",
                results.len(),
                skipped.len()
            )?;
        }
        BatchOutcome::Environmental {
            impacts,
            skipped_count,
        } => {
            writeln!(target, "{}", "🌱 Coldtrail Environmental Impact".bright_cyan().bold())?;
            writeln!(target, "{}", "=".repeat(32).cyan())?;
            let mut total_value = 0.0;
            for impact in impacts {
                total_value += impact.total_sustainability_value;
                writeln!(
                    target,
                    "✅ truck {:>4}  {} → {}  carbon {:.6} t  value ${:.2}  SROI {:.4}",
                    impact.truck_id,
                    impact.baseline_action,
                    format!("{}", impact.chosen_action).bright_green(),
                    impact.total_tonnes_carbon_saved,
                    impact.total_sustainability_value,
                    impact.sustainability_roi_ratio,
                )?;
                if args.verbose
                    && let Some(note) = &impact.assumptions.note
                {
                    writeln!(target, "    {}", note.dimmed())?;
                }
            }
            writeln!(
                target,
                "🏁 {} trucks, {} skipped, total sustainability value ${total_value:.2}",
                impacts.len(),
                skipped_count
            )?;
        }
    }
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args {
            input: "-".to_string(),
            scenario_rows: false,
            risk_threshold: 0.5,
            samples: Some(500),
            seed: 42,
            environmental: false,
            cargo_tons: DEFAULT_CARGO_TONS,
            carbon_price: EPA_CARBON_MULTIPLIER,
            report: "json".to_string(),
            output: None,
            verbose: false,
        }
    }

    fn telemetry_payload() -> String {
        r#"[
            {"truck_id": 1, "sensor": {"violation_min": 12, "remaining_slack_min": -15}},
            {"truck_id": 2}
        ]"#
        .to_string()
    }

    fn scenario_row_payload() -> String {
        r#"[{
            "truck_id": 1, "node_id": 0,
            "minutes_above_temp": 20, "future_violation_if_continue": 40,
            "reroute_reduction": 24, "detour_repair_benefit": 40,
            "slack_minutes": 0, "door_open": 0, "high_humidity": 0,
            "distance_base_miles": 50, "delay_base_minutes": 10,
            "spoilage_time_base_hours": 0.5, "shipment_value": 75000
        }]"#
        .to_string()
    }

    #[test]
    fn samples_default_depends_on_mode() {
        let mut args = base_args();
        args.samples = None;
        assert_eq!(args.evaluation_params().samples, 20_000);
        args.environmental = true;
        assert_eq!(args.evaluation_params().samples, 5_000);
        args.samples = Some(777);
        assert_eq!(args.evaluation_params().samples, 777);
    }

    #[test]
    fn wrapped_and_bare_requests_parse_alike() {
        let bare: FleetRequest = serde_json::from_str(&telemetry_payload()).unwrap();
        assert_eq!(bare.into_trucks().len(), 2);
        let wrapped: FleetRequest =
            serde_json::from_str(&format!("{{\"trucks\": {}}}", telemetry_payload())).unwrap();
        assert_eq!(wrapped.into_trucks().len(), 2);
    }

    #[test]
    fn telemetry_batch_isolates_sensorless_trucks() {
        let outcome = run_batch(&base_args(), &telemetry_payload()).unwrap();
        let BatchOutcome::Cost { results, skipped } = outcome else {
            panic!("expected cost outcome");
        };
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].truck_id, 1);
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].truck_id, 2);
    }

    #[test]
    fn scenario_rows_mode_evaluates_directly() {
        let args = Args {
            scenario_rows: true,
            ..base_args()
        };
        let outcome = run_batch(&args, &scenario_row_payload()).unwrap();
        let BatchOutcome::Cost { results, skipped } = outcome else {
            panic!("expected cost outcome");
        };
        assert_eq!(results.len(), 1);
        assert!(skipped.is_empty());
        assert_eq!(results[0].quantile_used, "p50");
    }

    #[test]
    fn environmental_mode_reports_impacts() {
        let args = Args {
            environmental: true,
            ..base_args()
        };
        let outcome = run_batch(&args, &telemetry_payload()).unwrap();
        let BatchOutcome::Environmental {
            impacts,
            skipped_count,
        } = outcome
        else {
            panic!("expected environmental outcome");
        };
        assert_eq!(impacts.len(), 1);
        assert_eq!(skipped_count, 1);
        assert!(impacts[0].total_tonnes_carbon_saved >= 0.0);
    }

    #[test]
    fn invalid_params_fail_the_run() {
        let args = Args {
            risk_threshold: 1.5,
            ..base_args()
        };
        assert!(run_batch(&args, &telemetry_payload()).is_err());
    }

    #[test]
    fn json_report_writes_a_result_array() {
        let temp = std::env::temp_dir().join("coldtrail-report.json");
        let outcome = run_batch(&base_args(), &telemetry_payload()).unwrap();
        let mut target = OutputTarget::new(Some(temp.clone())).unwrap();
        write_json_report(&outcome, &mut target).unwrap();
        target.flush_inner().unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        let parsed: Vec<ScenarioResult> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn console_report_lists_trucks_and_totals() {
        let temp = std::env::temp_dir().join("coldtrail-report.txt");
        let args = Args {
            report: "console".to_string(),
            verbose: true,
            ..base_args()
        };
        let outcome = run_batch(&args, &telemetry_payload()).unwrap();
        let mut target = OutputTarget::new(Some(temp.clone())).unwrap();
        write_console_report(&args, &outcome, &mut target).unwrap();
        target.flush_inner().unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("truck    1"));
        assert!(content.contains("1 evaluated, 1 skipped"));
        assert!(content.contains("risk tolerance") || content.contains("routing decision"));
    }

    #[test]
    fn environmental_console_report_totals_value() {
        let temp = std::env::temp_dir().join("coldtrail-env-report.txt");
        let args = Args {
            report: "console".to_string(),
            environmental: true,
            ..base_args()
        };
        let outcome = run_batch(&args, &telemetry_payload()).unwrap();
        let mut target = OutputTarget::new(Some(temp.clone())).unwrap();
        write_console_report(&args, &outcome, &mut target).unwrap();
        target.flush_inner().unwrap();
        let content = std::fs::read_to_string(temp).unwrap();
        assert!(content.contains("total sustainability value"));
    }

    #[test]
    fn read_input_rejects_empty_payloads() {
        let temp = std::env::temp_dir().join("coldtrail-empty.json");
        std::fs::write(&temp, "  \n").unwrap();
        assert!(read_input(temp.to_str().unwrap()).is_err());
    }

    #[test]
    fn output_target_stdout_writes() {
        let mut target = OutputTarget::new(None).unwrap();
        target.write_all(b"ok").unwrap();
        target.flush().unwrap();
    }
}
