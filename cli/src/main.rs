//! Bottleline CLI: run the inspection line headless and report what happened
//!
//! The simulation runs as fast as the machine allows; `--seconds` is simulated
//! time, not wall-clock time.

use anyhow::{Context, Result};
use bottleline::{
    DefectType, HealthLevel, Insight, LineConfig, LineController, LineEvent, LineSnapshot,
};
use clap::{Parser, Subcommand};
use comfy_table::{ContentArrangement, Table};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "bottleline", version, about = "Bottle inspection line simulator")]
struct Cli {
    /// Output format
    #[arg(long, default_value = "table", global = true)]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, clap::ValueEnum)]
enum OutputFormat {
    Table,
    Json,
    Csv,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a headless simulation and print the final report
    Run {
        /// Simulated seconds to run
        #[arg(long, default_value_t = 60)]
        seconds: u64,

        /// Seed for a reproducible run
        #[arg(long)]
        seed: Option<u64>,

        /// YAML configuration file
        #[arg(long)]
        config: Option<PathBuf>,

        /// Bottles to inject before the run, e.g. `--inject dent --inject cap`
        #[arg(long)]
        inject: Vec<DefectType>,

        /// Disable the automatic generator (only injected bottles run)
        #[arg(long)]
        manual: bool,

        /// Print every line event as a JSON line while running
        #[arg(long)]
        events: bool,
    },
    /// Print the default configuration as YAML
    Config,
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { seconds, seed, config, inject, manual, events } => {
            run_simulation(seconds, seed, config, &inject, manual, events, &cli.format)
        }
        Commands::Config => print_default_config(),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn load_config(path: Option<PathBuf>) -> Result<LineConfig> {
    match path {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            LineConfig::from_yaml_str(&text)
                .with_context(|| format!("loading {}", path.display()))
        }
        None => Ok(LineConfig::default()),
    }
}

fn run_simulation(
    seconds: u64,
    seed: Option<u64>,
    config: Option<PathBuf>,
    inject: &[DefectType],
    manual: bool,
    stream_events: bool,
    format: &OutputFormat,
) -> Result<()> {
    let mut config = load_config(config)?;
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    if manual {
        config.auto_mode = false;
    }

    let mut line = LineController::new(config)?;
    for defect in inject {
        line.handle_detection_change(*defect);
    }

    if stream_events {
        let tick = Duration::from_millis(line.config().tick_ms);
        let total = Duration::from_secs(seconds);
        let mut elapsed = Duration::ZERO;
        while elapsed + tick <= total {
            for event in line.tick() {
                println!("{}", serde_json::to_string(&event)?);
            }
            elapsed += tick;
        }
    } else {
        let events = line.advance(Duration::from_secs(seconds));
        let alerts = events
            .iter()
            .filter(|e| matches!(e, LineEvent::PatternAlert(_)))
            .count();
        if alerts > 0 {
            eprintln!("{} pattern alert(s) raised during the run", alerts);
        }
    }

    let snapshot = line.snapshot();
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        OutputFormat::Csv => print_patterns_csv(&snapshot),
        OutputFormat::Table => {
            print_production(&snapshot);
            print_patterns(&snapshot);
            print_insights(&snapshot.insights);
        }
    }

    Ok(())
}

fn print_default_config() -> Result<()> {
    print!("{}", LineConfig::default().to_yaml()?);
    Ok(())
}

fn print_production(snapshot: &LineSnapshot) {
    let stats = &snapshot.statistics;
    let status = &snapshot.system_status;

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Metric", "Value"]);
    let production = &snapshot.production;
    let mut rows = vec![
        ("Simulated time", format!("{:.1}s", snapshot.elapsed_ms as f64 / 1000.0)),
        ("Inspected", stats.inspected.to_string()),
        ("Defective", stats.rejected.to_string()),
        ("Approval rate", format!("{:.1}%", stats.approval_rate)),
        ("Approved", production.approved_count.to_string()),
        ("Rejected", production.rejected_count.to_string()),
        ("Production total", production.total().to_string()),
        ("Belt speed", format!("{}%", status.conveyor_speed)),
        ("Pressure", format!("{}%", status.pressure)),
        ("Health", health_label(status.health).to_string()),
    ];
    if let Some(time) = &status.last_ejection_time {
        rows.push(("Last ejection", time.clone()));
    }
    for (metric, value) in rows {
        table.add_row(vec![metric.to_string(), value]);
    }

    println!("{}", table);

    let shares = &stats.defect_shares;
    let mut breakdown = Table::new();
    breakdown.set_header(vec!["Defect", "Count", "Share"]);
    for (defect, share) in [
        (DefectType::Label, shares.label),
        (DefectType::Dent, shares.dent),
        (DefectType::Cap, shares.cap),
        (DefectType::Liquid, shares.liquid),
    ] {
        breakdown.add_row(vec![
            defect.display_name().to_string(),
            stats.defect_counts.get(defect).to_string(),
            format!("{:.1}%", share),
        ]);
    }
    println!("{}", breakdown);
}

fn print_patterns(snapshot: &LineSnapshot) {
    if snapshot.defect_patterns.is_empty() {
        println!("(no defect patterns)");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Slot", "LABEL", "DENT", "CAP", "LEVEL"]);
    for (slot, counts) in &snapshot.defect_patterns {
        table.add_row(vec![
            slot.to_string(),
            counts.label.to_string(),
            counts.dent.to_string(),
            counts.cap.to_string(),
            counts.liquid.to_string(),
        ]);
    }
    println!("{}", table);
}

fn print_patterns_csv(snapshot: &LineSnapshot) {
    println!("slot,label,dent,cap,liquid");
    for (slot, counts) in &snapshot.defect_patterns {
        println!("{},{},{},{},{}", slot, counts.label, counts.dent, counts.cap, counts.liquid);
    }
}

fn print_insights(insights: &[Insight]) {
    if insights.is_empty() {
        println!("(no insights)");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["#", "Pattern", "Probable cause", "Action", "Confidence"]);
    for insight in insights {
        table.add_row(vec![
            insight.id.to_string(),
            insight.pattern.clone(),
            insight.probable_cause.clone(),
            insight.recommended_action.clone(),
            format!("{:.0}%", insight.confidence),
        ]);
    }
    println!("{}", table);
    println!("{} insight(s)", insights.len());
}

fn health_label(health: HealthLevel) -> &'static str {
    match health {
        HealthLevel::Normal => "normal",
        HealthLevel::Warning => "warning",
        HealthLevel::Error => "error",
    }
}
