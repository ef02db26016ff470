use anyhow::Context;
use bottleline::{LineConfig, LineController, LineEvent};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{error, info};

/// Wall-clock time between summary lines
const SUMMARY_EVERY: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    println!("Bottleline Inspection Line v{}", bottleline::version());
    println!("==========================================");
    println!();

    // optional YAML config path as the only argument
    let config = match std::env::args().nth(1) {
        Some(path) => {
            let text =
                std::fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;
            LineConfig::from_yaml_str(&text)?
        }
        None => LineConfig::default(),
    };
    let mut line = LineController::new(config)?;

    let events = line.subscribe();
    let listener = tokio::spawn(log_events(events));

    println!("✅ Line running. Press Ctrl+C to stop.");
    println!();

    run(&mut line).await;
    print_summary(&line);

    // dropping the controller closes the event channel
    drop(line);
    if let Err(e) = listener.await {
        error!("Event listener failed: {}", e);
    }
    Ok(())
}

/// Tick the controller in real time until Ctrl+C
async fn run(line: &mut LineController) {
    let tick = Duration::from_millis(line.config().tick_ms);
    let mut ticker = tokio::time::interval(tick);
    let mut summary = tokio::time::interval(SUMMARY_EVERY);
    summary.tick().await;
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                line.tick();
            }
            _ = summary.tick() => {
                print_summary(line);
            }
            _ = &mut shutdown => {
                info!("Shutdown requested");
                break;
            }
        }
    }
}

async fn log_events(mut events: UnboundedReceiver<LineEvent>) {
    while let Some(event) = events.recv().await {
        match &event {
            LineEvent::Detected(detection) if detection.has_issue => {
                info!(bottle = %detection.bottle_id, types = %detection.types, "Defect detected");
            }
            LineEvent::Ejected { bottle_id, .. } => info!(bottle = %bottle_id, "Bottle ejected"),
            LineEvent::PatternAlert(alert) => info!(
                slot = alert.slot,
                defect = %alert.defect,
                count = alert.count,
                "Pattern alert"
            ),
            LineEvent::HealthChanged { from, to } => info!(?from, ?to, "Machine health changed"),
            _ => {}
        }
    }
}

fn print_summary(line: &LineController) {
    let production = line.production_stats();
    let stats = line.statistics();
    let status = line.system_status();

    println!("\n=== {:.1}s simulated ===", line.elapsed_ms() as f64 / 1000.0);
    println!(
        "  Inspected: {}  Defective: {}  Approval: {:.1}%",
        stats.inspected, stats.rejected, stats.approval_rate
    );
    println!(
        "  Approved: {}  Rejected: {}  Total: {}",
        production.approved_count,
        production.rejected_count,
        production.total()
    );
    println!(
        "  Belt: {}%  Pressure: {}%  Health: {:?}",
        status.conveyor_speed, status.pressure, status.health
    );
    for insight in line.insights().iter().take(3) {
        println!("  [{:.0}%] {}", insight.confidence, insight.pattern);
    }
}
