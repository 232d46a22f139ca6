//! `kitchen-sim`: run the kitchen simulation or report on its results.

use anyhow::Context;
use clap::Parser;
use kitchen_sim_analytics::{status_over_time, timing_summary};
use kitchen_sim_core::order_sink::OrderSink;
use kitchen_sim_postgres::{PostgresOrderSink, migrations, queries};
use kitchen_sim_runtime::metrics::MetricsServer;
use kitchen_simulator::cli::{Cli, Command};
use kitchen_simulator::input::load_orders;
use kitchen_simulator::{Config, KitchenSimulation, Menu, SimulationPlan};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,kitchen_simulator=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;

    match cli.into_command() {
        Command::Run(args) => {
            args.apply(&mut config);
            config.validate()?;
            run(&config).await
        },
        Command::Report(args) => {
            args.apply(&mut config);
            config.validate()?;
            report(&config).await
        },
    }
}

async fn connect(config: &Config) -> anyhow::Result<PostgresOrderSink> {
    info!(max_connections = config.postgres.max_connections, "Connecting to order database...");
    let sink = PostgresOrderSink::connect(
        &config.postgres.url,
        config.postgres.max_connections,
        config.connect_timeout(),
    )
    .await
    .context("Failed to connect to the order database")?;
    info!("Order database connected");
    Ok(sink)
}

async fn run(config: &Config) -> anyhow::Result<()> {
    let mut metrics_server = config.metrics_addr.map(MetricsServer::new);
    if let Some(server) = metrics_server.as_mut() {
        server.start()?;
    }

    let sim = &config.simulation;
    let menu = Menu::load(&sim.menu_path)?;
    let orders = load_orders(&sim.orders_path)?;
    info!(
        orders = orders.len(),
        menu_items = menu.len(),
        num_cooks = sim.num_cooks,
        speed = sim.speed,
        pacing = ?sim.pacing,
        "Input loaded"
    );

    let plan = SimulationPlan::build(orders, &menu)?;
    let pacing = config.pacing()?;

    let sink = connect(config).await?;
    migrations::recreate_orders_table(sink.pool())
        .await
        .context("Failed to reset the orders table")?;
    info!("Orders table reset");

    let simulation = KitchenSimulation::new(plan, sim.num_cooks, pacing, Arc::new(sink))?;
    let summary = simulation.run().await?;

    info!(
        received = summary.orders_received,
        completed = summary.orders_completed,
        skipped = summary.orders_skipped,
        peak_cooks_busy = summary.peak_cooks_busy,
        virtual_duration_secs = (summary.finished_at - summary.origin).num_seconds(),
        "Run complete"
    );
    Ok(())
}

fn format_duration(duration: Option<Duration>) -> String {
    duration.map_or_else(|| "-".to_string(), |d| format!("{}s", d.as_secs()))
}

async fn report(config: &Config) -> anyhow::Result<()> {
    let sink = connect(config).await?;
    let records = sink.load_orders().await.context("Failed to load orders")?;

    let buckets = status_over_time(&records, Duration::from_secs(config.report.bucket_seconds))?;
    println!("Status over time (bucket {}s)", config.report.bucket_seconds);
    println!("{:<22} {:>8} {:>12} {:>10}", "bucket start", "queued", "in progress", "completed");
    for bucket in &buckets {
        println!(
            "{:<22} {:>8} {:>12} {:>10}",
            bucket.start.format("%Y-%m-%d %H:%M:%S"),
            bucket.counts.queued,
            bucket.counts.in_progress,
            bucket.counts.completed
        );
    }

    let by_status = queries::orders_by_status(sink.pool())
        .await
        .context("Failed to count orders by status")?;
    println!();
    println!("Orders by status");
    println!("  queued:      {}", by_status.queued);
    println!("  in progress: {}", by_status.in_progress);
    println!("  completed:   {}", by_status.completed);

    let timing = timing_summary(&records);
    println!();
    println!("Timing over {} completed orders", timing.completed_orders);
    println!(
        "  queue wait:  mean {}, max {}",
        format_duration(timing.mean_queue_wait),
        format_duration(timing.max_queue_wait)
    );
    println!(
        "  turnaround:  mean {}, max {}",
        format_duration(timing.mean_turnaround),
        format_duration(timing.max_turnaround)
    );
    Ok(())
}
