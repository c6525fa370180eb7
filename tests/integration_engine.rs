//! Integration tests for the engine lifecycle and its scheduled jobs.

mod common;

use tokio::time::{Duration, sleep};

use grid_balancer::config::ScenarioConfig;
use grid_balancer::grid::{Grid, Node};
use grid_balancer::reporting::NullReporter;
use grid_balancer::sim::engine::Engine;
use grid_balancer::sim::types::{ActionKind, EngineStatus};

fn loads<R: grid_balancer::reporting::Reporter>(engine: &Engine<R>) -> Vec<f64> {
    engine.nodes().iter().map(|n| n.load).collect()
}

#[tokio::test(start_paused = true)]
async fn jobs_fire_on_schedule() {
    let (mut engine, reporter) = common::fixed_engine();
    engine.start().expect("start");

    // update fires at 0s
    sleep(Duration::from_secs(1)).await;
    assert_eq!(loads(&engine), vec![95.0, 20.0, 50.0]);
    assert_eq!(reporter.sensor_batches(), 0);
    assert!(reporter.action_batches().is_empty());

    // report fires at 10s
    sleep(Duration::from_secs(10)).await;
    assert_eq!(reporter.sensor_batches(), 1);
    let batch = reporter.last_sensor_batch().expect("one batch");
    let ids: Vec<&str> = batch.iter().map(|r| r.node_id.as_str()).collect();
    assert_eq!(ids, vec!["NODE-1", "NODE-2", "NODE-3"]);
    assert_eq!(batch[0].load, 95.0);
    assert!(reporter.action_batches().is_empty());

    // optimize fires at 15s
    sleep(Duration::from_secs(5)).await;
    let actions = reporter.action_batches();
    assert_eq!(actions.len(), 1);
    assert_eq!(actions[0].len(), 1);
    let a = &actions[0][0];
    assert_eq!((a.from_node_id.as_str(), a.to_node_id.as_str()), ("NODE-1", "NODE-2"));
    assert!((a.amount - 10.0).abs() < 1e-9);
    assert_eq!(a.kind, ActionKind::LoadTransfer);

    engine.stop().await;
    assert_eq!(engine.status(), EngineStatus::Stopped);
}

#[tokio::test(start_paused = true)]
async fn nothing_fires_after_stop() {
    let (mut engine, reporter) = common::fixed_engine();
    engine.start().expect("start");
    sleep(Duration::from_secs(31)).await;

    engine.stop().await;
    assert!(!engine.is_running());

    let sensor_batches = reporter.sensor_batches();
    let action_batches = reporter.action_batches().len();
    let before = loads(&engine);
    assert!(sensor_batches >= 3);
    assert!(action_batches >= 2);

    sleep(Duration::from_secs(120)).await;

    assert_eq!(reporter.sensor_batches(), sensor_batches);
    assert_eq!(reporter.action_batches().len(), action_batches);
    assert_eq!(loads(&engine), before);
}

#[tokio::test(start_paused = true)]
async fn stop_without_start_leaves_engine_created() {
    let (mut engine, reporter) = common::fixed_engine();
    engine.stop().await;
    assert_eq!(engine.status(), EngineStatus::Created);

    sleep(Duration::from_secs(60)).await;
    assert_eq!(reporter.sensor_batches(), 0);
    assert_eq!(loads(&engine), vec![0.0, 0.0, 0.0]);
}

#[tokio::test]
async fn rebalancing_conserves_total_load() {
    let loads_mw = [120.0, 95.0, 88.0, 10.0, 20.0, 30.0, 60.0, 5.0];
    let nodes = loads_mw
        .iter()
        .enumerate()
        .map(|(i, &l)| Node::with_load(format!("NODE-{}", i + 1), "Central", 100.0, l))
        .collect();
    let engine = Engine::with_grid(
        Grid::new(nodes, Vec::new()),
        common::default_balancer(),
        common::default_schedule(),
        4,
        NullReporter,
        1,
    );

    let before: f64 = loads(&engine).iter().sum();
    let actions = engine.run_optimization().await;
    let after: f64 = loads(&engine).iter().sum();

    assert!(!actions.is_empty());
    assert!((before - after).abs() < 1e-6, "before={before} after={after}");
    assert!(actions.iter().all(|a| a.amount > 0.0));
    assert!(loads(&engine).iter().all(|&l| l >= 0.0));
    // NODE-8 has the most headroom
    let first = &actions[0];
    assert_eq!(first.from_node_id, "NODE-1");
    assert_eq!(first.to_node_id, "NODE-8");
}

#[tokio::test]
async fn generated_grid_updates_every_node() {
    let config = ScenarioConfig::baseline();
    let engine = Engine::new(&config, NullReporter).expect("valid preset");

    let outcome = engine.update_loads().await;
    assert_eq!(outcome.updated, config.grid.node_count);
    assert_eq!(outcome.skipped, 0);
    assert!(loads(&engine).iter().all(|&l| l >= 0.0));
}

#[tokio::test]
async fn report_status_matches_node_snapshot() {
    let (engine, reporter) = common::fixed_engine();
    engine.update_loads().await;

    let status = engine.report_status().await;
    assert_eq!(status.total_nodes, 3);
    assert_eq!(status.total_load, 165.0);
    assert_eq!(status.total_capacity, 300.0);
    assert_eq!(status.overloaded_nodes, 1);
    assert_eq!(status.nodes, engine.nodes());
    assert_eq!(reporter.sensor_batches(), 1);
}

#[tokio::test]
async fn optimization_without_overload_reports_nothing() {
    let (engine, reporter) = common::fixed_engine();
    // all nodes start empty
    let actions = engine.run_optimization().await;
    assert!(actions.is_empty());
    assert!(reporter.action_batches().is_empty());
}

#[tokio::test]
async fn failed_action_report_keeps_transfers_applied() {
    let (engine, reporter) = common::failing_engine();
    engine.update_loads().await;

    let actions = engine.run_optimization().await;

    assert_eq!(reporter.attempts(), 1);
    assert_eq!(actions.len(), 1);
    let after = loads(&engine);
    assert!((after[0] - 85.0).abs() < 1e-9);
    assert!((after[1] - 30.0).abs() < 1e-9);
    assert_eq!(after[2], 50.0);
}

#[tokio::test]
async fn failed_sensor_report_still_returns_status() {
    let (engine, reporter) = common::failing_engine();
    engine.update_loads().await;

    let status = engine.report_status().await;

    assert_eq!(reporter.attempts(), 1);
    assert_eq!(status.total_load, 165.0);
    assert_eq!(loads(&engine), vec![95.0, 20.0, 50.0]);
}

#[tokio::test(start_paused = true)]
async fn scheduled_jobs_survive_reporting_failures() {
    let (mut engine, reporter) = common::failing_engine();
    engine.start().expect("start");

    // reports at 10s and 20s, optimization at 15s
    sleep(Duration::from_secs(21)).await;
    assert!(engine.is_running());
    assert_eq!(reporter.attempts(), 3);

    engine.stop().await;
    assert_eq!(engine.status(), EngineStatus::Stopped);
}
