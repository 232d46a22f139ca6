//! End-to-end kitchen runs against the in-memory sink.

#![allow(clippy::unwrap_used)] // Test code

use kitchen_sim_core::order::{Order, OrderId, OrderStatus};
use kitchen_sim_runtime::{Pacing, SimulationError};
use kitchen_sim_testing::fixtures::{at, item, order};
use kitchen_sim_testing::helpers::init_tracing;
use kitchen_sim_testing::{FailingOrderSink, InMemoryOrderSink, SinkCall};
use kitchen_simulator::input::MenuItemInput;
use kitchen_simulator::{Menu, SimulatorError, run_simulation};
use std::sync::Arc;

fn menu() -> Menu {
    Menu::from_items(
        [("Fries", 5), ("Shake", 2), ("Burger", 8)].map(|(name, cook_time)| MenuItemInput {
            name: name.to_string(),
            cook_time,
        }),
    )
    .unwrap()
}

async fn run_instant(orders: Vec<Order>, num_cooks: usize) -> (InMemoryOrderSink, kitchen_simulator::SimulationReport) {
    init_tracing();
    let sink = InMemoryOrderSink::new();
    let report = run_simulation(orders, &menu(), num_cooks, Pacing::Instant, Arc::new(sink.clone()))
        .await
        .unwrap();
    (sink, report)
}

#[tokio::test]
async fn single_item_order_completes_after_its_cook_time() {
    let (sink, report) = run_instant(vec![order(1, 0, vec![item("Fries", 1)])], 1).await;

    assert_eq!(
        sink.calls(),
        vec![
            SinkCall::InsertOrder {
                order_id: OrderId::new(1),
                received_at: at(0)
            },
            SinkCall::MarkStarted {
                order_id: OrderId::new(1),
                at: at(0)
            },
            SinkCall::MarkCompleted {
                order_id: OrderId::new(1),
                at: at(5)
            },
        ]
    );
    assert_eq!(report.orders_completed, 1);
    assert_eq!(report.origin, at(-10));
    assert_eq!(report.finished_at, at(5));
}

#[tokio::test]
async fn second_unit_waits_for_the_only_cook() {
    let (sink, _) = run_instant(vec![order(1, 0, vec![item("Fries", 2)])], 1).await;

    let record = sink.record(OrderId::new(1)).unwrap();
    assert_eq!(record.status, OrderStatus::Completed);
    assert_eq!(record.received_at, at(0));
    assert_eq!(record.started_at, Some(at(0)));
    assert_eq!(record.completed_at, Some(at(10)));
}

#[tokio::test]
async fn freed_cook_goes_to_the_longest_waiting_unit() {
    let orders = vec![
        order(1, 0, vec![item("Fries", 3)]),
        order(2, 1, vec![item("Shake", 1)]),
    ];
    let (sink, report) = run_instant(orders, 2).await;

    let first = sink.record(OrderId::new(1)).unwrap();
    assert_eq!(first.started_at, Some(at(0)));
    assert_eq!(first.completed_at, Some(at(10)));

    // Order 2's unit queued behind order 1's third unit and got the second freed cook.
    let second = sink.record(OrderId::new(2)).unwrap();
    assert_eq!(second.received_at, at(1));
    assert_eq!(second.started_at, Some(at(5)));
    assert_eq!(second.completed_at, Some(at(7)));

    assert_eq!(report.peak_cooks_busy, 2);
}

#[tokio::test]
async fn every_order_is_written_exactly_three_times_in_order() {
    let orders = vec![
        order(1, 0, vec![item("Fries", 2), item("Burger", 1)]),
        order(2, 3, vec![item("Shake", 4)]),
        order(3, 3, vec![item("Burger", 2)]),
        order(4, 60, vec![item("Fries", 1)]),
    ];
    let (sink, report) = run_instant(orders, 2).await;

    for id in 1..=4 {
        let calls = sink.calls_for(OrderId::new(id));
        assert_eq!(calls.len(), 3, "order {id}: {calls:?}");
        assert!(matches!(calls[0], SinkCall::InsertOrder { .. }));
        assert!(matches!(calls[1], SinkCall::MarkStarted { .. }));
        assert!(matches!(calls[2], SinkCall::MarkCompleted { .. }));
    }
    assert!(sink.records().iter().all(|r| r.timestamps_ordered()));
    assert_eq!(report.orders_received, 4);
    assert_eq!(report.orders_completed, 4);
}

#[tokio::test]
async fn empty_orders_are_never_written() {
    let orders = vec![
        order(1, 0, vec![]),
        order(2, 5, vec![item("Fries", 0)]),
        order(3, 10, vec![item("Shake", 1)]),
    ];
    let (sink, report) = run_instant(orders, 1).await;

    assert!(sink.calls_for(OrderId::new(1)).is_empty());
    assert!(sink.calls_for(OrderId::new(2)).is_empty());
    assert_eq!(sink.calls_for(OrderId::new(3)).len(), 3);
    assert_eq!(report.orders_skipped, 2);
    assert_eq!(report.orders_received, 1);
}

#[tokio::test]
async fn unknown_menu_item_fails_before_anything_is_written() {
    let sink = InMemoryOrderSink::new();
    let orders = vec![
        order(1, 0, vec![item("Fries", 1)]),
        order(2, 5, vec![item("Lobster", 1)]),
    ];

    let result = run_simulation(orders, &menu(), 1, Pacing::Instant, Arc::new(sink.clone())).await;

    assert!(matches!(
        result,
        Err(SimulatorError::UnknownMenuItem { order_id, .. }) if order_id == OrderId::new(2)
    ));
    assert!(sink.calls().is_empty());
}

#[tokio::test]
async fn persistence_failure_aborts_the_run() {
    let sink = FailingOrderSink::new(OrderStatus::InProgress);
    let orders = vec![
        order(1, 0, vec![item("Fries", 1)]),
        order(2, 30, vec![item("Shake", 1)]),
    ];

    let result = run_simulation(orders, &menu(), 1, Pacing::Instant, Arc::new(sink.clone())).await;

    assert!(matches!(
        result,
        Err(SimulatorError::Simulation(SimulationError::Persistence { order_id, .. }))
            if order_id == OrderId::new(1)
    ));
    // Only the insert for order 1 made it; order 2 never arrived.
    assert_eq!(
        sink.inner().calls(),
        vec![SinkCall::InsertOrder {
            order_id: OrderId::new(1),
            received_at: at(0)
        }]
    );
}

#[tokio::test]
async fn no_orders_is_an_empty_run() {
    let (sink, report) = run_instant(Vec::new(), 3).await;
    assert!(sink.calls().is_empty());
    assert_eq!(report.events_processed, 0);
}

#[tokio::test]
async fn zero_cooks_is_rejected() {
    let result = run_simulation(
        vec![order(1, 0, vec![item("Fries", 1)])],
        &menu(),
        0,
        Pacing::Instant,
        Arc::new(InMemoryOrderSink::new()),
    )
    .await;
    assert!(matches!(result, Err(SimulatorError::InvalidConfig(_))));
}

#[tokio::test(start_paused = true)]
async fn paced_run_matches_instant_run() {
    let orders = vec![
        order(1, 0, vec![item("Fries", 2)]),
        order(2, 20, vec![item("Burger", 1), item("Shake", 1)]),
        order(3, 20, vec![item("Shake", 3)]),
    ];

    let (instant_sink, instant_report) = run_instant(orders.clone(), 2).await;

    let paced_sink = InMemoryOrderSink::new();
    let started = tokio::time::Instant::now();
    let paced_report = run_simulation(
        orders,
        &menu(),
        2,
        Pacing::real_time(10.0).unwrap(),
        Arc::new(paced_sink.clone()),
    )
    .await
    .unwrap();
    let wall = started.elapsed();

    assert_eq!(paced_sink.records(), instant_sink.records());
    assert_eq!(paced_report, instant_report);

    // Virtual span is origin (-10s) to the last completion; at speed 10 the wall
    // clock covers a tenth of it.
    let virtual_span = (paced_report.finished_at - paced_report.origin).to_std().unwrap();
    let expected = virtual_span / 10;
    assert!(wall >= expected, "wall {wall:?} < expected {expected:?}");
    assert!(wall < expected + std::time::Duration::from_millis(100));
}

#[tokio::test]
async fn sample_data_runs_to_completion() {
    let data = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../data");
    let menu = Menu::load(&data.join("items.json")).unwrap();
    let orders = kitchen_simulator::input::load_orders(&data.join("orders.json")).unwrap();
    let total = orders.len();
    let skipped = orders.iter().filter(|o| o.unit_count() == 0).count();

    let sink = InMemoryOrderSink::new();
    let report = run_simulation(orders, &menu, 2, Pacing::Instant, Arc::new(sink.clone()))
        .await
        .unwrap();

    assert_eq!(report.orders_skipped, skipped);
    assert_eq!(report.orders_completed, total - skipped);
    assert_eq!(sink.calls().len(), 3 * (total - skipped));
}
