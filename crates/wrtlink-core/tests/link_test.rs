#![allow(clippy::unwrap_used)]
// Link lifecycle tests: connect idempotency, failure handling, connectivity
// events, and poll debouncing, all against scripted transport doubles.

mod common;

use std::time::Duration;

use wrtlink_core::{
    CoreError, LinkManager, LinkState, NetworkEvent, Severity, ServiceStatus, remote,
};
use wrtlink_ssh::Error;

use common::{
    ConnectStep, FakeConnector, FakeExec, drain_notices, fake_router, manager_with, out,
    status_exec, test_config, wait_for_state, wait_for_status,
};

#[tokio::test]
async fn connect_starts_polling_and_reports_running() {
    // Scenario A: session connects, first poll classifies "running".
    let (mgr, _connector) = manager_with(status_exec("openclash is running\n"));
    let mut notices = mgr.notices();

    let state = mgr.connect().await.unwrap();
    assert_eq!(state, LinkState::Connected);

    wait_for_status(&mgr, ServiceStatus::Running).await;

    // Exactly one running notice, debounced across subsequent polls.
    tokio::time::sleep(Duration::from_millis(120)).await;
    let running_notices: Vec<_> = drain_notices(&mut notices)
        .into_iter()
        .filter(|n| n.text == "service running")
        .collect();
    assert_eq!(running_notices.len(), 1);
    assert_eq!(running_notices[0].severity, Severity::Success);

    mgr.shutdown().await;
}

#[tokio::test]
async fn repeated_polls_refresh_the_checked_stamp() {
    let (mgr, _connector) = manager_with(status_exec("running"));
    mgr.connect().await.unwrap();
    wait_for_status(&mgr, ServiceStatus::Running).await;

    let mut checked = mgr.subscribe_last_checked();
    checked.mark_unchanged();
    // The status never changes, but the stamp must keep moving.
    for _ in 0..2 {
        tokio::time::timeout(Duration::from_secs(2), checked.changed())
            .await
            .expect("stamp should refresh every poll")
            .unwrap();
        checked.mark_unchanged();
    }
    assert!(checked.borrow().is_some());

    mgr.shutdown().await;
}

#[tokio::test]
async fn connect_is_idempotent_while_connected() {
    let (mgr, connector) = manager_with(status_exec("running"));

    assert_eq!(mgr.connect().await.unwrap(), LinkState::Connected);
    assert_eq!(mgr.connect().await.unwrap(), LinkState::Connected);
    assert_eq!(connector.attempts(), 1);

    mgr.shutdown().await;
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_connects_collapse_to_one_attempt() {
    let exec = status_exec("running");
    let connector = FakeConnector::new(vec![ConnectStep::Delay(
        Duration::from_millis(100),
        exec,
    )]);
    let mgr = LinkManager::new(test_config(), connector.clone());

    let (first, second) = tokio::join!(mgr.connect(), mgr.connect());
    assert!(first.is_ok());
    assert!(second.is_ok());
    assert_eq!(connector.attempts(), 1);
    assert_eq!(mgr.state(), LinkState::Connected);

    mgr.shutdown().await;
}

#[tokio::test]
async fn failed_connect_reports_error_and_allows_retry() {
    let connector = FakeConnector::new(vec![
        ConnectStep::Fail("bad password"),
        ConnectStep::Ok(status_exec("running")),
    ]);
    let mgr = LinkManager::new(test_config(), connector.clone());
    let mut notices = mgr.notices();

    let err = mgr.connect().await.unwrap_err();
    assert!(matches!(err, CoreError::Connection { .. }));
    assert!(matches!(mgr.state(), LinkState::Error(_)));
    assert!(
        drain_notices(&mut notices)
            .iter()
            .any(|n| n.severity == Severity::Error)
    );

    // The in-flight flag was cleared; a later attempt proceeds.
    assert_eq!(mgr.connect().await.unwrap(), LinkState::Connected);
    assert_eq!(connector.attempts(), 2);

    mgr.shutdown().await;
}

#[tokio::test]
async fn link_lost_forces_disconnect_and_resets_status() {
    // Scenario C: "link lost" arrives mid-poll-cycle.
    let (mgr, _connector) = manager_with(status_exec("running"));
    mgr.connect().await.unwrap();
    wait_for_status(&mgr, ServiceStatus::Running).await;

    let mut notices = mgr.notices();
    mgr.handle_network_event(NetworkEvent::LinkLost).await;

    assert_eq!(mgr.state(), LinkState::Disconnected);
    assert_eq!(mgr.service_status(), ServiceStatus::Unknown);

    // No further poll notifications after teardown.
    drain_notices(&mut notices);
    tokio::time::sleep(Duration::from_millis(120)).await;
    let later = drain_notices(&mut notices);
    assert!(later.is_empty(), "unexpected notices after teardown: {later:?}");
}

#[tokio::test]
async fn capability_loss_disconnects_only_when_connected() {
    let (mgr, _connector) = manager_with(status_exec("running"));

    // Not connected: capability loss is a no-op.
    mgr.handle_network_event(NetworkEvent::CapabilityChanged { internet: false })
        .await;
    assert_eq!(mgr.state(), LinkState::Disconnected);

    mgr.connect().await.unwrap();
    mgr.handle_network_event(NetworkEvent::CapabilityChanged { internet: false })
        .await;
    assert_eq!(mgr.state(), LinkState::Disconnected);
}

#[tokio::test]
async fn capability_gain_reconnects_after_loss() {
    let connector = FakeConnector::new(vec![
        ConnectStep::Ok(status_exec("running")),
        ConnectStep::Ok(status_exec("running")),
    ]);
    let mgr = LinkManager::new(test_config(), connector.clone());

    mgr.handle_network_event(NetworkEvent::LinkAvailable).await;
    assert_eq!(mgr.state(), LinkState::Connected);

    mgr.handle_network_event(NetworkEvent::LinkLost).await;
    assert_eq!(mgr.state(), LinkState::Disconnected);

    mgr.handle_network_event(NetworkEvent::CapabilityChanged { internet: true })
        .await;
    assert_eq!(mgr.state(), LinkState::Connected);
    assert_eq!(connector.attempts(), 2);

    mgr.shutdown().await;
}

#[tokio::test]
async fn transport_fault_during_poll_tears_the_link_down() {
    let exec = FakeExec::new(|cmd| {
        if cmd == remote::SERVICE_STATUS {
            Err(Error::Transport("connection reset".into()))
        } else {
            Ok(out(""))
        }
    });
    let (mgr, _connector) = manager_with(exec);

    mgr.connect().await.unwrap();
    // The first poll hits the fault and escalates to a forced disconnect.
    wait_for_state(&mgr, &LinkState::Disconnected).await;
    assert_eq!(mgr.service_status(), ServiceStatus::Unknown);
}

#[tokio::test]
async fn command_failure_in_probe_degrades_to_unknown() {
    let exec = status_exec("sh: /etc/init.d/openclash: not found");
    let (mgr, _connector) = manager_with(exec);

    mgr.connect().await.unwrap();
    // The probe runs and fails, but the link stays up.
    tokio::time::sleep(Duration::from_millis(60)).await;
    assert_eq!(mgr.state(), LinkState::Connected);
    assert_eq!(mgr.service_status(), ServiceStatus::Unknown);

    mgr.shutdown().await;
}

#[tokio::test]
async fn network_event_loop_consumes_until_shutdown() {
    let (mgr, _connector) = manager_with(fake_router(true));
    let (tx, rx) = tokio::sync::mpsc::channel(8);

    let consumer = {
        let mgr = mgr.clone();
        tokio::spawn(async move { mgr.run_network_events(rx).await })
    };

    tx.send(NetworkEvent::LinkAvailable).await.unwrap();
    wait_for_state(&mgr, &LinkState::Connected).await;

    mgr.shutdown().await;
    tokio::time::timeout(Duration::from_secs(2), consumer)
        .await
        .expect("consumer should stop on shutdown")
        .unwrap();
}
