//! Whole refresh cycles against in-process calendar sources.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use roomstatus_core::{RoomConfig, RoomId, RoomState, TimeInterval, TimeWindow};
use roomstatus_providers::{BoxFuture, CalendarSource, ProviderError, ProviderResult};
use roomstatus_server::{AvailabilityStore, RoomRefresher, Scheduler, SchedulerConfig};

/// Answers per feed URL: a meeting covering the window, a failure, or a panic.
struct RoutingSource;

impl CalendarSource for RoutingSource {
    fn name(&self) -> &str {
        "routing"
    }

    fn fetch<'a>(
        &'a self,
        url: &'a str,
        window: TimeWindow,
    ) -> BoxFuture<'a, ProviderResult<Vec<TimeInterval>>> {
        Box::pin(async move {
            match url {
                "mem://busy" => Ok(vec![TimeInterval::new(
                    window.start - chrono::Duration::minutes(5),
                    window.start + chrono::Duration::minutes(30),
                )]),
                "mem://down" => Err(ProviderError::network("connection failed")),
                "mem://panic" => panic!("calendar source bug"),
                _ => Ok(Vec::new()),
            }
        })
    }
}

fn refresher() -> RoomRefresher {
    RoomRefresher::new(Arc::new(RoutingSource), chrono_tz::UTC, Duration::from_secs(5))
}

async fn run_one_cycle(rooms: Vec<RoomConfig>) -> (AvailabilityStore, usize) {
    let store = AvailabilityStore::new();
    let scheduler = Scheduler::new(SchedulerConfig::new(Duration::from_secs(3600)));
    let handle = scheduler.handle();
    let task = tokio::spawn(scheduler.run(refresher(), rooms, store.clone()));

    // The first tick fires immediately
    tokio::time::timeout(Duration::from_secs(5), async {
        while handle.state().await.cycles == 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    let errors = handle.state().await.last_cycle_errors;
    handle.stop().await.unwrap();
    task.await.unwrap();
    (store, errors)
}

#[tokio::test]
async fn failing_room_does_not_affect_others() {
    let (store, errors) = run_one_cycle(vec![
        RoomConfig::new("aa:01", "Room A", "mem://down"),
        RoomConfig::new("aa:02", "Room B", "mem://busy"),
    ])
    .await;

    let a = store.get(&RoomId::new("AA:01")).await;
    assert_eq!(a.state, RoomState::Error);
    assert_eq!(a.detail, "connection failed");

    let b = store.get(&RoomId::new("AA:02")).await;
    assert_eq!(b.state, RoomState::Busy);
    assert!(b.detail.starts_with("booked until "));

    assert_eq!(errors, 1);
}

#[tokio::test]
async fn panicking_room_gets_internal_error() {
    let (store, errors) = run_one_cycle(vec![
        RoomConfig::new("aa:01", "Room A", "mem://panic"),
        RoomConfig::new("aa:02", "Room B", "mem://empty"),
    ])
    .await;

    assert_eq!(
        store.lookup("aa:01").await,
        "Room A\nerror\ninternal error\n"
    );
    assert_eq!(
        store.lookup("aa:02").await,
        "Room B\nfree\nfree for the day\n"
    );
    assert_eq!(errors, 1);
}

#[tokio::test]
async fn records_are_fresh_after_a_cycle() {
    let before = Utc::now();
    let (store, _) = run_one_cycle(vec![RoomConfig::new("aa:01", "Room A", "mem://empty")]).await;

    let entry = store.entry(&RoomId::new("AA:01")).await.unwrap();
    assert!(entry.updated_at >= before);
    assert!(!entry.is_stale(Duration::from_secs(10)));
}
