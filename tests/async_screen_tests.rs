//! Integration tests for the async screen controller
//!
//! Time is paused, so sleeps complete as soon as the runtime is idle and
//! the clock lands exactly on each deadline.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use xyscreens::{
    hal::MockTransport,
    services::{Arrival, AsyncScreen},
    Address, CommandSet, Direction, PositionTracker, TravelProfile,
};

const UP: [u8; 3] = [0xFF, 0x01, 0xDD];
const DOWN: [u8; 3] = [0xFF, 0x01, 0xEE];
const STOP: [u8; 3] = [0xFF, 0x01, 0xCC];

fn screen_at(initial: f32, down_secs: f32, up_secs: f32) -> (AsyncScreen<MockTransport>, MockTransport) {
    let transport = MockTransport::new();
    let profile = TravelProfile::new(down_secs, up_secs).unwrap();
    let screen = AsyncScreen::new(
        transport.clone(),
        CommandSet::new(Address::from(0x01)),
        PositionTracker::new(profile, initial).unwrap(),
    );
    (screen, transport)
}

fn elapsed_ms(start: tokio::time::Instant) -> u128 {
    start.elapsed().as_millis()
}

#[tokio::test(start_paused = true)]
async fn up_and_wait_from_half_way() {
    let (mut screen, transport) = screen_at(50.0, 30.0, 25.0);
    let cancel = CancellationToken::new();
    let start = tokio::time::Instant::now();

    let arrival = screen.up_and_wait(&cancel).await.unwrap();

    assert_eq!(arrival, Arrival::Arrived);
    assert_eq!(elapsed_ms(start), 12_500);
    assert_eq!(transport.frames(), vec![UP.to_vec(), STOP.to_vec()]);
    assert_eq!(screen.position().await, 0.0);
}

#[tokio::test(start_paused = true)]
async fn auto_stop_fires_without_waiting() {
    let (mut screen, transport) = screen_at(0.0, 30.0, 30.0);
    let cancel = CancellationToken::new();
    screen.down(&cancel).await.unwrap();

    tokio::time::sleep(Duration::from_millis(29_999)).await;
    assert_eq!(transport.count(&STOP), 0);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(transport.frames(), vec![DOWN.to_vec(), STOP.to_vec()]);
    assert_eq!(screen.position().await, 100.0);
    assert!(!screen.is_moving().await);
}

#[tokio::test(start_paused = true)]
async fn cancelled_wait_leaves_screen_moving() {
    let (mut screen, transport) = screen_at(0.0, 30.0, 30.0);
    let cancel = CancellationToken::new();
    screen.down(&cancel).await.unwrap();

    let wait_cancel = CancellationToken::new();
    let trigger = wait_cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(5)).await;
        trigger.cancel();
    });

    assert_eq!(screen.wait_for_arrival(&wait_cancel).await.unwrap(), Arrival::Cancelled);
    assert_eq!(transport.count(&STOP), 0);
    assert_eq!(screen.direction().await, Direction::Down);
    assert!(screen.pending_auto_stop().is_some());

    // The automatic stop is still scheduled
    assert_eq!(screen.wait_for_arrival(&cancel).await.unwrap(), Arrival::Arrived);
    assert_eq!(transport.count(&STOP), 1);
}

#[tokio::test(start_paused = true)]
async fn explicit_stop_cancels_auto_stop() {
    let (mut screen, transport) = screen_at(0.0, 30.0, 30.0);
    let cancel = CancellationToken::new();
    screen.down(&cancel).await.unwrap();

    tokio::time::sleep(Duration::from_secs(6)).await;
    let position = screen.stop(&cancel).await.unwrap();
    assert!((position - 20.0).abs() < 0.01);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(transport.count(&STOP), 1);
    assert_eq!(screen.wait_for_arrival(&cancel).await.unwrap(), Arrival::Arrived);
}

#[tokio::test(start_paused = true)]
async fn new_move_supersedes_auto_stop() {
    let (mut screen, transport) = screen_at(0.0, 30.0, 30.0);
    let cancel = CancellationToken::new();
    screen.down(&cancel).await.unwrap();

    tokio::time::sleep(Duration::from_secs(15)).await;
    screen.up(&cancel).await.unwrap();

    tokio::time::sleep(Duration::from_secs(120)).await;
    assert_eq!(
        transport.frames(),
        vec![DOWN.to_vec(), UP.to_vec(), STOP.to_vec()]
    );
    assert_eq!(screen.position().await, 0.0);
}

#[tokio::test(start_paused = true)]
async fn cancelled_send_leaves_state() {
    let (mut screen, transport) = screen_at(40.0, 30.0, 30.0);
    transport.set_stalled(true);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        trigger.cancel();
    });

    let err = screen.down(&cancel).await.unwrap_err();
    assert!(err.is_cancelled());
    assert!(transport.frames().is_empty());
    assert_eq!(screen.direction().await, Direction::Stopped);
    assert_eq!(screen.position().await, 40.0);
    assert!(screen.pending_auto_stop().is_none());
}

#[tokio::test(start_paused = true)]
async fn pre_cancelled_token_sends_nothing() {
    let (mut screen, transport) = screen_at(0.0, 30.0, 30.0);
    let cancel = CancellationToken::new();
    cancel.cancel();

    assert!(screen.stop(&cancel).await.unwrap_err().is_cancelled());
    assert!(screen.program(&cancel).await.unwrap_err().is_cancelled());
    assert_eq!(transport.attempts(), 0);
}

#[tokio::test(start_paused = true)]
async fn failed_send_leaves_state() {
    let (mut screen, transport) = screen_at(10.0, 30.0, 30.0);
    transport.fail_next(1);
    let cancel = CancellationToken::new();

    assert!(screen.up(&cancel).await.unwrap_err().is_connection());
    assert_eq!(screen.direction().await, Direction::Stopped);
    assert_eq!(screen.position().await, 10.0);
}

#[tokio::test(start_paused = true)]
async fn failed_auto_stop_surfaces_in_wait() {
    let (mut screen, transport) = screen_at(0.0, 10.0, 10.0);
    let cancel = CancellationToken::new();
    screen.down(&cancel).await.unwrap();
    transport.set_offline(true);

    let err = screen.wait_for_arrival(&cancel).await.unwrap_err();
    assert!(err.is_connection());

    // Fired once, not retried
    transport.set_offline(false);
    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(transport.count(&STOP), 0);
}

#[tokio::test(start_paused = true)]
async fn set_position_and_toggle() {
    let (mut screen, transport) = screen_at(0.0, 30.0, 25.0);
    let cancel = CancellationToken::new();
    let start = tokio::time::Instant::now();

    screen.set_position_and_wait(40.0, &cancel).await.unwrap();
    assert_eq!(elapsed_ms(start), 12_000);
    assert!((screen.position().await - 40.0).abs() < 0.01);

    // Stopped mid-way after going down: toggle heads back up
    screen.toggle_and_wait(&cancel).await.unwrap();
    assert_eq!(screen.position().await, 0.0);
    assert_eq!(
        transport.frames(),
        vec![DOWN.to_vec(), STOP.to_vec(), UP.to_vec(), STOP.to_vec()]
    );
}

#[tokio::test(start_paused = true)]
async fn channel_is_validated() {
    let (mut screen, transport) = screen_at(0.0, 30.0, 30.0);
    let cancel = CancellationToken::new();

    assert!(screen.set_channel(17, &cancel).await.is_err());
    screen.set_channel(16, &cancel).await.unwrap();
    assert_eq!(transport.frames(), vec![vec![0xFF, 0x01, 0xBF]]);
}

#[tokio::test(start_paused = true)]
async fn dropping_screen_cancels_auto_stop() {
    let (mut screen, transport) = screen_at(0.0, 30.0, 30.0);
    let cancel = CancellationToken::new();
    screen.down(&cancel).await.unwrap();
    drop(screen);

    tokio::time::sleep(Duration::from_secs(60)).await;
    assert_eq!(transport.frames(), vec![DOWN.to_vec()]);
}
