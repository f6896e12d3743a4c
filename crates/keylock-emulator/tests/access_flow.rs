//! Integration tests for complete access attempts.
//!
//! These tests run the spawned foreground loop against a scripted keypad and
//! check the actuators and the display at fixed offsets. With the default
//! timing an immediate-mode attempt evaluates at 600 ms (two digits, 300 ms
//! pacing each) and the prompt returns one result pause after the hold.

mod common;

use common::{Bench, MatrixBench, ms};
use keylock_core::{AccessConfig, EntryMode, OutputState};
use std::time::Duration;

#[tokio::test(start_paused = true)]
async fn test_correct_code_runs_motor() {
    let bench = Bench::start(AccessConfig::default()).await;
    assert_eq!(bench.display.line(0), "Press Key:");

    bench.type_symbols("32").await;

    bench.advance_to(ms(450)).await;
    assert_eq!(bench.display.line(1), "32");
    assert_eq!(bench.probe.state(), OutputState::IDLE);

    bench.advance_to(ms(650)).await;
    assert_eq!(bench.display.line(0), "motor");
    assert!(bench.system.bus().is_masked());
    assert_eq!(bench.entered_at(OutputState::RUNNING), Some(ms(600)));

    bench.advance_to(ms(750)).await;
    assert!(!bench.system.bus().is_masked());

    bench.advance_to(ms(1800)).await;
    assert_eq!(bench.display.line(0), "Press Key:");
    assert_eq!(bench.display.line(1), "");
    assert_eq!(bench.probe.state(), OutputState::RUNNING);
    assert_eq!(bench.system.stats().granted, 1);

    bench.system.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_wrong_code_sounds_buzzer_for_failure_hold() {
    let bench = Bench::start(AccessConfig::default()).await;
    bench.type_symbols("11").await;

    bench.advance_to(ms(1000)).await;
    assert_eq!(bench.display.line(0), "Wrong Code");
    assert_eq!(bench.probe.state(), OutputState::ALARM);

    bench.advance_to(ms(12_000)).await;
    assert_eq!(bench.entered_at(OutputState::ALARM), Some(ms(600)));
    assert_eq!(bench.probe.buzzer_periods(), vec![Duration::from_secs(10)]);
    assert_eq!(bench.probe.state(), OutputState::IDLE);
    assert_eq!(bench.display.line(0), "Press Key:");
    assert_eq!(bench.system.stats().denied, 1);

    bench.system.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_non_digit_second_key_takes_invalid_path() {
    let bench = Bench::start(AccessConfig::default()).await;
    bench.type_symbols("3#").await;

    bench.advance_to(ms(800)).await;
    assert_eq!(bench.display.line(0), "Digits Only");

    bench.advance_to(ms(1400)).await;
    assert_eq!(bench.display.line(0), "Press Key:");
    assert!(bench.probe.history().is_empty());
    assert_eq!(bench.system.stats().invalid, 1);

    bench.system.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_correct_code_twice_reproduces_outcome() {
    let bench = Bench::start(AccessConfig::default()).await;

    bench.type_symbols("32").await;
    bench.advance_to(ms(2000)).await;
    bench.type_symbols("32").await;
    bench.advance_to(ms(4000)).await;

    assert_eq!(bench.system.stats().granted, 2);
    assert_eq!(bench.probe.state(), OutputState::RUNNING);
    assert!(bench.probe.was_always_consistent());

    bench.system.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_denied_after_granted_stops_motor_first() {
    let bench = Bench::start(AccessConfig::default()).await;

    bench.type_symbols("32").await;
    bench.advance_to(ms(2000)).await;
    bench.type_symbols("99").await;
    bench.advance_to(ms(14_000)).await;

    let states: Vec<OutputState> = bench
        .probe
        .history()
        .iter()
        .map(|transition| transition.state)
        .collect();
    assert_eq!(
        states,
        vec![
            OutputState::RUNNING,
            OutputState::IDLE,
            OutputState::ALARM,
            OutputState::IDLE,
        ]
    );

    bench.system.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_confirm_mode_needs_accept_key() {
    let config = AccessConfig::builder()
        .entry_mode(EntryMode::Confirm)
        .build()
        .unwrap();
    let bench = Bench::start(config).await;

    bench.type_symbols("32").await;
    bench.advance_to(ms(2000)).await;
    assert_eq!(bench.probe.state(), OutputState::IDLE);

    bench.type_symbols("#").await;
    bench.advance_to(ms(2050)).await;
    assert_eq!(bench.probe.state(), OutputState::RUNNING);

    bench.system.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_custom_secret() {
    let config = AccessConfig::builder().secret(7).build().unwrap();
    let bench = Bench::start(config).await;

    bench.type_symbols("07").await;
    bench.advance_to(ms(1000)).await;

    assert_eq!(bench.probe.state(), OutputState::RUNNING);

    bench.system.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_matrix_keypad_end_to_end() {
    let bench = MatrixBench::start(AccessConfig::default()).await;

    bench.matrix.tap('3', ms(30)).await.unwrap();
    tokio::time::sleep(ms(400)).await;
    bench.matrix.tap('2', ms(30)).await.unwrap();
    tokio::time::sleep(ms(1000)).await;

    assert_eq!(bench.probe.state(), OutputState::RUNNING);
    assert_eq!(bench.system.stats().granted, 1);

    tokio::time::sleep(ms(1000)).await;
    assert_eq!(bench.display.line(0), "Press Key:");

    bench.system.shutdown().await;
}
