// tests/watch_state.rs

use sitepipe::watch::{RuleCommand, RuleState, RunState};

#[test]
fn change_while_idle_arms_a_timer() {
    let mut state = RuleState::new();
    assert_eq!(state.run_state(), RunState::Idle);

    assert_eq!(state.on_change(), RuleCommand::ArmTimer(1));
    assert_eq!(state.run_state(), RunState::Pending);
}

#[test]
fn only_the_latest_timer_fires() {
    let mut state = RuleState::new();
    state.on_change();
    state.on_change();
    assert_eq!(state.on_change(), RuleCommand::ArmTimer(3));

    assert_eq!(state.on_timer(1), RuleCommand::Nothing);
    assert_eq!(state.on_timer(2), RuleCommand::Nothing);
    assert_eq!(state.run_state(), RunState::Pending);

    assert_eq!(state.on_timer(3), RuleCommand::Execute);
    assert_eq!(state.run_state(), RunState::Running);
}

#[test]
fn changes_during_a_run_coalesce_into_one_catch_up_run() {
    let mut state = RuleState::new();
    let RuleCommand::ArmTimer(generation) = state.on_change() else {
        panic!("expected a timer");
    };
    assert_eq!(state.on_timer(generation), RuleCommand::Execute);

    for _ in 0..5 {
        assert_eq!(state.on_change(), RuleCommand::Nothing);
    }
    assert!(state.has_pending_rerun());

    let RuleCommand::ArmTimer(next) = state.on_finished() else {
        panic!("expected a catch-up timer");
    };
    assert!(!state.has_pending_rerun());
    assert_eq!(state.on_timer(next), RuleCommand::Execute);

    assert_eq!(state.on_finished(), RuleCommand::Nothing);
    assert_eq!(state.run_state(), RunState::Idle);
}

#[test]
fn stray_events_are_ignored() {
    let mut state = RuleState::new();
    assert_eq!(state.on_timer(0), RuleCommand::Nothing);
    assert_eq!(state.on_finished(), RuleCommand::Nothing);
    assert_eq!(state.run_state(), RunState::Idle);

    state.on_change();
    // A run cannot finish before it started.
    assert_eq!(state.on_finished(), RuleCommand::Nothing);
    assert_eq!(state.run_state(), RunState::Pending);
}
