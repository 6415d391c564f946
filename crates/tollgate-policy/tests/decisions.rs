// decisions.rs — End-to-end DENY and ALLOW paths through the pipeline.

mod common;

use common::{engine, payment, payment_at, state, AGENT, NOW};
use tollgate_policy::{
    ActionType, DenyMode, EvalOptions, Evaluation, Intent, ReasonCode, State,
};

fn evaluate(intent: &Intent, s: &State) -> Evaluation {
    engine().evaluate_pure(intent, s, EvalOptions::default())
}

fn next_state(evaluation: Evaluation) -> State {
    match evaluation {
        Evaluation::Allow { next_state, .. } => next_state,
        Evaluation::Deny { reasons } => panic!("expected allow, got {:?}", reasons),
    }
}

#[test]
fn nonce_is_single_use_within_window() {
    let s1 = next_state(evaluate(&payment(7, 1), &state()));
    assert_eq!(
        evaluate(&payment_at(7, 1, NOW + 30), &s1).reasons(),
        &[ReasonCode::ReplayNonce]
    );
    assert!(evaluate(&payment_at(8, 1, NOW + 30), &s1).is_allow());
}

#[test]
fn nonce_is_reusable_after_replay_window() {
    let s1 = next_state(evaluate(&payment(7, 1), &state()));
    assert!(evaluate(&payment_at(7, 1, NOW + 3601), &s1).is_allow());
}

#[test]
fn velocity_window_resets_exactly_at_boundary() {
    let mut s = state();
    s.concurrency.max_concurrent.insert(AGENT.into(), 10);
    for nonce in 1..=3 {
        s = next_state(evaluate(&payment(nonce, 1), &s));
    }
    assert_eq!(
        evaluate(&payment_at(4, 1, NOW + 59), &s).reasons(),
        &[ReasonCode::VelocityExceeded]
    );

    let s = next_state(evaluate(&payment_at(4, 1, NOW + 60), &s));
    let counter = s.velocity.counters[AGENT];
    assert_eq!(counter.window_start, NOW + 60);
    assert_eq!(counter.count, 1);
}

#[test]
fn budget_accumulates_until_exhausted() {
    let s1 = next_state(evaluate(&payment(1, 6_000_000), &state()));
    assert_eq!(s1.spent(AGENT).get(), 6_000_000);

    assert_eq!(
        evaluate(&payment(2, 6_000_001), &s1).reasons(),
        &[ReasonCode::PerActionCapExceeded]
    );
    assert_eq!(
        evaluate(&payment(2, 4_000_001), &s1).reasons(),
        &[ReasonCode::BudgetExceeded]
    );
    let s2 = next_state(evaluate(&payment(2, 4_000_000), &s1));
    assert_eq!(s2.spent(AGENT).get(), 10_000_000);
}

#[test]
fn allowlist_and_kill_switch_block() {
    let off_list = Intent::new(
        "intent-x",
        AGENT,
        ActionType::Provision,
        1u64,
        "merchant:coffee",
        NOW,
        1u64,
    );
    assert_eq!(
        evaluate(&off_list, &state()).reasons(),
        &[ReasonCode::AllowlistViolation]
    );

    let mut s = state();
    s.kill_switch.agents.insert(AGENT.into(), true);
    assert_eq!(
        evaluate(&payment(1, 1), &s).reasons(),
        &[ReasonCode::KillSwitch]
    );
}

#[test]
fn collect_all_surfaces_every_violation() {
    let mut s = state();
    s.kill_switch.global = true;
    let greedy = payment(1, 7_000_000).with_depth(6);

    let fail_fast = evaluate(&greedy, &s);
    assert_eq!(fail_fast.reasons(), &[ReasonCode::KillSwitch]);

    let all = engine().evaluate_pure(&greedy, &s, EvalOptions::mode(DenyMode::CollectAll));
    assert_eq!(
        all.reasons(),
        &[
            ReasonCode::KillSwitch,
            ReasonCode::RecursionDepthExceeded,
            ReasonCode::PerActionCapExceeded
        ]
    );
}

#[test]
fn deny_leaves_input_state_untouched() {
    let s = state();
    let before = s.clone();
    let _ = evaluate(&payment(1, 9_000_000), &s);
    let _ = evaluate(&payment(2, 1), &s);
    assert_eq!(s, before);
}

#[test]
fn next_state_round_trips_through_json() {
    let s1 = next_state(evaluate(&payment(1, 5), &state()));
    let text = s1.to_json_pretty().unwrap();
    assert_eq!(State::from_json_str(&text).unwrap(), s1);
    // Amounts stay strings on the wire.
    assert!(text.contains("\"5\""));
}
