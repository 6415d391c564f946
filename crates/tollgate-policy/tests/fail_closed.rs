// fail_closed.rs — Malformed or incomplete ledgers never produce an ALLOW.

mod common;

use common::{engine, payment, state_document, AGENT};
use serde_json::{json, Value};
use tollgate_policy::{EvalOptions, Evaluation, ReasonCode};

fn evaluate(doc: &Value) -> Evaluation {
    engine().evaluate_document(&payment(1, 100), doc, EvalOptions::default())
}

fn without(path: &[&str]) -> Value {
    let mut doc = state_document();
    let (last, parents) = path.split_last().unwrap();
    let mut node = &mut doc;
    for key in parents {
        node = node.get_mut(*key).unwrap();
    }
    node.as_object_mut().unwrap().remove(*last);
    doc
}

#[test]
fn well_formed_document_is_allowed() {
    assert!(evaluate(&state_document()).is_allow());
}

#[test]
fn every_required_section_is_enforced() {
    let required: &[&[&str]] = &[
        &["policy_version"],
        &["period_id"],
        &["kill_switch"],
        &["kill_switch", "global"],
        &["kill_switch", "agents"],
        &["allowlists"],
        &["budget"],
        &["budget", "budget_limit"],
        &["budget", "spent_in_period"],
        &["max_amount_per_action"],
        &["velocity"],
        &["velocity", "config"],
        &["velocity", "counters"],
        &["replay"],
        &["replay", "window_seconds"],
        &["replay", "max_nonces_per_agent"],
        &["replay", "nonces"],
        &["concurrency"],
        &["concurrency", "max_concurrent"],
        &["concurrency", "active"],
        &["concurrency", "active_auths"],
        &["recursion"],
        &["recursion", "max_depth"],
    ];
    for path in required {
        assert_eq!(
            evaluate(&without(path)).reasons(),
            &[ReasonCode::StateInvalid],
            "removing {:?}",
            path
        );
    }
}

#[test]
fn evaluated_agent_must_be_configured() {
    let per_agent: &[&[&str]] = &[
        &["budget", "budget_limit", AGENT],
        &["max_amount_per_action", AGENT],
        &["concurrency", "max_concurrent", AGENT],
        &["recursion", "max_depth", AGENT],
    ];
    for path in per_agent {
        assert_eq!(
            evaluate(&without(path)).reasons(),
            &[ReasonCode::StateInvalid],
            "removing {:?}",
            path
        );
    }
}

#[test]
fn other_agents_need_no_config() {
    let mut doc = state_document();
    doc["kill_switch"]["agents"]["agent-B"] = json!(true);
    assert!(evaluate(&doc).is_allow());
}

#[test]
fn wrong_shapes_are_state_invalid() {
    let mut doc = state_document();
    doc["velocity"]["config"]["max_actions"] = json!("three");
    assert_eq!(evaluate(&doc).reasons(), &[ReasonCode::StateInvalid]);

    let mut doc = state_document();
    doc["kill_switch"]["global"] = json!(0);
    assert_eq!(evaluate(&doc).reasons(), &[ReasonCode::StateInvalid]);

    assert_eq!(evaluate(&json!([])).reasons(), &[ReasonCode::StateInvalid]);
    assert_eq!(evaluate(&Value::Null).reasons(), &[ReasonCode::StateInvalid]);
}

#[test]
fn version_mismatch_follows_structural_checks() {
    let mut doc = state_document();
    doc["policy_version"] = json!("9.9.9");
    assert_eq!(
        evaluate(&doc).reasons(),
        &[ReasonCode::PolicyVersionMismatch]
    );

    doc.as_object_mut().unwrap().remove("recursion");
    assert_eq!(evaluate(&doc).reasons(), &[ReasonCode::StateInvalid]);
}

#[test]
fn caller_keys_survive_into_next_state() {
    let mut doc = state_document();
    doc["owner"] = json!("team-x");
    doc["notes"] = json!({ "ticket": 42 });

    let Evaluation::Allow {
        authorization,
        next_state,
    } = evaluate(&doc)
    else {
        panic!("expected allow");
    };
    let written = serde_json::to_value(&next_state).unwrap();
    assert_eq!(written["owner"], json!("team-x"));
    assert_eq!(written["notes"], json!({ "ticket": 42 }));

    let Evaluation::Allow {
        authorization: plain,
        ..
    } = evaluate(&state_document())
    else {
        panic!("expected allow");
    };
    assert_ne!(authorization.state_snapshot_hash, plain.state_snapshot_hash);
}

#[test]
fn unknown_key_inside_an_engine_section_is_state_invalid() {
    let mut doc = state_document();
    doc["budget"]["carry_over"] = json!("5");
    assert_eq!(evaluate(&doc).reasons(), &[ReasonCode::StateInvalid]);

    let mut doc = state_document();
    doc["velocity"]["config"]["burst"] = json!(2);
    assert_eq!(evaluate(&doc).reasons(), &[ReasonCode::StateInvalid]);
}
