// Integration tests for the Dispatcher
//
// These exercise the full path from a decoded Message through the Registry, coercion and
// handler chain, and check what ends up at the error handler.

use std::sync::Arc;

use assert2::{assert, check};
use crossbeam_channel::{Receiver, Sender, unbounded};
use float_cmp::approx_eq;

use lop_rust::error::codes;
use lop_rust::{
    ConfigError, DispatchOutcome, Dispatcher, Message, MethodCall, OscType, Registry, Verdict,
};

struct Report {
    code: i32,
    msg: String,
    context: String,
}

/// Dispatcher whose error reports land on a channel
fn setup_dispatcher() -> (Dispatcher, Receiver<Report>) {
    let (report_tx, report_rx) = unbounded();
    let dispatcher = Dispatcher::new(
        Arc::new(Registry::new()),
        move |code: i32, msg: &str, context: &str| {
            let _ = report_tx.send(Report {
                code,
                msg: msg.to_string(),
                context: context.to_string(),
            });
        },
    );
    (dispatcher, report_rx)
}

/// Registers a handler that records its name and answers with `verdict`
fn add_recording(
    dispatcher: &Dispatcher,
    pattern: Option<&str>,
    types: Option<&str>,
    name: &'static str,
    verdict: Verdict,
    calls: &Sender<&'static str>,
) {
    let calls = calls.clone();
    dispatcher
        .registry()
        .add(pattern, types, move |_: &MethodCall<'_>| {
            let _ = calls.send(name);
            verdict
        })
        .unwrap();
}

fn message(path: &str, args: Vec<OscType>) -> Message {
    Message::new(path, args).unwrap()
}

#[test]
fn handlers_run_in_registration_order_until_one_claims() {
    let (dispatcher, reports) = setup_dispatcher();
    let (calls_tx, calls_rx) = unbounded();

    add_recording(&dispatcher, Some("/synth/freq"), None, "h1", Verdict::Unhandled, &calls_tx);
    add_recording(&dispatcher, Some("/synth/*"), None, "h2", Verdict::Handled, &calls_tx);
    add_recording(&dispatcher, Some("/synth/fre?"), None, "h3", Verdict::Handled, &calls_tx);

    let outcome = dispatcher.dispatch(&message("/synth/freq", vec![OscType::Float(440.0)]));

    check!(outcome == DispatchOutcome::Handled);
    check!(calls_rx.try_iter().collect::<Vec<_>>() == vec!["h1", "h2"]);
    check!(reports.try_recv().is_err());
}

#[test]
fn every_handler_declining_is_a_no_match() {
    let (dispatcher, reports) = setup_dispatcher();
    let (calls_tx, calls_rx) = unbounded();

    add_recording(&dispatcher, Some("/a"), None, "h1", Verdict::Unhandled, &calls_tx);
    add_recording(&dispatcher, None, None, "h2", Verdict::Unhandled, &calls_tx);

    let outcome = dispatcher.dispatch(&message("/a", vec![]));

    check!(outcome == DispatchOutcome::NoMatch);
    check!(calls_rx.try_iter().collect::<Vec<_>>() == vec!["h1", "h2"]);
    check!(reports.try_iter().count() == 1);
}

#[test]
fn unmatched_path_reports_exactly_once() {
    let (dispatcher, reports) = setup_dispatcher();
    let (calls_tx, calls_rx) = unbounded();
    add_recording(&dispatcher, Some("/other"), None, "h1", Verdict::Handled, &calls_tx);

    let outcome = dispatcher.dispatch(&message("/missing", vec![OscType::Int(1)]));

    check!(outcome == DispatchOutcome::NoMatch);
    check!(calls_rx.try_recv().is_err());

    let reports: Vec<Report> = reports.try_iter().collect();
    assert!(reports.len() == 1);
    check!(reports[0].code == codes::NO_MATCH);
    check!(reports[0].context == "/missing");
    check!(reports[0].msg.contains("/missing"));
    check!(reports[0].msg.contains("'i'"));
}

#[test]
fn empty_registry_is_a_no_match() {
    let (dispatcher, reports) = setup_dispatcher();
    check!(dispatcher.dispatch(&message("/x", vec![])) == DispatchOutcome::NoMatch);
    check!(reports.try_iter().count() == 1);
}

#[test]
fn catch_alls_interleave_in_registration_order() {
    let (dispatcher, _reports) = setup_dispatcher();
    let (calls_tx, calls_rx) = unbounded();

    add_recording(&dispatcher, None, None, "any-1", Verdict::Unhandled, &calls_tx);
    add_recording(&dispatcher, Some("/led/*"), None, "led", Verdict::Unhandled, &calls_tx);
    add_recording(&dispatcher, None, None, "any-2", Verdict::Unhandled, &calls_tx);

    dispatcher.dispatch(&message("/led/3", vec![]));
    check!(calls_rx.try_iter().collect::<Vec<_>>() == vec!["any-1", "led", "any-2"]);
}

#[test]
fn type_mismatch_skips_to_the_next_candidate() {
    let (dispatcher, reports) = setup_dispatcher();
    let (calls_tx, calls_rx) = unbounded();

    add_recording(&dispatcher, Some("/name"), Some("i"), "int", Verdict::Handled, &calls_tx);
    add_recording(&dispatcher, Some("/name"), Some("ss"), "two", Verdict::Handled, &calls_tx);
    add_recording(&dispatcher, Some("/name"), Some("s"), "str", Verdict::Handled, &calls_tx);

    let outcome = dispatcher.dispatch(&message("/name", vec![OscType::String("kick".into())]));

    check!(outcome == DispatchOutcome::Handled);
    check!(calls_rx.try_iter().collect::<Vec<_>>() == vec!["str"]);
    check!(reports.try_recv().is_err());
}

#[test]
fn numeric_arguments_are_coerced_for_the_handler() {
    let (dispatcher, _reports) = setup_dispatcher();
    let (value_tx, value_rx) = unbounded();

    dispatcher
        .registry()
        .add(Some("/fader/*"), Some("f"), move |call: &MethodCall<'_>| {
            check!(call.types == "f");
            check!(call.argc() == 1);
            // the original message keeps its wire types
            check!(call.message.types() == "i");
            if let OscType::Float(value) = call.args[0] {
                let _ = value_tx.send(value);
            }
            Verdict::Handled
        })
        .unwrap();

    dispatcher.dispatch(&message("/fader/1", vec![OscType::Int(5)]));

    let value = value_rx.try_recv().unwrap();
    check!(approx_eq!(f32, value, 5.0, ulps = 2));
}

#[test]
fn user_data_is_handed_back_on_every_call() {
    struct Channel {
        index: i32,
        label: &'static str,
    }

    let (dispatcher, _reports) = setup_dispatcher();
    let (seen_tx, seen_rx) = unbounded();

    for (index, label) in [(1, "kick"), (2, "snare")] {
        let seen_tx = seen_tx.clone();
        dispatcher
            .registry()
            .add_with_data(
                Some(&format!("/drum/{index}")),
                None,
                Channel { index, label },
                move |call: &MethodCall<'_>, channel: &Channel| {
                    let _ = seen_tx.send((call.path.to_string(), channel.index, channel.label));
                    Verdict::Handled
                },
            )
            .unwrap();
    }

    dispatcher.dispatch(&message("/drum/2", vec![]));
    dispatcher.dispatch(&message("/drum/1", vec![]));
    dispatcher.dispatch(&message("/drum/2", vec![]));

    check!(
        seen_rx.try_iter().collect::<Vec<_>>()
            == vec![
                ("/drum/2".to_string(), 2, "snare"),
                ("/drum/1".to_string(), 1, "kick"),
                ("/drum/2".to_string(), 2, "snare"),
            ]
    );
}

#[test]
fn removing_twice_leaves_other_methods_working() {
    let (dispatcher, _reports) = setup_dispatcher();
    let (calls_tx, calls_rx) = unbounded();

    let registry = dispatcher.registry();
    let first_tx = calls_tx.clone();
    let first = registry
        .add(Some("/x"), None, move |_: &MethodCall<'_>| {
            let _ = first_tx.send("first");
            Verdict::Handled
        })
        .unwrap();
    add_recording(&dispatcher, Some("/x"), None, "second", Verdict::Handled, &calls_tx);

    check!(registry.remove(first) == Ok(()));
    check!(registry.remove(first) == Err(ConfigError::NotFound { id: first }));
    check!(registry.len() == 1);

    check!(dispatcher.dispatch(&message("/x", vec![])) == DispatchOutcome::Handled);
    check!(calls_rx.try_iter().collect::<Vec<_>>() == vec!["second"]);
}

#[test]
fn integer_return_codes_map_onto_verdicts() {
    let (dispatcher, _reports) = setup_dispatcher();
    let (calls_tx, calls_rx) = unbounded();

    for (name, code) in [("declines", 1), ("claims", 0), ("never", 0)] {
        let calls_tx = calls_tx.clone();
        dispatcher
            .registry()
            .add(Some("/c"), None, move |_: &MethodCall<'_>| {
                let _ = calls_tx.send(name);
                Verdict::from_code(code)
            })
            .unwrap();
    }

    check!(dispatcher.dispatch(&message("/c", vec![])) == DispatchOutcome::Handled);
    check!(calls_rx.try_iter().collect::<Vec<_>>() == vec!["declines", "claims"]);
}
