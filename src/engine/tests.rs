use super::testing::MockFactory;
use super::*;
use crate::api::{Command, ContentItem, ContentType, Request, Response, ready};
use crate::error::GatewayError;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

fn router() -> RequestRouter<MockFactory> {
    ready(MockFactory::new(), "CCGBANK").unwrap()
}

fn texts(items: &[&str]) -> Vec<ContentItem> {
    items.iter().map(|t| ContentItem::text(*t)).collect()
}

// --- Validation ---------------------------------------------------------------

#[test]
fn empty_content_is_rejected_before_any_backend_call() {
    let router = router();

    let err = router.create("t", &[]).unwrap_err();
    assert!(matches!(err, GatewayError::InvalidArgument(_)));
    let err = router.infer("t", &[]).unwrap_err();
    assert!(matches!(err, GatewayError::InvalidArgument(_)));

    let factory = router.gateway().factory();
    assert_eq!(factory.builds.calls(), 1, "only the default session was built");
    assert_eq!(factory.parses.calls(), 0);
    assert!(!router.gateway().contains("t"));
}

#[test]
fn create_with_an_empty_first_payload_is_invalid() {
    let router = router();
    let content = vec![ContentItem::new(ContentType::Text, Vec::new()), ContentItem::text("CCGBANK")];

    let err = router.create("t", &content).unwrap_err();
    assert_eq!(err.kind(), "invalid_argument");
    assert_eq!(router.gateway().factory().builds.calls(), 1);
}

#[test]
fn non_utf8_payloads_are_invalid_arguments() {
    let router = router();
    let bad = ContentItem::new(ContentType::Text, vec![0xc3, 0x28]);

    assert_eq!(router.create("t", std::slice::from_ref(&bad)).unwrap_err().kind(), "invalid_argument");
    let err = router.infer("", &[ContentItem::text("fine"), bad]).unwrap_err();
    assert_eq!(err.kind(), "invalid_argument");
    assert_eq!(router.gateway().factory().parses.calls(), 0);
}

// --- create -------------------------------------------------------------------

#[test]
fn create_upper_cases_and_trims_the_format() {
    let router = router();
    router.create("t", &texts(&["  html \n"])).unwrap();
    assert_eq!(router.gateway().get_or_default("t").format(), "HTML");
}

#[test]
fn create_only_reads_the_first_item() {
    let router = router();
    router.create("t", &texts(&["CCGBANK", "BOGUS"])).unwrap();
    assert_eq!(router.gateway().get_or_default("t").format(), "CCGBANK");
}

#[test]
fn repeated_create_builds_once() {
    let router = router();
    router.create("t", &texts(&["CCGBANK"])).unwrap();
    router.create("t", &texts(&["CCGBANK"])).unwrap();
    router.create("t", &texts(&["HTML"])).unwrap();

    assert_eq!(router.gateway().factory().builds.calls(), 2);
    assert_eq!(router.gateway().get_or_default("t").format(), "CCGBANK");
}

#[test]
fn create_without_a_tenant_acks_without_building() {
    let router = router();
    assert!(router.create("", &texts(&["HTML"])).is_ok());
    assert_eq!(router.gateway().factory().builds.calls(), 1);
    assert!(router.gateway().is_empty());
}

#[test]
fn create_reports_build_failures_by_kind() {
    let router = router();
    assert_eq!(router.create("a", &texts(&["bogus"])).unwrap_err().kind(), "unsupported_format_error");
    assert_eq!(router.create("b", &texts(&["missing"])).unwrap_err().kind(), "model_load_error");
    assert!(router.gateway().is_empty());
}

// --- learn --------------------------------------------------------------------

#[test]
fn learn_acknowledges_anything() {
    let router = router();
    assert!(router.learn("", &[]).is_ok());
    assert!(router.learn("nobody", &texts(&["some", "feedback"])).is_ok());
    assert_eq!(router.gateway().factory().builds.calls(), 1);
    assert_eq!(router.gateway().factory().parses.calls(), 0);
}

// --- infer --------------------------------------------------------------------

#[test]
fn unknown_tenant_falls_back_to_the_default_session() {
    let router = router();
    let unknown = router.infer("never-created", &texts(&["a b"])).unwrap();
    let default = router.infer("", &texts(&["a b"])).unwrap();
    assert_eq!(unknown, default);
    assert_eq!(unknown.message, "[a b]");
}

#[test]
fn failed_create_then_infer_uses_the_default_session() {
    let router = router();
    let err = router.create("t", &texts(&["BOGUS"])).unwrap_err();
    assert!(matches!(err, GatewayError::UnsupportedFormat(_)));

    let out = router.infer("t", &texts(&["still served"])).unwrap();
    assert_eq!(out.message, "[still served]");
    assert!(!router.gateway().contains("t"));
}

#[test]
fn infer_joins_outputs_in_input_order() {
    let router = router();
    router.create("u1", &texts(&["CCGBANK"])).unwrap();

    let out = router.infer("u1", &texts(&["one", "two words", "three"])).unwrap();
    assert_eq!(out.message, "[one]\n[two words]\n[three]");
}

#[test]
fn items_without_a_parse_are_skipped() {
    let router = router();
    let out = router.infer("", &texts(&["first", "   ", "last"])).unwrap();
    assert_eq!(out.message, "[first]\n[last]");

    let none = router.infer("", &texts(&[""])).unwrap();
    assert_eq!(none.message, "");

    let snap = router.gateway().metrics().snapshot();
    assert_eq!(snap.items_parsed, 2);
    assert_eq!(snap.items_skipped, 2);
}

#[test]
fn engine_errors_fail_the_whole_call_and_leave_the_session_usable() {
    let router = router();
    router.create("t", &texts(&["CCGBANK"])).unwrap();

    let err = router.infer("t", &texts(&["ok", "FAIL now"])).unwrap_err();
    assert_eq!(err.kind(), "engine_failure");

    let out = router.infer("t", &texts(&["ok"])).unwrap();
    assert_eq!(out.message, "[ok]");
    assert_eq!(router.gateway().metrics().snapshot().infer_failures, 1);
}

#[test]
fn engine_panics_become_engine_failures() {
    let router = router();
    let err = router.infer("", &texts(&["PANIC"])).unwrap_err();
    assert!(matches!(&err, GatewayError::EngineFailure(_)));
    assert!(err.to_string().contains("asked to panic"));

    let out = router.infer("", &texts(&["after"])).unwrap();
    assert_eq!(out.message, "[after]");
}

// --- Concurrency --------------------------------------------------------------

#[test]
fn concurrent_infers_on_one_session_never_overlap() {
    let router = ready(MockFactory::new().with_parse_delay(Duration::from_millis(30)), "CCGBANK").unwrap();
    router.create("t", &texts(&["CCGBANK"])).unwrap();
    let barrier = Barrier::new(2);

    let (a, b) = thread::scope(|s| {
        let a = s.spawn(|| {
            barrier.wait();
            router.infer("t", &texts(&["from first"]))
        });
        let b = s.spawn(|| {
            barrier.wait();
            router.infer("t", &texts(&["from second"]))
        });
        (a.join().unwrap(), b.join().unwrap())
    });

    assert_eq!(a.unwrap().message, "[from first]");
    assert_eq!(b.unwrap().message, "[from second]");
    let parses = &router.gateway().factory().parses;
    assert_eq!(parses.calls(), 2);
    assert_eq!(parses.max_active(), 1);
}

#[test]
fn distinct_sessions_parse_in_parallel() {
    let router = ready(MockFactory::new().with_parse_delay(Duration::from_millis(150)), "CCGBANK").unwrap();
    router.create("t1", &texts(&["CCGBANK"])).unwrap();
    router.create("t2", &texts(&["CCGBANK"])).unwrap();
    let barrier = Barrier::new(2);

    thread::scope(|s| {
        for tenant in ["t1", "t2"] {
            let router = &router;
            let barrier = &barrier;
            s.spawn(move || {
                barrier.wait();
                router.infer(tenant, &texts(&[tenant])).unwrap()
            });
        }
    });

    assert_eq!(router.gateway().factory().parses.max_active(), 2);
}

#[test]
fn router_clones_share_one_gateway() {
    let router = router();
    let other = router.clone();
    router.create("t", &texts(&["HTML"])).unwrap();

    assert!(Arc::ptr_eq(router.gateway(), other.gateway()));
    assert!(other.gateway().contains("t"));
}

// --- handle -------------------------------------------------------------------

#[test]
fn handle_dispatches_on_the_command() {
    let router = router();

    let create = Request::new("t", Command::Create, texts(&["CCGBANK"]));
    assert_eq!(router.handle(&create).unwrap(), Response::Ack);

    let learn = Request::new("t", Command::Learn, Vec::new());
    assert_eq!(router.handle(&learn).unwrap(), Response::Ack);

    let infer = Request::new("t", Command::Infer, texts(&["The cat sat."]));
    match router.handle(&infer).unwrap() {
        Response::Infer(out) => assert_eq!(out.message, "[The cat sat.]"),
        other => panic!("unexpected response: {other:?}"),
    }
}

#[test]
fn concrete_scenario_one_line_per_item() {
    let router = router();
    router.create("u1", &texts(&["CCGBANK"])).unwrap();

    let one = router.infer("u1", &texts(&["The cat sat."])).unwrap();
    assert_eq!(one.message.lines().count(), 1);
    assert!(!one.message.trim().is_empty());

    let two = router.infer("u1", &texts(&["A.", "B."])).unwrap();
    let lines: Vec<_> = two.message.lines().collect();
    assert_eq!(lines, vec!["[A.]", "[B.]"]);
}
