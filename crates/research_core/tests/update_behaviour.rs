use std::sync::Once;

use chrono::{DateTime, TimeZone, Utc};
use research_core::{
    update, AppState, Effect, ExportRequest, Identity, Msg, Notification, NotificationSeverity,
    ResearchForm, ResearchResult, ResultsView, RunId, Session,
};
use serde_json::json;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(engine_logging::initialize_for_tests);
}

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
}

fn signed_in() -> AppState {
    AppState::with_session(Session {
        credential: "jwt-token".into(),
        identity: Identity {
            email: "ada@example.com".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
        },
    })
}

fn submit(state: AppState, form: ResearchForm) -> (AppState, Vec<Effect>) {
    update(state, Msg::ResearchSubmitted { form, at: now() })
}

fn open_run_id(effects: &[Effect]) -> RunId {
    effects
        .iter()
        .find_map(|effect| match effect {
            Effect::OpenStream { run_id, .. } => Some(*run_id),
            _ => None,
        })
        .expect("open stream effect")
}

fn frame(state: AppState, run_id: RunId, data: &str) -> (AppState, Vec<Effect>) {
    update(
        state,
        Msg::FrameReceived {
            run_id,
            data: data.to_string(),
            at: now(),
        },
    )
}

fn notifications(effects: &[Effect]) -> Vec<&Notification> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Notify(n) => Some(n),
            _ => None,
        })
        .collect()
}

#[test]
fn submit_starts_a_run_and_marks_researching() {
    init_logging();
    let (mut state, effects) = submit(
        signed_in(),
        ResearchForm::new("  Acme  ").with_notes("   "),
    );

    match effects.as_slice() {
        [Effect::OpenStream { params, .. }] => {
            assert_eq!(params.company, "Acme");
            assert_eq!(params.token, "jwt-token");
            assert_eq!(params.user_notes, None);
            assert_eq!(params.extraction_schema, None);
        }
        other => panic!("unexpected effects {other:?}"),
    }
    let view = state.view();
    assert!(view.is_researching);
    assert_eq!(view.run.as_ref().unwrap().status_label(), "Initiating...");
    assert!(state.consume_dirty());
}

#[test]
fn invalid_schema_is_reported_and_no_run_starts() {
    init_logging();
    let (state, effects) = submit(signed_in(), ResearchForm::new("Acme").with_schema("[1, 2]"));

    assert!(state.view().run.is_none());
    assert_eq!(
        effects,
        vec![Effect::Notify(Notification::destructive(
            "Invalid request",
            "Schema must be a valid JSON object"
        ))]
    );

    let (_, effects) = submit(state, ResearchForm::new("Acme").with_schema("{oops"));
    assert_eq!(notifications(&effects)[0].description, "Invalid JSON format");
}

#[test]
fn signed_out_submit_fails_with_authentication_required() {
    init_logging();
    let (state, effects) = submit(AppState::new(), ResearchForm::new("Acme"));

    assert!(!effects
        .iter()
        .any(|effect| matches!(effect, Effect::OpenStream { .. })));
    let toasts = notifications(&effects);
    assert_eq!(toasts.len(), 1);
    assert_eq!(toasts[0].title, "Research failed");
    assert_eq!(toasts[0].severity, NotificationSeverity::Destructive);
    assert_eq!(
        state.result(),
        Some(&ResearchResult::Failure {
            message: "authentication required".into()
        })
    );
    assert!(!state.is_researching());
}

#[test]
fn complete_frame_fills_results_and_toasts_once() {
    init_logging();
    let (state, effects) = submit(signed_in(), ResearchForm::new("Acme"));
    let run_id = open_run_id(&effects);
    let (state, _) = update(state, Msg::StreamOpened { run_id, at: now() });
    let (state, _) = frame(state, run_id, r#"{"type":"update","message":"Searching"}"#);
    let (state, effects) = frame(
        state,
        run_id,
        r#"{"type":"complete","result":{"info":{"founded_year":1990,"industry":"Tech"}}}"#,
    );

    assert_eq!(
        effects,
        vec![
            Effect::Notify(Notification::info(
                "Research completed",
                "Found information about Acme"
            )),
            Effect::CloseStream { run_id },
        ]
    );
    let view = state.view();
    assert!(!view.is_researching);
    let run = view.run.unwrap();
    assert_eq!(run.status_label(), "Complete");
    assert_eq!(run.entries.len(), 3);
    match view.results.unwrap() {
        ResultsView::Success { company, fields } => {
            assert_eq!(company, "Acme");
            let headings: Vec<_> = fields.iter().map(|f| f.heading.as_str()).collect();
            assert_eq!(headings, vec!["Founded Year", "Industry"]);
            assert_eq!(fields[0].body, "1990");
        }
        other => panic!("unexpected results {other:?}"),
    }

    let (_, effects) = frame(state, run_id, r#"{"type":"complete","result":{}}"#);
    assert!(effects.is_empty());
}

#[test]
fn error_frame_surfaces_failure_verbatim() {
    init_logging();
    let (state, effects) = submit(signed_in(), ResearchForm::new("Acme"));
    let run_id = open_run_id(&effects);
    let (state, effects) = frame(state, run_id, r#"{"type":"error","message":"Agent unavailable"}"#);

    assert_eq!(notifications(&effects)[0].description, "Agent unavailable");
    assert_eq!(
        state.result(),
        Some(&ResearchResult::Failure {
            message: "Agent unavailable".into()
        })
    );
}

#[test]
fn resubmitting_closes_previous_stream_first() {
    init_logging();
    let (state, effects) = submit(signed_in(), ResearchForm::new("Acme"));
    let first = open_run_id(&effects);

    let (state, effects) = submit(state, ResearchForm::new("Globex"));
    let second = open_run_id(&effects);

    assert_eq!(effects[0], Effect::CloseStream { run_id: first });
    assert_ne!(first, second);

    let (state, effects) = frame(state, first, r#"{"type":"update","message":"stale"}"#);
    assert!(effects.is_empty());
    let run = state.view().run.unwrap();
    assert_eq!(run.company, "Globex");
    assert!(run.entries.is_empty());
}

#[test]
fn cancel_and_view_closed_stop_without_toast() {
    init_logging();
    let (state, effects) = submit(signed_in(), ResearchForm::new("Acme"));
    let run_id = open_run_id(&effects);

    let (state, effects) = update(state, Msg::ViewClosed);
    assert_eq!(effects, vec![Effect::CloseStream { run_id }]);
    assert!(!state.is_researching());
    assert!(state.result().is_none());

    let (_, effects) = update(state, Msg::CancelClicked);
    assert!(effects.is_empty());
}

#[test]
fn sign_out_cancels_run_and_clears_session() {
    init_logging();
    let (state, effects) = submit(signed_in(), ResearchForm::new("Acme"));
    let run_id = open_run_id(&effects);

    let (state, effects) = update(state, Msg::SignedOut);

    assert_eq!(effects[0], Effect::CloseStream { run_id });
    assert!(effects.contains(&Effect::ClearSession));
    assert!(state.session().is_none());
    assert!(state.view().signed_in_as.is_none());
}

#[test]
fn sign_in_stores_the_session_and_shows_the_identity() {
    init_logging();
    let session = Session {
        credential: "fresh".into(),
        identity: Identity {
            email: "grace@example.com".into(),
            first_name: "Grace".into(),
            last_name: "Hopper".into(),
        },
    };

    let (state, effects) = update(AppState::new(), Msg::SignedIn(session.clone()));

    assert_eq!(effects, vec![Effect::PersistSession(session.clone())]);
    assert_eq!(state.session(), Some(&session));
    assert_eq!(state.view().signed_in_as.as_deref(), Some("Grace Hopper"));

    let (_state, effects) = submit(state, ResearchForm::new("Acme"));
    assert!(matches!(
        &effects[0],
        Effect::OpenStream { params, .. } if params.token == "fresh"
    ));
}

#[test]
fn hover_detail_only_for_info_entries() {
    init_logging();
    let (state, effects) = submit(signed_in(), ResearchForm::new("Acme"));
    let run_id = open_run_id(&effects);
    let (state, _) = update(state, Msg::StreamOpened { run_id, at: now() });
    let (state, _) = frame(
        state,
        run_id,
        r#"{"type":"update","message":"Searching","step":"web","queries":["a"]}"#,
    );

    let entries = state.view().run.unwrap().entries;
    let (started, searching) = (entries[0].id, entries[1].id);
    assert!(entries[1].has_detail);

    let (state, _) = update(state, Msg::EntryHovered { event_id: started });
    assert!(state.view().hovered.is_none());

    let (state, _) = update(state, Msg::EntryHovered { event_id: searching });
    let detail = state.view().hovered.unwrap();
    assert_eq!(detail.message, "Searching");
    assert_eq!(
        detail.fields,
        vec![
            ("step".to_string(), "web".to_string()),
            ("queries".to_string(), r#"["a"]"#.to_string()),
        ]
    );

    let (state, _) = update(state, Msg::HoverCleared);
    assert!(state.view().hovered.is_none());
}

#[test]
fn timeline_viewport_tracks_newest_entry() {
    init_logging();
    let (mut state, effects) = submit(signed_in(), ResearchForm::new("Acme"));
    let run_id = open_run_id(&effects);
    for i in 0..20 {
        let data = json!({"type": "update", "message": format!("step {i}")}).to_string();
        state = frame(state, run_id, &data).0;
    }

    let run = state.view().run.unwrap();
    assert_eq!(run.visible.end, 20);
    assert_eq!(run.visible_entries().last().unwrap().message, "step 19");

    let (state, _) = update(state, Msg::TimelineScrolled { delta: -5 });
    let (state, _) = frame(state, run_id, r#"{"type":"update","message":"step 20"}"#);
    let run = state.view().run.unwrap();
    assert_eq!(run.visible.end, 15);
}

#[test]
fn export_requires_successful_result() {
    init_logging();
    let (state, effects) = update(signed_in(), Msg::ExportClicked);
    assert!(effects.is_empty());

    let (state, effects) = submit(state, ResearchForm::new("Acme"));
    let run_id = open_run_id(&effects);
    let (state, _) = frame(
        state,
        run_id,
        r#"{"type":"complete","result":{"industry":"Tech"}}"#,
    );
    let (state, effects) = update(state, Msg::ExportClicked);

    match effects.as_slice() {
        [Effect::ExportResult(ExportRequest { company, fields })] => {
            assert_eq!(company, "Acme");
            assert_eq!(fields[0].heading, "Industry");
            assert_eq!(fields[0].body, "Tech");
        }
        other => panic!("unexpected effects {other:?}"),
    }

    let (_, effects) = update(state, Msg::ExportFinished(Err("disk full".into())));
    assert_eq!(notifications(&effects)[0].title, "Export failed");
}
