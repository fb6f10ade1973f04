use engine_logging::engine_info;

use crate::controller::{ControllerOutput, Outcome};
use crate::effect::{ExportRequest, Notification};
use crate::results::{ResearchResult, ResultsView};
use crate::{AppState, Effect, Msg};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let before = state.timeline_len();
    let effects = match msg {
        Msg::SignedIn(session) => {
            engine_info!("signed in as {}", session.identity.email);
            state.set_session(Some(session.clone()));
            vec![Effect::PersistSession(session)]
        }
        Msg::SignedOut => {
            let outputs = state.controller_mut().cancel();
            let mut effects = apply_outputs(&mut state, outputs);
            state.set_session(None);
            state.set_result(None);
            effects.push(Effect::ClearSession);
            effects.push(Effect::Notify(Notification::info(
                "Logged out",
                "You have been successfully logged out",
            )));
            effects
        }
        Msg::ResearchSubmitted { form, at } => match form.into_request() {
            Ok(request) => {
                state.begin_research();
                let credential = state.credential();
                let (_handle, outputs) = state
                    .controller_mut()
                    .start_run(request, &credential, at);
                apply_outputs(&mut state, outputs)
            }
            Err(err) => vec![Effect::Notify(Notification::destructive(
                "Invalid request",
                err.to_string(),
            ))],
        },
        Msg::StreamOpened { run_id, at } => {
            let outputs = state.controller_mut().on_open(run_id, at);
            apply_outputs(&mut state, outputs)
        }
        Msg::FrameReceived { run_id, data, at } => {
            let outputs = state.controller_mut().on_frame(run_id, &data, at);
            apply_outputs(&mut state, outputs)
        }
        Msg::StreamDisrupted {
            run_id,
            reason,
            will_retry,
            at,
        } => {
            let outputs = state
                .controller_mut()
                .on_transport_error(run_id, &reason, will_retry, at);
            apply_outputs(&mut state, outputs)
        }
        Msg::CancelClicked | Msg::ViewClosed => {
            let outputs = state.controller_mut().cancel();
            state.stop_research();
            apply_outputs(&mut state, outputs)
        }
        Msg::EntryHovered { event_id } => {
            state.hover(event_id);
            Vec::new()
        }
        Msg::HoverCleared => {
            state.clear_hover();
            Vec::new()
        }
        Msg::TimelineScrolled { delta } => {
            state.scroll(delta);
            Vec::new()
        }
        Msg::ExportClicked => match state.result().map(ResearchResult::view) {
            Some(ResultsView::Success { company, fields }) => {
                vec![Effect::ExportResult(ExportRequest { company, fields })]
            }
            _ => Vec::new(),
        },
        Msg::ExportFinished(Ok(path)) => vec![Effect::Notify(Notification::info(
            "Export complete",
            format!("Saved {path}"),
        ))],
        Msg::ExportFinished(Err(message)) => vec![Effect::Notify(Notification::destructive(
            "Export failed",
            message,
        ))],
        Msg::Tick | Msg::NoOp => Vec::new(),
    };

    state.sync_viewport(before);
    (state, effects)
}

/// Turns controller outputs into effects and folds outcomes into the results panel.
fn apply_outputs(state: &mut AppState, outputs: Vec<ControllerOutput>) -> Vec<Effect> {
    let mut effects = Vec::with_capacity(outputs.len());
    for output in outputs {
        match output {
            ControllerOutput::OpenChannel { run_id, params } => {
                effects.push(Effect::OpenStream { run_id, params });
            }
            ControllerOutput::CloseChannel { run_id } => {
                effects.push(Effect::CloseStream { run_id });
            }
            ControllerOutput::Outcome { run_id: _, outcome } => {
                let company = state
                    .controller()
                    .current()
                    .map(|run| run.request().company().to_string())
                    .unwrap_or_default();
                let notification = match &outcome {
                    Outcome::Completed(_) => Notification::info(
                        "Research completed",
                        format!("Found information about {company}"),
                    ),
                    Outcome::Failed(reason) => {
                        Notification::destructive("Research failed", reason.clone())
                    }
                };
                state.set_result(Some(ResearchResult::from_outcome(&company, &outcome)));
                effects.push(Effect::Notify(notification));
            }
        }
    }
    effects
}
