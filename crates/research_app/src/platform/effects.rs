use std::path::PathBuf;

use engine_logging::{engine_error, engine_info};
use research_core::{Effect, ExportRequest, Msg, Notification, StreamParams};
use research_engine::{export_document, EngineHandle, ExportOptions, StreamQuery};

use super::persistence::SessionStore;
use super::ui::render::print_notification;

/// Executes effects produced by `update`. Effects that finish synchronously
/// report back as follow-up messages.
pub struct EffectRunner<'a> {
    engine: &'a EngineHandle,
    sessions: SessionStore,
    output_dir: PathBuf,
    export_options: ExportOptions,
}

impl<'a> EffectRunner<'a> {
    pub fn new(engine: &'a EngineHandle, sessions: SessionStore, output_dir: PathBuf) -> Self {
        Self {
            engine,
            sessions,
            output_dir,
            export_options: ExportOptions::default(),
        }
    }

    pub fn run(&self, effects: Vec<Effect>) -> Vec<Msg> {
        let mut follow_ups = Vec::new();
        for effect in effects {
            match effect {
                Effect::OpenStream { run_id, params } => {
                    engine_info!(
                        "OpenStream company={:?} schema={} notes={}",
                        params.company,
                        params.extraction_schema.is_some(),
                        params.user_notes.is_some()
                    );
                    self.engine.open_stream(run_id, stream_query(params));
                }
                Effect::CloseStream { run_id } => {
                    self.engine.close_stream(run_id);
                }
                Effect::Notify(notification) => print_notification(&notification),
                Effect::ExportResult(request) => {
                    follow_ups.push(Msg::ExportFinished(self.export(&request)));
                }
                Effect::PersistSession(session) => {
                    if let Err(err) = self.sessions.save(&session) {
                        engine_error!("Failed to save session: {}", err);
                        print_notification(&Notification::destructive(
                            "Error",
                            format!(
                                "Could not save session to {}: {err}",
                                self.sessions.path().display()
                            ),
                        ));
                    }
                }
                Effect::ClearSession => {
                    if let Err(err) = self.sessions.clear() {
                        engine_error!("Failed to clear session: {}", err);
                    }
                }
            }
        }
        follow_ups
    }

    /// Writes the export document and returns the written path for display.
    pub fn export(&self, request: &ExportRequest) -> Result<String, String> {
        let fields: Vec<(String, String)> = request
            .fields
            .iter()
            .map(|field| (field.heading.clone(), field.body.clone()))
            .collect();
        export_document(
            &self.output_dir,
            &request.company,
            &fields,
            &self.export_options,
        )
        .map(|summary| summary.output_path.display().to_string())
        .map_err(|err| err.to_string())
    }
}

fn stream_query(params: StreamParams) -> StreamQuery {
    StreamQuery {
        company: params.company,
        token: params.token,
        user_notes: params.user_notes,
        extraction_schema: params.extraction_schema,
    }
}
