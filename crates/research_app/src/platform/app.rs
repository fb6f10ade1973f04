use std::collections::VecDeque;
use std::io::{self, BufRead, Stdout, Write};
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use engine_logging::{clear_run_id, engine_error, engine_info, engine_warn, set_run_id};
use research_core::{
    update, AppState, ExportRequest, Msg, Notification, ResearchResult, ResultsView, RunId,
    AUTH_REQUIRED_MESSAGE,
};
use research_engine::{
    AnalyzeClient, AnalyzePayload, AuthClient, AuthError, EngineEvent, EngineHandle,
    LoginCredentials, SignupCredentials,
};

use crate::cli::{Cli, Command, ResearchArgs};
use super::config::AppConfig;
use super::effects::EffectRunner;
use super::persistence::{session_from_auth, SessionStore};
use super::ui::render::{print_notification, TerminalRenderer};

const TICK_INTERVAL: Duration = Duration::from_millis(75);

pub fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = AppConfig::load(cli.config.as_deref())?;
    config.apply_cli(cli.api_base, cli.auth_base);
    config.validate()?;
    let sessions = SessionStore::new(config.session_file.clone());

    match cli.command {
        Command::Login { email, password } => {
            let password = password_or_prompt(password)?;
            authenticate(&config, &sessions, Auth::Login(LoginCredentials { email, password }))
        }
        Command::Signup {
            first_name,
            last_name,
            email,
            password,
        } => {
            let password = password_or_prompt(password)?;
            authenticate(
                &config,
                &sessions,
                Auth::Signup(SignupCredentials {
                    first_name,
                    last_name,
                    email,
                    password,
                }),
            )
        }
        Command::Logout => logout(&config, sessions),
        Command::Whoami => Ok(whoami(&sessions)),
        Command::Research(args) => research(&config, sessions, &args),
        Command::Analyze(args) => analyze(&config, sessions, &args),
    }
}

enum Auth {
    Login(LoginCredentials),
    Signup(SignupCredentials),
}

fn authenticate(config: &AppConfig, sessions: &SessionStore, auth: Auth) -> Result<ExitCode> {
    let engine = EngineHandle::new(config.stream_settings()?)?;
    let client = AuthClient::new(config.auth_base()?, config.request_timeout())?;

    let (result, failed_title) = match &auth {
        Auth::Login(credentials) => (engine.block_on(client.login(credentials)), "Login failed"),
        Auth::Signup(credentials) => (engine.block_on(client.signup(credentials)), "Signup failed"),
    };

    match result {
        Ok(auth_session) => {
            let session = session_from_auth(auth_session);
            let greeting = match auth {
                Auth::Login(_) => Notification::info(
                    "Login successful",
                    format!("Welcome back, {}!", session.identity.display_name()),
                ),
                Auth::Signup(_) => {
                    Notification::info("Account created", "Welcome to Company Researcher!")
                }
            };

            let runner = EffectRunner::new(&engine, sessions.clone(), config.output_dir.clone());
            let mut shell = Shell::new(
                AppState::new(),
                runner,
                TerminalRenderer::new(io::stdout()),
                false,
            );
            shell.dispatch(Msg::SignedIn(session))?;
            if sessions.load().is_none() {
                // The runner already reported why the save failed.
                return Ok(ExitCode::FAILURE);
            }
            print_notification(&greeting);
            Ok(ExitCode::SUCCESS)
        }
        Err(AuthError::Rejected(message)) => {
            print_notification(&Notification::destructive(failed_title, message));
            Ok(ExitCode::FAILURE)
        }
        Err(err) => {
            engine_error!("{}", err);
            print_notification(&Notification::destructive("Error", err.to_string()));
            Ok(ExitCode::FAILURE)
        }
    }
}

fn logout(config: &AppConfig, sessions: SessionStore) -> Result<ExitCode> {
    let state = sessions
        .load()
        .map(AppState::with_session)
        .unwrap_or_default();
    let engine = EngineHandle::new(config.stream_settings()?)?;
    let runner = EffectRunner::new(&engine, sessions, config.output_dir.clone());
    let mut shell = Shell::new(state, runner, TerminalRenderer::new(io::stdout()), false);
    shell.dispatch(Msg::SignedOut)?;
    Ok(ExitCode::SUCCESS)
}

fn whoami(sessions: &SessionStore) -> ExitCode {
    match sessions.load() {
        Some(session) => {
            println!(
                "{} <{}>",
                session.identity.display_name(),
                session.identity.email
            );
            ExitCode::SUCCESS
        }
        None => {
            println!("Not signed in");
            ExitCode::FAILURE
        }
    }
}

fn research(config: &AppConfig, sessions: SessionStore, args: &ResearchArgs) -> Result<ExitCode> {
    let form = args.form()?;
    let state = sessions
        .load()
        .map(AppState::with_session)
        .unwrap_or_default();
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| config.output_dir.clone());

    let engine = EngineHandle::new(config.stream_settings()?)?;
    let runner = EffectRunner::new(&engine, sessions, output_dir);
    let mut shell = Shell::new(state, runner, TerminalRenderer::new(io::stdout()), args.details);

    shell.dispatch(Msg::ResearchSubmitted {
        form,
        at: Utc::now(),
    })?;
    let Some(run_id) = shell.current_run_id() else {
        // Rejected by validation; the notification says why.
        return Ok(ExitCode::FAILURE);
    };
    engine_info!("research started for {:?}", args.company);

    while !shell.run_closed() {
        let Some(event) = engine.recv_timeout(TICK_INTERVAL) else {
            shell.dispatch(Msg::Tick)?;
            continue;
        };
        let gave_up = event.run_id() == run_id
            && matches!(event, EngineEvent::StreamDisrupted { will_retry: false, .. });
        shell.dispatch(engine_msg(event))?;
        if gave_up && !shell.run_closed() {
            engine_warn!("stream for run {} gave up", run_id);
            shell.dispatch(Msg::CancelClicked)?;
            return Ok(ExitCode::FAILURE);
        }
    }

    let succeeded = shell.state.result().is_some_and(ResearchResult::is_success);
    if succeeded && args.export {
        shell.dispatch(Msg::ExportClicked)?;
    }
    shell.dispatch(Msg::ViewClosed)?;
    clear_run_id();

    Ok(if succeeded {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn analyze(config: &AppConfig, sessions: SessionStore, args: &ResearchArgs) -> Result<ExitCode> {
    let Some(session) = sessions.load() else {
        print_notification(&Notification::destructive(
            "Research failed",
            AUTH_REQUIRED_MESSAGE,
        ));
        return Ok(ExitCode::FAILURE);
    };
    let request = match args.form()?.into_request() {
        Ok(request) => request,
        Err(err) => {
            print_notification(&Notification::destructive("Invalid request", err.to_string()));
            return Ok(ExitCode::FAILURE);
        }
    };
    let payload = AnalyzePayload {
        company: request.company().to_string(),
        extraction_schema: request.extraction_schema().cloned(),
        user_notes: request.user_notes().map(str::to_string),
    };
    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| config.output_dir.clone());

    let engine = EngineHandle::new(config.stream_settings()?)?;
    let client = AnalyzeClient::new(config.api_base()?, config.request_timeout())?;
    println!("Analyzing {}...", payload.company);
    let result = match engine.block_on(client.analyze(&payload, &session.credential)) {
        Ok(value) => {
            print_notification(&Notification::info(
                "Research completed",
                format!("Found information about {}", payload.company),
            ));
            ResearchResult::from_payload(&payload.company, &value)
        }
        Err(err) => {
            engine_error!("analyze failed: {}", err);
            print_notification(&Notification::destructive(
                "Research failed",
                err.user_message(),
            ));
            ResearchResult::Failure {
                message: err.user_message().to_string(),
            }
        }
    };

    let view = result.view();
    TerminalRenderer::new(io::stdout()).write_results(&view)?;

    if let ResultsView::Success { company, fields } = view {
        if args.export {
            let runner = EffectRunner::new(&engine, sessions, output_dir);
            let notification = match runner.export(&ExportRequest { company, fields }) {
                Ok(path) => Notification::info("Export complete", format!("Saved {path}")),
                Err(message) => Notification::destructive("Export failed", message),
            };
            print_notification(&notification);
        }
        return Ok(ExitCode::SUCCESS);
    }
    Ok(ExitCode::FAILURE)
}

/// Owns the state and runs the update/effect/render cycle.
struct Shell<'a, W: Write> {
    state: AppState,
    runner: EffectRunner<'a>,
    renderer: TerminalRenderer<W>,
    details: bool,
}

impl<'a> Shell<'a, Stdout> {
    fn new(
        state: AppState,
        runner: EffectRunner<'a>,
        renderer: TerminalRenderer<Stdout>,
        details: bool,
    ) -> Self {
        Self {
            state,
            runner,
            renderer,
            details,
        }
    }
}

impl<W: Write> Shell<'_, W> {
    fn dispatch(&mut self, msg: Msg) -> Result<()> {
        let mut queue = VecDeque::from([msg]);
        while let Some(msg) = queue.pop_front() {
            let state = std::mem::take(&mut self.state);
            let (mut state, effects) = update(state, msg);
            match state.controller().handle() {
                Some(handle) => set_run_id(handle.run_id),
                None => clear_run_id(),
            }

            if state.consume_dirty() {
                let with_detail = self.renderer.render(&state.view())?;
                if self.details {
                    queue.extend(
                        with_detail
                            .into_iter()
                            .map(|event_id| Msg::EntryHovered { event_id }),
                    );
                }
            }
            self.state = state;
            queue.extend(self.runner.run(effects));
        }
        Ok(())
    }

    fn current_run_id(&self) -> Option<RunId> {
        self.state.controller().handle().map(|handle| handle.run_id)
    }

    fn run_closed(&self) -> bool {
        !self.state.controller().is_active()
    }
}

fn engine_msg(event: EngineEvent) -> Msg {
    let at = Utc::now();
    match event {
        EngineEvent::StreamOpened { run_id } => Msg::StreamOpened { run_id, at },
        EngineEvent::StreamFrame { run_id, data } => Msg::FrameReceived { run_id, data, at },
        EngineEvent::StreamDisrupted {
            run_id,
            error,
            will_retry,
        } => Msg::StreamDisrupted {
            run_id,
            reason: error.to_string(),
            will_retry,
            at,
        },
    }
}

fn password_or_prompt(password: Option<String>) -> Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("reading password from stdin")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
