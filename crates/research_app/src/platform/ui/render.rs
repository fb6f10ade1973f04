//! Append-only terminal rendering of the view model.

use std::io::{self, Write};

use research_core::{
    AppViewModel, BadgeSeverity, EntryDetail, EventId, Notification, NotificationSeverity,
    ResultsView, RunId, RunView, TimelineEntryView,
};

/// Prints what changed since the previous render: new timeline entries,
/// status changes, the hovered entry's details and the results panel.
pub struct TerminalRenderer<W: Write> {
    out: W,
    run_id: Option<RunId>,
    printed: usize,
    status: Option<&'static str>,
    shown_detail: Option<EventId>,
    results_shown: bool,
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            run_id: None,
            printed: 0,
            status: None,
            shown_detail: None,
            results_shown: false,
        }
    }

    /// Returns the newly printed entries that have details to show.
    pub fn render(&mut self, view: &AppViewModel) -> io::Result<Vec<EventId>> {
        let mut with_detail = Vec::new();
        if let Some(run) = &view.run {
            if self.run_id != Some(run.run_id) {
                self.run_id = Some(run.run_id);
                self.printed = 0;
                self.status = None;
                self.shown_detail = None;
                self.results_shown = false;
                writeln!(self.out, "Research: {}", run.company)?;
            }
            for entry in run.entries.iter().skip(self.printed) {
                self.write_entry(entry)?;
                if entry.has_detail {
                    with_detail.push(entry.id);
                }
            }
            self.printed = run.entries.len();
            self.write_status(run)?;
        }

        if let Some(detail) = &view.hovered {
            if self.shown_detail != Some(detail.id) {
                self.shown_detail = Some(detail.id);
                self.write_detail(detail)?;
            }
        }

        match &view.results {
            Some(results) if !self.results_shown => {
                self.results_shown = true;
                self.write_results(results)?;
            }
            Some(_) => {}
            None => self.results_shown = false,
        }
        self.out.flush()?;
        Ok(with_detail)
    }

    pub fn write_results(&mut self, results: &ResultsView) -> io::Result<()> {
        match results {
            ResultsView::Success { company, fields } => {
                writeln!(self.out)?;
                writeln!(self.out, "Results for {company}")?;
                writeln!(self.out, "{}", "-".repeat(company.chars().count() + 12))?;
                if fields.is_empty() {
                    writeln!(self.out, "No information available")?;
                }
                for field in fields {
                    writeln!(self.out, "{}", field.heading)?;
                    for line in field.body.lines() {
                        writeln!(self.out, "    {line}")?;
                    }
                }
            }
            ResultsView::Failure { message } => {
                writeln!(self.out)?;
                writeln!(self.out, "Research failed: {message}")?;
            }
        }
        Ok(())
    }

    fn write_entry(&mut self, entry: &TimelineEntryView) -> io::Result<()> {
        writeln!(
            self.out,
            "{} {} {:<9} {}",
            entry.time_label,
            entry.icon,
            badge(entry.badge, entry.severity),
            entry.message
        )
    }

    fn write_status(&mut self, run: &RunView) -> io::Result<()> {
        let status = run.status_label();
        if self.status != Some(status) {
            self.status = Some(status);
            writeln!(self.out, "  status: {status}")?;
        }
        Ok(())
    }

    fn write_detail(&mut self, detail: &EntryDetail) -> io::Result<()> {
        writeln!(self.out, "    #{} {}", detail.id, detail.message)?;
        for (key, value) in &detail.fields {
            writeln!(self.out, "      {key}: {value}")?;
        }
        Ok(())
    }
}

/// Toasts go to stderr so stdout stays a clean transcript.
pub fn print_notification(notification: &Notification) {
    let marker = match notification.severity {
        NotificationSeverity::Info => "*",
        NotificationSeverity::Destructive => "!",
    };
    eprintln!(
        "{marker} {}: {}",
        notification.title, notification.description
    );
}

fn badge(label: &str, severity: BadgeSeverity) -> String {
    match severity {
        BadgeSeverity::Destructive => format!("[{}]", label.to_uppercase()),
        BadgeSeverity::Outline => format!("({label})"),
        BadgeSeverity::Default | BadgeSeverity::Secondary => format!("[{label}]"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use research_core::{ConnectionState, ResultField};

    fn entry(id: EventId, message: &str, has_detail: bool) -> TimelineEntryView {
        TimelineEntryView {
            id,
            icon: "◷",
            badge: "info",
            severity: BadgeSeverity::Secondary,
            message: message.to_string(),
            time_label: "10:00:00.000".to_string(),
            has_detail,
        }
    }

    fn view(entries: Vec<TimelineEntryView>) -> AppViewModel {
        let len = entries.len();
        AppViewModel {
            run: Some(RunView {
                run_id: 1,
                company: "Acme".into(),
                connection: ConnectionState::Open,
                connected: true,
                complete: false,
                entries,
                visible: 0..len,
            }),
            ..AppViewModel::default()
        }
    }

    fn output(renderer: TerminalRenderer<Vec<u8>>) -> String {
        String::from_utf8(renderer.out).unwrap()
    }

    #[test]
    fn only_new_entries_are_printed() {
        let mut renderer = TerminalRenderer::new(Vec::new());
        renderer.render(&view(vec![entry(1, "Searching", false)])).unwrap();
        let fresh = renderer
            .render(&view(vec![
                entry(1, "Searching", false),
                entry(2, "Reading filings", true),
            ]))
            .unwrap();

        assert_eq!(fresh, vec![2]);
        let text = output(renderer);
        assert_eq!(text.matches("Searching").count(), 1);
        assert_eq!(text.matches("status: Connected").count(), 1);
        assert!(text.contains("10:00:00.000 ◷ [info]    Reading filings"));
    }

    #[test]
    fn results_panel_is_printed_once() {
        let mut renderer = TerminalRenderer::new(Vec::new());
        let mut model = view(Vec::new());
        model.results = Some(ResultsView::Success {
            company: "Acme".into(),
            fields: vec![ResultField {
                key: "founded_year".into(),
                heading: "Founded Year".into(),
                body: "1990".into(),
            }],
        });
        renderer.render(&model).unwrap();
        renderer.render(&model).unwrap();

        let text = output(renderer);
        assert_eq!(text.matches("Results for Acme").count(), 1);
        assert!(text.contains("Founded Year\n    1990\n"));
    }

    #[test]
    fn details_are_labelled_with_their_entry() {
        let mut renderer = TerminalRenderer::new(Vec::new());
        let mut model = view(vec![
            entry(1, "Reading filings", true),
            entry(2, "Checking news", true),
        ]);
        model.hovered = Some(EntryDetail {
            id: 1,
            message: "Reading filings".into(),
            fields: vec![("source".into(), "sec.gov".into())],
        });
        renderer.render(&model).unwrap();
        model.hovered = Some(EntryDetail {
            id: 2,
            message: "Checking news".into(),
            fields: vec![("source".into(), "reuters".into())],
        });
        renderer.render(&model).unwrap();

        let text = output(renderer);
        assert!(text.contains("    #1 Reading filings\n      source: sec.gov\n"));
        assert!(text.contains("    #2 Checking news\n      source: reuters\n"));
    }
}
