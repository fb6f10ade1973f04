use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use research_core::{ResearchForm, SchemaTemplate};

#[derive(Parser, Debug)]
#[command(author, version, about = "Research companies through the analysis service")]
pub struct Cli {
    /// RON config file (default: ./research.ron when present).
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Overrides the analysis service base URL.
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// Overrides the auth service base URL.
    #[arg(long, global = true)]
    pub auth_base: Option<String>,

    /// Also log to the terminal.
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and store the session.
    Login {
        #[arg(long)]
        email: String,
        /// Read from stdin when omitted.
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account and store the session.
    Signup {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored session.
    Logout,
    /// Show who is signed in.
    Whoami,
    /// Stream a live analysis of a company.
    Research(ResearchArgs),
    /// Run an analysis as a single request and print the result.
    Analyze(ResearchArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ResearchArgs {
    pub company: String,

    /// Free-text guidance for the analysis.
    #[arg(long)]
    pub notes: Option<String>,

    /// Extraction schema as JSON text, or `@path` to read it from a file.
    #[arg(long, conflicts_with = "template")]
    pub schema: Option<String>,

    /// Use a built-in extraction schema.
    #[arg(long, value_enum)]
    pub template: Option<TemplateArg>,

    /// Write the result document to the output directory.
    #[arg(long)]
    pub export: bool,

    /// Print the detail fields of info entries.
    #[arg(long)]
    pub details: bool,

    /// Output directory for `--export`.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateArg {
    Simple,
    Detailed,
}

impl From<TemplateArg> for SchemaTemplate {
    fn from(arg: TemplateArg) -> Self {
        match arg {
            TemplateArg::Simple => SchemaTemplate::Simple,
            TemplateArg::Detailed => SchemaTemplate::Detailed,
        }
    }
}

impl ResearchArgs {
    /// Raw form input; validation happens in the core.
    pub fn form(&self) -> Result<ResearchForm> {
        let mut form = ResearchForm::new(self.company.clone());
        if let Some(notes) = &self.notes {
            form = form.with_notes(notes.clone());
        }
        if let Some(schema) = self.schema_text()? {
            form = form.with_schema(schema);
        }
        Ok(form)
    }

    fn schema_text(&self) -> Result<Option<String>> {
        if let Some(template) = self.template {
            return Ok(Some(SchemaTemplate::from(template).text().to_string()));
        }
        match self.schema.as_deref() {
            Some(raw) => match raw.strip_prefix('@') {
                Some(path) => fs::read_to_string(path)
                    .with_context(|| format!("reading schema file {path}"))
                    .map(Some),
                None => Ok(Some(raw.to_string())),
            },
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn research(args: &[&str]) -> ResearchArgs {
        let mut argv = vec!["research", "research"];
        argv.extend_from_slice(args);
        match Cli::parse_from(argv).command {
            Command::Research(args) => args,
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn research_flags_build_the_form() {
        let args = research(&["Acme", "--notes", "funding", "--schema", r#"{"ceo":"string"}"#]);
        let form = args.form().unwrap();
        assert_eq!(
            form,
            ResearchForm::new("Acme")
                .with_notes("funding")
                .with_schema(r#"{"ceo":"string"}"#)
        );
    }

    #[test]
    fn schema_can_come_from_a_file_or_template() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("schema.json");
        fs::write(&path, r#"{"industry":"string"}"#).unwrap();
        let arg = format!("@{}", path.display());

        let from_file = research(&["Acme", "--schema", &arg]).form().unwrap();
        assert_eq!(from_file.extraction_schema, r#"{"industry":"string"}"#);

        let from_template = research(&["Acme", "--template", "simple"]).form().unwrap();
        assert_eq!(
            from_template.extraction_schema,
            SchemaTemplate::Simple.text()
        );
    }

    #[test]
    fn schema_and_template_conflict() {
        let result = Cli::try_parse_from([
            "research", "research", "Acme", "--schema", "{}", "--template", "simple",
        ]);
        assert!(result.is_err());
    }
}
