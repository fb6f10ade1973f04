use std::path::{Path, PathBuf};

use engine_logging::engine_info;

use crate::filename::export_filename;
use crate::output::{AtomicFileWriter, PersistError};

const PAGE_BREAK: &str = "\u{c}";

#[derive(Debug, Clone)]
pub struct ExportOptions {
    /// Body lines available on each page, title block excluded.
    pub lines_per_page: usize,
    pub wrap_width: usize,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            lines_per_page: 48,
            wrap_width: 90,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocLine {
    Heading(String),
    Text(String),
    Blank,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Page {
    /// Only the first page carries the title.
    pub header: Option<String>,
    pub lines: Vec<DocLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportDocument {
    pub title: String,
    pub pages: Vec<Page>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub page_count: usize,
    pub field_count: usize,
    pub output_path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("persist error: {0}")]
    Persist(#[from] PersistError),
}

/// Lays out `(heading, body)` pairs under `title`, breaking pages when the
/// heading or the body block no longer fits.
pub fn build_document(
    title: &str,
    fields: &[(String, String)],
    options: &ExportOptions,
) -> ExportDocument {
    let capacity = options.lines_per_page.max(2);
    let mut layout = Layout {
        pages: vec![Page {
            header: Some(title.to_string()),
            lines: Vec::new(),
        }],
        capacity,
    };

    for (heading, body) in fields {
        // A heading alone at the bottom of a page is useless.
        if layout.remaining() < 2 {
            layout.new_page();
        }
        layout.push(DocLine::Heading(heading.clone()));

        let body_lines = wrap(body, options.wrap_width);
        if body_lines.len() > layout.remaining() && body_lines.len() <= capacity {
            layout.new_page();
        }
        for line in body_lines {
            if layout.remaining() == 0 {
                layout.new_page();
            }
            layout.push(DocLine::Text(line));
        }
        if layout.remaining() > 0 {
            layout.push(DocLine::Blank);
        }
    }

    ExportDocument {
        title: title.to_string(),
        pages: layout.pages,
    }
}

impl ExportDocument {
    /// Plain-text rendering, pages separated by form feeds.
    pub fn render(&self) -> String {
        let total = self.pages.len();
        let mut pages = Vec::with_capacity(total);
        for (index, page) in self.pages.iter().enumerate() {
            let mut out = String::new();
            if let Some(header) = &page.header {
                out.push_str(header);
                out.push('\n');
                out.push_str(&"=".repeat(header.chars().count()));
                out.push_str("\n\n");
            }
            for line in &page.lines {
                match line {
                    DocLine::Heading(text) => {
                        out.push_str(text);
                        out.push('\n');
                    }
                    DocLine::Text(text) => {
                        out.push_str("  ");
                        out.push_str(text);
                        out.push('\n');
                    }
                    DocLine::Blank => out.push('\n'),
                }
            }
            out.push_str(&format!("\n-- Page {} of {} --\n", index + 1, total));
            pages.push(out);
        }
        pages.join(PAGE_BREAK)
    }
}

/// Builds the document and writes it to `dir` under a name derived from `title`.
pub fn export_document(
    dir: &Path,
    title: &str,
    fields: &[(String, String)],
    options: &ExportOptions,
) -> Result<ExportSummary, ExportError> {
    let document = build_document(title, fields, options);
    let writer = AtomicFileWriter::new(dir.to_path_buf());
    let output_path = writer.write(&export_filename(title), &document.render())?;
    engine_info!(
        "exported {} fields on {} pages to {:?}",
        fields.len(),
        document.pages.len(),
        output_path
    );
    Ok(ExportSummary {
        page_count: document.pages.len(),
        field_count: fields.len(),
        output_path,
    })
}

struct Layout {
    pages: Vec<Page>,
    capacity: usize,
}

impl Layout {
    fn current(&mut self) -> &mut Page {
        if self.pages.is_empty() {
            self.pages.push(Page::default());
        }
        let last = self.pages.len() - 1;
        &mut self.pages[last]
    }

    fn remaining(&self) -> usize {
        let used = self.pages.last().map_or(0, |page| page.lines.len());
        self.capacity.saturating_sub(used)
    }

    fn push(&mut self, line: DocLine) {
        self.current().lines.push(line);
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
    }
}

/// Greedy word wrap that keeps each paragraph's leading indentation.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let width = width.max(1);
    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let indent_len = paragraph.len() - paragraph.trim_start().len();
        let indent = &paragraph[..indent_len];
        let mut current = indent.to_string();
        let mut has_word = false;
        for word in paragraph.split_whitespace() {
            let needed = current.chars().count() + usize::from(has_word) + word.chars().count();
            if has_word && needed > width {
                lines.push(std::mem::replace(&mut current, indent.to_string()));
                has_word = false;
            }
            if has_word {
                current.push(' ');
            }
            current.push_str(word);
            has_word = true;
        }
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_keeps_indentation() {
        assert_eq!(
            wrap("{\n  \"a\": \"one two three\"\n}", 11),
            vec!["{", "  \"a\": \"one", "  two", "  three\"", "}"]
        );
    }

    #[test]
    fn line_of_exactly_the_width_is_kept_whole() {
        assert_eq!(
            wrap("  two three\"", 12),
            vec!["  two three\""]
        );
    }

    #[test]
    fn long_body_moves_to_next_page() {
        let options = ExportOptions {
            lines_per_page: 6,
            wrap_width: 80,
        };
        let fields = vec![
            ("First".to_string(), "a".to_string()),
            ("Second".to_string(), "1\n2\n3\n4".to_string()),
        ];
        let doc = build_document("Acme", &fields, &options);

        assert_eq!(doc.pages.len(), 2);
        assert_eq!(
            doc.pages[0].lines,
            vec![
                DocLine::Heading("First".into()),
                DocLine::Text("a".into()),
                DocLine::Blank,
                DocLine::Heading("Second".into()),
            ]
        );
        assert_eq!(doc.pages[1].header, None);
        assert_eq!(doc.pages[1].lines[0], DocLine::Text("1".into()));
    }

    #[test]
    fn body_longer_than_a_page_is_split() {
        let options = ExportOptions {
            lines_per_page: 3,
            wrap_width: 80,
        };
        let body = (1..=7).map(|i| i.to_string()).collect::<Vec<_>>().join("\n");
        let doc = build_document("Acme", &[("Big".to_string(), body)], &options);

        let texts: usize = doc
            .pages
            .iter()
            .flat_map(|p| &p.lines)
            .filter(|l| matches!(l, DocLine::Text(_)))
            .count();
        assert_eq!(texts, 7);
        assert!(doc.pages.iter().all(|p| p.lines.len() <= 3));
    }
}
