use crate::entities::EscapeMode;
use crate::errors::{Error, Result};
use crate::processor::{FileResult, ProcessSummary};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Defines the possible output formats for a run report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// A simple, human-readable text format.
    #[default]
    Text,
    /// JSON format, suitable for machine processing.
    Json,
    /// Comma-Separated Values format.
    Csv,
}

impl From<&str> for OutputFormat {
    fn from(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "csv" => OutputFormat::Csv,
            _ => OutputFormat::Text,
        }
    }
}

/// Renders a `ProcessSummary` in one of the supported formats.
pub struct OutputFormatter {
    format: OutputFormat,
    mode: EscapeMode,
    dry_run: bool,
    verbose: bool,
    base_dir: Option<PathBuf>,
    tool_name: String,
    tool_version: String,
}

impl OutputFormatter {
    /// Creates a new `OutputFormatter`.
    ///
    /// `verbose` only affects the text format, which then lists every file
    /// before the totals.
    pub fn new(format: OutputFormat, mode: EscapeMode, dry_run: bool, verbose: bool) -> Self {
        Self {
            format,
            mode,
            dry_run,
            verbose,
            base_dir: None,
            tool_name: "html-fixer".to_string(),
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Paths under `dir` are printed relative to it.
    pub fn with_base_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.base_dir = Some(dir.into());
        self
    }

    /// Writes the formatted report to a given writer.
    pub fn write_summary<W: Write>(&self, writer: &mut W, summary: &ProcessSummary) -> Result<()> {
        let output = match self.format {
            OutputFormat::Text => self.format_text(summary),
            OutputFormat::Json => self.format_json(summary)?,
            OutputFormat::Csv => self.format_csv(summary)?,
        };

        writer.write_all(output.as_bytes())?;
        Ok(())
    }

    fn display_path(&self, path: &Path) -> String {
        self.base_dir
            .as_deref()
            .and_then(|base| path.strip_prefix(base).ok())
            .unwrap_or(path)
            .display()
            .to_string()
    }

    fn format_file_line(&self, file: &FileResult) -> String {
        let path = self.display_path(&file.path);
        match (file.escape_result(), file.error()) {
            (Some(result), _) if result.has_changes => format!(
                "{}: {} {} entities",
                path,
                if self.dry_run { "would fix" } else { "fixed" },
                result.escaped_count
            ),
            (Some(_), _) => format!("{path}: no changes needed"),
            (None, error) => format!("{}: {}", path, error.unwrap_or("unknown error")),
        }
    }

    /// Formats the summary as plain text.
    fn format_text(&self, summary: &ProcessSummary) -> String {
        if summary.total_files == 0 {
            return "No files matched the provided patterns.\n".to_string();
        }

        let mut output = String::new();

        if self.verbose {
            for file in &summary.files {
                output.push_str(&self.format_file_line(file));
                output.push('\n');
            }
            output.push('\n');
        }

        output.push_str(&format!("{}\n", "-".repeat(50)));
        output.push_str(&format!("Files scanned      : {}\n", summary.total_files));
        output.push_str(&format!("Files with changes : {}\n", summary.files_with_changes));
        output.push_str(&format!(
            "Entities {}    : {}\n",
            if self.dry_run { "to fix" } else { "fixed " },
            summary.total_entities_escaped
        ));
        if summary.failed_files > 0 {
            output.push_str(&format!("Failed files       : {}\n", summary.failed_files));
        }

        output
    }

    /// Formats the summary into a structured JSON document.
    fn format_json(&self, summary: &ProcessSummary) -> Result<String> {
        #[derive(Serialize)]
        struct JsonOutput<'a> {
            tool: ToolInfo<'a>,
            generated_at: DateTime<Utc>,
            mode: EscapeMode,
            dry_run: bool,
            summary: Totals,
            files: Vec<JsonFile<'a>>,
        }

        #[derive(Serialize)]
        struct ToolInfo<'a> {
            name: &'a str,
            version: &'a str,
        }

        #[derive(Serialize)]
        struct Totals {
            total_files: usize,
            files_with_changes: usize,
            total_entities_escaped: usize,
            failed_files: usize,
        }

        #[derive(Serialize)]
        struct JsonFile<'a> {
            path: String,
            success: bool,
            escaped_count: usize,
            has_changes: bool,
            #[serde(skip_serializing_if = "Option::is_none")]
            error: Option<&'a str>,
        }

        let output = JsonOutput {
            tool: ToolInfo {
                name: &self.tool_name,
                version: &self.tool_version,
            },
            generated_at: Utc::now(),
            mode: self.mode,
            dry_run: self.dry_run,
            summary: Totals {
                total_files: summary.total_files,
                files_with_changes: summary.files_with_changes,
                total_entities_escaped: summary.total_entities_escaped,
                failed_files: summary.failed_files,
            },
            files: summary
                .files
                .iter()
                .map(|f| JsonFile {
                    path: self.display_path(&f.path),
                    success: f.is_success(),
                    escaped_count: f.escaped_count(),
                    has_changes: f.has_changes(),
                    error: f.error(),
                })
                .collect(),
        };

        Ok(serde_json::to_string_pretty(&output)? + "\n")
    }

    /// Formats one row per file into a CSV table.
    fn format_csv(&self, summary: &ProcessSummary) -> Result<String> {
        let mut wtr = csv::Writer::from_writer(vec![]);

        wtr.write_record(["File", "Success", "Escaped", "Changed", "Error"])?;

        for f in &summary.files {
            let path = self.display_path(&f.path);
            let success = f.is_success().to_string();
            let escaped = f.escaped_count().to_string();
            let changed = f.has_changes().to_string();
            wtr.write_record([
                path.as_str(),
                success.as_str(),
                escaped.as_str(),
                changed.as_str(),
                f.error().unwrap_or(""),
            ])?;
        }

        let data = wtr
            .into_inner()
            .map_err(|e| Error::Config(format!("CSV writer error: {e}")))?;
        Ok(String::from_utf8_lossy(&data).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::escaper::escape;

    fn create_test_summary() -> ProcessSummary {
        vec![
            FileResult {
                path: PathBuf::from("/project/src/page.html"),
                outcome: Ok(escape("<p>Tom & Jerry</p>", EscapeMode::Essential)),
            },
            FileResult {
                path: PathBuf::from("/project/src/clean.ts"),
                outcome: Ok(escape("const x = 1;", EscapeMode::Essential)),
            },
            FileResult {
                path: PathBuf::from("/project/src/locked.jsx"),
                outcome: Err("Reading /project/src/locked.jsx failed: permission denied".to_string()),
            },
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_text_summary() {
        let formatter = OutputFormatter::new(OutputFormat::Text, EscapeMode::Essential, false, false);

        let output = formatter.format_text(&create_test_summary());

        assert!(output.contains("Files scanned      : 3"));
        assert!(output.contains("Files with changes : 1"));
        assert!(output.contains("Entities fixed     : 5"));
        assert!(output.contains("Failed files       : 1"));
        assert!(!output.contains("page.html"));
    }

    #[test]
    fn test_verbose_text_lists_files() {
        let formatter = OutputFormatter::new(OutputFormat::Text, EscapeMode::Essential, true, true)
            .with_base_dir("/project");

        let output = formatter.format_text(&create_test_summary());

        assert!(output.contains("src/page.html: would fix 5 entities"));
        assert!(output.contains("src/clean.ts: no changes needed"));
        assert!(output.contains("src/locked.jsx: Reading"));
        assert!(output.contains("Entities to fix    : 5"));
    }

    #[test]
    fn test_text_without_files() {
        let formatter = OutputFormatter::new(OutputFormat::Text, EscapeMode::Essential, false, true);

        let output = formatter.format_text(&ProcessSummary::default());

        assert_eq!(output, "No files matched the provided patterns.\n");
    }

    #[test]
    fn test_json_format() {
        let formatter = OutputFormatter::new(OutputFormat::Json, EscapeMode::Extended, true, false);

        let output = formatter.format_json(&create_test_summary()).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();

        assert_eq!(parsed["tool"]["name"], "html-fixer");
        assert_eq!(parsed["mode"], "extended");
        assert_eq!(parsed["dry_run"], true);
        assert_eq!(parsed["summary"]["total_files"], 3);
        assert_eq!(parsed["summary"]["total_entities_escaped"], 5);
        assert_eq!(parsed["files"][0]["escaped_count"], 5);
        assert!(parsed["files"][0].get("error").is_none());
        assert_eq!(parsed["files"][2]["success"], false);
    }

    #[test]
    fn test_csv_format() {
        let formatter = OutputFormatter::new(OutputFormat::Csv, EscapeMode::Essential, false, false);

        let output = formatter.format_csv(&create_test_summary()).unwrap();

        let mut rdr = csv::Reader::from_reader(output.as_bytes());
        let headers = rdr.headers().unwrap();
        assert_eq!(headers.get(0), Some("File"));

        let records: Vec<_> = rdr
            .records()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].get(2), Some("5"));
        assert_eq!(records[2].get(1), Some("false"));
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!(OutputFormat::from("JSON"), OutputFormat::Json);
        assert_eq!(OutputFormat::from("csv"), OutputFormat::Csv);
        assert_eq!(OutputFormat::from("sarif"), OutputFormat::Text);
    }
}
