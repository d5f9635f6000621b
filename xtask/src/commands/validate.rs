//! `cargo xtask validate`: run every knowledge-base check and report the findings.

use crate::commands::{flag_value, root_value};
use crate::runtime::context::CommandContext;
use crate::runtime::error::{XtaskError, XtaskResult};
use crate::XtaskCommand;
use chrono::{SecondsFormat, Utc};
use knowledge_base::{Severity, ValidationOptions, ValidationReport};
use serde_json::{json, Value};
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

/// How issues are printed to stdout.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

impl ReportFormat {
    fn parse(value: &str) -> XtaskResult<Self> {
        match value {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(XtaskError::validation(format!(
                "unsupported report format: {other}"
            ))
            .with_hint("expected `text` or `json`")),
        }
    }
}

/// Parsed `validate` options.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ValidateOptions {
    pub root: Option<PathBuf>,
    pub check_urls: bool,
    pub format: ReportFormat,
    /// Where to write the JSON audit report, if anywhere.
    pub output: Option<PathBuf>,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            root: None,
            check_urls: true,
            format: ReportFormat::Text,
            output: None,
        }
    }
}

pub struct ValidateCommand;

impl XtaskCommand for ValidateCommand {
    type Options = ValidateOptions;

    fn parse(args: &[String]) -> XtaskResult<Self::Options> {
        let mut options = ValidateOptions::default();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--root" => options.root = Some(root_value(&mut iter)?),
                "--skip-urls" => options.check_urls = false,
                "--format" => {
                    options.format = ReportFormat::parse(&flag_value(&mut iter, "--format")?)?
                }
                "--output" => {
                    options.output = Some(PathBuf::from(flag_value(&mut iter, "--output")?))
                }
                other => {
                    return Err(XtaskError::validation(format!(
                        "unsupported `validate` argument: {other}"
                    ))
                    .with_hint(
                        "expected `[--root <dir>] [--skip-urls] [--format text|json] [--output <path>]`",
                    ))
                }
            }
        }
        Ok(options)
    }

    fn run(ctx: &CommandContext, options: Self::Options) -> XtaskResult<()> {
        let project = ctx.project(options.root.as_deref())?;
        let report = project
            .validate(&ValidationOptions {
                check_urls: options.check_urls,
            })
            .map_err(|err| XtaskError::from(err).with_operation("validate"))?;

        match options.format {
            ReportFormat::Text => print!("{}", render_text(&report)),
            ReportFormat::Json => println!("{}", render_json(&report)?),
        }

        if let Some(output) = &options.output {
            write_audit_report(project.root(), &report, output)?;
        }

        if report.has_failures() {
            return Err(XtaskError::validation("knowledge base validation failed")
                .with_operation("validate")
                .with_path(project.root()));
        }
        Ok(())
    }
}

/// Issue lines in traversal order followed by a summary.
pub fn render_text(report: &ValidationReport) -> String {
    if report.issues.is_empty() {
        return "OK\n".to_string();
    }
    let mut out = String::new();
    for issue in &report.issues {
        let _ = writeln!(out, "{issue}");
    }
    let failures = report.with_severity(Severity::Fail).count();
    let warnings = report.with_severity(Severity::Warn).count();
    let status = if failures > 0 { "FAILED" } else { "PASSED" };
    let _ = writeln!(
        out,
        "\n{status}: {failures} failure(s), {warnings} warning(s)"
    );
    out
}

/// The issue list as a JSON array.
pub fn render_json(report: &ValidationReport) -> XtaskResult<String> {
    serde_json::to_string_pretty(&report.issues)
        .map_err(|err| XtaskError::io(format!("failed to serialize issues: {err}")))
}

/// Summary document written by `--output`.
pub fn audit_report(root: &Path, report: &ValidationReport) -> Value {
    json!({
        "generated_at": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        "root": root.display().to_string(),
        "directory_count": report.directories,
        "document_count": report.documents,
        "urls_checked": report.urls_checked,
        "failure_count": report.with_severity(Severity::Fail).count(),
        "warning_count": report.with_severity(Severity::Warn).count(),
        "issue_counts_by_check": report.counts_by_check(),
        "issues": report.issues,
    })
}

fn write_audit_report(root: &Path, report: &ValidationReport, output: &Path) -> XtaskResult<()> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| {
            XtaskError::io(format!("failed to create directory: {err}")).with_path(parent)
        })?;
    }
    let body = serde_json::to_string_pretty(&audit_report(root, report))
        .map_err(|err| XtaskError::io(format!("failed to serialize report: {err}")))?;
    fs::write(output, format!("{body}\n")).map_err(|err| {
        XtaskError::io(format!("failed to write audit report: {err}")).with_path(output)
    })?;
    eprintln!("Wrote audit report: {}", output.display());
    Ok(())
}
