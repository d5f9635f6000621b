//! Top-level CLI parsing and help output.

use crate::runtime::error::{XtaskError, XtaskResult};

/// Top-level `xtask` commands.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TopLevelCommand {
    Validate(Vec<String>),
    Index(Vec<String>),
    Help,
}

/// Parse raw command-line arguments into a top-level command selection.
pub fn parse(args: Vec<String>) -> XtaskResult<TopLevelCommand> {
    let Some(cmd) = args.first().cloned() else {
        return Ok(TopLevelCommand::Help);
    };

    let rest = args[1..].to_vec();
    match cmd.as_str() {
        "validate" => Ok(TopLevelCommand::Validate(rest)),
        "index" => Ok(TopLevelCommand::Index(rest)),
        "help" | "--help" | "-h" => Ok(TopLevelCommand::Help),
        other => Err(XtaskError::validation(format!(
            "unknown xtask command: {other}"
        ))
        .with_hint("run `cargo xtask help`")),
    }
}

/// Print the canonical top-level usage text.
pub fn print_usage() {
    eprintln!(
        "Usage: cargo xtask <command> [args]\n\
         \n\
         Commands:\n\
           validate [--root <dir>] [--skip-urls] [--format text|json] [--output <path>]\n\
                              Check frontmatter, sources, related paths, and index sync\n\
           index [--root <dir>] [--check]\n\
                              Regenerate directory indexes (or fail if any is stale)\n\
           help                Show this message\n\
         \n\
         Set RUST_LOG=debug for diagnostic output on stderr.\n"
    );
}
