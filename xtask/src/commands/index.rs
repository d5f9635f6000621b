//! `cargo xtask index`: regenerate or check directory indexes.

use crate::commands::root_value;
use crate::runtime::context::CommandContext;
use crate::runtime::error::{XtaskError, XtaskResult};
use crate::XtaskCommand;
use std::path::PathBuf;

/// Parsed `index` options.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IndexOptions {
    pub root: Option<PathBuf>,
    /// Report stale indexes instead of rewriting them.
    pub check: bool,
}

pub struct IndexCommand;

impl XtaskCommand for IndexCommand {
    type Options = IndexOptions;

    fn parse(args: &[String]) -> XtaskResult<Self::Options> {
        let mut options = IndexOptions::default();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "--root" => options.root = Some(root_value(&mut iter)?),
                "--check" => options.check = true,
                other => {
                    return Err(XtaskError::validation(format!(
                        "unsupported `index` argument: {other}"
                    ))
                    .with_hint("expected `[--root <dir>] [--check]`"))
                }
            }
        }
        Ok(options)
    }

    fn run(ctx: &CommandContext, options: Self::Options) -> XtaskResult<()> {
        let project = ctx.project(options.root.as_deref())?;

        if options.check {
            let stale = project
                .stale_indexes()
                .map_err(|err| XtaskError::from(err).with_operation("index --check"))?;
            if stale.is_empty() {
                println!("OK");
                return Ok(());
            }
            for path in &stale {
                println!("[index-sync] {path} - index out of date");
            }
            println!("\nFAILED: {} stale index(es)", stale.len());
            return Err(XtaskError::validation("indexes are out of date")
                .with_operation("index --check")
                .with_hint("run `cargo xtask index` to regenerate them"));
        }

        let changed = project
            .regenerate_indexes()
            .map_err(|err| XtaskError::from(err).with_operation("index"))?;
        if changed.is_empty() {
            println!("OK: indexes up to date");
        } else {
            for path in &changed {
                println!("updated {path}");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn parses_root_and_check() {
        let options = IndexCommand::parse(&args(&["--check", "--root", "kb"])).expect("parse");
        assert_eq!(
            options,
            IndexOptions {
                root: Some(PathBuf::from("kb")),
                check: true,
            }
        );
    }

    #[test]
    fn rejects_missing_root_value_and_unknown_flags() {
        let err = IndexCommand::parse(&args(&["--root"])).expect_err("missing value");
        assert!(err.to_string().contains("missing value for `--root`"));
        let err = IndexCommand::parse(&args(&["--force"])).expect_err("unknown flag");
        assert!(err.to_string().contains("--force"));
    }

    #[test]
    fn check_fails_until_indexes_are_written() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::create_dir_all(dir.path().join("docs")).expect("mkdir");
        fs::write(
            dir.path().join("docs/a.md"),
            "---\nname: A\ndescription: First\n---\n",
        )
        .expect("write");
        let ctx = CommandContext::with_root(dir.path());
        let check = IndexOptions {
            root: None,
            check: true,
        };

        let err = IndexCommand::run(&ctx, check.clone()).expect_err("stale");
        assert!(err.to_string().contains("indexes are out of date"));

        IndexCommand::run(&ctx, IndexOptions::default()).expect("regenerate");
        IndexCommand::run(&ctx, check).expect("fresh");
    }
}
