//! Command families exposed by `cargo xtask`.

pub mod index;
pub mod validate;

use crate::runtime::error::{XtaskError, XtaskResult};
use std::path::PathBuf;

/// Value following `flag`, or a validation error naming the flag.
pub(crate) fn flag_value<'a, I>(args: &mut I, flag: &str) -> XtaskResult<String>
where
    I: Iterator<Item = &'a String>,
{
    args.next()
        .cloned()
        .ok_or_else(|| XtaskError::validation(format!("missing value for `{flag}`")))
}

/// Parse a `--root <dir>` value.
pub(crate) fn root_value<'a, I>(args: &mut I) -> XtaskResult<PathBuf>
where
    I: Iterator<Item = &'a String>,
{
    flag_value(args, "--root").map(PathBuf::from)
}
