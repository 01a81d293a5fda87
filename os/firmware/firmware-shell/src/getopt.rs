//! # Option Scanning
//!
//! One option per word: `-v` is an option, `-vq` is option `v` with the
//! attached argument `q` if `v` takes one, and option `v` otherwise.

use crate::GetOptError;

/// An option found by [`GetOpt`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opt<'a> {
    pub flag: char,
    pub arg: Option<&'a str>,
}

impl<'a> Opt<'a> {
    /// The option's argument, for options that cannot do without one.
    ///
    /// # Errors
    /// [`GetOptError::MissingArgument`] if none was given.
    pub fn required_arg(&self) -> Result<&'a str, GetOptError> {
        self.arg.ok_or(GetOptError::MissingArgument(self.flag))
    }

    /// Error for options the caller does not know.
    #[must_use]
    pub const fn unknown(&self) -> GetOptError {
        GetOptError::UnknownOption(self.flag)
    }
}

/// Scans `args` (program name first) for options.
pub struct GetOpt<'a, S> {
    args: &'a [S],
    with_args: &'a str,
    index: usize,
}

impl<'a, S: AsRef<str>> GetOpt<'a, S> {
    /// `with_args` lists the option letters that take an argument.
    #[must_use]
    pub const fn new(args: &'a [S], with_args: &'a str) -> Self {
        Self {
            args,
            with_args,
            index: 1,
        }
    }

    /// The words after the options. Meaningful once the scan is done.
    #[must_use]
    pub fn operands(&self) -> &'a [S] {
        self.args.get(self.index..).unwrap_or_default()
    }
}

impl<'a, S: AsRef<str>> Iterator for GetOpt<'a, S> {
    type Item = Opt<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let word = self.args.get(self.index)?.as_ref();
        let rest = word.strip_prefix('-')?;

        let mut chars = rest.chars();
        let Some(flag) = chars.next() else {
            // A lone dash ends the options and is consumed.
            self.index += 1;
            return None;
        };
        let attached = chars.as_str();
        self.index += 1;

        let mut arg = None;
        if self.with_args.contains(flag) {
            if !attached.is_empty() {
                arg = Some(attached);
            } else if let Some(next) = self.args.get(self.index).map(AsRef::as_ref) {
                if !next.starts_with('-') {
                    arg = Some(next);
                    self.index += 1;
                }
            }
        }

        Some(Opt { flag, arg })
    }
}
