//! Source-level normalization of `__sync_*` call sites.
//!
//! The rewriter applies the same expansions as the header macros directly to
//! C text, for analyzers that cannot take a forced include. Comments, string
//! and character literals, and preprocessor directive lines pass through
//! untouched. A rewritten call spans exactly as many lines as the original so
//! diagnostics keep pointing at the right place.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use super::expand::{Operands, TempNames, expand};
use super::scan::{
    at_line_start, count_newlines, directive_end, drop_line_comments, find_directive, flatten,
    is_ident_continue, is_ident_start, skip_number, skip_trivia, skip_whitespace, split_args,
};
use crate::config::ShimConfig;
use crate::sync::SyncBuiltin;

/// Why a call site was left as written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    /// Fewer arguments than the built-in requires.
    Arity { expected: usize, found: usize },
    /// No closing parenthesis before end of input.
    Unterminated,
    /// A preprocessor directive sits inside the argument list.
    Directive { line: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Arity { expected, found } => {
                write!(f, "expected {expected} argument(s), found {found}")
            }
            Self::Unterminated => f.write_str("unterminated argument list"),
            Self::Directive { line } => {
                write!(f, "preprocessor directive at line {line} inside the argument list")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedCall {
    /// 1-based line of the built-in's name.
    pub line: usize,
    pub builtin: &'static str,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RewriteReport {
    /// Normalizer disabled; the text was returned unchanged.
    pub passthrough: bool,
    /// Rewritten call sites per built-in name.
    pub rewritten: BTreeMap<&'static str, usize>,
    pub skipped: Vec<SkippedCall>,
}

impl RewriteReport {
    #[must_use]
    pub fn total_rewritten(&self) -> usize {
        self.rewritten.values().sum()
    }

    #[must_use]
    pub fn count(&self, builtin: SyncBuiltin) -> usize {
        self.rewritten.get(builtin.c_name()).copied().unwrap_or(0)
    }

    fn record(&mut self, builtin: SyncBuiltin) {
        *self.rewritten.entry(builtin.c_name()).or_insert(0) += 1;
    }

    fn skip(&mut self, line: usize, builtin: SyncBuiltin, reason: SkipReason) {
        self.skipped.push(SkippedCall {
            line,
            builtin: builtin.c_name(),
            reason,
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rewritten {
    pub text: String,
    pub report: RewriteReport,
}

/// Stateful rewriter. Temporary names stay unique across every source
/// rewritten by the same instance.
#[derive(Debug)]
pub struct Rewriter {
    config: ShimConfig,
    next_site: usize,
}

impl Rewriter {
    #[must_use]
    pub fn new(config: ShimConfig) -> Self {
        Self {
            config,
            next_site: 0,
        }
    }

    #[must_use]
    pub fn config(&self) -> &ShimConfig {
        &self.config
    }

    pub fn rewrite(&mut self, source: &str) -> Rewritten {
        let mut report = RewriteReport::default();
        if !self.config.normalize_atomics {
            report.passthrough = true;
            return Rewritten {
                text: source.to_string(),
                report,
            };
        }
        let text = self.rewrite_text(source, 1, &mut report);
        Rewritten { text, report }
    }

    fn rewrite_text(&mut self, text: &str, first_line: usize, report: &mut RewriteReport) -> String {
        let bytes = text.as_bytes();
        let mut out = String::with_capacity(text.len());
        let mut copied = 0;
        let mut i = 0;
        while i < bytes.len() {
            if let Some(next) = skip_trivia(bytes, i) {
                i = next;
                continue;
            }
            let b = bytes[i];
            if b == b'#' && at_line_start(bytes, i) {
                i = directive_end(bytes, i);
                continue;
            }
            if b.is_ascii_digit() {
                i = skip_number(bytes, i);
                continue;
            }
            if !is_ident_start(b) {
                i += 1;
                continue;
            }

            let start = i;
            while i < bytes.len() && is_ident_continue(bytes[i]) {
                i += 1;
            }
            let Some(builtin) = SyncBuiltin::from_c_name(&text[start..i]) else {
                continue;
            };
            let open = skip_whitespace(bytes, i);
            if bytes.get(open) != Some(&b'(') {
                continue;
            }
            let line = first_line + count_newlines(&text[..start]);
            let Some((ranges, close)) = split_args(bytes, open) else {
                report.skip(line, builtin, SkipReason::Unterminated);
                continue;
            };
            if let Some(hash) = find_directive(bytes, open + 1..close) {
                let directive_line = first_line + count_newlines(&text[..hash]);
                report.skip(
                    line,
                    builtin,
                    SkipReason::Directive {
                        line: directive_line,
                    },
                );
                continue;
            }
            let expected = builtin.operand_count();
            if ranges.len() < expected {
                report.skip(
                    line,
                    builtin,
                    SkipReason::Arity {
                        expected,
                        found: ranges.len(),
                    },
                );
                continue;
            }

            let args: Vec<String> = ranges[..expected]
                .iter()
                .map(|range| {
                    let arg_line = line + count_newlines(&text[start..range.start]);
                    let inner = self.rewrite_text(&text[range.clone()], arg_line, report);
                    drop_line_comments(inner.trim()).trim().to_string()
                })
                .collect();
            let ptr = args.first().map_or("", String::as_str);
            let ptr_type = flatten(ptr);
            let values: Vec<&str> = args.iter().skip(1).map(String::as_str).collect();
            let names = TempNames::numbered(self.next_site);
            let operands = Operands {
                ptr,
                ptr_type: &ptr_type,
                values: &values,
            };
            let Some(mut replacement) = expand(builtin, operands, &names) else {
                continue;
            };
            self.next_site += 1;

            let missing = count_newlines(&text[start..=close])
                .saturating_sub(count_newlines(&replacement));
            replacement.extend(std::iter::repeat_n('\n', missing));

            out.push_str(&text[copied..start]);
            out.push_str(&replacement);
            report.record(builtin);
            i = close + 1;
            copied = i;
        }
        out.push_str(&text[copied..]);
        out
    }
}

/// Rewrite `source` with a fresh [`Rewriter`].
#[must_use]
pub fn rewrite_source(source: &str, config: &ShimConfig) -> Rewritten {
    Rewriter::new(*config).rewrite(source)
}
