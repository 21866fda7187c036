//! C emission: the inclusion-point header and the call-site rewriter.

pub mod expand;
pub mod header;
pub mod rewrite;
mod scan;

pub use expand::{Operands, TempNames, expand};
pub use header::{HeaderOptions, builtin_macro, region_attribute, render_header};
pub use rewrite::{RewriteReport, Rewriter, Rewritten, SkipReason, SkippedCall, rewrite_source};
