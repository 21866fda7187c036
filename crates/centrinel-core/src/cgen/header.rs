//! The inclusion-point header.
//!
//! Included at the top of every translation unit the analyzer processes, ahead
//! of any use of the `__sync_*` built-ins or the managed-region attribute.

use std::fmt::Write as _;

use centrinel_membrane::RegionId;

use super::expand::{Operands, TempNames, expand};
use crate::config::ShimConfig;
use crate::sentinel::{FeatureSentinels, SYNC_ATOMICS_MACRO};
use crate::sync::SyncBuiltin;

pub const INCLUDE_GUARD: &str = "__CENTRINEL_CENTRINEL_H";
pub const MANAGED_REGION_MACRO: &str = "__CENTRINEL_MANAGED_REGION";
pub const MANAGED_ATTR_MACRO: &str = "__CENTRINEL_MANAGED_ATTR";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderOptions {
    pub sentinels: FeatureSentinels,
    pub managed_region: RegionId,
}

impl HeaderOptions {
    #[must_use]
    pub fn from_config(config: &ShimConfig) -> Self {
        Self {
            sentinels: FeatureSentinels {
                sync_atomics: config.normalize_atomics,
                ..FeatureSentinels::build()
            },
            managed_region: config.managed_region,
        }
    }
}

impl Default for HeaderOptions {
    fn default() -> Self {
        Self::from_config(&ShimConfig::default())
    }
}

/// `__region(N)`: the attribute argument naming a region.
#[must_use]
pub fn region_attribute(region: RegionId) -> String {
    format!("__region({})", region.get())
}

/// Parameter list of the header macro for `builtin`.
fn macro_params(builtin: SyncBuiltin) -> &'static str {
    match builtin.operand_count() {
        0 => "...",
        1 => "ptr,...",
        2 => "ptr,value,...",
        _ => "ptr,oldval,newval,...",
    }
}

/// `#define` line replacing `builtin`.
#[must_use]
pub fn builtin_macro(builtin: SyncBuiltin) -> String {
    let values: &[&str] = match builtin.operand_count() {
        2 => &["value"],
        3 => &["oldval", "newval"],
        _ => &[],
    };
    let operands = Operands {
        ptr: "ptr",
        ptr_type: "ptr",
        values,
    };
    let body = expand(builtin, operands, &TempNames::fixed()).unwrap_or_default();
    format!(
        "#define {}({}) {}",
        builtin.c_name(),
        macro_params(builtin),
        body
    )
}

/// Render the header text.
#[must_use]
pub fn render_header(options: &HeaderOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "/* Centrinel shim: include before any other header. */");
    let _ = writeln!(out, "#ifndef {INCLUDE_GUARD}");
    let _ = writeln!(out, "#define {INCLUDE_GUARD}");
    out.push('\n');
    for line in options.sentinels.directives() {
        out.push_str(&line);
        out.push('\n');
    }
    out.push('\n');
    let _ = writeln!(
        out,
        "/* Structs tagged with this attribute may not be accessed raw. */"
    );
    let _ = writeln!(
        out,
        "#define {MANAGED_REGION_MACRO} {}",
        region_attribute(options.managed_region)
    );
    let _ = writeln!(
        out,
        "#define {MANAGED_ATTR_MACRO} __attribute__(({MANAGED_REGION_MACRO}))"
    );
    out.push('\n');
    let _ = writeln!(out, "#ifdef {SYNC_ATOMICS_MACRO}");
    let _ = writeln!(
        out,
        "/* Non-atomic stand-ins for the legacy __sync built-ins. Analysis only. */"
    );
    for builtin in SyncBuiltin::ALL {
        out.push_str(&builtin_macro(builtin));
        out.push('\n');
    }
    let _ = writeln!(out, "#endif /* {SYNC_ATOMICS_MACRO} */");
    out.push('\n');
    let _ = writeln!(out, "#endif /* {INCLUDE_GUARD} */");
    out
}
