//! C expansions of the normalized built-ins.
//!
//! Every expansion evaluates the pointer argument in exactly one initializer.
//! The pointer's only other occurrence is inside `typeof`, which does not
//! evaluate its operand. Value arguments appear exactly once.

use crate::sync::{SyncBuiltin, UpdateOp};

/// Names of the temporaries an expansion declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempNames {
    pub ptr: String,
    pub tmp: String,
}

impl TempNames {
    /// Names used by the header macros.
    #[must_use]
    pub fn fixed() -> Self {
        Self {
            ptr: "__centrinel_ptr".to_string(),
            tmp: "__centrinel_tmp".to_string(),
        }
    }

    /// Per-call-site names, so nested expansions never shadow each other.
    #[must_use]
    pub fn numbered(n: usize) -> Self {
        Self {
            ptr: format!("__centrinel_ptr_{n}"),
            tmp: format!("__centrinel_tmp_{n}"),
        }
    }
}

/// Operand texts for one expansion.
#[derive(Debug, Clone, Copy)]
pub struct Operands<'a> {
    /// Pointer argument as evaluated in the initializer.
    pub ptr: &'a str,
    /// Pointer argument as written inside `typeof`; must be single-line.
    pub ptr_type: &'a str,
    /// Remaining required arguments, in order.
    pub values: &'a [&'a str],
}

/// Expansion text for `builtin`, or `None` if `operands` is short.
#[must_use]
pub fn expand(builtin: SyncBuiltin, operands: Operands<'_>, names: &TempNames) -> Option<String> {
    let needed = builtin.operand_count().saturating_sub(1);
    if operands.values.len() < needed {
        return None;
    }
    let Operands {
        ptr,
        ptr_type,
        values,
    } = operands;
    let TempNames { ptr: p, tmp: t } = names;
    let bind_ptr = format!("typeof(({ptr_type})) {p} = ({ptr});");
    let bind_tmp = format!("typeof(*{p}) {t} = *{p};");

    let text = match builtin {
        SyncBuiltin::FetchAndOp(op) => {
            let value = values[0];
            let update = match op.compound_assign() {
                Some(assign) => format!("*{p} {assign} ({value});"),
                None => format!("*{p} = ~({t} & ({value}));"),
            };
            format!("({{ {bind_ptr} {bind_tmp} {update} {t}; }})")
        }
        SyncBuiltin::OpAndFetch(UpdateOp::Nand) => {
            let value = values[0];
            format!("({{ {bind_ptr} *{p} = ~(*{p} & ({value})); *{p}; }})")
        }
        SyncBuiltin::OpAndFetch(op) => {
            let assign = op.compound_assign().unwrap_or("=");
            format!("(*({ptr}) {assign} ({}))", values[0])
        }
        SyncBuiltin::BoolCompareAndSwap => format!(
            "({{ {bind_ptr} (*{p} == ({})) ? ((*{p} = ({})), 1) : 0; }})",
            values[0], values[1]
        ),
        SyncBuiltin::ValCompareAndSwap => format!(
            "({{ {bind_ptr} {bind_tmp} if ({t} == ({})) {{ *{p} = ({}); }} {t}; }})",
            values[0], values[1]
        ),
        SyncBuiltin::Synchronize => "((void)0)".to_string(),
        SyncBuiltin::LockTestAndSet => format!(
            "({{ {bind_ptr} {bind_tmp} *{p} = ({}); {t}; }})",
            values[0]
        ),
        SyncBuiltin::LockRelease => format!("((void)(*({ptr}) = 0))"),
    };
    Some(text)
}
