//! Feature sentinels.
//!
//! Compile-time facts downstream code queries to detect that it is being
//! processed under the shim. In C they are preprocessor macros; here they are
//! build configuration constants.

use serde::Serialize;

use crate::config;

/// Presence marker. Spelled `__CENTRINEL__` (value 1) in C.
pub const CENTRINEL: bool = true;
/// Value of the presence macro.
pub const CENTRINEL_VALUE: i32 = 1;
/// The block-literal extension must never be assumed, even when the host
/// toolchain offers it.
pub const BLOCKS_AVAILABLE: bool = false;
/// Build default for the atomic-builtin normalizer (`sync-atomics` feature).
pub const HACK_SYNC_ATOMICS: bool = cfg!(feature = "sync-atomics");

pub const PRESENCE_MACRO: &str = "__CENTRINEL__";
pub const BLOCKS_MACRO: &str = "__BLOCKS__";
pub const SYNC_ATOMICS_MACRO: &str = "__CENTRINEL_HACK_SYNC_ATOMICS";

/// Snapshot of the sentinel facts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FeatureSentinels {
    pub centrinel: bool,
    pub blocks_available: bool,
    pub sync_atomics: bool,
}

impl FeatureSentinels {
    /// Facts fixed at build time.
    #[must_use]
    pub const fn build() -> Self {
        Self {
            centrinel: CENTRINEL,
            blocks_available: BLOCKS_AVAILABLE,
            sync_atomics: HACK_SYNC_ATOMICS,
        }
    }

    /// Build facts with the process-wide normalizer toggle applied.
    #[must_use]
    pub fn current() -> Self {
        Self {
            sync_atomics: config::sync_atomics_enabled(),
            ..Self::build()
        }
    }

    /// Answer `#ifdef name` for one of the sentinel macros. `None` for names
    /// this layer does not own.
    #[must_use]
    pub fn is_defined(&self, name: &str) -> Option<bool> {
        match name {
            PRESENCE_MACRO => Some(self.centrinel),
            BLOCKS_MACRO => Some(self.blocks_available),
            SYNC_ATOMICS_MACRO => Some(self.sync_atomics),
            _ => None,
        }
    }

    /// Preprocessor directives establishing these facts, in inclusion order.
    #[must_use]
    pub fn directives(&self) -> Vec<String> {
        let mut lines = Vec::with_capacity(3);
        if !self.blocks_available {
            lines.push(format!("#undef {BLOCKS_MACRO}"));
        }
        if self.centrinel {
            lines.push(format!("#define {PRESENCE_MACRO} {CENTRINEL_VALUE}"));
        }
        if self.sync_atomics {
            lines.push(format!("#define {SYNC_ATOMICS_MACRO} 1"));
        }
        lines
    }
}

impl Default for FeatureSentinels {
    fn default() -> Self {
        Self::build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presence_on_blocks_off() {
        let facts = FeatureSentinels::build();
        assert_eq!(facts.is_defined("__CENTRINEL__"), Some(true));
        assert_eq!(facts.is_defined("__BLOCKS__"), Some(false));
        assert_eq!(facts.is_defined("__GNUC__"), None);
    }

    #[test]
    fn directives_follow_inclusion_order() {
        let facts = FeatureSentinels {
            centrinel: true,
            blocks_available: false,
            sync_atomics: true,
        };
        assert_eq!(
            facts.directives(),
            vec![
                "#undef __BLOCKS__".to_string(),
                "#define __CENTRINEL__ 1".to_string(),
                "#define __CENTRINEL_HACK_SYNC_ATOMICS 1".to_string(),
            ]
        );
    }

    #[test]
    fn disabled_normalizer_omits_its_define() {
        let facts = FeatureSentinels {
            sync_atomics: false,
            ..FeatureSentinels::build()
        };
        assert_eq!(facts.directives().len(), 2);
        assert_eq!(facts.is_defined(SYNC_ATOMICS_MACRO), Some(false));
    }

    #[cfg(feature = "sync-atomics")]
    #[test]
    fn default_build_normalizes() {
        assert!(HACK_SYNC_ATOMICS);
        assert!(FeatureSentinels::build().sync_atomics);
    }
}
