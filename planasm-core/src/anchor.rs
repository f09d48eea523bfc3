//! Anchor kinds and the per-run anchor counter set
//!
//! Every extension declaration allocates a small integer anchor that the
//! rest of the plan references in place of the full definition. Four
//! independent counters exist, one per anchor kind. Default allocation
//! pre-increments the counter (the first allocated value is 1); an
//! explicit override forces the allocated value and makes subsequent
//! defaults continue from there.

use crate::error::AnchorError;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

// ============================================================================
// ANCHOR KINDS
// ============================================================================

/// The four anchor namespaces of a plan document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnchorKind {
    Uri,
    Function,
    Type,
    TypeVariation,
}

impl AnchorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            AnchorKind::Uri => "uri",
            AnchorKind::Function => "function",
            AnchorKind::Type => "type",
            AnchorKind::TypeVariation => "type_variation",
        }
    }

    fn index(self) -> usize {
        match self {
            AnchorKind::Uri => 0,
            AnchorKind::Function => 1,
            AnchorKind::Type => 2,
            AnchorKind::TypeVariation => 3,
        }
    }
}

impl fmt::Display for AnchorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The three extension-declaration kinds carried in the `extensions` array.
///
/// URIs are declared separately (`extension_uris`), so this is a strict
/// subset of [`AnchorKind`] with the wire names attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExtensionKind {
    Function,
    Type,
    TypeVariation,
}

impl ExtensionKind {
    pub const ALL: [ExtensionKind; 3] = [
        ExtensionKind::Function,
        ExtensionKind::Type,
        ExtensionKind::TypeVariation,
    ];

    pub fn anchor_kind(self) -> AnchorKind {
        match self {
            ExtensionKind::Function => AnchorKind::Function,
            ExtensionKind::Type => AnchorKind::Type,
            ExtensionKind::TypeVariation => AnchorKind::TypeVariation,
        }
    }

    /// Statement keyword in the textual syntax.
    pub fn keyword(self) -> &'static str {
        match self {
            ExtensionKind::Function => "function",
            ExtensionKind::Type => "type",
            ExtensionKind::TypeVariation => "type_variation",
        }
    }

    /// The oneof tag wrapping this kind's entry in the `extensions` array.
    pub fn tag(self) -> &'static str {
        match self {
            ExtensionKind::Function => "extensionFunction",
            ExtensionKind::Type => "extensionType",
            ExtensionKind::TypeVariation => "extensionTypeVariation",
        }
    }

    /// Key holding this kind's anchor inside the tagged entry.
    pub fn anchor_key(self) -> &'static str {
        match self {
            ExtensionKind::Function => "functionAnchor",
            ExtensionKind::Type => "typeAnchor",
            ExtensionKind::TypeVariation => "typeVariationAnchor",
        }
    }

    /// Prefix used when synthesizing identifiers during disassembly.
    pub fn ident_prefix(self) -> &'static str {
        match self {
            ExtensionKind::Function => "fn",
            ExtensionKind::Type => "typ",
            ExtensionKind::TypeVariation => "tv",
        }
    }
}

impl fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

// ============================================================================
// ANCHOR COUNTERS
// ============================================================================

/// The four anchor counters of one assembly run.
///
/// Tracks every allocated value so that an override can never silently
/// alias an earlier allocation of the same kind.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnchorCounters {
    counters: [u32; 4],
    allocated: [HashSet<u32>; 4],
}

impl AnchorCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate the next anchor of the given kind.
    ///
    /// Without an override the counter is pre-incremented and its new value
    /// allocated, so the first default allocation yields 1. With an
    /// override the counter is set so the allocation yields exactly the
    /// requested value and later defaults continue from there. Allocating
    /// a value already taken for this kind is an error, as is running the
    /// counter past `u32::MAX`.
    pub fn allocate(
        &mut self,
        kind: AnchorKind,
        override_anchor: Option<u32>,
    ) -> Result<u32, AnchorError> {
        let slot = kind.index();
        let anchor = match override_anchor {
            Some(n) => {
                self.counters[slot] = n;
                n
            }
            None => {
                let next = self.counters[slot]
                    .checked_add(1)
                    .ok_or(AnchorError::Exhausted { kind })?;
                self.counters[slot] = next;
                next
            }
        };
        if !self.allocated[slot].insert(anchor) {
            return Err(AnchorError::Collision { kind, anchor });
        }
        Ok(anchor)
    }
}

// ============================================================================
// TESTS
// ============================================================================


#[cfg(test)]
mod prop_tests {
    use super::*;
    use proptest::prelude::*;

    fn arb_kind() -> impl Strategy<Value = AnchorKind> {
        prop_oneof![
            Just(AnchorKind::Uri),
            Just(AnchorKind::Function),
            Just(AnchorKind::Type),
            Just(AnchorKind::TypeVariation),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Successful allocations of one kind never repeat a value.
        #[test]
        fn prop_allocations_are_unique(
            kind in arb_kind(),
            overrides in prop::collection::vec(prop::option::of(0u32..64), 1..32),
        ) {
            let mut counters = AnchorCounters::new();
            let mut seen = std::collections::HashSet::new();
            for override_anchor in overrides {
                if let Ok(anchor) = counters.allocate(kind, override_anchor) {
                    prop_assert!(seen.insert(anchor));
                }
            }
        }

        /// A default allocation right after an override yields override + 1
        /// whenever that value is still free.
        #[test]
        fn prop_default_follows_override(kind in arb_kind(), forced in 0u32..1000) {
            let mut counters = AnchorCounters::new();
            prop_assert_eq!(counters.allocate(kind, Some(forced)), Ok(forced));
            prop_assert_eq!(counters.allocate(kind, None), Ok(forced + 1));
        }
    }
}
