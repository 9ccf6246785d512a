//! Declared binding types.

use std::fmt;

/// The static type attached to a binding or parameter.
///
/// `Unknown` means "no declared type": assignments are not type-checked and
/// the binding takes whatever runtime type it is given.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum DeclType {
    Int,
    Flt,
    Str,
    Tns,
    Map,
    Func,
    Thr,
    #[default]
    Unknown,
}

impl DeclType {
    /// All declarable types, in keyword order.
    pub const KNOWN: [DeclType; 7] = [
        DeclType::Int,
        DeclType::Flt,
        DeclType::Str,
        DeclType::Tns,
        DeclType::Map,
        DeclType::Func,
        DeclType::Thr,
    ];

    /// Upper-case keyword spelling (`INT`, `FLT`, ...).
    pub const fn keyword(self) -> &'static str {
        match self {
            DeclType::Int => "INT",
            DeclType::Flt => "FLT",
            DeclType::Str => "STR",
            DeclType::Tns => "TNS",
            DeclType::Map => "MAP",
            DeclType::Func => "FUNC",
            DeclType::Thr => "THR",
            DeclType::Unknown => "UNKNOWN",
        }
    }

    /// Parse a type keyword. Returns `None` for anything that is not a
    /// declarable type.
    pub fn from_keyword(s: &str) -> Option<Self> {
        Self::KNOWN.into_iter().find(|t| t.keyword() == s)
    }

    #[inline]
    pub const fn is_known(self) -> bool {
        !matches!(self, DeclType::Unknown)
    }
}

impl fmt::Display for DeclType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}
