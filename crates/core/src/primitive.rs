//! Primitive type table
//!
//! Signature entries naming one of the eight primitive value types are
//! matched here before any loading context is consulted. Arguments for a
//! primitive parameter are passed as the wrapper instances defined by the
//! process context (`std::primitive::i32` for `i32`, and so on).

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::fmt;

/// Primitive value types usable in constructor signatures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    /// `bool`
    Bool,
    /// `char`
    Char,
    /// `i8` (byte)
    I8,
    /// `i16` (short)
    I16,
    /// `i32` (int)
    I32,
    /// `i64` (long)
    I64,
    /// `f32` (float)
    F32,
    /// `f64` (double)
    F64,
}

impl PrimitiveType {
    /// Every primitive, in table order
    pub const ALL: [PrimitiveType; 8] = [
        PrimitiveType::Bool,
        PrimitiveType::Char,
        PrimitiveType::I8,
        PrimitiveType::I16,
        PrimitiveType::I32,
        PrimitiveType::I64,
        PrimitiveType::F32,
        PrimitiveType::F64,
    ];

    /// Look up a signature entry in the primitive table
    ///
    /// Matching is exact and case-sensitive.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "bool" => Some(PrimitiveType::Bool),
            "char" => Some(PrimitiveType::Char),
            "i8" => Some(PrimitiveType::I8),
            "i16" => Some(PrimitiveType::I16),
            "i32" => Some(PrimitiveType::I32),
            "i64" => Some(PrimitiveType::I64),
            "f32" => Some(PrimitiveType::F32),
            "f64" => Some(PrimitiveType::F64),
            _ => None,
        }
    }

    /// Textual name as written in signatures
    pub const fn name(self) -> &'static str {
        match self {
            PrimitiveType::Bool => "bool",
            PrimitiveType::Char => "char",
            PrimitiveType::I8 => "i8",
            PrimitiveType::I16 => "i16",
            PrimitiveType::I32 => "i32",
            PrimitiveType::I64 => "i64",
            PrimitiveType::F32 => "f32",
            PrimitiveType::F64 => "f64",
        }
    }

    /// Fully-qualified name of the wrapper type in the process context
    pub const fn wrapper_name(self) -> &'static str {
        match self {
            PrimitiveType::Bool => "std::primitive::bool",
            PrimitiveType::Char => "std::primitive::char",
            PrimitiveType::I8 => "std::primitive::i8",
            PrimitiveType::I16 => "std::primitive::i16",
            PrimitiveType::I32 => "std::primitive::i32",
            PrimitiveType::I64 => "std::primitive::i64",
            PrimitiveType::F32 => "std::primitive::f32",
            PrimitiveType::F64 => "std::primitive::f64",
        }
    }

    /// Whether a type-erased value holds this primitive
    pub fn accepts(self, value: &dyn Any) -> bool {
        match self {
            PrimitiveType::Bool => value.is::<bool>(),
            PrimitiveType::Char => value.is::<char>(),
            PrimitiveType::I8 => value.is::<i8>(),
            PrimitiveType::I16 => value.is::<i16>(),
            PrimitiveType::I32 => value.is::<i32>(),
            PrimitiveType::I64 => value.is::<i64>(),
            PrimitiveType::F32 => value.is::<f32>(),
            PrimitiveType::F64 => value.is::<f64>(),
        }
    }
}

impl fmt::Display for PrimitiveType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_table_round_trips_names() {
        for p in PrimitiveType::ALL {
            assert_eq!(PrimitiveType::from_name(p.name()), Some(p));
        }
    }

    #[test]
    fn test_wrapper_names_are_not_primitive_entries() {
        for p in PrimitiveType::ALL {
            assert_eq!(PrimitiveType::from_name(p.wrapper_name()), None);
        }
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        assert_eq!(PrimitiveType::from_name("I32"), None);
        assert_eq!(PrimitiveType::from_name("Bool"), None);
        assert_eq!(PrimitiveType::from_name(" i32"), None);
    }

    #[test]
    fn test_accepts_matching_rust_value() {
        assert!(PrimitiveType::I32.accepts(&10i32));
        assert!(!PrimitiveType::I32.accepts(&10i64));
        assert!(PrimitiveType::Char.accepts(&'x'));
        assert!(!PrimitiveType::F64.accepts(&"1.0"));
    }

    proptest! {
        #[test]
        fn prop_only_eight_names_match(name in "[a-z0-9:]{1,12}") {
            let hit = PrimitiveType::from_name(&name);
            let listed = PrimitiveType::ALL.iter().any(|p| p.name() == name);
            prop_assert_eq!(hit.is_some(), listed);
        }
    }
}
