//! Type descriptors for expressions and function signatures.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Type descriptor for expression values.
///
/// Every expression has exactly one of these, either declared (literals,
/// variables, lists) or resolved from the signature that built it.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Type {
    /// Not yet resolved.
    Unknown,
    /// 64-bit floating point.
    Double,
    /// 64-bit signed integer.
    Int,
    /// 64-bit unsigned integer.
    Uint,
    /// Boolean.
    Bool,
    /// UTF-8 string.
    String,
    /// Byte string.
    Bytes,
    /// Homogeneous list of doubles.
    DoubleList,
    /// Homogeneous list of signed integers.
    IntList,
    /// Homogeneous list of unsigned integers.
    UintList,
    /// Homogeneous list of booleans.
    BoolList,
    /// Homogeneous list of strings.
    StringList,
    /// Homogeneous list of byte strings.
    BytesList,
}

impl Type {
    /// The scalar types, in code order.
    pub const SINGLES: [Type; 6] = [
        Type::Double,
        Type::Int,
        Type::Uint,
        Type::Bool,
        Type::String,
        Type::Bytes,
    ];

    /// Returns the numeric code of this type.
    ///
    /// Scalars are in the 100 range and lists in the 200 range, with a
    /// list's code being its element's code plus 100.
    #[must_use]
    pub const fn code(self) -> i32 {
        match self {
            Self::Unknown => 0,
            Self::Double => 101,
            Self::Int => 103,
            Self::Uint => 104,
            Self::Bool => 108,
            Self::String => 109,
            Self::Bytes => 112,
            Self::DoubleList => 201,
            Self::IntList => 203,
            Self::UintList => 204,
            Self::BoolList => 208,
            Self::StringList => 209,
            Self::BytesList => 212,
        }
    }

    /// Looks a type up by its numeric code.
    #[must_use]
    pub const fn from_code(code: i32) -> Option<Self> {
        Some(match code {
            0 => Self::Unknown,
            101 => Self::Double,
            103 => Self::Int,
            104 => Self::Uint,
            108 => Self::Bool,
            109 => Self::String,
            112 => Self::Bytes,
            201 => Self::DoubleList,
            203 => Self::IntList,
            204 => Self::UintList,
            208 => Self::BoolList,
            209 => Self::StringList,
            212 => Self::BytesList,
            _ => return None,
        })
    }

    /// Returns true for the homogeneous list types.
    #[must_use]
    pub const fn is_list(self) -> bool {
        matches!(
            self,
            Self::DoubleList
                | Self::IntList
                | Self::UintList
                | Self::BoolList
                | Self::StringList
                | Self::BytesList
        )
    }

    /// Returns true for the six scalar types.
    #[must_use]
    pub const fn is_single(self) -> bool {
        !self.is_list() && !matches!(self, Self::Unknown)
    }

    /// Returns the list type whose elements are of this type.
    #[must_use]
    pub const fn list_of(self) -> Option<Self> {
        Some(match self {
            Self::Double => Self::DoubleList,
            Self::Int => Self::IntList,
            Self::Uint => Self::UintList,
            Self::Bool => Self::BoolList,
            Self::String => Self::StringList,
            Self::Bytes => Self::BytesList,
            _ => return None,
        })
    }

    /// Returns the element type of a list type.
    #[must_use]
    pub const fn element(self) -> Option<Self> {
        Some(match self {
            Self::DoubleList => Self::Double,
            Self::IntList => Self::Int,
            Self::UintList => Self::Uint,
            Self::BoolList => Self::Bool,
            Self::StringList => Self::String,
            Self::BytesList => Self::Bytes,
            _ => return None,
        })
    }

    /// Returns the surface-syntax keyword for this type (`int`, `[]byte`, ...).
    #[must_use]
    pub const fn keyword(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Double => "double",
            Self::Int => "int",
            Self::Uint => "uint",
            Self::Bool => "bool",
            Self::String => "string",
            Self::Bytes => "[]byte",
            Self::DoubleList => "[]double",
            Self::IntList => "[]int",
            Self::UintList => "[]uint",
            Self::BoolList => "[]bool",
            Self::StringList => "[]string",
            Self::BytesList => "[][]byte",
        }
    }

    /// Parses a surface-syntax type keyword.
    #[must_use]
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Some(match keyword {
            "double" => Self::Double,
            "int" => Self::Int,
            "uint" => Self::Uint,
            "bool" => Self::Bool,
            "string" => Self::String,
            "[]byte" => Self::Bytes,
            "[]double" => Self::DoubleList,
            "[]int" => Self::IntList,
            "[]uint" => Self::UintList,
            "[]bool" => Self::BoolList,
            "[]string" => Self::StringList,
            "[][]byte" => Self::BytesList,
            _ => return None,
        })
    }
}

impl fmt::Debug for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
