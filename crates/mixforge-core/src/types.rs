//! Type identities for values in the object model.
//!
//! Every value has a [`ValueType`]: either one of the closed set of builtin
//! kinds or a user class described by a [`ClassDef`]. Types are keyed by a
//! [`TypeKey`] (module path + qualified name), which is also the stable tag
//! embedded in serialized blobs.

use std::fmt;
use std::sync::Arc;

use crate::class::ClassDef;
use crate::error::{ModelError, Result};
use crate::ident::check_dotted_path;

/// Module that owns every builtin kind.
pub const BUILTINS_MODULE: &str = "builtins";

/// Stable identity of a type: defining module plus qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeKey {
    module: String,
    name: String,
}

impl TypeKey {
    /// Create a key without validation.
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            name: name.into(),
        }
    }

    /// Create a key, checking that both parts are dotted identifiers.
    pub fn checked(module: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let key = Self::new(module, name);
        check_dotted_path(&key.module)?;
        check_dotted_path(&key.name)?;
        Ok(key)
    }

    /// Parse a `module:name` tag.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidIdentifier` if the tag has no `:` separator
    /// or either side is not a dotted identifier.
    pub fn parse(tag: &str) -> Result<Self> {
        let (module, name) = tag
            .split_once(':')
            .ok_or_else(|| ModelError::InvalidIdentifier(tag.to_string()))?;
        Self::checked(module.trim(), name.trim())
    }

    /// Key of a builtin kind.
    pub fn builtin(kind: BuiltinKind) -> Self {
        Self::new(BUILTINS_MODULE, kind.name())
    }

    /// Defining module path.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Qualified type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The `module:name` tag.
    pub fn tag(&self) -> String {
        format!("{}:{}", self.module, self.name)
    }

    /// The builtin kind this key names, if any.
    pub fn as_builtin(&self) -> Option<BuiltinKind> {
        if self.module == BUILTINS_MODULE {
            BuiltinKind::from_name(&self.name)
        } else {
            None
        }
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.module, self.name)
    }
}

/// The closed set of builtin value kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BuiltinKind {
    /// The `None` value
    NoneType,
    /// Booleans
    Bool,
    /// 64-bit signed integers
    Int,
    /// 64-bit floats
    Float,
    /// UTF-8 strings
    Str,
    /// Byte strings
    Bytes,
    /// Calendar dates
    Date,
    /// UTC timestamps
    DateTime,
    /// UUIDs
    Uuid,
    /// Filesystem paths
    Path,
    /// Base of every enumeration class
    Enum,
    /// Types used as values
    Type,
    /// Named callables
    Callable,
    /// Mutable ordered sequences
    List,
    /// Immutable ordered sequences
    Tuple,
    /// Mutable unordered collections
    Set,
    /// Immutable unordered collections
    FrozenSet,
    /// Mappings
    Dict,
}

impl BuiltinKind {
    /// Every builtin kind.
    pub const ALL: [BuiltinKind; 18] = [
        Self::NoneType,
        Self::Bool,
        Self::Int,
        Self::Float,
        Self::Str,
        Self::Bytes,
        Self::Date,
        Self::DateTime,
        Self::Uuid,
        Self::Path,
        Self::Enum,
        Self::Type,
        Self::Callable,
        Self::List,
        Self::Tuple,
        Self::Set,
        Self::FrozenSet,
        Self::Dict,
    ];

    /// Name used in type keys and error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::NoneType => "NoneType",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Str => "str",
            Self::Bytes => "bytes",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Uuid => "uuid",
            Self::Path => "path",
            Self::Enum => "Enum",
            Self::Type => "type",
            Self::Callable => "callable",
            Self::List => "list",
            Self::Tuple => "tuple",
            Self::Set => "set",
            Self::FrozenSet => "frozenset",
            Self::Dict => "dict",
        }
    }

    /// Inverse of [`BuiltinKind::name`].
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    /// Type key under the builtins module.
    pub fn key(self) -> TypeKey {
        TypeKey::builtin(self)
    }
}

/// The type of a value.
#[derive(Debug, Clone)]
pub enum ValueType {
    /// A builtin kind
    Builtin(BuiltinKind),
    /// A user class (including enumeration classes)
    Class(Arc<ClassDef>),
}

impl ValueType {
    /// Key of the concrete type.
    pub fn key(&self) -> TypeKey {
        match self {
            Self::Builtin(kind) => kind.key(),
            Self::Class(class) => class.key().clone(),
        }
    }

    /// Qualified name of the concrete type.
    pub fn name(&self) -> &str {
        match self {
            Self::Builtin(kind) => kind.name(),
            Self::Class(class) => class.name(),
        }
    }

    /// The concrete key followed by every ancestor key.
    ///
    /// Enumeration classes implicitly descend from the builtin `Enum`.
    pub fn ancestry(&self) -> Vec<TypeKey> {
        match self {
            Self::Builtin(kind) => vec![kind.key()],
            Self::Class(class) => {
                let mut keys = class.mro().to_vec();
                if class.is_enum() {
                    keys.push(BuiltinKind::Enum.key());
                }
                keys
            }
        }
    }
}

impl PartialEq for ValueType {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
