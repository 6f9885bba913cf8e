//! Values of the dynamic object model.
//!
//! A [`Value`] is either an inline scalar (no identity) or a reference to a
//! heap node. Two references are the *same object* exactly when their
//! [`NodeId`]s are equal; this is the identity used for cycle detection and
//! sharing preservation throughout the workspace.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use uuid::Uuid;

use crate::class::ClassDef;
use crate::heap::Heap;
use crate::types::ValueType;

/// Identity of a heap node.
///
/// Ids are handed out by a [`Heap`] and are only meaningful for that heap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub(crate) fn new(index: u32) -> Self {
        Self(index)
    }

    /// Index of the node inside its heap.
    pub fn as_u32(self) -> u32 {
        self.0
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

type CallableFn = dyn Fn(&mut Heap, &[Value]) -> anyhow::Result<Value> + Send + Sync;

/// A named function value.
///
/// Callables are opaque leaves: they are never decomposed and never
/// serialized. Dict default factories are callables invoked with no arguments.
#[derive(Clone)]
pub struct Callable {
    name: Arc<str>,
    func: Arc<CallableFn>,
}

impl Callable {
    /// Wrap a closure under a display name.
    pub fn new<F>(name: impl Into<Arc<str>>, func: F) -> Self
    where
        F: Fn(&mut Heap, &[Value]) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// A callable that ignores its arguments and returns a clone of `value`.
    ///
    /// Only meaningful for inline values; a returned reference is shared, not copied.
    pub fn constant(name: impl Into<Arc<str>>, value: Value) -> Self {
        Self::new(name, move |_, _| Ok(value.clone()))
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Invoke the callable.
    pub fn call(&self, heap: &mut Heap, args: &[Value]) -> anyhow::Result<Value> {
        (self.func)(heap, args)
    }

    /// Whether two handles wrap the same function.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<callable {}>", self.name)
    }
}

/// A member of an enumeration class.
#[derive(Debug, Clone)]
pub struct EnumMember {
    class: Arc<ClassDef>,
    name: String,
}

impl EnumMember {
    pub(crate) fn new(class: Arc<ClassDef>, name: String) -> Self {
        Self { class, name }
    }

    /// The enumeration class.
    pub fn class(&self) -> &Arc<ClassDef> {
        &self.class
    }

    /// Member name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl PartialEq for EnumMember {
    fn eq(&self, other: &Self) -> bool {
        self.class.key() == other.class.key() && self.name == other.name
    }
}

/// A value in the object model.
#[derive(Debug, Clone)]
pub enum Value {
    /// The absent value
    None,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating point number
    Float(f64),
    /// String
    Str(String),
    /// Byte string
    Bytes(Vec<u8>),
    /// Calendar date
    Date(NaiveDate),
    /// UTC timestamp
    DateTime(DateTime<Utc>),
    /// UUID
    Uuid(Uuid),
    /// Filesystem path
    Path(PathBuf),
    /// Enumeration member
    Enum(EnumMember),
    /// A type used as a value
    Type(ValueType),
    /// A function value
    Callable(Callable),
    /// Reference to a heap node
    Ref(NodeId),
}

impl Value {
    /// Convenience constructor for strings.
    pub fn str(s: impl Into<String>) -> Self {
        Self::Str(s.into())
    }

    /// Identity of the referenced node; `None` for inline values.
    pub fn node_id(&self) -> Option<NodeId> {
        match self {
            Self::Ref(id) => Some(*id),
            _ => None,
        }
    }

    /// Whether this value is a node reference.
    pub fn is_ref(&self) -> bool {
        matches!(self, Self::Ref(_))
    }

    /// Whether this is `Value::None`.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Integer payload, if any.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Float payload, if any.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// String payload, if any.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean payload, if any.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Same object: identical node ids for references, equal payloads for
    /// inline values.
    ///
    /// This is the "did anything change" test used by reconstruction.
    pub fn is_same(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Ref(a), Self::Ref(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            _ => std::mem::discriminant(self) == std::mem::discriminant(other) && self == other,
        }
    }
}

/// Shallow equality: payload equality for inline values, identity for references.
///
/// Structural comparison through the heap is [`Heap::deep_eq`].
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::None, Self::None) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Int(a), Self::Float(b)) | (Self::Float(b), Self::Int(a)) => (*a as f64) == *b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::DateTime(a), Self::DateTime(b)) => a == b,
            (Self::Uuid(a), Self::Uuid(b)) => a == b,
            (Self::Path(a), Self::Path(b)) => a == b,
            (Self::Enum(a), Self::Enum(b)) => a == b,
            (Self::Type(a), Self::Type(b)) => a == b,
            (Self::Callable(a), Self::Callable(b)) => a.ptr_eq(b),
            (Self::Ref(a), Self::Ref(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<NaiveDate> for Value {
    fn from(date: NaiveDate) -> Self {
        Self::Date(date)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(ts: DateTime<Utc>) -> Self {
        Self::DateTime(ts)
    }
}

impl From<Uuid> for Value {
    fn from(id: Uuid) -> Self {
        Self::Uuid(id)
    }
}

impl From<PathBuf> for Value {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<NodeId> for Value {
    fn from(id: NodeId) -> Self {
        Self::Ref(id)
    }
}

impl From<Callable> for Value {
    fn from(callable: Callable) -> Self {
        Self::Callable(callable)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Self::None, Into::into)
    }
}
