//! Tagged value trees
//!
//! Every protocol payload is a `Value`: a closed tagged tree resembling
//! a symbolic expression. Ownership is move-only; a pair or vector owns
//! its children exclusively, so the tree invariant (no sharing, no
//! cycles) holds by construction and release is handled by `Drop`.
//!
//! Bounds-checked accessors return `Option` rather than overloading
//! `Null` as an out-of-range sentinel.

use std::ffi::CString;
use std::fmt;

use bytes::Bytes;

/// A protocol value: one node of a tagged tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// The empty list, also used by convention for absent results
    Null,
    /// Boolean
    Bool(bool),
    /// Signed 64-bit integer
    Int(i64),
    /// Cons cell; a chain of pairs ending in `Null` is a proper list
    Pair(Box<Value>, Box<Value>),
    /// Ordered sequence of owned elements
    Vector(Vec<Value>),
    /// Immutable byte sequence compared by content, not interned
    Symbol(Bytes),
    /// Byte string (not required to be UTF-8)
    Str(Bytes),
    /// Raw byte sequence
    Bytevector(Bytes),
}

impl Value {
    /// Create a pair from two owned values
    pub fn pair(head: Value, tail: Value) -> Self {
        Value::Pair(Box::new(head), Box::new(tail))
    }

    /// Create a vector from owned elements
    pub fn vector(elements: Vec<Value>) -> Self {
        Value::Vector(elements)
    }

    /// Create a symbol from a string name
    pub fn symbol(name: &str) -> Self {
        Value::Symbol(Bytes::copy_from_slice(name.as_bytes()))
    }

    /// Create a symbol from raw bytes
    pub fn symbol_bytes(bytes: impl Into<Bytes>) -> Self {
        Value::Symbol(bytes.into())
    }

    /// Create a string value
    pub fn string(text: &str) -> Self {
        Value::Str(Bytes::copy_from_slice(text.as_bytes()))
    }

    /// Create a string value from raw bytes
    pub fn string_bytes(bytes: impl Into<Bytes>) -> Self {
        Value::Str(bytes.into())
    }

    /// Create a bytevector
    pub fn bytevector(bytes: impl Into<Bytes>) -> Self {
        Value::Bytevector(bytes.into())
    }

    /// Build a proper list from owned elements.
    ///
    /// This is the only way lists are constructed incrementally; there
    /// is deliberately no public tail mutator, which would break the
    /// tree invariant.
    pub fn list<I>(elements: I) -> Self
    where
        I: IntoIterator<Item = Value>,
        I::IntoIter: DoubleEndedIterator,
    {
        elements
            .into_iter()
            .rev()
            .fold(Value::Null, |tail, head| Value::pair(head, tail))
    }

    // ---- predicates ----

    /// True for `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// True for `Bool(false)`
    pub fn is_false(&self) -> bool {
        matches!(self, Value::Bool(false))
    }

    /// True for `Bool(true)`
    pub fn is_true(&self) -> bool {
        matches!(self, Value::Bool(true))
    }

    /// True for any integer
    pub fn is_int(&self) -> bool {
        matches!(self, Value::Int(_))
    }

    /// True for a pair
    pub fn is_pair(&self) -> bool {
        matches!(self, Value::Pair(_, _))
    }

    /// True for a vector
    pub fn is_vector(&self) -> bool {
        matches!(self, Value::Vector(_))
    }

    /// True for a symbol
    pub fn is_symbol(&self) -> bool {
        matches!(self, Value::Symbol(_))
    }

    /// True for a string
    pub fn is_string(&self) -> bool {
        matches!(self, Value::Str(_))
    }

    /// True for a bytevector
    pub fn is_bytevector(&self) -> bool {
        matches!(self, Value::Bytevector(_))
    }

    /// True if this is a symbol whose name equals `name` byte for byte
    pub fn is_symbol_named(&self, name: &str) -> bool {
        matches!(self, Value::Symbol(bytes) if bytes.as_ref() == name.as_bytes())
    }

    // ---- accessors ----

    /// Head of a pair
    pub fn head(&self) -> Option<&Value> {
        match self {
            Value::Pair(head, _) => Some(head),
            _ => None,
        }
    }

    /// Tail of a pair
    pub fn tail(&self) -> Option<&Value> {
        match self {
            Value::Pair(_, tail) => Some(tail),
            _ => None,
        }
    }

    /// Vector elements as a slice
    pub fn as_vector(&self) -> Option<&[Value]> {
        match self {
            Value::Vector(elements) => Some(elements),
            _ => None,
        }
    }

    /// Vector element by index; `None` for out of range or non-vectors
    pub fn vector_ref(&self, index: usize) -> Option<&Value> {
        self.as_vector().and_then(|elements| elements.get(index))
    }

    /// Integer value
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Raw bytes of a symbol, string, or bytevector
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Symbol(bytes) | Value::Str(bytes) | Value::Bytevector(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Bytes of a byte-bearing value as UTF-8 text
    pub fn as_utf8(&self) -> Option<&str> {
        self.as_bytes().and_then(|bytes| std::str::from_utf8(bytes).ok())
    }

    /// Bytes of a byte-bearing value as a NUL-terminated C string.
    ///
    /// Fails if the payload contains an embedded zero byte.
    pub fn to_cstring(&self) -> Option<CString> {
        self.as_bytes().and_then(|bytes| CString::new(bytes).ok())
    }

    // ---- list helpers ----

    /// True if this is a pair chain terminated by `Null` (or `Null` itself)
    pub fn is_proper_list(&self) -> bool {
        let mut rest = self;
        loop {
            match rest {
                Value::Null => return true,
                Value::Pair(_, tail) => rest = tail,
                _ => return false,
            }
        }
    }

    /// Length of a proper list, walking at most `max` links.
    ///
    /// An improper chain reports 0 rather than faulting; an improper
    /// tail past `max` links goes undetected, which is the point of
    /// the bound.
    pub fn list_len_bounded(&self, max: usize) -> usize {
        let mut rest = self;
        let mut len = 0;
        loop {
            match rest {
                Value::Null => return len,
                Value::Pair(_, tail) => {
                    if len == max {
                        return len;
                    }
                    len += 1;
                    rest = tail;
                }
                _ => return 0,
            }
        }
    }

    /// Length of a proper list; 0 for an improper chain
    pub fn list_len(&self) -> usize {
        self.list_len_bounded(usize::MAX)
    }

    /// Remainder of the list after `n` links.
    ///
    /// `None` if the chain runs out or turns improper before `n` links
    /// have been walked.
    pub fn list_tail(&self, n: usize) -> Option<&Value> {
        let mut rest = self;
        for _ in 0..n {
            match rest {
                Value::Pair(_, tail) => rest = tail,
                _ => return None,
            }
        }
        Some(rest)
    }

    /// List element by index; `None` for out of range or improper chains
    pub fn list_ref(&self, n: usize) -> Option<&Value> {
        self.list_tail(n).and_then(Value::head)
    }

    /// Iterate over the elements of a pair chain.
    ///
    /// Stops at the first non-pair tail; callers that care about
    /// properness check `is_proper_list` first.
    pub fn list_iter(&self) -> ListIter<'_> {
        ListIter { rest: self }
    }
}

/// Iterator over the heads of a pair chain
pub struct ListIter<'a> {
    rest: &'a Value,
}

impl<'a> Iterator for ListIter<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<&'a Value> {
        match self.rest {
            Value::Pair(head, tail) => {
                self.rest = tail;
                Some(head)
            }
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    /// Render in symbolic-expression notation, for diagnostics only.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "()"),
            Value::Bool(false) => write!(f, "#f"),
            Value::Bool(true) => write!(f, "#t"),
            Value::Int(value) => write!(f, "{}", value),
            Value::Symbol(bytes) => write!(f, "{}", String::from_utf8_lossy(bytes)),
            Value::Str(bytes) => write!(f, "{:?}", String::from_utf8_lossy(bytes)),
            Value::Bytevector(bytes) => {
                write!(f, "#u8(")?;
                for (i, byte) in bytes.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", byte)?;
                }
                write!(f, ")")
            }
            Value::Vector(elements) => {
                write!(f, "#(")?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", element)?;
                }
                write!(f, ")")
            }
            Value::Pair(_, _) => {
                write!(f, "(")?;
                let mut rest = self;
                let mut first = true;
                loop {
                    match rest {
                        Value::Pair(head, tail) => {
                            if !first {
                                write!(f, " ")?;
                            }
                            first = false;
                            write!(f, "{}", head)?;
                            rest = tail;
                        }
                        Value::Null => break,
                        improper => {
                            write!(f, " . {}", improper)?;
                            break;
                        }
                    }
                }
                write!(f, ")")
            }
        }
    }
}
