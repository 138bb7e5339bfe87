//! # Event payload.
//!
//! Events carry metadata as an ordered list of typed key/value entries
//! ([`Info`]). The crate never interprets values; it only cares about
//! positions. A [`Payload`] keeps the parts that the dispatch machinery owns
//! as dedicated fields instead of array slots:
//!
//! - `sources`: every process that reported the event, **newest first**
//! - `extra`: caller-supplied entries, in arrival order
//! - `handler_name` / `return_object`: the two trailing slots, rewritten before
//!   each handler invocation
//!
//! [`Payload::flatten`] renders the positional layout that consumers of the
//! flat form rely on:
//! ```text
//! [ source(P_n), ..., source(P_1), extra..., handler_name, return_object ]
//!                                            └──── always the last two ────┘
//! ```

use std::any::Any;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

use crate::types::ProcId;

/// Well-known keys used by [`Payload::flatten`].
pub mod keys {
    /// One entry per reporting process.
    pub const SOURCE: &str = "event.source";
    /// Name of the handler currently being invoked.
    pub const HANDLER_NAME: &str = "event.hdlr.name";
    /// Object registered alongside the handler currently being invoked.
    pub const RETURN_OBJECT: &str = "event.return.obj";
}

/// Opaque object a registrant attaches to its handler; handed back untouched.
pub type ReturnObject = Arc<dyn Any + Send + Sync>;

/// Typed value of an [`Info`] entry.
#[derive(Clone)]
pub enum InfoValue {
    /// No value (an unset slot).
    Undef,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Str(Arc<str>),
    Proc(ProcId),
    Bytes(Arc<[u8]>),
    /// Opaque object, compared by identity.
    Object(ReturnObject),
}

impl InfoValue {
    /// Short type tag for logs.
    pub fn type_tag(&self) -> &'static str {
        match self {
            InfoValue::Undef => "undef",
            InfoValue::Bool(_) => "bool",
            InfoValue::Int(_) => "int",
            InfoValue::UInt(_) => "uint",
            InfoValue::Str(_) => "string",
            InfoValue::Proc(_) => "proc",
            InfoValue::Bytes(_) => "bytes",
            InfoValue::Object(_) => "object",
        }
    }

    /// Returns the string value, if this is a [`InfoValue::Str`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            InfoValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the process value, if this is a [`InfoValue::Proc`].
    pub fn as_proc(&self) -> Option<&ProcId> {
        match self {
            InfoValue::Proc(p) => Some(p),
            _ => None,
        }
    }
}

impl fmt::Debug for InfoValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InfoValue::Undef => f.write_str("Undef"),
            InfoValue::Bool(v) => write!(f, "Bool({v})"),
            InfoValue::Int(v) => write!(f, "Int({v})"),
            InfoValue::UInt(v) => write!(f, "UInt({v})"),
            InfoValue::Str(v) => write!(f, "Str({v:?})"),
            InfoValue::Proc(v) => write!(f, "Proc({v})"),
            InfoValue::Bytes(v) => write!(f, "Bytes(len={})", v.len()),
            InfoValue::Object(_) => f.write_str("Object(..)"),
        }
    }
}

impl PartialEq for InfoValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (InfoValue::Undef, InfoValue::Undef) => true,
            (InfoValue::Bool(a), InfoValue::Bool(b)) => a == b,
            (InfoValue::Int(a), InfoValue::Int(b)) => a == b,
            (InfoValue::UInt(a), InfoValue::UInt(b)) => a == b,
            (InfoValue::Str(a), InfoValue::Str(b)) => a == b,
            (InfoValue::Proc(a), InfoValue::Proc(b)) => a == b,
            (InfoValue::Bytes(a), InfoValue::Bytes(b)) => a == b,
            (InfoValue::Object(a), InfoValue::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<bool> for InfoValue {
    fn from(v: bool) -> Self {
        InfoValue::Bool(v)
    }
}

impl From<i64> for InfoValue {
    fn from(v: i64) -> Self {
        InfoValue::Int(v)
    }
}

impl From<u64> for InfoValue {
    fn from(v: u64) -> Self {
        InfoValue::UInt(v)
    }
}

impl From<&str> for InfoValue {
    fn from(v: &str) -> Self {
        InfoValue::Str(v.into())
    }
}

impl From<String> for InfoValue {
    fn from(v: String) -> Self {
        InfoValue::Str(v.into())
    }
}

impl From<ProcId> for InfoValue {
    fn from(v: ProcId) -> Self {
        InfoValue::Proc(v)
    }
}

impl From<Vec<u8>> for InfoValue {
    fn from(v: Vec<u8>) -> Self {
        InfoValue::Bytes(v.into())
    }
}

/// One key/value entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Info {
    pub key: Arc<str>,
    pub value: InfoValue,
}

impl Info {
    /// Creates an entry.
    pub fn new(key: impl Into<Arc<str>>, value: impl Into<InfoValue>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Metadata carried by one (possibly coalesced) event.
#[derive(Clone, Default)]
pub struct Payload {
    sources: VecDeque<ProcId>,
    extra: Vec<Info>,
    handler_name: Option<Arc<str>>,
    return_object: Option<ReturnObject>,
}

impl Payload {
    pub(crate) fn new(source: ProcId, extra: Vec<Info>) -> Self {
        let mut sources = VecDeque::with_capacity(1);
        sources.push_back(source);
        Self {
            sources,
            extra,
            handler_name: None,
            return_object: None,
        }
    }

    /// Records another reporter ahead of all earlier ones.
    pub(crate) fn prepend_source(&mut self, source: ProcId) {
        self.sources.push_front(source);
    }

    pub(crate) fn extend_extra(&mut self, extra: impl IntoIterator<Item = Info>) {
        self.extra.extend(extra);
    }

    /// Rewrites the two trailing slots for the next invocation.
    pub(crate) fn set_slots(&mut self, handler: Arc<str>, object: Option<ReturnObject>) {
        self.handler_name = Some(handler);
        self.return_object = object;
    }

    /// Reporting processes, newest first.
    pub fn sources(&self) -> impl ExactSizeIterator<Item = &ProcId> {
        self.sources.iter()
    }

    /// Number of reports merged into this payload.
    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Caller-supplied entries.
    pub fn extra(&self) -> &[Info] {
        &self.extra
    }

    /// First extra entry with `key`.
    pub fn get(&self, key: &str) -> Option<&InfoValue> {
        self.extra
            .iter()
            .find(|i| &*i.key == key)
            .map(|i| &i.value)
    }

    /// Handler-name slot.
    pub fn handler_name(&self) -> Option<&str> {
        self.handler_name.as_deref()
    }

    /// Return-object slot.
    pub fn return_object(&self) -> Option<&ReturnObject> {
        self.return_object.as_ref()
    }

    /// Return-object slot downcast to `T`.
    pub fn return_object_as<T: Any>(&self) -> Option<&T> {
        self.return_object.as_deref()?.downcast_ref::<T>()
    }

    /// Positional view: sources (newest first), extra entries, then the
    /// handler-name and return-object slots as the last two entries.
    pub fn flatten(&self) -> Vec<Info> {
        let mut out = Vec::with_capacity(self.sources.len() + self.extra.len() + 2);
        out.extend(
            self.sources
                .iter()
                .map(|p| Info::new(keys::SOURCE, p.clone())),
        );
        out.extend(self.extra.iter().cloned());
        out.push(Info {
            key: keys::HANDLER_NAME.into(),
            value: match &self.handler_name {
                Some(n) => InfoValue::Str(n.clone()),
                None => InfoValue::Undef,
            },
        });
        out.push(Info {
            key: keys::RETURN_OBJECT.into(),
            value: match &self.return_object {
                Some(o) => InfoValue::Object(o.clone()),
                None => InfoValue::Undef,
            },
        });
        out
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Payload")
            .field("sources", &self.sources)
            .field("extra", &self.extra)
            .field("handler_name", &self.handler_name)
            .field("return_object", &self.return_object.as_ref().map(|_| ".."))
            .finish()
    }
}
