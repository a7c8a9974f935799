//! Namespace-scoped node identifiers.
//!
//! A [`NodeId`] pairs a namespace index with either a numeric or a string
//! identifier. The text form follows the usual `ns=<index>;i=<number>` and
//! `ns=<index>;s=<text>` notation; the `ns=0;` prefix is omitted for the
//! standard namespace.
//!
//! ```
//! use liha_model::NodeId;
//!
//! let id: NodeId = "ns=3;i=5001".parse().unwrap();
//! assert_eq!(id.namespace_index, 3);
//! assert_eq!(id.to_string(), "ns=3;i=5001");
//! assert_eq!(NodeId::numeric(0, 85).to_string(), "i=85");
//! ```

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// The identifier part of a [`NodeId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Identifier {
    /// A numeric identifier (`i=`).
    Numeric(u32),
    /// A string identifier (`s=`).
    String(String),
}

/// A node identifier scoped to one namespace index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    /// Index into the server's namespace table.
    pub namespace_index: u16,
    /// Identifier within the namespace.
    pub identifier: Identifier,
}

impl NodeId {
    /// Creates a numeric node id.
    #[must_use]
    pub const fn numeric(namespace_index: u16, value: u32) -> Self {
        Self {
            namespace_index,
            identifier: Identifier::Numeric(value),
        }
    }

    /// Creates a string node id.
    #[must_use]
    pub fn string(namespace_index: u16, value: impl Into<String>) -> Self {
        Self {
            namespace_index,
            identifier: Identifier::String(value.into()),
        }
    }

    /// The null node id (`i=0`), used where a target is absent.
    #[must_use]
    pub const fn null() -> Self {
        Self::numeric(0, 0)
    }

    /// Returns true for the null node id.
    #[must_use]
    pub fn is_null(&self) -> bool {
        match &self.identifier {
            Identifier::Numeric(v) => self.namespace_index == 0 && *v == 0,
            Identifier::String(s) => self.namespace_index == 0 && s.is_empty(),
        }
    }

    /// Returns the numeric identifier, if this id is numeric.
    #[must_use]
    pub fn as_numeric(&self) -> Option<u32> {
        match self.identifier {
            Identifier::Numeric(v) => Some(v),
            Identifier::String(_) => None,
        }
    }

    /// Returns a copy of this id moved into another namespace.
    #[must_use]
    pub fn with_namespace(&self, namespace_index: u16) -> Self {
        Self {
            namespace_index,
            identifier: self.identifier.clone(),
        }
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::null()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace_index != 0 {
            write!(f, "ns={};", self.namespace_index)?;
        }
        match &self.identifier {
            Identifier::Numeric(v) => write!(f, "i={v}"),
            Identifier::String(s) => write!(f, "s={s}"),
        }
    }
}

/// Error returned when a node id or qualified name cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid node id '{input}': {reason}")]
pub struct ParseNodeIdError {
    /// The rejected text.
    pub input: String,
    /// Why it was rejected.
    pub reason: &'static str,
}

impl ParseNodeIdError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_owned(),
            reason,
        }
    }
}

impl FromStr for NodeId {
    type Err = ParseNodeIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim();
        let (namespace_index, rest) = match text.strip_prefix("ns=") {
            Some(tail) => {
                let (ns, rest) = tail
                    .split_once(';')
                    .ok_or_else(|| ParseNodeIdError::new(s, "missing ';' after namespace"))?;
                let ns = ns
                    .parse::<u16>()
                    .map_err(|_| ParseNodeIdError::new(s, "namespace index is not a u16"))?;
                (ns, rest)
            }
            None => (0, text),
        };

        if let Some(value) = rest.strip_prefix("i=") {
            let value = value
                .parse::<u32>()
                .map_err(|_| ParseNodeIdError::new(s, "numeric identifier is not a u32"))?;
            Ok(NodeId::numeric(namespace_index, value))
        } else if let Some(value) = rest.strip_prefix("s=") {
            Ok(NodeId::string(namespace_index, value))
        } else {
            Err(ParseNodeIdError::new(s, "expected 'i=' or 's=' identifier"))
        }
    }
}

/// A namespace-qualified browse name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct QualifiedName {
    /// Namespace index of the name.
    pub namespace_index: u16,
    /// The unqualified name.
    pub name: String,
}

impl QualifiedName {
    /// Creates a qualified name.
    #[must_use]
    pub fn new(namespace_index: u16, name: impl Into<String>) -> Self {
        Self {
            namespace_index,
            name: name.into(),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace_index == 0 {
            f.write_str(&self.name)
        } else {
            write!(f, "{}:{}", self.namespace_index, self.name)
        }
    }
}

impl FromStr for QualifiedName {
    type Err = ParseNodeIdError;

    /// Parses `<ns>:<name>`; a missing or non-numeric prefix means namespace 0.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(ParseNodeIdError::new(s, "empty browse name"));
        }
        match s.split_once(':') {
            Some((ns, name)) => match ns.parse::<u16>() {
                Ok(ns) if !name.is_empty() => Ok(QualifiedName::new(ns, name)),
                Ok(_) => Err(ParseNodeIdError::new(s, "empty name after namespace")),
                Err(_) => Ok(QualifiedName::new(0, s)),
            },
            None => Ok(QualifiedName::new(0, s)),
        }
    }
}
