//! Rebuilds a nested token tree from flat stylesheet variables.
//!
//! Each variable name is split on `-` into a path below the component, and
//! its value is coerced to a number where it plainly is one. When a path is
//! a prefix of another (`$avatar-size` and `$avatar-size-small`) both values
//! are kept: the shorter one moves under [`VALUE_KEY`].

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use crate::scss::FlatVariable;

/// Key holding a node's own value once it also has children.
pub const VALUE_KEY: &str = "_value";

#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Serialize for Scalar {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Scalar::Integer(n) => serializer.serialize_i64(*n),
            // Integral floats print without a fraction, like JS numbers.
            Scalar::Float(n) if n.fract() == 0.0 && n.abs() < 9.0e15 => {
                serializer.serialize_i64(*n as i64)
            }
            Scalar::Float(n) => serializer.serialize_f64(*n),
            Scalar::Text(s) => serializer.serialize_str(s),
        }
    }
}

/// Classifies a raw stylesheet value.
///
/// Only unsigned `123` and `1.5` shapes become numbers; units, signs and
/// exponents stay text.
pub fn coerce_value(raw: &str) -> Scalar {
    let trimmed = raw.trim();
    let trimmed = trimmed.strip_suffix(';').unwrap_or(trimmed).trim_end();
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if digits(trimmed) {
        if let Ok(n) = trimmed.parse() {
            return Scalar::Integer(n);
        }
    } else if let Some((whole, fraction)) = trimmed.split_once('.') {
        if digits(whole) && digits(fraction) {
            if let Ok(n) = trimmed.parse() {
                return Scalar::Float(n);
            }
        }
    }
    Scalar::Text(trimmed.to_string())
}

/// Splits a variable name into its path below `component`.
///
/// A missing component prefix is not an error; the whole name is used.
pub fn variable_path(name: &str, component: &str) -> Vec<String> {
    let name = name.strip_prefix('$').unwrap_or(name);
    let rest = name
        .strip_prefix(component)
        .and_then(|rest| rest.strip_prefix('-'))
        .unwrap_or(name);
    rest.split('-').map(str::to_string).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TokenNode {
    Leaf(Scalar),
    Mapping(IndexMap<String, TokenNode>),
}

impl Default for TokenNode {
    fn default() -> Self {
        TokenNode::Mapping(IndexMap::new())
    }
}

impl TokenNode {
    /// Places `value` at `path`, keeping whatever is already there.
    pub fn insert(&mut self, path: &[String], value: Scalar) {
        let Some((last, parents)) = path.split_last() else {
            return;
        };
        let mut current = self.children_mut();
        for key in parents {
            current = current
                .entry(key.clone())
                .or_insert_with(TokenNode::default)
                .children_mut();
        }
        match current.get_mut(last) {
            Some(TokenNode::Mapping(children)) => {
                children.insert(VALUE_KEY.to_string(), TokenNode::Leaf(value));
            }
            _ => {
                current.insert(last.clone(), TokenNode::Leaf(value));
            }
        }
    }

    pub fn get(&self, path: &[&str]) -> Option<&TokenNode> {
        path.iter().try_fold(self, |node, key| match node {
            TokenNode::Mapping(children) => children.get(*key),
            TokenNode::Leaf(_) => None,
        })
    }

    /// Turns a leaf into a mapping holding it under [`VALUE_KEY`].
    fn children_mut(&mut self) -> &mut IndexMap<String, TokenNode> {
        if let TokenNode::Leaf(prior) = self {
            let prior = TokenNode::Leaf(std::mem::replace(prior, Scalar::Integer(0)));
            let mut children = IndexMap::new();
            children.insert(VALUE_KEY.to_string(), prior);
            *self = TokenNode::Mapping(children);
        }
        match self {
            TokenNode::Mapping(children) => children,
            TokenNode::Leaf(_) => unreachable!("leaf was promoted above"),
        }
    }
}

/// The reconstructed tree of one component.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentTokens {
    pub name: String,
    pub tree: TokenNode,
}

impl ComponentTokens {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tree: TokenNode::default(),
        }
    }

    pub fn from_variables<'a>(
        name: impl Into<String>,
        variables: impl IntoIterator<Item = &'a FlatVariable>,
    ) -> Self {
        let mut tokens = Self::new(name);
        for variable in variables {
            tokens.insert(&variable.name, &variable.value);
        }
        tokens
    }

    pub fn insert(&mut self, variable_name: &str, raw_value: &str) {
        let path = variable_path(variable_name, &self.name);
        self.tree.insert(&path, coerce_value(raw_value));
    }
}
