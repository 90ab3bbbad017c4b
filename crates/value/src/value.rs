use indexmap::IndexMap;
use std::sync::Arc;

/// Ordered key/value storage for object nodes.
pub type Map = IndexMap<String, Value>;

/// A node in a document tree.
///
/// Composite nodes keep their children behind an `Arc`, so `clone()` is a
/// shallow copy that shares every child with the original. Mutation of a
/// composite always goes through `Arc::make_mut`, which copies the node first
/// if anyone else still holds it. A `Value` read out of a store can therefore
/// be mutated freely by the caller without the store ever observing it.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Arc<Vec<Value>>),
    Object(Arc<Map>),
}

impl Value {
    /// An empty object node.
    pub fn object() -> Self {
        Self::Object(Arc::default())
    }

    /// An empty array node.
    pub fn array() -> Self {
        Self::Array(Arc::default())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether this node is an array or an object.
    pub fn is_composite(&self) -> bool {
        matches!(self, Self::Array(_) | Self::Object(_))
    }

    /// Short name of the node kind, used in log output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The number as an integer, if it has no fractional part.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Number(n) if n.fract() == 0.0 && n.abs() < i64::MAX as f64 => Some(*n as i64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Self::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Self::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Mutable access to array items. Copies the node first if it is shared.
    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Self::Array(items) => Some(Arc::make_mut(items)),
            _ => None,
        }
    }

    /// Mutable access to object entries. Copies the node first if it is shared.
    pub fn as_object_mut(&mut self) -> Option<&mut Map> {
        match self {
            Self::Object(map) => Some(Arc::make_mut(map)),
            _ => None,
        }
    }

    /// Rebuild the whole tree with fresh allocations for every composite node.
    ///
    /// The result is structurally equal to `self` but shares no node with it.
    pub fn deep_clone(&self) -> Self {
        match self {
            Self::Array(items) => Self::Array(Arc::new(items.iter().map(Self::deep_clone).collect())),
            Self::Object(map) => Self::Object(Arc::new(
                map.iter().map(|(k, v)| (k.clone(), v.deep_clone())).collect(),
            )),
            scalar => scalar.clone(),
        }
    }

    /// Node identity: composites match only if they are the same allocation,
    /// scalars match by strict equality.
    pub fn same_node(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Array(a), Self::Array(b)) => Arc::ptr_eq(a, b),
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            _ => self.strict_eq(other),
        }
    }

    /// Strict equality as used for no-op write detection.
    ///
    /// Scalars compare by value (`NaN` never equals itself). Composites are
    /// only strictly equal when they are the same node.
    pub fn strict_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Array(_), Self::Array(_)) | (Self::Object(_), Self::Object(_)) => {
                self.same_node(other)
            }
            _ => false,
        }
    }

    /// Shallow object merge: current keys plus incoming keys, incoming wins.
    ///
    /// Any other combination of shapes yields `incoming` unchanged.
    pub fn merged_with(&self, incoming: Value) -> Value {
        match (self, incoming) {
            (Self::Object(current), Self::Object(incoming)) => {
                let mut map = (**current).clone();
                for (key, value) in incoming.iter() {
                    map.insert(key.clone(), value.clone());
                }
                Self::Object(Arc::new(map))
            }
            (_, incoming) => incoming,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Array(Arc::new(items))
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Self::Object(Arc::new(map))
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::Array(Arc::new(iter.into_iter().collect()))
    }
}

impl FromIterator<(String, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self::Object(Arc::new(iter.into_iter().collect()))
    }
}
