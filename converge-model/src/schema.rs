use converge_types::FieldMeta;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Caller-supplied merge function for [`MergeStrategy::Custom`].
///
/// Receives `(local_value, remote_value, local_meta, remote_meta)` and returns
/// the merged value. The merged field's timestamp and writer are computed by
/// the engine regardless of what the function returns. The function must be
/// commutative for replicas to converge.
pub type MergeFn = Arc<dyn Fn(&Value, &Value, &FieldMeta, &FieldMeta) -> Value + Send + Sync>;

/// How concurrent versions of one field are resolved.
#[derive(Clone)]
pub enum MergeStrategy {
    /// Newer timestamp wins; equal timestamps go to the greater writer id.
    LastWriteWins,
    /// Larger numeric value wins.
    Maximum,
    /// Smaller numeric value wins.
    Minimum,
    /// Per-writer contributions merged by maximum, read as their sum.
    GrowOnlyCounter,
    /// Deduplicated union of two collections.
    SetUnion,
    /// Caller-supplied function over both values.
    Custom(MergeFn),
}

impl MergeStrategy {
    /// Short name used in logs and declarative configs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::LastWriteWins => "lww",
            Self::Maximum => "max",
            Self::Minimum => "min",
            Self::GrowOnlyCounter => "counter",
            Self::SetUnion => "union",
            Self::Custom(_) => "custom",
        }
    }

    /// Value kind a field gets when declared with this strategy and no
    /// explicit kind.
    #[must_use]
    pub fn default_kind(&self) -> ValueKind {
        match self {
            Self::Maximum | Self::Minimum | Self::GrowOnlyCounter => ValueKind::Number,
            Self::SetUnion => ValueKind::List,
            Self::LastWriteWins | Self::Custom(_) => ValueKind::Any,
        }
    }

    /// Returns true if this strategy can merge values of `kind`.
    #[must_use]
    pub fn accepts(&self, kind: ValueKind) -> bool {
        match self {
            Self::Maximum | Self::Minimum | Self::GrowOnlyCounter => kind == ValueKind::Number,
            Self::SetUnion => kind == ValueKind::List,
            Self::LastWriteWins | Self::Custom(_) => true,
        }
    }

    #[must_use]
    pub fn is_counter(&self) -> bool {
        matches!(self, Self::GrowOnlyCounter)
    }
}

impl fmt::Debug for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::LastWriteWins => "LastWriteWins",
            Self::Maximum => "Maximum",
            Self::Minimum => "Minimum",
            Self::GrowOnlyCounter => "GrowOnlyCounter",
            Self::SetUnion => "SetUnion",
            Self::Custom(_) => "Custom(<fn>)",
        };
        f.write_str(name)
    }
}

/// The shape of value a declared field holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    Any,
    Number,
    Text,
    Bool,
    List,
    Object,
}

impl ValueKind {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Number => "number",
            Self::Text => "text",
            Self::Bool => "bool",
            Self::List => "list",
            Self::Object => "object",
        }
    }

    /// Returns true if `value` has this shape.
    #[must_use]
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Any => true,
            Self::Number => value.is_number(),
            Self::Text => value.is_string(),
            Self::Bool => value.is_boolean(),
            Self::List => value.is_array(),
            Self::Object => value.is_object(),
        }
    }
}

/// A merge strategy bound to a value kind.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub strategy: MergeStrategy,
    pub kind: ValueKind,
}

impl FieldSpec {
    /// A field with the strategy's default kind.
    #[must_use]
    pub fn new(strategy: MergeStrategy) -> Self {
        let kind = strategy.default_kind();
        Self { strategy, kind }
    }

    pub fn lww() -> Self {
        Self::new(MergeStrategy::LastWriteWins)
    }

    pub fn maximum() -> Self {
        Self::new(MergeStrategy::Maximum)
    }

    pub fn minimum() -> Self {
        Self::new(MergeStrategy::Minimum)
    }

    pub fn counter() -> Self {
        Self::new(MergeStrategy::GrowOnlyCounter)
    }

    pub fn union() -> Self {
        Self::new(MergeStrategy::SetUnion)
    }

    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Value, &Value, &FieldMeta, &FieldMeta) -> Value + Send + Sync + 'static,
    {
        Self::new(MergeStrategy::Custom(Arc::new(f)))
    }

    /// Overrides the declared value kind.
    #[must_use]
    pub fn with_kind(mut self, kind: ValueKind) -> Self {
        self.kind = kind;
        self
    }
}
