//! The field registry.
//!
//! Every field with a non-default strategy is declared up front and the
//! whole set is validated once, when the registry is built. Merge code looks
//! strategies up by name and never infers them from the shape of a value.

use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::schema::{FieldSpec, MergeStrategy, ValueKind};
use crate::{ModelError, ModelResult, RESERVED_PREFIX};

static DEFAULT_SPEC: FieldSpec = FieldSpec {
    strategy: MergeStrategy::LastWriteWins,
    kind: ValueKind::Any,
};

/// Per-field merge configuration.
#[derive(Debug, Clone, Default)]
pub struct MergeConfig {
    fields: BTreeMap<String, FieldSpec>,
}

impl MergeConfig {
    /// A registry with no declared fields; everything merges last-write-wins.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> MergeConfigBuilder {
        MergeConfigBuilder::default()
    }

    /// Loads built-in strategies from JSON.
    ///
    /// Each entry is either a strategy name or an object with a strategy and
    /// an explicit kind:
    ///
    /// ```
    /// use converge_model::MergeConfig;
    ///
    /// let config = MergeConfig::from_json(r#"{
    ///     "highScore": "max",
    ///     "nickname": { "strategy": "lww", "kind": "text" }
    /// }"#).unwrap();
    /// assert_eq!(config.strategy("highScore").name(), "max");
    /// ```
    pub fn from_json(json: &str) -> ModelResult<Self> {
        let decls: BTreeMap<String, FieldDecl> = serde_json::from_str(json)?;
        let mut builder = Self::builder();
        for (name, decl) in decls {
            builder = builder.field(name, decl.into_spec());
        }
        builder.build()
    }

    /// Spec for `field`, or the last-write-wins default if undeclared.
    #[must_use]
    pub fn spec(&self, field: &str) -> &FieldSpec {
        self.fields.get(field).unwrap_or(&DEFAULT_SPEC)
    }

    #[must_use]
    pub fn strategy(&self, field: &str) -> &MergeStrategy {
        &self.spec(field).strategy
    }

    #[must_use]
    pub fn is_declared(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Declared fields in name order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Checks that `value` may be written to `field`.
    ///
    /// Undeclared fields accept anything but reserved names. Counter fields
    /// take non-negative integers, since a writer's contribution is absolute.
    pub fn check_value(&self, field: &str, value: &Value) -> ModelResult<()> {
        validate_name(field)?;
        let spec = self.spec(field);
        if !spec.kind.matches(value) {
            return Err(ModelError::InvalidValue {
                field: field.to_string(),
                reason: format!("expected {} value, got {}", spec.kind.name(), value),
            });
        }
        if spec.strategy.is_counter() && value.as_u64().is_none() {
            return Err(ModelError::InvalidValue {
                field: field.to_string(),
                reason: format!("counter contribution must be a non-negative integer, got {value}"),
            });
        }
        Ok(())
    }
}

/// Builder for [`MergeConfig`].
#[derive(Debug, Default)]
pub struct MergeConfigBuilder {
    fields: Vec<(String, FieldSpec)>,
}

impl MergeConfigBuilder {
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.push((name.into(), spec));
        self
    }

    #[must_use]
    pub fn lww(self, name: impl Into<String>) -> Self {
        self.field(name, FieldSpec::lww())
    }

    #[must_use]
    pub fn max(self, name: impl Into<String>) -> Self {
        self.field(name, FieldSpec::maximum())
    }

    #[must_use]
    pub fn min(self, name: impl Into<String>) -> Self {
        self.field(name, FieldSpec::minimum())
    }

    #[must_use]
    pub fn counter(self, name: impl Into<String>) -> Self {
        self.field(name, FieldSpec::counter())
    }

    #[must_use]
    pub fn union(self, name: impl Into<String>) -> Self {
        self.field(name, FieldSpec::union())
    }

    #[must_use]
    pub fn custom<F>(self, name: impl Into<String>, f: F) -> Self
    where
        F: Fn(&Value, &Value, &converge_types::FieldMeta, &converge_types::FieldMeta) -> Value
            + Send
            + Sync
            + 'static,
    {
        self.field(name, FieldSpec::custom(f))
    }

    /// Validates every declaration and freezes the registry.
    pub fn build(self) -> ModelResult<MergeConfig> {
        let mut fields = BTreeMap::new();
        for (name, spec) in self.fields {
            validate_name(&name)?;
            if !spec.strategy.accepts(spec.kind) {
                return Err(ModelError::IncompatibleKind {
                    field: name,
                    strategy: spec.strategy.name(),
                    kind: spec.kind.name(),
                });
            }
            if fields.contains_key(&name) {
                return Err(ModelError::DuplicateField(name));
            }
            fields.insert(name, spec);
        }
        Ok(MergeConfig { fields })
    }
}

fn validate_name(name: &str) -> ModelResult<()> {
    if name.is_empty() || name.starts_with(RESERVED_PREFIX) {
        return Err(ModelError::InvalidFieldName(name.to_string()));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum StrategyName {
    #[serde(alias = "last_write_wins")]
    Lww,
    #[serde(alias = "maximum")]
    Max,
    #[serde(alias = "minimum")]
    Min,
    #[serde(alias = "grow_only_counter")]
    Counter,
    #[serde(alias = "set_union")]
    Union,
}

impl StrategyName {
    fn strategy(self) -> MergeStrategy {
        match self {
            Self::Lww => MergeStrategy::LastWriteWins,
            Self::Max => MergeStrategy::Maximum,
            Self::Min => MergeStrategy::Minimum,
            Self::Counter => MergeStrategy::GrowOnlyCounter,
            Self::Union => MergeStrategy::SetUnion,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FieldDecl {
    Short(StrategyName),
    Full {
        strategy: StrategyName,
        #[serde(default)]
        kind: Option<ValueKind>,
    },
}

impl FieldDecl {
    fn into_spec(self) -> FieldSpec {
        match self {
            Self::Short(name) => FieldSpec::new(name.strategy()),
            Self::Full { strategy, kind } => {
                let spec = FieldSpec::new(strategy.strategy());
                match kind {
                    Some(kind) => spec.with_kind(kind),
                    None => spec,
                }
            }
        }
    }
}
