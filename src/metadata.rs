//! Declarative metadata attached to descriptors and to each occurrence of a type.

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IntRange {
    pub min: i64,
    pub max: i64,
}

/// Float bounds are `OrderedFloat` so metadata stays `Eq + Hash` for definition keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FloatRange {
    pub min: OrderedFloat<f64>,
    pub max: OrderedFloat<f64>,
}

impl FloatRange {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min: OrderedFloat(min), max: OrderedFloat(max) }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Metadata {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub description: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub string_enum: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub integer_range: Option<IntRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub float_range: Option<FloatRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition_id: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub suppress_definition: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub force_definition: bool,
}

/// The value-shaping subset of [`Metadata`]: what a definition body depends on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Constraints {
    pub pattern: Option<String>,
    pub string_enum: Option<Vec<String>>,
    pub integer_range: Option<IntRange>,
    pub float_range: Option<FloatRange>,
}

impl Constraints {
    pub fn is_empty(&self) -> bool {
        self.pattern.is_none()
            && self.string_enum.is_none()
            && self.integer_range.is_none()
            && self.float_range.is_none()
    }
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn describe(mut self, line: impl Into<String>) -> Self {
        self.description.push(line.into());
        self
    }

    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn with_string_enum<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.string_enum = Some(values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_integer_range(mut self, min: i64, max: i64) -> Self {
        self.integer_range = Some(IntRange { min, max });
        self
    }

    pub fn with_float_range(mut self, min: f64, max: f64) -> Self {
        self.float_range = Some(FloatRange::new(min, max));
        self
    }

    pub fn with_definition_id(mut self, id: impl Into<String>) -> Self {
        self.definition_id = Some(id.into());
        self
    }

    pub fn forced(mut self) -> Self {
        self.force_definition = true;
        self
    }

    pub fn suppressed(mut self) -> Self {
        self.suppress_definition = true;
        self
    }

    /// Layer occurrence metadata (`self`) over the type-level metadata of its descriptor.
    ///
    /// Occurrence values win, description lines concatenate occurrence-first, and a
    /// definition flag set on either layer applies.
    pub fn layered_over(&self, base: &Metadata) -> Metadata {
        let mut description = self.description.clone();
        description.extend(base.description.iter().cloned());

        Metadata {
            description,
            pattern: self.pattern.clone().or_else(|| base.pattern.clone()),
            string_enum: self.string_enum.clone().or_else(|| base.string_enum.clone()),
            integer_range: self.integer_range.or(base.integer_range),
            float_range: self.float_range.or(base.float_range),
            definition_id: self
                .explicit_definition_id()
                .or_else(|| base.explicit_definition_id())
                .map(str::to_owned),
            suppress_definition: self.suppress_definition || base.suppress_definition,
            force_definition: self.force_definition || base.force_definition,
        }
    }

    /// Fill constraints this occurrence leaves unset from an enclosing list or map.
    pub fn inheriting(&self, parent: &Constraints) -> Metadata {
        let mut out = self.clone();
        if out.pattern.is_none() {
            out.pattern = parent.pattern.clone();
        }
        if out.string_enum.is_none() {
            out.string_enum = parent.string_enum.clone();
        }
        if out.integer_range.is_none() {
            out.integer_range = parent.integer_range;
        }
        if out.float_range.is_none() {
            out.float_range = parent.float_range;
        }
        out
    }

    pub fn constraints(&self) -> Constraints {
        Constraints {
            pattern: self.pattern.clone(),
            string_enum: self.string_enum.clone(),
            integer_range: self.integer_range,
            float_range: self.float_range,
        }
    }

    /// Description lines joined with `\n`, or `None` when that would be empty.
    pub fn description_text(&self) -> Option<String> {
        let text = self.description.join("\n");
        (!text.is_empty()).then_some(text)
    }

    /// Definition id chosen by the caller; empty ids count as absent.
    pub fn explicit_definition_id(&self) -> Option<&str> {
        self.definition_id.as_deref().filter(|id| !id.is_empty())
    }

    pub fn promotion_requested(&self) -> bool {
        self.force_definition || self.explicit_definition_id().is_some()
    }
}
