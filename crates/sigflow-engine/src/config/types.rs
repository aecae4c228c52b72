//! Signal configuration types.
//!
//! Signal files are deserialized in one pass: the document visitor unwraps
//! the optional `signals:` key and rejects duplicate names, and each
//! component spec accepts a bare alias string, `{alias, params}` or
//! `{module, class, params}`.

use std::fmt;

use indexmap::IndexMap;
use serde::de::{self, Deserializer, MapAccess, Visitor};
use serde::{Deserialize, Serialize};
use sigflow_sdk::export::Role;
use sigflow_sdk::Params;

/// How a component class is located.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ComponentRef {
    /// Short name looked up in the alias registry.
    Alias(String),
    /// Explicit module path and class name.
    Class { module: String, class: String },
}

impl ComponentRef {
    /// The name a signal file uses for the component: its alias, or the
    /// class of an explicit reference.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Alias(alias) => alias,
            Self::Class { class, .. } => class,
        }
    }
}

impl fmt::Display for ComponentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alias(alias) => f.write_str(alias),
            Self::Class { module, class } => write!(f, "{module}.{class}"),
        }
    }
}

/// A component reference plus the parameters given in the signal file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComponentSpec {
    pub reference: ComponentRef,
    pub params: Params,
}

impl ComponentSpec {
    #[must_use]
    pub fn alias(name: impl Into<String>) -> Self {
        Self {
            reference: ComponentRef::Alias(name.into()),
            params: Params::new(),
        }
    }

    #[must_use]
    pub fn class(module: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            reference: ComponentRef::Class {
                module: module.into(),
                class: class.into(),
            },
            params: Params::new(),
        }
    }

    #[must_use]
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }
}

impl<'de> Deserialize<'de> for ComponentSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(ComponentSpecVisitor)
    }
}

struct ComponentSpecVisitor;

impl<'de> Visitor<'de> for ComponentSpecVisitor {
    type Value = ComponentSpec;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an alias string, {alias, params} or {module, class, params}")
    }

    fn visit_str<E: de::Error>(self, alias: &str) -> Result<ComponentSpec, E> {
        if alias.trim().is_empty() {
            return Err(E::custom("component alias must not be empty"));
        }
        Ok(ComponentSpec::alias(alias))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<ComponentSpec, A::Error> {
        let mut alias: Option<String> = None;
        let mut module: Option<String> = None;
        let mut class: Option<String> = None;
        let mut params: Option<Params> = None;

        while let Some(key) = map.next_key::<String>()? {
            let slot = match key.as_str() {
                "alias" => &mut alias,
                "module" => &mut module,
                "class" => &mut class,
                "params" => {
                    if params.is_some() {
                        return Err(de::Error::duplicate_field("params"));
                    }
                    params = Some(map.next_value::<Option<Params>>()?.unwrap_or_default());
                    continue;
                }
                other => {
                    return Err(de::Error::unknown_field(
                        other,
                        &["alias", "module", "class", "params"],
                    ))
                }
            };
            if slot.is_some() {
                return Err(de::Error::custom(format!("duplicate field `{key}`")));
            }
            *slot = Some(map.next_value()?);
        }

        let reference = match (alias, module, class) {
            (Some(alias), None, None) if !alias.trim().is_empty() => ComponentRef::Alias(alias),
            (None, Some(module), Some(class))
                if !module.trim().is_empty() && !class.trim().is_empty() =>
            {
                ComponentRef::Class { module, class }
            }
            (Some(_), Some(_), _) | (Some(_), _, Some(_)) => {
                return Err(de::Error::custom(
                    "component spec must set either `alias` or `module` + `class`, not both",
                ))
            }
            _ => {
                return Err(de::Error::custom(
                    "component spec needs a non-empty `alias`, or both `module` and `class`",
                ))
            }
        };

        Ok(ComponentSpec {
            reference,
            params: params.unwrap_or_default(),
        })
    }
}

/// One signal as written in a configuration file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct RawSignal {
    pub extractor: ComponentSpec,
    #[serde(default)]
    pub transformer: Option<ComponentSpec>,
    #[serde(default)]
    pub loaders: Option<Vec<ComponentSpec>>,
    #[serde(default)]
    pub secrets: Option<Vec<String>>,
    #[serde(default)]
    pub secret_mapping: Option<IndexMap<String, String>>,
    /// Legacy extractor parameters, merged under `extractor.params`.
    #[serde(default)]
    pub extractor_params: Option<Params>,
}

/// Immutable description of one signal pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalDefinition {
    pub name: String,
    pub extractor: ComponentSpec,
    pub transformer: Option<ComponentSpec>,
    pub loaders: Vec<ComponentSpec>,
    /// Required secret names, first occurrence order, no duplicates.
    pub secrets: Vec<String>,
    /// Secret name to the parameter it is injected as: `param` for the
    /// extractor, or `component.param` for the component with that name.
    pub secret_mapping: IndexMap<String, String>,
}

impl SignalDefinition {
    pub(crate) fn from_raw(name: String, raw: RawSignal) -> Self {
        let mut extractor = raw.extractor;
        if let Some(legacy) = raw.extractor_params {
            let mut merged = legacy;
            merged.extend(std::mem::take(&mut extractor.params));
            extractor.params = merged;
        }

        let mut secrets: Vec<String> = Vec::new();
        for secret in raw.secrets.unwrap_or_default() {
            if !secrets.contains(&secret) {
                secrets.push(secret);
            }
        }

        Self {
            name,
            extractor,
            transformer: raw.transformer,
            loaders: raw.loaders.unwrap_or_default(),
            secrets,
            secret_mapping: raw.secret_mapping.unwrap_or_default(),
        }
    }

    /// Every component spec with the role it is resolved for.
    pub fn components(&self) -> impl Iterator<Item = (Role, &ComponentSpec)> {
        std::iter::once((Role::Extractor, &self.extractor))
            .chain(self.transformer.iter().map(|spec| (Role::Transformer, spec)))
            .chain(self.loaders.iter().map(|spec| (Role::Loader, spec)))
    }
}

/// Top level of a signal file: either the signal mapping itself or the same
/// mapping under a single `signals:` key.
#[derive(Debug, Default)]
pub(crate) struct SignalDocument {
    pub signals: IndexMap<String, RawSignal>,
}

impl<'de> Deserialize<'de> for SignalDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(DocumentVisitor { nested: false })
    }
}

const WRAPPER_KEY: &str = "signals";

struct DocumentVisitor {
    /// Already inside the `signals:` wrapper.
    nested: bool,
}

impl DocumentVisitor {
    fn insert<E: de::Error>(
        signals: &mut IndexMap<String, RawSignal>,
        name: String,
        signal: RawSignal,
    ) -> Result<(), E> {
        if name.trim().is_empty() {
            return Err(E::custom("signal name must not be empty"));
        }
        if signals.contains_key(&name) {
            return Err(E::custom(format!("duplicate signal name '{name}'")));
        }
        signals.insert(name, signal);
        Ok(())
    }
}

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = SignalDocument;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a mapping of signal names to signal definitions")
    }

    fn visit_unit<E: de::Error>(self) -> Result<SignalDocument, E> {
        Ok(SignalDocument::default())
    }

    fn visit_none<E: de::Error>(self) -> Result<SignalDocument, E> {
        Ok(SignalDocument::default())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<SignalDocument, A::Error> {
        let mut signals = IndexMap::new();
        let mut wrapped = false;
        let mut entries = 0usize;

        while let Some(name) = map.next_key::<String>()? {
            entries += 1;
            if name == WRAPPER_KEY && !self.nested {
                if entries > 1 {
                    return Err(de::Error::custom(
                        "`signals` must be the only top-level key when used",
                    ));
                }
                let inner: NestedSignals = map.next_value()?;
                signals = inner.0.signals;
                wrapped = true;
                continue;
            }
            if wrapped {
                return Err(de::Error::custom(format!(
                    "`signals` must be the only top-level key when used (found '{name}')"
                )));
            }
            let signal: RawSignal = map.next_value()?;
            Self::insert(&mut signals, name, signal)?;
        }

        Ok(SignalDocument { signals })
    }
}

struct NestedSignals(SignalDocument);

impl<'de> Deserialize<'de> for NestedSignals {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer
            .deserialize_any(DocumentVisitor { nested: true })
            .map(NestedSignals)
    }
}
