//! Module/class export tables consumed by the engine's component catalog.
//!
//! A plugin crate describes what it provides as a list of [`ModuleExport`]s.
//! Each module exports named classes, and each class carries a constructor
//! for exactly one [`Role`].

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::component::{parse_params, Component, Extractor, Loader, Transformer};
use crate::errors::ComponentError;
use crate::Params;

/// Capability a component class provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Extractor,
    Transformer,
    Loader,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Extractor => "extractor",
            Self::Transformer => "transformer",
            Self::Loader => "loader",
        };
        f.write_str(s)
    }
}

pub type ExtractorCtor =
    Arc<dyn Fn(Params) -> Result<Box<dyn Extractor>, ComponentError> + Send + Sync>;
pub type TransformerCtor =
    Arc<dyn Fn(Params) -> Result<Box<dyn Transformer>, ComponentError> + Send + Sync>;
pub type LoaderCtor = Arc<dyn Fn(Params) -> Result<Box<dyn Loader>, ComponentError> + Send + Sync>;

/// Role-typed constructor for a component class.
#[derive(Clone)]
pub enum Constructor {
    Extractor(ExtractorCtor),
    Transformer(TransformerCtor),
    Loader(LoaderCtor),
}

impl Constructor {
    #[must_use]
    pub fn role(&self) -> Role {
        match self {
            Self::Extractor(_) => Role::Extractor,
            Self::Transformer(_) => Role::Transformer,
            Self::Loader(_) => Role::Loader,
        }
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Constructor({})", self.role())
    }
}

/// One class exported from a module.
#[derive(Clone, Debug)]
pub struct ClassExport {
    pub class: String,
    pub defaults: Params,
    pub constructor: Constructor,
}

impl ClassExport {
    /// Export a typed extractor class.
    #[must_use]
    pub fn extractor<T: Component + Extractor>() -> Self {
        Self {
            class: T::CLASS.to_string(),
            defaults: T::defaults(),
            constructor: Constructor::Extractor(Arc::new(
                |params: Params| -> Result<Box<dyn Extractor>, ComponentError> {
                    let config = parse_params::<T::Config>(T::CLASS, params)?;
                    Ok(Box::new(T::init(config)?) as Box<dyn Extractor>)
                },
            )),
        }
    }

    /// Export a typed transformer class.
    #[must_use]
    pub fn transformer<T: Component + Transformer>() -> Self {
        Self {
            class: T::CLASS.to_string(),
            defaults: T::defaults(),
            constructor: Constructor::Transformer(Arc::new(
                |params: Params| -> Result<Box<dyn Transformer>, ComponentError> {
                    let config = parse_params::<T::Config>(T::CLASS, params)?;
                    Ok(Box::new(T::init(config)?) as Box<dyn Transformer>)
                },
            )),
        }
    }

    /// Export a typed loader class.
    #[must_use]
    pub fn loader<T: Component + Loader>() -> Self {
        Self {
            class: T::CLASS.to_string(),
            defaults: T::defaults(),
            constructor: Constructor::Loader(Arc::new(
                |params: Params| -> Result<Box<dyn Loader>, ComponentError> {
                    let config = parse_params::<T::Config>(T::CLASS, params)?;
                    Ok(Box::new(T::init(config)?) as Box<dyn Loader>)
                },
            )),
        }
    }

    /// Export a class from an arbitrary constructor closure.
    #[must_use]
    pub fn from_constructor(class: impl Into<String>, constructor: Constructor) -> Self {
        Self {
            class: class.into(),
            defaults: Params::new(),
            constructor,
        }
    }

    #[must_use]
    pub fn with_defaults(mut self, defaults: Params) -> Self {
        self.defaults = defaults;
        self
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.constructor.role()
    }
}

/// A named module and the classes it exports.
#[derive(Clone, Debug)]
pub struct ModuleExport {
    pub module: String,
    pub classes: Vec<ClassExport>,
}

impl ModuleExport {
    #[must_use]
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            classes: Vec::new(),
        }
    }

    #[must_use]
    pub fn class(mut self, export: ClassExport) -> Self {
        self.classes.push(export);
        self
    }
}

/// Alias → `(module, class)` entry for the built-in registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AliasEntry {
    pub alias: &'static str,
    pub module: &'static str,
    pub class: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Component;
    use crate::RawData;
    use async_trait::async_trait;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct EchoConfig {
        value: String,
    }

    struct Echo {
        value: String,
    }

    impl Component for Echo {
        type Config = EchoConfig;
        const CLASS: &'static str = "Echo";

        fn init(config: Self::Config) -> Result<Self, ComponentError> {
            Ok(Self {
                value: config.value,
            })
        }
    }

    #[async_trait]
    impl Extractor for Echo {
        async fn fetch(&mut self) -> Result<RawData, ComponentError> {
            Ok(serde_json::Value::String(self.value.clone()))
        }
    }

    #[tokio::test]
    async fn typed_export_constructs_instance() {
        let export = ClassExport::extractor::<Echo>();
        assert_eq!(export.class, "Echo");
        assert_eq!(export.role(), Role::Extractor);

        let Constructor::Extractor(ctor) = &export.constructor else {
            panic!("expected extractor constructor");
        };
        let mut params = Params::new();
        params.insert("value".into(), "hello".into());
        let mut instance = ctor(params).unwrap();
        assert_eq!(instance.fetch().await.unwrap(), serde_json::json!("hello"));
    }

    #[test]
    fn typed_export_surfaces_param_errors() {
        let export = ClassExport::extractor::<Echo>();
        let Constructor::Extractor(ctor) = &export.constructor else {
            panic!("expected extractor constructor");
        };
        let Err(err) = ctor(Params::new()) else {
            panic!("missing value should fail");
        };
        assert_eq!(err.code, "INVALID_PARAMS");
    }

    #[test]
    fn module_builder_collects_classes() {
        let module = ModuleExport::new("demo::echo").class(ClassExport::extractor::<Echo>());
        assert_eq!(module.module, "demo::echo");
        assert_eq!(module.classes.len(), 1);
    }
}
