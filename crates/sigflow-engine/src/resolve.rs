//! Component catalog and resolution.
//!
//! Modules register their exported classes at start-up; signal specs name a
//! class either through an alias or by explicit module and class. Lookup
//! happens here and nowhere else.

use indexmap::IndexMap;
use serde::Serialize;
use sigflow_sdk::export::{ClassExport, Constructor, ModuleExport, Role};
use sigflow_sdk::{Extractor, Loader, Params, Transformer};

use crate::config::ComponentRef;
use crate::error::PipelineError;
use crate::secrets::ResolvedSecrets;
use crate::template::RenderedSpec;

/// Registry of modules, their classes and the alias table.
#[derive(Debug, Clone, Default)]
pub struct ComponentCatalog {
    modules: IndexMap<String, IndexMap<String, ClassExport>>,
    aliases: IndexMap<String, (String, String)>,
}

/// One alias row for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AliasInfo {
    pub alias: String,
    pub module: String,
    pub class: String,
    /// `None` when the alias points at a class that is not registered.
    pub role: Option<Role>,
}

impl ComponentCatalog {
    /// Empty catalog with no modules and no aliases.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with every built-in plugin module and alias registered.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut catalog = Self::new();
        for module in sigflow_plugins::modules() {
            catalog.register_module(module);
        }
        for entry in sigflow_plugins::ALIASES {
            catalog.register_alias(entry.alias, entry.module, entry.class);
        }
        catalog
    }

    /// Register a module's classes. Classes already registered under the
    /// same module are replaced.
    pub fn register_module(&mut self, export: ModuleExport) {
        let classes = self.modules.entry(export.module.clone()).or_default();
        for class in export.classes {
            tracing::trace!(module = export.module, class = class.class, role = %class.role(), "Registered component class");
            classes.insert(class.class.clone(), class);
        }
    }

    pub fn register_alias(
        &mut self,
        alias: impl Into<String>,
        module: impl Into<String>,
        class: impl Into<String>,
    ) {
        self.aliases
            .insert(alias.into(), (module.into(), class.into()));
    }

    /// Every alias with the role of the class it points at.
    #[must_use]
    pub fn aliases(&self) -> Vec<AliasInfo> {
        self.aliases
            .iter()
            .map(|(alias, (module, class))| AliasInfo {
                alias: alias.clone(),
                module: module.clone(),
                class: class.clone(),
                role: self
                    .modules
                    .get(module)
                    .and_then(|classes| classes.get(class))
                    .map(ClassExport::role),
            })
            .collect()
    }

    /// Find the class a reference names and check it provides `role`.
    ///
    /// # Errors
    ///
    /// `UnknownAlias` for an unregistered alias; `ComponentLoad` when the
    /// module or class is missing or the class has another role.
    pub fn lookup(&self, reference: &ComponentRef, role: Role) -> Result<&ClassExport, PipelineError> {
        let (module, class) = match reference {
            ComponentRef::Alias(alias) => {
                let (module, class) =
                    self.aliases
                        .get(alias)
                        .ok_or_else(|| PipelineError::UnknownAlias {
                            alias: alias.clone(),
                        })?;
                (module.as_str(), class.as_str())
            }
            ComponentRef::Class { module, class } => (module.as_str(), class.as_str()),
        };

        let load_error = |reason: String| PipelineError::ComponentLoad {
            reference: reference.to_string(),
            reason,
        };

        let classes = self
            .modules
            .get(module)
            .ok_or_else(|| load_error(format!("module '{module}' not found")))?;
        let export = classes
            .get(class)
            .ok_or_else(|| load_error(format!("class '{class}' not found in module '{module}'")))?;
        if export.role() != role {
            return Err(load_error(format!(
                "class '{class}' is a {} and does not implement the {role} capability",
                export.role()
            )));
        }
        Ok(export)
    }

    /// Construct the extractor a spec names. Only secrets targeted at this
    /// component are injected.
    ///
    /// # Errors
    ///
    /// Lookup errors as in [`Self::lookup`]; `ComponentInit` when the
    /// constructor rejects the merged parameters.
    pub fn resolve_extractor(
        &self,
        spec: &RenderedSpec,
        secrets: &ResolvedSecrets,
    ) -> Result<Box<dyn Extractor>, PipelineError> {
        let export = self.lookup(&spec.reference, Role::Extractor)?;
        let injected = secrets.for_component(&spec.reference, Role::Extractor);
        let params = merge_params(&export.defaults, spec, &injected);
        match &export.constructor {
            Constructor::Extractor(ctor) => ctor(params).map_err(|e| init_error(spec, e)),
            other => Err(role_mismatch(spec, other.role(), Role::Extractor)),
        }
    }

    pub fn resolve_transformer(
        &self,
        spec: &RenderedSpec,
        secrets: &ResolvedSecrets,
    ) -> Result<Box<dyn Transformer>, PipelineError> {
        let export = self.lookup(&spec.reference, Role::Transformer)?;
        let injected = secrets.for_component(&spec.reference, Role::Transformer);
        let params = merge_params(&export.defaults, spec, &injected);
        match &export.constructor {
            Constructor::Transformer(ctor) => ctor(params).map_err(|e| init_error(spec, e)),
            other => Err(role_mismatch(spec, other.role(), Role::Transformer)),
        }
    }

    pub fn resolve_loader(
        &self,
        spec: &RenderedSpec,
        secrets: &ResolvedSecrets,
    ) -> Result<Box<dyn Loader>, PipelineError> {
        let export = self.lookup(&spec.reference, Role::Loader)?;
        let injected = secrets.for_component(&spec.reference, Role::Loader);
        let params = merge_params(&export.defaults, spec, &injected);
        match &export.constructor {
            Constructor::Loader(ctor) => ctor(params).map_err(|e| init_error(spec, e)),
            other => Err(role_mismatch(spec, other.role(), Role::Loader)),
        }
    }
}

/// Constructor parameters, lowest precedence first: class defaults, plain
/// spec params, secrets injected into this component, templated spec params.
#[must_use]
pub fn merge_params(defaults: &Params, spec: &RenderedSpec, injected: &Params) -> Params {
    let mut merged = defaults.clone();
    for layer in [&spec.plain, injected, &spec.templated] {
        merged.extend(layer.iter().map(|(k, v)| (k.clone(), v.clone())));
    }
    merged
}

fn init_error(spec: &RenderedSpec, source: sigflow_sdk::errors::ComponentError) -> PipelineError {
    PipelineError::ComponentInit {
        reference: spec.reference.to_string(),
        source,
    }
}

fn role_mismatch(spec: &RenderedSpec, actual: Role, wanted: Role) -> PipelineError {
    PipelineError::ComponentLoad {
        reference: spec.reference.to_string(),
        reason: format!("{actual} does not implement the {wanted} capability"),
    }
}
