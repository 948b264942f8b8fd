//! Smart feature registration
//!
//! Application code groups its smart collections into modules. Startup code
//! lists the module names in `ForestConfig::smart_features`; each one is
//! looked up in a [`SmartFeatureCatalog`] and registered inside its own error
//! boundary, so one broken module never hides the others.

use std::panic::{self, AssertUnwindSafe};

use crate::collection::CollectionRegistry;
use crate::error::{Result, SchemaError};
use crate::host::NativeModel;

/// A group of smart collection registrations
pub trait SmartFeatureModule {
    fn name(&self) -> &str;

    /// Register this module's collections against the host models
    fn register(&self, registry: &CollectionRegistry, models: &[NativeModel]) -> Result<()>;
}

/// Known smart feature modules, in insertion order
#[derive(Default)]
pub struct SmartFeatureCatalog {
    modules: Vec<Box<dyn SmartFeatureModule>>,
}

impl SmartFeatureCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, module: impl SmartFeatureModule + 'static) -> Self {
        self.add(module);
        self
    }

    pub fn add(&mut self, module: impl SmartFeatureModule + 'static) {
        self.modules.push(Box::new(module));
    }

    pub fn get(&self, name: &str) -> Option<&dyn SmartFeatureModule> {
        self.modules.iter().find(|m| m.name() == name).map(|m| &**m)
    }

    pub fn names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name()).collect()
    }
}

/// Outcome of a registration pass
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Modules that registered cleanly
    pub registered: Vec<String>,
    /// Modules that failed, with the failure
    pub failed: Vec<SchemaError>,
}

impl DiscoveryReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Find a model by name, for module implementations
pub fn find_model<'a>(models: &'a [NativeModel], name: &str) -> Result<&'a NativeModel> {
    models
        .iter()
        .find(|m| m.name == name)
        .ok_or_else(|| SchemaError::UnknownCollection(name.to_string()))
}

/// Register every configured module, skipping the ones that fail
///
/// When `selected` is empty every module of the catalog is registered.
pub fn add_smart_features(
    registry: &CollectionRegistry,
    catalog: &SmartFeatureCatalog,
    selected: &[String],
    models: &[NativeModel],
) -> DiscoveryReport {
    let names: Vec<String> = if selected.is_empty() {
        catalog.names().into_iter().map(String::from).collect()
    } else {
        selected.to_vec()
    };

    let mut report = DiscoveryReport::default();
    for name in names {
        match register_module(registry, catalog, &name, models) {
            Ok(()) => {
                tracing::debug!(module = %name, "smart features registered");
                report.registered.push(name);
            }
            Err(e) => {
                tracing::error!(module = %name, error = %e, "cannot register smart features");
                report.failed.push(e);
            }
        }
    }
    report
}

fn register_module(
    registry: &CollectionRegistry,
    catalog: &SmartFeatureCatalog,
    name: &str,
    models: &[NativeModel],
) -> Result<()> {
    let module = catalog.get(name).ok_or_else(|| SchemaError::SmartFeature {
        module: name.to_string(),
        reason: "module is not in the catalog".to_string(),
    })?;

    match panic::catch_unwind(AssertUnwindSafe(|| module.register(registry, models))) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(SchemaError::SmartFeature {
            module: name.to_string(),
            reason: e.to_string(),
        }),
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "panicked".to_string());
            Err(SchemaError::SmartFeature {
                module: name.to_string(),
                reason,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{CollectionDefinition, SmartField};
    use crate::host::NativeField;
    use crate::types::ScalarType;

    struct QuestionForest;

    impl CollectionDefinition for QuestionForest {
        fn name(&self) -> &str {
            "Question"
        }

        fn fields(&self) -> Vec<SmartField> {
            vec![SmartField::new("foo", ScalarType::String)]
        }
    }

    struct Polls;

    impl SmartFeatureModule for Polls {
        fn name(&self) -> &str {
            "polls"
        }

        fn register(&self, registry: &CollectionRegistry, models: &[NativeModel]) -> Result<()> {
            registry.register(&QuestionForest, Some(find_model(models, "Question")?));
            Ok(())
        }
    }

    struct Missing;

    impl SmartFeatureModule for Missing {
        fn name(&self) -> &str {
            "missing"
        }

        fn register(&self, _registry: &CollectionRegistry, models: &[NativeModel]) -> Result<()> {
            find_model(models, "Invoice").map(|_| ())
        }
    }

    struct Panicking;

    impl SmartFeatureModule for Panicking {
        fn name(&self) -> &str {
            "panicking"
        }

        fn register(&self, _registry: &CollectionRegistry, _models: &[NativeModel]) -> Result<()> {
            panic!("broken module")
        }
    }

    fn models() -> Vec<NativeModel> {
        vec![NativeModel::new("Question", "polls", vec![NativeField::pk("AutoField")])]
    }

    #[test]
    fn test_registers_catalog_module() {
        let registry = CollectionRegistry::new();
        let catalog = SmartFeatureCatalog::new().with_module(Polls);

        let report = add_smart_features(&registry, &catalog, &[], &models());
        assert!(report.is_clean());
        assert_eq!(report.registered, vec!["polls".to_string()]);
        assert_eq!(registry.get("Question").unwrap().model.as_deref(), Some("Question"));
    }

    #[test]
    fn test_failures_do_not_abort_discovery() {
        let registry = CollectionRegistry::new();
        let catalog = SmartFeatureCatalog::new()
            .with_module(Missing)
            .with_module(Panicking)
            .with_module(Polls);

        let selected = vec![
            "missing".to_string(),
            "panicking".to_string(),
            "unknown".to_string(),
            "polls".to_string(),
        ];
        let report = add_smart_features(&registry, &catalog, &selected, &models());

        assert_eq!(report.registered, vec!["polls".to_string()]);
        assert_eq!(report.failed.len(), 3);
        assert!(report.failed[1].to_string().contains("broken module"));
        assert_eq!(registry.len(), 1);
    }
}
