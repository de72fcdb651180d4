//! Tests for parameter bags, the component registry and the experiment context.

#[cfg(test)]
mod tests {
    use crate::context::{ComponentRegistry, EnvironmentBag, ExperimentContext, ParameterBag};
    use crate::errors::FailureKind;
    use crate::table::{ResultTable, TableComponent, TableConfig};
    use serde_json::{json, Map, Value};
    use std::fs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tempfile::TempDir;

    fn params(value: Value) -> ParameterBag {
        match value {
            Value::Object(map) => ParameterBag::from(map),
            _ => ParameterBag::new(),
        }
    }

    struct DropCounter(Arc<AtomicUsize>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_parameter_bag_require() {
        let bag = params(json!({"corpus": "POC-English", "limit": 10}));

        assert_eq!(bag.require_str("corpus").unwrap(), "POC-English");
        assert_eq!(bag.require("limit").unwrap(), &json!(10));

        let err = bag.require("input_file").unwrap_err();
        assert_eq!(err.kind(), FailureKind::MissingArgument);
        assert_eq!(err.to_string(), "Argument 'input_file' is missing in parameters.");
    }

    #[test]
    fn test_parameter_bag_flags() {
        let bag = params(json!({
            "skip_configuration": "yes",
            "verbose": 0,
            "dry_run": "",
        }));

        assert!(bag.skips_configuration());
        assert!(!bag.flag("verbose"));
        assert!(!bag.flag("dry_run"));
        assert!(!bag.flag("absent"));
        assert!(!ParameterBag::new().skips_configuration());
    }

    #[test]
    fn test_parameter_bag_deserialize() {
        let bag: ParameterBag = serde_json::from_value(json!({"a": 1, "b": [1, 2]})).unwrap();
        assert_eq!(bag.len(), 2);
        assert!(bag.contains_key("b"));
        assert_eq!(bag.to_string(), r#"{"a":1,"b":[1,2]}"#);
    }

    #[test]
    fn test_environment_bag_run_count() {
        let mut env = EnvironmentBag::new();
        assert_eq!(env.run_count(), 0);

        env.insert("RUN_COUNT", json!(3));
        assert_eq!(env.run_count(), 3);

        env.insert("RUN_COUNT", json!("three"));
        assert_eq!(env.run_count(), 0);

        assert!(env.remove("RUN_COUNT").is_some());
        assert!(env.is_empty());
    }

    #[test]
    fn test_registry_insert_and_get() {
        let registry = ComponentRegistry::new();
        assert!(!registry.insert("counter", 41_u32));

        let counter = registry.get::<u32>("counter").unwrap();
        *counter.lock() += 1;

        assert_eq!(*registry.get::<u32>("counter").unwrap().lock(), 42);
        assert!(registry.contains("counter"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_wrong_type_or_name() {
        let registry = ComponentRegistry::new();
        registry.insert("counter", 1_u32);

        assert!(registry.get::<String>("counter").is_none());
        assert!(registry.get::<u32>("missing").is_none());
    }

    #[test]
    fn test_registry_replace_and_remove() {
        let registry = ComponentRegistry::new();
        registry.insert("b", "first".to_string());
        registry.insert("a", 1_u8);

        assert!(registry.insert("b", "second".to_string()));
        assert_eq!(registry.names(), vec!["a".to_string(), "b".to_string()]);
        assert_eq!(registry.get::<String>("b").unwrap().lock().as_str(), "second");

        assert!(registry.remove("a"));
        assert!(!registry.remove("a"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_registry_clear_drops_components() {
        let drops = Arc::new(AtomicUsize::new(0));
        let registry = ComponentRegistry::new();
        registry.insert("one", DropCounter(Arc::clone(&drops)));
        registry.insert("two", DropCounter(Arc::clone(&drops)));

        registry.clear();

        assert_eq!(drops.load(Ordering::SeqCst), 2);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_outstanding_handle_outlives_clear() {
        let drops = Arc::new(AtomicUsize::new(0));
        let registry = ComponentRegistry::new();
        registry.insert("one", DropCounter(Arc::clone(&drops)));

        let handle = registry.get::<DropCounter>("one").unwrap();
        registry.clear();
        assert_eq!(drops.load(Ordering::SeqCst), 0);

        drop(handle);
        assert_eq!(drops.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_context_reset() {
        let mut ctx = ExperimentContext::new();
        let first_run = ctx.run_id();
        ctx.tree_mut().add_root("corpus", Map::new());
        ctx.components().insert("counter", 1_u32);
        ctx.cancellation().cancel("user abort");

        ctx.reset();

        assert!(ctx.tree().is_empty());
        assert!(ctx.components().is_empty());
        assert!(!ctx.cancellation().is_cancelled());
        assert_ne!(ctx.run_id(), first_run);
    }

    #[test]
    fn test_independent_contexts_do_not_share_components() {
        let first = ExperimentContext::new();
        let second = ExperimentContext::default();
        first.components().insert("counter", 1_u32);

        assert!(second.components().get::<u32>("counter").is_none());
        assert_ne!(first.run_id(), second.run_id());
    }

    #[test]
    fn test_reset_static_components_flushes_tables() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("stat.txt");
        let table = ResultTable::from_config(&TableConfig::new(path.to_string_lossy(), 1, 2)).unwrap();

        let ctx = ExperimentContext::new();
        ctx.components().insert("stat", TableComponent::from_table(table));
        {
            let stat = ctx.components().get::<TableComponent>("stat").unwrap();
            let args = Map::new();
            stat.lock().set(&json!(0), &json!(1), &json!("0.75"), &args).unwrap();
        }
        assert!(!path.exists());

        ctx.reset_static_components();

        assert_eq!(fs::read_to_string(&path).unwrap(), "N/A\t0.75\n");
        assert!(ctx.components().is_empty());
    }
}
