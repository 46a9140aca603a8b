use super::*;
use crate::keyboard_capture::{ModifierKey, ModifierSet};
use std::sync::Mutex;
use tempfile::TempDir;

fn option() -> ModifierSet {
    ModifierSet::only(ModifierKey::Option)
}

/// Records which identifiers fired
#[derive(Default, Clone)]
struct FiredLog(Arc<Mutex<Vec<String>>>);

impl FiredLog {
    fn action(&self, identifier: &str) -> ShortcutAction {
        let log = self.0.clone();
        let identifier = identifier.to_string();
        Arc::new(move || log.lock().unwrap().push(identifier.clone()))
    }

    fn fired(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    fn factory(&self) -> ActionFactory {
        let log = self.clone();
        Arc::new(move |identifier: &str| Some(log.action(identifier)))
    }
}

#[test]
fn test_register_and_execute() {
    let log = FiredLog::default();
    let mut registry = ShortcutRegistry::new();

    registry
        .register(ShortcutBinding::new(18, option(), "app_1"), Some(log.action("app_1")))
        .unwrap();

    assert!(registry.execute_if_registered(18, option()));
    assert!(!registry.execute_if_registered(19, option()));
    assert!(!registry.execute_if_registered(18, option().with(ModifierKey::Shift)));
    assert_eq!(log.fired(), vec!["app_1"]);
}

#[test]
fn test_second_registration_of_same_combo_conflicts() {
    let log = FiredLog::default();
    let mut registry = ShortcutRegistry::new();

    registry
        .register(ShortcutBinding::new(18, option(), "app_1"), Some(log.action("app_1")))
        .unwrap();
    let result = registry.register(ShortcutBinding::new(18, option(), "app_2"), Some(log.action("app_2")));

    assert_eq!(
        result,
        Err(ShortcutError::Conflict {
            combo: "option+1".to_string(),
            existing: "app_1".to_string(),
        })
    );
    assert_eq!(registry.len(), 1);
    assert!(registry.execute_if_registered(18, option()));
    assert_eq!(log.fired(), vec!["app_1"]);
}

#[test]
fn test_invalid_shortcuts_rejected() {
    let mut registry = ShortcutRegistry::new();

    assert!(matches!(
        registry.register(ShortcutBinding::new(18, ModifierSet::empty(), "a"), None),
        Err(ShortcutError::InvalidShortcut(_))
    ));
    assert!(matches!(
        registry.register(ShortcutBinding::new(0, option(), "a"), None),
        Err(ShortcutError::InvalidShortcut(_))
    ));
    assert!(registry.is_empty());
}

#[test]
fn test_reserved_shortcut_rejected() {
    let mut registry = ShortcutRegistry::new();
    let result = registry.register(
        ShortcutBinding::new(48, ModifierSet::only(ModifierKey::Command), "switcher"),
        None,
    );
    assert!(matches!(result, Err(ShortcutError::SystemReserved(_))));
}

#[test]
fn test_unregister_removes_binding_and_action() {
    let log = FiredLog::default();
    let mut registry = ShortcutRegistry::new();
    let binding = ShortcutBinding::new(18, option(), "app_1");
    registry.register(binding.clone(), Some(log.action("app_1"))).unwrap();

    assert!(registry.unregister(&binding));
    assert!(!registry.unregister(&binding));
    assert!(!registry.execute_if_registered(18, option()));
    assert!(log.fired().is_empty());

    // The combination is free again
    registry.register(ShortcutBinding::new(18, option(), "app_2"), None).unwrap();
}

#[test]
fn test_binding_without_action_still_matches() {
    let mut registry = ShortcutRegistry::new();
    registry.register(ShortcutBinding::new(18, option(), "app_1"), None).unwrap();

    let found = registry.matching(18, option()).unwrap();
    assert_eq!(found.identifier, "app_1");
    assert!(!found.invoke());
    assert!(registry.execute_if_registered(18, option()));
}

#[test]
fn test_action_factory_supplies_actions() {
    let log = FiredLog::default();
    let mut registry = ShortcutRegistry::with_action_factory(log.factory());

    registry.register(ShortcutBinding::new(19, option(), "app_2"), None).unwrap();
    registry.execute_if_registered(19, option());

    assert_eq!(log.fired(), vec!["app_2"]);
}

#[test]
fn test_export_import_reproduces_bindings() {
    let mut source = ShortcutRegistry::new();
    let bindings = vec![
        ShortcutBinding::new(18, option(), "app_1"),
        ShortcutBinding::new(19, option(), "app_2"),
        ShortcutBinding::new(122, option().with(ModifierKey::Control), "app_3"),
    ];
    for binding in &bindings {
        source.register(binding.clone(), None).unwrap();
    }

    let data = source.export().unwrap();
    let mut target = ShortcutRegistry::new();
    assert_eq!(target.import(&data).unwrap(), 3);

    let mut imported = target.bindings();
    let mut expected = bindings;
    imported.sort_by_key(|b| b.identifier.clone());
    expected.sort_by_key(|b| b.identifier.clone());
    assert_eq!(imported, expected);
}

#[test]
fn test_import_attaches_factory_actions() {
    let log = FiredLog::default();
    let mut registry = ShortcutRegistry::with_action_factory(log.factory());
    let data = br#"{"version":1,"bindings":[{"keyCode":20,"modifiers":["option","control"],"identifier":"app_3"}]}"#;

    registry.import(data).unwrap();
    assert!(registry.execute_if_registered(20, option().with(ModifierKey::Control)));
    assert_eq!(log.fired(), vec!["app_3"]);
}

#[test]
fn test_failed_import_leaves_registry_untouched() {
    let mut registry = ShortcutRegistry::new();
    registry.register(ShortcutBinding::new(18, option(), "app_1"), None).unwrap();

    assert!(matches!(
        registry.import(br#"{"version":7,"bindings":[]}"#),
        Err(ShortcutError::MalformedData(_))
    ));
    assert!(matches!(registry.import(b"garbage"), Err(ShortcutError::MalformedData(_))));

    // One bad binding rejects the whole document
    let partly_bad = br#"{"version":1,"bindings":[
        {"keyCode":19,"modifiers":["option"],"identifier":"ok"},
        {"keyCode":19,"modifiers":[],"identifier":"bad"}
    ]}"#;
    assert!(matches!(registry.import(partly_bad), Err(ShortcutError::MalformedData(_))));

    assert_eq!(registry.bindings(), vec![ShortcutBinding::new(18, option(), "app_1")]);
}

#[test]
fn test_detect_conflicts_reports_imported_duplicates() {
    let log = FiredLog::default();
    let mut registry = ShortcutRegistry::with_action_factory(log.factory());
    let data = br#"{"version":1,"bindings":[
        {"keyCode":18,"modifiers":["option"],"identifier":"first"},
        {"keyCode":19,"modifiers":["option"],"identifier":"other"},
        {"keyCode":18,"modifiers":["option"],"identifier":"second"}
    ]}"#;

    registry.import(data).unwrap();

    let conflicts = registry.detect_conflicts();
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].0.identifier, "first");
    assert_eq!(conflicts[0].1.identifier, "second");

    // Lookups resolve to the earliest binding
    registry.execute_if_registered(18, option());
    assert_eq!(log.fired(), vec!["first"]);
}

#[test]
fn test_registered_set_has_no_conflicts() {
    let mut registry = ShortcutRegistry::new();
    registry.register(ShortcutBinding::new(18, option(), "a"), None).unwrap();
    registry.register(ShortcutBinding::new(19, option(), "b"), None).unwrap();
    assert!(registry.detect_conflicts().is_empty());
}

#[test]
fn test_save_and_load_through_store() {
    let dir = TempDir::new().unwrap();
    let store = ShortcutStore::new(dir.path().join("shortcuts.json"));

    let mut registry = ShortcutRegistry::new();
    registry.register(ShortcutBinding::new(18, option(), "app_1"), None).unwrap();
    registry.save_to(&store).unwrap();

    let mut restored = ShortcutRegistry::new();
    assert_eq!(restored.load_from(&store).unwrap(), 1);
    assert_eq!(restored.bindings(), registry.bindings());
}

#[test]
fn test_restore_puts_back_entries_and_actions() {
    let log = FiredLog::default();
    let mut registry = ShortcutRegistry::new();
    registry
        .register(ShortcutBinding::new(18, option(), "app_1"), Some(log.action("app_1")))
        .unwrap();
    let snapshot = registry.snapshot();

    registry.unregister(&ShortcutBinding::new(18, option(), "app_1"));
    registry
        .register(ShortcutBinding::new(19, option(), "app_2"), None)
        .unwrap();
    registry.restore(snapshot);

    assert_eq!(registry.bindings(), vec![ShortcutBinding::new(18, option(), "app_1")]);
    assert!(registry.execute_if_registered(18, option()));
    assert_eq!(log.fired(), vec!["app_1"]);
}
