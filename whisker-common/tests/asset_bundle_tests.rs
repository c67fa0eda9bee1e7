//! Asset bundle loading tests
//!
//! Exercises the full bundle path: label file, breed dataset, and config file
//! living together under one assets root, loaded into a catalog plus settings.

use std::path::Path;
use tempfile::TempDir;
use whisker_common::config::{load_settings, parse_settings};
use whisker_common::{AssetLayout, BreedCatalog};

fn write_bundle(dir: &Path, labels: &str, breeds_json: Option<&str>) {
    let models = dir.join("models");
    std::fs::create_dir_all(&models).unwrap();
    std::fs::write(models.join("labels.txt"), labels).unwrap();
    if let Some(json) = breeds_json {
        let data = dir.join("data");
        std::fs::create_dir_all(&data).unwrap();
        std::fs::write(data.join("breeds.json"), json).unwrap();
    }
}

#[test]
fn test_full_bundle_load() {
    let temp_dir = TempDir::new().unwrap();
    write_bundle(
        temp_dir.path(),
        "Abyssinian\nBengal\nbritish_shorthair\nPersian\nSiamese\n",
        Some(
            r#"[
                {
                    "id": "bengal",
                    "name": "Bengal",
                    "origin": "United States",
                    "temperament": "Active, Curious",
                    "energy_level": 5
                },
                {
                    "id": "british_shorthair",
                    "name": "British Shorthair",
                    "available_for_recognition": false
                },
                {
                    "id": "devon_rex",
                    "name": "Devon Rex",
                    "origin": "United Kingdom"
                }
            ]"#,
        ),
    );

    let layout = AssetLayout::new(temp_dir.path());
    let catalog = BreedCatalog::load(&layout).unwrap();

    // Five labels, one opted out of recognition
    assert_eq!(catalog.count(), 4);
    assert_eq!(catalog.len(), 6);

    // Dataset attributes merge onto the label-ordered profile
    let bengal = catalog.resolve_by_label("Bengal").unwrap();
    assert_eq!(bengal.origin, "United States");
    assert_eq!(bengal.energy_level, 5);
    assert_eq!(bengal.ml_index, Some(1));

    // Opted-out breeds resolve by name but never by label or index
    assert!(catalog.resolve_by_label("british_shorthair").is_none());
    assert!(catalog.resolve_by_name("British Shorthair").is_some());

    // Dataset-only records have no model index
    let devon = catalog.resolve_by_name("Devon Rex").unwrap();
    assert_eq!(devon.ml_index, None);
}

#[test]
fn test_label_order_defines_index_space() {
    let temp_dir = TempDir::new().unwrap();
    write_bundle(temp_dir.path(), "Sphynx\nRagdoll\nSiberian\n", None);

    let layout = AssetLayout::new(temp_dir.path());
    let catalog = BreedCatalog::load(&layout).unwrap();

    assert_eq!(catalog.count(), 3);
    assert_eq!(catalog.by_index(0).unwrap().name, "Sphynx");
    assert_eq!(catalog.by_index(1).unwrap().name, "Ragdoll");
    assert_eq!(catalog.by_index(2).unwrap().name, "Siberian");
    assert!(catalog.by_index(3).is_none());

    for index in 0..catalog.count() {
        let profile = catalog.by_index(index).unwrap();
        assert_eq!(profile.ml_index, Some(index));
    }
}

#[test]
fn test_missing_labels_fails_load() {
    let temp_dir = TempDir::new().unwrap();
    let layout = AssetLayout::new(temp_dir.path());
    assert!(BreedCatalog::load(&layout).is_err());
}

#[test]
fn test_settings_file_beside_bundle() {
    let temp_dir = TempDir::new().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    std::fs::write(
        &config_path,
        r#"
        assets_root = "/opt/whisker"

        [recognition]
        bridge_timeout_ms = 3000
        confidence_threshold = 0.5
        "#,
    )
    .unwrap();

    let settings = load_settings(Some(&config_path)).unwrap();
    assert_eq!(settings.bridge_timeout_ms, 3000);
    assert_eq!(settings.confidence_threshold, 0.5);
    // Unspecified keys keep the compiled defaults
    assert!(settings.enhancement_enabled);
    assert_eq!(settings.init_timeout_ms, 15_000);
}

#[test]
fn test_settings_without_recognition_table() {
    let settings = parse_settings("assets_root = \"/opt/whisker\"\n").unwrap();
    assert_eq!(settings.bridge_timeout_ms, 10_000);
    assert!(settings.surface_heuristic);
}
