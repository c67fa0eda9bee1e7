//! Breed catalog with label, name, and model-index resolution

use super::BreedProfile;
use crate::assets::AssetLayout;
use crate::{Error, Result};
use std::collections::HashMap;

/// Minimum similarity for a fuzzy breed-name match
const FUZZY_THRESHOLD: f64 = 0.85;

/// Read-only breed reference store
///
/// Built once at startup and shared by reference across recognition calls.
/// Label order (the model's output order) defines the dense index space used
/// by `by_index`/`count`; dataset records that are not recognition-available
/// stay resolvable by name but never by index.
#[derive(Debug, Clone, Default)]
pub struct BreedCatalog {
    profiles: Vec<BreedProfile>,
    /// Normalized name/id -> slot in `profiles`
    by_key: HashMap<String, usize>,
    /// Recognizable slots in model-output order
    recognizable: Vec<usize>,
}

impl BreedCatalog {
    /// Build minimal profiles from a model label list
    pub fn from_labels(labels: &[String]) -> Self {
        Self::from_labels_and_dataset(labels, Vec::new())
    }

    /// Build from full dataset records (each carrying its own `ml_index`)
    pub fn from_profiles(profiles: Vec<BreedProfile>) -> Self {
        let mut catalog = Self {
            profiles,
            by_key: HashMap::new(),
            recognizable: Vec::new(),
        };
        catalog.rebuild_lookups();
        catalog
    }

    /// Merge a label list with dataset records. The label order is
    /// authoritative for `ml_index`; dataset records matched by normalized
    /// name or id contribute their descriptive attributes. Unmatched dataset
    /// records are kept without an index.
    pub fn from_labels_and_dataset(labels: &[String], dataset: Vec<BreedProfile>) -> Self {
        let mut dataset_by_key: HashMap<String, BreedProfile> = HashMap::new();
        for profile in dataset {
            dataset_by_key.insert(normalize(&profile.id), profile.clone());
            dataset_by_key.insert(normalize(&profile.name), profile);
        }

        let mut profiles = Vec::with_capacity(labels.len());
        let mut matched_ids: Vec<String> = Vec::new();
        for (index, label) in labels.iter().enumerate() {
            match dataset_by_key.get(&normalize(label)) {
                Some(record) => {
                    let mut profile = record.clone();
                    profile.ml_index = Some(index);
                    matched_ids.push(profile.id.clone());
                    profiles.push(profile);
                }
                None => profiles.push(BreedProfile::from_label(label, index)),
            }
        }

        // Dataset records with no label stay name-resolvable only
        let mut extras: Vec<BreedProfile> = dataset_by_key
            .into_values()
            .filter(|p| !matched_ids.contains(&p.id))
            .collect();
        extras.sort_by(|a, b| a.id.cmp(&b.id));
        extras.dedup_by(|a, b| a.id == b.id);
        for mut extra in extras {
            extra.ml_index = None;
            profiles.push(extra);
        }

        Self::from_profiles(profiles)
    }

    /// Load labels plus (when present) the breed dataset from the asset layout
    pub fn load(layout: &AssetLayout) -> Result<Self> {
        let labels = layout.load_labels()?;

        let dataset_path = layout.breed_data_path();
        let dataset: Vec<BreedProfile> = if dataset_path.exists() {
            let content = std::fs::read_to_string(&dataset_path)?;
            serde_json::from_str(&content).map_err(|e| {
                Error::Parse(format!(
                    "invalid breed dataset {}: {}",
                    dataset_path.display(),
                    e
                ))
            })?
        } else {
            tracing::debug!(
                "no breed dataset at {}, using label-derived profiles",
                dataset_path.display()
            );
            Vec::new()
        };

        Ok(Self::from_labels_and_dataset(&labels, dataset))
    }

    /// Resolve a model output label to a recognition-available profile
    pub fn resolve_by_label(&self, label: &str) -> Option<&BreedProfile> {
        let slot = *self.by_key.get(&normalize(label))?;
        let profile = &self.profiles[slot];
        if profile.available_for_recognition {
            Some(profile)
        } else {
            None
        }
    }

    /// Resolve a display name, case-insensitively, with a fuzzy fallback for
    /// typos (similarity > 0.85)
    pub fn resolve_by_name(&self, name: &str) -> Option<&BreedProfile> {
        let needle = normalize(name);
        if needle.is_empty() {
            return None;
        }
        if let Some(&slot) = self.by_key.get(&needle) {
            return Some(&self.profiles[slot]);
        }

        let mut best: Option<(f64, usize)> = None;
        for (slot, profile) in self.profiles.iter().enumerate() {
            let similarity = strsim::normalized_levenshtein(&needle, &normalize(&profile.name));
            if similarity > FUZZY_THRESHOLD {
                match best {
                    Some((s, _)) if s >= similarity => {}
                    _ => best = Some((similarity, slot)),
                }
            }
        }
        if let Some((similarity, slot)) = best {
            tracing::debug!(
                "Fuzzy matched breed name '{}' to '{}' (similarity: {:.2})",
                name,
                self.profiles[slot].name,
                similarity
            );
            return Some(&self.profiles[slot]);
        }
        None
    }

    /// The i-th recognizable breed in model-output order (the index space the
    /// fallback classifier selects from)
    pub fn by_index(&self, index: usize) -> Option<&BreedProfile> {
        let slot = *self.recognizable.get(index)?;
        Some(&self.profiles[slot])
    }

    /// Number of breeds available for recognition
    pub fn count(&self) -> usize {
        self.recognizable.len()
    }

    /// Total number of profiles, including name-only records
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// All profiles in storage order
    pub fn profiles(&self) -> &[BreedProfile] {
        &self.profiles
    }

    fn rebuild_lookups(&mut self) {
        self.by_key.clear();
        self.recognizable.clear();

        for (slot, profile) in self.profiles.iter().enumerate() {
            self.by_key.entry(normalize(&profile.id)).or_insert(slot);
            self.by_key.entry(normalize(&profile.name)).or_insert(slot);
        }

        let mut indexed: Vec<(usize, usize)> = self
            .profiles
            .iter()
            .enumerate()
            .filter(|(_, p)| p.available_for_recognition)
            .filter_map(|(slot, p)| p.ml_index.map(|ml_index| (ml_index, slot)))
            .collect();
        indexed.sort_by_key(|(ml_index, _)| *ml_index);
        self.recognizable = indexed.into_iter().map(|(_, slot)| slot).collect();
    }
}

/// Shared lookup key form: trimmed, lowercased, underscores as spaces,
/// whitespace collapsed
fn normalize(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .replace('_', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<String> {
        vec![
            "Abyssinian".to_string(),
            "american_shorthair".to_string(),
            "Bengal".to_string(),
            "british_shorthair".to_string(),
            "Persian".to_string(),
        ]
    }

    #[test]
    fn test_from_labels_builds_dense_index() {
        let catalog = BreedCatalog::from_labels(&labels());
        assert_eq!(catalog.count(), 5);
        assert_eq!(catalog.by_index(0).unwrap().name, "Abyssinian");
        assert_eq!(catalog.by_index(3).unwrap().name, "British Shorthair");
        assert!(catalog.by_index(5).is_none());
    }

    #[test]
    fn test_resolve_by_label_normalizes() {
        let catalog = BreedCatalog::from_labels(&labels());
        assert_eq!(
            catalog.resolve_by_label("british_shorthair").unwrap().id,
            "british_shorthair"
        );
        assert_eq!(
            catalog.resolve_by_label("British Shorthair").unwrap().id,
            "british_shorthair"
        );
        assert_eq!(
            catalog.resolve_by_label("  BENGAL ").unwrap().name,
            "Bengal"
        );
        assert!(catalog.resolve_by_label("labrador").is_none());
    }

    #[test]
    fn test_resolve_by_name_case_insensitive() {
        let catalog = BreedCatalog::from_labels(&labels());
        assert_eq!(catalog.resolve_by_name("persian").unwrap().name, "Persian");
        assert_eq!(
            catalog.resolve_by_name("AMERICAN SHORTHAIR").unwrap().id,
            "american_shorthair"
        );
    }

    #[test]
    fn test_resolve_by_name_fuzzy_typo() {
        let catalog = BreedCatalog::from_labels(&labels());
        // One inserted character, similarity ~0.94
        let matched = catalog.resolve_by_name("Brittish Shorthair").unwrap();
        assert_eq!(matched.id, "british_shorthair");
    }

    #[test]
    fn test_resolve_by_name_rejects_distant_strings() {
        let catalog = BreedCatalog::from_labels(&labels());
        assert!(catalog.resolve_by_name("Dog").is_none());
        assert!(catalog.resolve_by_name("").is_none());
        assert!(catalog.resolve_by_name("Pershun Longhair Deluxe").is_none());
    }

    #[test]
    fn test_dataset_merge_prefers_label_order() {
        let dataset = vec![
            BreedProfile {
                origin: "United Kingdom".to_string(),
                description: "Round-faced, sturdy cats.".to_string(),
                ml_index: Some(99),
                ..BreedProfile::from_label("british_shorthair", 0)
            },
            BreedProfile::from_label("devon_rex", 98),
        ];
        let catalog = BreedCatalog::from_labels_and_dataset(&labels(), dataset);

        // Label position wins over the dataset's own ml_index
        let british = catalog.resolve_by_label("british_shorthair").unwrap();
        assert_eq!(british.ml_index, Some(3));
        assert_eq!(british.origin, "United Kingdom");

        // Unlabeled dataset record: name-resolvable, never index-resolvable
        assert_eq!(catalog.count(), 5);
        assert_eq!(catalog.len(), 6);
        let devon = catalog.resolve_by_name("Devon Rex").unwrap();
        assert_eq!(devon.ml_index, None);
    }

    #[test]
    fn test_unavailable_breed_excluded_from_index_space() {
        let mut shorthair = BreedProfile::from_label("american_shorthair", 1);
        shorthair.available_for_recognition = false;
        let dataset = vec![shorthair];
        let catalog = BreedCatalog::from_labels_and_dataset(&labels(), dataset);

        assert_eq!(catalog.count(), 4);
        assert!(catalog.resolve_by_label("american_shorthair").is_none());
        // Still name-resolvable for display purposes
        assert!(catalog.resolve_by_name("American Shorthair").is_some());
        // Dense index space skips the unavailable slot
        let indexed: Vec<_> = (0..catalog.count())
            .map(|i| catalog.by_index(i).unwrap().id.clone())
            .collect();
        assert_eq!(indexed, vec!["abyssinian", "bengal", "british_shorthair", "persian"]);
    }

    #[test]
    fn test_load_from_asset_layout() {
        let dir = tempfile::tempdir().unwrap();
        let models = dir.path().join("models");
        let data = dir.path().join("data");
        std::fs::create_dir_all(&models).unwrap();
        std::fs::create_dir_all(&data).unwrap();
        std::fs::write(models.join("labels.txt"), "Abyssinian\nBengal\n").unwrap();
        std::fs::write(
            data.join("breeds.json"),
            r#"[{"id": "bengal", "name": "Bengal", "origin": "United States"}]"#,
        )
        .unwrap();

        let layout = AssetLayout::new(dir.path());
        let catalog = BreedCatalog::load(&layout).unwrap();
        assert_eq!(catalog.count(), 2);
        assert_eq!(
            catalog.resolve_by_label("Bengal").unwrap().origin,
            "United States"
        );
    }

    #[test]
    fn test_load_without_dataset_file() {
        let dir = tempfile::tempdir().unwrap();
        let models = dir.path().join("models");
        std::fs::create_dir_all(&models).unwrap();
        std::fs::write(models.join("labels.txt"), "Abyssinian\n").unwrap();

        let layout = AssetLayout::new(dir.path());
        let catalog = BreedCatalog::load(&layout).unwrap();
        assert_eq!(catalog.count(), 1);
    }

    #[test]
    fn test_load_rejects_malformed_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let models = dir.path().join("models");
        let data = dir.path().join("data");
        std::fs::create_dir_all(&models).unwrap();
        std::fs::create_dir_all(&data).unwrap();
        std::fs::write(models.join("labels.txt"), "Abyssinian\n").unwrap();
        std::fs::write(data.join("breeds.json"), "{not json").unwrap();

        let layout = AssetLayout::new(dir.path());
        assert!(matches!(
            BreedCatalog::load(&layout),
            Err(Error::Parse(_))
        ));
    }
}
