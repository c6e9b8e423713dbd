//! Grouping of item projections into sink targets

use std::collections::{BTreeMap, BTreeSet};

use vaultsync_model::{Item, SecretDocument, TargetKey};

use super::projector::{ItemProjection, parse_namespaces, project_item, resolve_secret_name};

/// Merged desired state of one sink object
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetPlan {
    pub key: TargetKey,
    pub document: SecretDocument,
    pub annotations: BTreeMap<String, String>,
    pub labels: BTreeMap<String, String>,
    /// Items contributing to this target, in fetch order
    pub item_ids: Vec<String>,
}

impl TargetPlan {
    fn new(key: TargetKey) -> Self {
        Self {
            key,
            document: SecretDocument::new(),
            annotations: BTreeMap::new(),
            labels: BTreeMap::new(),
            item_ids: Vec::new(),
        }
    }
}

/// Desired state of every target for one cycle
#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    /// Targets ordered by namespace, then name
    pub targets: BTreeMap<TargetKey, TargetPlan>,
    pub warnings: Vec<String>,
    /// Items failing projection, with the reason
    pub failed_items: Vec<(String, String)>,
    /// Targets a failed item still resolves to. Cleanup leaves them alone.
    pub held_targets: BTreeSet<TargetKey>,
    /// Items carrying no target namespace
    pub untargeted_items: usize,
    pub item_count: usize,
}

impl SyncPlan {
    /// Project and group `items`. Later items win on key collisions.
    pub fn build(items: &[Item]) -> Self {
        let mut plan = Self {
            item_count: items.len(),
            ..Self::default()
        };
        // Which item last wrote each key of each target, for collision warnings
        let mut writers: BTreeMap<TargetKey, BTreeMap<String, String>> = BTreeMap::new();

        for item in items {
            let projection = match project_item(item) {
                Ok(Some(p)) => p,
                Ok(None) => {
                    tracing::debug!("Item {} has no target namespaces; skipped", item.id);
                    plan.untargeted_items += 1;
                    continue;
                }
                Err(e) => {
                    tracing::warn!("Item {} failed projection: {}", item.id, e);
                    plan.warnings.push(format!("item {} skipped: {}", item.id, e));
                    plan.failed_items.push((item.id.clone(), e.to_string()));
                    plan.hold_targets_of(item);
                    continue;
                }
            };
            plan.add(projection, &mut writers);
        }

        plan
    }

    fn hold_targets_of(&mut self, item: &Item) {
        let Ok(name) = resolve_secret_name(item) else {
            return;
        };
        for namespace in parse_namespaces(item) {
            self.held_targets.insert(TargetKey::new(&namespace, &name));
        }
    }

    fn add(
        &mut self,
        projection: ItemProjection,
        writers: &mut BTreeMap<TargetKey, BTreeMap<String, String>>,
    ) {
        self.warnings.extend(projection.warnings.iter().cloned());

        for namespace in &projection.namespaces {
            let key = TargetKey::new(namespace, &projection.secret_name);
            let target = self
                .targets
                .entry(key.clone())
                .or_insert_with(|| TargetPlan::new(key.clone()));
            let owners = writers.entry(key.clone()).or_default();

            for (data_key, value) in &projection.document {
                if let Some(previous) = owners.insert(data_key.clone(), projection.item_id.clone())
                    && previous != projection.item_id
                {
                    self.warnings.push(format!(
                        "{}: key {:?} from item {} overwritten by item {}",
                        key, data_key, previous, projection.item_id
                    ));
                }
                target.document.insert(data_key.clone(), value.clone());
            }
            target.annotations.extend(
                projection
                    .annotations
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone())),
            );
            target
                .labels
                .extend(projection.labels.iter().map(|(k, v)| (k.clone(), v.clone())));
            target.item_ids.push(projection.item_id.clone());
        }
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn contains(&self, namespace: &str, name: &str) -> bool {
        self.targets.contains_key(&TargetKey::new(namespace, name))
    }

    /// Whether the object is planned or still claimed by a failed item
    pub fn claims(&self, namespace: &str, name: &str) -> bool {
        let key = TargetKey::new(namespace, name);
        self.targets.contains_key(&key) || self.held_targets.contains(&key)
    }
}
