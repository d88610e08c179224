//! # Presentation Engine
//!
//! Owns the ruleset registry and the two-phase content flow: widen a raw
//! selection under a named scope, then compute content for it against an
//! open snapshot.
//!
//! ## Lifecycle
//!
//! The engine starts uninitialized. Every operation before `initialize()`
//! (or after `teardown()`) fails with [`PresentationError::NotInitialized`];
//! this is a precondition on the caller, not a race to be retried.
//! `teardown()` also clears the ruleset registry.

use crate::content::{
    format_display_value, Content, ContentItem, Descriptor, DescriptorOverrides, Field, ValueKind,
};
use crate::error::{PresentationError, Result};
use crate::ruleset::{ContentSpecification, Ruleset, RulesetOrId};
use crate::selection::{self, SelectionKey, SelectionKeySet, SelectionScope};
use core_snapshot::{LocalSnapshot, RecordId};
use sqlx::Row;
use std::collections::HashMap;
use tracing::{debug, info, instrument};

/// Stateful front door for selection scoping and content computation.
#[derive(Debug, Default)]
pub struct PresentationEngine {
    initialized: bool,
    rulesets: HashMap<String, Ruleset>,
}

impl PresentationEngine {
    /// Create an engine in the uninitialized state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bring the engine into the operational state.
    pub fn initialize(&mut self) {
        info!("Initializing presentation engine");
        self.initialized = true;
    }

    /// Return to the uninitialized state and clear the ruleset registry.
    pub fn teardown(&mut self) {
        info!("Tearing down presentation engine");
        self.initialized = false;
        self.rulesets.clear();
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    fn ensure_initialized(&self) -> Result<()> {
        if self.initialized {
            Ok(())
        } else {
            Err(PresentationError::NotInitialized)
        }
    }

    /// Register a ruleset for later lookup by id.
    ///
    /// Re-registering an id replaces the previous ruleset.
    pub fn register_ruleset(&mut self, ruleset: Ruleset) -> Result<()> {
        self.ensure_initialized()?;
        debug!(ruleset_id = %ruleset.id, "Registering ruleset");
        self.rulesets.insert(ruleset.id.clone(), ruleset);
        Ok(())
    }

    fn resolve_ruleset(&self, ruleset_or_id: &RulesetOrId) -> Result<Ruleset> {
        match ruleset_or_id {
            RulesetOrId::Ruleset(ruleset) => Ok(ruleset.clone()),
            RulesetOrId::Id(id) => self
                .rulesets
                .get(id)
                .cloned()
                .ok_or_else(|| PresentationError::UnknownRuleset(id.clone())),
        }
    }

    /// Widen raw record identifiers into a selection under the named scope.
    #[instrument(skip(self, snapshot, ids), fields(count = ids.len()))]
    pub async fn compute_selection(
        &self,
        snapshot: &LocalSnapshot,
        ids: &[RecordId],
        scope_id: &str,
    ) -> Result<SelectionKeySet> {
        self.ensure_initialized()?;
        let scope = SelectionScope::parse(scope_id)?;
        selection::resolve_selection(snapshot, ids, scope).await
    }

    /// Compute content for a selection.
    ///
    /// Returns `Ok(None)` when the selection is empty or no specification of
    /// the ruleset matches it; a present result always carries a descriptor
    /// and at least one item.
    #[instrument(skip(self, snapshot, ruleset_or_id, keys), fields(keys = keys.len()))]
    pub async fn get_content(
        &self,
        snapshot: &LocalSnapshot,
        ruleset_or_id: &RulesetOrId,
        overrides: &DescriptorOverrides,
        keys: &SelectionKeySet,
    ) -> Result<Option<Content>> {
        self.ensure_initialized()?;
        let ruleset = self.resolve_ruleset(ruleset_or_id)?;

        if keys.is_empty() {
            debug!(ruleset_id = %ruleset.id, "Empty selection, no content");
            return Ok(None);
        }

        // Load each selected record's properties once, in storage order.
        let mut properties: HashMap<&SelectionKey, Vec<PropertyRow>> = HashMap::new();
        for key in keys {
            properties.insert(key, fetch_properties(snapshot, key).await?);
        }

        // Fold specification contributions left to right. The first
        // declaration of a field name wins, both in the descriptor and in
        // each item's value maps.
        let mut fields: Vec<Field> = Vec::new();
        let mut item_values: HashMap<&SelectionKey, HashMap<String, serde_json::Value>> =
            HashMap::new();
        let mut matched_any = false;

        for spec in ruleset.content_specifications() {
            let matched: Vec<&SelectionKey> = keys
                .iter()
                .filter(|key| spec_matches(spec, key))
                .collect();
            if matched.is_empty() {
                continue;
            }
            matched_any = true;

            for key in matched {
                let values = item_values.entry(key).or_default();
                for prop in &properties[key] {
                    if !fields.iter().any(|field| field.name == prop.name) {
                        fields.push(Field::new(&prop.name, &prop.label, prop.kind));
                    }
                    values
                        .entry(prop.name.clone())
                        .or_insert_with(|| prop.value.clone());
                }
            }
        }

        if !matched_any {
            debug!(ruleset_id = %ruleset.id, "No specification matched the selection");
            return Ok(None);
        }

        // List display keeps primitive fields only; membership is unaffected.
        if overrides.display_type == crate::content::DisplayType::List {
            fields.retain(Field::is_primitive);
        }

        let descriptor = Descriptor {
            display_type: overrides.display_type,
            fields,
        };

        // Items iterate in selection order; both maps carry exactly the
        // descriptor's field names, with absent fields as "" / null.
        let content_set: Vec<ContentItem> = keys
            .iter()
            .filter_map(|key| item_values.get(key).map(|values| (key, values)))
            .map(|(key, values)| build_item(key, values, &descriptor))
            .collect();

        debug!(
            ruleset_id = %ruleset.id,
            fields = descriptor.fields.len(),
            items = content_set.len(),
            "Computed content"
        );

        Ok(Some(Content {
            descriptor,
            content_set,
        }))
    }
}

fn spec_matches(spec: &ContentSpecification, key: &SelectionKey) -> bool {
    match spec {
        ContentSpecification::SelectedInstances => true,
        ContentSpecification::InstancesOfClass { class_name } => key.class_name == *class_name,
    }
}

fn build_item(
    key: &SelectionKey,
    values: &HashMap<String, serde_json::Value>,
    descriptor: &Descriptor,
) -> ContentItem {
    let mut display_values = HashMap::new();
    let mut persisted = HashMap::new();

    for field in &descriptor.fields {
        let value = values
            .get(&field.name)
            .cloned()
            .unwrap_or(serde_json::Value::Null);
        display_values.insert(field.name.clone(), format_display_value(field.kind, &value));
        persisted.insert(field.name.clone(), value);
    }

    ContentItem {
        key: key.clone(),
        display_values,
        values: persisted,
    }
}

struct PropertyRow {
    name: String,
    label: String,
    kind: ValueKind,
    value: serde_json::Value,
}

async fn fetch_properties(snapshot: &LocalSnapshot, key: &SelectionKey) -> Result<Vec<PropertyRow>> {
    let rows = sqlx::query(
        "SELECT prop_name, prop_label, value_kind, raw_value \
         FROM element_properties WHERE element_id = ? ORDER BY rowid",
    )
    .bind(key.id.as_str())
    .fetch_all(snapshot.pool()?)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let kind = match row.get::<String, _>("value_kind").as_str() {
                "composite" => ValueKind::Composite,
                _ => ValueKind::Primitive,
            };
            // A NULL raw_value is a property with no stored value, not an
            // empty string.
            let value = match row.get::<Option<String>, _>("raw_value") {
                Some(raw) => serde_json::from_str(&raw)
                    .unwrap_or(serde_json::Value::String(raw)),
                None => serde_json::Value::Null,
            };
            PropertyRow {
                name: row.get("prop_name"),
                label: row.get("prop_label"),
                kind,
                value,
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ruleset::Rule;

    fn operational_engine() -> PresentationEngine {
        let mut engine = PresentationEngine::new();
        engine.initialize();
        engine
    }

    #[test]
    fn test_operations_require_initialization() {
        let mut engine = PresentationEngine::new();
        let result = engine.register_ruleset(Ruleset::new("r", vec![]));
        assert!(matches!(result, Err(PresentationError::NotInitialized)));
    }

    #[test]
    fn test_teardown_clears_registry() {
        let mut engine = operational_engine();
        engine
            .register_ruleset(Ruleset::new(
                "properties",
                vec![Rule::content(vec![ContentSpecification::SelectedInstances])],
            ))
            .unwrap();

        engine.teardown();
        assert!(!engine.is_initialized());

        engine.initialize();
        let result = engine.resolve_ruleset(&RulesetOrId::Id("properties".to_string()));
        assert!(matches!(result, Err(PresentationError::UnknownRuleset(_))));
    }

    #[test]
    fn test_inline_ruleset_needs_no_registration() {
        let engine = operational_engine();
        let inline = RulesetOrId::from(Ruleset::new(
            "adhoc",
            vec![Rule::content(vec![ContentSpecification::SelectedInstances])],
        ));
        assert!(engine.resolve_ruleset(&inline).is_ok());
    }

    #[test]
    fn test_selected_instances_matches_any_class() {
        let key = SelectionKey::new("DrawingGraphic", "0x10");
        assert!(spec_matches(&ContentSpecification::SelectedInstances, &key));
        assert!(spec_matches(
            &ContentSpecification::InstancesOfClass {
                class_name: "DrawingGraphic".to_string()
            },
            &key
        ));
        assert!(!spec_matches(
            &ContentSpecification::InstancesOfClass {
                class_name: "PhysicalObject".to_string()
            },
            &key
        ));
    }

    #[test]
    fn test_list_display_drops_composite_fields() {
        let mut fields = vec![
            Field::new("name", "Name", ValueKind::Primitive),
            Field::new("source", "Source", ValueKind::Composite),
        ];
        fields.retain(Field::is_primitive);
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "name");
    }
}
