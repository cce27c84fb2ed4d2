//! Model/table join

use super::types::{MergedTable, PublishColumn};
use crate::dbt::{Model, ModelColumn};
use crate::tableau::{Column, Database, Table};
use crate::types::Fqn;
use std::collections::{BTreeMap, HashMap};
use tracing::{info, warn};

/// Schema prefixes dbt keeps on model names but Tableau drops
const SCHEMA_PREFIXES: &[(&str, &str)] = &[("common", "common_"), ("core_ng", "core_")];

/// Put back the model-name prefix Tableau drops for some schemas.
///
/// Names that already carry the prefix are left untouched, so applying this
/// more than once is harmless.
pub fn restore_full_model_name(mut database: Database) -> Database {
    for table in &mut database.tables {
        let schema = table.schema.to_lowercase();
        let Some((_, prefix)) = SCHEMA_PREFIXES.iter().find(|(s, _)| *s == schema) else {
            continue;
        };
        if !table.name.to_lowercase().starts_with(prefix) {
            table.name = format!("{prefix}{}", table.name);
        }
    }
    database
}

/// Join the catalog tables of `database` with the dbt models building them.
///
/// One merged record is produced per table whose normalized
/// `database.schema.name` equals a model's. When two models share an FQN the
/// first one wins. Output is sorted by table name, then LUID.
pub fn merge(database: &Database, tables: &[Table], models: &[Model]) -> Vec<MergedTable> {
    let mut models_by_fqn: HashMap<Fqn, &Model> = HashMap::with_capacity(models.len());
    for model in models {
        let fqn = Fqn::new(&model.database, &model.schema, &model.name);
        if models_by_fqn.contains_key(&fqn) {
            warn!("Duplicate dbt model {fqn}, keeping the first one");
            continue;
        }
        models_by_fqn.insert(fqn, model);
    }

    let mut merged: Vec<MergedTable> = tables
        .iter()
        .filter_map(|table| {
            let fqn = Fqn::new(&database.name, &table.schema, &table.name);
            models_by_fqn
                .get(&fqn)
                .map(|model| MergedTable::from_parts(&database.name, table, model))
        })
        .collect();

    merged.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.luid.cmp(&b.luid)));

    info!(
        "Merged {} dbt models and Tableau tables in Tableau database: {}",
        merged.len(),
        database.name
    );
    merged
}

/// `[DATABASE].[SCHEMA].[TABLE]`, as shown in log lines
pub fn format_table_reference(table: &MergedTable) -> String {
    format!(
        "[{}].[{}].[{}]",
        table.database.to_uppercase(),
        table.schema.to_uppercase(),
        table.name.to_uppercase()
    )
}

/// Pair catalog columns with dbt column docs by upper-cased name.
///
/// The LUID comes from Tableau and the description from dbt only; a column
/// documented in dbt but absent from the catalog ends up without a LUID.
/// Output is sorted by upper-cased name.
pub fn merge_columns(tableau_columns: &[Column], dbt_columns: &[ModelColumn]) -> Vec<PublishColumn> {
    let mut by_name: BTreeMap<String, PublishColumn> = BTreeMap::new();

    for column in tableau_columns {
        let key = column.name.as_deref().unwrap_or_default().to_uppercase();
        let entry = by_name.entry(key).or_default();
        entry.name = column.name.clone();
        entry.luid = column.luid.clone();
    }

    for column in dbt_columns {
        let entry = by_name.entry(column.name.to_uppercase()).or_default();
        if entry.name.is_none() {
            entry.name = Some(column.name.clone());
        }
        entry.description = column.description.clone();
    }

    by_name.into_values().collect()
}
