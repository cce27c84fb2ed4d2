//! Workbook to exposure conversion

use super::types::{Exposure, ExposureDocument, ExposureOwner, ExposureType};
use crate::error::Result;
use crate::reconcile::MergedTable;
use crate::tableau::Workbook;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Directory exposure files are written to, relative to the dbt project
pub const EXPOSURES_DIR: &str = "exposures";

/// Build the exposures document for workbooks grouped by upstream table.
///
/// A leading empty group is dropped. A workbook reached from several tables
/// yields a single exposure, at the position it was first seen.
pub fn generate_exposures(
    workbooks_by_table: &[Vec<Workbook>],
    server_url: &str,
    site_name: &str,
    maturity: u8,
) -> ExposureDocument {
    let groups = match workbooks_by_table.split_first() {
        Some((first, rest)) if first.is_empty() => rest,
        _ => workbooks_by_table,
    };

    let server_url = server_url.trim_end_matches('/');
    let mut seen = HashSet::new();
    let mut exposures = Vec::new();

    for workbook in groups.iter().flatten() {
        if !seen.insert(workbook_key(workbook)) {
            debug!("Skipping duplicate workbook {}", workbook.name);
            continue;
        }
        exposures.push(exposure_for(workbook, server_url, site_name, maturity));
    }

    info!("Generated {} exposures", exposures.len());
    ExposureDocument::new(exposures)
}

fn workbook_key(workbook: &Workbook) -> String {
    workbook
        .luid
        .clone()
        .or_else(|| workbook.id.clone())
        .unwrap_or_else(|| workbook.name.clone())
}

fn exposure_for(workbook: &Workbook, server_url: &str, site_name: &str, maturity: u8) -> Exposure {
    let mut depends_on: Vec<String> = Vec::with_capacity(workbook.upstream_tables.len());
    for table in &workbook.upstream_tables {
        let reference = format!("ref('{}')", table.name.to_lowercase());
        if !depends_on.contains(&reference) {
            depends_on.push(reference);
        }
    }

    let owner = workbook
        .owner
        .as_ref()
        .map(|o| ExposureOwner {
            name: o.name.clone(),
            email: o.username.clone(),
        })
        .unwrap_or_default();

    Exposure {
        name: workbook.name.clone(),
        kind: ExposureType::Dashboard,
        maturity,
        url: workbook
            .vizportal_url_id
            .as_ref()
            .map(|id| format!("{server_url}/#/{site_name}/workbooks/{id}")),
        description: workbook.description.clone(),
        depends_on,
        owner,
    }
}

/// Rename upstream tables to the model names they were merged under.
///
/// The catalog reports upstream tables by their Tableau name, which can lack
/// the prefix restored before merging. Tables are matched by LUID; others keep
/// their name.
pub fn restore_upstream_names(workbooks: &mut [Workbook], merged: &[MergedTable]) {
    let names: HashMap<&str, &str> = merged
        .iter()
        .filter_map(|t| t.luid.as_deref().map(|luid| (luid, t.name.as_str())))
        .collect();

    for table in workbooks.iter_mut().flat_map(|w| w.upstream_tables.iter_mut()) {
        if let Some(name) = table.luid.as_deref().and_then(|luid| names.get(luid)) {
            table.name = (*name).to_string();
        }
    }
}

/// `{dir}/{project}_tab_exposures.yml`
pub fn exposure_file_path(dir: impl AsRef<Path>, project: &str) -> PathBuf {
    dir.as_ref().join(format!("{project}_tab_exposures.yml"))
}

/// Write `document` to its file under `dir`, creating `dir` when needed
pub fn write_exposures(
    document: &ExposureDocument,
    dir: impl AsRef<Path>,
    project: &str,
) -> Result<PathBuf> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let path = exposure_file_path(dir, project);
    std::fs::write(&path, document.to_yaml()?)?;

    info!("Wrote {} exposures to {}", document.exposures.len(), path.display());
    Ok(path)
}
