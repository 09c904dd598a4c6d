//! Recursive required-dependency resolution
//!
//! Walks required-dependency edges from the user's selection and produces
//! the closed set of (mod, file) pairs to install. Implemented as an
//! explicit worklist over mod ids; the selection's key set doubles as the
//! visited guard, so mutual/circular dependencies terminate without
//! duplicate work and a dependency is never re-resolved once present.

use std::collections::{HashMap, VecDeque};
use tracing::debug;

use crate::catalog::{CatalogClient, FileRecord, RelationType};
use crate::error::Result;
use crate::selection::{ResolveContext, SelectionSet};

/// Resolver over the catalog with a per-run memo of file lists
///
/// The memo only spans one resolver instance (one install run); nothing is
/// cached across runs.
pub struct DependencyResolver<'a> {
    catalog: &'a CatalogClient,
    file_lists: HashMap<i64, Vec<FileRecord>>,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(catalog: &'a CatalogClient) -> Self {
        Self {
            catalog,
            file_lists: HashMap::new(),
        }
    }

    /// Close `selection` under required dependencies
    ///
    /// The result is a superset of the input and a fixed point under
    /// re-application. User picks are never replaced; the resolver only
    /// fills in mods absent from the set. A dependency mod with zero files
    /// under the active filter contributes nothing rather than failing
    /// the run.
    pub async fn resolve(
        &mut self,
        selection: SelectionSet,
        ctx: &ResolveContext,
    ) -> Result<SelectionSet> {
        let mut resolved = selection;
        let mut worklist: VecDeque<i64> = resolved.mod_ids().collect();

        while let Some(mod_id) = worklist.pop_front() {
            let Some(file_id) = resolved.file_for(mod_id) else {
                continue;
            };

            let required: Vec<i64> = self
                .files_for(mod_id, ctx)
                .await?
                .iter()
                .find(|f| f.id == file_id)
                .map(|record| {
                    record
                        .dependencies
                        .iter()
                        .filter(|d| d.relation_type == RelationType::Required)
                        .map(|d| d.mod_id)
                        .collect()
                })
                .unwrap_or_default();

            for dep_mod_id in required {
                if resolved.contains_mod(dep_mod_id) {
                    continue;
                }
                // "First" is the catalog's own default-sort order; no
                // additional ranking is applied.
                match self.files_for(dep_mod_id, ctx).await?.first() {
                    Some(first) => {
                        let chosen = first.id;
                        debug!(
                            "Resolved required dependency: mod {} -> file {}",
                            dep_mod_id, chosen
                        );
                        resolved.fill(dep_mod_id, chosen);
                        worklist.push_back(dep_mod_id);
                    }
                    None => {
                        debug!(
                            "Dependency mod {} has no files under the active filter, skipping",
                            dep_mod_id
                        );
                    }
                }
            }
        }

        Ok(resolved)
    }

    async fn files_for(&mut self, mod_id: i64, ctx: &ResolveContext) -> Result<&Vec<FileRecord>> {
        if !self.file_lists.contains_key(&mod_id) {
            let files = self.catalog.list_files(mod_id, ctx).await?;
            self.file_lists.insert(mod_id, files);
        }
        Ok(&self.file_lists[&mod_id])
    }
}
