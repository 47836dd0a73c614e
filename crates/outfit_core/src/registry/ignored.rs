use std::collections::BTreeSet;
use std::path::Path;

use tracing::{info, warn};

use super::authoring;
use crate::form::{FormId, FormTable};

/// Items that are never captured into a synthesized outfit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoredItems {
    ids: BTreeSet<FormId>,
}

impl IgnoredItems {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads the ignored list from the plugin configuration file. A missing or
    /// unreadable file yields an empty set; unresolvable entries are dropped.
    pub fn load<H: FormTable + ?Sized>(config_file: &Path, host: &H) -> Self {
        let entries = match authoring::read_ignored_forms(config_file) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("No ignored forms loaded from {}: {e}", config_file.display());
                return Self::new();
            }
        };

        let mut ids = BTreeSet::new();
        for entry in entries {
            match entry {
                Ok(form_ref) => {
                    match host.lookup_source_form(form_ref.local_id, &form_ref.source) {
                        Some(id) => {
                            ids.insert(id);
                        }
                        None => warn!("Ignored form not found: {form_ref}"),
                    }
                }
                Err(raw) => warn!("Invalid ignored form id: {raw}"),
            }
        }

        info!("Loaded {} ignored form ids", ids.len());
        Self { ids }
    }

    pub fn contains(&self, id: FormId) -> bool {
        self.ids.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl FromIterator<FormId> for IgnoredItems {
    fn from_iter<T: IntoIterator<Item = FormId>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().collect(),
        }
    }
}
