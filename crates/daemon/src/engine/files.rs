// Per-script file-name → buffer state tracked from file-operation responses.
//
// Each script has its own workspace on the service side, so file names are
// only unique within one script.

use std::collections::HashMap;
use std::sync::Mutex;

use scriptpad_common::protocol::file_operation::FileOperationResponse;
use scriptpad_common::protocol::text_edit::{apply_text_changes, TextEditError};
use tracing::warn;
use uuid::Uuid;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackedFile {
    /// Last known buffer; `None` until a `Modified` response arrives.
    pub buffer: Option<String>,
    /// Number of `Modified` responses applied.
    pub revision: u64,
}

#[derive(Debug, Default)]
pub struct FileStateCache {
    scripts: Mutex<HashMap<Uuid, HashMap<String, TrackedFile>>>,
}

impl FileStateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one response within `script_id`'s files. A `Modified` whose
    /// edits do not resolve leaves the cache untouched. A `Renamed` onto a
    /// name that already has state returns the state it replaced.
    pub fn apply(
        &self,
        script_id: Uuid,
        response: &FileOperationResponse,
    ) -> Result<Option<TrackedFile>, TextEditError> {
        let mut scripts = self.scripts.lock().expect("file state lock poisoned");
        match response {
            FileOperationResponse::Modified { file_name, buffer, changes } => {
                let edited = apply_text_changes(buffer, changes)?;
                let entry = scripts.entry(script_id).or_default().entry(file_name.clone()).or_default();
                entry.buffer = Some(edited);
                entry.revision += 1;
                Ok(None)
            }
            FileOperationResponse::Opened { file_name } => {
                scripts.entry(script_id).or_default().entry(file_name.clone()).or_default();
                Ok(None)
            }
            FileOperationResponse::Renamed { file_name, new_file_name } => {
                let files = scripts.entry(script_id).or_default();
                let state = files.remove(file_name).unwrap_or_default();
                let displaced = files.insert(new_file_name.clone(), state);
                if displaced.is_some() {
                    warn!(
                        script_id = %script_id,
                        file_name = %file_name,
                        new_file_name = %new_file_name,
                        "rename replaced existing file state"
                    );
                }
                Ok(displaced)
            }
        }
    }

    pub fn get(&self, script_id: Uuid, file_name: &str) -> Option<TrackedFile> {
        self.scripts
            .lock()
            .expect("file state lock poisoned")
            .get(&script_id)
            .and_then(|files| files.get(file_name))
            .cloned()
    }

    pub fn file_names(&self, script_id: Uuid) -> Vec<String> {
        let mut names: Vec<String> = self
            .scripts
            .lock()
            .expect("file state lock poisoned")
            .get(&script_id)
            .map(|files| files.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Drop every file tracked for `script_id`.
    pub fn forget_script(&self, script_id: Uuid) -> usize {
        self.scripts
            .lock()
            .expect("file state lock poisoned")
            .remove(&script_id)
            .map_or(0, |files| files.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptpad_common::protocol::file_operation::{LinePosition, LinePositionSpanTextChange};

    #[test]
    fn modified_replaces_buffer_then_applies_changes_in_order() {
        let cache = FileStateCache::new();
        let script = Uuid::new_v4();
        cache.apply(script, &FileOperationResponse::modified("A.cs", "stale", vec![])).unwrap();
        cache
            .apply(
                script,
                &FileOperationResponse::modified(
                    "A.cs",
                    "int x;",
                    vec![
                        LinePositionSpanTextChange::insert(LinePosition::new(0, 5), " = 1"),
                        LinePositionSpanTextChange::insert(LinePosition::new(0, 0), "var _ = 0; "),
                    ],
                ),
            )
            .unwrap();

        let file = cache.get(script, "A.cs").unwrap();
        assert_eq!(file.buffer.as_deref(), Some("var _ = 0; int x = 1;"));
        assert_eq!(file.revision, 2);
    }

    #[test]
    fn failed_edit_leaves_previous_state() {
        let cache = FileStateCache::new();
        let script = Uuid::new_v4();
        cache.apply(script, &FileOperationResponse::modified("A.cs", "ok", vec![])).unwrap();
        let bad = LinePositionSpanTextChange::insert(LinePosition::new(9, 0), "x");
        assert!(cache.apply(script, &FileOperationResponse::modified("A.cs", "new", vec![bad])).is_err());

        let file = cache.get(script, "A.cs").unwrap();
        assert_eq!(file.buffer.as_deref(), Some("ok"));
        assert_eq!(file.revision, 1);
    }

    #[test]
    fn opened_tracks_without_content() {
        let cache = FileStateCache::new();
        let script = Uuid::new_v4();
        cache.apply(script, &FileOperationResponse::opened("B.cs")).unwrap();
        assert_eq!(cache.get(script, "B.cs"), Some(TrackedFile { buffer: None, revision: 0 }));
    }

    #[test]
    fn opened_does_not_reset_existing_buffer() {
        let cache = FileStateCache::new();
        let script = Uuid::new_v4();
        cache.apply(script, &FileOperationResponse::modified("B.cs", "keep", vec![])).unwrap();
        cache.apply(script, &FileOperationResponse::opened("B.cs")).unwrap();
        assert_eq!(cache.get(script, "B.cs").unwrap().buffer.as_deref(), Some("keep"));
    }

    #[test]
    fn renamed_rekeys_existing_state() {
        let cache = FileStateCache::new();
        let script = Uuid::new_v4();
        cache.apply(script, &FileOperationResponse::modified("A.cs", "body", vec![])).unwrap();
        let before = cache.get(script, "A.cs").unwrap();

        let displaced = cache.apply(script, &FileOperationResponse::renamed("A.cs", "B.cs")).unwrap();

        assert_eq!(displaced, None);
        assert_eq!(cache.get(script, "A.cs"), None);
        assert_eq!(cache.get(script, "B.cs"), Some(before));
        assert_eq!(cache.file_names(script), vec!["B.cs".to_string()]);
    }

    #[test]
    fn renamed_onto_tracked_name_reports_replaced_state() {
        let cache = FileStateCache::new();
        let script = Uuid::new_v4();
        cache.apply(script, &FileOperationResponse::modified("A.cs", "from a", vec![])).unwrap();
        cache.apply(script, &FileOperationResponse::modified("B.cs", "from b", vec![])).unwrap();

        let displaced = cache.apply(script, &FileOperationResponse::renamed("A.cs", "B.cs")).unwrap();

        assert_eq!(displaced.and_then(|file| file.buffer).as_deref(), Some("from b"));
        assert_eq!(cache.get(script, "B.cs").unwrap().buffer.as_deref(), Some("from a"));
        assert_eq!(cache.file_names(script), vec!["B.cs".to_string()]);
    }

    #[test]
    fn same_file_name_is_independent_per_script() {
        let cache = FileStateCache::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        cache.apply(a, &FileOperationResponse::modified("Program.cs", "A body", vec![])).unwrap();
        cache.apply(b, &FileOperationResponse::modified("Program.cs", "B body", vec![])).unwrap();

        let file_a = cache.get(a, "Program.cs").unwrap();
        let file_b = cache.get(b, "Program.cs").unwrap();
        assert_eq!(file_a.buffer.as_deref(), Some("A body"));
        assert_eq!(file_b.buffer.as_deref(), Some("B body"));
        assert_eq!(file_a.revision, 1);
        assert_eq!(file_b.revision, 1);

        cache.apply(a, &FileOperationResponse::renamed("Program.cs", "Main.cs")).unwrap();
        assert_eq!(cache.get(b, "Program.cs"), Some(file_b.clone()));
        assert_eq!(cache.get(b, "Main.cs"), None);

        assert_eq!(cache.forget_script(a), 1);
        assert_eq!(cache.get(b, "Program.cs"), Some(file_b));
    }

    #[test]
    fn forget_script_drops_only_that_scripts_files() {
        let cache = FileStateCache::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        cache.apply(a, &FileOperationResponse::opened("a1.cs")).unwrap();
        cache.apply(a, &FileOperationResponse::opened("a2.cs")).unwrap();
        cache.apply(b, &FileOperationResponse::opened("b.cs")).unwrap();

        assert_eq!(cache.forget_script(a), 2);
        assert!(cache.file_names(a).is_empty());
        assert_eq!(cache.file_names(b), vec!["b.cs".to_string()]);
    }
}
