//! File-based data source.
//!
//! Replays a data-flow response saved as JSON, e.g. with
//! `curl -X POST ... > flow.json`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::debug;

use super::{DataSource, FlowQuery, RawResultSet};

/// A data source that reads result sets from a JSON file.
///
/// Queries cannot be applied to a recording, so a request simply re-reads
/// the file. Between requests the source also tracks the file's
/// modification time and returns new data when the file is rewritten.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    description: String,
    last_error: Option<String>,
    last_modified: Option<SystemTime>,
    reload_requested: bool,
}

impl FileSource {
    /// Create a new file source for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self {
            path,
            description,
            last_error: None,
            last_modified: None,
            reload_requested: false,
        }
    }

    /// Returns the path being replayed.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn get_modified_time(&self) -> Option<SystemTime> {
        fs::metadata(&self.path).ok()?.modified().ok()
    }

    fn read_file(&mut self) -> Option<RawResultSet> {
        match fs::read_to_string(&self.path) {
            Ok(content) => match RawResultSet::from_json(&content) {
                Ok(set) => {
                    self.last_error = None;
                    Some(set)
                }
                Err(e) => {
                    self.last_error = Some(format!("Parse error: {}", e));
                    None
                }
            },
            Err(e) => {
                self.last_error = Some(format!("Read error: {}", e));
                None
            }
        }
    }
}

impl DataSource for FileSource {
    fn request(&mut self, query: FlowQuery) {
        debug!(path = %self.path.display(), query = %query.describe(), "replaying result file");
        self.reload_requested = true;
    }

    fn poll(&mut self) -> Option<RawResultSet> {
        let current_modified = self.get_modified_time();

        let file_changed = match (&self.last_modified, &current_modified) {
            (None, _) => self.reload_requested,
            (Some(_), None) => false,
            (Some(last), Some(current)) => current > last,
        };

        if !(file_changed || self.reload_requested) {
            return None;
        }
        self.reload_requested = false;

        let set = self.read_file()?;
        self.last_modified = current_modified;
        Some(set)
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn sample_json() -> &'static str {
        r#"{
            "result": [{
                "metric": {"source": "ns.fnA", "destination": "ns.fnB", "stype": "func", "dtype": "func", "code": "200"},
                "value": [0, "1.5"]
            }]
        }"#
    }

    #[test]
    fn test_file_source_new() {
        let source = FileSource::new("/tmp/flow.json");
        assert_eq!(source.path(), Path::new("/tmp/flow.json"));
        assert_eq!(source.description(), "file: /tmp/flow.json");
        assert!(source.error().is_none());
    }

    #[test]
    fn test_file_source_waits_for_request() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", sample_json()).unwrap();

        let mut source = FileSource::new(file.path());
        assert!(source.poll().is_none());

        source.request(FlowQuery::default());
        let set = source.poll().expect("snapshot after request");
        assert_eq!(set.len(), 1);

        // Unchanged file, no new request
        assert!(source.poll().is_none());
    }

    #[test]
    fn test_file_source_rereads_on_every_request() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", sample_json()).unwrap();

        let mut source = FileSource::new(file.path());
        source.request(FlowQuery::default());
        assert!(source.poll().is_some());

        source.request(FlowQuery::new("1672531200", "5m"));
        assert!(source.poll().is_some());
    }

    #[test]
    fn test_file_source_missing_file() {
        let mut source = FileSource::new("/nonexistent/path/flow.json");
        source.request(FlowQuery::default());

        assert!(source.poll().is_none());
        assert!(source.error().unwrap().contains("Read error"));
    }

    #[test]
    fn test_file_source_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "not valid json").unwrap();

        let mut source = FileSource::new(file.path());
        source.request(FlowQuery::default());

        assert!(source.poll().is_none());
        assert!(source.error().unwrap().contains("Parse error"));
    }
}
