use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};

/// Name of the append-only fault log inside the record directory.
pub const LOG_FILE: &str = "errors.log";

/// Persists inputs that made a target fault.
///
/// Inputs are content-addressed (`<sha256>.bin`), so a fault that repeats
/// leaves one file and one extra log line.
#[derive(Debug, Clone)]
pub struct InputRecorder {
    dir: PathBuf,
}

impl InputRecorder {
    /// Open (and create if needed) the record directory.
    pub fn new(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path an input would be stored at.
    pub fn path_for(&self, data: &[u8]) -> PathBuf {
        self.dir.join(format!("{}.bin", digest_hex(data)))
    }

    /// Save `data` and append a log line carrying `message`.
    pub fn record(&self, data: &[u8], message: &str) -> io::Result<PathBuf> {
        let digest = digest_hex(data);
        let path = self.dir.join(format!("{digest}.bin"));
        // Rewritten every time so a truncated earlier write is repaired.
        fs::write(&path, data)?;

        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        let message: String = message
            .chars()
            .map(|c| if c.is_control() { ' ' } else { c })
            .collect();

        let mut log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(LOG_FILE))?;
        writeln!(log, "{secs}\t{digest}\t{message}")?;

        Ok(path)
    }
}

fn digest_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_input_and_log_line() {
        let tmp = tempfile::tempdir().unwrap();
        let recorder = InputRecorder::new(tmp.path().join("faults")).unwrap();

        let path = recorder.record(b"\x01\x02\x03", "bad\nthing").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"\x01\x02\x03");
        assert_eq!(path, recorder.path_for(b"\x01\x02\x03"));

        let log = fs::read_to_string(recorder.dir().join(LOG_FILE)).unwrap();
        let fields: Vec<&str> = log.trim_end().split('\t').collect();
        assert_eq!(fields.len(), 3);
        assert_eq!(fields[1], digest_hex(b"\x01\x02\x03"));
        assert_eq!(fields[2], "bad thing");
    }

    #[test]
    fn repeated_input_is_stored_once() {
        let tmp = tempfile::tempdir().unwrap();
        let recorder = InputRecorder::new(tmp.path()).unwrap();

        recorder.record(b"same", "first").unwrap();
        recorder.record(b"same", "second").unwrap();
        recorder.record(b"other", "third").unwrap();

        let bins = fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "bin"))
            .count();
        assert_eq!(bins, 2);

        let log = fs::read_to_string(tmp.path().join(LOG_FILE)).unwrap();
        assert_eq!(log.lines().count(), 3);
    }

    #[test]
    fn truncated_input_file_is_rewritten() {
        let tmp = tempfile::tempdir().unwrap();
        let recorder = InputRecorder::new(tmp.path()).unwrap();

        let path = recorder.path_for(b"full input");
        fs::write(&path, b"full").unwrap();

        assert_eq!(recorder.record(b"full input", "again").unwrap(), path);
        assert_eq!(fs::read(&path).unwrap(), b"full input");
    }

    #[test]
    fn digest_is_sha256_hex() {
        assert_eq!(
            digest_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }
}
