#![allow(dead_code)]

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{TempDir, tempdir};

pub const MARKS_CSV: &str = "\
 Name ,Math,Science,English
Alice,18,16,17
Bob,10,8,absent
Cara,12,13,11
Dan,,,
Eve,15,15,15
";

pub const ATTENDANCE_CSV: &str = "\
Name,Attendance
Alice,95
Bob,70
Eve,88
Eve,90
";

/// Scratch directory helper that cleans up files automatically on drop.
pub struct TestWorkspace {
    temp_dir: TempDir,
}

impl TestWorkspace {
    /// Creates a fresh scratch directory for the current test case.
    pub fn new() -> Self {
        Self {
            temp_dir: tempdir().expect("temp dir"),
        }
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` into a file under the workspace and returns the path.
    pub fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        let mut file = File::create(&path).expect("create temp file");
        file.write_all(contents.as_bytes())
            .expect("write temp file contents");
        path
    }

    /// Writes the standard marks and attendance tables; returns their paths.
    pub fn sample_pair(&self) -> (PathBuf, PathBuf) {
        (
            self.write("marks.csv", MARKS_CSV),
            self.write("attendance.csv", ATTENDANCE_CSV),
        )
    }
}
