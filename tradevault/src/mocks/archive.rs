//! Zip fixtures for result-classification tests.

use std::io::{Cursor, Write};

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// One entry of a test archive.
#[derive(Debug, Clone)]
pub struct TestZipEntry<'a> {
    pub name: &'a str,
    /// `None` for a directory entry.
    pub content: Option<&'a [u8]>,
}

impl<'a> TestZipEntry<'a> {
    pub const fn file(name: &'a str, content: &'a [u8]) -> Self {
        Self {
            name,
            content: Some(content),
        }
    }

    pub const fn dir(name: &'a str) -> Self {
        Self {
            name,
            content: None,
        }
    }
}

/// Build an in-memory zip archive holding `entries` in order.
pub fn make_test_zip(entries: &[TestZipEntry<'_>]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();
    for entry in entries {
        match entry.content {
            Some(content) => {
                writer
                    .start_file(entry.name, options)
                    .expect("Should start zip entry");
                writer.write_all(content).expect("Should write zip entry");
            }
            None => writer
                .add_directory(entry.name, options)
                .expect("Should add zip directory"),
        }
    }
    writer.finish().expect("Should finish zip").into_inner()
}
