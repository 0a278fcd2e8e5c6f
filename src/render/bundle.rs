use crate::utils::error::Result;
use std::io::Write;
use zip::write::{SimpleFileOptions, ZipWriter};

/// Packs `(path, bytes)` entries into an in-memory zip archive.
pub fn zip_bundle(entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    tracing::debug!("Creating ZIP bundle with {} files", entries.len());

    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (path, data) in entries {
        zip.start_file(path.as_str(), SimpleFileOptions::default())?;
        zip.write_all(data)?;
    }

    let cursor = zip.finish()?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    #[test]
    fn test_zip_bundle_round_trips_entries() {
        let entries = vec![
            ("current_inventory.csv".to_string(), b"Codigo\n20001\n".to_vec()),
            ("charts/volume_by_style.svg".to_string(), b"<svg/>".to_vec()),
        ];
        let bytes = zip_bundle(&entries).unwrap();

        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);

        let mut content = String::new();
        archive
            .by_name("charts/volume_by_style.svg")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "<svg/>");
    }
}
