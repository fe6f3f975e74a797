//! Locating the files an installed package owns.

use crate::config::ContainerConfig;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directories under `data_dir` that belong to `package_id`, with the file
/// names each one holds.
///
/// A package owns every `<any dir>/<package_id>` folder in the data tree and
/// everything below it.
pub fn package_files(data_dir: &Path, package_id: &str) -> Vec<(PathBuf, Vec<String>)> {
    let mut dirs: BTreeMap<PathBuf, Vec<String>> = BTreeMap::new();

    let mut roots: Vec<PathBuf> = WalkDir::new(data_dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_dir() && e.depth() > 1 && e.file_name() == package_id)
        .map(|e| e.into_path())
        .collect();
    // A nested folder that happens to share the id is already covered.
    let all = roots.clone();
    roots.retain(|r| !all.iter().any(|other| other != r && r.starts_with(other)));

    for root in &roots {
        for entry in WalkDir::new(root).into_iter().filter_map(|e| e.ok()) {
            if entry.file_type().is_dir() {
                dirs.entry(entry.path().to_path_buf()).or_default();
            } else if let (Some(parent), Some(name)) =
                (entry.path().parent(), entry.file_name().to_str())
            {
                dirs.entry(parent.to_path_buf()).or_default().push(name.to_string());
            }
        }
    }

    dirs.into_iter()
        .map(|(dir, mut names)| {
            names.sort();
            (dir, names)
        })
        .collect()
}

/// Container id for a file name with a known container suffix.
///
/// The suffix is stripped and `+` / percent escapes are decoded; `None` for
/// files that are not containers.
pub fn container_id_for(file_name: &str) -> Option<String> {
    let stem = ContainerConfig::SUFFIXES
        .iter()
        .find_map(|suffix| file_name.strip_suffix(suffix))?;
    if stem.is_empty() {
        return None;
    }
    let spaced = stem.replace('+', " ");
    Some(
        urlencoding::decode(&spaced)
            .map(|s| s.into_owned())
            .unwrap_or(spaced),
    )
}

/// Container ids of every container file the package owns.
pub fn package_container_ids(data_dir: &Path, package_id: &str) -> Vec<String> {
    package_files(data_dir, package_id)
        .iter()
        .flat_map(|(_, names)| names.iter())
        .filter_map(|name| container_id_for(name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_container_id_decoding() {
        assert_eq!(
            container_id_for("generic_pla%232+fast.inst.cfg").as_deref(),
            Some("generic_pla#2 fast")
        );
        assert_eq!(
            container_id_for("ultimaker_pla.xml.fdm_material").as_deref(),
            Some("ultimaker_pla")
        );
        assert_eq!(container_id_for("plugin.py"), None);
        assert_eq!(container_id_for(".inst.cfg"), None);
    }

    #[test]
    fn test_package_files_collects_nested_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let data = temp_dir.path();
        fs::create_dir_all(data.join("plugins/Toolbox/resources")).unwrap();
        fs::write(data.join("plugins/Toolbox/plugin.json"), "{}").unwrap();
        fs::write(data.join("plugins/Toolbox/resources/a.inst.cfg"), "").unwrap();
        fs::create_dir_all(data.join("materials/Toolbox")).unwrap();
        fs::write(data.join("materials/Toolbox/b.xml.fdm_material"), "").unwrap();
        fs::create_dir_all(data.join("plugins/Other")).unwrap();
        fs::write(data.join("plugins/Other/c.inst.cfg"), "").unwrap();

        let files = package_files(data, "Toolbox");
        let dirs: Vec<_> = files.iter().map(|(d, _)| d.clone()).collect();
        assert!(dirs.contains(&data.join("plugins/Toolbox")));
        assert!(dirs.contains(&data.join("plugins/Toolbox/resources")));
        assert!(dirs.contains(&data.join("materials/Toolbox")));
        assert!(!dirs.iter().any(|d| d.starts_with(data.join("plugins/Other"))));

        let mut ids = package_container_ids(data, "Toolbox");
        ids.sort();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
    }
}
