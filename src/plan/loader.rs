//! Plan loader
//!
//! Load plan YAML files one at a time or from a directory.

use std::path::Path;

use super::Plan;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error in {file}: {error}")]
    Yaml {
        file: String,
        error: serde_yaml::Error,
    },
}

pub struct PlanLoader;

impl PlanLoader {
    /// Every `.yaml`/`.yml` file in `dir`, in file name order. `config.yaml`
    /// is engine configuration and is skipped.
    pub fn load_directory(dir: &Path) -> Result<Vec<Plan>, LoadError> {
        let mut paths = Vec::new();

        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() {
                continue;
            }

            let ext = path.extension().and_then(|e| e.to_str());
            let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if filename == "config.yaml" || filename == "config.yml" {
                continue;
            }
            if ext == Some("yaml") || ext == Some("yml") {
                paths.push(path);
            }
        }

        paths.sort();
        paths.iter().map(|p| Self::load_file(p)).collect()
    }

    pub fn load_file(path: &Path) -> Result<Plan, LoadError> {
        let content = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&content).map_err(|e| LoadError::Yaml {
            file: path.display().to_string(),
            error: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const PLAN: &str = r#"
name: NAME
steps:
  - uses: ui/left-click
    finder: { name: OK }
"#;

    #[test]
    fn test_load_directory() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.yaml"), PLAN.replace("NAME", "plan-b")).unwrap();
        fs::write(dir.path().join("a.yml"), PLAN.replace("NAME", "plan-a")).unwrap();
        fs::write(dir.path().join("config.yaml"), "timeout: 5s\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let plans = PlanLoader::load_directory(dir.path()).unwrap();
        let names: Vec<_> = plans.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["plan-a", "plan-b"]);
    }

    #[test]
    fn test_load_file_reports_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.yaml");
        fs::write(&path, "name: [unterminated").unwrap();

        let err = PlanLoader::load_file(&path).unwrap_err();
        assert!(matches!(err, LoadError::Yaml { .. }));
        assert!(err.to_string().contains("broken.yaml"));
    }
}
