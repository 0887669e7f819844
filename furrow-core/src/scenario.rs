//! Generation-specific scenario files for evaluation workers.
use crate::error::CoordError;
use std::{fs, path::Path};

/// Writes `scenario-<generation>.txt` next to `template`, with every
/// `placeholder` replaced by the generation index.
///
/// Returns the base name of the generated file, which is what the
/// evaluation worker receives on its command line.
pub fn make_scenario(
    template: impl AsRef<Path>,
    generation: usize,
    placeholder: &str,
) -> Result<String, CoordError> {
    let template = template.as_ref();
    let text = fs::read_to_string(template)?;
    let text = text.replace(placeholder, &generation.to_string());

    let name = format!("scenario-{}.txt", generation);
    let path = match template.parent() {
        Some(dir) => dir.join(&name),
        None => name.clone().into(),
    };
    fs::write(&path, text)?;
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempdir::TempDir;

    #[test]
    fn test_make_scenario() -> anyhow::Result<()> {
        let dir = TempDir::new("scenario")?;
        let template = dir.path().join("eval.txt");
        fs::write(&template, "seed <num>\nout results_<num>.csv\n")?;

        let name = make_scenario(&template, 7, "<num>")?;
        assert_eq!(name, "scenario-7.txt");
        let text = fs::read_to_string(dir.path().join(&name))?;
        assert_eq!(text, "seed 7\nout results_7.csv\n");

        // The template is left untouched for the next generation.
        make_scenario(&template, 8, "<num>")?;
        let text = fs::read_to_string(dir.path().join("scenario-8.txt"))?;
        assert_eq!(text, "seed 8\nout results_8.csv\n");
        Ok(())
    }

    #[test]
    fn test_missing_template() {
        let err = make_scenario("/nonexistent/eval.txt", 0, "<num>").unwrap_err();
        assert!(matches!(err, CoordError::Io(_)));
    }
}
