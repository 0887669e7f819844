//! Append-only log of the best episode of every generation.
use crate::{error::CoordError, Episode};
use std::{
    fs::OpenOptions,
    io::Write,
    path::{Path, PathBuf},
};

/// Appends the first step of the best episode, one line per generation.
///
/// Each line is tab-separated: generation, cumulative reward, action,
/// reward, then the features of the first state.
pub struct BestStepLog {
    path: PathBuf,
}

impl BestStepLog {
    /// Constructs a log appending to `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends the line of `generation`. Empty episodes are skipped.
    pub fn append(&self, generation: usize, episode: &Episode) -> Result<(), CoordError> {
        let step = match episode.first_step() {
            Some(step) => step,
            None => return Ok(()),
        };
        let mut line = format!(
            "{}\t{}\t{}\t{}",
            generation,
            episode.total_reward(),
            step.action,
            step.reward
        );
        for v in &step.state {
            line.push('\t');
            line.push_str(&v.to_string());
        }
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StepRecord;
    use tempdir::TempDir;

    #[test]
    fn test_one_line_per_generation() -> anyhow::Result<()> {
        let dir = TempDir::new("best_step")?;
        let log = BestStepLog::new(dir.path().join("best.tsv"));

        let episode: Episode = vec![
            StepRecord::new(vec![1.0, 0.5], 1.2, 3.0),
            StepRecord::sentinel(4.0),
        ]
        .into_iter()
        .collect();
        log.append(0, &episode)?;
        log.append(1, &episode)?;
        log.append(2, &Episode::default())?;

        let text = std::fs::read_to_string(log.path())?;
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["0\t7\t1.2\t3\t1\t0.5", "1\t7\t1.2\t3\t1\t0.5"]);
        Ok(())
    }
}
