use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::{
    fs::File,
    io::{BufReader, Write},
    path::Path,
};

/// Command lines of training and evaluation workers.
///
/// Training workers are started as `program input_file`, the evaluation
/// worker as `program input_file scenario`, where `scenario` is generated
/// from `eval_input_file` by [`make_scenario`](crate::scenario::make_scenario).
#[derive(Debug, Deserialize, Serialize, PartialEq, Clone)]
pub struct WorkerConfig {
    /// Simulator executable.
    pub program: String,

    /// Input file passed to every worker.
    pub input_file: String,

    /// Scenario template of the evaluation worker.
    pub eval_input_file: Option<String>,

    /// Token replaced by the generation index in the scenario template.
    pub placeholder: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            program: "agripolis".to_string(),
            input_file: "inputfiles".to_string(),
            eval_input_file: None,
            placeholder: "<num>".to_string(),
        }
    }
}

impl WorkerConfig {
    /// Sets the simulator executable.
    pub fn program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Sets the input file.
    pub fn input_file(mut self, input_file: impl Into<String>) -> Self {
        self.input_file = input_file.into();
        self
    }

    /// Sets the scenario template of the evaluation worker.
    pub fn eval_input_file(mut self, path: Option<String>) -> Self {
        self.eval_input_file = path;
        self
    }

    /// Sets the placeholder token.
    pub fn placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    /// Arguments of a training worker.
    pub fn train_args(&self) -> Vec<String> {
        vec![self.input_file.clone()]
    }

    /// Arguments of the evaluation worker given the generated scenario name.
    pub fn eval_args(&self, scenario: impl Into<String>) -> Vec<String> {
        vec![self.input_file.clone(), scenario.into()]
    }

    /// Constructs [`WorkerConfig`] from YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let rdr = BufReader::new(file);
        let b = serde_yaml::from_reader(rdr)?;
        Ok(b)
    }

    /// Saves [`WorkerConfig`].
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = File::create(path)?;
        file.write_all(serde_yaml::to_string(&self)?.as_bytes())?;
        Ok(())
    }
}
