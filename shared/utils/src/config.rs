use config::{Config, ConfigError, Environment, File};
use multibom_models::{BomError, ColumnNames};
use serde::{Deserialize, Serialize};
use std::path::Path;
use validator::{Validate, ValidationError};

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    #[validate]
    pub project: ProjectConfig,
    #[validate(custom = "validate_columns")]
    pub columns: ColumnNames,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, PartialEq)]
#[serde(default)]
pub struct ProjectConfig {
    /// Lower-case file stems that mark the top-level parts list.
    #[validate(length(min = 1, message = "At least one master file name is required"))]
    pub master_names: Vec<String>,
    /// Spreadsheet extensions picked up from the project directory.
    #[validate(length(min = 1, message = "At least one file extension is required"))]
    pub extensions: Vec<String>,
    /// Sub-directory of the project directory that receives the outputs.
    #[validate(length(min = 1, message = "Publish directory name must not be empty"))]
    pub publish_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// `pretty` or `json`.
    pub format: String,
    pub file_path: Option<String>,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            master_names: vec![
                "parts list".to_string(),
                "parts_list".to_string(),
                "master".to_string(),
            ],
            extensions: vec![
                "xlsx".to_string(),
                "xlsm".to_string(),
                "xls".to_string(),
                "csv".to_string(),
            ],
            publish_dir: "publish".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

fn validate_columns(columns: &ColumnNames) -> Result<(), ValidationError> {
    let required = [&columns.part_number, &columns.quantity];
    if required.iter().any(|name| name.trim().is_empty()) {
        return Err(ValidationError::new("empty_required_column"));
    }
    if columns.part_number.trim().eq_ignore_ascii_case(columns.quantity.trim()) {
        return Err(ValidationError::new("part_number_equals_quantity"));
    }
    if let Some(link) = &columns.link_column {
        if link.trim().eq_ignore_ascii_case(columns.quantity.trim()) {
            return Err(ValidationError::new("link_column_equals_quantity"));
        }
    }
    Ok(())
}

impl AppConfig {
    /// Layered load: defaults, `multibom.{toml,yaml,json}` in the working
    /// directory, an explicit file when given, then `MULTIBOM__*` variables.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let mut builder = Config::builder().add_source(File::with_name("multibom").required(false));

        if let Some(path) = explicit {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            .add_source(Environment::with_prefix("MULTIBOM").separator("__"))
            .build()?;

        config.try_deserialize()
    }

    /// Normalizes user supplied names and runs the validation rules.
    pub fn finalize(mut self) -> Result<Self, BomError> {
        self.project.master_names = self
            .project
            .master_names
            .iter()
            .map(|n| n.trim().to_lowercase())
            .filter(|n| !n.is_empty())
            .collect();
        self.project.extensions = self
            .project
            .extensions
            .iter()
            .map(|e| e.trim().trim_start_matches('.').to_lowercase())
            .filter(|e| !e.is_empty())
            .collect();

        self.validate()
            .map_err(|e| BomError::configuration(format!("invalid configuration: {}", e)))?;
        Ok(self)
    }
}
