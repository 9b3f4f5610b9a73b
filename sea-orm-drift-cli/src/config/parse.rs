use sea_orm_drift::CheckerConfig;
use std::{error::Error, fs::File, io::Read};

pub fn parse_config<T: serde::de::DeserializeOwned + std::fmt::Debug>(
    config: &str,
) -> Result<T, Box<dyn Error>> {
    let mut file = File::open(config)?;
    let mut content = String::new();
    file.read_to_string(&mut content)?;
    let parsed_config: T = serde_json::from_str(&content)?;
    Ok(parsed_config)
}

/// The checker configuration, with a schema given on the command line
/// taking precedence over the one in the file
pub fn load_checker_config(
    config: Option<&str>,
    database_schema: Option<String>,
) -> Result<CheckerConfig, Box<dyn Error>> {
    let mut checker_config: CheckerConfig = match config {
        Some(path) => parse_config(path)?,
        None => CheckerConfig::default(),
    };
    if database_schema.is_some() {
        checker_config.schema = database_schema;
    }
    checker_config.validate()?;
    Ok(checker_config)
}
