use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::auth::Permissions;
use crate::errors::JoblyError;

const DEFAULT_PORT: u16 = 8787;
const DEFAULT_DATABASE: &str = "~/.jobly";
const DEFAULT_TOKEN_DURATION: i64 = 43800;

/// Contents of the .joblyrc file. Command line arguments take precedence.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    pub port: Option<u16>,
    pub database: Option<String>,
    pub secret: Option<String>,
}

impl Config {
    pub fn read(path: &str) -> Result<Self, JoblyError> {
        if !Path::new(path).exists() {
            debug!("No config file at {}, using defaults", path);
            return Ok(Self::default());
        }

        let content =
            fs::read_to_string(path).map_err(|err| JoblyError::ReadConfig { source: err })?;

        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, JoblyError> {
        toml::from_str(content).map_err(|err| JoblyError::ParseConfig { source: err })
    }

    pub fn secret(&self, arg: Option<&str>) -> Result<String, JoblyError> {
        arg.map(String::from)
            .or_else(|| self.secret.clone())
            .ok_or(JoblyError::MissingSecret {})
    }

    pub fn port(&self, arg: Option<&str>) -> u16 {
        arg.and_then(|port| port.parse().ok())
            .or(self.port)
            .unwrap_or(DEFAULT_PORT)
    }

    pub fn database(&self, arg: Option<&str>) -> String {
        let database = arg
            .map(String::from)
            .or_else(|| self.database.clone())
            .unwrap_or_else(|| DEFAULT_DATABASE.to_owned());

        shellexpand::tilde(&database).into_owned()
    }
}

pub fn parse_permissions(arg: &str) -> Result<Vec<Permissions>, JoblyError> {
    arg.split(',')
        .map(str::trim)
        .filter(|permission| !permission.is_empty())
        .map(|permission| permission.parse().map_err(JoblyError::validation))
        .collect()
}

/// Token lifetime in minutes.
pub fn parse_duration(arg: Option<&str>) -> Result<i64, JoblyError> {
    match arg {
        None => Ok(DEFAULT_TOKEN_DURATION),
        Some(duration) => duration
            .trim()
            .parse::<i64>()
            .map_err(|_| JoblyError::validation(format!("Invalid duration '{}'", duration))),
    }
}
