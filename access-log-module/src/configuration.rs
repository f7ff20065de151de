// Copyright 2024 Wladimir Palant
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Structures handling command line options and YAML deserialization for the Access Log Module

use clap::Args;
use log::trace;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::fmt::Debug;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Command line options of the access log module
#[derive(Debug, Default, Args)]
pub struct AccessLogOpt {
    /// Access log file path
    ///
    /// Special values are an empty string (disable logging) and - (write to standard output).
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Access log format
    ///
    /// Either a format string like ":method :url :status" or one of the presets combined,
    /// common, default, short, tiny, dev.
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log requests when they arrive rather than when the response is sent
    #[arg(long)]
    pub log_immediate: bool,
}

/// Configuration settings of the access log module
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AccessLogConf {
    /// Access log file path
    ///
    /// Special values are an empty string (disable logging) and - (write to standard output).
    pub log_file: PathBuf,

    /// Log format, either a format string or a preset name
    ///
    /// For example, `tiny` is equivalent to:
    ///
    /// ```yaml
    /// ":method :url :status :res[content-length] - :response-time ms"
    /// ```
    pub log_format: String,

    /// If `true`, requests are logged when they arrive. Response data won’t be available then.
    pub log_immediate: bool,
}

impl Default for AccessLogConf {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from("-"),
            log_format: String::new(),
            log_immediate: false,
        }
    }
}

impl AccessLogConf {
    /// Merges the command line options into the current configuration. Any command line options
    /// present overwrite existing settings.
    pub fn merge_with_opt(&mut self, opt: AccessLogOpt) {
        if let Some(log_file) = opt.log_file {
            self.log_file = log_file;
        }
        if let Some(log_format) = opt.log_format {
            self.log_format = log_format;
        }
        if opt.log_immediate {
            self.log_immediate = true;
        }
    }
}

/// Trait for configuration structures that can be loaded from YAML files. This trait has a blanket
/// implementation for any structure implementing [`serde::Deserialize`] and [`Default`].
pub trait FromYaml {
    /// Parses configuration from a YAML string.
    fn from_yaml(yaml: impl AsRef<str>) -> Result<Self>
    where
        Self: Sized;

    /// Loads configuration from a YAML file.
    fn load_from_yaml(path: impl AsRef<Path>) -> Result<Self>
    where
        Self: Sized;

    /// Loads configuration from multiple YAML files. Top-level settings of later files
    /// overwrite the ones of earlier files. Without any files, default configuration is
    /// produced.
    fn load_from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self>
    where
        Self: Sized;
}

fn read_yaml(path: &Path) -> Result<Value> {
    let file = File::open(path).map_err(|source| Error::ConfigOpen {
        path: path.to_owned(),
        source,
    })?;
    Ok(serde_yaml::from_reader(BufReader::new(file))?)
}

impl<D> FromYaml for D
where
    D: DeserializeOwned + Default + Debug,
{
    fn from_yaml(yaml: impl AsRef<str>) -> Result<Self> {
        let conf = serde_yaml::from_str(yaml.as_ref())?;
        trace!("Parsed configuration: {conf:#?}");
        Ok(conf)
    }

    fn load_from_yaml(path: impl AsRef<Path>) -> Result<Self> {
        let conf = serde_yaml::from_value(read_yaml(path.as_ref())?)?;
        trace!("Loaded configuration file: {conf:#?}");
        Ok(conf)
    }

    fn load_from_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        if paths.is_empty() {
            return Ok(Self::default());
        }

        let mut merged = Mapping::new();
        for path in paths {
            match read_yaml(path.as_ref())? {
                Value::Mapping(mapping) => {
                    for (key, value) in mapping {
                        merged.insert(key, value);
                    }
                }
                // An empty file
                Value::Null => {}
                other => {
                    // Let serde produce a meaningful error message
                    serde_yaml::from_value::<Self>(other)?;
                }
            }
        }

        let conf = serde_yaml::from_value(Value::Mapping(merged))?;
        trace!("Merged configuration files: {conf:#?}");
        Ok(conf)
    }
}
