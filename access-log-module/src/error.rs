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

//! Errors produced while setting up an access logger

use std::path::PathBuf;

/// Setup-time error. Per-request processing never fails, missing values are rendered as
/// placeholders instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No format string was given or it is empty
    #[error("log format is not defined")]
    MissingFormat,

    /// The format string references a token that isn’t registered
    #[error("unknown token `{name}` in log format")]
    UnknownToken {
        /// Token name as found in the format string
        name: String,
    },

    /// A configuration file could not be opened
    #[error("failed opening configuration file {}", path.display())]
    ConfigOpen {
        /// Path of the configuration file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A configuration file could not be parsed
    #[error("failed reading configuration file")]
    ConfigParse(#[from] serde_yaml::Error),
}

/// Result type used by setup functions of this crate
pub type Result<T> = std::result::Result<T, Error>;
