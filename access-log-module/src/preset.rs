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

//! Named well-known log formats

use std::fmt;
use std::str::FromStr;

/// A built-in log format that can be referred to by name instead of spelling out the format
/// string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    /// Apache combined log format, `combined` in config file
    Combined,
    /// Apache common log format, `common` in config file
    Common,
    /// Combined log format with a web-style date, `default` in config file
    Default,
    /// Shorter format including response time, `short` in config file
    Short,
    /// Minimal format, `tiny` in config file
    Tiny,
    /// Development output with colored status codes, `dev` in config file
    Dev,
}

impl Preset {
    /// All presets in the order they are documented
    pub const ALL: [Preset; 6] = [
        Self::Combined,
        Self::Common,
        Self::Default,
        Self::Short,
        Self::Tiny,
        Self::Dev,
    ];

    /// Name of the preset as used in configuration files
    pub fn name(self) -> &'static str {
        match self {
            Self::Combined => "combined",
            Self::Common => "common",
            Self::Default => "default",
            Self::Short => "short",
            Self::Tiny => "tiny",
            Self::Dev => "dev",
        }
    }

    /// The format string this preset stands for
    pub fn format(self) -> &'static str {
        match self {
            Self::Combined => {
                r#":remote-addr - :remote-user [:date[clf]] ":method :url HTTP/:http-version" :status :res[content-length] ":referrer" ":user-agent""#
            }
            Self::Common => {
                r#":remote-addr - :remote-user [:date[clf]] ":method :url HTTP/:http-version" :status :res[content-length]"#
            }
            Self::Default => {
                r#":remote-addr - :remote-user [:date] ":method :url HTTP/:http-version" :status :res[content-length] ":referrer" ":user-agent""#
            }
            Self::Short => {
                ":remote-addr :remote-user :method :url HTTP/:http-version :status :res[content-length] - :response-time ms"
            }
            Self::Tiny => ":method :url :status :res[content-length] - :response-time ms",
            Self::Dev => ":method :url :status :response-time ms - :res[content-length]",
        }
    }

    /// Looks up a preset by its name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|preset| preset.name() == name)
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_name(s).ok_or_else(|| format!("Unknown log format preset {s}"))
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Expands a preset name into its format string, other values are returned unchanged
pub fn expand_format(format: &str) -> &str {
    match Preset::from_name(format) {
        Some(preset) => preset.format(),
        None => format,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    #[test]
    fn lookup() {
        for preset in Preset::ALL {
            assert_eq!(Preset::from_name(preset.name()), Some(preset));
            assert_eq!(preset.name().parse::<Preset>(), Ok(preset));
        }
        assert_eq!(Preset::from_name("Tiny"), None);
        assert!("unknown".parse::<Preset>().is_err());
    }

    #[test]
    fn expansion() {
        assert_eq!(
            expand_format("tiny"),
            ":method :url :status :res[content-length] - :response-time ms"
        );
        assert_eq!(expand_format(":method :url"), ":method :url");
        assert_eq!(expand_format(""), "");
    }
}
