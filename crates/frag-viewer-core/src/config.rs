// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Session configuration, optionally loaded from environment variables.

use frag_viewer_model::{LoaderSettings, FRAGMENT_EXTENSION};

/// Default name offered for exported fragments
pub const DEFAULT_EXPORT_FILE_NAME: &str = "model_fragments.frag";

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Settings handed to the source format loader.
    pub loader: LoaderSettings,
    /// Index and classify automatically after loading a model with property data.
    pub auto_process: bool,
    /// File name returned by [`crate::Session::export_file`].
    pub export_file_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            loader: LoaderSettings::default(),
            auto_process: true,
            export_file_name: DEFAULT_EXPORT_FILE_NAME.to_string(),
        }
    }
}

impl SessionConfig {
    /// Load configuration from environment variables.
    ///
    /// Reads `FRAG_VIEWER_COORDINATE_TO_ORIGIN`, `FRAG_VIEWER_AUTO_PROCESS`
    /// and `FRAG_VIEWER_EXPORT_FILE_NAME`. Absent or unparsable values fall
    /// back to the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let flag = |key: &str, default: bool| {
            lookup(key)
                .and_then(|v| parse_flag(&v))
                .unwrap_or(default)
        };

        Self {
            loader: LoaderSettings {
                coordinate_to_origin: flag(
                    "FRAG_VIEWER_COORDINATE_TO_ORIGIN",
                    defaults.loader.coordinate_to_origin,
                ),
            },
            auto_process: flag("FRAG_VIEWER_AUTO_PROCESS", defaults.auto_process),
            export_file_name: lookup("FRAG_VIEWER_EXPORT_FILE_NAME")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .map(with_fragment_extension)
                .unwrap_or(defaults.export_file_name),
        }
    }

    pub fn with_coordinate_to_origin(mut self, enabled: bool) -> Self {
        self.loader.coordinate_to_origin = enabled;
        self
    }

    pub fn with_auto_process(mut self, enabled: bool) -> Self {
        self.auto_process = enabled;
        self
    }

    pub fn with_export_file_name(mut self, name: impl Into<String>) -> Self {
        self.export_file_name = with_fragment_extension(name.into());
        self
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn with_fragment_extension(name: String) -> String {
    let suffix = format!(".{}", FRAGMENT_EXTENSION);
    if name.to_ascii_lowercase().ends_with(&suffix) {
        name
    } else {
        name + &suffix
    }
}
