//! Configuration.
//!
//! The host hands every node manager the same [`ApplicationConfiguration`], a
//! TOML document with a table of named extensions. This node manager reads its
//! own [`LiHaConfiguration`] from the extension of that name and falls back to
//! defaults when it is absent.
//!
//! ```toml
//! application_name = "Lab Automation Server"
//!
//! [extensions.LiHaConfiguration]
//! definition_root = "/opt/liha/nodesets"
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// The server-wide configuration block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApplicationConfiguration {
    /// Display name of the server application.
    #[serde(default)]
    pub application_name: String,
    /// Named extension blocks, one per component.
    #[serde(default)]
    pub extensions: BTreeMap<String, toml::Value>,
}

impl ApplicationConfiguration {
    /// Parses a configuration document.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Document`] if the text is not valid TOML or does
    /// not have the expected shape.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(ConfigError::Document)
    }

    /// Deserializes the extension named `name`, or `None` if it is absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Extension`] if the extension does not match `T`.
    pub fn parse_extension<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, ConfigError> {
        self.extensions
            .get(name)
            .map(|value| {
                value.clone().try_into().map_err(|source| ConfigError::Extension {
                    name: name.to_owned(),
                    source,
                })
            })
            .transpose()
    }

    /// Stores `value` as the extension named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Store`] if `value` cannot be represented in TOML.
    pub fn set_extension<T: Serialize>(&mut self, name: &str, value: &T) -> Result<(), ConfigError> {
        let value = toml::Value::try_from(value).map_err(|source| ConfigError::Store {
            name: name.to_owned(),
            source,
        })?;
        self.extensions.insert(name.to_owned(), value);
        Ok(())
    }
}

/// Settings of the LiHa system node manager.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiHaConfiguration {
    /// Directory the definition sources are read from.
    pub definition_root: PathBuf,
    /// Definition sources in import order.
    pub sources: Vec<String>,
}

impl LiHaConfiguration {
    /// Name of the extension block holding this configuration.
    pub const EXTENSION_NAME: &'static str = "LiHaConfiguration";

    /// Reads the configuration from `application`, using defaults when the
    /// extension is absent.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Extension`] if the extension is present but
    /// invalid.
    pub fn from_application(application: &ApplicationConfiguration) -> Result<Self, ConfigError> {
        Ok(application
            .parse_extension(Self::EXTENSION_NAME)?
            .unwrap_or_default())
    }

    /// Full paths of the sources, in import order.
    #[must_use]
    pub fn source_paths(&self) -> Vec<PathBuf> {
        self.sources
            .iter()
            .map(|source| self.definition_root.join(source))
            .collect()
    }
}

impl Default for LiHaConfiguration {
    fn default() -> Self {
        Self {
            definition_root: PathBuf::from("definitions"),
            sources: [
                "Opc.Ua.Di.NodeSet2.xml",
                "Opc.Ua.Machinery.NodeSet2.xml",
                "lads.xml",
                "lihasystem.xml",
            ]
            .into_iter()
            .map(str::to_owned)
            .collect(),
        }
    }
}
