// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Property values and property sets attached to elements

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single attribute or property value
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value")]
pub enum PropertyValue {
    /// Free text, labels and identifiers
    Text(String),
    /// Integer and count values
    Integer(i64),
    /// Real-valued measures
    Real(f64),
    /// Boolean and logical values
    Boolean(bool),
    /// Explicitly unset ($ in the source)
    Null,
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Text(s) => f.write_str(s),
            PropertyValue::Integer(i) => write!(f, "{}", i),
            PropertyValue::Real(r) => {
                let formatted = format!("{:.6}", r);
                f.write_str(formatted.trim_end_matches('0').trim_end_matches('.'))
            }
            PropertyValue::Boolean(b) => write!(f, "{}", b),
            PropertyValue::Null => Ok(()),
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Text(s.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(s: String) -> Self {
        PropertyValue::Text(s)
    }
}

impl From<i64> for PropertyValue {
    fn from(i: i64) -> Self {
        PropertyValue::Integer(i)
    }
}

impl From<f64> for PropertyValue {
    fn from(r: f64) -> Self {
        PropertyValue::Real(r)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Boolean(b)
    }
}

/// A named property with its formatted value
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Property {
    /// Property name
    pub name: String,
    /// Property value
    pub value: PropertyValue,
}

impl Property {
    /// Create a new property
    pub fn new(name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Case-insensitive match against name or formatted value
    pub fn matches(&self, query_lower: &str) -> bool {
        self.name.to_lowercase().contains(query_lower)
            || self.value.to_string().to_lowercase().contains(query_lower)
    }
}

/// A property set as shown in the property panel
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertySet {
    /// Property set name (e.g., "Pset_WallCommon")
    pub name: String,
    /// Properties in this set
    pub properties: Vec<Property>,
}

impl PropertySet {
    /// Create a new property set
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Vec::new(),
        }
    }

    /// Add a property to this set
    pub fn add(&mut self, property: Property) {
        self.properties.push(property);
    }

    /// Get a property by name
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.properties.iter().find(|p| p.name == name)
    }

    /// Keep only the properties matching a search query
    ///
    /// A set whose name matches keeps all of its properties. Returns `None`
    /// when nothing in the set matches.
    pub fn filtered(&self, query: &str) -> Option<PropertySet> {
        let query_lower = query.trim().to_lowercase();
        if query_lower.is_empty() || self.name.to_lowercase().contains(&query_lower) {
            return Some(self.clone());
        }
        let properties: Vec<Property> = self
            .properties
            .iter()
            .filter(|p| p.matches(&query_lower))
            .cloned()
            .collect();
        if properties.is_empty() {
            None
        } else {
            Some(PropertySet {
                name: self.name.clone(),
                properties,
            })
        }
    }
}
