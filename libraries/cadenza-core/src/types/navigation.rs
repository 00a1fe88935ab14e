/// Navigation request passed to the navigation collaborator
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Screen name plus a parameter bag
///
/// Mirrors what a stack navigator receives: the core never owns transitions
/// or the stack itself.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NavigationRequest {
    /// Target screen name
    pub screen: String,

    /// Screen parameters
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl NavigationRequest {
    /// Request a screen without parameters
    pub fn new(screen: impl Into<String>) -> Self {
        Self {
            screen: screen.into(),
            params: Map::new(),
        }
    }

    /// Add a parameter
    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Read a string parameter
    pub fn str_param(&self, key: &str) -> Result<&str> {
        self.params
            .get(key)
            .and_then(Value::as_str)
            .ok_or_else(|| self.missing(key))
    }

    /// Read a non-negative integer parameter
    pub fn index_param(&self, key: &str) -> Result<usize> {
        let value = self.params.get(key).ok_or_else(|| self.missing(key))?;
        value
            .as_u64()
            .and_then(|v| usize::try_from(v).ok())
            .ok_or_else(|| {
                CoreError::invalid_input(format!(
                    "parameter '{}' of screen '{}' must be a non-negative integer, got {}",
                    key, self.screen, value
                ))
            })
    }

    fn missing(&self, key: &str) -> CoreError {
        CoreError::invalid_input(format!(
            "screen '{}' requires parameter '{}'",
            self.screen, key
        ))
    }
}
