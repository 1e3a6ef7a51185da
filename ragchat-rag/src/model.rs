//! Chat models known to the service.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A chat model the endpoints can ask for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AvailableModel {
    #[default]
    Gpt35Turbo,
    Gpt4,
    Gpt41,
}

/// Model → model name. Lookups of unknown names fall back to
/// [`AvailableModel::default`].
const MODEL_NAMES: &[(AvailableModel, &str)] = &[
    (AvailableModel::Gpt35Turbo, "gpt-3.5-turbo"),
    (AvailableModel::Gpt4, "gpt-4"),
    (AvailableModel::Gpt41, "gpt-4.1"),
];

impl AvailableModel {
    pub fn model_name(self) -> &'static str {
        MODEL_NAMES
            .iter()
            .find(|(model, _)| *model == self)
            .map(|(_, name)| *name)
            .unwrap_or("gpt-3.5-turbo")
    }

    /// Resolve a model name, falling back to the default model for anything
    /// unknown.
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        MODEL_NAMES
            .iter()
            .find(|(_, known)| known.eq_ignore_ascii_case(name))
            .map(|(model, _)| *model)
            .unwrap_or_default()
    }
}

impl FromStr for AvailableModel {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from_name(s))
    }
}

impl fmt::Display for AvailableModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.model_name())
    }
}
