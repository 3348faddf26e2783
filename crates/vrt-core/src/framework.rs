//! Screenshot framework the captures come from

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::CoreError;

/// Capture framework, resolved once from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    #[default]
    Playwright,
    Cypress,
    Puppeteer,
    Selenium,
}

impl Framework {
    pub const ALL: [Framework; 4] = [
        Framework::Playwright,
        Framework::Cypress,
        Framework::Puppeteer,
        Framework::Selenium,
    ];

    /// Directory segment used under the baseline and compare stores
    pub fn as_str(&self) -> &'static str {
        match self {
            Framework::Playwright => "playwright",
            Framework::Cypress => "cypress",
            Framework::Puppeteer => "puppeteer",
            Framework::Selenium => "selenium",
        }
    }
}

impl std::fmt::Display for Framework {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Framework {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Framework::ALL
            .into_iter()
            .find(|f| f.as_str() == wanted)
            .ok_or_else(|| {
                CoreError::InvalidInput(format!(
                    "Unknown framework '{}'. Expected one of: playwright, cypress, puppeteer, selenium",
                    s
                ))
            })
    }
}
