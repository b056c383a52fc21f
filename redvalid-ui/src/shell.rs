//! Tab navigation and the shared search input
//!
//! The home tab carries a search box; submitting a non-blank value switches
//! to the check tab, whose query view starts with that value and runs it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tab {
    #[default]
    Home,
    Check,
    Upload,
}

impl Tab {
    pub const ALL: [Tab; 3] = [Tab::Home, Tab::Check, Tab::Upload];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tab::Home => "home",
            Tab::Check => "check",
            Tab::Upload => "upload",
        }
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "home" => Ok(Tab::Home),
            "check" | "query" => Ok(Tab::Check),
            "upload" => Ok(Tab::Upload),
            other => Err(format!("unknown tab: {}", other)),
        }
    }
}

/// Top-level navigation state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Shell {
    active: Tab,
    search_input: String,
}

impl Shell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_tab(&self) -> Tab {
        self.active
    }

    pub fn select_tab(&mut self, tab: Tab) {
        self.active = tab;
    }

    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    pub fn set_search_input(&mut self, input: impl Into<String>) {
        self.search_input = input.into();
    }

    /// Switch to the check tab when the search input is non-blank
    ///
    /// Returns whether the tab changed hands to the query view.
    pub fn submit_search(&mut self) -> bool {
        if self.search_input.trim().is_empty() {
            return false;
        }
        self.active = Tab::Check;
        true
    }

    /// Value the query view should start with on the check tab
    pub fn seeded_query(&self) -> Option<&str> {
        let trimmed = self.search_input.trim();
        (self.active == Tab::Check && !trimmed.is_empty()).then_some(trimmed)
    }
}
