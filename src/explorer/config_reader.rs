use crate::explorer::*;
use snafu::prelude::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct RulesSettings {
    #[serde(rename = "sourceParty")]
    pub source_party: Option<String>,
    #[serde(rename = "designatedParty")]
    pub designated_party: Option<String>,
    #[serde(rename = "independentParty")]
    pub independent_party: Option<String>,
}

/// The configuration of the dashboard. All the entries are optional.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize, Default)]
pub struct DashboardConfig {
    pub title: Option<String>,
    #[serde(rename = "electoratesFile")]
    pub electorates_file: Option<String>,
    #[serde(rename = "distributionFile")]
    pub distribution_file: Option<String>,
    #[serde(rename = "firstPrefsFile")]
    pub first_prefs_file: Option<String>,
    #[serde(rename = "finalTallyFile")]
    pub final_tally_file: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    pub rules: Option<RulesSettings>,
}

impl DashboardConfig {
    pub const DEFAULT_TITLE: &'static str = "Queensland Election Preference Flow Explorer";
    pub const DEFAULT_ELECTORATES_FILE: &'static str = "electorates.json";
    pub const DEFAULT_DISTRIBUTION_FILE: &'static str = "distributions.csv";
    pub const DEFAULT_FIRST_PREFS_FILE: &'static str = "first_prefs.csv";
    pub const DEFAULT_FINAL_TALLY_FILE: &'static str = "final_tally.csv";

    pub fn title(&self) -> &str {
        self.title.as_deref().unwrap_or(Self::DEFAULT_TITLE)
    }

    pub fn electorates_file(&self) -> &str {
        self.electorates_file
            .as_deref()
            .unwrap_or(Self::DEFAULT_ELECTORATES_FILE)
    }

    pub fn distribution_file(&self) -> &str {
        self.distribution_file
            .as_deref()
            .unwrap_or(Self::DEFAULT_DISTRIBUTION_FILE)
    }

    pub fn first_prefs_file(&self) -> &str {
        self.first_prefs_file
            .as_deref()
            .unwrap_or(Self::DEFAULT_FIRST_PREFS_FILE)
    }

    pub fn final_tally_file(&self) -> &str {
        self.final_tally_file
            .as_deref()
            .unwrap_or(Self::DEFAULT_FINAL_TALLY_FILE)
    }

    /// The rules of the explorer, with the defaults filled in.
    pub fn explorer_rules(&self) -> ExplorerRules {
        let mut rules = ExplorerRules::default();
        if let Some(rs) = self.rules.clone() {
            if let Some(p) = rs.source_party {
                rules.source_party = p;
            }
            if let Some(p) = rs.designated_party {
                rules.designated_party = p;
            }
            if let Some(p) = rs.independent_party {
                rules.independent_party = p;
            }
        }
        rules
    }
}

pub fn read_config(path: &str) -> BExplorerResult<DashboardConfig> {
    info!("Attempting to read config file {:?}", path);
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    debug!("config: {:?}", contents);
    let config: DashboardConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(config)
}

pub fn read_summary(path: &str) -> BExplorerResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(js)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config() {
        let config: DashboardConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, DashboardConfig::default());
        assert_eq!(config.distribution_file(), "distributions.csv");
        assert_eq!(config.explorer_rules(), ExplorerRules::default());
    }

    #[test]
    fn partial_rules() {
        let config: DashboardConfig = serde_json::from_str(
            r#"{
                "title": "Test",
                "finalTallyFile": "tally.xlsx",
                "excelWorksheetName": "Results",
                "rules": {"sourceParty": "LNP"}
            }"#,
        )
        .unwrap();
        assert_eq!(config.title(), "Test");
        assert_eq!(config.final_tally_file(), "tally.xlsx");
        assert_eq!(config.electorates_file(), "electorates.json");
        assert_eq!(config.excel_worksheet_name.as_deref(), Some("Results"));
        let rules = config.explorer_rules();
        assert_eq!(rules.source_party, "LNP");
        assert_eq!(rules.designated_party, "ALP");
        assert_eq!(rules.independent_party, "IND");
    }

    #[test]
    fn missing_config() {
        let res = read_config("/nonexistent/prefflow/config.json");
        assert!(matches!(res.map_err(|e| *e), Err(ExplorerError::OpeningJson { .. })));
    }
}
