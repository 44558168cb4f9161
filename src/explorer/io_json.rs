use crate::explorer::*;
use snafu::prelude::*;

use serde::Deserialize;

#[derive(Eq, PartialEq, Debug, Clone, Deserialize)]
struct ElectorateEntry {
    stub: String,
    #[serde(rename = "electorateName")]
    electorate_name: String,
}

/// Reads the list of electorates as (stub, display name) pairs, in file order.
pub fn read_electorates(path: &str) -> BExplorerResult<Vec<(String, String)>> {
    info!("Attempting to read the electorates {:?}", path);
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let entries: Vec<ElectorateEntry> =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    debug!("read_electorates: {} electorates", entries.len());
    Ok(entries
        .into_iter()
        .map(|e| (e.stub, e.electorate_name))
        .collect())
}
