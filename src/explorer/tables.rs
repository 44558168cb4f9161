// Conversion of the raw input tables into the rows of the dataset.

use crate::explorer::io_common::{table_format, RawTable, TableFormat};
use crate::explorer::io_csv::read_csv_table;
use crate::explorer::io_excel::read_excel_table;
use crate::explorer::*;

/// Reads a CSV or an Excel table, depending on the extension of the file.
pub fn read_table(path: &str, worksheet: Option<&str>) -> BExplorerResult<RawTable> {
    let table = match table_format(path) {
        Some(TableFormat::Csv) => read_csv_table(path)?,
        Some(TableFormat::Excel) => read_excel_table(path, worksheet)?,
        None => UnsupportedFormatSnafu { path }.fail()?,
    };
    Ok(table)
}

pub fn distribution_rows(table: &RawTable) -> BExplorerResult<Vec<DistributionRow>> {
    let electorate = table.column("electorate")?;
    let exclusion = table.column("exclusion")?;
    let from_party = table.column("fromParty")?;
    let from_candidate = table.column("fromCandidate")?;
    let to_party = table.column("toParty")?;
    let to_candidate = table.column("toCandidate")?;
    let preferences = table.column("preferences")?;
    let votes_distributed = table.column("votesDistributed")?;
    let to_running_total = table.column("toRunningTotal")?;
    let ballot_order = table.optional_column("ballotOrder");

    let mut res: Vec<DistributionRow> = Vec::with_capacity(table.rows.len());
    for i in 0..table.rows.len() {
        res.push(DistributionRow {
            electorate: table.required_text(i, electorate)?,
            exclusion: table.ordinal(i, exclusion)?,
            from_party: table.text(i, from_party),
            from_candidate: table.required_text(i, from_candidate)?,
            to_party: table.text(i, to_party),
            to_candidate: table.required_text(i, to_candidate)?,
            preferences: table.count(i, preferences)?,
            votes_distributed: table.count(i, votes_distributed)?,
            to_running_total: table.count(i, to_running_total)?,
            ballot_order: match ballot_order {
                Some(col) => table.ordinal(i, col)?,
                None => 0,
            },
        });
    }
    Ok(res)
}

pub fn first_pref_rows(table: &RawTable) -> BExplorerResult<Vec<FirstPrefRow>> {
    let electorate = table.column("electorate")?;
    let candidate = table.column("candidate")?;
    let party = table.column("party")?;
    let count = table.column("count")?;
    let colour = table.optional_column("colour");
    let ballot_order = table.optional_column("ballotOrder");

    let mut res: Vec<FirstPrefRow> = Vec::with_capacity(table.rows.len());
    for i in 0..table.rows.len() {
        res.push(FirstPrefRow {
            electorate: table.required_text(i, electorate)?,
            candidate: table.required_text(i, candidate)?,
            party: table.text(i, party),
            count: table.count(i, count)?,
            colour: colour.map(|col| table.text(i, col)).unwrap_or_default(),
            ballot_order: match ballot_order {
                Some(col) => table.ordinal(i, col)?,
                None => 0,
            },
        });
    }
    Ok(res)
}

pub fn final_tally_rows(table: &RawTable) -> BExplorerResult<Vec<FinalTallyRow>> {
    let electorate = table.column("electorate")?;
    let party = table.column("party")?;
    let count = table.column("count")?;

    let mut res: Vec<FinalTallyRow> = Vec::with_capacity(table.rows.len());
    for i in 0..table.rows.len() {
        res.push(FinalTallyRow {
            electorate: table.required_text(i, electorate)?,
            party: table.required_text(i, party)?,
            count: table.count(i, count)?,
        });
    }
    Ok(res)
}
