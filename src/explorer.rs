use log::{debug, info, warn};

use preference_flows::rounds::ElectorateRounds;
use preference_flows::session::{ExplorerSession, SessionEvent};
use preference_flows::*;
use snafu::{prelude::*, Snafu};

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::Arc;

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::explorer::config_reader::*;

pub mod config_reader;
mod io_common;
mod io_csv;
mod io_excel;
mod io_json;
mod render;
mod tables;

#[derive(Debug, Snafu)]
pub enum ExplorerError {
    #[snafu(display("Error opening file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing the JSON content of {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error writing the summary to {path}"))]
    WritingSummary {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening the CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Error opening the Excel file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The Excel file {path} has no worksheet"))]
    EmptyExcel { path: String },
    #[snafu(display("The Excel file {path} has no worksheet named {name}"))]
    MissingWorksheet { path: String, name: String },
    #[snafu(display("The table {path} has no header row"))]
    MissingHeader { path: String },
    #[snafu(display("The table {path} has no column {column}"))]
    MissingColumn { path: String, column: String },
    #[snafu(display("Table {path}, line {lineno}: cannot read column {column} from {content}"))]
    BadCell {
        path: String,
        lineno: usize,
        column: String,
        content: String,
    },
    #[snafu(display("Cannot guess the format of {path} (expected .csv or .xlsx)"))]
    UnsupportedFormat { path: String },
    #[snafu(display("No input: use --config or --data-dir"))]
    MissingInput {},
    #[snafu(display("The configuration file {path} has no parent directory"))]
    MissingParentDir { path: String },
    #[snafu(display("Invalid dataset: {source}"))]
    InvalidDataset { source: ExplorerErrors },
    #[snafu(display("Invalid parameter: {source}"))]
    InvalidParameter { source: ExplorerErrors },
    #[snafu(display("Unknown view {view} (expected overall, electorate, whatif or all)"))]
    UnknownView { view: String },
    #[snafu(display("Difference detected between the computed summary and the reference summary"))]
    ReferenceMismatch {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type ExplorerResult<T> = Result<T, ExplorerError>;
pub type BExplorerResult<T> = Result<T, Box<ExplorerError>>;

/// The views of the dashboard.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
enum View {
    Overall,
    Electorate,
    WhatIf,
    All,
}

impl View {
    fn parse(view: &Option<String>) -> ExplorerResult<View> {
        match view.as_deref() {
            None | Some("all") => Ok(View::All),
            Some("overall") => Ok(View::Overall),
            Some("electorate") => Ok(View::Electorate),
            Some("whatif") => Ok(View::WhatIf),
            Some(x) => UnknownViewSnafu { view: x }.fail(),
        }
    }

    fn shows(&self, other: View) -> bool {
        *self == View::All || *self == other
    }
}

/// Finds the configuration and the directory that the file paths are relative to.
fn resolve_config(args: &Args) -> BExplorerResult<(DashboardConfig, PathBuf)> {
    if let Some(config_path) = args.config.clone() {
        let config = read_config(&config_path)?;
        let root = Path::new(config_path.as_str())
            .parent()
            .context(MissingParentDirSnafu {
                path: config_path.clone(),
            })?
            .to_path_buf();
        return Ok((config, root));
    }
    if let Some(data_dir) = args.data_dir.clone() {
        return Ok((DashboardConfig::default(), PathBuf::from(data_dir)));
    }
    Err(Box::new(ExplorerError::MissingInput {}))
}

fn explorer_rules(config: &DashboardConfig, args: &Args) -> ExplorerRules {
    let mut rules = config.explorer_rules();
    if let Some(p) = args.source_party.clone() {
        rules.source_party = p;
    }
    if let Some(p) = args.designated_party.clone() {
        rules.designated_party = p;
    }
    rules
}

fn input_path(root: &Path, file: &str) -> String {
    let p: PathBuf = [root, Path::new(file)].iter().collect();
    p.as_path().display().to_string()
}

/// Reads and validates all the input files.
pub fn load_dataset(config: &DashboardConfig, root: &Path) -> BExplorerResult<Dataset> {
    let worksheet = config.excel_worksheet_name.as_deref();
    let electorates = io_json::read_electorates(&input_path(root, config.electorates_file()))?;

    let mut builder = builder::Builder::new()
        .electorates(&electorates)
        .context(InvalidDatasetSnafu)?;

    let dist_path = input_path(root, config.distribution_file());
    info!("Attempting to read the distribution of preferences {:?}", dist_path);
    let dist = tables::read_table(&dist_path, worksheet)?;
    for row in tables::distribution_rows(&dist)? {
        builder.add_distribution_row(row);
    }

    let fp_path = input_path(root, config.first_prefs_file());
    info!("Attempting to read the first preferences {:?}", fp_path);
    let fp = tables::read_table(&fp_path, worksheet)?;
    for row in tables::first_pref_rows(&fp)? {
        builder.add_first_pref_row(row);
    }

    let ft_path = input_path(root, config.final_tally_file());
    info!("Attempting to read the final tally {:?}", ft_path);
    let ft = tables::read_table(&ft_path, worksheet)?;
    for row in tables::final_tally_rows(&ft)? {
        builder.add_final_tally_row(row);
    }

    let dataset = builder.build().context(InvalidDatasetSnafu)?;
    Ok(dataset)
}

fn tally_to_json(tally: &PartyTally) -> JSValue {
    let mut m: JSMap<String, JSValue> = JSMap::new();
    for (party, seats) in tally.iter() {
        m.insert(party.to_string(), json!(seats));
    }
    JSValue::Object(m)
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

fn flows_to_json(session: &ExplorerSession) -> JSValue {
    let flows: Vec<JSValue> = session
        .flows()
        .iter()
        .map(|f| {
            json!({
                "fromParty": f.from_party,
                "toParty": f.to_party,
                "preferences": f.preferences,
                "fromPct": round2(f.from_pct),
                "toPct": round2(f.to_pct),
            })
        })
        .collect();
    JSValue::Array(flows)
}

/// The flows as nodes and links, the usual input of a sankey diagram.
fn flow_graph_to_json(session: &ExplorerSession) -> JSValue {
    let graph = session.flow_graph();
    let nodes: Vec<JSValue> = graph
        .nodes
        .iter()
        .map(|n| json!({"index": n.index, "party": n.party, "side": format!("{:?}", n.side)}))
        .collect();
    let links: Vec<JSValue> = graph
        .edges
        .iter()
        .map(|e| {
            json!({
                "source": e.from,
                "target": e.to,
                "value": e.flow.preferences,
                "fromPct": round2(e.flow.from_pct),
                "toPct": round2(e.flow.to_pct),
            })
        })
        .collect();
    json!({"nodes": nodes, "links": links})
}

fn electorate_to_json(dataset: &Dataset, er: &ElectorateRounds) -> JSValue {
    let first_prefs: Vec<JSValue> = dataset
        .electorate_first_preferences(&er.electorate)
        .unwrap_or_default()
        .iter()
        .map(|r| json!({"candidate": r.candidate, "party": r.party, "count": r.count}))
        .collect();
    let rounds: Vec<JSValue> = er
        .rounds
        .iter()
        .map(|rv| {
            let transfers: Vec<JSValue> = rv
                .transfers
                .iter()
                .map(|t| json!({"from": t.from_candidate, "to": t.to_candidate, "preferences": t.preferences}))
                .collect();
            let totals: Vec<JSValue> = rv
                .totals
                .iter()
                .map(|t| json!({"candidate": t.candidate, "party": t.party, "runningTotal": t.running_total}))
                .collect();
            json!({
                "exclusion": rv.exclusion,
                "fromCandidate": rv.from_candidate,
                "fromParty": rv.from_party,
                "votesDistributed": rv.votes_distributed,
                "transfers": transfers,
                "totals": totals,
            })
        })
        .collect();
    json!({
        "stub": er.electorate,
        "name": dataset.electorate_name(&er.electorate),
        "firstPreferences": first_prefs,
        "rounds": rounds,
    })
}

fn whatif_to_json(dataset: &Dataset, explorer: &WhatIfExplorer) -> JSValue {
    let electorates: Vec<JSValue> = explorer
        .rounds()
        .iter()
        .map(|fr| {
            let rows: Vec<JSValue> = fr
                .rows
                .iter()
                .map(|r| {
                    json!({
                        "toCandidate": r.to_candidate,
                        "toParty": r.to_party,
                        "preferences": r.preferences,
                        "toRunningTotal": r.to_running_total,
                        "originalTotal": r.original_total,
                        "votesDistributed": r.votes_distributed,
                    })
                })
                .collect();
            json!({
                "stub": fr.electorate,
                "name": dataset.electorate_name(&fr.electorate),
                "winner": fr.winner().to_candidate,
                "winnerParty": fr.winner().to_party,
                "changed": fr.winner_changed(),
                "rows": rows,
            })
        })
        .collect();
    json!({
        "percentage": explorer.percentage(),
        "observed": explorer.is_observed(),
        "electorates": electorates,
        "newTally": tally_to_json(explorer.new_tally()),
    })
}

/// Prints and records the what-if view every time the percentage changes.
#[derive(Clone)]
struct WhatIfReport {
    dataset: Arc<Dataset>,
    print: bool,
    snapshots: Rc<RefCell<Vec<JSValue>>>,
}

impl WhatIfReport {
    fn record(&self, explorer: &WhatIfExplorer) {
        if self.print {
            println!("{}", render::whatif_view(&self.dataset, explorer));
        }
        self.snapshots
            .borrow_mut()
            .push(whatif_to_json(&self.dataset, explorer));
    }
}

fn pick_electorate<'a>(session: &'a ExplorerSession) -> ExplorerResult<&'a ElectorateRecord> {
    match session.selected_electorate() {
        Some(e) => Ok(e),
        None => whatever!("The dataset does not declare any electorate"),
    }
}

fn build_summary_js(
    config: &DashboardConfig,
    session: &ExplorerSession,
    electorate: &JSValue,
    whatif_results: &[JSValue],
) -> JSValue {
    let rules = session.rules();
    json!({
        "config": {
            "title": config.title(),
            "sourceParty": rules.source_party,
            "designatedParty": rules.designated_party,
            "independentParty": rules.independent_party,
        },
        "actualTally": tally_to_json(session.baseline_tally()),
        "flows": flows_to_json(session),
        "flowGraph": flow_graph_to_json(session),
        "electorate": electorate,
        "whatIf": {
            "defaultPercentage": session.explorer().default_percentage(),
            "results": whatif_results,
        },
    })
}

fn write_summary(out: &str, pretty_js: &str) -> BExplorerResult<()> {
    if out == "stdout" {
        println!("{}", pretty_js);
    } else if !out.is_empty() {
        info!("Writing the summary to {:?}", out);
        fs::write(out, pretty_js).context(WritingSummarySnafu { path: out })?;
    }
    Ok(())
}

fn check_reference(reference_path: &str, pretty_js_stats: &str) -> BExplorerResult<()> {
    let summary_ref = read_summary(reference_path)?;
    debug!("reference summary: {:?}", summary_ref);
    let pretty_js_summary_ref = serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {
        path: reference_path,
    })?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference summary");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        return Err(Box::new(ExplorerError::ReferenceMismatch {}));
    }
    info!("The summary matches the reference {:?}", reference_path);
    Ok(())
}

pub fn run_explorer(args: &Args) -> BExplorerResult<()> {
    let view = View::parse(&args.view)?;
    let (config, root) = resolve_config(args)?;
    info!("config: {:?}", config);
    let rules = explorer_rules(&config, args);

    let dataset = Arc::new(load_dataset(&config, &root)?);
    let mut session = ExplorerSession::new(dataset.clone(), &rules);

    if let Some(key) = args.electorate.clone() {
        session
            .select_electorate(&key)
            .context(InvalidParameterSnafu)?;
    }
    let electorate = pick_electorate(&session)?.clone();
    let rounds = dataset
        .electorate_rounds(&electorate.stub)
        .context(InvalidParameterSnafu)?;

    if view.shows(View::Overall) {
        println!("{}", render::overall_view(config.title(), &session));
    }
    if view.shows(View::Electorate) {
        println!("{}", render::electorate_view(&dataset, &electorate, &rounds));
    }

    let report = WhatIfReport {
        dataset: dataset.clone(),
        print: view.shows(View::WhatIf),
        snapshots: Rc::new(RefCell::new(Vec::new())),
    };
    let subscriber = report.clone();
    session.subscribe(move |event: &SessionEvent<'_>| {
        if let SessionEvent::PercentageChanged { explorer, .. } = event {
            subscriber.record(explorer);
        }
    });

    let prefs = args.pref.clone().unwrap_or_default();
    if prefs.is_empty() {
        report.record(session.explorer());
    }
    for p in prefs {
        let changed = session.set_percentage(p).context(InvalidParameterSnafu)?;
        if !changed {
            // Nothing was published: record the current state.
            report.record(session.explorer());
        }
    }

    if args.out.is_none() && args.reference.is_none() {
        return Ok(());
    }

    let whatif_results = report.snapshots.borrow().clone();
    let result_js = build_summary_js(
        &config,
        &session,
        &electorate_to_json(&dataset, &rounds),
        &whatif_results,
    );
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(ParsingJsonSnafu {
        path: "summary",
    })?;

    if let Some(out) = args.out.clone() {
        write_summary(&out, &pretty_js_stats)?;
    }

    // The reference summary, if provided for comparison
    if let Some(reference) = args.reference.clone() {
        check_reference(&reference, &pretty_js_stats)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_dir() -> String {
        format!("{}/testdata/sample", env!("CARGO_MANIFEST_DIR"))
    }

    fn args() -> Args {
        Args {
            config: None,
            data_dir: Some(sample_dir()),
            view: Some("whatif".to_string()),
            electorate: None,
            pref: None,
            source_party: None,
            designated_party: None,
            out: None,
            reference: None,
            verbose: false,
        }
    }

    fn sample() -> Dataset {
        let (config, root) = resolve_config(&args()).unwrap();
        load_dataset(&config, &root).unwrap()
    }

    fn temp_file(name: &str) -> String {
        let p: PathBuf = [std::env::temp_dir(), PathBuf::from(name)].iter().collect();
        p.display().to_string()
    }

    #[test]
    fn load_sample() {
        let ds = sample();
        assert_eq!(ds.electorates().len(), 5);
        assert_eq!(ds.distribution().len(), 14);
        assert_eq!(ds.first_prefs().len(), 17);
        let t = ds.baseline_tally();
        assert_eq!(t.get("ALP"), 2);
        assert_eq!(t.get("LNP"), 1);
        assert_eq!(t.get("The Greens"), 1);
        assert_eq!(t.get("KAP"), 1);
    }

    #[test]
    fn sample_whatif() {
        let ds = Arc::new(sample());
        let mut session = ExplorerSession::new(ds, &ExplorerRules::default());
        let explorer = session.explorer();
        assert_eq!(explorer.rounds().len(), 1);
        assert_eq!(explorer.rounds()[0].electorate, "aspley");
        assert_eq!(explorer.default_percentage(), 85);
        assert_eq!(session.new_tally(), session.baseline_tally());

        session.set_percentage(50).unwrap();
        assert_eq!(session.new_tally().get("ALP"), 1);
        assert_eq!(session.new_tally().get("LNP"), 2);
        assert_eq!(session.new_tally().get("KAP"), 1);
    }

    #[test]
    fn sample_flows() {
        let ds = Arc::new(sample());
        let session = ExplorerSession::new(ds, &ExplorerRules::default());
        assert_eq!(session.flows().len(), 8);
        let m = session.flow_matrix();
        assert_eq!(m.get("The Greens", "ALP"), Some(5700));
        assert_eq!(m.get("ALP", "LNP"), Some(4300));
        assert_eq!(m.get("IND", "KAP"), None);
    }

    #[test]
    fn config_file_paths_are_relative() {
        let mut a = args();
        a.config = Some(format!("{}/config.json", sample_dir()));
        a.data_dir = None;
        let (config, root) = resolve_config(&a).unwrap();
        assert_eq!(config.title(), "Sample Preference Flow Explorer");
        let ds = load_dataset(&config, &root).unwrap();
        assert_eq!(ds.electorates().len(), 5);
    }

    #[test]
    fn missing_input() {
        let mut a = args();
        a.data_dir = None;
        let res = run_explorer(&a);
        assert!(matches!(res.map_err(|e| *e), Err(ExplorerError::MissingInput {})));
    }

    #[test]
    fn unknown_view() {
        let mut a = args();
        a.view = Some("sankey".to_string());
        let res = run_explorer(&a);
        assert!(matches!(res.map_err(|e| *e), Err(ExplorerError::UnknownView { .. })));
    }

    #[test]
    fn invalid_percentage() {
        let mut a = args();
        a.pref = Some(vec![40, 120]);
        let res = run_explorer(&a);
        assert!(matches!(res.map_err(|e| *e), Err(ExplorerError::InvalidParameter { .. })));
    }

    #[test]
    fn missing_file() {
        let mut a = args();
        a.data_dir = Some(format!("{}/testdata/nowhere", env!("CARGO_MANIFEST_DIR")));
        let res = run_explorer(&a);
        assert!(matches!(res.map_err(|e| *e), Err(ExplorerError::OpeningJson { .. })));
    }

    #[test]
    fn sample_summary_matches_expected() {
        let mut a = args();
        a.view = Some("overall".to_string());
        a.pref = Some(vec![85, 50]);
        a.electorate = Some("aspley".to_string());
        a.reference = Some(format!("{}/expected_summary.json", sample_dir()));
        run_explorer(&a).unwrap();
    }

    #[test]
    fn summary_matches_itself() {
        let out = temp_file("prefflow_summary_matches_itself.json");
        let mut a = args();
        a.pref = Some(vec![85, 50]);
        a.electorate = Some("Aspley".to_string());
        a.out = Some(out.clone());
        run_explorer(&a).unwrap();

        let js = read_summary(&out).unwrap();
        assert_eq!(js["electorate"]["stub"], "aspley");
        assert_eq!(js["electorate"]["rounds"].as_array().unwrap().len(), 2);
        assert_eq!(js["whatIf"]["defaultPercentage"], 85);
        assert_eq!(js["flowGraph"]["links"].as_array().unwrap().len(), 8);
        assert_eq!(js["flowGraph"]["nodes"][0]["side"], "From");
        let results = js["whatIf"]["results"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["newTally"]["ALP"], 2);
        assert_eq!(results[1]["percentage"], 50);
        assert_eq!(results[1]["electorates"][0]["winnerParty"], "LNP");
        assert_eq!(results[1]["electorates"][0]["changed"], true);

        let mut b = a.clone();
        b.out = None;
        b.reference = Some(out.clone());
        run_explorer(&b).unwrap();

        b.pref = Some(vec![30]);
        let res = run_explorer(&b);
        assert!(matches!(res.map_err(|e| *e), Err(ExplorerError::ReferenceMismatch {})));
        let _ = fs::remove_file(out);
    }
}
