use clap::Parser;

/// This is an explorer for the preference flows of instant-runoff elections.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the input files and the parties to analyse.
    /// For more information about the file format, read the documentation of the preference_flows crate.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (directory, optional) A directory containing electorates.json, distributions.csv,
    /// first_prefs.csv and final_tally.csv. Ignored if --config is provided.
    #[clap(short, long, value_parser)]
    pub data_dir: Option<String>,

    /// (default all) The view to display: overall, electorate, whatif or all.
    #[clap(long, value_parser)]
    pub view: Option<String>,

    /// (stub or name, optional) The electorate to display in the electorate view. The first
    /// electorate is displayed by default.
    #[clap(short, long, value_parser)]
    pub electorate: Option<String>,

    /// (0 to 100, repeatable) The percentage of the source party's last preferences going to the
    /// designated party. Each value is applied in turn. Defaults to the percentage observed in the data.
    #[clap(short, long, value_parser)]
    pub pref: Option<Vec<u32>>,

    /// The party whose preferences are distributed last. Overrides the configuration file.
    #[clap(long, value_parser)]
    pub source_party: Option<String>,

    /// The party receiving the adjusted share of preferences. Overrides the configuration file.
    #[clap(long, value_parser)]
    pub designated_party: Option<String>,

    /// (file path, 'stdout' or empty) If specified, a summary of the views will be written in JSON
    /// format to the given location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference summary in JSON format. If provided, prefflow will
    /// check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
