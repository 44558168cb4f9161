// Text rendering of the dashboard views.

use preference_flows::flows::FlowMatrix;
use preference_flows::rounds::{candidate_colours, ElectorateRounds};
use preference_flows::session::ExplorerSession;
use std::collections::HashMap;

use crate::explorer::*;

const BAR_WIDTH: u64 = 40;

/// Formats a count with thousands separators.
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut res = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            res.push(',');
        }
        res.push(c);
    }
    res
}

/// A horizontal bar, scaled so that `max` fills `width` characters.
pub fn bar(value: u64, max: u64, width: u64) -> String {
    if max == 0 {
        return String::new();
    }
    let max = max as u128;
    let filled = (value.min(max as u64) as u128 * width as u128 + max / 2) / max;
    "█".repeat(filled as usize)
}

fn tally_chart(lines: &mut Vec<String>, label: &str, tally: &PartyTally) {
    lines.push(format!("{} ({} seats)", label, tally.total()));
    for (party, seats) in tally.sorted_desc() {
        lines.push(format!(
            "  {:<14} {} {}",
            party,
            "■".repeat(seats as usize),
            seats
        ));
    }
}

fn flow_table(lines: &mut Vec<String>, m: &FlowMatrix) {
    let mut header = format!("  {:<14}", "from \\ to");
    for p in m.to_parties.iter() {
        header.push_str(&format!(" {:>12}", p));
    }
    header.push_str(&format!(" {:>12}", FlowMatrix::MARGIN_NAME));
    lines.push(header);
    for (i, from) in m.from_parties.iter().enumerate() {
        let mut line = format!("  {:<14}", from);
        for c in m.cells[i].iter() {
            line.push_str(&format!(" {:>12}", format_count(*c)));
        }
        line.push_str(&format!(" {:>12}", format_count(m.row_totals[i])));
        lines.push(line);
    }
    let mut footer = format!("  {:<14}", FlowMatrix::MARGIN_NAME);
    for c in m.column_totals.iter() {
        footer.push_str(&format!(" {:>12}", format_count(*c)));
    }
    footer.push_str(&format!(" {:>12}", format_count(m.total)));
    lines.push(footer);
}

pub fn overall_view(title: &str, session: &ExplorerSession) -> String {
    let mut lines: Vec<String> = vec![format!("== {} ==", title), String::new()];
    tally_chart(&mut lines, "Total seats won", session.baseline_tally());
    lines.push(String::new());

    lines.push("Preference flows between parties".to_string());
    flow_table(&mut lines, &session.flow_matrix());
    lines.push(String::new());
    for f in session.flows() {
        lines.push(format!(
            "  {} -> {}: {} ({:.2}% of the preferences from {}, {:.2}% of the preferences to {})",
            f.from_party,
            f.to_party,
            format_count(f.preferences),
            f.from_pct,
            f.from_party,
            f.to_pct,
            f.to_party
        ));
    }
    lines.join("\n")
}

fn colour_tag(colours: &HashMap<String, String>, candidate: &str) -> String {
    match colours.get(candidate) {
        Some(c) if !c.is_empty() => format!(" [{}]", c),
        _ => String::new(),
    }
}

pub fn electorate_view(
    dataset: &Dataset,
    electorate: &ElectorateRecord,
    rounds: &ElectorateRounds,
) -> String {
    let colours = candidate_colours(dataset.first_prefs());
    let mut lines: Vec<String> = vec![format!("== {} ({}) ==", electorate.name, electorate.stub)];

    let first_prefs = dataset
        .electorate_first_preferences(&electorate.stub)
        .unwrap_or_default();
    let max_first = first_prefs.iter().map(|r| r.count).max().unwrap_or(0);
    lines.push("First preferences".to_string());
    for r in first_prefs.iter() {
        lines.push(format!(
            "  {:<24} {:<12} {} {}{}",
            r.candidate,
            r.party,
            bar(r.count, max_first, BAR_WIDTH),
            format_count(r.count),
            colour_tag(&colours, &r.candidate)
        ));
    }

    if rounds.rounds.is_empty() {
        lines.push(String::new());
        lines.push("Won on first preferences.".to_string());
    }
    for rv in rounds.rounds.iter() {
        lines.push(String::new());
        lines.push(format!(
            "Distribution {}: {} ({}) excluded, {} votes distributed",
            rv.exclusion,
            rv.from_candidate,
            rv.from_party,
            format_count(rv.votes_distributed)
        ));
        for t in rv.transfers.iter() {
            lines.push(format!(
                "  {} -> {}: {}",
                t.from_candidate,
                t.to_candidate,
                format_count(t.preferences)
            ));
        }
        lines.push("  Running totals".to_string());
        for c in rv.totals.iter() {
            lines.push(format!(
                "  {:<24} {:<12} {} {}{}",
                c.candidate,
                c.party,
                bar(c.running_total, rounds.max_running_total, BAR_WIDTH),
                format_count(c.running_total),
                colour_tag(&colours, &c.candidate)
            ));
        }
    }
    lines.join("\n")
}

pub fn whatif_view(dataset: &Dataset, explorer: &WhatIfExplorer) -> String {
    let heading = if explorer.is_observed() {
        format!(
            "== What if: observed split ({}% of the last preferences went to the designated party) ==",
            explorer.default_percentage()
        )
    } else {
        format!(
            "== What if: {}% of the last preferences go to the designated party (observed: {}%) ==",
            explorer.percentage(),
            explorer.default_percentage()
        )
    };
    let mut lines: Vec<String> = vec![heading, String::new()];
    tally_chart(&mut lines, "Actual seat tally", explorer.baseline());
    lines.push(String::new());
    tally_chart(&mut lines, "New seat tally", explorer.new_tally());

    if explorer.rounds().is_empty() {
        lines.push(String::new());
        lines.push("No electorate is decided by these preferences.".to_string());
    }
    for fr in explorer.rounds() {
        lines.push(String::new());
        let changed = if fr.winner_changed() { " (changed)" } else { "" };
        lines.push(format!(
            "{}: won by {} ({}){}",
            dataset.electorate_name(&fr.electorate),
            fr.winner().to_candidate,
            fr.winner().to_party,
            changed
        ));
        let max = fr.rows.iter().map(|r| r.to_running_total).max().unwrap_or(0);
        for r in fr.rows.iter() {
            lines.push(format!(
                "  {:<24} {:<12} {} {} (+{})",
                r.to_candidate,
                r.to_party,
                bar(r.to_running_total, max, BAR_WIDTH),
                format_count(r.to_running_total),
                format_count(r.preferences)
            ));
        }
    }
    lines.join("\n")
}
