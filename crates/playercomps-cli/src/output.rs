// Plain-text and JSON rendering of query results.

use clap::ValueEnum;
use playercomps_engine::{SimilarPlayer, StatLine};
use serde::Serialize;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Serialize)]
struct SimilarReport<'a> {
    player: &'a str,
    season: i32,
    results: &'a [SimilarPlayer],
}

pub fn render_similar(
    player: &str,
    season: i32,
    results: &[SimilarPlayer],
    format: OutputFormat,
) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&SimilarReport {
            player,
            season,
            results,
        })?),
        OutputFormat::Table => {
            let width = results
                .iter()
                .map(|r| r.player_name.chars().count())
                .max()
                .unwrap_or(0)
                .max("Player".len());
            let mut out = String::new();
            writeln!(out, "Most similar to {player} ({season})")?;
            writeln!(
                out,
                "{:>4}  {:<width$}  {:>6}  {:<4}  {:>10}",
                "Rank", "Player", "Season", "Team", "Similarity"
            )?;
            for (rank, r) in results.iter().enumerate() {
                writeln!(
                    out,
                    "{:>4}  {:<width$}  {:>6}  {:<4}  {:>10.4}",
                    rank + 1,
                    r.player_name,
                    r.season,
                    r.team,
                    r.similarity
                )?;
            }
            Ok(out)
        }
    }
}

pub fn render_stat_lines(lines: &[StatLine], format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(lines)?),
        OutputFormat::Table => {
            let mut out = String::new();
            for line in lines {
                let id = &line.identity;
                writeln!(
                    out,
                    "{} ({}) {} {} {}",
                    id.player, id.season, id.tm, id.pos, id.lg
                )?;
                let width = line
                    .stats
                    .iter()
                    .map(|s| s.stat.len())
                    .max()
                    .unwrap_or(0);
                for s in &line.stats {
                    writeln!(out, "  {:<width$}  {:>10.3}", s.stat, s.value)?;
                }
            }
            Ok(out)
        }
    }
}
