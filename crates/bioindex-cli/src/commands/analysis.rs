//! Analysis command - list bioindex IDs from a saved analysis listing.

use std::path::PathBuf;

use bioindex::model::AnalysisList;
use colored::Colorize;

pub fn run(file: PathBuf, verbose: bool) -> Result<(), Box<dyn std::error::Error>> {
    if !file.exists() {
        return Err(format!("Analysis listing not found: {}", file.display()).into());
    }

    let listing = AnalysisList::from_path(&file)?;

    if verbose {
        println!(
            "{} {} of {} analyses",
            "Listing".cyan().bold(),
            listing.records.len(),
            listing.count
        );
        println!();
    }

    for analysis in &listing.records {
        println!("{}", analysis.name.white().bold());
        let ids = analysis.list_bioindex_ids();
        if ids.is_empty() {
            println!("  {}", "(no bioindex)".dimmed());
        }
        for (i, id) in ids.iter().enumerate() {
            println!("  {}. {}", i + 1, id);
        }
    }

    Ok(())
}
