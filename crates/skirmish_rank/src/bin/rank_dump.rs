//! # Rank Dump
//!
//! Command-line tool to print a rank file as a leaderboard.

use skirmish_core::BodyRegion;
use skirmish_rank::{PointTable, RankStore};
use std::sync::Arc;

fn main() {
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         SKIRMISH RANK DUMP                                       ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        println!("Usage: rank_dump <rank_file.dat>");
        println!();
        println!("Options:");
        println!("  --top <n>           Show only the first n entries (default 25)");
        println!("  --points <file>     Score with this point table");
        return;
    }

    let rank_path = &args[1];
    let top: usize = args
        .iter()
        .position(|a| a == "--top")
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok())
        .unwrap_or(25);
    let points = args
        .iter()
        .position(|a| a == "--points")
        .and_then(|i| args.get(i + 1))
        .map_or_else(PointTable::default, PointTable::load_or_default);

    println!("Loading rank: {rank_path}");

    let mut store = RankStore::new(usize::MAX, Arc::new(points));
    if let Err(e) = store.load(rank_path) {
        println!("Error: Could not load rank file: {e}");
        return;
    }

    println!();
    println!("┌─ SUMMARY ──────────────────────────────────────────────────────┐");
    println!("│ Entries:            {}", store.len());
    let shots: i64 = store.iter().map(|e| i64::from(e.stats().shots)).sum();
    let hits: i64 = store.iter().map(|e| i64::from(e.stats().hits)).sum();
    println!("│ Total shots:        {shots}");
    println!("│ Total hits:         {hits}");
    if shots > 0 {
        println!("│ Accuracy:           {:.1}%", hits as f64 * 100.0 / shots as f64);
    }
    println!("└────────────────────────────────────────────────────────────────┘");
    println!();

    println!(
        "{:>5}  {:<32} {:>6} {:>6} {:>6} {:>5} {:>4} {:>7}",
        "#", "name", "score", "kills", "deaths", "hs", "tk", "damage"
    );
    for (i, entry) in store.iter().take(top).enumerate() {
        let s = entry.stats();
        println!(
            "{:>5}  {:<32} {:>6} {:>6} {:>6} {:>5} {:>4} {:>7}",
            i + 1,
            entry.name(),
            entry.score(),
            s.kills,
            s.deaths,
            s.headshots,
            s.teamkills,
            s.damage
        );
    }

    if let Some(leader) = store.entry_at(1) {
        let s = leader.stats();
        println!();
        println!("┌─ LEADER HIT LOCATIONS ─────────────────────────────────────────┐");
        for (label, region) in [
            ("head", BodyRegion::Head),
            ("chest", BodyRegion::Chest),
            ("stomach", BodyRegion::Stomach),
            ("left arm", BodyRegion::LeftArm),
            ("right arm", BodyRegion::RightArm),
            ("left leg", BodyRegion::LeftLeg),
            ("right leg", BodyRegion::RightLeg),
        ] {
            println!("│ {:<18} {}", label, s.body_hits[region.index()]);
        }
        println!("└────────────────────────────────────────────────────────────────┘");
    }
}
