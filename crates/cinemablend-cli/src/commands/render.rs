//! Human-readable rendering of a blend result.

use blend_models::comparison::SharedFilm;
use blend_models::result::{BlendResult, NicheSource, Pair, RewatchLeaders, Side};
use comfy_table::{modifiers, presets, Attribute, Cell, CellAlignment, Color, Table};
use owo_colors::OwoColorize;
use serde_json::{json, Value};

use crate::output::Output;

fn styled_table(title: &str, columns: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL);
    table.apply_modifier(modifiers::UTF8_ROUND_CORNERS);

    let mut header = vec![Cell::new(title).fg(Color::Cyan).add_attribute(Attribute::Bold)];
    header.extend(columns.iter().map(|c| Cell::new(c).add_attribute(Attribute::Bold)));
    table.set_header(header);
    table
}

fn stars(rating: Option<f64>) -> String {
    match rating {
        Some(r) => format!("{:.1}", r),
        None => "-".to_string(),
    }
}

fn year(year: &Option<String>) -> String {
    year.clone().unwrap_or_else(|| "-".to_string())
}

fn name_of(names: &Pair<String>, side: Side) -> &str {
    names.get(side)
}

/// Structured payload for `--output json`.
pub fn report(names: &Pair<String>, result: &BlendResult) -> Value {
    json!({
        "people": { "p1": names.person1, "p2": names.person2 },
        "result": result,
    })
}

pub fn print_result(output: &Output, names: &Pair<String>, result: &BlendResult, clash_count: usize) {
    if !output.is_human() {
        if let Err(e) = output.data(&report(names, result)) {
            output.error(format!("Failed to serialize result: {}", e));
        }
        return;
    }
    if output.is_quiet() {
        println!("{}", result.score);
        return;
    }

    print_score(names, result);
    print_stats(names, result);
    print_shared("Most agreed", names, &result.agreed);
    let clashes: Vec<SharedFilm> = result.clashes.iter().take(clash_count).cloned().collect();
    print_shared("Biggest clashes", names, &clashes);
    print_recommendations(names, result);
    print_rewatches(names, result);
    print_eras(names, result);
    print_personality(names, result);
    print_recent(names, result);
    if result.niche.source != NicheSource::NotRequested {
        print_niche(names, result);
    }
}

fn print_score(names: &Pair<String>, result: &BlendResult) {
    println!("\n{}", "╔════════════════════════════════════════════════════════════╗".bright_white());
    println!(
        "{} {} {} {}",
        "║".bright_white(),
        names.person1.bright_cyan().bold(),
        "×".bright_white(),
        names.person2.bright_magenta().bold()
    );
    println!(
        "{} {}% {}",
        "║".bright_white(),
        result.score.to_string().bright_green().bold(),
        result.label.bright_white()
    );
    println!("{}", "╚════════════════════════════════════════════════════════════╝".bright_white());
    println!();

    let b = &result.breakdown;
    let mut table = styled_table("Score breakdown", &["Points"]);
    let rows = [
        ("Overlap", b.overlap),
        ("Rating agreement", b.rating_agreement / 2.0),
        ("Consistency", b.consistency_bonus),
        ("Rewatch alignment", b.rewatch_alignment),
        ("Coverage", b.coverage_bonus),
        ("Diversity", b.diversity_bonus),
        ("Generosity gap", -b.generosity_penalty),
    ];
    for (label, points) in rows {
        table.add_row(vec![
            Cell::new(label),
            Cell::new(format!("{:+.1}", points)).set_alignment(CellAlignment::Right),
        ]);
    }
    table.add_row(vec![
        Cell::new("Raw total").add_attribute(Attribute::Bold),
        Cell::new(format!("{:.1}", b.raw_total)).set_alignment(CellAlignment::Right),
    ]);
    println!("{}", table);
    println!();
}

fn print_stats(names: &Pair<String>, result: &BlendResult) {
    let s = &result.stats;
    let mut table = styled_table("Stats", &[names.person1.as_str(), names.person2.as_str()]);
    let rows: [(&str, String, String); 4] = [
        ("Films", s.total.person1.to_string(), s.total.person2.to_string()),
        ("Rated", s.rated.person1.to_string(), s.rated.person2.to_string()),
        ("Only theirs", s.exclusive.person1.to_string(), s.exclusive.person2.to_string()),
        ("Average rating", format!("{:.2}", s.average.person1), format!("{:.2}", s.average.person2)),
    ];
    for (label, left, right) in rows {
        table.add_row(vec![Cell::new(label), Cell::new(left), Cell::new(right)]);
    }
    println!("{}", table);
    println!(
        "{} films in common ({}% overlap), {} rated by both",
        s.shared_count.to_string().bold(),
        s.shared_percent,
        s.rated_shared_count
    );
    println!();
}

fn print_shared(title: &str, names: &Pair<String>, films: &[SharedFilm]) {
    if films.is_empty() {
        return;
    }
    let mut table = styled_table(title, &["Year", names.person1.as_str(), names.person2.as_str(), "Gap"]);
    for film in films {
        table.add_row(vec![
            Cell::new(&film.name),
            Cell::new(year(&film.year)),
            Cell::new(stars(film.rating1)),
            Cell::new(stars(film.rating2)),
            Cell::new(stars(film.diff)),
        ]);
    }
    println!("{}", table);
    println!();
}

fn print_recommendations(names: &Pair<String>, result: &BlendResult) {
    // Each side's exclusive favourites are suggestions for the other side
    for (from, to) in [(Side::Person1, Side::Person2), (Side::Person2, Side::Person1)] {
        let films = result.recommendations.get(from);
        if films.is_empty() {
            continue;
        }
        let title = format!("For {} from {}", name_of(names, to), name_of(names, from));
        let mut table = styled_table(&title, &["Year", "Rating"]);
        for film in films {
            table.add_row(vec![
                Cell::new(&film.name),
                Cell::new(year(&film.year)),
                Cell::new(stars(film.rating)),
            ]);
        }
        println!("{}", table);
        println!();
    }
}

fn print_rewatches(names: &Pair<String>, result: &BlendResult) {
    let mut table = styled_table("Most rewatched", &["Film", "Times"]);
    for side in [Side::Person1, Side::Person2] {
        match result.rewatch_leaders.get(side) {
            RewatchLeaders::NoRewatches => {
                table.add_row(vec![
                    Cell::new(name_of(names, side)),
                    Cell::new("no rewatches").fg(Color::DarkGrey),
                    Cell::new(""),
                ]);
            }
            RewatchLeaders::Leaders { films } => {
                for (i, leader) in films.iter().enumerate() {
                    let who = if i == 0 { name_of(names, side) } else { "" };
                    table.add_row(vec![
                        Cell::new(who),
                        Cell::new(&leader.name),
                        Cell::new(leader.count),
                    ]);
                }
            }
        }
    }
    println!("{}", table);
    println!();
}

fn print_eras(names: &Pair<String>, result: &BlendResult) {
    if result.eras.axis.is_empty() {
        return;
    }
    let mut table = styled_table("Decade", &[names.person1.as_str(), names.person2.as_str()]);
    for decade in &result.eras.axis {
        table.add_row(vec![
            Cell::new(format!("{}s", decade)),
            Cell::new(result.eras.count(Side::Person1, *decade)),
            Cell::new(result.eras.count(Side::Person2, *decade)),
        ]);
    }
    println!("{}", table);
    println!();
}

fn print_personality(names: &Pair<String>, result: &BlendResult) {
    let g = &result.generosity;
    println!(
        "{} rates {} stars harder on average than {}",
        name_of(names, g.harsher).bold(),
        format!("{:.2}", g.gap).yellow(),
        name_of(names, g.kinder).bold()
    );

    for side in [Side::Person1, Side::Person2] {
        if let Some(pleasure) = result.guilty_pleasures.get(side) {
            println!(
                "{}'s guilty pleasure: {} ({}, +{:.2} above their average)",
                name_of(names, side),
                pleasure.film.name.bright_white(),
                stars(pleasure.film.rating),
                pleasure.above_average
            );
        }
        if let Some(favourite) = result.favourite_years.get(side) {
            println!(
                "{}'s favourite year: {} ({} films)",
                name_of(names, side),
                favourite.year.to_string().bright_white(),
                favourite.count
            );
        }
    }
    println!();
}

fn print_recent(names: &Pair<String>, result: &BlendResult) {
    for side in [Side::Person1, Side::Person2] {
        let entries = result.recent.get(side);
        if entries.is_empty() {
            continue;
        }
        let title = format!("{} lately", name_of(names, side));
        let mut table = styled_table(&title, &["Watched", "Rating", ""]);
        for entry in entries {
            let watched = entry
                .watched_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| "-".to_string());
            table.add_row(vec![
                Cell::new(&entry.name),
                Cell::new(watched),
                Cell::new(stars(entry.rating)),
                Cell::new(if entry.rewatch { "rewatch" } else { "" }),
            ]);
        }
        println!("{}", table);
        println!();
    }
}

fn print_niche(names: &Pair<String>, result: &BlendResult) {
    let niche = &result.niche;
    let mut table = styled_table("Most niche", &["Film", "Votes", "Popularity"]);
    for side in [Side::Person1, Side::Person2] {
        let row = match niche.picks.get(side) {
            Some(pick) => vec![
                Cell::new(name_of(names, side)),
                Cell::new(format!("{} ({})", pick.title, pick.year)),
                Cell::new(pick.vote_count),
                Cell::new(format!("{:.1}", pick.popularity)),
            ],
            None => vec![
                Cell::new(name_of(names, side)),
                Cell::new("-"),
                Cell::new("-"),
                Cell::new("-"),
            ],
        };
        table.add_row(row);
    }
    println!("{}", table);

    match niche.more_niche {
        Some(side) => println!("{} has the more niche taste", name_of(names, side).bold()),
        None if niche.source == NicheSource::Metadata => println!("Equally mainstream"),
        None => {}
    }
    if let Some(note) = &niche.note {
        println!("{}", note.bright_black());
    }
    println!();
}
