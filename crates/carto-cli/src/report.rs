//! Terminal output for the `categories` and `sync` commands.

use std::fmt::Write;

use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use carto_core::{CategoryView, LoadOutcome};
use carto_model::Category;

use crate::types::SyncResult;

pub fn print_categories() {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Key"),
        header_cell("Label"),
        header_cell("Toggles"),
        header_cell("Drawn as"),
        header_cell("View"),
    ]);
    apply_table_style(&mut table);
    for category in Category::ALL {
        let toggles = if category.is_compound() {
            "master + per record"
        } else {
            "master"
        };
        table.add_row(vec![
            Cell::new(category.key())
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            Cell::new(category.label()),
            Cell::new(toggles),
            Cell::new(category.render_strategy().as_str()),
            dim_cell(category.query().table),
        ]);
    }
    println!("{table}");
}

pub fn print_summary(result: &SyncResult) {
    println!("Source: {}", result.source);
    println!("User: {}", result.user);
    println!("State: {}", result.state);
    let latest = result.latest();
    println!(
        "Loaded in {} ms (epoch {}), {} layers shown",
        latest.duration.as_millis(),
        latest.epoch,
        result.attached_layers
    );

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Category"),
        header_cell("Outcome"),
        header_cell("Records"),
        header_cell("Shown"),
        header_cell("Unchecked"),
        header_cell("Skipped rows"),
    ]);
    apply_summary_table_style(&mut table);
    for index in 2..6 {
        align_column(&mut table, index, CellAlignment::Right);
    }

    let mut total_records = 0usize;
    let mut total_shown = 0usize;
    for view in &result.views {
        let outcome = latest.outcome(view.category);
        total_records += view.record_count;
        total_shown += view.attached_count;
        table.add_row(vec![
            Cell::new(view.category.label())
                .fg(Color::Blue)
                .add_attribute(Attribute::Bold),
            outcome_cell(outcome),
            Cell::new(view.record_count),
            Cell::new(view.attached_count),
            count_cell(view.hidden_count(), Color::Yellow),
            count_cell(
                outcome
                    .and_then(LoadOutcome::summary)
                    .map_or(0, |summary| summary.skipped),
                Color::Red,
            ),
        ]);
    }
    table.add_row(vec![
        Cell::new("TOTAL")
            .fg(Color::Cyan)
            .add_attribute(Attribute::Bold),
        dim_cell("-"),
        Cell::new(total_records).add_attribute(Attribute::Bold),
        Cell::new(total_shown).add_attribute(Attribute::Bold),
        dim_cell("-"),
        dim_cell("-"),
    ]);
    println!("{table}");

    println!();
    println!("Layers:");
    print!("{}", render_panel(&result.views));

    let failures: Vec<_> = latest.failures().collect();
    if !failures.is_empty() {
        eprintln!("Failed loads:");
        for (category, error) in failures {
            eprintln!("- {category}: {error}");
        }
    }
    println!(
        "Signed out: {} layers removed, epoch {}",
        result.teardown.records, result.teardown.epoch
    );
}

/// The layer panel as an indented checkbox tree.
pub fn render_panel(views: &[CategoryView]) -> String {
    let mut out = String::new();
    for view in views {
        let _ = writeln!(
            out,
            "{} {} ({}/{})",
            checkbox(view.master),
            view.category.label(),
            view.attached_count,
            view.record_count
        );
        for entry in &view.entries {
            let _ = writeln!(
                out,
                "    {} {} {}",
                checkbox(entry.checked),
                entry.label,
                entry.color
            );
        }
    }
    out
}

fn checkbox(checked: bool) -> &'static str {
    if checked { "[x]" } else { "[ ]" }
}

fn outcome_cell(outcome: Option<&LoadOutcome>) -> Cell {
    match outcome {
        Some(LoadOutcome::Applied(_)) => Cell::new("loaded").fg(Color::Green),
        Some(LoadOutcome::Failed(_)) => Cell::new("failed")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        Some(other) => dim_cell(other.as_str()),
        None => dim_cell("-"),
    }
}

fn count_cell(count: usize, color: Color) -> Cell {
    if count > 0 {
        Cell::new(count).fg(color).add_attribute(Attribute::Bold)
    } else {
        dim_cell(count)
    }
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
