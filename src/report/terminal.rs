use std::path::Path;

use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use super::json::{ConsumerReport, ReleaseReport, Series};

/// Print the most recent download window (the last index entry).
pub fn render_consumer(report: &ConsumerReport, output: &Path) {
    print_header("consumer", output);
    let Some(latest) = report.index.len().checked_sub(1) else {
        println!(" {} No download window in range\n", "[WARN]".yellow().bold());
        return;
    };
    println!(" Window ending {}\n", report.index[latest].bold());

    render_series("Python version", &report.python_version, latest);
    render_series("glibc version", &report.glibc_version, latest);
    render_series("At least policy", &report.policy_at_least, latest);
}

/// Print the most recent release snapshot (the first index entry).
pub fn render_release(report: &ReleaseReport, output: &Path) {
    print_header("release", output);
    let Some(latest) = report.index.first() else {
        println!(" {} No release snapshot in range\n", "[WARN]".yellow().bold());
        return;
    };
    println!(
        " Snapshot {}  ({} packages in range)\n",
        latest.bold(),
        report.package_count
    );

    render_series("Highest policy", &report.highest_policy, 0);
    render_series("Lowest policy", &report.lowest_policy, 0);
    render_series("Architecture", &report.architecture, 0);
    render_series("Implementation", &report.implementation, 0);
}

fn print_header(kind: &str, output: &Path) {
    println!(
        "\n {} v{} ({})",
        "manylinux-timeline".bold(),
        env!("CARGO_PKG_VERSION"),
        kind
    );
    println!(" Wrote: {}\n", output.display());
}

fn render_series(title: &str, series: &Series, position: usize) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new(title).add_attribute(Attribute::Bold),
            Cell::new("Share").add_attribute(Attribute::Bold),
        ]);

    for key in &series.keys {
        let value = series
            .get(key)
            .and_then(|values| values.get(position))
            .copied()
            .unwrap_or(0.0);
        table.add_row(vec![
            Cell::new(key),
            Cell::new(format!("{:.2}%", value))
                .fg(share_color(value))
                .set_alignment(CellAlignment::Right),
        ]);
    }

    println!("{}\n", table);
}

fn share_color(value: f64) -> Color {
    match value {
        v if v >= 50.0 => Color::Green,
        v if v >= 10.0 => Color::Yellow,
        v if v > 0.0 => Color::White,
        _ => Color::DarkGrey,
    }
}
