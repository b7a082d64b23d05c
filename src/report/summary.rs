//! Console summary of a pipeline run

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, CellAlignment, Color, Table};
use console::style;

use crate::pipeline::RunOutcome;

use super::metrics::ClassificationReport;

/// Print a table indented to line up with the step output
fn print_indented(table: &Table) {
    for line in table.to_string().lines() {
        println!("    {}", line);
    }
}

fn section_header(icon: &str, title: &str) {
    println!();
    println!("    {} {}", style(icon).cyan(), style(title).white().bold());
    println!("    {}", style("─".repeat(50)).dim());
    println!();
}

fn score_color(score: f64) -> Color {
    if score >= 0.9 {
        Color::Green
    } else if score >= 0.7 {
        Color::Yellow
    } else {
        Color::Red
    }
}

/// Display the run overview: shapes, model and timings
pub fn display_run_summary(outcome: &RunOutcome) {
    section_header("📋", "RUN SUMMARY");

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec![
        Cell::new("Metric").add_attribute(Attribute::Bold),
        Cell::new("Value").add_attribute(Attribute::Bold),
    ]);

    table.add_row(vec![Cell::new("📁 Rows Loaded"), Cell::new(outcome.rows_loaded)]);
    table.add_row(vec![
        Cell::new("🏋️  Train Shape"),
        Cell::new(format!("{} x {}", outcome.train_shape.0, outcome.train_shape.1)),
    ]);
    table.add_row(vec![
        Cell::new("🧪 Test Shape"),
        Cell::new(format!("{} x {}", outcome.test_shape.0, outcome.test_shape.1)).fg(
            if outcome.test_shape.0 == 0 {
                Color::Red
            } else {
                Color::White
            },
        ),
    ]);
    table.add_row(vec![Cell::new("🧠 Model"), Cell::new(&outcome.model)]);
    table.add_row(vec![
        Cell::new("🏷️  Classes"),
        Cell::new(outcome.classes.join(", ")),
    ]);
    table.add_row(vec![
        Cell::new("✅ Accuracy"),
        Cell::new(format!("{:.4}", outcome.metrics.accuracy))
            .fg(score_color(outcome.metrics.accuracy))
            .add_attribute(Attribute::Bold),
    ]);
    table.add_row(vec![
        Cell::new("⏱️  Total Time"),
        Cell::new(format!("{:.3}s", outcome.timings.total().as_secs_f64())),
    ]);

    print_indented(&table);
}

/// Display per-class precision/recall/F1 with macro and weighted averages
pub fn display_classification_report(report: &ClassificationReport) {
    section_header("📈", "CLASSIFICATION REPORT");

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(
        ["Class", "Precision", "Recall", "F1", "Support"]
            .iter()
            .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
    );

    let num = |v: f64| Cell::new(format!("{:.4}", v)).set_alignment(CellAlignment::Right);

    for m in &report.per_class {
        table.add_row(vec![
            Cell::new(&m.label),
            num(m.precision),
            num(m.recall),
            num(m.f1).fg(score_color(m.f1)),
            Cell::new(m.support).set_alignment(CellAlignment::Right),
        ]);
    }

    for (name, avg) in [("macro avg", report.macro_avg), ("weighted avg", report.weighted_avg)] {
        table.add_row(vec![
            Cell::new(name).add_attribute(Attribute::Italic),
            num(avg.precision),
            num(avg.recall),
            num(avg.f1),
            Cell::new(report.total).set_alignment(CellAlignment::Right),
        ]);
    }

    print_indented(&table);
}

/// Display the confusion matrix, rows = true class, columns = predicted
pub fn display_confusion_matrix(report: &ClassificationReport) {
    section_header("🔢", "CONFUSION MATRIX");

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);

    let mut header = vec![Cell::new("true \\ pred").add_attribute(Attribute::Dim)];
    header.extend(
        report
            .per_class
            .iter()
            .map(|m| Cell::new(&m.label).add_attribute(Attribute::Bold)),
    );
    table.set_header(header);

    for (i, row) in report.confusion.iter().enumerate() {
        let mut cells = vec![Cell::new(&report.per_class[i].label).add_attribute(Attribute::Bold)];
        cells.extend(row.iter().enumerate().map(|(j, &count)| {
            let cell = Cell::new(count).set_alignment(CellAlignment::Right);
            match (i == j, count) {
                (true, _) => cell.fg(Color::Green),
                (false, 0) => cell.fg(Color::DarkGrey),
                (false, _) => cell.fg(Color::Red),
            }
        }));
        table.add_row(cells);
    }

    print_indented(&table);
}
