//! Output rendering for processed report blocks.
//!
//! Supports `human` (default) and `json` outputs. The JSON form serializes
//! the structured blocks (rows keep their span structure, so a downstream
//! renderer can still turn references into markup) plus a top-level summary.

use crate::models::{Cell, RenderedBlock, Span};
use crate::utils;
use owo_colors::OwoColorize;
use serde_json::json;
use serde_json::Value as JsonVal;

fn use_colors(output: &str) -> bool {
    output != "json" && utils::use_colors()
}

/// Print all processed blocks in the requested format.
pub fn print_blocks(blocks: &[RenderedBlock], output: &str) {
    match output {
        "json" => println!(
            "{}",
            serde_json::to_string_pretty(&compose_report_json(blocks)).unwrap()
        ),
        _ => {
            let color = use_colors(output);
            for block in blocks {
                print_block(block, color);
            }
        }
    }
}

fn print_block(block: &RenderedBlock, color: bool) {
    if color {
        println!("{}", block.title.bold());
    } else {
        println!("{}", block.title);
    }

    if let Some(table) = &block.table {
        let header = table.columns.join(" | ");
        println!("{}", header);
        println!("{}", "-".repeat(header.chars().count()));
        for row in &table.rows {
            let cells: Vec<String> = row.iter().map(|cell| flatten_cell(cell)).collect();
            println!("{}", cells.join(" | "));
        }
    }

    if let Some(slices) = &block.slices {
        for slice in slices {
            if color {
                println!("  {} {}", slice.label.bold(), slice.count);
            } else {
                println!("  {} {}", slice.label, slice.count);
            }
        }
    }

    let summary = format!("— {} defects —", block.total);
    if color {
        println!("{}", summary.bright_black());
    } else {
        println!("{}", summary);
    }
    println!();
}

/// Flatten a cell's spans into plain text for the human printer.
pub fn flatten_cell(cell: &Cell) -> String {
    let mut out = String::new();
    for span in cell {
        match span {
            Span::Text(text) => out.push_str(text),
            Span::Link { label, url } => {
                out.push_str(label);
                if label != url {
                    out.push_str(&format!(" <{}>", url));
                }
            }
            Span::ItemRef { id } => out.push_str(id),
        }
    }
    out
}

/// Compose the report JSON object (pure) for testing/snapshot purposes.
pub fn compose_report_json(blocks: &[RenderedBlock]) -> JsonVal {
    let items = serde_json::to_value(blocks).unwrap();
    let summary = json!({
        "blocks": blocks.len(),
        "defects": blocks.iter().map(|b| b.total).sum::<usize>(),
    });
    json!({"blocks": items, "summary": summary})
}
