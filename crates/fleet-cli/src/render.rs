//! Terminal rendering of a [`RenderedTable`].

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use fleet_dashboard::RenderedTable;
use fleet_model::{ColumnDescriptor, Field};

/// Boxed table with one header row per bucket when the rows are grouped.
pub fn table(rendered: &RenderedTable) -> Table {
    let mut table = Table::new();
    table.set_header(rendered.columns.iter().map(|c| header_cell(&c.label)));
    apply_table_style(&mut table);
    for (index, column) in rendered.columns.iter().enumerate() {
        if is_numeric(column)
            && let Some(column) = table.column_mut(index)
        {
            column.set_cell_alignment(CellAlignment::Right);
        }
    }

    for bucket in &rendered.buckets {
        if rendered.grouped {
            let mut header = vec![bucket_cell(&bucket.label, bucket.total)];
            header.extend((1..rendered.columns.len()).map(|_| Cell::new("")));
            table.add_row(header);
        }
        for row in &bucket.rows {
            table.add_row(row.cells.iter().map(|text| value_cell(text)));
        }
    }
    table
}

/// Tab-separated header and rows. Bucket labels become a leading column when
/// the rows are grouped.
pub fn tsv(rendered: &RenderedTable) -> String {
    let grouped = rendered.grouped;
    let mut out = String::new();

    let mut header: Vec<&str> = rendered.columns.iter().map(|c| c.id.as_str()).collect();
    if grouped {
        header.insert(0, "bucket");
    }
    push_line(&mut out, header.iter().copied());

    for bucket in &rendered.buckets {
        for row in &bucket.rows {
            let cells = row.cells.iter().map(String::as_str);
            if grouped {
                push_line(&mut out, std::iter::once(bucket.label.as_str()).chain(cells));
            } else {
                push_line(&mut out, cells);
            }
        }
    }
    out
}

/// One-line page summary, e.g. `page 1 of 3, 120 rows`.
pub fn footer(rendered: &RenderedTable) -> String {
    let noun = if rendered.total_rows == 1 { "row" } else { "rows" };
    format!(
        "page {} of {}, {} {noun}",
        rendered.page + 1,
        rendered.page_count,
        rendered.total_rows
    )
}

/// Column layout as a table: position, id, label and visibility.
pub fn layout_table(columns: &[ColumnDescriptor]) -> Table {
    let mut ordered: Vec<&ColumnDescriptor> = columns.iter().collect();
    ordered.sort_by_key(|c| c.order);

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("#"),
        header_cell("Column"),
        header_cell("Label"),
        header_cell("Visible"),
    ]);
    apply_table_style(&mut table);
    if let Some(column) = table.column_mut(0) {
        column.set_cell_alignment(CellAlignment::Right);
    }
    for column in ordered {
        let visible = if column.visible {
            Cell::new("yes").fg(Color::Green)
        } else {
            dim_cell("no")
        };
        table.add_row(vec![
            Cell::new(column.order),
            Cell::new(&column.id),
            Cell::new(&column.label),
            visible,
        ]);
    }
    table
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
}

fn push_line<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>) {
    let line: Vec<String> = cells.map(escape_tsv).collect();
    out.push_str(&line.join("\t"));
    out.push('\n');
}

fn escape_tsv(cell: &str) -> String {
    cell.replace(['\t', '\n'], " ")
}

fn is_numeric(column: &ColumnDescriptor) -> bool {
    column
        .id
        .parse::<Field>()
        .is_ok_and(|field| field.is_numeric())
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn bucket_cell(label: &str, total: usize) -> Cell {
    Cell::new(format!("{label} ({total})"))
        .fg(Color::Blue)
        .add_attribute(Attribute::Bold)
}

fn value_cell(text: &str) -> Cell {
    if text.is_empty() {
        dim_cell("-")
    } else {
        Cell::new(text)
    }
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
