use std::sync::Arc;

use anyhow::{Context, Result};
use comfy_table::Table;
use fleet_cli::{TableRequest, inventory, render, render_inventory};
use fleet_dashboard::DashboardConfig;
use fleet_model::ViewKind;
use fleet_persistence::{ColumnLayoutManager, FileStore, KeyValueStore, LayoutOrigin};
use fleet_table::SortState;
use tracing::info_span;

use crate::cli::{Cli, ColumnsArgs, OutputFormatArg, TableArgs};

pub fn run_table(cli: &Cli, args: &TableArgs) -> Result<()> {
    let span = info_span!("table", view = %args.view);
    let _guard = span.enter();

    let items = inventory::load_inventory(&args.inventory)?;
    let mut config = load_config(cli);
    if let Some(page_size) = args.page_size {
        config.table.page_size = page_size;
    }
    let store = layout_store(&config);

    let request = TableRequest {
        location: args.location.clone(),
        search: args.search.clone(),
        filter: args.filter,
        fields: args.fields.clone(),
        sort: args.sort.clone().map(|field| {
            if args.desc {
                SortState::desc(field)
            } else {
                SortState::asc(field)
            }
        }),
        group: args.group,
        page: usize::try_from(args.page.saturating_sub(1)).unwrap_or(usize::MAX),
        ..TableRequest::new(args.view)
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("start async runtime")?;
    let rendered = runtime.block_on(render_inventory(config, store, items, &request))?;

    match args.format {
        OutputFormatArg::Table => {
            println!("{}", render::table(&rendered));
            println!("{}", render::footer(&rendered));
        }
        OutputFormatArg::Tsv => print!("{}", render::tsv(&rendered)),
    }
    Ok(())
}

pub fn run_columns(cli: &Cli, args: &ColumnsArgs) -> Result<()> {
    let config = load_config(cli);
    let mut layout = ColumnLayoutManager::load(args.view, layout_store(&config));
    match layout.origin() {
        LayoutOrigin::RecoveredCorrupt => eprintln!("note: stored layout was unreadable and was reset"),
        LayoutOrigin::MigratedLegacy => eprintln!("note: stored layout used old column ids and was reset"),
        LayoutOrigin::Defaults | LayoutOrigin::Restored => {}
    }

    if args.reset {
        layout.reset().context("reset column layout")?;
    }
    for id in &args.toggle {
        if !layout.toggle_visibility(id).context("save column layout")? {
            eprintln!("warning: {} has no column `{id}`", args.view.label());
        }
    }
    if let Some([from, to]) = args.move_column.as_deref()
        && !layout.reorder(*from, *to).context("save column layout")?
    {
        eprintln!("warning: cannot move column {from} to {to}");
    }

    println!("{} ({})", args.view.label(), layout.storage_key());
    println!("{}", render::layout_table(layout.get()));
    Ok(())
}

pub fn run_views() {
    let mut table = Table::new();
    table.set_header(vec!["View", "Name", "Layout key"]);
    render::apply_table_style(&mut table);
    for view in ViewKind::ALL {
        table.add_row(vec![
            view.as_str().to_string(),
            view.label().to_string(),
            view.column_config_key(),
        ]);
    }
    println!("{table}");
}

fn load_config(cli: &Cli) -> DashboardConfig {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = DashboardConfig::load_from(path);
            config.migrate();
            config
        }
        None => DashboardConfig::load(),
    };
    if let Some(dir) = &cli.layout_dir {
        config.storage.layout_dir = Some(dir.clone());
    }
    config
}

fn layout_store(config: &DashboardConfig) -> Arc<dyn KeyValueStore> {
    Arc::new(FileStore::new(config.layout_dir()))
}
