//! CLI argument definitions for the fleet inventory renderer.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use colorchoice_clap::Color;
use fleet_model::{Field, ViewKind};
use fleet_table::{DerivedFilter, GroupDimension};

#[derive(Parser)]
#[command(
    name = "fleet",
    version,
    about = "Fleet inventory tables - filter, sort, group and page host inventories",
    long_about = "Render fleet inventory exports through the dashboard table engine.\n\n\
                  Column layouts are shared with the dashboard and persist per view."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for errors only).
    #[command(flatten)]
    pub verbosity: Verbosity<WarnLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,

    /// Settings file (default: platform config directory).
    #[arg(long = "config", value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Column layout directory (overrides the settings file).
    #[arg(long = "layout-dir", value_name = "DIR", global = true)]
    pub layout_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Render an inventory export as a table.
    Table(TableArgs),

    /// Show or edit the persisted column layout of a view.
    Columns(ColumnsArgs),

    /// List the table views.
    Views,
}

#[derive(Parser)]
pub struct TableArgs {
    /// JSON file holding an array of inventory items.
    #[arg(value_name = "INVENTORY")]
    pub inventory: PathBuf,

    /// Table view whose columns are used.
    #[arg(long = "view", default_value = "hosts")]
    pub view: ViewKind,

    /// Dashboard location whose navigation parameters seed the filters,
    /// e.g. `/hosts?filter=stale&os=Ubuntu`.
    #[arg(long = "location", value_name = "URL")]
    pub location: Option<String>,

    /// Free-text search over name, address and category.
    #[arg(long = "search", short = 's')]
    pub search: Option<String>,

    /// Derived filter (needs-updates, stale, up-to-date).
    #[arg(long = "filter")]
    pub filter: Option<DerivedFilter>,

    /// Field equality filter, repeatable (e.g. `--field os=Ubuntu`).
    #[arg(long = "field", value_name = "FIELD=VALUE", value_parser = parse_field_filter)]
    pub fields: Vec<(Field, String)>,

    /// Sort by a field or counter name.
    #[arg(long = "sort")]
    pub sort: Option<Field>,

    /// Sort descending.
    #[arg(long = "desc", requires = "sort")]
    pub desc: bool,

    /// Group rows by a dimension (group, status, os).
    #[arg(long = "group")]
    pub group: Option<GroupDimension>,

    /// Page to show, starting at 1.
    #[arg(long = "page", default_value_t = 1, value_parser = clap::value_parser!(u64).range(1..))]
    pub page: u64,

    /// Rows per page; 0 shows everything (default from settings).
    #[arg(long = "page-size")]
    pub page_size: Option<usize>,

    /// Output format.
    #[arg(long = "format", value_enum, default_value = "table")]
    pub format: OutputFormatArg,
}

#[derive(Parser)]
pub struct ColumnsArgs {
    /// Table view whose layout is shown.
    #[arg(long = "view", default_value = "hosts")]
    pub view: ViewKind,

    /// Toggle visibility of a column id, repeatable.
    #[arg(long = "toggle", value_name = "COLUMN")]
    pub toggle: Vec<String>,

    /// Move the column at FROM to TO (0-based display positions).
    #[arg(long = "move", num_args = 2, value_names = ["FROM", "TO"])]
    pub move_column: Option<Vec<usize>>,

    /// Restore the default layout.
    #[arg(long = "reset", conflicts_with_all = ["toggle", "move_column"])]
    pub reset: bool,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum OutputFormatArg {
    /// Boxed table for terminals.
    Table,
    /// Tab-separated rows for scripts.
    Tsv,
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}

fn parse_field_filter(raw: &str) -> Result<(Field, String), String> {
    let (field, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=VALUE, got `{raw}`"))?;
    let field = field.parse::<Field>().map_err(|error| error.to_string())?;
    Ok((field, value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_table_flags() {
        let cli = Cli::try_parse_from([
            "fleet",
            "table",
            "hosts.json",
            "--field",
            "os=Ubuntu 22.04",
            "--sort",
            "outdated",
            "--desc",
            "--group",
            "group",
            "--page",
            "2",
        ])
        .unwrap();
        let Command::Table(args) = cli.command else {
            panic!("expected table command");
        };
        assert_eq!(args.fields, [(Field::Os, "Ubuntu 22.04".to_string())]);
        assert_eq!(args.sort, Some(Field::counter("outdated")));
        assert!(args.desc);
        assert_eq!(args.group, Some(GroupDimension::Group));
        assert_eq!(args.page, 2);
    }

    #[test]
    fn rejects_malformed_field_filter() {
        assert!(parse_field_filter("os").is_err());
        assert!(parse_field_filter("Not A Field=x").is_err());
    }

    #[test]
    fn page_starts_at_one() {
        assert!(Cli::try_parse_from(["fleet", "table", "x.json", "--page", "0"]).is_err());
    }
}
