// Dropdown sources, import and navigation commands

use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;

use gridext_config::{ExpansionConfig, PluginConfig};
use gridext_core::GridBounds;
use gridext_engine::{
    AutoExpansionController, HostGridFacade, InsertFlow, InsertMode, MemoryHost, SystemClock,
};
use serde_json::json;

use crate::book::{load_book, parse_range, save_book};
use crate::util::{cell_name, render_table};
use crate::{gateway, CliError};

pub fn cmd_sources(config: &Arc<PluginConfig>, remote: bool, json: bool) -> Result<(), CliError> {
    let rows: Vec<(String, String, String)> = if remote {
        gateway(config)?
            .try_discover_sources()?
            .into_iter()
            .map(|s| (s.id, s.name, s.count.map(|c| c.to_string()).unwrap_or_default()))
            .collect()
    } else {
        config
            .dropdown_sources
            .iter()
            .map(|s| (s.id.clone(), s.name.clone(), s.endpoint.clone()))
            .collect()
    };

    if json {
        let third = if remote { "count" } else { "endpoint" };
        let out: Vec<_> = rows
            .iter()
            .map(|(id, name, extra)| json!({ "id": id, "name": name, third: extra }))
            .collect();
        print_json(&out)?;
        return Ok(());
    }

    if rows.is_empty() {
        eprintln!("no dropdown sources");
        return Ok(());
    }
    let table: Vec<Vec<String>> = rows.into_iter().map(|(a, b, c)| vec![a, b, c]).collect();
    print!("{}", render_table(&table));
    Ok(())
}

pub fn cmd_fetch(
    config: &Arc<PluginConfig>,
    source: &str,
    search: Option<String>,
    field: Option<String>,
) -> Result<(), CliError> {
    let gw = gateway(config)?;
    let items = match search {
        Some(query) => gw.try_search_dropdown(source, &query, field.as_deref())?,
        None => gw.try_fetch_dropdown(source)?,
    };
    print_json(&items)
}

pub fn cmd_import(
    config: &Arc<PluginConfig>,
    source: &str,
    book: &Path,
    fields: &[String],
    mode: InsertMode,
    at: Option<&str>,
    dry_run: bool,
) -> Result<(), CliError> {
    let gw = gateway(config)?;
    let mut host = load_book(book)?;
    if let Some(at) = at {
        host.select(parse_range(at)?);
    }

    let mut flow = InsertFlow::new(source);
    flow.accept_items(gw.try_fetch_dropdown(source)?)?;
    if flow.items().is_empty() {
        eprintln!("source '{}' returned no items, nothing to insert", source);
        return Ok(());
    }
    if !fields.is_empty() {
        flow.select_fields(fields)?;
    }
    flow.choose_mode(mode)?;

    if dry_run {
        print!("{}", render_table(&flow.preview()));
        return Ok(());
    }

    let mut controller = start_controller(&config.expansion, &mut host);
    let before = active_bounds(&host);
    let outcome = flow.confirm(&mut host)?;
    let report = controller.pump(&mut host);
    controller.dispose();
    save_book(&host, book)?;

    match outcome {
        Some(outcome) => {
            let range = outcome.range;
            println!(
                "inserted {} cell(s) at {}:{}",
                outcome.cells_written,
                cell_name(range.start_row, range.start_col),
                cell_name(range.end_row, range.end_col)
            );
        }
        None => eprintln!("book has no active sheet, nothing inserted"),
    }
    print_growth(before, active_bounds(&host), report.expansions);
    Ok(())
}

pub fn cmd_select(config: &Arc<PluginConfig>, range: &str, book: &Path) -> Result<(), CliError> {
    let range = parse_range(range)?;
    let mut host = load_book(book)?;

    let mut controller = start_controller(&config.expansion, &mut host);
    let before = active_bounds(&host);
    host.select(range);
    let report = controller.pump(&mut host);
    controller.dispose();
    save_book(&host, book)?;

    println!("selected {}", cell_name(range.start_row, range.start_col));
    print_growth(before, active_bounds(&host), report.expansions);
    Ok(())
}

pub fn cmd_health(config: &Arc<PluginConfig>) -> Result<(), CliError> {
    let status = gateway(config)?.try_health()?;
    match status.get("status").and_then(|s| s.as_str()) {
        Some(s) => println!("{}: {}", config.api_base_url, s),
        None => println!("{}: ok", config.api_base_url),
    }
    Ok(())
}

/// Controller for a headless run. There is no viewport, so scroll
/// expansion stays off.
fn start_controller(expansion: &ExpansionConfig, host: &mut MemoryHost) -> AutoExpansionController {
    let mut expansion = expansion.clone();
    expansion.enable_scroll_expansion = false;
    let mut controller = AutoExpansionController::new(expansion, Rc::new(SystemClock));
    controller.start(host);
    controller
}

fn active_bounds(host: &MemoryHost) -> Option<GridBounds> {
    host.active_sheet().and_then(|sheet| host.bounds(&sheet))
}

fn print_growth(before: Option<GridBounds>, after: Option<GridBounds>, expansions: usize) {
    let (Some(before), Some(after)) = (before, after) else { return };
    if before != after {
        println!(
            "sheet grew from {}x{} to {}x{} ({} expansion(s))",
            before.row_count, before.column_count, after.row_count, after.column_count, expansions
        );
    }
}

pub(crate) fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), CliError> {
    let text = serde_json::to_string_pretty(value).map_err(|e| CliError::new(crate::exit_codes::EXIT_ERROR, e.to_string()))?;
    println!("{}", text);
    Ok(())
}
