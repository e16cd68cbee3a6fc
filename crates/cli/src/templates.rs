// Template service commands

use std::path::Path;
use std::sync::Arc;

use gridext_config::PluginConfig;
use gridext_engine::{LoadedDocument, TemplateLoader};
use gridext_gateway::TemplateFilter;

use crate::book::{load_book, save_book};
use crate::data::print_json;
use crate::util::render_table;
use crate::{gateway, CliError};

pub fn cmd_list(
    config: &Arc<PluginConfig>,
    category: Option<String>,
    query: Option<String>,
    json: bool,
) -> Result<(), CliError> {
    let templates = gateway(config)?.try_list_templates(&TemplateFilter { category, query })?;

    if json {
        // Listing output omits the (possibly large) content blobs.
        let out: Vec<_> = templates
            .iter()
            .map(|t| {
                serde_json::json!({
                    "id": t.id,
                    "name": t.name,
                    "category": t.category,
                    "updated_at": t.updated_at.as_ref().or(t.created_at.as_ref()),
                })
            })
            .collect();
        return print_json(&out);
    }

    if templates.is_empty() {
        eprintln!("no templates");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = templates
        .into_iter()
        .map(|t| {
            let when = t.updated_at.or(t.created_at).unwrap_or_default();
            vec![t.id, t.name, t.category.unwrap_or_default(), when]
        })
        .collect();
    print!("{}", render_table(&rows));
    Ok(())
}

pub fn cmd_show(config: &Arc<PluginConfig>, id: &str) -> Result<(), CliError> {
    let template = gateway(config)?.try_get_template(id)?;
    print_json(&template)
}

pub fn cmd_load(config: &Arc<PluginConfig>, id: &str, book: &Path) -> Result<(), CliError> {
    let gw = gateway(config)?;
    let mut host = load_book(book)?;
    let loaded = TemplateLoader::new(config.locale.clone()).load_remote(&gw, id, &mut host)?;
    save_book(&host, book)?;
    print_loaded(&loaded, book);
    Ok(())
}

pub fn cmd_load_file(config: &Arc<PluginConfig>, file: &Path, book: &Path) -> Result<(), CliError> {
    let mut host = load_book(book)?;
    let loaded = TemplateLoader::new(config.locale.clone()).load_file(file, &mut host)?;
    save_book(&host, book)?;
    print_loaded(&loaded, book);
    Ok(())
}

pub fn cmd_save(
    config: &Arc<PluginConfig>,
    book: &Path,
    name: &str,
    category: Option<&str>,
) -> Result<(), CliError> {
    if !book.exists() {
        return Err(CliError::io(format!("{}: no such file", book.display())));
    }
    let gw = gateway(config)?;
    let host = load_book(book)?;
    let saved = TemplateLoader::new(config.locale.clone()).save_current(&gw, &host, name, category)?;
    println!("saved template '{}' ({})", saved.name, saved.id);
    Ok(())
}

pub fn cmd_delete(config: &Arc<PluginConfig>, id: &str) -> Result<(), CliError> {
    gateway(config)?.try_delete_template(id)?;
    println!("deleted template {}", id);
    Ok(())
}

fn print_loaded(loaded: &LoadedDocument, book: &Path) {
    println!(
        "loaded '{}' into {} ({} sheet(s))",
        loaded.name,
        book.display(),
        loaded.sheet_count
    );
}
