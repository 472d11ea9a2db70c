//! List the image source catalog.

use sunlapse_frame_model::catalog::SourceCatalog;

pub fn run(json: bool) -> anyhow::Result<()> {
    let catalog = SourceCatalog::builtin();

    if json {
        println!("{}", serde_json::to_string_pretty(catalog.entries())?);
        return Ok(());
    }

    let default = catalog.default_source().name;
    let width = catalog.names().map(str::len).max().unwrap_or(0);

    println!("Available image sources ({}):", catalog.len());
    for entry in catalog.entries() {
        let marker = if entry.name == default { "*" } else { " " };
        println!("{marker} {:width$}  {}", entry.name, entry.url);
    }
    println!();
    println!("* default source");
    Ok(())
}
