use crate::cli::{DbkitArgs, DbkitCommands, IdentifierCase, IdentifierFormat, OutputStoreArgs, StoreArgs};
use crate::error::Result;
use itertools::Itertools;
use springpp::core::store::{ContentStore, StorePaths};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

pub fn run(args: DbkitArgs) -> Result<()> {
    match args.command {
        DbkitCommands::Extract {
            list,
            input,
            output,
        } => handle_extract(&list, &input, &output),
        DbkitCommands::Merge {
            first,
            second_index,
            second_database,
            output,
        } => handle_merge(&first, StorePaths::new(second_index, second_database), &output),
        DbkitCommands::Append {
            list,
            path,
            store,
            format,
        } => handle_append(&list, &path, &store, &format),
    }
}

fn store_paths(args: &StoreArgs) -> StorePaths {
    StorePaths::new(&args.index, &args.database)
}

fn output_paths(args: &OutputStoreArgs) -> StorePaths {
    StorePaths::new(&args.output_index, &args.output_database)
}

fn handle_extract(list: &Path, input: &StoreArgs, output: &OutputStoreArgs) -> Result<()> {
    let entries = read_list(list)?;
    println!("Detected {} entries.", entries.len());
    let store = ContentStore::open(store_paths(input))?;
    let copied = store.extract(entries.iter().map(String::as_str), &output_paths(output))?;
    println!("✓ Extracted {} entries.", copied);
    Ok(())
}

fn handle_merge(first: &StoreArgs, second: StorePaths, output: &OutputStoreArgs) -> Result<()> {
    let added = ContentStore::merge(&store_paths(first), &second, &output_paths(output))?;
    println!("✓ Added {} entries.", added);
    Ok(())
}

fn handle_append(list: &Path, directory: &Path, store: &StoreArgs, format: &IdentifierFormat) -> Result<()> {
    let identifiers: Vec<String> = read_list(list)?
        .iter()
        .map(|entry| format_identifier(entry, format))
        .sorted()
        .dedup()
        .collect();
    println!("Found {} entries.", identifiers.len());

    let paths = store_paths(store);
    let mut appended = 0;
    for identifier in &identifiers {
        info!(identifier = %identifier, "Loading entry");
        let source = directory.join(identifier);
        if ContentStore::append(identifier, &source, &paths)? {
            appended += 1;
        } else {
            warn!(path = %source.display(), "Content not found or empty");
        }
    }
    println!("✓ Appended {} of {} entries.", appended, identifiers.len());
    Ok(())
}

/// First column of every non-blank line.
fn read_list(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)?;
    Ok(content
        .lines()
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_string)
        .collect())
}

/// Applies truncation, case, extension and prefix, in that order.
fn format_identifier(entry: &str, format: &IdentifierFormat) -> String {
    let mut identifier: String = if format.id_length > 0 {
        entry.chars().take(format.id_length).collect()
    } else {
        entry.to_string()
    };
    match format.id_case {
        Some(IdentifierCase::Lower) => identifier = identifier.to_lowercase(),
        Some(IdentifierCase::Upper) => identifier = identifier.to_uppercase(),
        None => {}
    }
    if let Some(extension) = &format.id_extension {
        identifier.push_str(extension);
    }
    match &format.id_prefix {
        Some(prefix) => format!("{}{}", prefix, identifier),
        None => identifier,
    }
}
