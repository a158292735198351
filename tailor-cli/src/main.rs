mod cli;
mod prompts;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::Path;

use tailor_core::{
    determine_data_path, export_records, format_card, format_summary_line, get_settings_path,
    ExportFormat, FileStorage, FormController, MeasurementField, RecordStore, SaveError,
    SaveOutcome, Session, Settings,
};
use tailor_offline::{AssetRequest, CacheStorage, HttpNetwork, OfflineCache};

use crate::cli::{AssetsCommand, Cli, Command, ConfigCommand, RecordArgs};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    let settings = Settings::load_default()?;

    // Determine which storage file to use
    let data_path = determine_data_path(cli.data.as_deref(), &settings);
    log::debug!("Using storage file {}", data_path.display());

    match &cli.command {
        Command::Add {
            record,
            interactive,
        } => {
            let mut session = open_session(&data_path, &settings)?;
            // Default to interactive mode if no field is given
            if *interactive || record.is_empty() {
                prompts::prompt_form(&mut session.form)?;
            } else {
                apply_record_args(&mut session.form, record)?;
            }
            save_form(&mut session)?;
        }
        Command::List { search } => {
            let mut session = open_session(&data_path, &settings)?;
            if let Some(query) = search {
                session.set_query(query);
            }
            list_cards(&session);
        }
        Command::Show { index } => {
            let session = open_session(&data_path, &settings)?;
            let card = session
                .cards()
                .cards
                .get(*index)
                .with_context(|| format!("No client at position {}", index))?;
            print!("{}", format_card(card));
        }
        Command::Edit {
            index,
            record,
            interactive,
        } => {
            let mut session = open_session(&data_path, &settings)?;
            session.start_edit(*index)?;
            println!(
                "Editing {}",
                session.form.get("name").unwrap_or_default().cyan()
            );
            if *interactive || record.is_empty() {
                prompts::prompt_form(&mut session.form)?;
            } else {
                apply_record_args(&mut session.form, record)?;
            }
            save_form(&mut session)?;
        }
        Command::Delete { index, yes } => {
            delete_record(&data_path, &settings, *index, *yes)?;
        }
        Command::Search { query } => {
            let mut session = open_session(&data_path, &settings)?;
            session.set_query(query);
            list_cards(&session);
        }
        Command::Export { format, output } => {
            handle_export_command(&data_path, format, output.as_deref())?;
        }
        Command::Reset { yes } => {
            let store = RecordStore::new(FileStorage::new(&data_path));
            let count = store.len()?;
            if !*yes
                && !prompts::confirm(&format!("Delete all {} record(s)?", count))?
            {
                println!("{}", "Reset cancelled.".yellow());
                return Ok(());
            }
            store.clear()?;
            println!("{}", format!("Removed {} record(s).", count).green());
        }
        Command::Assets(assets_cmd) => {
            handle_assets_command(assets_cmd, &settings)?;
        }
        Command::Config(config_cmd) => {
            handle_config_command(config_cmd, settings, &data_path)?;
        }
    }

    Ok(())
}

fn open_session(data_path: &Path, settings: &Settings) -> Result<Session<FileStorage>> {
    let store = RecordStore::new(FileStorage::new(data_path));
    let form = FormController::new().with_clear_on_edit(settings.clear_form_on_edit);
    Session::open(store, form)
}

/// Copies command line field values into the form
fn apply_record_args(form: &mut FormController, args: &RecordArgs) -> Result<()> {
    if let Some(name) = &args.name {
        form.set("name", name.as_str());
    }
    if let Some(phone) = &args.phone {
        form.set("phone", phone.as_str());
    }
    if let Some(comments) = &args.comments {
        form.set("comments", comments.as_str());
    }
    for pair in &args.measurements {
        let (key, value) = parse_measurement(pair)?;
        form.set(key.key(), value);
    }
    Ok(())
}

/// Parses `key=value`, accepting either the stored key or the label
fn parse_measurement(pair: &str) -> Result<(MeasurementField, String)> {
    let (key, value) = pair
        .split_once('=')
        .with_context(|| format!("Expected KEY=VALUE, got '{}'", pair))?;
    let key = key.trim();

    let field = MeasurementField::from_key(key)
        .or_else(|| {
            MeasurementField::ALL
                .iter()
                .copied()
                .find(|f| f.label().eq_ignore_ascii_case(key))
        })
        .with_context(|| {
            let known: Vec<_> = MeasurementField::ALL.iter().map(|f| f.key()).collect();
            format!("Unknown measurement '{}'. Known: {}", key, known.join(", "))
        })?;

    Ok((field, value.trim().to_string()))
}

fn save_form(session: &mut Session<FileStorage>) -> Result<()> {
    match session.save() {
        Ok(SaveOutcome::Created(record)) => {
            println!("{}", "Measurements saved successfully!".green());
            println!("Client: {} ({})", record.name, record.timestamp);
            Ok(())
        }
        Ok(SaveOutcome::Updated(record)) => {
            println!("{}", "Measurements updated successfully!".green());
            println!("Client: {} ({})", record.name, record.timestamp);
            Ok(())
        }
        Err(SaveError::Validation(e)) => anyhow::bail!("{}", e.to_string().red()),
        Err(SaveError::Storage(e)) => Err(e),
    }
}

fn list_cards(session: &Session<FileStorage>) {
    let cards = session.cards();
    if cards.is_empty() {
        println!("{}", "No measurements recorded.".yellow());
        return;
    }

    let mut shown = 0;
    for card in cards.visible() {
        let line = format_summary_line(card);
        if shown == 0 && !session.query().is_empty() {
            println!("{}", line.bold());
        } else {
            println!("{}", line);
        }
        shown += 1;
    }

    if shown == 0 {
        println!(
            "{}",
            format!("No client name matches '{}'.", session.query()).yellow()
        );
    } else if shown < cards.len() {
        println!(
            "{}",
            format!("{} of {} client(s) shown", shown, cards.len()).dimmed()
        );
    }
}

fn delete_record(data_path: &Path, settings: &Settings, index: usize, skip_confirm: bool) -> Result<()> {
    let mut session = open_session(data_path, settings)?;
    let card = session
        .cards()
        .cards
        .get(index)
        .with_context(|| format!("No client at position {}", index))?;

    println!("{}", "Record to delete:".yellow());
    println!("  {}", format_summary_line(card));

    // Confirm deletion unless --yes flag is used
    if !skip_confirm && !prompts::confirm("Are you sure you want to delete this record?")? {
        println!("{}", "Deletion cancelled.".yellow());
        return Ok(());
    }

    let removed = session.delete(index)?;
    println!("{}", format!("Deleted {}.", removed.name).green());
    Ok(())
}

fn handle_export_command(data_path: &Path, format: &str, output: Option<&Path>) -> Result<()> {
    let format: ExportFormat = format.parse()?;
    let records = RecordStore::new(FileStorage::new(data_path)).load_all()?;

    match output {
        Some(path) => {
            tailor_core::export_to_file(&records, format, path)?;
            println!(
                "Exported {} record(s) to {}",
                records.len(),
                path.display().to_string().green()
            );
        }
        None => print!("{}", export_records(&records, format)?),
    }
    Ok(())
}

fn handle_assets_command(cmd: &AssetsCommand, settings: &Settings) -> Result<()> {
    let storage = CacheStorage::new(&settings.cache_dir);
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;

    runtime.block_on(async {
        match cmd {
            AssetsCommand::Install => {
                let cache = offline_cache(storage, settings)?;
                let count = cache.install_shell().await?;
                println!(
                    "{}",
                    format!("Cached {} asset(s) in bucket {}", count, cache.bucket_name()).green()
                );
            }
            AssetsCommand::Fetch { path, output } => {
                let cache = offline_cache(storage, settings)?;
                let (response, source) = cache.fetch(&AssetRequest::new(path)).await?;
                println!(
                    "{} {} ({} bytes, from {})",
                    response.status,
                    path,
                    response.body.len(),
                    source.to_string().cyan()
                );
                if let Some(output) = output {
                    std::fs::write(output, &response.body)
                        .with_context(|| format!("Failed to write {:?}", output))?;
                }
            }
            AssetsCommand::List => {
                let names = storage.bucket_names().await?;
                if names.is_empty() {
                    println!("{}", "No cache buckets.".yellow());
                }
                for name in names {
                    let active = name == settings.cache_bucket;
                    if active {
                        println!("{} {}", name.green(), "(active)".dimmed());
                        for path in storage.open(&name).await?.paths().await? {
                            println!("  {}", path);
                        }
                    } else {
                        println!("{}", name);
                    }
                }
            }
            AssetsCommand::Delete { name } => {
                let name = name.as_deref().unwrap_or(&settings.cache_bucket);
                if storage.delete(name).await? {
                    println!("{}", format!("Deleted bucket {}", name).green());
                } else {
                    println!("{}", format!("No bucket named {}", name).yellow());
                }
            }
        }
        Ok::<(), anyhow::Error>(())
    })
}

fn offline_cache(storage: CacheStorage, settings: &Settings) -> Result<OfflineCache<HttpNetwork>> {
    let origin = settings
        .asset_origin
        .as_deref()
        .context("No asset origin configured. Use `tailor config set-origin <url>`.")?;
    let network = HttpNetwork::new(origin)?;
    Ok(OfflineCache::new(storage, &settings.cache_bucket, network))
}

fn handle_config_command(cmd: &ConfigCommand, mut settings: Settings, data_path: &Path) -> Result<()> {
    let settings_path = get_settings_path()?;

    match cmd {
        ConfigCommand::Show => {
            println!("{}: {}", "Settings file".blue(), settings_path.display());
            println!("{}: {}", "Storage file".blue(), data_path.display());
            println!(
                "{}: {}",
                "Asset origin".blue(),
                settings.asset_origin.as_deref().unwrap_or("-")
            );
            println!("{}: {}", "Cache directory".blue(), settings.cache_dir.display());
            println!("{}: {}", "Cache bucket".blue(), settings.cache_bucket);
            println!(
                "{}: {}",
                "Clear form on edit".blue(),
                settings.clear_form_on_edit
            );
            return Ok(());
        }
        ConfigCommand::SetDataPath { path } => settings.data_path = path.clone(),
        ConfigCommand::SetOrigin { url } => settings.asset_origin = Some(url.clone()),
        ConfigCommand::SetBucket { name } => settings.cache_bucket = name.clone(),
        ConfigCommand::ClearFormOnEdit { enabled } => settings.clear_form_on_edit = *enabled,
    }

    settings.save(&settings_path)?;
    println!(
        "{}",
        format!("Settings saved to {}", settings_path.display()).green()
    );
    Ok(())
}
