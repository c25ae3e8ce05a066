use anyhow::{bail, Context};
use bytes::Bytes;
use serde_json::json;
use tracing::info;

use taskboard::{
    archive,
    blob_store::{self, BlobStore},
    config::{BlobBackend, Config},
    deadline::deadline_info,
    load_or_init_state,
    storage::models::{new_blob_id, AppState, ZoneItem},
    Store,
};

use crate::cli::*;

pub async fn run_command(
    cli: Cli,
    config: &Config,
    store: &Store,
    blobs: &dyn BlobStore,
) -> anyhow::Result<()> {
    match cli.command {
        Command::Init => cmd_init(store).await,
        Command::Show => cmd_show(store, &cli.format).await,
        Command::Deadlines => cmd_deadlines(store, &cli.format).await,
        Command::Export(args) => cmd_export(store, blobs, args).await,
        Command::Import(args) => cmd_import(store, blobs, args).await,
        Command::Attach(args) => cmd_attach(config, store, blobs, args).await,
        Command::Prune => cmd_prune(store, blobs).await,
        Command::Reset(args) => cmd_reset(config, store, args).await,
    }
}

async fn saved_state(store: &Store) -> anyhow::Result<AppState> {
    match store.load_state().await? {
        Some(state) => Ok(state),
        None => bail!("No saved board; run `taskboard init` first"),
    }
}

async fn cmd_init(store: &Store) -> anyhow::Result<()> {
    let state = load_or_init_state(store).await?;
    println!(
        "Board \"{}\" ready: {} zones, {} task types",
        state.title,
        state.zones.len(),
        state.task_types.len()
    );
    Ok(())
}

async fn cmd_show(store: &Store, format: &OutputFormat) -> anyhow::Result<()> {
    let state = saved_state(store).await?;

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&state)?);
        return Ok(());
    }

    println!("{}", state.title);
    for zone in state.sorted_zones() {
        println!(
            "\n[{}] {} ({:?}, {} items)",
            zone.color,
            zone.name,
            zone.collapse_state,
            zone.items.len()
        );
        for item in zone.sorted_items() {
            match item {
                ZoneItem::Card(card) => {
                    let image = if card.image_blob_id.is_some() { " [image]" } else { "" };
                    println!("  - {}{}", card.text, image);
                }
                ZoneItem::Divider(divider) => println!("  ── {} ──", divider.text),
            }
        }
    }
    Ok(())
}

async fn cmd_deadlines(store: &Store, format: &OutputFormat) -> anyhow::Result<()> {
    let state = saved_state(store).await?;

    let mut rows = Vec::new();
    for zone in state.sorted_zones() {
        for item in zone.sorted_items() {
            let Some(card) = item.as_card() else { continue };
            let Some(deadline) = &card.deadline else { continue };
            rows.push((zone.name.as_str(), card, deadline_info(deadline)));
        }
    }

    match format {
        OutputFormat::Json => {
            let out: Vec<serde_json::Value> = rows
                .iter()
                .map(|(zone, card, info)| {
                    json!({
                        "zone": zone,
                        "cardId": card.id,
                        "text": card.text,
                        "deadline": info,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            for (zone, card, info) in &rows {
                println!("{:>8}  {}  {} / {}", info.display, info.tooltip, zone, card.text);
            }
        }
    }
    Ok(())
}

async fn cmd_export(store: &Store, blobs: &dyn BlobStore, args: ExportArgs) -> anyhow::Result<()> {
    let state = saved_state(store).await?;
    archive::export_archive_to_file(&state, blobs, &args.path)
        .await
        .with_context(|| format!("exporting to {}", args.path.display()))?;
    println!("Exported board to {}", args.path.display());
    Ok(())
}

async fn cmd_import(store: &Store, blobs: &dyn BlobStore, args: ImportArgs) -> anyhow::Result<()> {
    let state = archive::import_archive_from_file(&args.path, blobs)
        .await
        .with_context(|| format!("importing {}", args.path.display()))?;
    store.save_state(&state).await?;
    println!(
        "Imported board \"{}\" with {} zones",
        state.title,
        state.zones.len()
    );
    Ok(())
}

async fn cmd_attach(
    config: &Config,
    store: &Store,
    blobs: &dyn BlobStore,
    args: AttachArgs,
) -> anyhow::Result<()> {
    let data = tokio::fs::read(&args.image)
        .await
        .with_context(|| format!("reading {}", args.image.display()))?;
    if data.len() as u64 > config.max_image_size {
        bail!(
            "Image exceeds maximum size of {} bytes",
            config.max_image_size
        );
    }

    let mut state = saved_state(store).await?;
    let blob_id = new_blob_id();
    let Some(previous) = state.set_card_image(&args.card_id, Some(blob_id.clone())) else {
        bail!("No card with id {}", args.card_id);
    };

    blobs.put(&blob_id, Bytes::from(data)).await?;
    store.save_state(&state).await?;

    if let Some(previous) = previous {
        if !state.is_blob_referenced(&previous) {
            blobs.delete(&previous).await?;
            info!(blob_id = %previous, "Deleted replaced image");
        }
    }

    println!("Attached image {} to card {}", blob_id, args.card_id);
    Ok(())
}

async fn cmd_prune(store: &Store, blobs: &dyn BlobStore) -> anyhow::Result<()> {
    let state = saved_state(store).await?;
    let removed = blob_store::prune_orphaned_blobs(&state, blobs).await?;
    println!("Removed {removed} unreferenced images");
    Ok(())
}

async fn cmd_reset(config: &Config, store: &Store, args: ResetArgs) -> anyhow::Result<()> {
    if !args.yes {
        bail!("Refusing to delete the saved board without --yes");
    }

    let stats = store.reset().await?;
    println!(
        "Deleted {} saved boards and {} images",
        stats.states, stats.images
    );
    if config.blobs.backend == BlobBackend::Local {
        println!(
            "Images in {} were left in place; run `taskboard prune` after `taskboard init` to remove them",
            config.blobs.local_path
        );
    }
    Ok(())
}
