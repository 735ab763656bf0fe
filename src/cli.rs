use std::sync::Arc;
use std::time::UNIX_EPOCH;

use anyhow::{bail, Context, Result};
use tokio::io::AsyncReadExt;

use crate::config::{AssetCommand, Command, Config};
use crate::document::format_size;
use crate::notify::LogNotifier;
use crate::session::{SaveOutcome, Session};
use crate::storage::{FileInfo, FsStorage, Storage};

/// Run one command against the configured storage root
pub async fn run(command: Command, config: Config) -> Result<()> {
    let storage = Arc::new(FsStorage::new(&config.root));
    log::debug!("Using storage root {:?}", config.root);

    let options = config.session_options()?;
    let highlighter = options.highlighter.clone();
    let session = Session::new(storage.clone(), Arc::new(LogNotifier), options);

    match command {
        Command::List { json } => {
            session.refresh_files().await?;
            let files = session.files();
            if json {
                println!("{}", serde_json::to_string_pretty(&files)?);
            } else {
                print_listing(&files);
            }
        }
        Command::Highlight { path, language } => {
            session.select(&path).await?;
            let markup = match language {
                Some(language) => highlighter.highlight(&session.raw_text(), language),
                None => session.highlighted(),
            };
            println!("{}", markup);
        }
        Command::New { path, template } => {
            let created = session.create(&path, template).await?;
            println!("{}", created);
        }
        Command::Write { path } => {
            let mut content = String::new();
            tokio::io::stdin()
                .read_to_string(&mut content)
                .await
                .context("failed to read stdin")?;

            session.select(&path).await?;
            session.edit(content);
            match session.save().await? {
                SaveOutcome::Saved => println!("saved {}", path),
                SaveOutcome::Rejected(reason) => println!("not saved: {:?}", reason),
            }
            session.close();
        }
        Command::Rm { path } => {
            if !session.delete(Some(&path)).await? {
                bail!("nothing to delete");
            }
        }
        Command::Assets(command) => run_assets(storage.as_ref(), command).await?,
    }

    Ok(())
}

async fn run_assets(storage: &dyn Storage, command: AssetCommand) -> Result<()> {
    match command {
        AssetCommand::List => print_listing(&storage.list_assets().await?),
        AssetCommand::Upload { file, name } => {
            let name = match name {
                Some(name) => name,
                None => file
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .context("upload path has no file name")?,
            };
            let bytes = tokio::fs::read(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let info = storage.upload_asset(&name, &bytes).await?;
            println!("{}\t{}", info.path, format_size(info.size));
        }
        AssetCommand::Rm { path } => storage.delete_asset(&path).await?,
    }
    Ok(())
}

fn print_listing(files: &[FileInfo]) {
    for file in files {
        let modified = file
            .modified
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        println!("{}\t{}\t{}", file.path, format_size(file.size), modified);
    }
}
