use anyhow::{Context, Result};
use serde_json::Value;
use vitae_application::EditingContext;
use vitae_core::document::SectionKey;

pub async fn list(ctx: &EditingContext) -> Result<()> {
    let documents = ctx
        .collection()
        .list()
        .await
        .context("Failed to list documents")?;
    if documents.is_empty() {
        println!("No documents yet. Create one with `vitae create`.");
        return Ok(());
    }
    for doc in documents {
        let modified = doc
            .last_modified()
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .or_else(|| doc.updated_at.clone())
            .unwrap_or_else(|| "-".to_string());
        println!("{:<24} {:<40} {}", doc.id, doc.title, modified);
    }
    Ok(())
}

pub async fn create(ctx: &EditingContext, title: Option<&str>) -> Result<()> {
    let summary = ctx
        .collection()
        .create(title)
        .await
        .context("Failed to create document")?;
    println!("✅ Created '{}' ({})", summary.title, summary.id);
    Ok(())
}

pub async fn delete(ctx: &EditingContext, id: &str) -> Result<()> {
    ctx.collection()
        .remove(id)
        .await
        .with_context(|| format!("Failed to delete {}", id))?;
    println!("🗑️  Deleted {}", id);
    Ok(())
}

pub async fn duplicate(ctx: &EditingContext, id: &str) -> Result<()> {
    let summary = ctx
        .collection()
        .duplicate(id)
        .await
        .with_context(|| format!("Failed to duplicate {}", id))?;
    println!("✅ Created '{}' ({})", summary.title, summary.id);
    Ok(())
}

pub async fn show(ctx: &EditingContext, id: &str, section: Option<&str>) -> Result<()> {
    let document = ctx
        .open(id)
        .await
        .with_context(|| format!("Failed to open {}", id))?;
    let json = match section {
        Some(name) => {
            let key: SectionKey = name.parse()?;
            ctx.read_section(key)?.to_json()?
        }
        None => serde_json::to_value(document.as_ref())?,
    };
    ctx.close().await?;
    print_json(&json)
}

pub async fn edit(ctx: &EditingContext, id: &str, section: &str, json: &str) -> Result<()> {
    let key: SectionKey = section.parse()?;
    let raw = read_json_arg(json)?;

    ctx.open(id)
        .await
        .with_context(|| format!("Failed to open {}", id))?;
    let update = ctx.apply_raw_section(key, &raw)?;
    ctx.close().await.context("Edit applied locally but not saved")?;

    println!("💾 Saved '{}' on {}", update.key, id);
    if key == SectionKey::Basics {
        print_json(&update.value)?;
    }
    Ok(())
}

pub async fn set_title(ctx: &EditingContext, id: &str, title: &str) -> Result<()> {
    ctx.open(id)
        .await
        .with_context(|| format!("Failed to open {}", id))?;
    ctx.set_title(title)?;
    ctx.close().await.context("Title changed locally but not saved")?;
    println!("💾 Renamed {} to '{}'", id, title);
    Ok(())
}

/// Resolves `@path` to the file's contents; anything else is inline JSON.
fn read_json_arg(arg: &str) -> Result<String> {
    match arg.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path)),
        None => Ok(arg.to_string()),
    }
}

/// Pretty-prints a JSON value for terminal output.
pub fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
