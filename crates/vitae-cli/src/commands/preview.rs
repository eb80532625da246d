use std::path::Path;

use anyhow::{Context, Result};
use vitae_application::EditingContext;

use super::documents::print_json;

pub async fn render(ctx: &EditingContext, id: &str, out: &Path) -> Result<()> {
    ctx.open(id)
        .await
        .with_context(|| format!("Failed to open {}", id))?;
    let rendered = ctx.render().await;
    ctx.close().await?;

    let artifact = rendered.context("Rendering failed")?;
    std::fs::write(out, &artifact.bytes)
        .with_context(|| format!("Failed to write {}", out.display()))?;
    println!(
        "📄 Wrote {} ({} bytes, {})",
        out.display(),
        artifact.len(),
        artifact.content_type
    );
    Ok(())
}

pub async fn tailor(ctx: &EditingContext, id: &str, job: &Path, apply: bool) -> Result<()> {
    let job_description = std::fs::read_to_string(job)
        .with_context(|| format!("Failed to read {}", job.display()))?;

    ctx.open(id)
        .await
        .with_context(|| format!("Failed to open {}", id))?;
    let tailored = match ctx.tailor(&job_description).await {
        Ok(tailored) => tailored,
        Err(e) => {
            ctx.close().await?;
            return Err(e).context("Tailoring failed");
        }
    };

    if apply {
        let updates = ctx.apply_tailored(tailored)?;
        ctx.close()
            .await
            .context("Tailored sections applied locally but not saved")?;
        println!("💾 Applied {} tailored sections to {}", updates.len(), id);
    } else {
        ctx.close().await?;
        print_json(&serde_json::to_value(&tailored)?)?;
    }
    Ok(())
}
