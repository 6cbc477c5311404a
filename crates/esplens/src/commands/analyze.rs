//! Device-side analysis submission.
//!
//! Sends an image pair the way the camera firmware does, authenticated
//! by the device API key rather than a session.

use std::path::Path;

use esplens_api::{AnalysisEntry, AnalysisUpload, Client, ImageFile};

use crate::cli::{AnalyzeArgs, GlobalOpts};
use crate::commands::util;
use crate::config::Target;
use crate::error::CliError;
use crate::output;

pub async fn handle(
    client: &Client,
    target: &Target,
    args: AnalyzeArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let api_key = target.api_key(global)?;
    let upload = AnalysisUpload {
        image1: read_image(&args.image1)?,
        image2: read_image(&args.image2)?,
        model: args.model,
        prompt_context: args.context,
    };

    let entry = client.submit_analysis(&api_key, upload).await?;
    if !global.quiet {
        eprintln!("✓ Analysis submitted");
    }
    let out = output::render_single(&global.output, &entry, entry_detail, |e| e.id.to_string());
    output::print_output(&out, global.quiet);
    Ok(())
}

fn entry_detail(entry: &AnalysisEntry) -> String {
    let description = entry.description.as_deref().unwrap_or("(pending)");
    let lines = vec![
        format!("ID:       {}", entry.id),
        format!("Model:    {}", entry.model_used),
        format!("Created:  {}", util::format_timestamp(&entry.created_at)),
        format!("Result:   {description}"),
    ];
    lines.join("\n")
}

fn read_image(path: &Path) -> Result<ImageFile, CliError> {
    let bytes = std::fs::read(path).map_err(|err| CliError::InvalidValue {
        field: "image",
        reason: format!("{}: {err}", path.display()),
    })?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("capture.jpg")
        .to_string();
    Ok(ImageFile::new(file_name, bytes))
}
