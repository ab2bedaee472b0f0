//! The `examprep edit-image` command.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use examprep_core::traits::{extension_for_mime_type, mime_type_for_extension};
use examprep_providers::config::{create_image_editor, load_config_from};
use examprep_providers::SoftImageEditor;

/// `photo.png` edited to `image/jpeg` becomes `photo-edited.jpg`.
fn default_output_path(input: &Path, mime_type: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    input.with_file_name(format!(
        "{stem}-edited.{}",
        extension_for_mime_type(mime_type)
    ))
}

pub async fn execute(
    input: PathBuf,
    instruction: String,
    output: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    let extension = input
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mime_type = mime_type_for_extension(&extension)
        .with_context(|| format!("unsupported image type: {}", input.display()))?;
    let image =
        std::fs::read(&input).with_context(|| format!("failed to read {}", input.display()))?;

    let config = load_config_from(config_path.as_deref())?;
    let editor = SoftImageEditor::new(Arc::from(create_image_editor(&config)?))
        .with_deadline(config.edit_timeout());

    match editor.edit(&image, mime_type, &instruction).await {
        Some(edited) => {
            let path = output.unwrap_or_else(|| default_output_path(&input, &edited.mime_type));
            std::fs::write(&path, &edited.image)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Edited image written to {}", path.display());
        }
        None => {
            println!("edit not applied; original image retained");
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_path_follows_mime_type() {
        assert_eq!(
            default_output_path(Path::new("imgs/photo.png"), "image/jpeg"),
            PathBuf::from("imgs/photo-edited.jpg")
        );
        assert_eq!(
            default_output_path(Path::new("q.webp"), "image/png"),
            PathBuf::from("q-edited.png")
        );
    }
}
