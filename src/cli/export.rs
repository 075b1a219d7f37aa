use std::path::{Path, PathBuf};

use tokio_util::sync::CancellationToken;

use crate::error::{DreError, Result};
use crate::export::{ExportDocument, ExportFormat, ExportOptions, ExportOutcome, ExportRequest, ExportService};
use crate::filters::Filters;
use crate::settings::Settings;

/// `<data_dir>/exports/<file_name>`
pub fn default_path(data_dir: &Path, doc: &ExportDocument) -> PathBuf {
    data_dir.join("exports").join(&doc.file_name)
}

/// Write the document, creating parent directories as needed.
pub fn write_document(doc: &ExportDocument, path: &Path) -> Result<PathBuf> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    std::fs::write(path, &doc.content)?;
    tracing::info!(path = %path.display(), "export written");
    Ok(path.to_path_buf())
}

pub fn run(
    format: &str,
    output: Option<String>,
    options: ExportOptions,
    filters: Filters,
    settings: &Settings,
) -> Result<()> {
    let format: ExportFormat = format.parse()?;
    if options.is_empty() {
        return Err(DreError::Other(
            "Nothing to export: every section was excluded".to_string(),
        ));
    }
    let request = ExportRequest {
        format,
        options,
        filters,
        company: settings.company_name.clone(),
    };

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    let service = ExportService::new(settings.export_delay());
    let outcome = rt.block_on(service.export(request, CancellationToken::new()))?;

    match outcome {
        ExportOutcome::Completed(doc) => {
            let path = output
                .map(PathBuf::from)
                .unwrap_or_else(|| default_path(&settings.data_path(), &doc));
            let written = write_document(&doc, &path)?;
            println!("Wrote {}", written.display());
        }
        ExportOutcome::Cancelled => println!("Export cancelled."),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::render_document;

    #[test]
    fn test_default_path_under_exports() {
        let doc = ExportDocument {
            file_name: "dre-dezembro-2024-2024-12-31.csv".into(),
            content: String::new(),
        };
        assert_eq!(
            default_path(Path::new("/data"), &doc),
            PathBuf::from("/data/exports/dre-dezembro-2024-2024-12-31.csv")
        );
    }

    #[test]
    fn test_write_document_creates_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let doc = render_document(
            ExportFormat::Json,
            &ExportOptions::default(),
            &Filters::default(),
            "Horizonte",
        )
        .unwrap();
        let path = default_path(dir.path(), &doc);
        let written = write_document(&doc, &path).unwrap();
        assert_eq!(written, path);
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Horizonte"));
    }

    #[test]
    fn test_run_writes_to_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("relatorio.txt");
        let settings = Settings {
            export_delay_ms: 0,
            data_dir: dir.path().to_string_lossy().to_string(),
            ..Settings::default()
        };
        run(
            "txt",
            Some(out.to_string_lossy().to_string()),
            ExportOptions::default(),
            Filters::default(),
            &settings,
        )
        .unwrap();
        let content = std::fs::read_to_string(&out).unwrap();
        assert!(content.starts_with("DRE Analytics - Minha Empresa"));
    }

    #[test]
    fn test_run_rejects_unknown_format() {
        let settings = Settings {
            export_delay_ms: 0,
            ..Settings::default()
        };
        let err = run("pdf", None, ExportOptions::default(), Filters::default(), &settings);
        assert!(err.is_err());
    }
}
