use crate::extractor::{LopdfExtractor, PdfExtractor};
use crate::{DocumentPage, IngestError, PageMetadata};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// PDF files directly inside `folder`, sorted by path. A missing or
/// unreadable folder yields no files.
pub fn discover_manuals(folder: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();

    for entry in WalkDir::new(folder)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|item| item.ok())
    {
        if !entry.file_type().is_file() {
            continue;
        }

        let is_pdf = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));

        if is_pdf {
            files.push(entry.path().to_path_buf());
        }
    }

    files.sort_unstable();
    files
}

/// Manual tag for a PDF: the file name without its extension.
pub fn manual_name(path: &Path) -> Result<String, IngestError> {
    path.file_stem()
        .and_then(|name| name.to_str())
        .map(str::to_string)
        .ok_or_else(|| IngestError::MissingFileName(path.display().to_string()))
}

#[derive(Debug, Clone)]
pub struct SkippedPdf {
    pub path: PathBuf,
    pub reason: String,
}

pub struct IngestionReport {
    /// PDF files found in the folder, readable or not.
    pub discovered: usize,
    pub pages: Vec<DocumentPage>,
    pub manuals: Vec<String>,
    pub skipped_files: Vec<SkippedPdf>,
}

/// Extracts every page of every manual in `folder`. Any unreadable PDF fails
/// the whole call; an empty folder is not an error.
pub fn ingest(folder: &Path) -> Result<Vec<DocumentPage>, IngestError> {
    let mut pages = Vec::new();
    for path in discover_manuals(folder) {
        pages.extend(load_manual(&LopdfExtractor, &path)?);
    }
    Ok(pages)
}

/// Like [`ingest`] but records unreadable PDFs in the report and carries on.
pub fn ingest_best_effort(folder: &Path) -> Result<IngestionReport, IngestError> {
    ingest_with(&LopdfExtractor, folder)
}

pub fn ingest_with<X: PdfExtractor>(
    extractor: &X,
    folder: &Path,
) -> Result<IngestionReport, IngestError> {
    let files = discover_manuals(folder);
    if files.is_empty() {
        warn!(folder = %folder.display(), "no pdf files found");
    }
    Ok(ingest_files(extractor, files, |_| {}))
}

/// Loads `files` in order, calling `on_file` before each one is read.
pub fn ingest_files<X, F>(extractor: &X, files: Vec<PathBuf>, mut on_file: F) -> IngestionReport
where
    X: PdfExtractor,
    F: FnMut(&Path),
{
    let discovered = files.len();
    let mut pages = Vec::new();
    let mut manuals = Vec::new();
    let mut skipped_files = Vec::new();

    for path in files {
        on_file(&path);
        match load_manual(extractor, &path) {
            Ok(manual_pages) => {
                if let Some(first) = manual_pages.first() {
                    manuals.push(first.metadata.manual.clone());
                }
                pages.extend(manual_pages);
            }
            Err(error) => {
                warn!(path = %path.display(), reason = %error, "skipped pdf");
                skipped_files.push(SkippedPdf {
                    path,
                    reason: error.to_string(),
                });
            }
        }
    }

    IngestionReport {
        discovered,
        pages,
        manuals,
        skipped_files,
    }
}

fn load_manual<X: PdfExtractor>(
    extractor: &X,
    path: &Path,
) -> Result<Vec<DocumentPage>, IngestError> {
    let manual = manual_name(path)?;
    let source = path.to_string_lossy().to_string();
    info!(manual = %manual, "loading manual");

    let pages = extractor
        .extract_pages(path)?
        .into_iter()
        .map(|page| DocumentPage {
            text: page.text,
            metadata: PageMetadata {
                manual: manual.clone(),
                page: page.number,
                source: source.clone(),
            },
        })
        .collect::<Vec<_>>();

    debug!(manual = %manual, pages = pages.len(), "manual loaded");
    Ok(pages)
}
