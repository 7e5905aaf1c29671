//! Subcommand implementations, generic over the engine boundary

use anyhow::{Context, Result};
use scribe_ocr::{EngineConfig, PageIteratorLevel, Rect, RenderFormat, TessApi, Tesseract};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

/// Recognize each file and write its text to `out`
pub fn run_ocr<A: TessApi>(
    ocr: &Tesseract<A>,
    files: &[PathBuf],
    roi: Option<Rect>,
    out: &mut impl Write,
) -> Result<()> {
    for file in files {
        info!("recognizing {:?}", file);
        let text = ocr
            .do_ocr_file(file, roi)
            .with_context(|| format!("OCR failed for {:?}", file))?;
        out.write_all(text.as_bytes())?;
    }
    out.flush()?;
    Ok(())
}

pub fn run_words<A: TessApi>(
    ocr: &Tesseract<A>,
    file: &Path,
    level: PageIteratorLevel,
    json: bool,
    out: &mut impl Write,
) -> Result<()> {
    let mut pages = scribe_imaging::load_pages(file)
        .with_context(|| format!("Failed to load {:?}", file))?
        .into_iter();
    let raster = pages
        .next()
        .with_context(|| format!("{:?} has no pages", file))?
        .with_context(|| format!("Failed to decode the first page of {:?}", file))?;
    if pages.next().is_some() {
        warn!("only the first page of {:?} is listed", file);
    }

    let elements = ocr.words(&raster, level)?;
    if json {
        serde_json::to_writer_pretty(&mut *out, &elements)?;
        writeln!(out)?;
    } else {
        for element in &elements {
            writeln!(out, "{}", element)?;
        }
    }
    Ok(())
}

/// Render every input; fails if any input failed, after trying them all
pub fn run_documents<A: TessApi>(
    ocr: &Tesseract<A>,
    inputs: &[PathBuf],
    basenames: &[PathBuf],
    formats: &[RenderFormat],
) -> Result<()> {
    let reports = ocr.create_documents(inputs, basenames, formats)?;

    let mut failed = 0;
    for (input, report) in inputs.iter().zip(&reports) {
        match report {
            Ok(report) => {
                for path in &report.outputs {
                    println!("{}", path.display());
                }
                if report.pages_skipped > 0 {
                    warn!("{:?}: {} page(s) skipped", input, report.pages_skipped);
                }
            }
            Err(e) => {
                error!("{:?}: {}", input, e);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        anyhow::bail!("{} of {} document(s) failed", failed, inputs.len());
    }
    Ok(())
}

/// Output basenames for `inputs`: the explicit list when given, otherwise the
/// input's file stem, inside `directory` when set
pub fn document_basenames(
    inputs: &[PathBuf],
    explicit: &[PathBuf],
    directory: Option<&Path>,
) -> Result<Vec<PathBuf>> {
    if !explicit.is_empty() {
        if explicit.len() != inputs.len() {
            anyhow::bail!(
                "{} input(s) but {} output basename(s)",
                inputs.len(),
                explicit.len()
            );
        }
        return Ok(explicit.to_vec());
    }

    Ok(inputs
        .iter()
        .map(|input| match (directory, input.file_stem()) {
            (Some(dir), Some(stem)) => dir.join(stem),
            _ => input.with_extension(""),
        })
        .collect())
}

/// Languages in `config.language` with no traineddata under the data path
pub fn missing_languages(config: &EngineConfig) -> Vec<String> {
    config
        .language
        .split('+')
        .filter(|lang| !lang.is_empty())
        .filter(|lang| {
            !config
                .datapath
                .join(format!("{}.traineddata", lang))
                .exists()
        })
        .map(str::to_string)
        .collect()
}
