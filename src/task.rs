//! Task expansion: sources × presets × formats.
//!
//! The order is fixed: outer loop over sources (in upload order), middle
//! loop over presets (in catalog order, filtered to the selection), inner
//! loop over formats (in selection order). Result ordering in the archive and
//! report starts from this order, so it must not depend on anything else.

use crate::catalog::{OutputFormat, Preset};
use crate::source::SourceImage;
use thiserror::Error;

/// Problems with a batch submission, caught before anything runs.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("No source images to process")]
    NoSources,
    #[error("No presets selected")]
    NoPresets,
    #[error("No output formats selected")]
    NoFormats,
    #[error("Unknown preset: {0}")]
    UnknownPreset(String),
}

/// One unit of work: a source rendered with one preset into one format.
#[derive(Debug, Clone)]
pub struct Task<'a> {
    pub source: &'a SourceImage,
    pub preset: &'a Preset,
    pub format: OutputFormat,
    /// Output base name, captured from the source when the task was built.
    pub output_name: String,
}

/// Build the full cross product in deterministic order.
///
/// Any empty input yields an empty list. Unknown preset ids are ignored here;
/// [`plan_batch`] rejects them. Repeated formats only count once.
pub fn expand_tasks<'a, S: AsRef<str>>(
    sources: &'a [SourceImage],
    catalog: &'a [Preset],
    selected_presets: &[S],
    formats: &[OutputFormat],
) -> Vec<Task<'a>> {
    let presets: Vec<&Preset> = catalog
        .iter()
        .filter(|p| selected_presets.iter().any(|s| s.as_ref() == p.id))
        .collect();

    let mut unique_formats: Vec<OutputFormat> = Vec::with_capacity(formats.len());
    for &format in formats {
        if !unique_formats.contains(&format) {
            unique_formats.push(format);
        }
    }

    let mut tasks = Vec::with_capacity(sources.len() * presets.len() * unique_formats.len());
    for source in sources {
        for &preset in &presets {
            for &format in &unique_formats {
                tasks.push(Task {
                    source,
                    preset,
                    format,
                    output_name: source.output_name().to_string(),
                });
            }
        }
    }
    tasks
}

/// Validate a submission and expand it.
///
/// Fails on empty sources, presets, or formats, and on preset ids missing
/// from `catalog`. On success the task list is never empty.
pub fn plan_batch<'a, S: AsRef<str>>(
    sources: &'a [SourceImage],
    catalog: &'a [Preset],
    selected_presets: &[S],
    formats: &[OutputFormat],
) -> Result<Vec<Task<'a>>, ConfigurationError> {
    if sources.is_empty() {
        return Err(ConfigurationError::NoSources);
    }
    if selected_presets.is_empty() {
        return Err(ConfigurationError::NoPresets);
    }
    if formats.is_empty() {
        return Err(ConfigurationError::NoFormats);
    }
    let mut selected = selected_presets.iter().map(|s| s.as_ref());
    if let Some(unknown) = selected.find(|id| !catalog.iter().any(|p| p.id == *id)) {
        return Err(ConfigurationError::UnknownPreset(unknown.to_string()));
    }
    Ok(expand_tasks(sources, catalog, selected_presets, formats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::PRESETS;
    use crate::test_helpers::mock_source;

    fn labels(tasks: &[Task<'_>]) -> Vec<String> {
        tasks
            .iter()
            .map(|t| format!("{}/{}/{}", t.source.name(), t.preset.id, t.format))
            .collect()
    }

    #[test]
    fn cross_product_in_deterministic_order() {
        let sources = vec![mock_source("a.jpg", "10x10"), mock_source("b.jpg", "10x10")];
        // Selection order differs from catalog order on purpose
        let tasks = expand_tasks(
            &sources,
            PRESETS,
            &["hero-banner", "product-zoom"],
            &[OutputFormat::Png, OutputFormat::Webp],
        );

        assert_eq!(
            labels(&tasks),
            vec![
                "a.jpg/product-zoom/png",
                "a.jpg/product-zoom/webp",
                "a.jpg/hero-banner/png",
                "a.jpg/hero-banner/webp",
                "b.jpg/product-zoom/png",
                "b.jpg/product-zoom/webp",
                "b.jpg/hero-banner/png",
                "b.jpg/hero-banner/webp",
            ]
        );
    }

    #[test]
    fn task_count_is_product_of_selections() {
        let sources = vec![
            mock_source("a.jpg", "1x1"),
            mock_source("b.jpg", "1x1"),
            mock_source("c.jpg", "1x1"),
        ];
        let all: Vec<&str> = PRESETS.iter().map(|p| p.id).collect();
        let tasks = expand_tasks(&sources, PRESETS, &all, &OutputFormat::ALL);
        assert_eq!(tasks.len(), 3 * 4 * 4);
    }

    #[test]
    fn tasks_capture_output_name() {
        let mut source = mock_source("shoe.jpg", "1x1");
        source.set_output_name("red-shoe");
        let sources = vec![source];
        let tasks = expand_tasks(&sources, PRESETS, &["product-zoom"], &[OutputFormat::Jpg]);
        assert_eq!(tasks[0].output_name, "red-shoe");
    }

    #[test]
    fn duplicate_formats_count_once() {
        let sources = vec![mock_source("a.jpg", "1x1")];
        let tasks = expand_tasks(
            &sources,
            PRESETS,
            &["product-zoom"],
            &[OutputFormat::Webp, OutputFormat::Jpg, OutputFormat::Webp],
        );
        assert_eq!(labels(&tasks), vec!["a.jpg/product-zoom/webp", "a.jpg/product-zoom/jpg"]);
    }

    #[test]
    fn empty_inputs_expand_to_nothing() {
        let sources = vec![mock_source("a.jpg", "1x1")];
        let none: [&str; 0] = [];
        assert!(expand_tasks(&[], PRESETS, &["product-zoom"], &[OutputFormat::Jpg]).is_empty());
        assert!(expand_tasks(&sources, PRESETS, &none, &[OutputFormat::Jpg]).is_empty());
        assert!(expand_tasks(&sources, PRESETS, &["product-zoom"], &[]).is_empty());
    }

    #[test]
    fn plan_rejects_empty_selections() {
        let sources = vec![mock_source("a.jpg", "1x1")];
        let none: [&str; 0] = [];
        assert_eq!(
            plan_batch(&[], PRESETS, &["product-zoom"], &[OutputFormat::Jpg]).unwrap_err(),
            ConfigurationError::NoSources
        );
        assert_eq!(
            plan_batch(&sources, PRESETS, &none, &[OutputFormat::Jpg]).unwrap_err(),
            ConfigurationError::NoPresets
        );
        assert_eq!(
            plan_batch(&sources, PRESETS, &["product-zoom"], &[]).unwrap_err(),
            ConfigurationError::NoFormats
        );
    }

    #[test]
    fn plan_rejects_unknown_preset() {
        let sources = vec![mock_source("a.jpg", "1x1")];
        assert_eq!(
            plan_batch(
                &sources,
                PRESETS,
                &["product-zoom", "billboard"],
                &[OutputFormat::Jpg]
            )
            .unwrap_err(),
            ConfigurationError::UnknownPreset("billboard".into())
        );
    }

    #[test]
    fn plan_accepts_owned_strings() {
        let sources = vec![mock_source("a.jpg", "1x1")];
        let selected = vec!["hero-banner".to_string()];
        let tasks = plan_batch(&sources, PRESETS, &selected, &[OutputFormat::Pdf]).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].preset.id, "hero-banner");
    }
}
