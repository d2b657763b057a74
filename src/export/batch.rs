//! Sequential batch export.
//!
//! One recipient at a time: render, encode, hand off, record. The template
//! image is decoded once and shared. A failure is recorded against its
//! recipient and the loop moves on.
//!
//! ```text
//! recipients ──render──▶ Surface ──encode──▶ ExportedFile ──sink──▶ T
//!                                                            │
//!                                      ExportRecord<T> ◀─────┘
//! ```
//!
//! [`stream_batch`] hands every file to a sink before the next recipient is
//! rendered, so only the sink's output (a path, for [`export_batch_to_dir`])
//! is kept per recipient. [`export_batch`] keeps the encoded bytes instead.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use super::{ExportOptions, ExportedFile, export};
use crate::compositor::{Compositor, Surface};
use crate::error::CertigenError;
use crate::image_source::TemplateImage;
use crate::model::{Recipient, TextElement};

/// Outcome for one recipient.
#[derive(Debug)]
pub struct ExportRecord<T = ExportedFile> {
    pub recipient: Recipient,
    pub result: Result<T, CertigenError>,
}

#[derive(Debug)]
pub struct BatchReport<T = ExportedFile> {
    pub records: Vec<ExportRecord<T>>,
}

impl<T> Default for BatchReport<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
        }
    }
}

impl<T> BatchReport<T> {
    pub fn succeeded(&self) -> usize {
        self.records.iter().filter(|r| r.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.records.len() - self.succeeded()
    }
}

impl BatchReport<ExportedFile> {
    /// Write every successful export into `dir`.
    ///
    /// Recipients sharing a name get `-2`, `-3`, ... suffixes instead of
    /// overwriting each other.
    pub fn write_to_dir(&self, dir: &Path) -> Result<Vec<PathBuf>, CertigenError> {
        let mut writer = DirectoryWriter::create(dir)?;
        self.records
            .iter()
            .filter_map(|r| r.result.as_ref().ok())
            .map(|file| writer.write(file))
            .collect()
    }
}

/// Writes exported files into one directory, deduplicating file names.
#[derive(Debug)]
pub struct DirectoryWriter {
    dir: PathBuf,
    taken: HashSet<String>,
}

impl DirectoryWriter {
    pub fn create(dir: &Path) -> Result<Self, CertigenError> {
        std::fs::create_dir_all(dir)?;
        Ok(Self {
            dir: dir.to_path_buf(),
            taken: HashSet::new(),
        })
    }

    pub fn write(&mut self, file: &ExportedFile) -> Result<PathBuf, CertigenError> {
        let path = self.dir.join(unique_name(&file.file_name, &mut self.taken));
        std::fs::write(&path, &file.bytes).map_err(|e| {
            CertigenError::ExportEncoding(format!("Failed to write {}: {}", path.display(), e))
        })?;
        Ok(path)
    }
}

fn unique_name(file_name: &str, taken: &mut HashSet<String>) -> String {
    if taken.insert(file_name.to_string()) {
        return file_name.to_string();
    }
    let (stem, ext) = file_name.rsplit_once('.').unwrap_or((file_name, ""));
    (2..)
        .map(|n| {
            if ext.is_empty() {
                format!("{}-{}", stem, n)
            } else {
                format!("{}-{}.{}", stem, n, ext)
            }
        })
        .find(|candidate| taken.insert(candidate.clone()))
        .unwrap_or_else(|| file_name.to_string())
}

/// Encode already-rendered surfaces and pass each file to `sink` as soon
/// as it is encoded.
pub fn stream_batch<'r, T>(
    rendered: impl IntoIterator<Item = (&'r Recipient, Surface)>,
    options: &ExportOptions,
    mut sink: impl FnMut(&Recipient, ExportedFile) -> Result<T, CertigenError>,
) -> BatchReport<T> {
    let mut report = BatchReport::default();
    for (recipient, surface) in rendered {
        let result = export(&surface, &recipient.name, options)
            .and_then(|file| sink(recipient, file));
        if let Err(e) = &result {
            tracing::warn!(recipient = %recipient.name, "export failed: {}", e);
        }
        report.records.push(ExportRecord {
            recipient: recipient.clone(),
            result,
        });
    }

    tracing::info!(
        format = %options.format,
        succeeded = report.succeeded(),
        failed = report.failed(),
        "batch export finished"
    );
    report
}

/// Encode already-rendered surfaces, keeping every file in memory.
pub fn collect_batch<'r>(
    rendered: impl IntoIterator<Item = (&'r Recipient, Surface)>,
    options: &ExportOptions,
) -> BatchReport {
    stream_batch(rendered, options, |_, file| Ok(file))
}

/// Render and encode a certificate for every recipient, in order.
pub fn export_batch(
    compositor: &Compositor<'_>,
    template: &TemplateImage,
    elements: &[TextElement],
    recipients: &[Recipient],
    options: &ExportOptions,
) -> BatchReport {
    collect_batch(compositor.render_batch(template, elements, recipients), options)
}

/// Render every certificate straight into `dir`.
///
/// Each file is written and dropped before the next recipient is rendered.
pub fn export_batch_to_dir(
    compositor: &Compositor<'_>,
    template: &TemplateImage,
    elements: &[TextElement],
    recipients: &[Recipient],
    options: &ExportOptions,
    dir: &Path,
) -> Result<BatchReport<PathBuf>, CertigenError> {
    let mut writer = DirectoryWriter::create(dir)?;
    Ok(stream_batch(
        compositor.render_batch(template, elements, recipients),
        options,
        |_, file| writer.write(&file),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::ExportFormat;
    use crate::fonts::FontRegistry;
    use image::{Rgba, RgbaImage};
    use pretty_assertions::assert_eq;

    fn recipients(names: &[&str]) -> Vec<Recipient> {
        names.iter().map(|n| Recipient::new(n).unwrap()).collect()
    }

    #[test]
    fn test_exports_every_recipient_in_order() {
        let fonts = FontRegistry::new();
        let template =
            TemplateImage::from_rgba(RgbaImage::from_pixel(120, 40, Rgba([255, 255, 255, 255])))
                .unwrap();
        let elements = vec![TextElement::new("{name}").with_position(0.0, 0.0)];
        let people = recipients(&["Ada", "Grace", "Linus"]);

        let report = export_batch(
            &Compositor::new(&fonts),
            &template,
            &elements,
            &people,
            &ExportOptions::new(ExportFormat::Png),
        );

        assert_eq!(report.succeeded(), 3);
        let names: Vec<_> = report
            .records
            .iter()
            .map(|r| r.result.as_ref().unwrap().file_name.clone())
            .collect();
        assert_eq!(
            names,
            vec!["certificate-Ada.png", "certificate-Grace.png", "certificate-Linus.png"]
        );
    }

    #[test]
    fn test_failure_is_isolated() {
        let people = recipients(&["Ada", "Broken", "Linus"]);
        let good = || Surface::new(RgbaImage::from_pixel(8, 8, Rgba([0, 0, 0, 255])));
        let rendered = vec![
            (&people[0], good()),
            (&people[1], Surface::new(RgbaImage::new(0, 0))),
            (&people[2], good()),
        ];

        let report = collect_batch(rendered, &ExportOptions::default());
        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        assert!(matches!(
            report.records[1].result,
            Err(CertigenError::ExportEncoding(_))
        ));
        assert!(report.records[2].result.is_ok());
    }

    #[test]
    fn test_write_to_dir_dedupes_names() {
        let dir = tempfile::tempdir().unwrap();
        let people = recipients(&["Ada", "Ada"]);
        let surface = || Surface::new(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255])));
        let report = collect_batch(
            vec![(&people[0], surface()), (&people[1], surface())],
            &ExportOptions::default(),
        );

        let paths = report.write_to_dir(dir.path()).unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["certificate-Ada.jpg", "certificate-Ada-2.jpg"]);
        assert!(paths.iter().all(|p| p.exists()));
    }

    #[test]
    fn test_stream_hands_off_before_next_render() {
        let people = recipients(&["Ada", "Grace", "Linus"]);
        let rendered_so_far = std::cell::Cell::new(0);
        let rendered = people.iter().map(|r| {
            rendered_so_far.set(rendered_so_far.get() + 1);
            (r, Surface::new(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255]))))
        });

        let mut handed_off = 0;
        let report = stream_batch(rendered, &ExportOptions::default(), |recipient, file| {
            handed_off += 1;
            assert_eq!(rendered_so_far.get(), handed_off);
            Ok((recipient.name.clone(), file.bytes.len()))
        });

        assert_eq!(report.succeeded(), 3);
        assert_eq!(report.records[2].result.as_ref().unwrap().0, "Linus");
    }

    #[test]
    fn test_export_to_dir_keeps_only_paths() {
        let dir = tempfile::tempdir().unwrap();
        let fonts = FontRegistry::new();
        let template =
            TemplateImage::from_rgba(RgbaImage::from_pixel(60, 20, Rgba([255, 255, 255, 255])))
                .unwrap();
        let elements = vec![TextElement::new("{name}")];
        let people = recipients(&["Ada", "Ada", "Grace"]);

        let report = export_batch_to_dir(
            &Compositor::new(&fonts),
            &template,
            &elements,
            &people,
            &ExportOptions::new(ExportFormat::Png),
            dir.path(),
        )
        .unwrap();

        let names: Vec<_> = report
            .records
            .iter()
            .map(|r| {
                let path = r.result.as_ref().unwrap();
                assert!(path.exists());
                path.file_name().unwrap().to_string_lossy().into_owned()
            })
            .collect();
        assert_eq!(
            names,
            vec!["certificate-Ada.png", "certificate-Ada-2.png", "certificate-Grace.png"]
        );
    }

    #[test]
    fn test_sink_failure_is_isolated() {
        let people = recipients(&["Ada", "Grace"]);
        let rendered = people
            .iter()
            .map(|r| (r, Surface::new(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255])))));

        let report = stream_batch(rendered, &ExportOptions::default(), |recipient, _| {
            if recipient.name == "Ada" {
                Err(CertigenError::ExportEncoding("disk full".to_string()))
            } else {
                Ok(())
            }
        });
        assert_eq!((report.succeeded(), report.failed()), (1, 1));
        assert!(report.records[1].result.is_ok());
    }
}
