//! Assembly: merge the per-page artifacts into one PDF, in page order.
//!
//! Runs strictly after every worker and the monitor have terminated, so the
//! registry snapshot it receives is final and the artifact store has no
//! concurrent writers. Page numbers are sorted ascending before the merge;
//! worker completion order never influences the output order.
//!
//! The merge renumbers each source document into a shared id space, lifts
//! all page objects under a single page tree, and rebuilds the catalog.
//! A registered page whose artifact is missing on disk is a fatal error —
//! it would mean the worker contract was broken, and silently skipping it
//! would hide that.

use crate::error::Book2PdfError;
use crate::scratch::Scratch;
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use tracing::info;

/// Bind the artifacts for `pages` into `{output_dir}/{title}.pdf`.
///
/// Returns the path of the written file.
pub fn bind_pages(
    scratch: &Scratch,
    pages: &[u32],
    title: &str,
    output_dir: &Path,
) -> Result<PathBuf, Book2PdfError> {
    if pages.is_empty() {
        return Err(Book2PdfError::MergeFailed {
            detail: "no pages to bind".into(),
        });
    }

    let mut order: Vec<u32> = pages.to_vec();
    order.sort_unstable();

    // Load every artifact into one shared id space. Renumbering in ascending
    // page order makes object ids ascend with page numbers, which keeps the
    // rebuilt Kids array in page order below.
    let mut max_id = 1u32;
    let mut page_objects: BTreeMap<ObjectId, Object> = BTreeMap::new();
    let mut all_objects: BTreeMap<ObjectId, Object> = BTreeMap::new();

    for &page in &order {
        let path = scratch.page_path(page);
        if !path.exists() {
            return Err(Book2PdfError::MissingArtifact { page, path });
        }
        let mut doc = Document::load(&path).map_err(|e| Book2PdfError::MergeFailed {
            detail: format!("page {page}: {e}"),
        })?;
        doc.renumber_objects_with(max_id);
        max_id = doc.max_id + 1;

        for object_id in doc.get_pages().into_values() {
            let object = doc
                .get_object(object_id)
                .map_err(|e| Book2PdfError::MergeFailed {
                    detail: format!("page {page}: {e}"),
                })?
                .to_owned();
            page_objects.insert(object_id, object);
        }
        all_objects.extend(std::mem::take(&mut doc.objects));
    }

    let mut document = Document::with_version("1.5");
    let mut catalog_id: Option<ObjectId> = None;
    let mut pages_root: Option<(ObjectId, Dictionary)> = None;

    for (object_id, object) in &all_objects {
        match object_type(object) {
            // One catalog and one page tree survive; the rest merge into them.
            Some(b"Catalog") => {
                catalog_id.get_or_insert(*object_id);
            }
            Some(b"Pages") => {
                if let Ok(dict) = object.as_dict() {
                    match &mut pages_root {
                        Some((_, merged)) => merged.extend(dict),
                        None => pages_root = Some((*object_id, dict.clone())),
                    }
                }
            }
            Some(b"Page") => {}
            _ => {
                document.objects.insert(*object_id, object.clone());
            }
        }
    }

    let (pages_root_id, mut pages_dict) =
        pages_root.ok_or_else(|| Book2PdfError::MergeFailed {
            detail: "artifacts contain no page tree".into(),
        })?;
    let catalog_id = catalog_id.ok_or_else(|| Book2PdfError::MergeFailed {
        detail: "artifacts contain no catalog".into(),
    })?;

    for (object_id, object) in &page_objects {
        if let Ok(dict) = object.as_dict() {
            let mut dict = dict.clone();
            dict.set("Parent", pages_root_id);
            document.objects.insert(*object_id, Object::Dictionary(dict));
        }
    }

    pages_dict.set("Count", page_objects.len() as i64);
    pages_dict.set(
        "Kids",
        page_objects
            .keys()
            .map(|id| Object::Reference(*id))
            .collect::<Vec<_>>(),
    );
    document
        .objects
        .insert(pages_root_id, Object::Dictionary(pages_dict));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", pages_root_id);
    document
        .objects
        .insert(catalog_id, Object::Dictionary(catalog));

    document.trailer.set("Root", catalog_id);
    document.max_id = document.objects.len() as u32;
    document.renumber_objects();
    document.compress();

    std::fs::create_dir_all(output_dir).map_err(|e| Book2PdfError::OutputWriteFailed {
        path: output_dir.to_path_buf(),
        source: e,
    })?;
    let output_path = output_dir.join(format!("{}.pdf", sanitize_title(title)));
    document
        .save(&output_path)
        .map_err(|e| Book2PdfError::OutputWriteFailed {
            path: output_path.clone(),
            source: io::Error::other(e.to_string()),
        })?;

    info!("Bound {} pages into {}", order.len(), output_path.display());
    Ok(output_path)
}

fn object_type(object: &Object) -> Option<&[u8]> {
    object.as_dict().ok()?.get(b"Type").ok()?.as_name().ok()
}

/// Turn a book title into a safe file stem.
fn sanitize_title(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .map(|c| match c {
            '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim().trim_end_matches('.').trim().to_string();
    if cleaned.is_empty() {
        "book".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::dictionary;

    /// Write a minimal one-page PDF with a recognisable MediaBox width.
    fn write_page_pdf(path: &Path, width: i64) {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), width.into(), 100.into()],
        });
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => vec![page_id.into()],
                "Count" => 1,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc.save(path).unwrap();
    }

    fn media_box_widths(path: &Path) -> Vec<i64> {
        let doc = Document::load(path).unwrap();
        doc.get_pages()
            .into_values()
            .map(|id| {
                let dict = doc.get_object(id).unwrap().as_dict().unwrap();
                let mb = dict.get(b"MediaBox").unwrap().as_array().unwrap();
                mb[2].as_i64().unwrap()
            })
            .collect()
    }

    #[test]
    fn pages_come_out_in_ascending_page_order() {
        let scratch = Scratch::new(None).unwrap();
        let out_dir = tempfile::tempdir().unwrap();

        // Artifacts written in completion order 5, 1, 3; widths encode the
        // page number so order is observable in the output.
        for page in [5u32, 1, 3] {
            write_page_pdf(&scratch.page_path(page), 100 + page as i64);
        }

        let out = bind_pages(&scratch, &[5, 1, 3], "Shuffled", out_dir.path()).unwrap();
        assert_eq!(media_box_widths(&out), vec![101, 103, 105]);
    }

    #[test]
    fn page_count_matches_input() {
        let scratch = Scratch::new(None).unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        for page in 1..=4u32 {
            write_page_pdf(&scratch.page_path(page), 200);
        }

        let out = bind_pages(&scratch, &[1, 2, 3, 4], "Full Book", out_dir.path()).unwrap();
        let doc = Document::load(&out).unwrap();
        assert_eq!(doc.get_pages().len(), 4);
        assert!(out.file_name().unwrap().to_str().unwrap().starts_with("Full Book"));
    }

    #[test]
    fn missing_artifact_is_fatal() {
        let scratch = Scratch::new(None).unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        write_page_pdf(&scratch.page_path(1), 100);

        let err = bind_pages(&scratch, &[1, 2], "Broken", out_dir.path()).unwrap_err();
        match err {
            Book2PdfError::MissingArtifact { page, .. } => assert_eq!(page, 2),
            other => panic!("expected MissingArtifact, got {other:?}"),
        }
    }

    #[test]
    fn empty_page_list_is_an_error() {
        let scratch = Scratch::new(None).unwrap();
        let out_dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            bind_pages(&scratch, &[], "Empty", out_dir.path()),
            Err(Book2PdfError::MergeFailed { .. })
        ));
    }

    #[test]
    fn titles_are_sanitised_for_the_filesystem() {
        assert_eq!(sanitize_title("Plain Title"), "Plain Title");
        assert_eq!(sanitize_title("A/B: C?"), "A_B_ C_");
        assert_eq!(sanitize_title("  spaced  "), "spaced");
        assert_eq!(sanitize_title("///"), "___");
        assert_eq!(sanitize_title(""), "book");
        assert_eq!(sanitize_title("Ending."), "Ending");
    }
}
