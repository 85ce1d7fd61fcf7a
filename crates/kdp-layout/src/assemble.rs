//! Merging the cover and interior into one print-ready document

use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::render::save_document;
use crate::types::Result;

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE_KEYS: [&[u8]; 4] = [b"MediaBox", b"CropBox", b"Resources", b"Rotate"];

/// Deep copy an object from source to output document, following references.
///
/// Each source object is copied once; the cache maps source ids to output
/// ids. Ids are reserved before recursing so reference cycles terminate.
pub fn copy_object_deep(
    output: &mut Document,
    source: &Document,
    obj: &Object,
    cache: &mut HashMap<ObjectId, ObjectId>,
) -> Result<Object> {
    match obj {
        Object::Reference(id) => {
            if let Some(&new_id) = cache.get(id) {
                return Ok(Object::Reference(new_id));
            }

            let new_id = output.new_object_id();
            cache.insert(*id, new_id);

            let referenced = source.get_object(*id)?;
            let copied = copy_object_deep(output, source, referenced, cache)?;
            output.objects.insert(new_id, copied);

            Ok(Object::Reference(new_id))
        }
        Object::Dictionary(dict) => Ok(Object::Dictionary(copy_dictionary(
            output, source, dict, cache,
        )?)),
        Object::Array(arr) => {
            let new_arr: Result<Vec<_>> = arr
                .iter()
                .map(|item| copy_object_deep(output, source, item, cache))
                .collect();
            Ok(Object::Array(new_arr?))
        }
        Object::Stream(stream) => Ok(Object::Stream(Stream {
            dict: copy_dictionary(output, source, &stream.dict, cache)?,
            content: stream.content.clone(),
            allows_compression: stream.allows_compression,
            start_position: None,
        })),
        _ => Ok(obj.clone()),
    }
}

fn copy_dictionary(
    output: &mut Document,
    source: &Document,
    dict: &Dictionary,
    cache: &mut HashMap<ObjectId, ObjectId>,
) -> Result<Dictionary> {
    let mut new_dict = Dictionary::new();
    for (key, value) in dict.iter() {
        new_dict.set(key.clone(), copy_object_deep(output, source, value, cache)?);
    }
    Ok(new_dict)
}

/// Look up an inheritable attribute on the page's ancestors
fn inherited_attribute(doc: &Document, page: &Dictionary, key: &[u8]) -> Option<Object> {
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    // Depth guard against malformed trees
    for _ in 0..64 {
        let node = doc.get_dictionary(parent?).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
    }
    None
}

/// Copy up to `limit` pages of `source` under `pages_id` in `output`
fn append_pages(
    output: &mut Document,
    pages_id: ObjectId,
    source: &Document,
    limit: Option<usize>,
    kids: &mut Vec<Object>,
) -> Result<()> {
    let mut cache = HashMap::new();
    let page_ids: Vec<ObjectId> = source.get_pages().into_values().collect();

    for page_id in page_ids.into_iter().take(limit.unwrap_or(usize::MAX)) {
        let mut page = source.get_dictionary(page_id)?.clone();
        for key in INHERITABLE_KEYS {
            if !page.has(key) {
                if let Some(value) = inherited_attribute(source, &page, key) {
                    page.set(key.to_vec(), value);
                }
            }
        }
        page.remove(b"Parent");

        // Back-references to this page resolve to its copy
        let new_page_id = output.new_object_id();
        cache.insert(page_id, new_page_id);

        let mut copied = copy_dictionary(output, source, &page, &mut cache)?;
        copied.set("Parent", Object::Reference(pages_id));
        output.objects.insert(new_page_id, Object::Dictionary(copied));
        kids.push(Object::Reference(new_page_id));
    }
    Ok(())
}

/// Write the first cover page followed by every interior page to `output`.
///
/// Returns the number of pages written.
pub fn combine(cover: &Path, interior: &Path, output: &Path, temp_dir: &Path) -> Result<usize> {
    let cover_doc = Document::load(cover)?;
    let interior_doc = Document::load(interior)?;

    let mut merged = Document::with_version("1.7");
    let pages_id = merged.new_object_id();
    let mut kids = Vec::new();

    append_pages(&mut merged, pages_id, &cover_doc, Some(1), &mut kids)?;
    append_pages(&mut merged, pages_id, &interior_doc, None, &mut kids)?;

    let count = kids.len();
    let pages_dict = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Kids", Object::Array(kids)),
        ("Count", Object::Integer(count as i64)),
    ]);
    merged
        .objects
        .insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = merged.add_object(Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]));
    merged.trailer.set("Root", catalog_id);

    if let Ok(info) = interior_doc.trailer.get(b"Info") {
        let info = copy_object_deep(&mut merged, &interior_doc, info, &mut HashMap::new())?;
        merged.trailer.set("Info", info);
    }

    save_document(&mut merged, temp_dir, output)?;
    log::info!("Combined {} pages into {}", count, output.display());
    Ok(count)
}

/// Outcome of assembling a book
#[derive(Debug, Clone, PartialEq)]
pub struct Assembly {
    pub path: PathBuf,
    /// True when the cover could not be attached and `path` is the interior
    pub degraded: bool,
}

/// Combine cover and interior, returning the interior alone if that fails
pub fn combine_or_interior(
    cover: &Path,
    interior: &Path,
    output: &Path,
    temp_dir: &Path,
) -> Assembly {
    match combine(cover, interior, output, temp_dir) {
        Ok(_) => Assembly {
            path: output.to_path_buf(),
            degraded: false,
        },
        Err(e) => {
            log::error!("Error combining PDFs: {}; returning interior only", e);
            Assembly {
                path: interior.to_path_buf(),
                degraded: true,
            }
        }
    }
}
