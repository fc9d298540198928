//! Page objects and the page tree walk.

use crate::document::catalog::Document;
use crate::error::{PdfError, Result};
use crate::model::objects::PdfObject;
use crate::utils::Rect;
use rustc_hash::FxHashSet;
use std::collections::HashMap;

/// Attributes a /Pages node passes down to its kids.
const INHERITABLE: [&str; 4] = ["Resources", "MediaBox", "CropBox", "Rotate"];

/// US Letter, the conventional fallback when /MediaBox is absent.
const DEFAULT_MEDIABOX: Rect = (0.0, 0.0, 612.0, 792.0);

/// A single page, with inherited attributes already merged in.
#[derive(Debug, Clone)]
pub struct Page {
    /// Object id of the page dictionary.
    pub pageid: u32,
    pub attrs: HashMap<String, PdfObject>,
    pub mediabox: Rect,
    pub cropbox: Rect,
    /// Clockwise rotation in degrees, normalized to 0/90/180/270.
    pub rotate: i32,
    pub resources: HashMap<String, PdfObject>,
    /// Content stream objects, resolved and in order.
    pub contents: Vec<PdfObject>,
}

impl Page {
    fn from_attrs(doc: &Document, pageid: u32, attrs: HashMap<String, PdfObject>) -> Result<Self> {
        let mediabox = attrs
            .get("MediaBox")
            .and_then(|v| doc.resolve(v).ok())
            .and_then(|v| parse_rect(doc, &v))
            .unwrap_or(DEFAULT_MEDIABOX);
        let cropbox = attrs
            .get("CropBox")
            .and_then(|v| doc.resolve(v).ok())
            .and_then(|v| parse_rect(doc, &v))
            .unwrap_or(mediabox);
        let rotate = attrs
            .get("Rotate")
            .and_then(|v| doc.resolve(v).ok())
            .and_then(|v| v.as_int().ok())
            .unwrap_or(0);
        let rotate = ((rotate % 360 + 360) % 360) as i32;

        let resources = match attrs.get("Resources") {
            Some(v) => doc.resolve(v)?.as_dict().cloned().unwrap_or_default(),
            None => HashMap::new(),
        };

        // /Contents is a stream or an array of streams.
        let mut contents = Vec::new();
        if let Some(c) = attrs.get("Contents") {
            match doc.resolve(c)? {
                PdfObject::Array(items) => {
                    for item in &items {
                        let obj = doc.resolve(item)?;
                        if obj.as_stream().is_ok() {
                            contents.push(obj);
                        }
                    }
                }
                obj @ PdfObject::Stream(_) => contents.push(obj),
                PdfObject::Null => {}
                other => {
                    log::warn!("page {}: ignoring /Contents of type {}", pageid, other.type_name());
                }
            }
        }

        Ok(Self {
            pageid,
            attrs,
            mediabox,
            cropbox,
            rotate,
            resources,
            contents,
        })
    }

    /// Walk the page tree from the catalog, depth first, yielding leaf
    /// /Page nodes with inherited attributes applied. Revisiting a node
    /// is a structural error, not something to paper over.
    pub(crate) fn collect(doc: &Document) -> Result<Vec<Self>> {
        let catalog = doc.catalog()?;
        let root_ref = match catalog.get("Pages") {
            Some(obj) => doc.resolve_to_ref(obj)?,
            None => return Ok(Vec::new()),
        };

        let mut pages = Vec::new();
        let mut visited = FxHashSet::default();
        // Stack of (node ref, attributes inherited from ancestors).
        let mut stack: Vec<(crate::model::objects::ObjRef, HashMap<String, PdfObject>)> =
            vec![(root_ref, HashMap::new())];

        while let Some((noderef, inherited)) = stack.pop() {
            if !visited.insert(noderef.objid) {
                return Err(PdfError::CyclicPageTree(noderef.objid));
            }
            let node = doc.resolve_ref(noderef)?;
            let dict = node.as_dict().map_err(|_| {
                PdfError::MalformedDocument(format!(
                    "page tree node {} is not a dictionary",
                    noderef.objid
                ))
            })?;

            let mut attrs = inherited.clone();
            for (k, v) in dict {
                attrs.insert(k.clone(), v.clone());
            }

            let node_type = dict.get("Type").and_then(|t| t.as_name().ok());
            let is_branch = node_type == Some("Pages") || dict.contains_key("Kids");
            if is_branch && node_type != Some("Page") {
                let mut passed = HashMap::new();
                for key in INHERITABLE {
                    if let Some(v) = attrs.get(key) {
                        passed.insert(key.to_string(), v.clone());
                    }
                }
                let kids = match dict.get("Kids") {
                    Some(k) => doc.resolve(k)?.as_array().cloned().unwrap_or_default(),
                    None => Vec::new(),
                };
                // Reversed so the stack pops kids in document order.
                for kid in kids.iter().rev() {
                    stack.push((doc.resolve_to_ref(kid)?, passed.clone()));
                }
            } else {
                pages.push(Self::from_attrs(doc, noderef.objid, attrs)?);
            }
        }
        Ok(pages)
    }
}

fn parse_rect(doc: &Document, obj: &PdfObject) -> Option<Rect> {
    let arr = obj.as_array().ok()?;
    if arr.len() != 4 {
        return None;
    }
    let mut vals = [0.0f64; 4];
    for (slot, item) in vals.iter_mut().zip(arr) {
        *slot = doc.resolve(item).ok()?.as_num().ok()?;
    }
    // Normalize so (x0, y0) is the lower-left corner.
    Some((
        vals[0].min(vals[2]),
        vals[1].min(vals[3]),
        vals[0].max(vals[2]),
        vals[1].max(vals[3]),
    ))
}
