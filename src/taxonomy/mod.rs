//! Topic taxonomy: a tree of categories with example documents attached.
//!
//! Nodes live in an index arena; parent and child links are [`CategoryId`]s.
//! A second index maps every document to the categories it is attached to,
//! so subtree membership can be derived by walking ancestors once per
//! document instead of re-collecting subtrees per category.

pub mod filter;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use indexmap::IndexMap;
use tracing::info;

use crate::error::{ClassifierError, Result};
use crate::utils::datastruct::arena::{Arena, ArenaSlot};
use crate::vectorizer::corpus::DocId;

pub use filter::{CategoryAlias, CategoryFilter, SubtreeFilter};

pub type CategoryId = ArenaSlot;

#[derive(Debug, Clone)]
pub struct Category {
    /// full path, e.g. `Top/Sports/Basketball`
    pub name: String,
    pub parent: Option<CategoryId>,
    pub children: Vec<CategoryId>,
    /// documents attached directly to this node
    pub documents: Vec<DocId>,
}

#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    nodes: Arena<Category>,
    by_name: HashMap<String, CategoryId>,
    root: Option<CategoryId>,
    /// document text, first occurrence wins
    texts: IndexMap<DocId, String>,
    doc_categories: HashMap<DocId, Vec<CategoryId>>,
}

impl Taxonomy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn root(&self) -> Option<CategoryId> {
        self.root
    }

    pub fn category(&self, id: CategoryId) -> Option<&Category> {
        self.nodes.get(id)
    }

    pub fn find(&self, name: &str) -> Option<CategoryId> {
        self.by_name.get(name.trim_end_matches('/')).copied()
    }

    pub fn category_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn document_count(&self) -> usize {
        self.texts.len()
    }

    pub fn document_text(&self, id: &str) -> Option<&str> {
        self.texts.get(id).map(|s| s.as_str())
    }

    /// all documents with their text, in first-seen order
    pub fn documents(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.texts.iter().map(|(id, text)| (id.as_str(), text.as_str()))
    }

    /// categories a document is directly attached to
    pub fn document_categories(&self, id: &str) -> &[CategoryId] {
        self.doc_categories.get(id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Category itself, then its parent, up to the root
    pub fn ancestors(&self, id: CategoryId) -> impl Iterator<Item = CategoryId> + '_ {
        std::iter::successors(Some(id), move |cur| self.nodes.get(*cur).and_then(|c| c.parent))
    }

    /// Pre-order walk of the subtree under `id`, children in insertion order
    pub fn subtree(&self, id: CategoryId) -> Vec<CategoryId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(cur) = stack.pop() {
            if let Some(node) = self.nodes.get(cur) {
                out.push(cur);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Get or create the category at `path`, creating missing ancestors.
    pub fn add_category(&mut self, path: &str) -> Result<CategoryId> {
        let path = path.trim().trim_end_matches('/');
        if path.is_empty() || path.split('/').any(|seg| seg.trim().is_empty()) {
            return Err(ClassifierError::invalid_argument(format!("invalid category path `{path}`")));
        }
        if let Some(id) = self.by_name.get(path) {
            return Ok(*id);
        }
        let mut parent: Option<CategoryId> = None;
        let mut end = 0;
        for (i, seg) in path.split('/').enumerate() {
            end += if i == 0 { seg.len() } else { seg.len() + 1 };
            let prefix = &path[..end];
            parent = Some(match self.by_name.get(prefix) {
                Some(id) => *id,
                None => self.alloc_node(prefix, parent)?,
            });
        }
        parent.ok_or_else(|| ClassifierError::invalid_argument(format!("invalid category path `{path}`")))
    }

    fn alloc_node(&mut self, name: &str, parent: Option<CategoryId>) -> Result<CategoryId> {
        // 根は 1 つだけ
        if let (None, Some(root)) = (parent, self.root) {
            let root_name = self.nodes.get(root).map(|c| c.name.as_str()).unwrap_or_default();
            return Err(ClassifierError::invalid_argument(format!(
                "category `{name}` is outside the root `{root_name}`"
            )));
        }
        let id = self.nodes.alloc(Category {
            name: name.to_string(),
            parent,
            children: Vec::new(),
            documents: Vec::new(),
        });
        match parent {
            Some(p) => {
                if let Some(node) = self.nodes.get_mut(p) {
                    node.children.push(id);
                }
            }
            None => self.root = Some(id),
        }
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }

    /// Attach a document to a category (created if missing).
    /// Attaching the same document to a second category keeps the first text.
    pub fn attach_document(&mut self, category: &str, doc_id: &str, text: &str) -> Result<CategoryId> {
        if doc_id.is_empty() {
            return Err(ClassifierError::invalid_argument("empty document id"));
        }
        let cat = self.add_category(category)?;
        let attached = self.doc_categories.entry(doc_id.to_string()).or_default();
        if attached.contains(&cat) {
            return Ok(cat);
        }
        attached.push(cat);
        if let Some(node) = self.nodes.get_mut(cat) {
            node.documents.push(doc_id.to_string());
        }
        self.texts.entry(doc_id.to_string()).or_insert_with(|| text.to_string());
        Ok(cat)
    }

    /// Parse the line format:
    ///
    /// ```text
    /// # comment
    /// Top/Sports
    /// Top/Sports/Basketball<TAB>doc-17<TAB>NBA scores and schedules
    /// ```
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut taxonomy = Taxonomy::new();
        for (idx, line) in reader.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.map_err(|e| ClassifierError::io(format!("reading taxonomy line {line_no}"), e))?;
            let line = line.trim_end_matches(['\r', '\n']);
            if line.trim().is_empty() || line.trim_start().starts_with('#') {
                continue;
            }
            let mut fields = line.splitn(3, '\t');
            let category = fields.next().unwrap_or_default().trim();
            let result = match (fields.next(), fields.next()) {
                (None, _) => taxonomy.add_category(category).map(|_| ()),
                (Some(doc_id), text) => taxonomy
                    .attach_document(category, doc_id.trim(), text.unwrap_or_default().trim())
                    .map(|_| ()),
            };
            result.map_err(|e| match e {
                ClassifierError::InvalidArgument(reason) => ClassifierError::malformed_taxonomy(line_no, reason),
                other => other,
            })?;
        }
        Ok(taxonomy)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .map_err(|e| ClassifierError::io(format!("opening taxonomy {}", path.display()), e))?;
        let taxonomy = Self::from_reader(BufReader::new(file))?;
        info!(
            path = %path.display(),
            categories = taxonomy.category_count(),
            documents = taxonomy.document_count(),
            "taxonomy loaded"
        );
        Ok(taxonomy)
    }
}
