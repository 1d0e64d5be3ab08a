//! Typed access to entries of an [`HfaFile`].

use super::dictionary::HfaType;
use super::error::{HfaError, HfaResult};
use super::field::{FieldCursor, FieldValue};
use super::file::{Entry, HfaFile};
use std::fmt;

/// A borrowed view of one entry in the tree.
#[derive(Clone, Copy)]
pub struct Node<'a> {
    file: &'a HfaFile,
    index: usize,
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("index", &self.index)
            .field("name", &self.name())
            .field("type", &self.type_name())
            .finish()
    }
}

impl<'a> Node<'a> {
    pub(crate) fn new(file: &'a HfaFile, index: usize) -> Self {
        Self { file, index }
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn file(&self) -> &'a HfaFile {
        self.file
    }

    #[inline]
    pub fn entry(&self) -> &'a Entry {
        self.file.entry(self.index)
    }

    #[inline]
    pub fn name(&self) -> &'a str {
        &self.entry().name
    }

    #[inline]
    pub fn type_name(&self) -> &'a str {
        &self.entry().type_name
    }

    pub fn parent(&self) -> Option<Node<'a>> {
        self.entry().parent.map(|p| Node::new(self.file, p))
    }

    /// Children in file order.
    pub fn children(&self) -> impl Iterator<Item = Node<'a>> + 'a {
        let file = self.file;
        self.entry()
            .children
            .iter()
            .map(move |&idx| Node::new(file, idx))
    }

    #[inline]
    pub fn child_count(&self) -> usize {
        self.entry().children.len()
    }

    /// Depth-first search of this subtree (including `self`) by entry name.
    pub fn find(&self, name: &str) -> Option<Node<'a>> {
        let mut stack = vec![*self];
        while let Some(node) = stack.pop() {
            if node.name() == name {
                return Some(node);
            }
            let children: Vec<_> = node.children().collect();
            stack.extend(children.into_iter().rev());
        }
        None
    }

    /// The raw data span of this entry: `(bytes, file offset, size)`.
    pub fn raw_data(&self) -> HfaResult<(&'a [u8], u32, u32)> {
        let entry = self.entry();
        let start = entry.data_offset as usize;
        let end = start.checked_add(entry.data_size as usize);
        let bytes = end
            .and_then(|end| self.file.bytes().get(start..end))
            .ok_or_else(|| HfaError::DataOutOfRange {
                entry: entry.name.clone(),
                offset: entry.data_offset,
                size: entry.data_size,
            })?;
        Ok((bytes, entry.data_offset, entry.data_size))
    }

    /// Validate this entry's data and bind it to its dictionary type.
    pub fn load_data(&self) -> HfaResult<NodeData<'a>> {
        let (data, _, _) = self.raw_data()?;
        let ty = self.file.dictionary().require(self.type_name())?;
        Ok(NodeData {
            node: *self,
            ty,
            data,
        })
    }

    /// Indented tree listing of this subtree.
    pub fn dump(&self) -> TreeDump<'a> {
        TreeDump { node: *self }
    }
}

/// An entry whose data has been loaded and typed.
#[derive(Debug, Clone, Copy)]
pub struct NodeData<'a> {
    node: Node<'a>,
    ty: &'a HfaType,
    data: &'a [u8],
}

impl<'a> NodeData<'a> {
    #[inline]
    pub fn node(&self) -> Node<'a> {
        self.node
    }

    #[inline]
    pub fn type_def(&self) -> &'a HfaType {
        self.ty
    }

    #[inline]
    pub fn bytes(&self) -> &'a [u8] {
        self.data
    }

    /// Cursor positioned at the first field of the record.
    pub fn cursor(&self) -> FieldCursor<'a> {
        FieldCursor::new(self.node.file().dictionary(), self.ty, self.data)
    }

    /// Resolve a field path; `Ok(None)` if the type has no such field.
    pub fn field(&self, path: &str) -> HfaResult<Option<FieldValue>> {
        self.ty.extract(self.node.file().dictionary(), self.data, path)
    }

    fn missing(&self, path: &str) -> HfaError {
        HfaError::FieldNotFound {
            type_name: self.ty.name().to_string(),
            field: path.to_string(),
        }
    }

    pub fn get_int_field(&self, path: &str) -> HfaResult<i64> {
        self.field(path)?
            .and_then(|v| v.as_i64())
            .ok_or_else(|| self.missing(path))
    }

    pub fn get_double_field(&self, path: &str) -> HfaResult<f64> {
        self.field(path)?
            .and_then(|v| v.as_f64())
            .ok_or_else(|| self.missing(path))
    }

    pub fn get_string_field(&self, path: &str) -> HfaResult<String> {
        self.find_string_field(path)?
            .ok_or_else(|| self.missing(path))
    }

    /// String field that may legitimately be absent (e.g. an empty description).
    pub fn find_string_field(&self, path: &str) -> HfaResult<Option<String>> {
        Ok(self.field(path)?.map(FieldValue::into_string))
    }
}

/// `Display` adapter printing a subtree as an indented listing.
pub struct TreeDump<'a> {
    node: Node<'a>,
}

impl fmt::Display for TreeDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut stack = vec![(self.node, 0usize)];
        while let Some((node, depth)) = stack.pop() {
            let entry = node.entry();
            writeln!(
                f,
                "{:indent$}+ {}({}) @ {} + {} @ {}",
                "",
                entry.name,
                entry.type_name,
                entry.offset,
                entry.data_size,
                entry.data_offset,
                indent = depth * 2
            )?;
            let children: Vec<_> = node.children().collect();
            stack.extend(children.into_iter().rev().map(|c| (c, depth + 1)));
        }
        Ok(())
    }
}
