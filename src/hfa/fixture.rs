//! In-memory HFA image builder used by the test suites.

use super::consts::*;

/// Little-endian record data writer following HFA field encodings.
#[derive(Debug, Default)]
pub(crate) struct DataWriter {
    buf: Vec<u8>,
}

impl DataWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u16(&mut self, v: u16) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn u32(&mut self, v: u32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn i32(&mut self, v: i32) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn f64(&mut self, v: f64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    /// Pointer prefix: `count`, then an (unused) offset.
    pub fn pointer(&mut self, count: u32) -> &mut Self {
        self.u32(count).u32(0)
    }

    /// `*c` string, NUL terminated.
    pub fn string(&mut self, s: &str) -> &mut Self {
        self.pointer(s.len() as u32 + 1);
        self.buf.extend_from_slice(s.as_bytes());
        self.buf.push(0);
        self
    }

    /// `*d` array.
    pub fn f64_array(&mut self, values: &[f64]) -> &mut Self {
        self.pointer(values.len() as u32);
        for &v in values {
            self.f64(v);
        }
        self
    }

    /// `*b` basedata holding f64 elements.
    pub fn matrix(&mut self, rows: i32, columns: i32, values: &[f64]) -> &mut Self {
        self.pointer(1).i32(rows).i32(columns);
        self.buf.extend_from_slice(&EPT_F64.to_le_bytes());
        self.buf.extend_from_slice(&0i16.to_le_bytes());
        for &v in values {
            self.f64(v);
        }
        self
    }

    pub fn bytes(&mut self, data: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(data);
        self
    }

    pub fn into_bytes(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }
}

#[derive(Debug)]
struct NodeSpec {
    name: String,
    type_name: String,
    data: Vec<u8>,
    children: Vec<usize>,
    parent: Option<usize>,
    corrupt: bool,
}

/// Builds a complete HFA file image: header, entry tree, data and dictionary.
#[derive(Debug)]
pub(crate) struct HfaBuilder {
    dictionary: String,
    nodes: Vec<NodeSpec>,
}

impl HfaBuilder {
    /// Start an image whose root entry is `root` / `root`.
    pub fn new(dictionary: &str) -> Self {
        Self {
            dictionary: dictionary.to_string(),
            nodes: vec![NodeSpec {
                name: "root".to_string(),
                type_name: "root".to_string(),
                data: Vec::new(),
                children: Vec::new(),
                parent: None,
                corrupt: false,
            }],
        }
    }

    pub const ROOT: usize = 0;

    /// Append a child entry under `parent`, returning its handle.
    pub fn add(&mut self, parent: usize, name: &str, type_name: &str, data: Vec<u8>) -> usize {
        let idx = self.nodes.len();
        self.nodes.push(NodeSpec {
            name: name.to_string(),
            type_name: type_name.to_string(),
            data,
            children: Vec::new(),
            parent: Some(parent),
            corrupt: false,
        });
        self.nodes[parent].children.push(idx);
        idx
    }

    /// Append a child whose data pointer lies outside the file.
    pub fn add_corrupt(&mut self, parent: usize, name: &str, type_name: &str) -> usize {
        let idx = self.add(parent, name, type_name, Vec::new());
        self.nodes[idx].corrupt = true;
        idx
    }

    pub fn build(&self) -> Vec<u8> {
        let file_record = HEADER_PTR_OFFSET + 4;
        let first_entry = file_record + FILE_RECORD_SIZE;
        let entry_offset = |i: usize| (first_entry + i * ENTRY_RECORD_SIZE) as u32;
        let data_start = first_entry + self.nodes.len() * ENTRY_RECORD_SIZE;

        let mut data_offsets = Vec::with_capacity(self.nodes.len());
        let mut cursor = data_start;
        for node in &self.nodes {
            data_offsets.push(cursor as u32);
            cursor += node.data.len();
        }
        let dictionary_ptr = cursor as u32;

        let mut out = Vec::with_capacity(cursor + self.dictionary.len() + 1);
        out.extend_from_slice(HEADER_TAG);
        out.extend_from_slice(&(file_record as u32).to_le_bytes());

        // Ehfa_File
        out.extend_from_slice(&1u32.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.extend_from_slice(&entry_offset(0).to_le_bytes());
        out.extend_from_slice(&(ENTRY_RECORD_SIZE as u16).to_le_bytes());
        out.extend_from_slice(&dictionary_ptr.to_le_bytes());

        for (i, node) in self.nodes.iter().enumerate() {
            let siblings = node
                .parent
                .map(|p| self.nodes[p].children.as_slice())
                .unwrap_or(&[]);
            let pos = siblings.iter().position(|&s| s == i);
            let next = pos
                .and_then(|p| siblings.get(p + 1))
                .map(|&s| entry_offset(s))
                .unwrap_or(NULL_PTR);
            let prev = pos
                .and_then(|p| p.checked_sub(1))
                .map(|p| entry_offset(siblings[p]))
                .unwrap_or(NULL_PTR);
            let parent = node.parent.map(entry_offset).unwrap_or(NULL_PTR);
            let child = node
                .children
                .first()
                .map(|&c| entry_offset(c))
                .unwrap_or(NULL_PTR);
            let (data, size) = if node.corrupt {
                (u32::MAX - 16, 64)
            } else if node.data.is_empty() {
                (NULL_PTR, 0)
            } else {
                (data_offsets[i], node.data.len() as u32)
            };

            for v in [next, prev, parent, child, data, size] {
                out.extend_from_slice(&v.to_le_bytes());
            }
            let mut name = [0u8; ENTRY_NAME_LEN];
            name[..node.name.len()].copy_from_slice(node.name.as_bytes());
            out.extend_from_slice(&name);
            let mut type_name = [0u8; ENTRY_TYPE_LEN];
            type_name[..node.type_name.len()].copy_from_slice(node.type_name.as_bytes());
            out.extend_from_slice(&type_name);
            out.extend_from_slice(&0u32.to_le_bytes());
        }

        for node in &self.nodes {
            out.extend_from_slice(&node.data);
        }

        out.extend_from_slice(self.dictionary.as_bytes());
        out.push(0);
        out
    }
}
