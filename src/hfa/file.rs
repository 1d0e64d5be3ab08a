use super::consts::*;
use super::dictionary::Dictionary;
use super::entry::Node;
use super::error::{HfaError, HfaResult};
use crate::common::binary::{parse_windows1252_string, read_u16_le, read_u32_le};
use bytes::Bytes;
use fixedbitset::FixedBitSet;
use smallvec::SmallVec;
use std::path::Path;
use tracing::{debug, warn};
use zerocopy::{FromBytes, LE, U32};
use zerocopy_derive::FromBytes as DeriveFromBytes;

/// Raw HFA entry record (124 bytes)
///
/// This represents the on-disk `Ehfa_Entry` layout.
#[derive(Debug, Clone, DeriveFromBytes)]
#[repr(C)]
struct RawEntry {
    /// Next sibling entry
    next: U32<LE>,
    /// Previous sibling entry
    prev: U32<LE>,
    /// Parent entry
    parent: U32<LE>,
    /// First child entry
    child: U32<LE>,
    /// Start of the entry's data
    data: U32<LE>,
    /// Size of the entry's data
    data_size: U32<LE>,
    /// Entry name (NUL padded)
    name: [u8; ENTRY_NAME_LEN],
    /// Entry type name, a key into the data dictionary (NUL padded)
    type_name: [u8; ENTRY_TYPE_LEN],
    /// Modification time
    mod_time: U32<LE>,
}

/// An entry of the HFA tree with its children resolved.
#[derive(Debug, Clone)]
pub struct Entry {
    /// File offset of the entry record
    pub offset: u32,
    /// Entry name
    pub name: String,
    /// Entry type name
    pub type_name: String,
    /// File offset of the entry data
    pub data_offset: u32,
    /// Size of the entry data in bytes
    pub data_size: u32,
    /// Modification time
    pub mod_time: u32,
    /// Index of the parent entry
    pub parent: Option<usize>,
    /// Indexes of the child entries in file order
    pub children: SmallVec<[usize; 4]>,
    child_ptr: u32,
}

/// A parsed HFA (Erdas Imagine) file.
///
/// The whole file image is held in memory; entry data is sliced out of it
/// only when a node is loaded.
#[derive(Debug)]
pub struct HfaFile {
    data: Bytes,
    version: u32,
    dictionary: Dictionary,
    entries: Vec<Entry>,
}

/// Check whether a byte buffer starts with the HFA header tag.
pub fn is_hfa_file(data: &[u8]) -> bool {
    data.len() >= HEADER_TAG.len() && &data[..HEADER_TAG.len()] == HEADER_TAG
}

impl HfaFile {
    /// Read and parse an HFA file from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> HfaResult<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(data)
    }

    /// Parse an HFA file image.
    pub fn from_bytes(data: impl Into<Bytes>) -> HfaResult<Self> {
        let data: Bytes = data.into();
        if !is_hfa_file(&data) {
            return Err(HfaError::NotHfaFile);
        }

        let header_ptr = read_u32_le(&data, HEADER_PTR_OFFSET)? as usize;
        let version = read_u32_le(&data, header_ptr)?;
        let root_ptr = read_u32_le(&data, header_ptr + 8)?;
        let entry_header_len = read_u16_le(&data, header_ptr + 12)?;
        let dictionary_ptr = read_u32_le(&data, header_ptr + 14)? as usize;

        debug!(
            version,
            root_ptr, entry_header_len, dictionary_ptr, "read HFA file record"
        );

        let dictionary_text = data.get(dictionary_ptr..).ok_or_else(|| {
            HfaError::InvalidFormat(format!(
                "dictionary pointer {} beyond end of file",
                dictionary_ptr
            ))
        })?;
        let dictionary = Dictionary::parse(dictionary_text)?;

        let entries = load_entries(&data, root_ptr)?;

        Ok(Self {
            data,
            version,
            dictionary,
            entries,
        })
    }

    #[inline]
    pub fn version(&self) -> u32 {
        self.version
    }

    #[inline]
    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    /// The complete file image.
    #[inline]
    pub fn bytes(&self) -> &Bytes {
        &self.data
    }

    /// Number of entries reachable from the root.
    #[inline]
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub(crate) fn entry(&self, index: usize) -> &Entry {
        &self.entries[index]
    }

    /// The root entry.
    #[inline]
    pub fn root(&self) -> Node<'_> {
        Node::new(self, 0)
    }

    pub fn node(&self, index: usize) -> Option<Node<'_>> {
        (index < self.entries.len()).then(|| Node::new(self, index))
    }

    /// Depth-first search of the whole tree for an entry named `name`.
    pub fn find(&self, name: &str) -> Option<Node<'_>> {
        self.root().find(name)
    }
}

fn read_entry(data: &[u8], offset: u32, parent: Option<usize>) -> HfaResult<Entry> {
    let start = offset as usize;
    let record = data
        .get(start..start + ENTRY_RECORD_SIZE)
        .ok_or_else(|| HfaError::InvalidFormat(format!("entry at {} beyond end of file", offset)))?;
    let raw = RawEntry::read_from_bytes(record)
        .map_err(|_| HfaError::InvalidFormat(format!("unreadable entry at {}", offset)))?;

    Ok(Entry {
        offset,
        name: parse_windows1252_string(&raw.name),
        type_name: parse_windows1252_string(&raw.type_name),
        data_offset: raw.data.get(),
        data_size: raw.data_size.get(),
        mod_time: raw.mod_time.get(),
        parent,
        children: SmallVec::new(),
        child_ptr: raw.child.get(),
    })
}

fn next_ptr(data: &[u8], offset: u32) -> HfaResult<u32> {
    Ok(read_u32_le(data, offset as usize)?)
}

/// Materialize the first-child / next-sibling chains into an arena.
///
/// Every entry offset is visited at most once, so cyclic or self-referencing
/// pointers end the affected chain instead of looping.
fn load_entries(data: &[u8], root_ptr: u32) -> HfaResult<Vec<Entry>> {
    if root_ptr == NULL_PTR {
        return Err(HfaError::InvalidFormat("null root entry pointer".to_string()));
    }

    let mut visited = FixedBitSet::with_capacity(data.len());
    let mut entries = vec![read_entry(data, root_ptr, None)?];
    visited.insert(root_ptr as usize);

    let mut pending = vec![0usize];
    while let Some(parent) = pending.pop() {
        let mut ptr = entries[parent].child_ptr;
        let mut children: SmallVec<[usize; 4]> = SmallVec::new();

        while ptr != NULL_PTR {
            if (ptr as usize) >= data.len() || visited.contains(ptr as usize) {
                warn!(
                    parent = %entries[parent].name,
                    ptr, "entry chain points outside the file or loops back, truncating"
                );
                break;
            }
            visited.insert(ptr as usize);

            let entry = match read_entry(data, ptr, Some(parent)) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(parent = %entries[parent].name, ptr, error = %e, "skipping unreadable entry");
                    break;
                },
            };
            let next = next_ptr(data, ptr).unwrap_or(NULL_PTR);

            children.push(entries.len());
            entries.push(entry);
            ptr = next;
        }

        // Reverse so the first child is expanded first.
        pending.extend(children.iter().rev().copied());
        entries[parent].children = children;
    }

    Ok(entries)
}
