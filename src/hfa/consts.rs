/// Tag that must be at the beginning of every HFA file
pub const HEADER_TAG: &[u8; 16] = b"EHFA_HEADER_TAG\0";

/// Offset of the pointer to the `Ehfa_File` record
pub const HEADER_PTR_OFFSET: usize = 16;

/// Size of the `Ehfa_File` record
/// (version, freeList, rootEntryPtr: u32; entryHeaderLength: u16; dictionaryPtr: u32)
pub const FILE_RECORD_SIZE: usize = 18;

/// Size of a fixed `Ehfa_Entry` record
pub const ENTRY_RECORD_SIZE: usize = 124;

/// Length of the NUL-padded entry name
pub const ENTRY_NAME_LEN: usize = 64;

/// Length of the NUL-padded entry type name
pub const ENTRY_TYPE_LEN: usize = 32;

/// Null entry / data pointer
pub const NULL_PTR: u32 = 0;

/// Pointer fields (`*` or `p`) start with `count: u32, offset: u32`
pub const POINTER_PREFIX_SIZE: usize = 8;

/// Basedata header: rows: i32, columns: i32, data type: i16, object type: i16
pub const MATRIX_HEADER_SIZE: usize = 12;

/// Terminator of the data dictionary text
pub const DICTIONARY_END: u8 = b'.';

/// Nesting limit for object-in-object fields; guards against recursive
/// type definitions in corrupt dictionaries.
pub const MAX_TYPE_NESTING: usize = 16;

// Basedata element type codes (EPT_*)
/// 1-bit unsigned
pub const EPT_U1: i16 = 0;
/// 2-bit unsigned
pub const EPT_U2: i16 = 1;
/// 4-bit unsigned
pub const EPT_U4: i16 = 2;
/// 8-bit unsigned
pub const EPT_U8: i16 = 3;
/// 8-bit signed
pub const EPT_S8: i16 = 4;
/// 16-bit unsigned
pub const EPT_U16: i16 = 5;
/// 16-bit signed
pub const EPT_S16: i16 = 6;
/// 32-bit unsigned
pub const EPT_U32: i16 = 7;
/// 32-bit signed
pub const EPT_S32: i16 = 8;
/// 32-bit float
pub const EPT_F32: i16 = 9;
/// 64-bit float
pub const EPT_F64: i16 = 10;
/// 64-bit complex
pub const EPT_C64: i16 = 11;
/// 128-bit complex
pub const EPT_C128: i16 = 12;
