//! HFA data dictionary parsing.
//!
//! The dictionary is a single ASCII string describing every record type
//! stored in the file:
//!
//! ```text
//! {1:lversion,1:LfreeList,1:LrootEntryPtr,1:sentryHeaderLength,1:LdictionaryPtr,}Ehfa_File,
//! {1:oEprj_Coordinate,center,1:dwidth,1:dheight,1:dorientation,}Eant_Rectangle,
//! .
//! ```
//!
//! Each field is `<count>:[*|p]<item code>[extra]<name>,` where `extra` is an
//! object type name for `o`, an inline `{...}Type,` definition for `x`, or an
//! enum table `n:a,b,...,` for `e`.

use super::consts::{DICTIONARY_END, MAX_TYPE_NESTING};
use super::error::{HfaError, HfaResult};
use memchr::memchr;
use std::collections::HashMap;
use std::fmt;

/// Item type of a dictionary field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemType {
    /// `c`: 8-bit character
    Char,
    /// `C`: 8-bit unsigned
    UChar,
    /// `e`: 16-bit enumeration index
    Enum,
    /// `s`: 16-bit unsigned
    U16,
    /// `S`: 16-bit signed
    I16,
    /// `t`: 32-bit unsigned time
    Time,
    /// `l`: 32-bit unsigned
    U32,
    /// `L`: 32-bit signed
    I32,
    /// `f`: 32-bit float
    F32,
    /// `d`: 64-bit float
    F64,
    /// `m`: 64-bit complex
    Complex64,
    /// `M`: 128-bit complex
    Complex128,
    /// `b`: basedata matrix block
    BaseData,
    /// `o` / `x`: nested object
    Object,
    /// Any other code; parsed but not decodable
    Other(u8),
}

impl ItemType {
    /// Map a dictionary item code to its type.
    pub fn from_code(code: u8) -> Self {
        match code {
            b'c' => ItemType::Char,
            b'C' => ItemType::UChar,
            b'e' => ItemType::Enum,
            b's' => ItemType::U16,
            b'S' => ItemType::I16,
            b't' => ItemType::Time,
            b'l' => ItemType::U32,
            b'L' => ItemType::I32,
            b'f' => ItemType::F32,
            b'd' => ItemType::F64,
            b'm' => ItemType::Complex64,
            b'M' => ItemType::Complex128,
            b'b' => ItemType::BaseData,
            b'o' | b'x' => ItemType::Object,
            other => ItemType::Other(other),
        }
    }

    /// Dictionary code of this item type.
    pub fn code(self) -> char {
        match self {
            ItemType::Char => 'c',
            ItemType::UChar => 'C',
            ItemType::Enum => 'e',
            ItemType::U16 => 's',
            ItemType::I16 => 'S',
            ItemType::Time => 't',
            ItemType::U32 => 'l',
            ItemType::I32 => 'L',
            ItemType::F32 => 'f',
            ItemType::F64 => 'd',
            ItemType::Complex64 => 'm',
            ItemType::Complex128 => 'M',
            ItemType::BaseData => 'b',
            ItemType::Object => 'o',
            ItemType::Other(c) => c as char,
        }
    }

    /// Size in bytes of one item, for scalar item types.
    #[inline]
    pub fn size(self) -> Option<usize> {
        match self {
            ItemType::Char | ItemType::UChar => Some(1),
            ItemType::Enum | ItemType::U16 | ItemType::I16 => Some(2),
            ItemType::Time | ItemType::U32 | ItemType::I32 | ItemType::F32 => Some(4),
            ItemType::F64 | ItemType::Complex64 => Some(8),
            ItemType::Complex128 => Some(16),
            ItemType::BaseData | ItemType::Object | ItemType::Other(_) => None,
        }
    }
}

/// A single field of a dictionary type.
#[derive(Debug, Clone, PartialEq)]
pub struct HfaField {
    pub(crate) name: String,
    pub(crate) item_count: usize,
    pub(crate) pointer: bool,
    pub(crate) item_type: ItemType,
    pub(crate) object_type: Option<String>,
    pub(crate) enum_names: Vec<String>,
}

impl HfaField {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn item_type(&self) -> ItemType {
        self.item_type
    }

    /// Declared item count. For pointer fields the real count is stored in
    /// each instance.
    #[inline]
    pub fn declared_count(&self) -> usize {
        self.item_count
    }

    /// Whether the field carries the 8-byte `count, offset` prefix.
    #[inline]
    pub fn is_pointer(&self) -> bool {
        self.pointer
    }

    #[inline]
    pub fn object_type(&self) -> Option<&str> {
        self.object_type.as_deref()
    }

    #[inline]
    pub fn enum_names(&self) -> &[String] {
        &self.enum_names
    }
}

impl fmt::Display for HfaField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ptr = if self.pointer { "*" } else { " " };
        write!(
            f,
            "    {:<19} {}{} [{}]",
            self.name,
            ptr,
            self.item_type.code(),
            self.item_count
        )?;
        if let Some(obj) = &self.object_type {
            write!(f, " {}", obj)?;
        }
        if !self.enum_names.is_empty() {
            write!(f, " {{{}}}", self.enum_names.join(", "))?;
        }
        Ok(())
    }
}

/// A record type definition: an ordered list of fields.
#[derive(Debug, Clone, PartialEq)]
pub struct HfaType {
    pub(crate) name: String,
    pub(crate) fields: Vec<HfaField>,
}

impl HfaType {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fields in declaration order.
    #[inline]
    pub fn fields(&self) -> &[HfaField] {
        &self.fields
    }

    /// Look up a field definition by name.
    pub fn field(&self, name: &str) -> Option<&HfaField> {
        self.fields.iter().find(|f| f.name == name)
    }
}

impl fmt::Display for HfaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "HFAType {}", self.name)?;
        for field in &self.fields {
            writeln!(f, "{}", field)?;
        }
        Ok(())
    }
}

/// Parsed data dictionary.
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    types: Vec<HfaType>,
    by_name: HashMap<String, usize>,
}

impl Dictionary {
    /// Parse dictionary text. Parsing stops at the `.` terminator, a NUL byte
    /// or the end of input.
    pub fn parse(text: &[u8]) -> HfaResult<Self> {
        let mut parser = Parser {
            text,
            pos: 0,
            depth: 0,
        };
        let mut dict = Dictionary::default();

        loop {
            parser.skip_whitespace();
            match parser.peek() {
                None | Some(0) | Some(DICTIONARY_END) => break,
                Some(b'{') => {
                    let ty = parser.parse_type(&mut dict)?;
                    dict.insert(ty);
                },
                Some(other) => {
                    return Err(HfaError::Dictionary(format!(
                        "unexpected '{}' at offset {}",
                        other as char, parser.pos
                    )));
                },
            }
        }

        Ok(dict)
    }

    fn insert(&mut self, ty: HfaType) {
        // First definition wins; inline definitions may repeat a type.
        if !self.by_name.contains_key(&ty.name) {
            self.by_name.insert(ty.name.clone(), self.types.len());
            self.types.push(ty);
        }
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&HfaType> {
        self.by_name.get(name).map(|&idx| &self.types[idx])
    }

    /// Look up a type, failing with [`HfaError::UnknownType`].
    pub fn require(&self, name: &str) -> HfaResult<&HfaType> {
        self.get(name)
            .ok_or_else(|| HfaError::UnknownType(name.to_string()))
    }

    /// Types in definition order.
    pub fn types(&self) -> impl Iterator<Item = &HfaType> {
        self.types.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl fmt::Display for Dictionary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for ty in &self.types {
            writeln!(f, "{}", ty)?;
        }
        Ok(())
    }
}

struct Parser<'a> {
    text: &'a [u8],
    pos: usize,
    /// Current `x{...}` inline definition depth
    depth: usize,
}

impl<'a> Parser<'a> {
    #[inline]
    fn peek(&self) -> Option<u8> {
        self.text.get(self.pos).copied()
    }

    fn bump(&mut self) -> HfaResult<u8> {
        let b = self
            .peek()
            .ok_or_else(|| HfaError::Dictionary("unexpected end of dictionary".to_string()))?;
        self.pos += 1;
        Ok(b)
    }

    fn expect(&mut self, expected: u8) -> HfaResult<()> {
        let pos = self.pos;
        match self.bump()? {
            b if b == expected => Ok(()),
            b => Err(HfaError::Dictionary(format!(
                "expected '{}' but found '{}' at offset {}",
                expected as char, b as char, pos
            ))),
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|b| b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    /// Consume text up to (and including) `delim`, returning the text before it.
    fn take_until(&mut self, delim: u8) -> HfaResult<&'a str> {
        let text: &'a [u8] = self.text;
        let rest = &text[self.pos..];
        let len = memchr(delim, rest).ok_or_else(|| {
            HfaError::Dictionary(format!(
                "missing '{}' after offset {}",
                delim as char, self.pos
            ))
        })?;
        let token = std::str::from_utf8(&rest[..len])
            .map_err(|_| HfaError::Dictionary(format!("non-ASCII text at offset {}", self.pos)))?;
        self.pos += len + 1;
        Ok(token)
    }

    fn take_number(&mut self, delim: u8) -> HfaResult<usize> {
        let token = self.take_until(delim)?;
        token
            .trim()
            .parse::<usize>()
            .map_err(|_| HfaError::Dictionary(format!("invalid count '{}'", token)))
    }

    /// `{field,field,...}Name,`
    fn parse_type(&mut self, dict: &mut Dictionary) -> HfaResult<HfaType> {
        self.expect(b'{')?;
        let mut fields = Vec::new();
        loop {
            match self.peek() {
                Some(b'}') => {
                    self.pos += 1;
                    break;
                },
                Some(_) => fields.push(self.parse_field(dict)?),
                None => {
                    return Err(HfaError::Dictionary(
                        "unterminated type definition".to_string(),
                    ));
                },
            }
        }
        let name = self.take_until(b',')?.to_string();
        Ok(HfaType { name, fields })
    }

    fn parse_field(&mut self, dict: &mut Dictionary) -> HfaResult<HfaField> {
        let item_count = self.take_number(b':')?;

        let pointer = matches!(self.peek(), Some(b'*') | Some(b'p'));
        if pointer {
            self.pos += 1;
        }

        let code = self.bump()?;
        let item_type = ItemType::from_code(code);
        let mut object_type = None;
        let mut enum_names = Vec::new();

        match code {
            b'o' => object_type = Some(self.take_until(b',')?.to_string()),
            b'x' if self.peek() == Some(b'{') => {
                if self.depth >= MAX_TYPE_NESTING {
                    return Err(HfaError::Dictionary(format!(
                        "inline types nested deeper than {} at offset {}",
                        MAX_TYPE_NESTING, self.pos
                    )));
                }
                self.depth += 1;
                let inline = self.parse_type(dict);
                self.depth -= 1;
                let inline = inline?;
                object_type = Some(inline.name.clone());
                dict.insert(inline);
            },
            b'x' => object_type = Some(self.take_until(b',')?.to_string()),
            b'e' => {
                let count = self.take_number(b':')?;
                // Each name needs at least a byte and its comma.
                enum_names.reserve(count.min(self.text.len().saturating_sub(self.pos) / 2));
                for _ in 0..count {
                    enum_names.push(self.take_until(b',')?.to_string());
                }
            },
            _ => {},
        }

        let name = self.take_until(b',')?.to_string();

        Ok(HfaField {
            name,
            item_count,
            pointer,
            item_type,
            object_type,
            enum_names,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &[u8] = b"{1:lversion,1:LfreeList,1:LrootEntryPtr,1:sentryHeaderLength,1:LdictionaryPtr,}Ehfa_File,\
{1:dx,1:dy,}Eprj_Coordinate,\
{1:e2:EPRJ_INTERNAL,EPRJ_EXTERNAL,proType,1:lproNumber,0:pcproName,0:pdproParams,}Eprj_ProParameters,\
{1:oEprj_Coordinate,center,1:dwidth,}Eant_Rectangle,.";

    #[test]
    fn test_parse_types_in_order() {
        let dict = Dictionary::parse(SAMPLE).unwrap();
        let names: Vec<_> = dict.types().map(|t| t.name()).collect();
        assert_eq!(
            names,
            ["Ehfa_File", "Eprj_Coordinate", "Eprj_ProParameters", "Eant_Rectangle"]
        );
        assert_eq!(dict.require("Ehfa_File").unwrap().fields().len(), 5);
    }

    #[test]
    fn test_parse_enum_and_pointer_fields() {
        let dict = Dictionary::parse(SAMPLE).unwrap();
        let pro = dict.get("Eprj_ProParameters").unwrap();

        let pro_type = pro.field("proType").unwrap();
        assert_eq!(pro_type.item_type(), ItemType::Enum);
        assert_eq!(pro_type.enum_names(), ["EPRJ_INTERNAL", "EPRJ_EXTERNAL"]);

        let pro_name = pro.field("proName").unwrap();
        assert!(pro_name.is_pointer());
        assert_eq!(pro_name.item_type(), ItemType::Char);

        let params = pro.field("proParams").unwrap();
        assert!(params.is_pointer());
        assert_eq!(params.item_type(), ItemType::F64);
    }

    #[test]
    fn test_parse_object_field() {
        let dict = Dictionary::parse(SAMPLE).unwrap();
        let rect = dict.get("Eant_Rectangle").unwrap();
        let center = rect.field("center").unwrap();
        assert_eq!(center.item_type(), ItemType::Object);
        assert_eq!(center.object_type(), Some("Eprj_Coordinate"));
        assert!(!center.is_pointer());
    }

    #[test]
    fn test_inline_definition_is_registered() {
        let text = b"{1:x{1:dx,1:dy,}Inline_Pt,pt,1:lflags,}Holder,.";
        let dict = Dictionary::parse(text).unwrap();
        assert!(dict.get("Inline_Pt").is_some());
        let holder = dict.get("Holder").unwrap();
        assert_eq!(holder.field("pt").unwrap().object_type(), Some("Inline_Pt"));
        assert_eq!(holder.fields().len(), 2);
    }

    #[test]
    fn test_unknown_item_code_is_kept() {
        let dict = Dictionary::parse(b"{1:4bits,}Packed,.").unwrap();
        let field = dict.get("Packed").unwrap().field("bits").unwrap();
        assert_eq!(field.item_type(), ItemType::Other(b'4'));
        assert_eq!(field.item_type().size(), None);
    }

    #[test]
    fn test_truncated_dictionary_fails() {
        assert!(matches!(
            Dictionary::parse(b"{1:dx,1:d"),
            Err(HfaError::Dictionary(_))
        ));
        assert!(Dictionary::parse(b"garbage").is_err());
    }

    #[test]
    fn test_oversized_enum_count_fails() {
        assert!(matches!(
            Dictionary::parse(b"{1:e99999999999999999:a,b,kind,}T,."),
            Err(HfaError::Dictionary(_))
        ));
    }

    #[test]
    fn test_inline_nesting_is_bounded() {
        fn nested(levels: usize) -> Vec<u8> {
            let mut text = Vec::new();
            text.extend_from_slice(b"{");
            for _ in 0..levels {
                text.extend_from_slice(b"1:x{");
            }
            text.extend_from_slice(b"1:lv,");
            for i in (0..levels).rev() {
                text.extend_from_slice(format!("}}T{},f,", i).as_bytes());
            }
            text.extend_from_slice(b"}Top,.");
            text
        }

        let dict = Dictionary::parse(&nested(MAX_TYPE_NESTING)).unwrap();
        assert!(dict.get("T0").is_some());
        assert!(dict.get("Top").is_some());

        assert!(matches!(
            Dictionary::parse(&nested(MAX_TYPE_NESTING + 1)),
            Err(HfaError::Dictionary(ref m)) if m.contains("nested")
        ));
        assert!(matches!(
            Dictionary::parse(&nested(10_000)),
            Err(HfaError::Dictionary(_))
        ));
    }

    #[test]
    fn test_missing_type_lookup() {
        let dict = Dictionary::parse(SAMPLE).unwrap();
        assert!(matches!(
            dict.require("Eant_Ellipse"),
            Err(HfaError::UnknownType(ref n)) if n == "Eant_Ellipse"
        ));
    }
}
