// BER (Basic Encoding Rules) element codec.
//
// Elements are held as a tree: a tag plus either primitive content octets or
// an ordered list of child elements. LDAP only ever uses single-octet tag
// numbers and definite lengths, so the 0x1F multi-octet tag form and the
// indefinite length form are rejected outright.

use bytes::Bytes;

use crate::error::BerError;

/// Universal tag numbers used by the LDAP grammar.
pub const BOOLEAN: u32 = 0x01;
pub const INTEGER: u32 = 0x02;
pub const OCTET_STRING: u32 = 0x04;
pub const NULL: u32 = 0x05;
pub const ENUMERATED: u32 = 0x0A;
pub const SEQUENCE: u32 = 0x10;
pub const SET: u32 = 0x11;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagClass {
    Universal,
    Application,
    Context,
    Private,
}

impl TagClass {
    fn bits(self) -> u8 {
        match self {
            TagClass::Universal => 0x00,
            TagClass::Application => 0x40,
            TagClass::Context => 0x80,
            TagClass::Private => 0xC0,
        }
    }

    fn from_bits(octet: u8) -> Self {
        match octet & 0xC0 {
            0x00 => TagClass::Universal,
            0x40 => TagClass::Application,
            0x80 => TagClass::Context,
            _ => TagClass::Private,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tag {
    pub class: TagClass,
    pub number: u32,
    pub constructed: bool,
}

impl Tag {
    pub const fn new(class: TagClass, number: u32, constructed: bool) -> Self {
        Self {
            class,
            number,
            constructed,
        }
    }

    pub const fn universal(number: u32) -> Self {
        Self::new(TagClass::Universal, number, false)
    }

    pub const fn application(number: u32) -> Self {
        Self::new(TagClass::Application, number, false)
    }

    pub const fn application_constructed(number: u32) -> Self {
        Self::new(TagClass::Application, number, true)
    }

    pub const fn context(number: u32) -> Self {
        Self::new(TagClass::Context, number, false)
    }

    pub const fn context_constructed(number: u32) -> Self {
        Self::new(TagClass::Context, number, true)
    }

    pub fn is_universal(&self, number: u32) -> bool {
        self.class == TagClass::Universal && self.number == number
    }

    pub fn is_context(&self, number: u32) -> bool {
        self.class == TagClass::Context && self.number == number
    }

    /// Single identifier octet. Only valid for tag numbers below 31, which is
    /// all the codec ever produces.
    fn identifier_octet(&self) -> u8 {
        let constructed = if self.constructed { 0x20 } else { 0x00 };
        self.class.bits() | constructed | (self.number & 0x1F) as u8
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Content {
    Primitive(Bytes),
    Constructed(Vec<BerElement>),
}

/// One BER TLV element, possibly holding nested elements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BerElement {
    pub tag: Tag,
    content: Content,
}

impl BerElement {
    pub fn primitive(tag: Tag, content: impl Into<Bytes>) -> Self {
        Self {
            tag: Tag { constructed: false, ..tag },
            content: Content::Primitive(content.into()),
        }
    }

    pub fn constructed(tag: Tag, children: Vec<BerElement>) -> Self {
        Self {
            tag: Tag { constructed: true, ..tag },
            content: Content::Constructed(children),
        }
    }

    pub fn sequence(children: Vec<BerElement>) -> Self {
        Self::constructed(Tag::new(TagClass::Universal, SEQUENCE, true), children)
    }

    pub fn set(children: Vec<BerElement>) -> Self {
        Self::constructed(Tag::new(TagClass::Universal, SET, true), children)
    }

    pub fn octet_string(content: impl Into<Bytes>) -> Self {
        Self::primitive(Tag::universal(OCTET_STRING), content)
    }

    pub fn string(s: &str) -> Self {
        Self::octet_string(Bytes::copy_from_slice(s.as_bytes()))
    }

    pub fn integer(value: i64) -> Self {
        Self::primitive(Tag::universal(INTEGER), int_octets(value))
    }

    pub fn enumerated(value: i64) -> Self {
        Self::primitive(Tag::universal(ENUMERATED), int_octets(value))
    }

    pub fn boolean(value: bool) -> Self {
        let octet = if value { 0xFFu8 } else { 0x00 };
        Self::primitive(Tag::universal(BOOLEAN), vec![octet])
    }

    pub fn null() -> Self {
        Self::primitive(Tag::universal(NULL), Bytes::new())
    }

    pub fn is_constructed(&self) -> bool {
        matches!(self.content, Content::Constructed(_))
    }

    /// Child elements of a constructed element, in wire order.
    pub fn children(&self) -> Result<&[BerElement], BerError> {
        match &self.content {
            Content::Constructed(children) => Ok(children),
            Content::Primitive(_) => Err(BerError::NotConstructed),
        }
    }

    /// Content octets of a primitive element.
    pub fn bytes(&self) -> Result<&[u8], BerError> {
        match &self.content {
            Content::Primitive(bytes) => Ok(bytes),
            Content::Constructed(_) => Err(BerError::NotPrimitive),
        }
    }

    /// Interpret primitive content as a big-endian two's-complement integer.
    /// Works for both INTEGER and ENUMERATED content.
    pub fn as_i64(&self) -> Result<i64, BerError> {
        int_value(self.bytes()?)
    }

    /// Interpret primitive content as a UTF-8 string.
    pub fn as_str(&self) -> Result<&str, BerError> {
        std::str::from_utf8(self.bytes()?).map_err(|_| BerError::InvalidUtf8)
    }

    pub fn as_bool(&self) -> Result<bool, BerError> {
        let bytes = self.bytes()?;
        if bytes.len() != 1 {
            return Err(BerError::InvalidBoolean(bytes.len()));
        }
        Ok(bytes[0] != 0)
    }

    /// Serialize to wire bytes. Total: length form is chosen from content
    /// size, so there is nothing to fail on.
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::new();
        self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut Vec<u8>) {
        out.push(self.tag.identifier_octet());
        match &self.content {
            Content::Primitive(bytes) => {
                write_length(out, bytes.len());
                out.extend_from_slice(bytes);
            }
            Content::Constructed(children) => {
                let mut body = Vec::new();
                for child in children {
                    child.write_to(&mut body);
                }
                write_length(out, body.len());
                out.extend_from_slice(&body);
            }
        }
    }

    /// Parse exactly one element covering the whole input.
    pub fn parse(data: &[u8]) -> Result<BerElement, BerError> {
        let mut reader = Reader::new(data);
        let element = reader.read_element()?;
        if reader.remaining() > 0 {
            return Err(BerError::TrailingData(reader.remaining()));
        }
        Ok(element)
    }
}

/// Minimal-length two's-complement content octets for an integer.
pub(crate) fn int_octets(value: i64) -> Bytes {
    let bytes = value.to_be_bytes();
    let mut start = 0;
    while start < 7 {
        let lead = bytes[start];
        let next_high = bytes[start + 1] & 0x80;
        if (lead == 0x00 && next_high == 0) || (lead == 0xFF && next_high != 0) {
            start += 1;
        } else {
            break;
        }
    }
    Bytes::copy_from_slice(&bytes[start..])
}

/// Sign-extending big-endian decode of integer content octets.
pub(crate) fn int_value(bytes: &[u8]) -> Result<i64, BerError> {
    if bytes.is_empty() || bytes.len() > 8 {
        return Err(BerError::InvalidInteger(bytes.len()));
    }
    let mut value: i64 = if bytes[0] & 0x80 != 0 { -1 } else { 0 };
    for &b in bytes {
        value = (value << 8) | b as i64;
    }
    Ok(value)
}

fn write_length(out: &mut Vec<u8>, length: usize) {
    if length < 128 {
        // Short form
        out.push(length as u8);
    } else {
        // Long form
        let mut octets = Vec::new();
        let mut len = length;
        while len > 0 {
            octets.push((len & 0xFF) as u8);
            len >>= 8;
        }
        octets.reverse();
        out.push(0x80 | octets.len() as u8);
        out.extend_from_slice(&octets);
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], BerError> {
        if self.remaining() < n {
            return Err(BerError::Truncated {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn read_u8(&mut self) -> Result<u8, BerError> {
        Ok(self.take(1)?[0])
    }

    fn read_length(&mut self) -> Result<usize, BerError> {
        let first = self.read_u8()?;
        if first & 0x80 == 0 {
            // Short form
            return Ok(first as usize);
        }
        let octets = (first & 0x7F) as usize;
        if octets == 0 {
            return Err(BerError::IndefiniteLength);
        }
        if octets > 4 {
            return Err(BerError::LengthTooLong(octets));
        }
        let mut length = 0usize;
        for &b in self.take(octets)? {
            length = (length << 8) | b as usize;
        }
        Ok(length)
    }

    fn read_element(&mut self) -> Result<BerElement, BerError> {
        let identifier = self.read_u8()?;
        let number = (identifier & 0x1F) as u32;
        if number == 0x1F {
            return Err(BerError::MultiByteTag);
        }
        let tag = Tag {
            class: TagClass::from_bits(identifier),
            number,
            constructed: identifier & 0x20 != 0,
        };
        let length = self.read_length()?;
        let content = self.take(length)?;
        if tag.constructed {
            let mut sub = Reader::new(content);
            let mut children = Vec::new();
            while sub.remaining() > 0 {
                children.push(sub.read_element()?);
            }
            Ok(BerElement {
                tag,
                content: Content::Constructed(children),
            })
        } else {
            Ok(BerElement {
                tag,
                content: Content::Primitive(Bytes::copy_from_slice(content)),
            })
        }
    }
}
