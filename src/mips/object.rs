//! The sectioned binary container produced by the assembler.
//!
//! ```text
//! header (15) | code | string pool | data | section table (11 per entry)
//! ```
//!
//! Every multi-byte field is big-endian. The header carries the offset of
//! the section table, so it is written last.

use log::trace;

use crate::mips::errors::ObjectError;

pub const MARKER: u8 = 0x7F;
pub const MAGIC: [u8; 3] = *b"MPS";
pub const VERSION_MAJOR: u8 = 1;
pub const VERSION_MINOR: u8 = 0;

/// marker + magic + version + entry + table offset + count
pub const HEADER_LEN: usize = 1 + 3 + 2 + 4 + 4 + 1;
/// name + kind + offset + size
pub const SECTION_ENTRY_LEN: usize = 2 + 1 + 4 + 4;

#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionKind {
    Code = 1,
    StringPool = 2,
    Data = 4,
}

impl SectionKind {
    pub fn name(self) -> &'static str {
        match self {
            SectionKind::Code => "code",
            SectionKind::StringPool => "string pool",
            SectionKind::Data => "data",
        }
    }
}

impl TryFrom<u8> for SectionKind {
    type Error = ObjectError;

    fn try_from(tag: u8) -> Result<Self, ObjectError> {
        match tag {
            1 => Ok(SectionKind::Code),
            2 => Ok(SectionKind::StringPool),
            4 => Ok(SectionKind::Data),
            other => Err(ObjectError::UnknownSectionKind(other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectionDescriptor {
    /// Reserved, always 0 on output.
    pub name: u16,
    pub kind: SectionKind,
    pub offset: u32,
    pub size: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub major: u8,
    pub minor: u8,
    /// Byte offset of the first instruction to run, from the container start.
    pub entry: u32,
    pub section_table: u32,
    pub section_count: u8,
}

/// Accumulates payloads, then appends the section table and patches the
/// header in [`ObjectWriter::finish`].
#[derive(Debug)]
pub struct ObjectWriter {
    buf: Vec<u8>,
    sections: Vec<SectionDescriptor>,
}

impl Default for ObjectWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectWriter {
    pub fn new() -> Self {
        Self {
            buf: vec![0; HEADER_LEN],
            sections: Vec::new(),
        }
    }

    /// Offset the next payload byte will land at.
    pub fn position(&self) -> u32 {
        self.buf.len() as u32
    }

    /// Appends one section payload and records its descriptor.
    pub fn write_section(&mut self, kind: SectionKind, payload: &[u8]) -> SectionDescriptor {
        let desc = SectionDescriptor {
            name: 0,
            kind,
            offset: self.position(),
            size: payload.len() as u32,
        };
        self.buf.extend_from_slice(payload);
        trace!("section {} at 0x{:x}, {} bytes", kind.name(), desc.offset, desc.size);
        self.sections.push(desc);
        desc
    }

    pub fn finish(mut self, entry: u32) -> Vec<u8> {
        let table = self.position();
        for s in &self.sections {
            self.buf.extend_from_slice(&s.name.to_be_bytes());
            self.buf.push(s.kind as u8);
            self.buf.extend_from_slice(&s.offset.to_be_bytes());
            self.buf.extend_from_slice(&s.size.to_be_bytes());
        }

        let mut header = Vec::with_capacity(HEADER_LEN);
        header.push(MARKER);
        header.extend_from_slice(&MAGIC);
        header.push(VERSION_MAJOR);
        header.push(VERSION_MINOR);
        header.extend_from_slice(&entry.to_be_bytes());
        header.extend_from_slice(&table.to_be_bytes());
        header.push(self.sections.len() as u8);
        self.buf[..HEADER_LEN].copy_from_slice(&header);
        self.buf
    }
}

/// A parsed, borrowed view of a container.
#[derive(Debug, Clone)]
pub struct ObjectFile<'a> {
    pub header: Header,
    pub sections: Vec<SectionDescriptor>,
    bytes: &'a [u8],
}

fn take(bytes: &[u8], offset: usize, needed: usize) -> Result<&[u8], ObjectError> {
    offset
        .checked_add(needed)
        .and_then(|end| bytes.get(offset..end))
        .ok_or(ObjectError::Truncated { offset, needed })
}

fn be32(b: &[u8]) -> u32 {
    u32::from_be_bytes([b[0], b[1], b[2], b[3]])
}

impl<'a> ObjectFile<'a> {
    pub fn parse(bytes: &'a [u8]) -> Result<Self, ObjectError> {
        let h = take(bytes, 0, HEADER_LEN)?;
        if h[0] != MARKER || h[1..4] != MAGIC {
            return Err(ObjectError::BadMagic);
        }
        if h[4] != VERSION_MAJOR {
            return Err(ObjectError::UnsupportedVersion { major: h[4], minor: h[5] });
        }
        let header = Header {
            major: h[4],
            minor: h[5],
            entry: be32(&h[6..10]),
            section_table: be32(&h[10..14]),
            section_count: h[14],
        };

        let mut sections = Vec::with_capacity(header.section_count as usize);
        for i in 0..header.section_count as usize {
            let at = header.section_table as usize + i * SECTION_ENTRY_LEN;
            let e = take(bytes, at, SECTION_ENTRY_LEN)?;
            let desc = SectionDescriptor {
                name: u16::from_be_bytes([e[0], e[1]]),
                kind: SectionKind::try_from(e[2])?,
                offset: be32(&e[3..7]),
                size: be32(&e[7..11]),
            };
            take(bytes, desc.offset as usize, desc.size as usize).map_err(|_| {
                ObjectError::SectionOutOfBounds { offset: desc.offset, size: desc.size }
            })?;
            sections.push(desc);
        }

        Ok(Self { header, sections, bytes })
    }

    pub fn descriptor(&self, kind: SectionKind) -> Option<&SectionDescriptor> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    /// Payload of the first section of `kind`.
    pub fn section(&self, kind: SectionKind) -> Option<&'a [u8]> {
        let d = self.descriptor(kind)?;
        let start = d.offset as usize;
        self.bytes.get(start..start + d.size as usize)
    }
}
