use std::collections::HashMap;

use crate::mips::object::{ObjectWriter, SectionKind};

/// Output of the assembler before it is wrapped in a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    /// Encoded machine words in execution order.
    pub text: Vec<u32>,
    /// Data section bytes in directive order.
    pub data: Vec<u8>,
    /// Byte offset into `text` where execution starts (`main`, else 0).
    pub entry: u32,
    /// Final label addresses: code labels as byte offsets into `text`,
    /// data labels as byte offsets into `data`.
    pub symbols: HashMap<String, u32>,
}

impl Program {
    /// `text` as big-endian bytes, the form the interpreter fetches from.
    pub fn code_bytes(&self) -> Vec<u8> {
        self.text.iter().flat_map(|w| w.to_be_bytes()).collect()
    }

    /// Serializes into the container: code, an empty string pool, data,
    /// then the section table.
    pub fn to_object(&self) -> Vec<u8> {
        let mut out = ObjectWriter::new();
        let code = out.write_section(SectionKind::Code, &self.code_bytes());
        out.write_section(SectionKind::StringPool, &[]);
        out.write_section(SectionKind::Data, &self.data);
        out.finish(code.offset + self.entry)
    }
}
