use log::debug;

use crate::mips::config::MachineConfig;
use crate::mips::errors::{Fault, ObjectError};
use crate::mips::exec::Machine;
use crate::mips::object::{ObjectFile, SectionKind};

/// Code and data pulled out of a container, ready for a [`Machine`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedProgram {
    pub code: Vec<u8>,
    pub data: Vec<u8>,
    /// Entry point as a byte offset into `code`.
    pub entry: u32,
}

/// Strips the container header and table, keeping the payloads.
pub fn load(bytes: &[u8]) -> Result<LoadedProgram, ObjectError> {
    let obj = ObjectFile::parse(bytes)?;
    let code_desc = obj
        .descriptor(SectionKind::Code)
        .ok_or(ObjectError::MissingSection(SectionKind::Code.name()))?;
    let code = obj.section(SectionKind::Code).unwrap_or_default().to_vec();
    let data = obj.section(SectionKind::Data).unwrap_or_default().to_vec();

    let entry = obj
        .header
        .entry
        .checked_sub(code_desc.offset)
        .filter(|e| *e <= code_desc.size)
        .ok_or(ObjectError::EntryOutOfBounds(obj.header.entry))?;

    debug!(
        "loaded {} code bytes, {} data bytes, entry 0x{:x}",
        code.len(),
        data.len(),
        entry
    );
    Ok(LoadedProgram { code, data, entry })
}

impl LoadedProgram {
    /// A machine positioned at the entry point with the data section
    /// copied to address 0.
    pub fn machine(&self, config: MachineConfig) -> Result<Machine<'_>, Fault> {
        let data_size = config.data_size.max(self.data.len() as u32);
        let config = config.with_entry(self.entry).with_data_size(data_size);
        let mut m = Machine::new(&self.code, config)?;
        m.load_data(&self.data)?;
        Ok(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mips::object::{HEADER_LEN, ObjectWriter};

    #[test]
    fn load_splits_sections_and_rebases_entry() {
        let mut w = ObjectWriter::new();
        w.write_section(SectionKind::Code, &[0; 12]);
        w.write_section(SectionKind::StringPool, &[]);
        w.write_section(SectionKind::Data, &[9, 8]);
        let bytes = w.finish(HEADER_LEN as u32 + 8);

        let p = load(&bytes).unwrap();
        assert_eq!(p.code, vec![0; 12]);
        assert_eq!(p.data, vec![9, 8]);
        assert_eq!(p.entry, 8);
    }

    #[test]
    fn missing_code_section_is_an_error() {
        let mut w = ObjectWriter::new();
        w.write_section(SectionKind::Data, &[1]);
        let bytes = w.finish(0);
        assert_eq!(
            load(&bytes),
            Err(ObjectError::MissingSection("code"))
        );
    }

    #[test]
    fn entry_outside_code_is_an_error() {
        let mut w = ObjectWriter::new();
        w.write_section(SectionKind::Code, &[0; 4]);
        let bytes = w.finish(3);
        assert_eq!(load(&bytes), Err(ObjectError::EntryOutOfBounds(3)));
    }
}
