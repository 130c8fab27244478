// mips/memory.rs
use crate::mips::errors::Fault;

/// Byte-addressed data memory as seen by loads and stores. Multi-byte
/// values are big-endian.
pub trait Bus {
    fn load8(&self, addr: u32) -> Result<u8, Fault>;
    fn load16(&self, addr: u32) -> Result<u16, Fault>;
    fn load32(&self, addr: u32) -> Result<u32, Fault>;
    fn store8(&mut self, addr: u32, v: u8) -> Result<(), Fault>;
    fn store16(&mut self, addr: u32, v: u16) -> Result<(), Fault>;
    fn store32(&mut self, addr: u32, v: u32) -> Result<(), Fault>;
}

/// Flat, zero-initialised RAM. The stack grows down from its top.
#[derive(Debug, Clone)]
pub struct Ram {
    data: Vec<u8>,
}

impl Ram {
    pub fn new(size: usize) -> Self {
        Self { data: vec![0; size] }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Copies `bytes` to `base`. Fails without writing if they don't fit.
    pub fn load(&mut self, base: u32, bytes: &[u8]) -> Result<(), Fault> {
        let range = self.range(base, bytes.len() as u32)?;
        self.data[range].copy_from_slice(bytes);
        Ok(())
    }

    fn range(&self, addr: u32, width: u32) -> Result<std::ops::Range<usize>, Fault> {
        let start = addr as usize;
        let end = start + width as usize;
        if end > self.data.len() {
            return Err(Fault::MemoryOutOfBounds { addr, width });
        }
        Ok(start..end)
    }

    fn aligned(&self, addr: u32, width: u32) -> Result<std::ops::Range<usize>, Fault> {
        if addr % width != 0 {
            return Err(Fault::UnalignedAccess { addr, width });
        }
        self.range(addr, width)
    }
}

impl Bus for Ram {
    fn load8(&self, addr: u32) -> Result<u8, Fault> {
        let r = self.range(addr, 1)?;
        Ok(self.data[r.start])
    }

    fn load16(&self, addr: u32) -> Result<u16, Fault> {
        let r = self.aligned(addr, 2)?;
        Ok(u16::from_be_bytes([self.data[r.start], self.data[r.start + 1]]))
    }

    fn load32(&self, addr: u32) -> Result<u32, Fault> {
        let r = self.aligned(addr, 4)?;
        let mut b = [0u8; 4];
        b.copy_from_slice(&self.data[r]);
        Ok(u32::from_be_bytes(b))
    }

    fn store8(&mut self, addr: u32, v: u8) -> Result<(), Fault> {
        let r = self.range(addr, 1)?;
        self.data[r.start] = v;
        Ok(())
    }

    fn store16(&mut self, addr: u32, v: u16) -> Result<(), Fault> {
        let r = self.aligned(addr, 2)?;
        self.data[r].copy_from_slice(&v.to_be_bytes());
        Ok(())
    }

    fn store32(&mut self, addr: u32, v: u32) -> Result<(), Fault> {
        let r = self.aligned(addr, 4)?;
        self.data[r].copy_from_slice(&v.to_be_bytes());
        Ok(())
    }
}
