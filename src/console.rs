use anyhow::Result;
use std::collections::VecDeque;
use std::io::{Read, Write};

/// Character device used by the `RD` and `WD` instructions.
pub trait Console {
    /// Read one byte, or `None` when no input is available.
    fn read_byte(&mut self) -> Result<Option<u8>>;
    fn write_byte(&mut self, val: u8) -> Result<()>;
}

/// Console bound to the process stdin/stdout.
#[derive(Debug, Default)]
pub struct StdConsole;

impl Console for StdConsole {
    fn read_byte(&mut self) -> Result<Option<u8>> {
        let mut buf = [0u8; 1];
        let n = std::io::stdin().lock().read(&mut buf)?;
        Ok((n == 1).then_some(buf[0]))
    }

    fn write_byte(&mut self, val: u8) -> Result<()> {
        let mut out = std::io::stdout().lock();
        out.write_all(&[val])?;
        out.flush()?;
        Ok(())
    }
}

/// In-memory console: input is drained front to back, output is collected.
#[derive(Debug, Default, Clone)]
pub struct BufferConsole {
    pub input: VecDeque<u8>,
    pub output: Vec<u8>,
}

impl BufferConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_input(input: impl AsRef<[u8]>) -> Self {
        Self {
            input: input.as_ref().iter().copied().collect(),
            output: Vec::new(),
        }
    }
}

impl Console for BufferConsole {
    fn read_byte(&mut self) -> Result<Option<u8>> {
        Ok(self.input.pop_front())
    }

    fn write_byte(&mut self, val: u8) -> Result<()> {
        self.output.push(val);
        Ok(())
    }
}
