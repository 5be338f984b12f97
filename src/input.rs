use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};

/// File or stdin input, read in chunks or all at once.
pub struct InputReader {
    reader: Box<dyn Read>,
    name: String,
}

impl InputReader {
    /// Use "-" for stdin.
    pub fn new<P: AsRef<Path>>(input_path: P) -> Result<Self> {
        let path = input_path.as_ref();
        let name = path.to_string_lossy().into_owned();

        let reader: Box<dyn Read> = if name == "-" {
            Box::new(io::stdin().lock())
        } else {
            let file = File::open(path).with_context(|| format!("cannot open {name}"))?;
            Box::new(BufReader::new(file))
        };

        Ok(Self { reader, name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn read_all(&mut self) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        self.reader
            .read_to_end(&mut data)
            .with_context(|| format!("cannot read {}", self.name))?;
        Ok(data)
    }

    /// Feeds `callback` with chunks of at most `chunk_size` bytes until EOF or
    /// until it returns `Ok(false)`.
    pub fn process_chunks<F>(&mut self, chunk_size: usize, mut callback: F) -> Result<()>
    where
        F: FnMut(&[u8]) -> Result<bool>,
    {
        let mut buffer = vec![0u8; chunk_size];

        loop {
            let bytes_read = self.reader.read(&mut buffer)?;
            if bytes_read == 0 {
                break;
            }

            if !callback(&buffer[..bytes_read])? {
                break;
            }
        }

        Ok(())
    }
}

/// Decodes hex digits, ignoring whitespace and an optional `0x` prefix.
pub fn parse_hex(text: &str) -> Result<Vec<u8>> {
    let digits = text
        .trim()
        .trim_start_matches("0x")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>();

    hex::decode(&digits).with_context(|| format!("invalid hex input \"{text}\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_input_forms() -> Result<()> {
        assert_eq!(parse_hex("1210")?, [0x12, 0x10]);
        assert_eq!(parse_hex(" 0x12 10\n")?, [0x12, 0x10]);
        assert!(parse_hex("121").is_err());
        Ok(())
    }
}
