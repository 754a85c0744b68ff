//! Turns a resolved byte buffer into the file image the target loads,
//! plus a couple of human-readable dumps for the console.
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use term_grid::{Cell, Direction, Filling, Grid, GridOptions};

use super::error::{ErrorKind, Result};
use super::symbols::SymbolTable;

/// Bytes per row of the hex dump.
const DUMP_WIDTH: usize = 8;

/// First byte of a framed image unless the instruction set says otherwise.
pub const DEFAULT_MAGIC: u8 = 0x7F;

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum HeaderMode {
    /// Bytes exactly as assembled.
    Raw,
    /// `magic, len_hi, len_lo, 0, 0`, the payload, then two zero bytes.
    Framed { magic: u8 },
}

impl HeaderMode {
    pub fn by_name(name: &str, magic: u8) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "raw" => Some(HeaderMode::Raw),
            "framed" => Some(HeaderMode::Framed { magic }),
            _ => None,
        }
    }
}

pub fn serialize(bytes: &[u8], header: HeaderMode) -> Result<Vec<u8>> {
    match header {
        HeaderMode::Raw => Ok(bytes.to_vec()),
        HeaderMode::Framed { magic } => {
            if bytes.len() > 0xFFFF {
                return Err(ErrorKind::OperandRange { value: bytes.len() as u32, max: 0xFFFF }.into());
            }
            let len = bytes.len() as u16;
            let mut out = Vec::with_capacity(bytes.len() + 7);
            out.push(magic);
            out.extend_from_slice(&len.to_be_bytes());
            out.extend_from_slice(&[0, 0]);
            out.extend_from_slice(bytes);
            out.extend_from_slice(&[0, 0]);
            Ok(out)
        }
    }
}

/// Writes `image` to `<path>.part` and renames it over `path`. On failure the
/// partial file is removed and `path` is left untouched.
pub fn write_image(path: &Path, image: &[u8]) -> io::Result<()> {
    let mut staging = path.as_os_str().to_owned();
    staging.push(".part");
    let staging = PathBuf::from(staging);

    let result = File::create(&staging)
        .and_then(|mut file| file.write_all(image).and_then(|_| file.sync_all()))
        .and_then(|_| fs::rename(&staging, path));
    if result.is_err() {
        fs::remove_file(&staging).ok();
    }
    result
}

fn grid() -> Grid {
    Grid::new(GridOptions {
        filling: Filling::Spaces(1),
        direction: Direction::LeftToRight,
    })
}

/// Address column followed by `DUMP_WIDTH` bytes per row.
pub fn hex_dump(bytes: &[u8]) -> String {
    let mut grid = grid();
    for (row, chunk) in bytes.chunks(DUMP_WIDTH).enumerate() {
        grid.add(Cell::from(format!("{:04X}:", row * DUMP_WIDTH)));
        for byte in chunk {
            grid.add(Cell::from(format!("{:02X}", byte)));
        }
    }
    grid.fit_into_columns(DUMP_WIDTH + 1).to_string()
}

pub fn symbol_table(symbols: &SymbolTable) -> String {
    let mut grid = grid();
    for (name, addr) in symbols.iter() {
        grid.add(Cell::from(name.to_string()));
        grid.add(Cell::from("=".to_string()));
        grid.add(Cell::from(format!("0x{:04X}", addr)));
    }
    grid.fit_into_columns(3).to_string()
}
