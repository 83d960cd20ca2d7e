//! Binary codebook file format.
//!
//! Little-endian layout:
//!
//! ```text
//! magic "WCBK" | version u16
//! lp_order u32 | sample_rate u32 | window_size_secs f64 | skip_size_secs f64
//! has_pitch u8 [ source Hz | target Hz | source log-Hz | target log-Hz ]   (5 × f64 each)
//! num_entries u32
//! num_entries × ( source LSFs | source weights | target LSFs | target weights )  (lp_order × f64 each)
//! ```
//!
//! The header can be read on its own (the batch transformer needs the LP order
//! and frame settings before it analyses anything) and the entries later.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::prosody::{PitchStatistics, SpeakerPitchStatistics};

use super::store::{Codebook, CodebookEntry, CodebookError, CodebookHeader, CodebookPitchStatistics};

const CODEBOOK_MAGIC: &[u8; 4] = b"WCBK";
const CODEBOOK_VERSION: u16 = 1;

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Two-phase codebook reader: [`read_header`](Self::read_header) first, then
/// [`read_entries`](Self::read_entries).
pub struct CodebookFile<R> {
    reader: R,
    header: Option<CodebookHeader>,
}

impl CodebookFile<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, CodebookError> {
        Ok(Self::from_reader(BufReader::new(File::open(path)?)))
    }
}

impl<R: Read> CodebookFile<R> {
    pub fn from_reader(reader: R) -> Self {
        Self {
            reader,
            header: None,
        }
    }

    /// Read and validate the header.  Calling it again returns the cached copy.
    pub fn read_header(&mut self) -> Result<CodebookHeader, CodebookError> {
        if let Some(header) = &self.header {
            return Ok(header.clone());
        }

        let r = &mut self.reader;

        let mut magic = [0u8; 4];
        r.read_exact(&mut magic)?;
        if &magic != CODEBOOK_MAGIC {
            return Err(CodebookError::BadMagic);
        }
        let version = r.read_u16::<LittleEndian>()?;
        if version != CODEBOOK_VERSION {
            return Err(CodebookError::UnsupportedVersion(version));
        }

        let lp_order = r.read_u32::<LittleEndian>()? as usize;
        let sample_rate = r.read_u32::<LittleEndian>()?;
        let window_size_secs = r.read_f64::<LittleEndian>()?;
        let skip_size_secs = r.read_f64::<LittleEndian>()?;

        let pitch = match r.read_u8()? {
            0 => None,
            _ => {
                let source_hz = read_statistics(r)?;
                let target_hz = read_statistics(r)?;
                let source_log = read_statistics(r)?;
                let target_log = read_statistics(r)?;
                Some(CodebookPitchStatistics {
                    source: SpeakerPitchStatistics {
                        hertz: source_hz,
                        log_hertz: source_log,
                    },
                    target: SpeakerPitchStatistics {
                        hertz: target_hz,
                        log_hertz: target_log,
                    },
                })
            }
        };

        let num_entries = r.read_u32::<LittleEndian>()? as usize;

        let header = CodebookHeader {
            lp_order,
            sample_rate,
            window_size_secs,
            skip_size_secs,
            num_entries,
            pitch,
        };
        header.validate()?;

        self.header = Some(header.clone());
        Ok(header)
    }

    /// Read the entries that follow the header into a validated [`Codebook`].
    pub fn read_entries(mut self) -> Result<Codebook, CodebookError> {
        let header = self.read_header()?;
        let order = header.lp_order;

        // The count comes from the file: grow as entries actually arrive.
        let mut entries = Vec::new();
        for _ in 0..header.num_entries {
            let mut read_vec = || -> Result<Vec<f64>, CodebookError> {
                let mut v = vec![0.0; order];
                self.reader.read_f64_into::<LittleEndian>(&mut v)?;
                Ok(v)
            };
            let source_lsfs = read_vec()?;
            let source_weights = read_vec()?;
            let target_lsfs = read_vec()?;
            let target_weights = read_vec()?;
            entries.push(CodebookEntry::new(
                source_lsfs,
                source_weights,
                target_lsfs,
                target_weights,
            ));
        }

        Codebook::new(header, entries)
    }
}

fn read_statistics<R: Read>(r: &mut R) -> Result<PitchStatistics, CodebookError> {
    Ok(PitchStatistics {
        mean: r.read_f64::<LittleEndian>()?,
        std_dev: r.read_f64::<LittleEndian>()?,
        range: r.read_f64::<LittleEndian>()?,
        slope: r.read_f64::<LittleEndian>()?,
        intercept: r.read_f64::<LittleEndian>()?,
    })
}

// ---------------------------------------------------------------------------
// Writer
// ---------------------------------------------------------------------------

fn write_statistics<W: Write>(w: &mut W, s: &PitchStatistics) -> std::io::Result<()> {
    for v in [s.mean, s.std_dev, s.range, s.slope, s.intercept] {
        w.write_f64::<LittleEndian>(v)?;
    }
    Ok(())
}

/// Serialise `codebook` in the format above.
pub fn write_codebook<W: Write>(w: &mut W, codebook: &Codebook) -> Result<(), CodebookError> {
    let header = codebook.header();

    w.write_all(CODEBOOK_MAGIC)?;
    w.write_u16::<LittleEndian>(CODEBOOK_VERSION)?;
    w.write_u32::<LittleEndian>(header.lp_order as u32)?;
    w.write_u32::<LittleEndian>(header.sample_rate)?;
    w.write_f64::<LittleEndian>(header.window_size_secs)?;
    w.write_f64::<LittleEndian>(header.skip_size_secs)?;

    match &header.pitch {
        None => w.write_u8(0)?,
        Some(pitch) => {
            w.write_u8(1)?;
            write_statistics(w, &pitch.source.hertz)?;
            write_statistics(w, &pitch.target.hertz)?;
            write_statistics(w, &pitch.source.log_hertz)?;
            write_statistics(w, &pitch.target.log_hertz)?;
        }
    }

    w.write_u32::<LittleEndian>(codebook.len() as u32)?;
    for entry in codebook.entries() {
        for v in [
            &entry.source_lsfs,
            &entry.source_weights,
            &entry.target_lsfs,
            &entry.target_weights,
        ] {
            for &x in v.iter() {
                w.write_f64::<LittleEndian>(x)?;
            }
        }
    }

    Ok(())
}

impl Codebook {
    /// Read header and entries from `path`.
    pub fn load_from(path: &Path) -> Result<Self, CodebookError> {
        CodebookFile::open(path)?.read_entries()
    }

    /// Write to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), CodebookError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        write_codebook(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
