//! JSON program and process loaders.
//!
//! A *program* is a JSON file listing mnemonic instructions, assembled here
//! into instruction words via [`msim_isa::encode`]. A *process batch* is a
//! JSON file listing processes, each pointing at a program file; loading a
//! batch writes every program's words into the memory hierarchy through the
//! ordinary write path, so the same counters/cache effects a running
//! process would produce are already reflected in the PCBs it returns.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use msim_core::config::MemoryWeights;
use msim_core::memory::{Cache, MemoryHierarchy};
use msim_core::process::Pcb;
use msim_core::SimError;
use msim_isa::instruction::opcodes;

/// Errors surfaced while loading a program or process batch file.
#[derive(Debug, Error)]
pub enum LoaderError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// The path that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file's contents were not valid JSON for the expected schema.
    #[error("invalid JSON in {path}: {source}")]
    Json {
        /// The path whose contents failed to parse.
        path: PathBuf,
        /// The underlying parse error.
        #[source]
        source: serde_json::Error,
    },
    /// Writing an assembled program into the memory hierarchy failed.
    #[error(transparent)]
    Memory(#[from] SimError),
}

/// One mnemonic instruction in a program descriptor, encoded to a word via
/// [`msim_isa::instruction::encode`]. Mirrors `msim_isa::Instruction`
/// one-for-one.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum ProgramInstruction {
    Nop,
    AddI { rd: u8, rs: u8, imm: i32 },
    Add { rd: u8, rs1: u8, rs2: u8 },
    Sub { rd: u8, rs1: u8, rs2: u8 },
    Mul { rd: u8, rs1: u8, rs2: u8 },
    Lw { rd: u8, rs: u8, offset: i32 },
    Sw { rs: u8, rbase: u8, offset: i32 },
    Beq { rs1: u8, rs2: u8, offset: i32 },
    Bne { rs1: u8, rs2: u8, offset: i32 },
    J { target: u32 },
    Io { device: u8, cost: u32 },
    Halt,
}

impl ProgramInstruction {
    fn encode(&self) -> u64 {
        match *self {
            Self::Nop => msim_isa::encode(opcodes::NOP, 0, 0, 0, 0),
            Self::AddI { rd, rs, imm } => msim_isa::encode(opcodes::ADD_I, rd, rs, 0, imm),
            Self::Add { rd, rs1, rs2 } => msim_isa::encode(opcodes::ADD, rd, rs1, rs2, 0),
            Self::Sub { rd, rs1, rs2 } => msim_isa::encode(opcodes::SUB, rd, rs1, rs2, 0),
            Self::Mul { rd, rs1, rs2 } => msim_isa::encode(opcodes::MUL, rd, rs1, rs2, 0),
            Self::Lw { rd, rs, offset } => msim_isa::encode(opcodes::LW, rd, rs, 0, offset),
            Self::Sw { rs, rbase, offset } => msim_isa::encode(opcodes::SW, rs, rbase, 0, offset),
            Self::Beq { rs1, rs2, offset } => msim_isa::encode(opcodes::BEQ, 0, rs1, rs2, offset),
            Self::Bne { rs1, rs2, offset } => msim_isa::encode(opcodes::BNE, 0, rs1, rs2, offset),
            Self::J { target } => msim_isa::encode(opcodes::J, 0, 0, 0, target as i32),
            Self::Io { device, cost } => msim_isa::encode(opcodes::IO, device, 0, 0, cost as i32),
            Self::Halt => msim_isa::encode(opcodes::HALT, 0, 0, 0, 0),
        }
    }
}

/// A JSON program descriptor: an ordered list of mnemonic instructions.
#[derive(Debug, Deserialize)]
struct ProgramDescriptor {
    instructions: Vec<ProgramInstruction>,
}

/// An assembled program, ready to be written into the memory hierarchy.
#[derive(Debug, Clone)]
pub struct ProgramImage {
    /// One instruction word per entry in the source descriptor.
    pub words: Vec<u64>,
    /// Word-indexed entry point. Always `0`: every program here starts at
    /// its first instruction.
    pub entry_point: u64,
    /// Number of words in the image.
    pub size: u64,
}

/// Parses `path` as a [`ProgramDescriptor`] and assembles its instructions.
///
/// # Errors
///
/// Returns [`LoaderError::Io`] if `path` cannot be read, or
/// [`LoaderError::Json`] if its contents do not match the expected schema.
pub fn load_program(path: &Path) -> Result<ProgramImage, LoaderError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let descriptor: ProgramDescriptor =
        serde_json::from_str(&text).map_err(|source| LoaderError::Json {
            path: path.to_path_buf(),
            source,
        })?;
    let words: Vec<u64> = descriptor.instructions.iter().map(ProgramInstruction::encode).collect();
    let size = words.len() as u64;
    Ok(ProgramImage {
        words,
        entry_point: 0,
        size,
    })
}

/// One entry in a process batch file.
#[derive(Debug, Deserialize)]
struct ProcessDescriptor {
    pid: u64,
    name: String,
    priority: i32,
    /// Path to the program this process runs, resolved relative to the
    /// batch file's own directory.
    program_path: PathBuf,
    /// Declared job-size estimate for SJN ordering. Defaults to the
    /// program's instruction count when omitted.
    estimated_job_size: Option<u64>,
}

/// Parses `path` as a batch of [`ProcessDescriptor`]s, assembles and writes
/// each one's program into `memory` starting at `segment_base`, and returns
/// one [`Pcb`] per descriptor with `segment_base`/`segment_size` set to the
/// range it was written into.
///
/// Programs are laid out back-to-back in descriptor order, each getting
/// exactly as many words as its program needs.
///
/// # Errors
///
/// Returns [`LoaderError::Io`]/[`LoaderError::Json`] for a malformed batch
/// or program file, or [`LoaderError::Memory`] if a program does not fit in
/// the configured address space.
pub fn load_processes(
    path: &Path,
    segment_base: u64,
    memory: &MemoryHierarchy,
    weights: MemoryWeights,
) -> Result<Vec<Pcb>, LoaderError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoaderError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let descriptors: Vec<ProcessDescriptor> =
        serde_json::from_str(&text).map_err(|source| LoaderError::Json {
            path: path.to_path_buf(),
            source,
        })?;

    let batch_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut cursor = segment_base;
    let mut pcbs = Vec::with_capacity(descriptors.len());

    for descriptor in descriptors {
        let program_path = batch_dir.join(&descriptor.program_path);
        let image = load_program(&program_path)?;
        let base = cursor;
        cursor += image.size;

        let job_size = descriptor.estimated_job_size.unwrap_or(image.size.max(1));
        let mut pcb = Pcb::new(
            descriptor.pid,
            descriptor.name,
            descriptor.priority,
            job_size,
            base,
            image.size,
            weights,
        );

        let mut loader_cache = Cache::new(&msim_core::config::CacheConfig::default());
        for (i, word) in image.words.iter().enumerate() {
            memory.write(base + i as u64, *word, &mut pcb, &mut loader_cache)?;
        }

        pcbs.push(pcb);
    }

    Ok(pcbs)
}
