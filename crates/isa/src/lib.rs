//! Reference MIPS-like instruction set for the `msim-core` runtime.
//!
//! `msim-core` depends only on the [`msim_core::engine::InstructionEngine`]
//! trait; this crate supplies one concrete, deterministic implementation —
//! [`ReferenceEngine`] — plus the encoding ([`instruction`]) and decoding
//! ([`decode`]) it is built from. Splitting fetch/decode/execute into their
//! own modules mirrors the prior implementation's `Core::executeInstruction`
//! naming, adapted to a pure `decode` function plus a small `execute`-style
//! match inside [`ReferenceEngine::step`].

pub mod decode;
pub mod engine;
pub mod instruction;

pub use decode::decode as decode_word;
pub use engine::ReferenceEngine;
pub use instruction::{encode, Instruction, InstructionBits};
