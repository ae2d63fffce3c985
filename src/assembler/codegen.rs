use thiserror::Error;

use crate::{
    assembler::{
        codegen::opcode::OPCODE_MAPPING,
        program::{LinkedBlock, LinkedKind},
    },
    ast::Instruction,
};

/// Mapping from instruction definitions to opcodes.
pub mod opcode;

#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum CodeGenError {
    #[error("Invalid opcode: {0}")]
    InvalidOpcode(String),
    #[error("Instruction not resolved: {0}")]
    NotReady(String),
}

/// Compile a single instruction to machine code.
#[tracing::instrument]
pub fn instruction_to_bytes(ins: &Instruction) -> Result<Vec<u8>, CodeGenError> {
    if !ins.is_ready() {
        return Err(CodeGenError::NotReady(ins.to_string()));
    }

    let opcode = ins
        .addr_mode()
        .and_then(|mode| OPCODE_MAPPING.find_opcode((ins.mnemonic(), mode)))
        .ok_or_else(|| CodeGenError::InvalidOpcode(ins.to_string()))?;

    let mut bytes = vec![opcode.opcode];
    if let (Some(mode), Some(value)) = (ins.addr_mode(), ins.value()) {
        // Values are validated against the mode, relative displacements are two's complement
        match mode.operand_len() {
            1 => bytes.push(value as u8),
            2 => bytes.extend_from_slice(&(value as u16).to_le_bytes()),
            _ => (),
        }
    }

    Ok(bytes)
}

/// Generate machine code from a linked block.
///
/// The block is assumed to have been resolved, the instructions carry their encoded bytes.
#[tracing::instrument(skip(block))]
pub fn generate(block: &LinkedBlock) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(block.size());
    block_to_bytes(block, &mut bytes);
    bytes
}

fn block_to_bytes(block: &LinkedBlock, bytes: &mut Vec<u8>) {
    for node in &block.nodes {
        match &node.kind {
            LinkedKind::Instruction {
                bytes: ins_bytes, ..
            } => bytes.extend_from_slice(ins_bytes),
            LinkedKind::Align { padding, .. } => bytes.resize(bytes.len() + padding, 0x00),
            LinkedKind::Data(data) => bytes.extend_from_slice(data.bytes()),
            LinkedKind::Block(nested) => block_to_bytes(nested, bytes),
            LinkedKind::Label(_) => (),
        }
    }
}

/// Prefix the machine code with the load address.
pub fn to_prg(origin: u16, block: &LinkedBlock) -> Vec<u8> {
    let mut bytes = origin.to_le_bytes().to_vec();
    bytes.extend(generate(block));
    bytes
}
