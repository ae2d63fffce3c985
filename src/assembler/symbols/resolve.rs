use super::{LinkError, SymbolTable};
use crate::{
    assembler::{
        codegen::instruction_to_bytes,
        program::{LinkedBlock, LinkedKind},
    },
    ast::{AddressingMode, Instruction, SELF_REFERENCE},
};

/// Resolve the label of an instruction placed at `current_addr`.
///
/// Relative branches get the displacement from the following instruction, which is where the
/// program counter points when the branch is taken.
fn resolve_label_to_addr(
    ins: &mut Instruction,
    symbol_table: &SymbolTable,
    current_addr: usize,
) -> Result<(), LinkError> {
    let label = match ins.label() {
        Some(label) if !ins.is_ready() => label.to_string(),
        _ => return Ok(()),
    };

    let target = if label == SELF_REFERENCE {
        current_addr
    } else {
        match symbol_table.address(&label) {
            Some(address) => address,
            None => {
                tracing::error!("Can't resolve label {} used by `{}`", label, ins);
                return Err(LinkError::UnresolvedLabel(label));
            }
        }
    };

    let value = match ins.addr_mode() {
        Some(AddressingMode::Relative) => target as i64 - current_addr as i64 - 2,
        _ => target as i64,
    };

    ins.resolve(value).map_err(|source| LinkError::Operand {
        instruction: ins.to_string(),
        source,
    })
}

/// Resolve the labels of all instructions and encode them.
///
/// Every block resolves against its own labels only.
#[tracing::instrument(skip(block), fields(origin = block.origin))]
pub fn resolve_block(block: &mut LinkedBlock) -> Result<(), LinkError> {
    let LinkedBlock { labels, nodes, .. } = block;

    for node in nodes.iter_mut() {
        match &mut node.kind {
            LinkedKind::Instruction { instruction, bytes } => {
                resolve_label_to_addr(instruction, labels, node.address)?;
                *bytes = instruction_to_bytes(instruction)?;
            }
            LinkedKind::Block(nested) => resolve_block(nested)?,
            LinkedKind::Label(_) | LinkedKind::Align { .. } | LinkedKind::Data(_) => (),
        }
    }

    Ok(())
}
