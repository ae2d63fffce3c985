use super::{LinkError, SymbolTable, ADDRESS_SPACE_END};
use crate::{
    assembler::program::{LinkWarning, LinkedBlock, LinkedKind, LinkedNode},
    ast::{Block, Node},
};

/// Assign addresses to the nodes of a block starting at `address` and collect its labels.
///
/// Instructions are copied unresolved, their bytes are filled in when resolving.
#[tracing::instrument(skip(block, warnings))]
pub fn index_block(
    block: &Block,
    address: usize,
    warnings: &mut Vec<LinkWarning>,
) -> Result<LinkedBlock, LinkError> {
    let mut current_addr = address;
    let mut labels = SymbolTable::new();
    let mut nodes = Vec::with_capacity(block.len());

    for node in block.nodes() {
        let node_addr = current_addr;
        let kind = match node {
            Node::Instruction(ins) => {
                current_addr += ins
                    .size()
                    .ok_or_else(|| LinkError::IncompleteInstruction(ins.to_string()))?;
                LinkedKind::Instruction {
                    instruction: ins.clone(),
                    bytes: vec![],
                }
            }
            Node::Label(label) => {
                if let Some(previous) = labels.define(label.name(), current_addr) {
                    tracing::warn!(
                        "Redefinition of label {} from ${:04x} to ${:04x}",
                        label,
                        previous,
                        current_addr
                    );
                    warnings.push(LinkWarning::LabelRedefined {
                        name: label.name().to_string(),
                        previous,
                        address: current_addr,
                    });
                }
                LinkedKind::Label(label.clone())
            }
            Node::Align(align) => {
                let target = align.address() as usize;
                if target < current_addr {
                    return Err(LinkError::Misaligned {
                        from: current_addr,
                        to: align.address(),
                    });
                }
                current_addr = target;
                LinkedKind::Align {
                    align: *align,
                    padding: target - node_addr,
                }
            }
            Node::Data(data) => {
                current_addr += data.size();
                LinkedKind::Data(data.clone())
            }
            Node::Block(nested) => {
                let linked = index_block(nested, current_addr, warnings)?;
                current_addr = linked.end;
                LinkedKind::Block(linked)
            }
        };

        if current_addr > ADDRESS_SPACE_END {
            return Err(LinkError::ProgramOverflow(current_addr));
        }

        nodes.push(LinkedNode {
            address: node_addr,
            kind,
        });
    }

    Ok(LinkedBlock {
        origin: address,
        end: current_addr,
        labels,
        nodes,
    })
}
