use crate::{
    assembler::program::{LinkedBlock, LinkedKind},
    ast::{Block, Node},
};

const BLOCK_START: &str = ".block";
const BLOCK_END: &str = ".bend";

/// Source code of a block, nested blocks wrapped in `.block`/`.bend` as well.
pub fn source(block: &Block) -> Vec<String> {
    let mut lines = vec![BLOCK_START.to_string()];
    for node in block.nodes() {
        match node {
            Node::Block(nested) => lines.extend(source(nested)),
            node => lines.push(node.to_string()),
        }
    }
    lines.push(BLOCK_END.to_string());
    lines
}

/// Source code of a linked block.
pub fn linked_source(block: &LinkedBlock) -> Vec<String> {
    let mut lines = vec![BLOCK_START.to_string()];
    for node in &block.nodes {
        match &node.kind {
            LinkedKind::Instruction { instruction, .. } => lines.push(instruction.to_string()),
            LinkedKind::Label(label) => lines.push(label.to_string()),
            LinkedKind::Align { align, .. } => lines.push(align.to_string()),
            LinkedKind::Data(data) => lines.push(data.to_string()),
            LinkedKind::Block(nested) => lines.extend(linked_source(nested)),
        }
    }
    lines.push(BLOCK_END.to_string());
    lines
}

/// Generate a dump line from an address, the bytes column and the source.
///
/// E.g. `$1000   A9 00      \tlda #$00`
fn generate_line(addr: usize, bytes: &str, separator: &str, src: &str) -> String {
    format!("${:04X}   {:<8}   {}{}", addr, bytes, separator, src)
}

fn dump_block(block: &LinkedBlock, lines: &mut Vec<String>) {
    lines.push(generate_line(block.origin, "", "\t", BLOCK_START));

    for node in &block.nodes {
        let line = match &node.kind {
            LinkedKind::Instruction { instruction, bytes } => {
                let bytes_str = bytes
                    .iter()
                    .map(|b| format!("{:02X}", b))
                    .collect::<Vec<String>>()
                    .join(" ");
                generate_line(node.address, &bytes_str, "\t", &instruction.to_string())
            }
            LinkedKind::Label(label) => generate_line(node.address, "", "", label.name()),
            LinkedKind::Align { align, .. } => {
                generate_line(node.address, "", "\t", &align.to_string())
            }
            LinkedKind::Data(data) => {
                generate_line(node.address, ".. .. ..", "\t", &data.to_string())
            }
            LinkedKind::Block(nested) => {
                dump_block(nested, lines);
                continue;
            }
        };
        lines.push(line);
    }

    lines.push(generate_line(block.end, "", "\t", BLOCK_END));
}

/// Listing with one line per node: address, encoded bytes and source.
///
/// Nested blocks are wrapped in `.block`/`.bend` lines, the program itself only ends with
/// `.bend`.
#[tracing::instrument(skip(block))]
pub fn dump(block: &LinkedBlock) -> Vec<String> {
    let mut lines = vec![];
    dump_block(block, &mut lines);
    lines.remove(0);
    lines
}
