use c64asm::{
    assembler::{LinkError, LinkWarning, OutputFormat},
    ast::{
        AddressingMode, Align, Block, Data, DataMode, Instruction, InstructionError, Label,
        Mnemonic, Modifier, NodeError,
    },
    charset::Charset,
};

use pretty_assertions::assert_eq;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn ins(mnemonic: Mnemonic, argument: impl Into<c64asm::ast::Argument>) -> Instruction {
    Instruction::new(mnemonic, argument, None).expect("valid instruction")
}

fn imm(mnemonic: Mnemonic, value: i64) -> Instruction {
    Instruction::new_with_mode(mnemonic, AddressingMode::Immediate, value, None)
        .expect("valid instruction")
}

fn label(name: &str) -> Label {
    Label::new(name).expect("valid label")
}

#[test]
fn test_basic() -> TestResult {
    let mut block = Block::new();
    block.push(imm(Mnemonic::LDX, 0x00));
    block.push(imm(Mnemonic::LDY, 0x00));
    block.push(label("firstloop"));
    block.push(ins(Mnemonic::TXA, ()));
    block.push(Instruction::new_with_mode(
        Mnemonic::STA,
        AddressingMode::AbsoluteY,
        0x0200,
        None,
    )?);
    block.push(ins(Mnemonic::PHA, ()));
    block.push(ins(Mnemonic::INX, ()));
    block.push(ins(Mnemonic::INY, ()));
    block.push(imm(Mnemonic::CPY, 0x10));
    block.push(ins(Mnemonic::BNE, "firstloop"));
    block.push(label("secondloop"));
    block.push(ins(Mnemonic::PLA, ()));
    block.push(Instruction::new_with_mode(
        Mnemonic::STA,
        AddressingMode::AbsoluteY,
        0x0200,
        None,
    )?);
    block.push(ins(Mnemonic::INY, ()));
    block.push(imm(Mnemonic::CPY, 0x20));
    block.push(ins(Mnemonic::BNE, "secondloop"));

    let expected = [
        /* LDX */ 0xa2, 0x00, /* LDY */ 0xa0, 0x00, /* TXA */ 0x8a,
        /* STA */ 0x99, 0x00, 0x02, /* PHA */ 0x48, /* INX */ 0xe8,
        /* INY */ 0xc8, /* CPY */ 0xc0, 0x10, /* BNE */ 0xd0, 0xf5,
        /* PLA */ 0x68, /* STA */ 0x99, 0x00, 0x02, /* INY */ 0xc8,
        /* CPY */ 0xc0, 0x20, /* BNE */ 0xd0, 0xf7,
    ];
    assert_eq!(block.link(0x8000)?.code(), expected);
    Ok(())
}

#[test]
fn test_prg() -> TestResult {
    let mut block = Block::new();
    block.push(imm(Mnemonic::LDA, 0));
    block.push(ins(Mnemonic::STA, 0x20));
    block.push(ins(Mnemonic::RTS, ()));

    let program = block.link(0x0800)?;
    assert_eq!(program.to_prg(), [0x00, 0x08, 0xa9, 0x00, 0x85, 0x20, 0x60]);
    assert_eq!(program.origin(), 0x0800);
    assert_eq!(program.end(), 0x0805);
    Ok(())
}

#[test]
fn test_branch_range() -> TestResult {
    let mut block = Block::new();
    block.push(ins(Mnemonic::BNE, "next"));
    block.push(label("next"));
    assert_eq!(block.link(0x1000)?.code(), [0xd0, 0x00]);

    let mut block = Block::new();
    block.push(ins(Mnemonic::BEQ, "far"));
    block.push(Data::new(vec![0xea_i64; 127], DataMode::Default)?);
    block.push(label("far"));
    assert_eq!(block.link(0x1000)?.code()[..2], [0xf0, 0x7f]);

    let mut block = Block::new();
    block.push(ins(Mnemonic::BEQ, "far"));
    block.push(Data::new(vec![0xea_i64; 128], DataMode::Default)?);
    block.push(label("far"));
    assert_eq!(
        block.link(0x1000),
        Err(LinkError::Operand {
            instruction: "beq far".to_string(),
            source: InstructionError::ArgumentOutOfRange {
                mnemonic: Mnemonic::BEQ,
                value: 128
            }
        })
    );
    Ok(())
}

#[test]
fn test_self_reference() -> TestResult {
    let mut block = Block::new();
    block.push(ins(Mnemonic::NOP, ()));
    block.push(ins(Mnemonic::BNE, "*"));
    block.push(Instruction::new(Mnemonic::BNE, "*", Some(Modifier::offset(2)))?);

    let program = block.link(0x1000)?;
    assert_eq!(program.code(), [0xea, 0xd0, 0xfe, 0xd0, 0x00]);
    assert_eq!(
        program.to_source(),
        vec![".block", "nop", "bne *", "bne *+2", ".bend"]
    );
    Ok(())
}

#[test]
fn test_align() -> TestResult {
    // A leading alignment moves the origin
    let mut block = Block::new();
    block.push(Align::new(0x4000)?);
    block.push(label("x"));
    let program = block.link(0x1000)?;
    assert_eq!(program.origin(), 0x4000);
    assert_eq!(program.labels().address("x"), Some(0x4000));
    assert!(program.code().is_empty());

    let mut block = Block::new();
    block.push(ins(Mnemonic::NOP, ()));
    block.push(Align::new(0x4000)?);
    block.push(label("x"));
    block.push(ins(Mnemonic::RTS, ()));
    let program = block.link(0x1000)?;
    assert_eq!(program.labels().address("x"), Some(0x4000));

    let code = program.code();
    assert_eq!(code.len(), 0x3000 + 1);
    assert_eq!(code[0], 0xea);
    assert!(code[1..0x3000].iter().all(|b| *b == 0));
    assert_eq!(code[0x3000], 0x60);
    Ok(())
}

#[test]
fn test_backward_align() -> TestResult {
    let mut block = Block::new();
    block.push(Align::new(0x1000)?);
    block.push(ins(Mnemonic::NOP, ()));
    block.push(Align::new(0x0fff)?);

    assert_eq!(
        block.link(0x0800),
        Err(LinkError::Misaligned {
            from: 0x1001,
            to: 0x0fff
        })
    );
    Ok(())
}

#[test]
fn test_relink_is_idempotent() -> TestResult {
    let mut block = Block::new();
    block.push(label("start"));
    block.push(ins(Mnemonic::JMP, "start"));

    let first = block.link(0xc000)?;
    let second = block.link(0xc000)?;
    assert_eq!(first, second);
    assert_eq!((first.origin(), first.end()), (0xc000, 0xc003));

    // Appending after linking is picked up by the next link
    block.push(ins(Mnemonic::RTS, ()));
    let third = block.link(0xc000)?;
    assert_eq!(third.code(), [0x4c, 0x00, 0xc0, 0x60]);
    Ok(())
}

#[test]
fn test_zero_page_preference() -> TestResult {
    let lda = ins(Mnemonic::LDA, 10);
    assert_eq!(lda.addr_mode(), Some(AddressingMode::ZeroPage));

    let mut block = Block::new();
    block.push(lda);
    block.push(ins(Mnemonic::LDX, 0x0400));
    assert_eq!(block.link(0x1000)?.code(), [0xa5, 0x0a, 0xae, 0x00, 0x04]);
    Ok(())
}

#[test]
fn test_argument_range() {
    assert_eq!(
        Instruction::new(Mnemonic::LDA, 65536, None),
        Err(InstructionError::ArgumentOutOfRange {
            mnemonic: Mnemonic::LDA,
            value: 65536
        })
    );
    assert_eq!(
        Instruction::new_with_mode(Mnemonic::LDA, AddressingMode::ZeroPage, 256, None),
        Err(InstructionError::ArgumentOutOfRange {
            mnemonic: Mnemonic::LDA,
            value: 256
        })
    );
}

#[test]
fn test_text_data() -> TestResult {
    assert_eq!(
        Data::new("5£", DataMode::Default),
        Err(NodeError::InvalidCharacter('£', Charset::Petscii))
    );

    let mut block = Block::new();
    block.push(Data::new("5£", DataMode::Screen)?);
    assert_eq!(block.link(0x1000)?.code().len(), 2);
    Ok(())
}

#[test]
fn test_nested_scopes() -> TestResult {
    let mut inner = Block::new();
    inner.push(label("loop"));
    inner.push(ins(Mnemonic::DEX, ()));
    inner.push(ins(Mnemonic::BNE, "loop"));

    let mut block = Block::new();
    block.push(label("loop"));
    block.push(imm(Mnemonic::LDX, 8));
    block.push(inner);
    block.push(ins(Mnemonic::JMP, "loop"));

    let program = block.link(0x1000)?;
    assert_eq!(
        program.code(),
        [0xa2, 0x08, 0xca, 0xd0, 0xfd, 0x4c, 0x00, 0x10]
    );
    assert!(program.warnings().is_empty());
    Ok(())
}

#[test]
fn test_unresolved_label() {
    let mut block = Block::new();
    block.push(ins(Mnemonic::JSR, "missing"));
    assert_eq!(
        block.link(0x1000),
        Err(LinkError::UnresolvedLabel("missing".to_string()))
    );
}

#[test]
fn test_label_redefinition_warns() -> TestResult {
    let mut block = Block::new();
    block.push(label("here"));
    block.push(ins(Mnemonic::NOP, ()));
    block.push(label("here"));
    block.push(ins(Mnemonic::JMP, "here"));

    let program = block.link(0x1000)?;
    assert_eq!(program.code(), [0xea, 0x4c, 0x01, 0x10]);
    assert_eq!(
        program.warnings(),
        &[LinkWarning::LabelRedefined {
            name: "here".to_string(),
            previous: 0x1000,
            address: 0x1001
        }]
    );
    Ok(())
}

#[test]
fn test_incomplete_instruction() -> TestResult {
    let mut block = Block::new();
    block.push(Instruction::new(Mnemonic::LDA, (), None)?);
    assert_eq!(
        block.link(0x1000),
        Err(LinkError::IncompleteInstruction("lda".to_string()))
    );
    Ok(())
}

#[test]
fn test_timing() {
    let timing = ins(Mnemonic::BNE, "*").timing().expect("relative mode");
    assert_eq!(timing.cycles, 2);
    assert!(timing.branch_penalty);

    let timing = Instruction::new_with_mode(Mnemonic::LDA, AddressingMode::AbsoluteX, 0x0400, None)
        .expect("valid instruction")
        .timing()
        .expect("absolute x mode");
    assert_eq!(timing.cycles, 4);
    assert!(timing.page_penalty);
}

#[test]
fn test_write() -> TestResult {
    let mut block = Block::new();
    block.push(label("start"));
    block.push(ins(Mnemonic::JMP, "start"));
    let program = block.link(0x0c00)?;

    let dir = std::env::temp_dir();
    let prg = dir.join(format!("c64asm-write-{}.prg", std::process::id()));
    program.write(&prg, OutputFormat::Prg)?;
    assert_eq!(std::fs::read(&prg)?, [0x00, 0x0c, 0x4c, 0x00, 0x0c]);

    let src = dir.join(format!("c64asm-write-{}.asm", std::process::id()));
    program.write(&src, OutputFormat::Src)?;
    assert_eq!(
        std::fs::read_to_string(&src)?,
        ".block\nstart\njmp start\n.bend\n"
    );

    std::fs::remove_file(prg)?;
    std::fs::remove_file(src)?;
    Ok(())
}
