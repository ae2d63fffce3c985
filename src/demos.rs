//! Demo programs built with the [`dsl`][crate::dsl].

use std::{io::Write, path::PathBuf};

use anyhow::Context as _;

use crate::{
    assembler::{AssemblerError, OutputFormat, Program},
    ast::{AddressingMode, DataMode, Mnemonic::*, Modifier},
    basic::{Basic, BasicError, BASIC_START},
    dsl::{variables, Context, Macro, MacroError, Variables},
};

/// KERNAL routine clearing the screen
const CLEAR_SCREEN: i64 = 0xe544;
/// KERNAL routine printing the character in the accumulator
const CHROUT: i64 = 0xffd2;
/// Marks the end of a line in the demo texts
const NEWLINE: i64 = b'#' as i64;

const IRQ_VECTOR: i64 = 0x0314;
const SCREEN: i64 = 0x0400;
const BORDER_COLOR: i64 = 0xd020;
const BACKGROUND_COLOR: i64 = 0xd021;
const RASTER: i64 = 0xd012;
const VIC_CONTROL: i64 = 0xd011;
const VIC_IRQ_STATUS: i64 = 0xd019;
const VIC_IRQ_ENABLE: i64 = 0xd01a;

// Zero page variables of the raster bars
const BAR_START: i64 = 0x20;
const BAR_END: i64 = 0x21;
const RASTER_MODE: i64 = 0x22;
const LINE_OFFSET: i64 = 0x23;
const COUNTER: i64 = 0x26;
const TEXT_PTR: i64 = 0x27;

const CHAR_OFFSET: i64 = 39;
const END_POS: i64 = 16;

/// Prints a message using the KERNAL, started with `SYS 49152`.
pub fn hello_world() -> Result<Macro, BasicError> {
    let stub = Basic::new("10 SYS 49152", BASIC_START as i64, true)?.code();

    Ok(
        Macro::new(variables([("message", "HELLO WORLD#")])).with_code(move |c| {
            c.block(stub.clone())?;

            c.align(0xc000)?;
            c.ins(JSR, CLEAR_SCREEN)?;
            c.imm(LDX, 0)?;
            c.label("load")?;
            c.ins_mode(LDA, AddressingMode::AbsoluteX, "msg", None)?;
            c.imm(CMP, NEWLINE)?;
            c.ins(BEQ, "finish")?;
            c.ins(JSR, CHROUT)?;
            c.ins(INX, ())?;
            c.ins(JMP, "load")?;
            c.label("finish")?.ins(RTS, ())?;

            let message = c.text("message")?.to_string();
            c.label("msg")?.data(message, DataMode::Default)?;
            Ok(())
        }),
    )
}

/// Waits for `COUNTER` to reach the value in X, which the interrupt increments every frame.
fn wait() -> Macro {
    Macro::new(Variables::new()).with_code(|c| {
        c.label("wl")?;
        c.ins(CPX, COUNTER)?.ins(BNE, "wl")?;
        c.imm(LDA, 0)?.ins(STA, COUNTER)?;
        c.ins(RTS, ())?;
        Ok(())
    })
}

/// Types the text pointed to by `TEXT_PTR` onto the screen, one character per frame.
fn text_gun() -> Macro {
    Macro::new(Variables::new()).with_code(|c| {
        c.imm(LDX, END_POS)?.ins(STX, LINE_OFFSET)?;
        c.imm(LDX, CHAR_OFFSET)?.imm(LDY, 0)?;

        c.label("wpre")?;
        c.ins(LDA, COUNTER)?.imm(CMP, 1)?.ins(BNE, "wpre")?;

        // Cursor
        c.imm(LDA, 0x20)?;
        c.label("uno")?;
        c.ins_mode(STA, AddressingMode::AbsoluteX, SCREEN, None)?;

        c.label("wpo")?;
        c.ins(LDA, COUNTER)?.imm(CMP, 1)?.ins(BNE, "wpo")?;
        c.ins(DEX, ())?;

        c.label("put_char")?;
        c.ins_mode(LDA, AddressingMode::IndirectIndexedY, TEXT_PTR, None)?;
        c.ins(BMI, "end")?;
        c.imm(CMP, 0x20)?.ins(BEQ, "skip_char")?;
        c.imm(CMP, NEWLINE)?.ins(BEQ, "next_line")?;
        c.label("dos")?;
        c.ins_mode(STA, AddressingMode::AbsoluteX, SCREEN, None)?;
        c.ins(CPX, LINE_OFFSET)?.ins(BNE, "end_char")?;
        c.ins(INC, LINE_OFFSET)?.imm(LDX, CHAR_OFFSET)?.ins(INY, ())?;

        c.label("end_char")?;
        c.imm(LDA, 0)?.ins(STA, COUNTER)?;
        c.ins(JMP, "wpre")?;

        c.label("skip_char")?;
        c.ins(INC, LINE_OFFSET)?.imm(LDX, CHAR_OFFSET)?.ins(INY, ())?;
        c.imm(LDA, 0)?.ins(STA, COUNTER)?;
        c.ins(JMP, "wpre")?;

        // Move the bars down a line and the screen pointers a row
        c.label("next_line")?;
        c.ins(TXA, ())?.ins(PHA, ())?;
        c.imm(LDX, 7)?;
        c.label("rbardown")?;
        c.ins(LDA, COUNTER)?.imm(CMP, 1)?.ins(BNE, "rbardown")?;
        c.imm(LDA, 0)?.ins(STA, COUNTER)?;
        c.ins(INC, BAR_END)?.ins(DEX, ())?.ins(BPL, "rbardown")?;
        c.ins(PLA, ())?.ins(TAX, ())?;

        c.ins_mod(LDA, "uno", 1)?.ins(CLC, ())?.imm(ADC, 40)?;
        c.ins(BCC, "skip_high")?;
        c.ins(PHA, ())?;
        c.ins_mod(LDA, "uno", 2)?.ins(CLC, ())?.imm(ADC, 1)?;
        c.ins_mod(STA, "uno", 2)?.ins_mod(STA, "dos", 2)?;
        c.ins(PLA, ())?;
        c.label("skip_high")?;
        c.ins_mod(STA, "uno", 1)?.ins_mod(STA, "dos", 1)?;

        c.imm(LDA, END_POS)?.ins(STA, LINE_OFFSET)?;
        c.imm(LDX, CHAR_OFFSET)?.ins(INY, ())?;
        c.imm(LDA, 0)?.ins(STA, COUNTER)?;
        c.ins(JMP, "wpre")?;

        c.label("end")?.ins(RTS, ())?;
        Ok(())
    })
}

/// Switches the colors at the top and the bottom of the bar.
fn raster_interrupt() -> Macro {
    Macro::new(variables([("top_color", 0), ("bar_color", 1)])).with_code(|c| {
        c.ins(LDX, RASTER)?.ins(INX, ())?.ins(STX, RASTER)?;
        c.ins_mod(LDA, "rtr_sync", Modifier::LowByte)?;
        c.ins(STA, IRQ_VECTOR)?;
        c.ins(ASL, VIC_IRQ_STATUS)?;
        c.ins(CLI, ())?;
        for _ in 0..10 {
            c.ins(NOP, ())?;
        }

        // Stabilize the raster
        c.label("rtr_sync")?;
        c.ins(NOP, ())?;
        c.ins(CPX, RASTER)?;
        c.ins_mod(BNE, "*", 2)?;

        c.ins(LDA, RASTER_MODE)?.ins(BNE, "rtr_mode_e")?;

        let top_color = c.number("top_color")?;
        c.imm(LDA, 1)?.ins(STA, RASTER_MODE)?;
        c.imm(LDA, top_color)?;
        c.ins(STA, BORDER_COLOR)?.ins(STA, BACKGROUND_COLOR)?;
        c.ins(LDA, BAR_START)?.ins(STA, RASTER)?;
        c.ins(JMP, "rtr_end")?;

        let bar_color = c.number("bar_color")?;
        c.label("rtr_mode_e")?;
        c.imm(LDA, 0)?.ins(STA, RASTER_MODE)?;
        c.imm(LDA, bar_color)?;
        c.ins(STA, BORDER_COLOR)?.ins(STA, BACKGROUND_COLOR)?;
        c.ins(LDA, BAR_END)?.ins(STA, RASTER)?;

        c.label("rtr_end")?;
        c.ins(INC, COUNTER)?;
        c.ins(ASL, VIC_IRQ_STATUS)?;
        c.ins(PLA, ())?.ins(TAY, ())?.ins(PLA, ())?.ins(TAX, ())?.ins(PLA, ())?;
        c.ins(RTI, ())?;
        Ok(())
    })
}

/// A raster interrupt moving color bars, followed by a text typed onto the screen.
///
/// The program starts right after its BASIC stub at `$080e`.
pub fn raster_bars() -> Result<Macro, BasicError> {
    let stub = Basic::new("10 SYS 2062", BASIC_START as i64, true)?.code();

    Ok(
        Macro::new(variables([("top_color", 0), ("bar_color", 1)]))
            .with_code(move |c| {
                c.block(stub.clone())?;
                Ok(())
            })
            .with_code(raster_bars_main),
    )
}

fn raster_bars_main(c: &mut Context) -> Result<(), MacroError> {
    c.imm(LDA, 140)?.ins(STA, BAR_START)?;
    c.imm(LDA, 149)?.ins(STA, BAR_END)?;
    c.imm(LDA, 0)?;
    c.ins(STA, RASTER_MODE)?.ins(STA, COUNTER)?.ins(STA, LINE_OFFSET)?;
    c.ins(JSR, CLEAR_SCREEN)?;

    c.imm(LDA, 0x1b)?.ins(STA, VIC_CONTROL)?;
    c.imm(LDA, 0x08)?.ins(STA, 0xd016)?;
    c.imm(LDA, 0x14)?.ins(STA, 0xd018)?;

    // Raster interrupt only
    c.ins(SEI, ())?;
    c.imm(LDA, 0x7f)?.ins(STA, 0xdc0d)?.ins(STA, 0xdd0d)?;
    c.ins(LDA, VIC_IRQ_ENABLE)?.imm(ORA, 1)?.ins(STA, VIC_IRQ_ENABLE)?;
    c.ins_mod(LDA, "rtr_int", Modifier::LowByte)?.ins(STA, IRQ_VECTOR)?;
    c.ins_mod(LDA, "rtr_int", Modifier::HighByte)?.ins(STA, IRQ_VECTOR + 1)?;
    c.ins(LDA, VIC_CONTROL)?.imm(AND, 0x7f)?.ins(STA, VIC_CONTROL)?;
    c.ins(LDA, BAR_START)?.ins(STA, RASTER)?;
    c.ins(CLI, ())?;

    c.label("start")?;
    c.imm(LDX, 10)?.ins(JSR, "sub_wait")?;
    c.label("barup")?;
    c.imm(LDX, 1)?.ins(JSR, "sub_wait")?;
    c.ins(DEC, BAR_START)?.ins(DEC, BAR_END)?;
    c.ins(LDA, BAR_START)?.imm(CMP, 49)?.ins(BNE, "barup")?;

    c.imm(LDX, 8)?.ins(JSR, "sub_wait")?;
    c.ins_mod(LDA, "textdata", Modifier::LowByte)?.ins(STA, TEXT_PTR)?;
    c.ins_mod(LDA, "textdata", Modifier::HighByte)?.ins(STA, TEXT_PTR + 1)?;
    c.ins(JSR, "textgun")?;
    c.label("infloop")?.ins(JMP, "infloop")?;

    c.label("textgun")?.block(text_gun().call(Variables::new())?)?;
    c.label("sub_wait")?.block(wait().call(Variables::new())?)?;

    c.label("textdata")?;
    for line in ["#this is a test#", "#", "of some data test#", "test @ test.com 123#"] {
        c.data(line, DataMode::Screen)?;
    }
    c.data([0xff_i64], DataMode::Default)?;

    c.align(0x4000)?;
    c.label("rtr_int")?;
    let colors = variables([
        ("top_color", c.number("top_color")?),
        ("bar_color", c.number("bar_color")?),
    ]);
    c.block(raster_interrupt().call(colors)?)?;
    Ok(())
}

/// The bundled demo programs.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    clap::ValueEnum,
    strum_macros::Display,
    strum_macros::EnumIter,
)]
#[strum(serialize_all = "kebab-case")]
pub enum Demo {
    HelloWorld,
    RasterBars,
}

impl Demo {
    pub fn source(&self) -> Result<Macro, BasicError> {
        match self {
            Demo::HelloWorld => hello_world(),
            Demo::RasterBars => raster_bars(),
        }
    }

    /// Build the demo with its default variables and link it.
    #[tracing::instrument]
    pub fn assemble(&self) -> Result<Program, AssemblerError> {
        let block = self.source()?.call(Variables::new())?;
        Ok(block.link_default()?)
    }
}

#[derive(clap::Args, Debug, Clone)]
pub struct DemoArgs {
    /// Demo to build
    #[clap(value_enum)]
    pub name: Demo,

    /// Output file, the program is printed to stdout when missing
    #[clap(short, long)]
    pub output: Option<PathBuf>,

    /// Output format, `prg` when writing a file and `dump` otherwise
    #[clap(short, long, value_enum)]
    pub format: Option<OutputFormat>,
}

/// Build a demo and write or print it.
#[tracing::instrument]
pub fn build(args: &DemoArgs) -> anyhow::Result<()> {
    let program = args
        .name
        .assemble()
        .with_context(|| format!("Failed to build {}", args.name))?;

    match &args.output {
        Some(path) => {
            let format = args.format.unwrap_or(OutputFormat::Prg);
            program
                .write(path, format)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::info!("Wrote {} as {} to {}", args.name, format, path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            match args.format.unwrap_or(OutputFormat::Dump) {
                OutputFormat::Prg => stdout.write_all(&program.to_prg())?,
                OutputFormat::Src => writeln!(stdout, "{}", program.to_source().join("\n"))?,
                OutputFormat::Dump => writeln!(stdout, "{}", program.dump().join("\n"))?,
            }
        }
    }

    Ok(())
}
