//! Building blocks from Rust code.
//!
//! A [`Macro`] holds procedures which emit nodes through a [`Context`]. Every
//! [`Macro::call`] runs the procedures against a fresh context and returns the resulting
//! [`Block`].
//!
//! ```
//! use c64asm::ast::Mnemonic::*;
//! use c64asm::dsl::{variables, Macro};
//!
//! let clear = Macro::new(variables([("color", 0)])).with_code(|c| {
//!     let color = c.number("color")?;
//!     c.imm(LDA, color)?.ins(STA, 0xd020)?.ins(STA, 0xd021)?.ins(RTS, ())?;
//!     Ok(())
//! });
//!
//! let program = clear.call(variables([("color", 6)]))?.link(0xc000)?;
//! assert_eq!(program.code(), [0xa9, 0x06, 0x8d, 0x20, 0xd0, 0x8d, 0x21, 0xd0, 0x60]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::{
    collections::{BTreeMap, HashSet},
    fmt,
    panic::Location,
    str::FromStr,
};

use thiserror::Error;

use crate::ast::{
    AddressingMode, Align, Argument, Block, Data, DataContent, DataMode, Instruction,
    InstructionError, Label, Mnemonic, Modifier, Node, NodeError,
};

#[derive(Error, Debug, PartialEq, Eq, Clone)]
pub enum MacroError {
    #[error("{location}: {name} is neither a mnemonic nor a variable")]
    NotFound {
        name: String,
        location: &'static Location<'static>,
    },
    #[error("Extraneous variables {}", .0.join(", "))]
    ExtraneousVariables(Vec<String>),
    #[error("{location}: Operand error: {source}")]
    Instruction {
        location: &'static Location<'static>,
        source: InstructionError,
    },
    #[error("{location}: {source}")]
    Node {
        location: &'static Location<'static>,
        source: NodeError,
    },
    #[error("{location}: variable {name} is not {expected}")]
    VariableType {
        name: String,
        expected: &'static str,
        location: &'static Location<'static>,
    },
}

/// Value of a macro variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Number(i64),
    Text(String),
    Bytes(Vec<i64>),
}

macro_rules! impl_number_value {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Value::Number(value as i64)
                }
            }
        )*
    };
}

impl_number_value!(i8, u8, i16, u16, i32, u32, i64);

impl From<&str> for Value {
    fn from(text: &str) -> Self {
        Value::Text(text.to_string())
    }
}

impl From<String> for Value {
    fn from(text: String) -> Self {
        Value::Text(text)
    }
}

impl From<Vec<i64>> for Value {
    fn from(bytes: Vec<i64>) -> Self {
        Value::Bytes(bytes)
    }
}

impl From<&[u8]> for Value {
    fn from(bytes: &[u8]) -> Self {
        Value::Bytes(bytes.iter().map(|b| *b as i64).collect())
    }
}

/// Named values available to the procedures of a macro.
pub type Variables = BTreeMap<String, Value>;

/// Collect variables from name and value pairs.
pub fn variables<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Variables
where
    K: Into<String>,
    V: Into<Value>,
{
    pairs
        .into_iter()
        .map(|(name, value)| (name.into(), value.into()))
        .collect()
}

/// Outcome of [`Context::dispatch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// The name was a mnemonic and the instruction was appended
    Emitted,
    /// The name was a variable
    Variable(Value),
}

/// The state procedures emit into during a single [`Macro::call`].
#[derive(Debug)]
pub struct Context {
    code: Block,
    labels: HashSet<String>,
    variables: Variables,
}

impl Context {
    fn new(variables: Variables) -> Context {
        Context {
            code: Block::new(),
            labels: HashSet::new(),
            variables,
        }
    }

    /// Append an instruction, inferring the addressing mode.
    #[track_caller]
    pub fn ins(
        &mut self,
        mnemonic: Mnemonic,
        argument: impl Into<Argument>,
    ) -> Result<&mut Self, MacroError> {
        let location = Location::caller();
        self.emit(Instruction::new(mnemonic, argument, None), location)
    }

    /// Append an instruction with a label modifier, e.g. `lda #<irq` or `sta uno+1`.
    #[track_caller]
    pub fn ins_mod(
        &mut self,
        mnemonic: Mnemonic,
        argument: impl Into<Argument>,
        modifier: impl Into<Modifier>,
    ) -> Result<&mut Self, MacroError> {
        let location = Location::caller();
        self.emit(
            Instruction::new(mnemonic, argument, Some(modifier.into())),
            location,
        )
    }

    /// Append an instruction in an explicit addressing mode.
    #[track_caller]
    pub fn ins_mode(
        &mut self,
        mnemonic: Mnemonic,
        mode: AddressingMode,
        argument: impl Into<Argument>,
        modifier: Option<Modifier>,
    ) -> Result<&mut Self, MacroError> {
        let location = Location::caller();
        self.emit(
            Instruction::new_with_mode(mnemonic, mode, argument, modifier),
            location,
        )
    }

    /// Append an instruction with an immediate argument.
    #[track_caller]
    pub fn imm(
        &mut self,
        mnemonic: Mnemonic,
        argument: impl Into<Argument>,
    ) -> Result<&mut Self, MacroError> {
        let location = Location::caller();
        self.emit(
            Instruction::new_with_mode(mnemonic, AddressingMode::Immediate, argument, None),
            location,
        )
    }

    /// Append the instruction named `name`, or look up the variable of that name.
    ///
    /// Mnemonics take precedence over variables.
    #[track_caller]
    pub fn dispatch(
        &mut self,
        name: &str,
        argument: impl Into<Argument>,
        modifier: Option<Modifier>,
    ) -> Result<Dispatch, MacroError> {
        let location = Location::caller();
        if let Ok(mnemonic) = Mnemonic::from_str(name) {
            self.emit(Instruction::new(mnemonic, argument, modifier), location)?;
            return Ok(Dispatch::Emitted);
        }

        match self.variables.get(name) {
            Some(value) => Ok(Dispatch::Variable(value.clone())),
            None => {
                tracing::error!("({}) Name {} not found", location, name);
                Err(MacroError::NotFound {
                    name: name.to_string(),
                    location,
                })
            }
        }
    }

    /// Mark the current location with a label.
    #[track_caller]
    pub fn label(&mut self, name: &str) -> Result<&mut Self, MacroError> {
        let location = Location::caller();
        let label = Label::new(name).map_err(|source| MacroError::Node { location, source })?;

        if !self.labels.insert(name.to_string()) {
            tracing::warn!("({}) Redefinition of label {}", location, name);
        }
        self.code.push(label);
        Ok(self)
    }

    /// Continue at `address`, padding the gap with zeroes.
    #[track_caller]
    pub fn align(&mut self, address: i64) -> Result<&mut Self, MacroError> {
        let location = Location::caller();
        let align = Align::new(address).map_err(|source| MacroError::Node { location, source })?;
        self.code.push(align);
        Ok(self)
    }

    /// Append raw data, text or numbers.
    #[track_caller]
    pub fn data(
        &mut self,
        content: impl Into<DataContent>,
        mode: DataMode,
    ) -> Result<&mut Self, MacroError> {
        let location = Location::caller();
        let data = Data::new(content, mode).map_err(|source| MacroError::Node { location, source })?;
        self.code.push(data);
        Ok(self)
    }

    /// Nest a block with its own labels.
    pub fn block(&mut self, block: Block) -> Result<&mut Self, MacroError> {
        self.code.push(block);
        Ok(self)
    }

    /// Splice the nodes of a block into this one, sharing labels.
    #[track_caller]
    pub fn insert(&mut self, block: Block) -> Result<&mut Self, MacroError> {
        let location = Location::caller();
        for node in block.nodes() {
            if let Node::Label(label) = node {
                if !self.labels.insert(label.name().to_string()) {
                    tracing::warn!("({}) Redefinition of label {}", location, label);
                }
            }
        }
        self.code.extend(block);
        Ok(self)
    }

    /// Has a label of this name been emitted into the current scope?
    pub fn has_label(&self, name: &str) -> bool {
        self.labels.contains(name)
    }

    #[track_caller]
    pub fn var(&self, name: &str) -> Result<&Value, MacroError> {
        let location = Location::caller();
        self.variables.get(name).ok_or_else(|| MacroError::NotFound {
            name: name.to_string(),
            location,
        })
    }

    #[track_caller]
    pub fn number(&self, name: &str) -> Result<i64, MacroError> {
        let location = Location::caller();
        match self.var(name)? {
            Value::Number(number) => Ok(*number),
            _ => Err(MacroError::VariableType {
                name: name.to_string(),
                expected: "a number",
                location,
            }),
        }
    }

    #[track_caller]
    pub fn text(&self, name: &str) -> Result<&str, MacroError> {
        let location = Location::caller();
        match self.var(name)? {
            Value::Text(text) => Ok(text),
            _ => Err(MacroError::VariableType {
                name: name.to_string(),
                expected: "text",
                location,
            }),
        }
    }

    #[track_caller]
    pub fn bytes(&self, name: &str) -> Result<&[i64], MacroError> {
        let location = Location::caller();
        match self.var(name)? {
            Value::Bytes(bytes) => Ok(bytes),
            _ => Err(MacroError::VariableType {
                name: name.to_string(),
                expected: "a byte list",
                location,
            }),
        }
    }

    fn emit(
        &mut self,
        instruction: Result<Instruction, InstructionError>,
        location: &'static Location<'static>,
    ) -> Result<&mut Self, MacroError> {
        match instruction {
            Ok(instruction) => {
                self.code.push(instruction);
                Ok(self)
            }
            Err(source) => {
                tracing::error!("({}) Operand error: {}", location, source);
                Err(MacroError::Instruction { location, source })
            }
        }
    }
}

type Procedure = Box<dyn Fn(&mut Context) -> Result<(), MacroError>>;

/// Procedures and default variables producing a [`Block`] on every call.
pub struct Macro {
    variables: Variables,
    procedures: Vec<Procedure>,
}

impl Macro {
    /// Create a macro declaring `variables` with their default values.
    pub fn new(variables: Variables) -> Macro {
        Macro {
            variables,
            procedures: Vec::new(),
        }
    }

    pub fn with_code<F>(mut self, procedure: F) -> Macro
    where
        F: Fn(&mut Context) -> Result<(), MacroError> + 'static,
    {
        self.add_code(procedure);
        self
    }

    /// Add another procedure, run after the existing ones.
    pub fn add_code<F>(&mut self, procedure: F)
    where
        F: Fn(&mut Context) -> Result<(), MacroError> + 'static,
    {
        self.procedures.push(Box::new(procedure));
    }

    pub fn variables(&self) -> &Variables {
        &self.variables
    }

    /// Build a block, overriding the default values with `variables`.
    ///
    /// Only declared variables may be overridden.
    #[tracing::instrument(skip(self))]
    pub fn call(&self, variables: Variables) -> Result<Block, MacroError> {
        let extraneous = variables
            .keys()
            .filter(|name| !self.variables.contains_key(*name))
            .cloned()
            .collect::<Vec<String>>();
        if !extraneous.is_empty() {
            return Err(MacroError::ExtraneousVariables(extraneous));
        }

        let mut merged = self.variables.clone();
        merged.extend(variables);

        let mut context = Context::new(merged);
        for procedure in &self.procedures {
            procedure(&mut context)?;
        }

        Ok(context.code)
    }
}

impl fmt::Debug for Macro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Macro")
            .field("variables", &self.variables)
            .field("procedures", &self.procedures.len())
            .finish()
    }
}
