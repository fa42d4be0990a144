//! Message encoding: splitting a message into a logtype and its variables.

use std::convert::Infallible;

use crate::classifier::next_variable_bounds;
use crate::placeholder::{escape_constant_into, Placeholder};
use crate::variable::{encode_variable, Variable, VariableEncoding};

/// Receives the pieces of a message in left-to-right order.
///
/// Drives both directions: [`encode_message_with`] reports the pieces it
/// finds in a raw message, and [`decode_message_with`](crate::decode_message_with)
/// reports the pieces it reads out of a logtype.
pub trait MessageHandler<E: VariableEncoding> {
    type Error;

    /// Constant text, unescaped. Never empty.
    fn on_constant(&mut self, constant: &str) -> Result<(), Self::Error>;

    fn on_encoded_int(&mut self, var: E::Var) -> Result<(), Self::Error>;

    fn on_encoded_float(&mut self, var: E::Var) -> Result<(), Self::Error>;

    fn on_dict_var(&mut self, var: &str) -> Result<(), Self::Error>;
}

/// Accumulates a logtype, escaping constants as they are appended.
#[derive(Debug, Clone, Default)]
pub struct LogtypeBuilder {
    logtype: String,
}

impl LogtypeBuilder {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            logtype: String::with_capacity(capacity),
        }
    }

    /// Append constant text, escaping placeholder and escape bytes.
    pub fn push_constant(&mut self, constant: &str) {
        escape_constant_into(constant, &mut self.logtype);
    }

    /// Append one placeholder.
    pub fn push_placeholder(&mut self, placeholder: Placeholder) {
        self.logtype.push(char::from(placeholder.as_byte()));
    }

    pub fn len(&self) -> usize {
        self.logtype.len()
    }

    pub fn is_empty(&self) -> bool {
        self.logtype.is_empty()
    }

    pub fn as_str(&self) -> &str {
        &self.logtype
    }

    pub fn finish(self) -> String {
        self.logtype
    }
}

/// Encode `message`, reporting each constant and variable to `handler`.
///
/// Returns the logtype.
pub fn encode_message_with<E, H>(message: &str, handler: &mut H) -> Result<String, H::Error>
where
    E: VariableEncoding,
    H: MessageHandler<E>,
{
    let mut logtype = LogtypeBuilder::with_capacity(message.len());
    let mut constant_begin = 0;
    let mut cursor = 0;

    while let Some(bounds) = next_variable_bounds(message, cursor) {
        cursor = bounds.end;
        if constant_begin < bounds.begin {
            let constant = &message[constant_begin..bounds.begin];
            logtype.push_constant(constant);
            handler.on_constant(constant)?;
        }
        constant_begin = bounds.end;

        match encode_variable::<E>(&message[bounds.begin..bounds.end]) {
            Variable::Integer(var) => {
                logtype.push_placeholder(Placeholder::Integer);
                handler.on_encoded_int(var)?;
            }
            Variable::Float(var) => {
                logtype.push_placeholder(Placeholder::Float);
                handler.on_encoded_float(var)?;
            }
            Variable::Dictionary(var) => {
                logtype.push_placeholder(Placeholder::Dictionary);
                handler.on_dict_var(var)?;
            }
        }
    }

    if constant_begin < message.len() {
        let constant = &message[constant_begin..];
        logtype.push_constant(constant);
        handler.on_constant(constant)?;
    }

    Ok(logtype.finish())
}

/// A message split into its logtype and variable sequences.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedMessage<E: VariableEncoding> {
    pub logtype: String,
    /// Integer and float variables, in order of appearance.
    pub encoded_vars: Vec<E::Var>,
    /// Dictionary variables, in order of appearance.
    pub dictionary_vars: Vec<String>,
}

impl<E: VariableEncoding> EncodedMessage<E> {
    /// Reconstruct the original message.
    pub fn decode(&self) -> crate::Result<String> {
        crate::decode_message::<E>(&self.logtype, &self.encoded_vars, &self.dictionary_vars)
    }
}

/// Encode a message into its logtype and variable sequences.
pub fn encode_message<E: VariableEncoding>(message: &str) -> EncodedMessage<E> {
    let mut vars = VariableCollector::<E>::default();
    let logtype = match encode_message_with::<E, _>(message, &mut vars) {
        Ok(logtype) => logtype,
        Err(never) => match never {},
    };
    EncodedMessage {
        logtype,
        encoded_vars: vars.encoded_vars,
        dictionary_vars: vars.dictionary_vars,
    }
}

#[derive(Debug)]
struct VariableCollector<E: VariableEncoding> {
    encoded_vars: Vec<E::Var>,
    dictionary_vars: Vec<String>,
}

impl<E: VariableEncoding> Default for VariableCollector<E> {
    fn default() -> Self {
        Self {
            encoded_vars: Vec::new(),
            dictionary_vars: Vec::new(),
        }
    }
}

impl<E: VariableEncoding> MessageHandler<E> for VariableCollector<E> {
    type Error = Infallible;

    fn on_constant(&mut self, _constant: &str) -> Result<(), Infallible> {
        Ok(())
    }

    fn on_encoded_int(&mut self, var: E::Var) -> Result<(), Infallible> {
        self.encoded_vars.push(var);
        Ok(())
    }

    fn on_encoded_float(&mut self, var: E::Var) -> Result<(), Infallible> {
        self.encoded_vars.push(var);
        Ok(())
    }

    fn on_dict_var(&mut self, var: &str) -> Result<(), Infallible> {
        self.dictionary_vars.push(var.to_string());
        Ok(())
    }
}
