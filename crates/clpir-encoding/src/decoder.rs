//! Message decoding: rebuilding a message from its logtype and variables.

use crate::error::{DecodeError, Result};
use crate::message::MessageHandler;
use crate::placeholder::{Placeholder, ESCAPE};
use crate::variable::{decode_float, decode_integer, VariableEncoding};

/// Walk a logtype, reporting constants and variables to `handler` in order.
///
/// Integer and float placeholders consume `encoded_vars`; dictionary
/// placeholders consume `dictionary_vars`. Surplus variables are ignored.
pub fn decode_message_with<E, H, S>(
    logtype: &str,
    encoded_vars: &[E::Var],
    dictionary_vars: &[S],
    handler: &mut H,
) -> std::result::Result<(), H::Error>
where
    E: VariableEncoding,
    H: MessageHandler<E>,
    H::Error: From<DecodeError>,
    S: AsRef<str>,
{
    let bytes = logtype.as_bytes();
    let mut encoded = encoded_vars.iter().copied();
    let mut dictionary = dictionary_vars.iter();
    let mut constant_begin = 0;
    let mut pos = 0;

    while pos < bytes.len() {
        let byte = bytes[pos];
        if byte == ESCAPE {
            if pos + 1 == bytes.len() {
                return Err(DecodeError::UnexpectedTrailingEscape.into());
            }
            if constant_begin < pos {
                handler.on_constant(&logtype[constant_begin..pos])?;
            }
            // The escaped byte starts the next constant run.
            constant_begin = pos + 1;
            pos += 2;
            continue;
        }

        let Some(placeholder) = Placeholder::from_byte(byte) else {
            pos += 1;
            continue;
        };
        if constant_begin < pos {
            handler.on_constant(&logtype[constant_begin..pos])?;
        }
        match placeholder {
            Placeholder::Integer => {
                let var = encoded.next().ok_or(DecodeError::TooFewEncodedVars)?;
                handler.on_encoded_int(var)?;
            }
            Placeholder::Float => {
                let var = encoded.next().ok_or(DecodeError::TooFewEncodedVars)?;
                handler.on_encoded_float(var)?;
            }
            Placeholder::Dictionary => {
                let var = dictionary.next().ok_or(DecodeError::TooFewDictionaryVars)?;
                handler.on_dict_var(var.as_ref())?;
            }
        }
        pos += 1;
        constant_begin = pos;
    }

    if constant_begin < bytes.len() {
        handler.on_constant(&logtype[constant_begin..])?;
    }
    Ok(())
}

/// Rebuild the original message text.
pub fn decode_message<E: VariableEncoding>(
    logtype: &str,
    encoded_vars: &[E::Var],
    dictionary_vars: &[impl AsRef<str>],
) -> Result<String> {
    let mut renderer = MessageRenderer::with_capacity(logtype.len());
    decode_message_with::<E, _, _>(logtype, encoded_vars, dictionary_vars, &mut renderer)?;
    Ok(renderer.finish())
}

/// Renders message pieces as human-readable text.
#[derive(Debug, Clone, Default)]
pub struct MessageRenderer {
    out: String,
}

impl MessageRenderer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            out: String::with_capacity(capacity),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.out
    }

    pub fn finish(self) -> String {
        self.out
    }
}

impl<E: VariableEncoding> MessageHandler<E> for MessageRenderer {
    type Error = DecodeError;

    fn on_constant(&mut self, constant: &str) -> Result<()> {
        self.out.push_str(constant);
        Ok(())
    }

    fn on_encoded_int(&mut self, var: E::Var) -> Result<()> {
        self.out.push_str(&decode_integer::<E>(var));
        Ok(())
    }

    fn on_encoded_float(&mut self, var: E::Var) -> Result<()> {
        self.out.push_str(&decode_float::<E>(var)?);
        Ok(())
    }

    fn on_dict_var(&mut self, var: &str) -> Result<()> {
        self.out.push_str(var);
        Ok(())
    }
}
