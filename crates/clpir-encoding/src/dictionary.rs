//! Dictionary-backed encoding for archive writers.
//!
//! Archives store dictionary variables once in a side table and keep only
//! their ids next to each logtype.

use std::collections::HashMap;
use std::convert::Infallible;

use crate::decoder::{decode_message_with, MessageRenderer};
use crate::error::{DecodeError, Result};
use crate::message::{encode_message_with, MessageHandler};
use crate::variable::VariableEncoding;

/// Insert-or-lookup store for dictionary variables.
pub trait VariableDictionary {
    /// Return the id for `value`, inserting it if unseen. Ids are stable.
    fn add_or_get(&mut self, value: &str) -> u64;

    /// Look up the value stored under `id`.
    fn get(&self, id: u64) -> Option<&str>;

    /// Number of distinct values stored.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// [`VariableDictionary`] held entirely in memory. Ids are assigned densely from 0.
#[derive(Debug, Clone, Default)]
pub struct InMemoryVariableDictionary {
    ids: HashMap<String, u64>,
    values: Vec<String>,
}

impl InMemoryVariableDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Iterate `(id, value)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &str)> {
        self.values
            .iter()
            .enumerate()
            .map(|(id, value)| (id as u64, value.as_str()))
    }
}

impl VariableDictionary for InMemoryVariableDictionary {
    fn add_or_get(&mut self, value: &str) -> u64 {
        if let Some(&id) = self.ids.get(value) {
            return id;
        }
        let id = self.values.len() as u64;
        self.values.push(value.to_string());
        self.ids.insert(value.to_string(), id);
        tracing::trace!(id, "new dictionary variable");
        id
    }

    fn get(&self, id: u64) -> Option<&str> {
        usize::try_from(id)
            .ok()
            .and_then(|ix| self.values.get(ix))
            .map(String::as_str)
    }

    fn len(&self) -> usize {
        self.values.len()
    }
}

/// A message whose dictionary variables were replaced by dictionary ids.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DictionaryEncodedMessage<E: VariableEncoding> {
    pub logtype: String,
    pub encoded_vars: Vec<E::Var>,
    pub dictionary_ids: Vec<u64>,
}

/// Handler that interns dictionary variables as it encodes.
pub struct LogtypeDictionaryEncoder<'d, E: VariableEncoding, D: VariableDictionary> {
    dictionary: &'d mut D,
    encoded_vars: Vec<E::Var>,
    dictionary_ids: Vec<u64>,
}

impl<'d, E: VariableEncoding, D: VariableDictionary> LogtypeDictionaryEncoder<'d, E, D> {
    pub fn new(dictionary: &'d mut D) -> Self {
        Self {
            dictionary,
            encoded_vars: Vec::new(),
            dictionary_ids: Vec::new(),
        }
    }

    /// Encode one message, interning its dictionary variables.
    pub fn encode(mut self, message: &str) -> DictionaryEncodedMessage<E> {
        let logtype = match encode_message_with::<E, _>(message, &mut self) {
            Ok(logtype) => logtype,
            Err(never) => match never {},
        };
        DictionaryEncodedMessage {
            logtype,
            encoded_vars: self.encoded_vars,
            dictionary_ids: self.dictionary_ids,
        }
    }
}

impl<E: VariableEncoding, D: VariableDictionary> MessageHandler<E>
    for LogtypeDictionaryEncoder<'_, E, D>
{
    type Error = Infallible;

    fn on_constant(&mut self, _constant: &str) -> std::result::Result<(), Infallible> {
        Ok(())
    }

    fn on_encoded_int(&mut self, var: E::Var) -> std::result::Result<(), Infallible> {
        self.encoded_vars.push(var);
        Ok(())
    }

    fn on_encoded_float(&mut self, var: E::Var) -> std::result::Result<(), Infallible> {
        self.encoded_vars.push(var);
        Ok(())
    }

    fn on_dict_var(&mut self, var: &str) -> std::result::Result<(), Infallible> {
        self.dictionary_ids.push(self.dictionary.add_or_get(var));
        Ok(())
    }
}

/// Encode a message, storing its dictionary variables in `dictionary`.
pub fn encode_with_dictionary<E: VariableEncoding, D: VariableDictionary>(
    message: &str,
    dictionary: &mut D,
) -> DictionaryEncodedMessage<E> {
    LogtypeDictionaryEncoder::<E, D>::new(dictionary).encode(message)
}

/// Rebuild a message whose dictionary variables are stored as ids.
pub fn decode_with_dictionary<E: VariableEncoding, D: VariableDictionary>(
    encoded: &DictionaryEncodedMessage<E>,
    dictionary: &D,
) -> Result<String> {
    let dictionary_vars = encoded
        .dictionary_ids
        .iter()
        .map(|&id| dictionary.get(id).ok_or(DecodeError::UnknownDictionaryId(id)))
        .collect::<Result<Vec<&str>>>()?;

    let mut renderer = MessageRenderer::with_capacity(encoded.logtype.len());
    decode_message_with::<E, _, _>(
        &encoded.logtype,
        &encoded.encoded_vars,
        &dictionary_vars,
        &mut renderer,
    )?;
    Ok(renderer.finish())
}
