//! Minimal unpickler for Ren'Py archive indices.
//!
//! Ren'Py stores the RPA index as a pickled `dict` mapping names to lists of
//! `(offset, size, prefix)` tuples. The index never contains anything but
//! strings, integers and container structure, so instead of running the
//! pickle virtual machine this interpreter just records every pushed string
//! and integer in order and ignores the structural opcodes.

use vnarc_common::BinaryReader;

use crate::{Error, Result};

/// Opcodes understood by [`unpickle`].
pub mod opcode {
    pub const MARK: u8 = b'(';
    pub const STOP: u8 = b'.';
    pub const BININT4: u8 = b'J';
    pub const BININT1: u8 = b'K';
    pub const BININT2: u8 = b'M';
    pub const SHORT_BINSTRING: u8 = b'U';
    pub const BINUNICODE: u8 = b'X';
    pub const APPEND: u8 = b'a';
    pub const APPENDS: u8 = b'e';
    pub const BINPUT: u8 = b'q';
    pub const LONG_BINPUT: u8 = b'r';
    pub const SETITEMS: u8 = b'u';
    pub const EMPTY_LIST: u8 = b']';
    pub const EMPTY_DICT: u8 = b'}';
    pub const PROTO: u8 = 0x80;
    pub const TUPLE1: u8 = 0x85;
    pub const TUPLE2: u8 = 0x86;
    pub const TUPLE3: u8 = 0x87;
    pub const LONG1: u8 = 0x8a;
}

/// A value pushed by the pickle stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A byte or unicode string, as raw bytes.
    Bytes(Vec<u8>),
    /// An unsigned integer.
    Integer(u64),
}

/// Strings and integers recovered from a pickle stream, in push order.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Unpickled {
    values: Vec<Value>,
}

impl Unpickled {
    fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    /// All values in the order they were pushed.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Only the strings, in push order.
    pub fn bytes(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.values.iter().filter_map(|v| match v {
            Value::Bytes(b) => Some(b.as_slice()),
            Value::Integer(_) => None,
        })
    }

    /// Only the integers, in push order.
    pub fn integers(&self) -> impl Iterator<Item = u64> + '_ {
        self.values.iter().filter_map(|v| match v {
            Value::Integer(n) => Some(*n),
            Value::Bytes(_) => None,
        })
    }

    /// Split into owned string and integer sequences.
    pub fn into_parts(self) -> (Vec<Vec<u8>>, Vec<u64>) {
        let mut bytes = Vec::new();
        let mut integers = Vec::new();
        for value in self.values {
            match value {
                Value::Bytes(b) => bytes.push(b),
                Value::Integer(n) => integers.push(n),
            }
        }
        (bytes, integers)
    }
}

/// Interpret a pickle stream.
///
/// Succeeds only when a STOP opcode is reached. Running out of input first
/// is [`Error::TableCorrupt`]; any opcode outside the supported subset is
/// [`Error::UnsupportedOpcode`].
pub fn unpickle(data: &[u8]) -> Result<Unpickled> {
    let mut reader = BinaryReader::new(data);
    let mut out = Unpickled::default();

    while !reader.is_empty() {
        let position = reader.position();
        let op = reader.read_u8()?;
        match op {
            opcode::SHORT_BINSTRING => {
                let len = operand(reader.read_u8())? as usize;
                out.push(Value::Bytes(operand(reader.read_bytes(len))?.to_vec()));
            }
            opcode::BINUNICODE => {
                let len = operand(reader.read_u32())? as usize;
                out.push(Value::Bytes(operand(reader.read_bytes(len))?.to_vec()));
            }
            opcode::BININT1 => out.push(Value::Integer(operand(reader.read_u8())?.into())),
            opcode::BININT2 => out.push(Value::Integer(operand(reader.read_u16())?.into())),
            opcode::BININT4 => out.push(Value::Integer(operand(reader.read_u32())?.into())),
            opcode::LONG1 => {
                let len = operand(reader.read_u8())? as usize;
                let digits = operand(reader.read_bytes(len))?;
                out.push(Value::Integer(long1_value(digits)));
            }
            opcode::PROTO | opcode::BINPUT => operand(reader.skip(1))?,
            opcode::LONG_BINPUT => operand(reader.skip(4))?,
            opcode::MARK
            | opcode::EMPTY_LIST
            | opcode::EMPTY_DICT
            | opcode::APPEND
            | opcode::APPENDS
            | opcode::SETITEMS
            | opcode::TUPLE1
            | opcode::TUPLE2
            | opcode::TUPLE3 => {}
            opcode::STOP => {
                tracing::debug!(values = out.values.len(), "unpickled table");
                return Ok(out);
            }
            _ => return Err(Error::UnsupportedOpcode { opcode: op, position }),
        }
    }

    Err(Error::TableCorrupt("pickle stream ended without STOP".into()))
}

/// LONG1 payloads are little-endian: the last byte is the most significant.
fn long1_value(digits: &[u8]) -> u64 {
    digits
        .iter()
        .rev()
        .fold(0u64, |acc, &b| acc.wrapping_mul(256).wrapping_add(b.into()))
}

fn operand<T>(result: vnarc_common::Result<T>) -> Result<T> {
    result.map_err(|e| Error::TableCorrupt(format!("truncated pickle operand: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strings_and_integers_in_order() {
        let mut data = vec![opcode::PROTO, 2, opcode::EMPTY_DICT, opcode::BINPUT, 0];
        data.extend_from_slice(&[opcode::MARK, opcode::BINUNICODE, 3, 0, 0, 0]);
        data.extend_from_slice(b"a.b");
        data.extend_from_slice(&[opcode::EMPTY_LIST, opcode::BININT1, 7]);
        data.extend_from_slice(&[opcode::BININT2, 0x34, 0x12]);
        data.extend_from_slice(&[opcode::SHORT_BINSTRING, 2, b'h', b'i']);
        data.extend_from_slice(&[opcode::TUPLE3, opcode::APPEND, opcode::SETITEMS]);
        data.push(opcode::STOP);

        let parsed = unpickle(&data).unwrap();
        assert_eq!(
            parsed.values(),
            &[
                Value::Bytes(b"a.b".to_vec()),
                Value::Integer(7),
                Value::Integer(0x1234),
                Value::Bytes(b"hi".to_vec()),
            ]
        );
        assert_eq!(parsed.bytes().count(), 2);
        assert_eq!(parsed.integers().collect::<Vec<_>>(), vec![7, 0x1234]);
    }

    #[test]
    fn test_long1_is_little_endian() {
        let data = [opcode::LONG1, 3, 0x01, 0x02, 0x03, opcode::STOP];
        let parsed = unpickle(&data).unwrap();
        assert_eq!(parsed.values(), &[Value::Integer(0x030201)]);
    }

    #[test]
    fn test_long_binput_skips_four_bytes() {
        // The skipped operand bytes would be invalid opcodes if interpreted.
        let data = [opcode::LONG_BINPUT, 0xff, 0xff, 0xff, 0xff, opcode::BININT4, 1, 0, 0, 0, opcode::STOP];
        let parsed = unpickle(&data).unwrap();
        assert_eq!(parsed.values(), &[Value::Integer(1)]);
    }

    #[test]
    fn test_missing_stop_is_table_corrupt() {
        let data = [opcode::PROTO, 2, opcode::BININT1, 5];
        assert!(matches!(unpickle(&data), Err(Error::TableCorrupt(_))));
    }

    #[test]
    fn test_truncated_operand_is_table_corrupt() {
        let data = [opcode::SHORT_BINSTRING, 10, b'x'];
        assert!(matches!(unpickle(&data), Err(Error::TableCorrupt(_))));
    }

    #[test]
    fn test_unknown_opcode_aborts() {
        let data = [opcode::BININT1, 1, 0xff, opcode::STOP];
        assert!(matches!(
            unpickle(&data),
            Err(Error::UnsupportedOpcode { opcode: 0xff, position: 2 })
        ));
    }

    #[test]
    fn test_into_parts() {
        let data = [opcode::SHORT_BINSTRING, 1, b'n', opcode::BININT1, 9, opcode::STOP];
        let (bytes, integers) = unpickle(&data).unwrap().into_parts();
        assert_eq!(bytes, vec![b"n".to_vec()]);
        assert_eq!(integers, vec![9]);
    }
}
