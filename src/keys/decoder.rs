use rusqlite::types::Value as SqlValue;

use super::{RawKeyRow, RawKeyRows};
use crate::error::DecodeError;

/// Turns the generated-key result of a batch into caller-shaped output.
///
/// Implemented for any `Fn(RawKeyRows) -> Result<T, DecodeError>`, so a
/// closure is enough for one-off shapes.
pub trait KeyDecoder<T> {
    fn decode(&self, keys: RawKeyRows) -> Result<T, DecodeError>;
}

impl<F, T> KeyDecoder<T> for F
where
    F: Fn(RawKeyRows) -> Result<T, DecodeError>,
{
    fn decode(&self, keys: RawKeyRows) -> Result<T, DecodeError> {
        self(keys)
    }
}

/// A generated key and, when the key result carries it, the stored payload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Entity {
    pub id: i64,
    pub payload: Option<Vec<u8>>,
}

impl Entity {
    pub fn payload_len(&self) -> usize {
        self.payload.as_ref().map_or(0, Vec::len)
    }

    fn from_key_row(position: usize, row: RawKeyRow) -> Result<Self, DecodeError> {
        let mut values = row.values.into_iter();
        let id = match values.next() {
            Some(value) => read_id(position, value)?,
            None => {
                return Err(DecodeError::MissingColumn {
                    row: position,
                    column: 0,
                })
            }
        };
        let payload = match values.next() {
            Some(value) => read_payload(position, value)?,
            None => None,
        };
        Ok(Entity { id, payload })
    }
}

fn read_id(row: usize, value: SqlValue) -> Result<i64, DecodeError> {
    let found = value.data_type();
    match value {
        SqlValue::Integer(id) => Ok(id),
        SqlValue::Text(s) => s.trim().parse().map_err(|_| DecodeError::Coercion {
            row,
            column: 0,
            expected: "integer",
            found,
        }),
        _ => Err(DecodeError::Coercion {
            row,
            column: 0,
            expected: "integer",
            found,
        }),
    }
}

fn read_payload(row: usize, value: SqlValue) -> Result<Option<Vec<u8>>, DecodeError> {
    match value {
        SqlValue::Blob(bytes) => Ok(Some(bytes)),
        SqlValue::Text(s) => Ok(Some(s.into_bytes())),
        SqlValue::Null => Ok(None),
        other => Err(DecodeError::Coercion {
            row,
            column: 1,
            expected: "blob",
            found: other.data_type(),
        }),
    }
}

/// Lazily decodes key rows into [`Entity`] values, one per `next()`.
pub struct Entities {
    rows: std::vec::IntoIter<RawKeyRow>,
    position: usize,
}

impl Entities {
    pub fn new(keys: RawKeyRows) -> Self {
        Self {
            rows: keys.into_iter(),
            position: 0,
        }
    }
}

impl Iterator for Entities {
    type Item = Result<Entity, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.rows.next()?;
        let position = self.position;
        self.position += 1;
        Some(Entity::from_key_row(position, row))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

/// Decodes `(id, payload?)` key rows into a `Vec<Entity>`.
#[derive(Clone, Copy, Debug, Default)]
pub struct EntityDecoder;

impl KeyDecoder<Vec<Entity>> for EntityDecoder {
    fn decode(&self, keys: RawKeyRows) -> Result<Vec<Entity>, DecodeError> {
        Entities::new(keys).collect()
    }
}
