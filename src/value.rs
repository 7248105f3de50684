//! Backend-neutral record representation.
//!
//! Records are any serde type that serializes to a map. On the way into the
//! store a record is flattened into an [`Entity`]: one [`Value`] per top-level
//! field. Filters and ordering operate on those values, so the ordering rules
//! below define query semantics for every backend.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use bincode::{Decode, Encode};
use derive_more::From;
use serde::de::DeserializeOwned;
use serde::ser::{self, Serialize};

use crate::error::{BackendError, DatastoneResult};
use crate::identifier::Identifier;

/// A dynamically typed property value.
#[derive(Debug, Clone, From, Encode, Decode)]
pub enum Value {
    #[from(ignore)]
    Null,
    Bool(bool),
    Int(i64),
    /// Unsigned integers that do not fit in `i64`.
    #[from(ignore)]
    UInt(u64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Rank of the value's type family. Values from different families are
    /// ordered by rank alone.
    fn rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::UInt(_) | Value::Float(_) => 2,
            Value::Text(_) => 3,
            Value::Bytes(_) => 4,
            Value::List(_) => 5,
            Value::Map(_) => 6,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::Float(_) => "float",
            Value::Text(_) => "text",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }

    /// Total order used by range filters and sorting.
    pub fn compare(&self, other: &Value) -> Ordering {
        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::Text(a), Value::Text(b)) => a.as_bytes().cmp(b.as_bytes()),
            (Value::Bytes(a), Value::Bytes(b)) => a.cmp(b),
            (Value::List(a), Value::List(b)) => {
                for (x, y) in a.iter().zip(b) {
                    match x.compare(y) {
                        Ordering::Equal => continue,
                        unequal => return unequal,
                    }
                }
                a.len().cmp(&b.len())
            }
            (Value::Map(a), Value::Map(b)) => {
                for ((ka, va), (kb, vb)) in a.iter().zip(b) {
                    match ka.cmp(kb).then_with(|| va.compare(vb)) {
                        Ordering::Equal => continue,
                        unequal => return unequal,
                    }
                }
                a.len().cmp(&b.len())
            }
            _ => self
                .compare_numbers(other)
                .unwrap_or_else(|| self.rank().cmp(&other.rank())),
        }
    }

    fn integer(&self) -> Option<i128> {
        match self {
            Value::Int(i) => Some(i128::from(*i)),
            Value::UInt(u) => Some(i128::from(*u)),
            _ => None,
        }
    }

    /// Exact ordering between numbers; `None` unless both sides are numeric.
    fn compare_numbers(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Float(a), Value::Float(b)) => Some(a.total_cmp(b)),
            (Value::Float(a), b) => b.integer().map(|b| compare_integer_float(b, *a).reverse()),
            (a, Value::Float(b)) => a.integer().map(|a| compare_integer_float(a, *b)),
            (a, b) => Some(a.integer()?.cmp(&b.integer()?)),
        }
    }

    fn from_json(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match (n.as_i64(), n.as_u64()) {
                (Some(i), _) => Value::Int(i),
                (None, Some(u)) => Value::UInt(u),
                (None, None) => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Array(items) => {
                Value::List(items.into_iter().map(Value::from_json).collect())
            }
            serde_json::Value::Object(map) => Value::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    fn into_json(self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Int(i) => serde_json::Value::from(i),
            Value::UInt(u) => serde_json::Value::from(u),
            // Non-finite floats have no JSON form; they come back as null.
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Text(s) => serde_json::Value::String(s),
            Value::Bytes(bytes) => serde_json::Value::Array(
                bytes.into_iter().map(serde_json::Value::from).collect(),
            ),
            Value::List(items) => {
                serde_json::Value::Array(items.into_iter().map(Value::into_json).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.into_iter().map(|(k, v)| (k, v.into_json())).collect(),
            ),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Equal
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_owned())
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value.into())
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(value.into())
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        i64::try_from(value)
            .map(Value::Int)
            .unwrap_or(Value::UInt(value))
    }
}

impl From<&Identifier> for Value {
    fn from(key: &Identifier) -> Self {
        Value::Text(key.encode())
    }
}

impl From<Identifier> for Value {
    fn from(key: Identifier) -> Self {
        Value::from(&key)
    }
}

/// A stored record: named properties in field-name order.
#[derive(Debug, Clone, Default, PartialEq, Encode, Decode)]
pub struct Entity {
    properties: BTreeMap<String, Value>,
}

impl Entity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten `record` into properties.
    ///
    /// Records holding an infinite or NaN float are rejected, since such a
    /// value could be written but never read back.
    pub fn from_record<T: Serialize + ?Sized>(record: &T) -> DatastoneResult<Self> {
        let mut scan = NonFiniteScan::default();
        record.serialize(&mut scan)?;
        if scan.found {
            return Err(BackendError::NonFiniteFloat.into());
        }
        match serde_json::to_value(record)? {
            serde_json::Value::Object(map) => Ok(Self {
                properties: map
                    .into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            }),
            other => Err(BackendError::RecordShape(json_type_name(&other)).into()),
        }
    }

    pub fn into_record<T: DeserializeOwned>(self) -> DatastoneResult<T> {
        let map = self
            .properties
            .into_iter()
            .map(|(k, v)| (k, v.into_json()))
            .collect();
        Ok(serde_json::from_value(serde_json::Value::Object(map))?)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.properties.get(field)
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.properties.insert(field.into(), value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Exact comparison of an integer with a float, without rounding the integer.
fn compare_integer_float(int: i128, float: f64) -> Ordering {
    // 2^127, exactly representable.
    const BOUND: f64 = 170_141_183_460_469_231_731_687_303_715_884_105_728.0;
    if float.is_nan() {
        // Matches `f64::total_cmp`: positive NaN sorts above every number.
        return if float.is_sign_negative() {
            Ordering::Greater
        } else {
            Ordering::Less
        };
    }
    if float >= BOUND {
        return Ordering::Less;
    }
    if float < -BOUND {
        return Ordering::Greater;
    }
    let whole = float.trunc();
    match int.cmp(&(whole as i128)) {
        Ordering::Equal if float > whole => Ordering::Less,
        Ordering::Equal if float < whole => Ordering::Greater,
        ordering => ordering,
    }
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "bool",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

/// Serializer that only looks for floats JSON cannot represent.
#[derive(Default)]
struct NonFiniteScan {
    found: bool,
}

impl NonFiniteScan {
    fn visit<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), serde_json::Error> {
        value.serialize(self)
    }
}

impl<'a> ser::Serializer for &'a mut NonFiniteScan {
    type Ok = ();
    type Error = serde_json::Error;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    fn serialize_bool(self, _: bool) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_i8(self, _: i8) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_i16(self, _: i16) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_i32(self, _: i32) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_i64(self, _: i64) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_i128(self, _: i128) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_u8(self, _: u8) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_u16(self, _: u16) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_u32(self, _: u32) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_u64(self, _: u64) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_u128(self, _: u128) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_f32(self, v: f32) -> Result<(), Self::Error> {
        self.found |= !v.is_finite();
        Ok(())
    }
    fn serialize_f64(self, v: f64) -> Result<(), Self::Error> {
        self.found |= !v.is_finite();
        Ok(())
    }
    fn serialize_char(self, _: char) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_str(self, _: &str) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_bytes(self, _: &[u8]) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_none(self) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<(), Self::Error> {
        self.visit(value)
    }
    fn serialize_unit(self) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_unit_struct(self, _: &'static str) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_unit_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
    ) -> Result<(), Self::Error> {
        Ok(())
    }
    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        value: &T,
    ) -> Result<(), Self::Error> {
        self.visit(value)
    }
    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        value: &T,
    ) -> Result<(), Self::Error> {
        self.visit(value)
    }
    fn serialize_seq(self, _: Option<usize>) -> Result<Self, Self::Error> {
        Ok(self)
    }
    fn serialize_tuple(self, _: usize) -> Result<Self, Self::Error> {
        Ok(self)
    }
    fn serialize_tuple_struct(self, _: &'static str, _: usize) -> Result<Self, Self::Error> {
        Ok(self)
    }
    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self, Self::Error> {
        Ok(self)
    }
    fn serialize_map(self, _: Option<usize>) -> Result<Self, Self::Error> {
        Ok(self)
    }
    fn serialize_struct(self, _: &'static str, _: usize) -> Result<Self, Self::Error> {
        Ok(self)
    }
    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self, Self::Error> {
        Ok(self)
    }
}

impl ser::SerializeSeq for &mut NonFiniteScan {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
        self.visit(value)
    }
    fn end(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl ser::SerializeTuple for &mut NonFiniteScan {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
        self.visit(value)
    }
    fn end(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl ser::SerializeTupleStruct for &mut NonFiniteScan {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
        self.visit(value)
    }
    fn end(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl ser::SerializeTupleVariant for &mut NonFiniteScan {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
        self.visit(value)
    }
    fn end(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl ser::SerializeMap for &mut NonFiniteScan {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<(), Self::Error> {
        self.visit(key)
    }
    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<(), Self::Error> {
        self.visit(value)
    }
    fn end(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl ser::SerializeStruct for &mut NonFiniteScan {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _: &'static str,
        value: &T,
    ) -> Result<(), Self::Error> {
        self.visit(value)
    }
    fn end(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl ser::SerializeStructVariant for &mut NonFiniteScan {
    type Ok = ();
    type Error = serde_json::Error;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _: &'static str,
        value: &T,
    ) -> Result<(), Self::Error> {
        self.visit(value)
    }
    fn end(self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DatastoneError;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Profile {
        name: String,
        age: u32,
        score: f64,
        tags: Vec<String>,
        nickname: Option<String>,
    }

    fn profile() -> Profile {
        Profile {
            name: "ada".into(),
            age: 36,
            score: 9.5,
            tags: vec!["math".into(), "engines".into()],
            nickname: None,
        }
    }

    #[test]
    fn record_flattens_into_properties() {
        let entity = Entity::from_record(&profile()).unwrap();
        assert_eq!(entity.len(), 5);
        assert_eq!(entity.get("name"), Some(&Value::from("ada")));
        assert_eq!(entity.get("age"), Some(&Value::Int(36)));
        assert_eq!(entity.get("nickname"), Some(&Value::Null));
        assert!(matches!(entity.get("tags"), Some(Value::List(items)) if items.len() == 2));
    }

    #[test]
    fn entity_restores_record() {
        let entity = Entity::from_record(&profile()).unwrap();
        let back: Profile = entity.into_record().unwrap();
        assert_eq!(back, profile());
    }

    #[test]
    fn entity_survives_bincode() {
        let entity = Entity::from_record(&profile()).unwrap();
        let bytes = bincode::encode_to_vec(&entity, bincode::config::standard()).unwrap();
        let (decoded, _): (Entity, usize) =
            bincode::decode_from_slice(&bytes, bincode::config::standard()).unwrap();
        assert_eq!(decoded, entity);
    }

    #[test]
    fn scalar_records_are_rejected() {
        let err = Entity::from_record(&42u32).unwrap_err();
        assert!(err.to_string().contains("number"));
    }

    #[test]
    fn numbers_compare_across_int_and_float() {
        assert_eq!(Value::Int(2).compare(&Value::Float(2.0)), Ordering::Equal);
        assert_eq!(Value::Int(2).compare(&Value::Float(2.5)), Ordering::Less);
        assert_eq!(Value::Float(3.1).compare(&Value::Int(3)), Ordering::Greater);
    }

    #[test]
    fn type_families_order_by_rank() {
        let ordered = [
            Value::Null,
            Value::Bool(true),
            Value::Int(-10),
            Value::from("a"),
            Value::Bytes(vec![0]),
            Value::List(vec![]),
            Value::Map(BTreeMap::new()),
        ];
        for pair in ordered.windows(2) {
            assert_eq!(pair[0].compare(&pair[1]), Ordering::Less, "{pair:?}");
        }
    }

    #[test]
    fn large_unsigned_values_stay_exact() {
        assert!(matches!(Value::from(u64::MAX), Value::UInt(u64::MAX)));
        assert!(matches!(Value::from(7u64), Value::Int(7)));
        assert_eq!(
            Value::from(u64::MAX).compare(&Value::Int(i64::MAX)),
            Ordering::Greater
        );
    }

    #[test]
    fn unsigned_fields_round_trip() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Counter {
            hits: u64,
        }

        for hits in [u64::MAX, (1u64 << 63) + 1] {
            let entity = Entity::from_record(&Counter { hits }).unwrap();
            assert_eq!(entity.get("hits"), Some(&Value::UInt(hits)));
            let back: Counter = entity.into_record().unwrap();
            assert_eq!(back, Counter { hits });
        }
    }

    #[test]
    fn integers_compare_exactly_against_floats() {
        let two_53 = 1i64 << 53;
        let float = Value::Float(two_53 as f64);
        assert_eq!(Value::Int(two_53).compare(&float), Ordering::Equal);
        assert_eq!(Value::Int(two_53 + 1).compare(&float), Ordering::Greater);
        assert_eq!(float.compare(&Value::Int(two_53 + 1)), Ordering::Less);
        assert_eq!(Value::Int(two_53 - 1).compare(&float), Ordering::Less);
        assert_ne!(Value::Int(two_53 + 1), float);

        // u64::MAX rounds up to 2^64 as a float.
        assert_eq!(
            Value::UInt(u64::MAX).compare(&Value::Float(u64::MAX as f64)),
            Ordering::Less
        );
        assert_eq!(Value::Int(-3).compare(&Value::Float(-2.5)), Ordering::Less);
        assert_eq!(Value::Int(-2).compare(&Value::Float(-2.5)), Ordering::Greater);
        assert_eq!(Value::Int(i64::MAX).compare(&Value::Float(f64::INFINITY)), Ordering::Less);
        assert_eq!(
            Value::Int(i64::MIN).compare(&Value::Float(f64::NEG_INFINITY)),
            Ordering::Greater
        );
    }

    #[test]
    fn non_finite_floats_are_rejected() {
        #[derive(Serialize)]
        struct Reading {
            label: &'static str,
            samples: Vec<Option<f64>>,
        }

        for bad in [f64::INFINITY, f64::NEG_INFINITY, f64::NAN] {
            let record = Reading {
                label: "sensor-a",
                samples: vec![Some(1.0), Some(bad)],
            };
            assert!(matches!(
                Entity::from_record(&record),
                Err(DatastoneError::Backend(BackendError::NonFiniteFloat))
            ));
        }

        let finite = Reading {
            label: "sensor-a",
            samples: vec![Some(1.0), None],
        };
        assert!(Entity::from_record(&finite).is_ok());
    }
}
