//! Serde `Deserializer` over an already-built [`Node`] tree.
//!
//! Registered types are constructed by deserializing their `args` node, so this
//! deserializer follows call conventions rather than strict data shapes:
//! - a struct accepts a mapping (named arguments), a sequence (positional arguments in
//!   field order) or a lone scalar (first positional argument);
//! - null deserializes as an empty struct, so types whose fields all have defaults can
//!   be built without arguments;
//! - constructed objects have no data form and are rejected.

use serde::de::{self, DeserializeOwned, Deserializer, IntoDeserializer, Visitor};

use crate::error::Error;
use crate::node::{Mapping, Node, Scalar};

/// Deserialize any `T: DeserializeOwned` from a node.
///
/// ```rust
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize, PartialEq)]
/// struct Limits {
///     retries: u8,
///     timeout: f64,
/// }
///
/// let node = saphyr_wire::from_str("retries: 3\ntimeout: 2\n").unwrap();
/// let limits: Limits = saphyr_wire::from_node(&node).unwrap();
/// assert_eq!(limits, Limits { retries: 3, timeout: 2.0 });
/// ```
pub fn from_node<T: DeserializeOwned>(node: &Node) -> Result<T, Error> {
    T::deserialize(node)
}

fn object_error(node: &Node) -> Error {
    Error::msg(format!(
        "constructed object `{node}` cannot be used where plain data is expected"
    ))
}

impl<'de> Deserializer<'de> for &'de Node {
    type Error = Error;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self {
            Node::Scalar(Scalar::Null) => visitor.visit_unit(),
            Node::Scalar(Scalar::Bool(b)) => visitor.visit_bool(*b),
            Node::Scalar(Scalar::Int(i)) => visitor.visit_i64(*i),
            Node::Scalar(Scalar::Float(x)) => visitor.visit_f64(*x),
            Node::Scalar(Scalar::String(s)) => visitor.visit_borrowed_str(s),
            Node::Sequence(items) => visit_sequence(items, visitor),
            Node::Mapping(map) => visit_mapping(map, visitor),
            Node::Object(_) => Err(object_error(self)),
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self {
            Node::Scalar(Scalar::Null) => visitor.visit_none(),
            _ => visitor.visit_some(self),
        }
    }

    fn deserialize_unit<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self {
            Node::Scalar(Scalar::Null) => visitor.visit_unit(),
            Node::Sequence(items) if items.is_empty() => visitor.visit_unit(),
            Node::Mapping(map) if map.is_empty() => visitor.visit_unit(),
            other => Err(Error::msg(format!("unexpected value for unit: {other}"))),
        }
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        self.deserialize_unit(visitor)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_seq<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self {
            Node::Sequence(items) => visit_sequence(items, visitor),
            Node::Object(_) => Err(object_error(self)),
            other => Err(Error::msg(format!("expected a sequence, found {}", other.kind()))),
        }
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        deserialize_positional(self, visitor)
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        deserialize_positional(self, visitor)
    }

    fn deserialize_map<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self {
            Node::Mapping(map) => visit_mapping(map, visitor),
            Node::Scalar(Scalar::Null) => visit_empty_mapping(visitor),
            Node::Object(_) => Err(object_error(self)),
            other => Err(Error::msg(format!("expected a mapping, found {}", other.kind()))),
        }
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self {
            Node::Mapping(map) => visit_mapping(map, visitor),
            Node::Scalar(Scalar::Null) => visit_empty_mapping(visitor),
            _ => deserialize_positional(self, visitor),
        }
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Self::Error> {
        match self {
            Node::Scalar(Scalar::String(variant)) => {
                let unit: de::value::StrDeserializer<'_, Error> = variant.as_str().into_deserializer();
                visitor.visit_enum(unit)
            }
            Node::Mapping(map) if map.len() == 1 => {
                let (variant, value) = map
                    .iter()
                    .next()
                    .ok_or_else(|| Error::msg("empty enum mapping"))?;
                visitor.visit_enum(EnumAccess { variant, value })
            }
            other => Err(Error::msg(format!(
                "externally tagged enum expected a string or a single-entry mapping, found {other}"
            ))),
        }
    }

    fn deserialize_ignored_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        visitor.visit_unit()
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf identifier
    }
}

impl<'de> IntoDeserializer<'de, Error> for &'de Node {
    type Deserializer = Self;

    fn into_deserializer(self) -> Self {
        self
    }
}

/// `null` read as a map or struct: no entries.
fn visit_empty_mapping<'de, V: Visitor<'de>>(visitor: V) -> Result<V::Value, Error> {
    let mut access = de::value::MapDeserializer::new(std::iter::empty::<(&'de str, &'de Node)>());
    let value = visitor.visit_map(&mut access)?;
    access.end()?;
    Ok(value)
}

fn deserialize_positional<'de, V: Visitor<'de>>(
    node: &'de Node,
    visitor: V,
) -> Result<V::Value, Error> {
    match node {
        Node::Sequence(items) => visit_sequence(items, visitor),
        Node::Object(_) => Err(object_error(node)),
        // A lone value is the first positional argument.
        single => visit_sequence(std::slice::from_ref(single), visitor),
    }
}

fn visit_sequence<'de, V: Visitor<'de>>(items: &'de [Node], visitor: V) -> Result<V::Value, Error> {
    let mut access = de::value::SeqDeserializer::new(items.iter());
    let value = visitor.visit_seq(&mut access)?;
    access.end()?;
    Ok(value)
}

fn visit_mapping<'de, V: Visitor<'de>>(map: &'de Mapping, visitor: V) -> Result<V::Value, Error> {
    let mut access =
        de::value::MapDeserializer::new(map.iter().map(|(key, value)| (key.as_str(), value)));
    let value = visitor.visit_map(&mut access)?;
    access.end()?;
    Ok(value)
}

struct EnumAccess<'de> {
    variant: &'de str,
    value: &'de Node,
}

impl<'de> de::EnumAccess<'de> for EnumAccess<'de> {
    type Error = Error;
    type Variant = VariantAccess<'de>;

    fn variant_seed<S: de::DeserializeSeed<'de>>(
        self,
        seed: S,
    ) -> Result<(S::Value, Self::Variant), Error> {
        let name: de::value::StrDeserializer<'_, Error> = self.variant.into_deserializer();
        let variant = seed.deserialize(name)?;
        Ok((variant, VariantAccess { value: self.value }))
    }
}

struct VariantAccess<'de> {
    value: &'de Node,
}

impl<'de> de::VariantAccess<'de> for VariantAccess<'de> {
    type Error = Error;

    fn unit_variant(self) -> Result<(), Error> {
        de::Deserialize::deserialize(self.value)
    }

    fn newtype_variant_seed<T: de::DeserializeSeed<'de>>(self, seed: T) -> Result<T::Value, Error> {
        seed.deserialize(self.value)
    }

    fn tuple_variant<V: Visitor<'de>>(self, len: usize, visitor: V) -> Result<V::Value, Error> {
        self.value.deserialize_tuple(len, visitor)
    }

    fn struct_variant<V: Visitor<'de>>(
        self,
        fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value, Error> {
        self.value.deserialize_struct("", fields, visitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Point {
        x: i64,
        y: i64,
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Meters(f64);

    #[derive(Debug, Deserialize, PartialEq)]
    enum Activation {
        Relu,
        LeakyRelu { slope: f64 },
    }

    #[test]
    fn struct_from_named_and_positional_arguments() {
        let named: Node = [("x", 1), ("y", 2)].into_iter().collect();
        let positional = Node::Sequence(vec![Node::from(1), Node::from(2)]);
        assert_eq!(from_node::<Point>(&named).unwrap(), Point { x: 1, y: 2 });
        assert_eq!(from_node::<Point>(&positional).unwrap(), Point { x: 1, y: 2 });
    }

    #[test]
    fn single_value_fills_newtype() {
        assert_eq!(from_node::<Meters>(&Node::from(3)).unwrap(), Meters(3.0));
    }

    #[test]
    fn single_value_is_first_positional_field() {
        let err = from_node::<Point>(&Node::from(5)).unwrap_err();
        assert!(err.to_string().contains("invalid length"), "{err}");
    }

    #[test]
    fn externally_tagged_enums() {
        assert_eq!(from_node::<Activation>(&Node::from("Relu")).unwrap(), Activation::Relu);
        let node: Node = [(
            "LeakyRelu",
            [("slope", 0.1)].into_iter().collect::<Node>(),
        )]
        .into_iter()
        .collect();
        assert_eq!(
            from_node::<Activation>(&node).unwrap(),
            Activation::LeakyRelu { slope: 0.1 }
        );
    }

    #[derive(Debug, Default, Deserialize, PartialEq)]
    struct Tuning {
        #[serde(default)]
        rate: Option<f64>,
    }

    #[test]
    fn null_reads_as_an_empty_map_or_struct() {
        let map: std::collections::BTreeMap<String, i64> = from_node(&Node::NULL).unwrap();
        assert!(map.is_empty());
        assert_eq!(from_node::<Tuning>(&Node::NULL).unwrap(), Tuning::default());
    }

    #[test]
    fn unsigned_range_is_checked() {
        assert!(from_node::<u8>(&Node::from(300)).is_err());
        assert_eq!(from_node::<u8>(&Node::from(200)).unwrap(), 200);
    }
}
