// Attributes and the ModifyRequest change list.

use bytes::Bytes;

use crate::ber::BerElement;
use crate::error::{DecodeError, EncodeError};

/// Attribute ::= SEQUENCE { type AttributeDescription, vals SET OF value }
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub attr_type: String,
    pub values: Vec<Bytes>,
}

impl Attribute {
    pub fn new(attr_type: impl Into<String>, values: Vec<Bytes>) -> Self {
        Self {
            attr_type: attr_type.into(),
            values,
        }
    }

    pub(crate) fn to_element(&self) -> BerElement {
        BerElement::sequence(vec![
            BerElement::string(&self.attr_type),
            BerElement::set(
                self.values
                    .iter()
                    .map(|v| BerElement::octet_string(v.clone()))
                    .collect(),
            ),
        ])
    }

    pub(crate) fn from_element(kind: &'static str, el: &BerElement) -> Result<Self, DecodeError> {
        let children = el
            .children()
            .map_err(|_| DecodeError::malformed(kind, "attribute is not a sequence"))?;
        let attr_type = children
            .first()
            .ok_or_else(|| DecodeError::malformed(kind, "attribute missing type"))?
            .as_str()
            .map_err(|e| DecodeError::malformed(kind, format!("attribute type: {e}")))?
            .to_owned();
        let value_set = children
            .get(1)
            .ok_or_else(|| DecodeError::malformed(kind, "attribute missing value set"))?
            .children()
            .map_err(|_| DecodeError::malformed(kind, "attribute value set is not constructed"))?;
        let mut values = Vec::with_capacity(value_set.len());
        for value in value_set {
            let bytes = value
                .bytes()
                .map_err(|_| DecodeError::malformed(kind, "attribute value is not primitive"))?;
            values.push(Bytes::copy_from_slice(bytes));
        }
        Ok(Self { attr_type, values })
    }
}

/// The three change kinds of a modify operation, with their wire values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModifyOperation {
    Add = 0,
    Delete = 1,
    Replace = 2,
}

impl ModifyOperation {
    pub fn wire_value(self) -> i64 {
        self as i64
    }

    pub fn from_wire(value: i64) -> Option<Self> {
        match value {
            0 => Some(ModifyOperation::Add),
            1 => Some(ModifyOperation::Delete),
            2 => Some(ModifyOperation::Replace),
            _ => None,
        }
    }
}

/// One entry of a ModifyRequest change list:
/// SEQUENCE { operation ENUMERATED, modification Attribute }.
///
/// Fields are private so the grammar invariants hold from construction on,
/// which keeps encoding total.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modification {
    op: ModifyOperation,
    attr_type: String,
    values: Vec<Bytes>,
}

impl Modification {
    /// Invariants: the attribute type must be non-empty, and an empty value
    /// set is only meaningful for Delete (remove the whole attribute).
    pub fn new(
        op: ModifyOperation,
        attr_type: impl Into<String>,
        values: Vec<Bytes>,
    ) -> Result<Self, EncodeError> {
        let attr_type = attr_type.into();
        if attr_type.is_empty() {
            return Err(EncodeError::Unsupported {
                what: "modification",
                detail: "attribute type must not be empty".to_owned(),
            });
        }
        if values.is_empty() && op != ModifyOperation::Delete {
            return Err(EncodeError::Unsupported {
                what: "modification",
                detail: "empty value set is only valid when deleting an attribute".to_owned(),
            });
        }
        Ok(Self {
            op,
            attr_type,
            values,
        })
    }

    pub fn op(&self) -> ModifyOperation {
        self.op
    }

    pub fn attr_type(&self) -> &str {
        &self.attr_type
    }

    pub fn values(&self) -> &[Bytes] {
        &self.values
    }

    pub(crate) fn to_element(&self) -> BerElement {
        BerElement::sequence(vec![
            BerElement::enumerated(self.op.wire_value()),
            Attribute::new(self.attr_type.clone(), self.values.clone()).to_element(),
        ])
    }

    pub(crate) fn from_element(kind: &'static str, el: &BerElement) -> Result<Self, DecodeError> {
        let children = el
            .children()
            .map_err(|_| DecodeError::malformed(kind, "modification is not a sequence"))?;
        let op_value = children
            .first()
            .ok_or_else(|| DecodeError::malformed(kind, "modification missing operation"))?
            .as_i64()
            .map_err(|e| DecodeError::malformed(kind, format!("modification operation: {e}")))?;
        let op = ModifyOperation::from_wire(op_value)
            .ok_or_else(|| DecodeError::malformed(kind, format!("invalid modify operation: {op_value}")))?;
        let attribute = Attribute::from_element(
            kind,
            children
                .get(1)
                .ok_or_else(|| DecodeError::malformed(kind, "modification missing attribute"))?,
        )?;
        if attribute.attr_type.is_empty() {
            return Err(DecodeError::malformed(kind, "modification attribute type is empty"));
        }
        Ok(Self {
            op,
            attr_type: attribute.attr_type,
            values: attribute.values,
        })
    }
}
