// The LDAP protocol operations and their BER encodings.
//
// Every operation is one APPLICATION-tagged element. Constructed operations
// carry their fields as an implicitly-tagged SEQUENCE, read back by position.
// Decoding is strict about required fields and deliberately forgiving about
// optional ones: servers in the wild disagree on the fine print, and a bad
// optional field is dropped rather than failing the whole operation.

use bytes::Bytes;
use tracing::debug;

use crate::attr::{Attribute, Modification};
use crate::ber::{self, BerElement, Tag, TagClass};
use crate::error::DecodeError;
use crate::result::LdapResult;

// APPLICATION tag numbers, per the LDAP wire grammar.
pub const TAG_BIND_REQUEST: u32 = 0;
pub const TAG_BIND_RESPONSE: u32 = 1;
pub const TAG_UNBIND_REQUEST: u32 = 2;
pub const TAG_SEARCH_REQUEST: u32 = 3;
pub const TAG_SEARCH_RESULT_ENTRY: u32 = 4;
pub const TAG_SEARCH_RESULT_DONE: u32 = 5;
pub const TAG_MODIFY_REQUEST: u32 = 6;
pub const TAG_MODIFY_RESPONSE: u32 = 7;
pub const TAG_ADD_REQUEST: u32 = 8;
pub const TAG_ADD_RESPONSE: u32 = 9;
pub const TAG_DEL_REQUEST: u32 = 10;
pub const TAG_DEL_RESPONSE: u32 = 11;
pub const TAG_MODIFY_DN_REQUEST: u32 = 12;
pub const TAG_MODIFY_DN_RESPONSE: u32 = 13;
pub const TAG_COMPARE_REQUEST: u32 = 14;
pub const TAG_COMPARE_RESPONSE: u32 = 15;
pub const TAG_ABANDON_REQUEST: u32 = 16;
pub const TAG_EXTENDED_REQUEST: u32 = 23;
pub const TAG_EXTENDED_RESPONSE: u32 = 24;

/// Closed union over every LDAP operation kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolOp {
    BindRequest(BindRequest),
    BindResponse(BindResponse),
    UnbindRequest,
    SearchRequest(SearchRequest),
    SearchResultEntry(SearchResultEntry),
    SearchResultDone(SearchResultDone),
    ModifyRequest(ModifyRequest),
    ModifyResponse(ModifyResponse),
    AddRequest(AddRequest),
    AddResponse(AddResponse),
    DelRequest(DelRequest),
    DelResponse(DelResponse),
    ModifyDNRequest(ModifyDNRequest),
    ModifyDNResponse(ModifyDNResponse),
    CompareRequest(CompareRequest),
    CompareResponse(CompareResponse),
    AbandonRequest(AbandonRequest),
    ExtendedRequest(ExtendedRequest),
    ExtendedResponse(ExtendedResponse),
}

impl ProtocolOp {
    /// The operation's APPLICATION tag number.
    pub fn tag_number(&self) -> u32 {
        match self {
            ProtocolOp::BindRequest(_) => TAG_BIND_REQUEST,
            ProtocolOp::BindResponse(_) => TAG_BIND_RESPONSE,
            ProtocolOp::UnbindRequest => TAG_UNBIND_REQUEST,
            ProtocolOp::SearchRequest(_) => TAG_SEARCH_REQUEST,
            ProtocolOp::SearchResultEntry(_) => TAG_SEARCH_RESULT_ENTRY,
            ProtocolOp::SearchResultDone(_) => TAG_SEARCH_RESULT_DONE,
            ProtocolOp::ModifyRequest(_) => TAG_MODIFY_REQUEST,
            ProtocolOp::ModifyResponse(_) => TAG_MODIFY_RESPONSE,
            ProtocolOp::AddRequest(_) => TAG_ADD_REQUEST,
            ProtocolOp::AddResponse(_) => TAG_ADD_RESPONSE,
            ProtocolOp::DelRequest(_) => TAG_DEL_REQUEST,
            ProtocolOp::DelResponse(_) => TAG_DEL_RESPONSE,
            ProtocolOp::ModifyDNRequest(_) => TAG_MODIFY_DN_REQUEST,
            ProtocolOp::ModifyDNResponse(_) => TAG_MODIFY_DN_RESPONSE,
            ProtocolOp::CompareRequest(_) => TAG_COMPARE_REQUEST,
            ProtocolOp::CompareResponse(_) => TAG_COMPARE_RESPONSE,
            ProtocolOp::AbandonRequest(_) => TAG_ABANDON_REQUEST,
            ProtocolOp::ExtendedRequest(_) => TAG_EXTENDED_REQUEST,
            ProtocolOp::ExtendedResponse(_) => TAG_EXTENDED_RESPONSE,
        }
    }

    /// Decode one operation from its APPLICATION-tagged element.
    pub fn from_element(el: &BerElement) -> Result<Self, DecodeError> {
        if el.tag.class != TagClass::Application {
            return Err(DecodeError::UnknownOperation(el.tag.number));
        }
        match el.tag.number {
            TAG_BIND_REQUEST => Ok(Self::BindRequest(BindRequest::from_element(el)?)),
            TAG_BIND_RESPONSE => Ok(Self::BindResponse(BindResponse::from_element(el)?)),
            TAG_UNBIND_REQUEST => Ok(Self::UnbindRequest),
            TAG_SEARCH_REQUEST => Ok(Self::SearchRequest(SearchRequest::from_element(el)?)),
            TAG_SEARCH_RESULT_ENTRY => {
                Ok(Self::SearchResultEntry(SearchResultEntry::from_element(el)?))
            }
            TAG_SEARCH_RESULT_DONE => {
                Ok(Self::SearchResultDone(SearchResultDone::from_element(el)?))
            }
            TAG_MODIFY_REQUEST => Ok(Self::ModifyRequest(ModifyRequest::from_element(el)?)),
            TAG_MODIFY_RESPONSE => Ok(Self::ModifyResponse(ModifyResponse::from_element(el)?)),
            TAG_ADD_REQUEST => Ok(Self::AddRequest(AddRequest::from_element(el)?)),
            TAG_ADD_RESPONSE => Ok(Self::AddResponse(AddResponse::from_element(el)?)),
            TAG_DEL_REQUEST => Ok(Self::DelRequest(DelRequest::from_element(el)?)),
            TAG_DEL_RESPONSE => Ok(Self::DelResponse(DelResponse::from_element(el)?)),
            TAG_MODIFY_DN_REQUEST => {
                Ok(Self::ModifyDNRequest(ModifyDNRequest::from_element(el)?))
            }
            TAG_MODIFY_DN_RESPONSE => {
                Ok(Self::ModifyDNResponse(ModifyDNResponse::from_element(el)?))
            }
            TAG_COMPARE_REQUEST => Ok(Self::CompareRequest(CompareRequest::from_element(el)?)),
            TAG_COMPARE_RESPONSE => Ok(Self::CompareResponse(CompareResponse::from_element(el)?)),
            TAG_ABANDON_REQUEST => Ok(Self::AbandonRequest(AbandonRequest::from_element(el)?)),
            TAG_EXTENDED_REQUEST => Ok(Self::ExtendedRequest(ExtendedRequest::from_element(el)?)),
            TAG_EXTENDED_RESPONSE => {
                Ok(Self::ExtendedResponse(ExtendedResponse::from_element(el)?))
            }
            number => Err(DecodeError::UnknownOperation(number)),
        }
    }

    /// Encode to the operation's APPLICATION-tagged element. Total: every
    /// invariant was enforced when the operation was built.
    pub fn to_element(&self) -> BerElement {
        match self {
            ProtocolOp::BindRequest(op) => op.to_element(),
            ProtocolOp::BindResponse(op) => op.to_element(),
            ProtocolOp::UnbindRequest => {
                BerElement::primitive(Tag::application(TAG_UNBIND_REQUEST), Bytes::new())
            }
            ProtocolOp::SearchRequest(op) => op.to_element(),
            ProtocolOp::SearchResultEntry(op) => op.to_element(),
            ProtocolOp::SearchResultDone(op) => op.to_element(),
            ProtocolOp::ModifyRequest(op) => op.to_element(),
            ProtocolOp::ModifyResponse(op) => op.to_element(),
            ProtocolOp::AddRequest(op) => op.to_element(),
            ProtocolOp::AddResponse(op) => op.to_element(),
            ProtocolOp::DelRequest(op) => op.to_element(),
            ProtocolOp::DelResponse(op) => op.to_element(),
            ProtocolOp::ModifyDNRequest(op) => op.to_element(),
            ProtocolOp::ModifyDNResponse(op) => op.to_element(),
            ProtocolOp::CompareRequest(op) => op.to_element(),
            ProtocolOp::CompareResponse(op) => op.to_element(),
            ProtocolOp::AbandonRequest(op) => op.to_element(),
            ProtocolOp::ExtendedRequest(op) => op.to_element(),
            ProtocolOp::ExtendedResponse(op) => op.to_element(),
        }
    }
}

/// Uniform access to the target DN of the request kinds that carry one.
///
/// Lets a referral-chasing layer retarget a request before retransmission
/// without knowing which concrete operation it holds. `set_base_dn` replaces
/// the DN only; no other field is touched and no DN syntax is validated.
pub trait HasBaseDn {
    fn base_dn(&self) -> &str;
    fn set_base_dn(&mut self, dn: String);
}

macro_rules! has_base_dn {
    ($ty:ident, $field:ident) => {
        impl HasBaseDn for $ty {
            fn base_dn(&self) -> &str {
                &self.$field
            }

            fn set_base_dn(&mut self, dn: String) {
                self.$field = dn;
            }
        }
    };
}

has_base_dn!(SearchRequest, base_object);
has_base_dn!(ModifyRequest, object);
has_base_dn!(AddRequest, entry);
has_base_dn!(DelRequest, dn);
has_base_dn!(ModifyDNRequest, entry);
has_base_dn!(CompareRequest, entry);

// Field-extraction helpers shared by the positional decoders.

fn op_children<'a>(kind: &'static str, el: &'a BerElement) -> Result<&'a [BerElement], DecodeError> {
    el.children()
        .map_err(|_| DecodeError::malformed(kind, "operation body is not constructed"))
}

fn field<'a>(
    kind: &'static str,
    children: &'a [BerElement],
    index: usize,
    what: &str,
) -> Result<&'a BerElement, DecodeError> {
    children
        .get(index)
        .ok_or_else(|| DecodeError::malformed(kind, format!("missing {what} at index {index}")))
}

fn string_field(
    kind: &'static str,
    children: &[BerElement],
    index: usize,
    what: &str,
) -> Result<String, DecodeError> {
    field(kind, children, index, what)?
        .as_str()
        .map(str::to_owned)
        .map_err(|e| DecodeError::malformed(kind, format!("{what}: {e}")))
}

fn int_field(
    kind: &'static str,
    children: &[BerElement],
    index: usize,
    what: &str,
) -> Result<i64, DecodeError> {
    field(kind, children, index, what)?
        .as_i64()
        .map_err(|e| DecodeError::malformed(kind, format!("{what}: {e}")))
}

fn bool_field(
    kind: &'static str,
    children: &[BerElement],
    index: usize,
    what: &str,
) -> Result<bool, DecodeError> {
    field(kind, children, index, what)?
        .as_bool()
        .map_err(|e| DecodeError::malformed(kind, format!("{what}: {e}")))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindAuthentication {
    /// [0] password
    Simple(String),
    /// [3] SEQUENCE { mechanism, credentials OPTIONAL }
    Sasl { mechanism: String, credentials: Bytes },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindRequest {
    pub version: i32,
    pub name: String,
    pub authentication: BindAuthentication,
}

impl BindRequest {
    const KIND: &'static str = "BindRequest";

    pub fn simple(version: i32, name: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            version,
            name: name.into(),
            authentication: BindAuthentication::Simple(password.into()),
        }
    }

    fn to_element(&self) -> BerElement {
        let auth = match &self.authentication {
            BindAuthentication::Simple(password) => BerElement::primitive(
                Tag::context(0),
                Bytes::copy_from_slice(password.as_bytes()),
            ),
            BindAuthentication::Sasl {
                mechanism,
                credentials,
            } => {
                let mut parts = vec![BerElement::string(mechanism)];
                if !credentials.is_empty() {
                    parts.push(BerElement::octet_string(credentials.clone()));
                }
                BerElement::constructed(Tag::context_constructed(3), parts)
            }
        };
        BerElement::constructed(
            Tag::application_constructed(TAG_BIND_REQUEST),
            vec![
                BerElement::integer(self.version as i64),
                BerElement::string(&self.name),
                auth,
            ],
        )
    }

    fn from_element(el: &BerElement) -> Result<Self, DecodeError> {
        let children = op_children(Self::KIND, el)?;
        let version = int_field(Self::KIND, children, 0, "version")? as i32;
        let name = string_field(Self::KIND, children, 1, "bind DN")?;
        let auth_el = field(Self::KIND, children, 2, "authentication choice")?;

        // SASL is [3] constructed; anything primitive is taken as a simple
        // password whatever its exact tag, since clients disagree here.
        let authentication = if auth_el.tag.is_context(3) && auth_el.is_constructed() {
            let parts = op_children(Self::KIND, auth_el)?;
            let mechanism = string_field(Self::KIND, parts, 0, "SASL mechanism")?;
            let credentials = parts
                .get(1)
                .and_then(|c| c.bytes().ok())
                .map(Bytes::copy_from_slice)
                .unwrap_or_default();
            BindAuthentication::Sasl {
                mechanism,
                credentials,
            }
        } else {
            let password = auth_el
                .as_str()
                .map_err(|e| DecodeError::malformed(Self::KIND, format!("simple password: {e}")))?
                .to_owned();
            BindAuthentication::Simple(password)
        };

        Ok(Self {
            version,
            name,
            authentication,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindResponse {
    pub result: LdapResult,
    /// Server SASL credentials, read from field index 3 when the element
    /// there is a plain octet string (optionally wrapped in one extra
    /// SEQUENCE, a quirk some servers exhibit). Anything else leaves this
    /// absent rather than failing the response.
    pub server_sasl_creds: Option<String>,
}

impl BindResponse {
    const KIND: &'static str = "BindResponse";

    fn to_element(&self) -> BerElement {
        let mut body = Vec::new();
        self.result.append_to(&mut body);
        if let Some(creds) = &self.server_sasl_creds {
            body.push(BerElement::string(creds));
        }
        BerElement::constructed(Tag::application_constructed(TAG_BIND_RESPONSE), body)
    }

    fn from_element(el: &BerElement) -> Result<Self, DecodeError> {
        let children = op_children(Self::KIND, el)?;
        let result = LdapResult::from_children(Self::KIND, children)?;
        let server_sasl_creds = children.get(3).and_then(read_sasl_credentials);
        Ok(Self {
            result,
            server_sasl_creds,
        })
    }
}

/// Lenient credential read: unwrap one SEQUENCE layer if present, then accept
/// only a UTF-8 octet string. Every failure becomes "no credentials".
fn read_sasl_credentials(el: &BerElement) -> Option<String> {
    let el = if el.tag.is_universal(ber::SEQUENCE) {
        el.children().ok()?.first()?
    } else {
        el
    };
    if !el.tag.is_universal(ber::OCTET_STRING) {
        return None;
    }
    match el.as_str() {
        Ok(creds) => Some(creds.to_owned()),
        Err(_) => {
            debug!("dropping undecodable SASL credentials in bind response");
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    BaseObject = 0,
    SingleLevel = 1,
    WholeSubtree = 2,
}

impl SearchScope {
    pub fn wire_value(self) -> i64 {
        self as i64
    }

    pub fn from_wire(value: i64) -> Option<Self> {
        match value {
            0 => Some(SearchScope::BaseObject),
            1 => Some(SearchScope::SingleLevel),
            2 => Some(SearchScope::WholeSubtree),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchRequest {
    pub base_object: String,
    pub scope: SearchScope,
    pub deref_aliases: i32,
    pub size_limit: i32,
    pub time_limit: i32,
    pub types_only: bool,
    /// The search filter, carried opaquely and preserved bit-exact. Filter
    /// construction and evaluation live above this codec.
    pub filter: BerElement,
    pub attributes: Vec<String>,
}

impl SearchRequest {
    const KIND: &'static str = "SearchRequest";

    fn to_element(&self) -> BerElement {
        BerElement::constructed(
            Tag::application_constructed(TAG_SEARCH_REQUEST),
            vec![
                BerElement::string(&self.base_object),
                BerElement::enumerated(self.scope.wire_value()),
                BerElement::enumerated(self.deref_aliases as i64),
                BerElement::integer(self.size_limit as i64),
                BerElement::integer(self.time_limit as i64),
                BerElement::boolean(self.types_only),
                self.filter.clone(),
                BerElement::sequence(
                    self.attributes.iter().map(|a| BerElement::string(a)).collect(),
                ),
            ],
        )
    }

    fn from_element(el: &BerElement) -> Result<Self, DecodeError> {
        let children = op_children(Self::KIND, el)?;
        let base_object = string_field(Self::KIND, children, 0, "base object")?;
        let scope_value = int_field(Self::KIND, children, 1, "scope")?;
        let scope = SearchScope::from_wire(scope_value)
            .ok_or_else(|| DecodeError::malformed(Self::KIND, format!("invalid scope: {scope_value}")))?;
        let deref_aliases = int_field(Self::KIND, children, 2, "deref aliases")? as i32;
        let size_limit = int_field(Self::KIND, children, 3, "size limit")? as i32;
        let time_limit = int_field(Self::KIND, children, 4, "time limit")? as i32;
        let types_only = bool_field(Self::KIND, children, 5, "types-only flag")?;
        let filter = field(Self::KIND, children, 6, "filter")?.clone();
        let attr_list = field(Self::KIND, children, 7, "attribute list")?
            .children()
            .map_err(|_| DecodeError::malformed(Self::KIND, "attribute list is not a sequence"))?;
        let mut attributes = Vec::with_capacity(attr_list.len());
        for attr in attr_list {
            attributes.push(
                attr.as_str()
                    .map_err(|e| DecodeError::malformed(Self::KIND, format!("attribute name: {e}")))?
                    .to_owned(),
            );
        }
        Ok(Self {
            base_object,
            scope,
            deref_aliases,
            size_limit,
            time_limit,
            types_only,
            filter,
            attributes,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResultEntry {
    pub object_name: String,
    pub attributes: Vec<Attribute>,
}

impl SearchResultEntry {
    const KIND: &'static str = "SearchResultEntry";

    fn to_element(&self) -> BerElement {
        BerElement::constructed(
            Tag::application_constructed(TAG_SEARCH_RESULT_ENTRY),
            vec![
                BerElement::string(&self.object_name),
                BerElement::sequence(self.attributes.iter().map(Attribute::to_element).collect()),
            ],
        )
    }

    fn from_element(el: &BerElement) -> Result<Self, DecodeError> {
        let children = op_children(Self::KIND, el)?;
        let object_name = string_field(Self::KIND, children, 0, "object name")?;
        let attr_list = field(Self::KIND, children, 1, "attribute list")?
            .children()
            .map_err(|_| DecodeError::malformed(Self::KIND, "attribute list is not a sequence"))?;
        let mut attributes = Vec::with_capacity(attr_list.len());
        for attr in attr_list {
            attributes.push(Attribute::from_element(Self::KIND, attr)?);
        }
        Ok(Self {
            object_name,
            attributes,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyRequest {
    pub object: String,
    /// Applied by the server in this order; the codec never reorders it.
    pub changes: Vec<Modification>,
}

impl ModifyRequest {
    const KIND: &'static str = "ModifyRequest";

    fn to_element(&self) -> BerElement {
        BerElement::constructed(
            Tag::application_constructed(TAG_MODIFY_REQUEST),
            vec![
                BerElement::string(&self.object),
                BerElement::sequence(self.changes.iter().map(Modification::to_element).collect()),
            ],
        )
    }

    fn from_element(el: &BerElement) -> Result<Self, DecodeError> {
        let children = op_children(Self::KIND, el)?;
        let object = string_field(Self::KIND, children, 0, "object DN")?;
        let change_list = field(Self::KIND, children, 1, "change list")?
            .children()
            .map_err(|_| DecodeError::malformed(Self::KIND, "change list is not a sequence"))?;
        let mut changes = Vec::with_capacity(change_list.len());
        for change in change_list {
            changes.push(Modification::from_element(Self::KIND, change)?);
        }
        Ok(Self { object, changes })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddRequest {
    pub entry: String,
    pub attributes: Vec<Attribute>,
}

impl AddRequest {
    const KIND: &'static str = "AddRequest";

    fn to_element(&self) -> BerElement {
        BerElement::constructed(
            Tag::application_constructed(TAG_ADD_REQUEST),
            vec![
                BerElement::string(&self.entry),
                BerElement::sequence(self.attributes.iter().map(Attribute::to_element).collect()),
            ],
        )
    }

    fn from_element(el: &BerElement) -> Result<Self, DecodeError> {
        let children = op_children(Self::KIND, el)?;
        let entry = string_field(Self::KIND, children, 0, "entry DN")?;
        let attr_list = field(Self::KIND, children, 1, "attribute list")?
            .children()
            .map_err(|_| DecodeError::malformed(Self::KIND, "attribute list is not a sequence"))?;
        let mut attributes = Vec::with_capacity(attr_list.len());
        for attr in attr_list {
            attributes.push(Attribute::from_element(Self::KIND, attr)?);
        }
        Ok(Self { entry, attributes })
    }
}

/// DelRequest ::= [APPLICATION 10] LDAPDN. Primitive: the body is the raw
/// DN octets with no inner wrapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelRequest {
    pub dn: String,
}

impl DelRequest {
    const KIND: &'static str = "DelRequest";

    pub fn new(dn: impl Into<String>) -> Self {
        Self { dn: dn.into() }
    }

    fn to_element(&self) -> BerElement {
        BerElement::primitive(
            Tag::application(TAG_DEL_REQUEST),
            Bytes::copy_from_slice(self.dn.as_bytes()),
        )
    }

    fn from_element(el: &BerElement) -> Result<Self, DecodeError> {
        let dn = el
            .as_str()
            .map_err(|e| DecodeError::malformed(Self::KIND, format!("target DN: {e}")))?
            .to_owned();
        Ok(Self { dn })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModifyDNRequest {
    pub entry: String,
    pub new_rdn: String,
    pub delete_old_rdn: bool,
    /// [0] newSuperior; optional, dropped if it does not decode.
    pub new_superior: Option<String>,
}

impl ModifyDNRequest {
    const KIND: &'static str = "ModifyDNRequest";

    fn to_element(&self) -> BerElement {
        let mut body = vec![
            BerElement::string(&self.entry),
            BerElement::string(&self.new_rdn),
            BerElement::boolean(self.delete_old_rdn),
        ];
        if let Some(superior) = &self.new_superior {
            body.push(BerElement::primitive(
                Tag::context(0),
                Bytes::copy_from_slice(superior.as_bytes()),
            ));
        }
        BerElement::constructed(Tag::application_constructed(TAG_MODIFY_DN_REQUEST), body)
    }

    fn from_element(el: &BerElement) -> Result<Self, DecodeError> {
        let children = op_children(Self::KIND, el)?;
        let entry = string_field(Self::KIND, children, 0, "entry DN")?;
        let new_rdn = string_field(Self::KIND, children, 1, "new RDN")?;
        let delete_old_rdn = bool_field(Self::KIND, children, 2, "delete-old-RDN flag")?;
        let new_superior = children
            .get(3)
            .and_then(|s| s.as_str().ok())
            .map(str::to_owned);
        Ok(Self {
            entry,
            new_rdn,
            delete_old_rdn,
            new_superior,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareRequest {
    pub entry: String,
    pub attr_type: String,
    pub assertion_value: Bytes,
}

impl CompareRequest {
    const KIND: &'static str = "CompareRequest";

    fn to_element(&self) -> BerElement {
        BerElement::constructed(
            Tag::application_constructed(TAG_COMPARE_REQUEST),
            vec![
                BerElement::string(&self.entry),
                BerElement::sequence(vec![
                    BerElement::string(&self.attr_type),
                    BerElement::octet_string(self.assertion_value.clone()),
                ]),
            ],
        )
    }

    fn from_element(el: &BerElement) -> Result<Self, DecodeError> {
        let children = op_children(Self::KIND, el)?;
        let entry = string_field(Self::KIND, children, 0, "entry DN")?;
        let ava = field(Self::KIND, children, 1, "attribute value assertion")?
            .children()
            .map_err(|_| DecodeError::malformed(Self::KIND, "assertion is not a sequence"))?;
        let attr_type = string_field(Self::KIND, ava, 0, "assertion attribute")?;
        let assertion_value = field(Self::KIND, ava, 1, "assertion value")?
            .bytes()
            .map(Bytes::copy_from_slice)
            .map_err(|e| DecodeError::malformed(Self::KIND, format!("assertion value: {e}")))?;
        Ok(Self {
            entry,
            attr_type,
            assertion_value,
        })
    }
}

/// AbandonRequest ::= [APPLICATION 16] MessageID. Primitive: the body is
/// the integer octets of the message id being abandoned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbandonRequest {
    pub message_id: i32,
}

impl AbandonRequest {
    const KIND: &'static str = "AbandonRequest";

    fn to_element(&self) -> BerElement {
        BerElement::primitive(
            Tag::application(TAG_ABANDON_REQUEST),
            ber::int_octets(self.message_id as i64),
        )
    }

    fn from_element(el: &BerElement) -> Result<Self, DecodeError> {
        let message_id = el
            .as_i64()
            .map_err(|e| DecodeError::malformed(Self::KIND, format!("message id: {e}")))?
            as i32;
        Ok(Self { message_id })
    }
}

/// ExtendedRequest ::= [APPLICATION 23] SEQUENCE {
///     requestName [0] LDAPOID, requestValue [1] OCTET STRING OPTIONAL }
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedRequest {
    pub oid: String,
    pub value: Option<Bytes>,
}

impl ExtendedRequest {
    const KIND: &'static str = "ExtendedRequest";

    fn to_element(&self) -> BerElement {
        let mut body = vec![BerElement::primitive(
            Tag::context(0),
            Bytes::copy_from_slice(self.oid.as_bytes()),
        )];
        if let Some(value) = &self.value {
            body.push(BerElement::primitive(Tag::context(1), value.clone()));
        }
        BerElement::constructed(Tag::application_constructed(TAG_EXTENDED_REQUEST), body)
    }

    fn from_element(el: &BerElement) -> Result<Self, DecodeError> {
        let children = op_children(Self::KIND, el)?;
        let oid = string_field(Self::KIND, children, 0, "request OID")?;
        let value = children
            .get(1)
            .and_then(|v| v.bytes().ok())
            .map(Bytes::copy_from_slice);
        Ok(Self { oid, value })
    }
}

/// ExtendedResponse carries the usual trailer plus optional responseName
/// [10] and responseValue [11], which may appear after any referral field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedResponse {
    pub result: LdapResult,
    pub response_name: Option<String>,
    pub response_value: Option<Bytes>,
}

impl ExtendedResponse {
    const KIND: &'static str = "ExtendedResponse";

    fn to_element(&self) -> BerElement {
        let mut body = Vec::new();
        self.result.append_to(&mut body);
        if let Some(name) = &self.response_name {
            body.push(BerElement::primitive(
                Tag::context(10),
                Bytes::copy_from_slice(name.as_bytes()),
            ));
        }
        if let Some(value) = &self.response_value {
            body.push(BerElement::primitive(Tag::context(11), value.clone()));
        }
        BerElement::constructed(Tag::application_constructed(TAG_EXTENDED_RESPONSE), body)
    }

    fn from_element(el: &BerElement) -> Result<Self, DecodeError> {
        let children = op_children(Self::KIND, el)?;
        let result = LdapResult::from_children(Self::KIND, children)?;
        let mut response_name = None;
        let mut response_value = None;
        for extra in children.iter().skip(3) {
            if extra.tag.is_context(10) {
                response_name = extra.as_str().ok().map(str::to_owned);
            } else if extra.tag.is_context(11) {
                response_value = extra.bytes().ok().map(Bytes::copy_from_slice);
            }
        }
        Ok(Self {
            result,
            response_name,
            response_value,
        })
    }
}

macro_rules! result_only_response {
    ($(#[$doc:meta])* $ty:ident, $tag:expr, $kind:literal) => {
        $(#[$doc])*
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub struct $ty {
            pub result: LdapResult,
        }

        impl $ty {
            pub fn new(result: LdapResult) -> Self {
                Self { result }
            }

            fn to_element(&self) -> BerElement {
                let mut body = Vec::new();
                self.result.append_to(&mut body);
                BerElement::constructed(Tag::application_constructed($tag), body)
            }

            fn from_element(el: &BerElement) -> Result<Self, DecodeError> {
                let children = op_children($kind, el)?;
                Ok(Self {
                    result: LdapResult::from_children($kind, children)?,
                })
            }
        }
    };
}

result_only_response!(
    /// Terminal marker closing a search, distinct from the per-entry results.
    SearchResultDone,
    TAG_SEARCH_RESULT_DONE,
    "SearchResultDone"
);
result_only_response!(ModifyResponse, TAG_MODIFY_RESPONSE, "ModifyResponse");
result_only_response!(AddResponse, TAG_ADD_RESPONSE, "AddResponse");
result_only_response!(DelResponse, TAG_DEL_RESPONSE, "DelResponse");
result_only_response!(ModifyDNResponse, TAG_MODIFY_DN_RESPONSE, "ModifyDNResponse");
result_only_response!(CompareResponse, TAG_COMPARE_RESPONSE, "CompareResponse");
