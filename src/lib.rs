// LDAP protocol-operation codec: a BER element model plus the LDAPv3
// operation grammar built on top of it.
//
// The codec is purely computational: no I/O and no shared state. Every decoded
// structure is immutable once built, so values can be read from any thread.

pub mod attr;
pub mod ber;
pub mod error;
pub mod message;
pub mod ops;
pub mod result;

pub use attr::{Attribute, Modification, ModifyOperation};
pub use ber::{BerElement, Tag, TagClass};
pub use error::{BerError, DecodeError, EncodeError};
pub use message::{Control, LdapMessage};
pub use ops::{
    AbandonRequest, AddRequest, AddResponse, BindAuthentication, BindRequest, BindResponse,
    CompareRequest, CompareResponse, DelRequest, DelResponse, ExtendedRequest, ExtendedResponse,
    HasBaseDn, ModifyDNRequest, ModifyDNResponse, ModifyRequest, ModifyResponse, ProtocolOp,
    SearchRequest, SearchResultDone, SearchResultEntry, SearchScope,
};
pub use result::LdapResult;
