// The LDAPMessage envelope:
// SEQUENCE { messageID INTEGER, protocolOp, controls [0] OPTIONAL }.
//
// This is the top of what the codec owns; framing the bytes onto a socket
// belongs to the connection layer above.

use bytes::Bytes;
use tracing::debug;

use crate::ber::{self, BerElement, Tag};
use crate::error::DecodeError;
use crate::ops::ProtocolOp;

const KIND: &str = "LDAPMessage";

/// Context [0] on the envelope: the control list.
const CONTROLS_TAG: u32 = 0;

/// Control ::= SEQUENCE { controlType LDAPOID, criticality BOOLEAN DEFAULT
/// FALSE, controlValue OCTET STRING OPTIONAL }
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Control {
    pub ctype: String,
    pub critical: bool,
    pub value: Option<Bytes>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LdapMessage {
    pub message_id: i32,
    pub protocol_op: ProtocolOp,
    pub controls: Option<Vec<Control>>,
}

impl LdapMessage {
    pub fn new(message_id: i32, protocol_op: ProtocolOp) -> Self {
        Self {
            message_id,
            protocol_op,
            controls: None,
        }
    }

    pub fn with_controls(mut self, controls: Vec<Control>) -> Self {
        self.controls = Some(controls);
        self
    }

    /// Read only the message id and the operation tag, without decoding the
    /// operation. Enough to build an error response when the full decode of
    /// a request fails.
    pub fn peek_header(data: &[u8]) -> Result<(i32, Tag), DecodeError> {
        let root = BerElement::parse(data).map_err(|e| DecodeError::malformed(KIND, e.to_string()))?;
        let children = root
            .children()
            .map_err(|_| DecodeError::malformed(KIND, "envelope is not a sequence"))?;
        let message_id = read_message_id(children)?;
        let op = children
            .get(1)
            .ok_or_else(|| DecodeError::malformed(KIND, "missing protocol operation"))?;
        Ok((message_id, op.tag))
    }

    pub fn parse(data: &[u8]) -> Result<Self, DecodeError> {
        let root = BerElement::parse(data).map_err(|e| DecodeError::malformed(KIND, e.to_string()))?;
        Self::from_element(&root)
    }

    pub fn from_element(el: &BerElement) -> Result<Self, DecodeError> {
        if !el.tag.is_universal(ber::SEQUENCE) {
            return Err(DecodeError::malformed(KIND, "envelope is not a sequence"));
        }
        let children = el
            .children()
            .map_err(|_| DecodeError::malformed(KIND, "envelope is not constructed"))?;
        let message_id = read_message_id(children)?;
        let protocol_op = ProtocolOp::from_element(
            children
                .get(1)
                .ok_or_else(|| DecodeError::malformed(KIND, "missing protocol operation"))?,
        )?;
        let controls = children
            .get(2)
            .filter(|c| c.tag.is_context(CONTROLS_TAG) && c.tag.constructed)
            .map(parse_controls);
        Ok(Self {
            message_id,
            protocol_op,
            controls,
        })
    }

    pub fn to_element(&self) -> BerElement {
        let mut body = vec![
            BerElement::integer(self.message_id as i64),
            self.protocol_op.to_element(),
        ];
        if let Some(controls) = &self.controls {
            body.push(BerElement::constructed(
                Tag::context_constructed(CONTROLS_TAG),
                controls.iter().map(control_to_element).collect(),
            ));
        }
        BerElement::sequence(body)
    }

    pub fn to_vec(&self) -> Vec<u8> {
        self.to_element().to_vec()
    }
}

fn read_message_id(children: &[BerElement]) -> Result<i32, DecodeError> {
    Ok(children
        .first()
        .ok_or_else(|| DecodeError::malformed(KIND, "missing message id"))?
        .as_i64()
        .map_err(|e| DecodeError::malformed(KIND, format!("message id: {e}")))? as i32)
}

fn control_to_element(control: &Control) -> BerElement {
    let mut body = vec![BerElement::string(&control.ctype)];
    if control.critical {
        // DEFAULT FALSE: only encoded when set
        body.push(BerElement::boolean(true));
    }
    if let Some(value) = &control.value {
        body.push(BerElement::octet_string(value.clone()));
    }
    BerElement::sequence(body)
}

/// Controls are advisory at this layer: one that does not decode is skipped
/// instead of poisoning the whole message.
fn parse_controls(list: &BerElement) -> Vec<Control> {
    let Ok(entries) = list.children() else {
        return Vec::new();
    };
    let mut controls = Vec::with_capacity(entries.len());
    for entry in entries {
        match parse_control(entry) {
            Some(control) => controls.push(control),
            None => debug!("skipping undecodable control in message envelope"),
        }
    }
    controls
}

fn parse_control(entry: &BerElement) -> Option<Control> {
    let fields = entry.children().ok()?;
    let ctype = fields.first()?.as_str().ok()?.to_owned();
    let mut critical = false;
    let mut value = None;
    for extra in &fields[1..] {
        if extra.tag.is_universal(ber::BOOLEAN) {
            critical = extra.as_bool().ok()?;
        } else if extra.tag.is_universal(ber::OCTET_STRING) {
            value = Some(Bytes::copy_from_slice(extra.bytes().ok()?));
        }
    }
    Some(Control {
        ctype,
        critical,
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::{BindAuthentication, DelRequest, SearchScope};
    use crate::result::LdapResult;

    /// LDAPMessage with a simple bind, password tagged [0] as the grammar
    /// says. Byte vector checked against a live client capture.
    #[test]
    fn parses_simple_bind_from_wire() {
        let msg = vec![
            0x30, 0x2C, // SEQUENCE length 44
            0x02, 0x01, 0x01, // messageID 1
            0x60, 0x27, // [APPLICATION 0] BindRequest length 39
            0x02, 0x01, 0x03, // version 3
            0x04, 0x1A, 0x63, 0x6E, 0x3D, 0x61, 0x64, 0x6D, 0x69, 0x6E, 0x2C, 0x64, 0x63, 0x3D,
            0x65, 0x78, 0x61, 0x6D, 0x70, 0x6C, 0x65, 0x2C, 0x64, 0x63, 0x3D, 0x63, 0x6F, 0x6D, // name
            0x80, 0x06, 0x73, 0x65, 0x63, 0x72, 0x65, 0x74, // [0] simple "secret"
        ];
        let parsed = LdapMessage::parse(&msg).unwrap();
        assert_eq!(parsed.message_id, 1);
        assert!(parsed.controls.is_none());
        match &parsed.protocol_op {
            ProtocolOp::BindRequest(bind) => {
                assert_eq!(bind.version, 3);
                assert_eq!(bind.name, "cn=admin,dc=example,dc=com");
                assert_eq!(
                    bind.authentication,
                    BindAuthentication::Simple("secret".to_owned())
                );
            }
            other => panic!("expected BindRequest, got {other:?}"),
        }
    }

    #[test]
    fn parses_unbind_from_wire() {
        let msg = vec![0x30, 0x05, 0x02, 0x01, 0x02, 0x42, 0x00];
        let parsed = LdapMessage::parse(&msg).unwrap();
        assert_eq!(parsed.message_id, 2);
        assert_eq!(parsed.protocol_op, ProtocolOp::UnbindRequest);
    }

    #[test]
    fn peek_header_reports_id_and_tag() {
        let msg = LdapMessage::new(9, ProtocolOp::DelRequest(DelRequest::new("cn=x"))).to_vec();
        let (id, tag) = LdapMessage::peek_header(&msg).unwrap();
        assert_eq!(id, 9);
        assert_eq!(tag, Tag::application(10));
    }

    #[test]
    fn envelope_round_trip_with_controls() {
        let original = LdapMessage::new(
            5,
            ProtocolOp::DelRequest(DelRequest::new("cn=patrick,o=ncware,c=ca")),
        )
        .with_controls(vec![Control {
            ctype: "2.16.840.1.113730.3.4.2".to_owned(),
            critical: true,
            value: None,
        }]);
        let parsed = LdapMessage::parse(&original.to_vec()).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn control_criticality_defaults_to_false() {
        let el = BerElement::sequence(vec![
            BerElement::integer(1),
            ProtocolOp::UnbindRequest.to_element(),
            BerElement::constructed(
                Tag::context_constructed(0),
                vec![BerElement::sequence(vec![BerElement::string("1.2.3.4")])],
            ),
        ]);
        let parsed = LdapMessage::from_element(&el).unwrap();
        let controls = parsed.controls.unwrap();
        assert_eq!(controls.len(), 1);
        assert_eq!(controls[0].ctype, "1.2.3.4");
        assert!(!controls[0].critical);
        assert!(controls[0].value.is_none());
    }

    #[test]
    fn undecodable_control_is_skipped() {
        let el = BerElement::sequence(vec![
            BerElement::integer(1),
            ProtocolOp::UnbindRequest.to_element(),
            BerElement::constructed(
                Tag::context_constructed(0),
                vec![
                    // Not a sequence at all
                    BerElement::integer(42),
                    BerElement::sequence(vec![BerElement::string("1.2.3.4")]),
                ],
            ),
        ]);
        let parsed = LdapMessage::from_element(&el).unwrap();
        assert_eq!(parsed.controls.unwrap().len(), 1);
    }

    #[test]
    fn garbage_envelope_is_malformed() {
        let err = LdapMessage::parse(&[0xFF, 0xFF, 0xFF]).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::MalformedOperation { kind: "LDAPMessage", .. }
        ));
    }

    #[test]
    fn unknown_operation_surfaces_from_envelope() {
        let el = BerElement::sequence(vec![
            BerElement::integer(1),
            BerElement::constructed(Tag::new(crate::ber::TagClass::Application, 29, true), vec![]),
        ]);
        assert_eq!(
            LdapMessage::from_element(&el).unwrap_err(),
            DecodeError::UnknownOperation(29)
        );
    }

    #[test]
    fn response_message_round_trip() {
        use crate::ops::SearchResultDone;
        let msg = LdapMessage::new(
            3,
            ProtocolOp::SearchResultDone(SearchResultDone::new(LdapResult::new(
                0,
                "",
                "Success",
            ))),
        );
        let parsed = LdapMessage::parse(&msg.to_vec()).unwrap();
        assert_eq!(parsed, msg);
    }

    #[test]
    fn search_message_round_trip() {
        use crate::ops::SearchRequest;
        let filter = BerElement::primitive(
            Tag::context(7),
            Bytes::from_static(b"objectClass"),
        );
        let msg = LdapMessage::new(
            4,
            ProtocolOp::SearchRequest(SearchRequest {
                base_object: "dc=example,dc=com".to_owned(),
                scope: SearchScope::SingleLevel,
                deref_aliases: 3,
                size_limit: 0,
                time_limit: 0,
                types_only: false,
                filter,
                attributes: vec![],
            }),
        );
        let parsed = LdapMessage::parse(&msg.to_vec()).unwrap();
        assert_eq!(parsed, msg);
    }
}
