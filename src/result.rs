// LDAPResult: the common trailer carried by every response operation.
//
// Parsed positionally: resultCode ENUMERATED, matchedDN, errorMessage, then an
// optional [3] referral list. The referral field is optional data: if it is
// absent or does not decode, the response is still good and the field is None.

use tracing::debug;

use crate::ber::{self, BerElement, Tag};
use crate::error::DecodeError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LdapResult {
    pub result_code: i32,
    pub matched_dn: String,
    pub error_message: String,
    pub referrals: Option<Vec<String>>,
}

impl LdapResult {
    pub fn new(result_code: i32, matched_dn: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            result_code,
            matched_dn: matched_dn.into(),
            error_message: error_message.into(),
            referrals: None,
        }
    }

    pub fn success() -> Self {
        Self::new(0, "", "")
    }

    pub fn with_referrals(mut self, urls: Vec<String>) -> Self {
        self.referrals = Some(urls);
        self
    }

    /// Parse the trailer out of a response element's children. `kind` names
    /// the operation for error reporting.
    pub(crate) fn from_children(kind: &'static str, children: &[BerElement]) -> Result<Self, DecodeError> {
        let code_el = children
            .first()
            .ok_or_else(|| DecodeError::malformed(kind, "missing result code"))?;
        if !(code_el.tag.is_universal(ber::ENUMERATED) || code_el.tag.is_universal(ber::INTEGER)) {
            return Err(DecodeError::malformed(
                kind,
                format!("result code has unexpected tag {:?}", code_el.tag),
            ));
        }
        let result_code = code_el
            .as_i64()
            .map_err(|e| DecodeError::malformed(kind, format!("result code: {e}")))?
            as i32;

        let matched_dn = children
            .get(1)
            .ok_or_else(|| DecodeError::malformed(kind, "missing matched DN"))?
            .as_str()
            .map_err(|e| DecodeError::malformed(kind, format!("matched DN: {e}")))?
            .to_owned();

        let error_message = children
            .get(2)
            .ok_or_else(|| DecodeError::malformed(kind, "missing error message"))?
            .as_str()
            .map_err(|e| DecodeError::malformed(kind, format!("error message: {e}")))?
            .to_owned();

        let referrals = children.get(3).and_then(parse_referrals);

        Ok(Self {
            result_code,
            matched_dn,
            error_message,
            referrals,
        })
    }

    /// Append the trailer fields to a response element body.
    pub(crate) fn append_to(&self, out: &mut Vec<BerElement>) {
        out.push(BerElement::enumerated(self.result_code as i64));
        out.push(BerElement::string(&self.matched_dn));
        out.push(BerElement::string(&self.error_message));
        if let Some(urls) = &self.referrals {
            out.push(BerElement::constructed(
                Tag::context_constructed(3),
                urls.iter().map(|u| BerElement::string(u)).collect(),
            ));
        }
    }
}

/// Referral ::= [3] SEQUENCE OF LDAPURL. Anything that does not match is
/// treated as "no referrals" rather than a decode failure.
fn parse_referrals(el: &BerElement) -> Option<Vec<String>> {
    if !(el.tag.is_context(3) && el.tag.constructed) {
        return None;
    }
    let children = el.children().ok()?;
    let mut urls = Vec::with_capacity(children.len());
    for child in children {
        match child.as_str() {
            Ok(url) => urls.push(url.to_owned()),
            Err(_) => {
                debug!("dropping referral list with undecodable URL");
                return None;
            }
        }
    }
    Some(urls)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trailer(code: i32, dn: &str, msg: &str) -> Vec<BerElement> {
        vec![
            BerElement::enumerated(code as i64),
            BerElement::string(dn),
            BerElement::string(msg),
        ]
    }

    #[test]
    fn parses_plain_trailer() {
        let children = trailer(32, "o=ncware,c=ca", "no such object");
        let result = LdapResult::from_children("DelResponse", &children).unwrap();
        assert_eq!(result.result_code, 32);
        assert_eq!(result.matched_dn, "o=ncware,c=ca");
        assert_eq!(result.error_message, "no such object");
        assert!(result.referrals.is_none());
    }

    #[test]
    fn parses_referral_list() {
        let mut children = trailer(10, "", "");
        children.push(BerElement::constructed(
            Tag::context_constructed(3),
            vec![
                BerElement::string("ldap://alpha.example/o=x"),
                BerElement::string("ldap://beta.example/o=x"),
            ],
        ));
        let result = LdapResult::from_children("ModifyResponse", &children).unwrap();
        assert_eq!(
            result.referrals.as_deref(),
            Some(
                &[
                    "ldap://alpha.example/o=x".to_owned(),
                    "ldap://beta.example/o=x".to_owned(),
                ][..]
            )
        );
    }

    #[test]
    fn missing_result_code_is_malformed() {
        let err = LdapResult::from_children("AddResponse", &[]).unwrap_err();
        assert!(matches!(
            err,
            DecodeError::MalformedOperation { kind: "AddResponse", .. }
        ));
    }

    #[test]
    fn wrong_result_code_kind_is_malformed() {
        let children = vec![
            BerElement::string("not a code"),
            BerElement::string(""),
            BerElement::string(""),
        ];
        let err = LdapResult::from_children("CompareResponse", &children).unwrap_err();
        assert!(matches!(err, DecodeError::MalformedOperation { .. }));
    }

    #[test]
    fn integer_result_code_accepted() {
        // Some servers emit INTEGER instead of ENUMERATED
        let children = vec![
            BerElement::integer(0),
            BerElement::string(""),
            BerElement::string(""),
        ];
        let result = LdapResult::from_children("BindResponse", &children).unwrap();
        assert_eq!(result.result_code, 0);
    }

    #[test]
    fn malformed_referral_field_is_dropped() {
        let mut children = trailer(0, "", "");
        // Referral slot holding something that is not a [3] list
        children.push(BerElement::integer(7));
        let result = LdapResult::from_children("ModifyDNResponse", &children).unwrap();
        assert!(result.referrals.is_none());
    }

    #[test]
    fn trailer_round_trip() {
        let original = LdapResult::new(49, "cn=x", "invalid credentials")
            .with_referrals(vec!["ldap://other.example/".to_owned()]);
        let mut body = Vec::new();
        original.append_to(&mut body);
        let parsed = LdapResult::from_children("BindResponse", &body).unwrap();
        assert_eq!(parsed, original);
    }
}
