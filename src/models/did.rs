// src/models/did.rs
//! Decentralized Identifier (DID) data model.
//!
//! Covers the two shapes of KILT DID this tool deals with:
//! - full DIDs anchored on chain, `did:kilt:<address>`
//! - light DIDs derived off chain, `did:kilt:light:<key type><address>[:<details>]`
//!
//! plus the resolved document and the service endpoints it advertises.

use crate::utils::crypto::ss58_checksum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Scheme and method prefix shared by every KILT DID.
pub const KILT_DID_PREFIX: &str = "did:kilt:";

const LIGHT_DID_MARKER: &str = "light:";

/// SS58 network prefix of KILT addresses.
pub const KILT_SS58_PREFIX: u8 = 38;

/// Decoded length of an SS58 address: prefix byte, public key, checksum.
const SS58_ADDRESS_LENGTH: usize = 1 + 32 + 2;

/// Errors raised while parsing a DID URI.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DidParseError {
    #[error("not a KILT DID: {0}")]
    UnsupportedMethod(String),
    #[error("malformed light DID: {0}")]
    MalformedLightDid(String),
    #[error("invalid SS58 address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },
}

/// A parsed KILT DID.
///
/// Equality of two `Did` values compares the full URI. Use
/// [`Did::is_same_subject`] to ask whether two DIDs denote the same subject.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Did {
    uri: String,
    address: String,
    light: bool,
}

impl Did {
    /// Parses a DID URI, ignoring any `#fragment`.
    ///
    /// # Errors
    /// Returns `Err` if:
    /// - The URI does not use the `did:kilt:` method
    /// - A light DID lacks its key type prefix
    /// - The address is not a valid KILT SS58 address
    pub fn parse(uri: &str) -> Result<Self, DidParseError> {
        let uri = uri.split('#').next().unwrap_or_default();
        let identifier = uri
            .strip_prefix(KILT_DID_PREFIX)
            .ok_or_else(|| DidParseError::UnsupportedMethod(uri.to_string()))?;

        let (address, light) = match identifier.strip_prefix(LIGHT_DID_MARKER) {
            Some(light_identifier) => {
                let encoded = light_identifier.split(':').next().unwrap_or_default();
                // Two digit key type in front of the address.
                match (encoded.get(..2), encoded.get(2..)) {
                    (Some(key_type), Some(address))
                        if key_type.bytes().all(|b| b.is_ascii_digit()) && !address.is_empty() =>
                    {
                        (address, true)
                    }
                    _ => return Err(DidParseError::MalformedLightDid(uri.to_string())),
                }
            }
            None if identifier.contains(':') => {
                return Err(DidParseError::UnsupportedMethod(uri.to_string()))
            }
            None => (identifier, false),
        };

        validate_address(address)?;
        Ok(Self {
            uri: uri.to_string(),
            address: address.to_string(),
            light,
        })
    }

    /// The SS58 address identifying the subject.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Whether this is a light (off-chain) DID.
    pub fn is_light(&self) -> bool {
        self.light
    }

    pub fn as_str(&self) -> &str {
        &self.uri
    }

    /// Returns `true` if both DIDs refer to the same subject.
    ///
    /// A light DID and the full DID upgraded from it share the address, so
    /// they compare equal here even though their URIs differ.
    pub fn is_same_subject(&self, other: &Did) -> bool {
        self.address == other.address
    }
}

impl FromStr for Did {
    type Err = DidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Did::parse(s)
    }
}

impl fmt::Display for Did {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.uri)
    }
}

/// Compares two DID URIs by subject.
///
/// Unparseable input never matches anything.
pub fn is_same_subject(a: &str, b: &str) -> bool {
    match (Did::parse(a), Did::parse(b)) {
        (Ok(a), Ok(b)) => a.is_same_subject(&b),
        _ => false,
    }
}

/// Full DID of the account `public_key`, SS58 encoded with the KILT prefix.
pub fn did_from_account(public_key: &[u8; 32]) -> String {
    let mut encoded = Vec::with_capacity(SS58_ADDRESS_LENGTH);
    encoded.push(KILT_SS58_PREFIX);
    encoded.extend_from_slice(public_key);
    let checksum = ss58_checksum(&encoded);
    encoded.extend_from_slice(&checksum);
    format!("{}{}", KILT_DID_PREFIX, bs58::encode(encoded).into_string())
}

fn validate_address(address: &str) -> Result<(), DidParseError> {
    let invalid = |reason: String| DidParseError::InvalidAddress {
        address: address.to_string(),
        reason,
    };

    let decoded = bs58::decode(address)
        .into_vec()
        .map_err(|e| invalid(e.to_string()))?;
    if decoded.len() != SS58_ADDRESS_LENGTH {
        return Err(invalid(format!("decoded length {}", decoded.len())));
    }
    if decoded[0] != KILT_SS58_PREFIX {
        return Err(invalid(format!("network prefix {}", decoded[0])));
    }
    let (payload, checksum) = decoded.split_at(SS58_ADDRESS_LENGTH - 2);
    if ss58_checksum(payload) != checksum {
        return Err(invalid("checksum mismatch".to_string()));
    }
    Ok(())
}

/// A resolved DID Document.
///
/// Only the parts this tool reads are modelled: the identifier, the linked
/// web3 name, and the service endpoints.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DidDocument {
    /// The complete DID URI
    /// Example: "did:kilt:4nwPAmtsK5toZfBM9WvmAe4Fa3LyZ3X3JHt7EUFfrcPPAZAm"
    pub uri: String,

    /// Web3 name currently linked to the DID, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub web3_name: Option<String>,

    /// Service endpoints in the order the chain returned them
    #[serde(default)]
    pub service: Vec<ServiceEndpoint>,
}

/// A typed external resource advertised by a DID.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServiceEndpoint {
    /// Endpoint identifier, usually a `#fragment`
    pub id: String,

    /// Declared service types
    /// Example: ["KiltPublishedCredentialCollectionV1"]
    #[serde(rename = "type")]
    pub types: Vec<String>,

    /// Endpoint URLs, most preferred first
    #[serde(rename = "serviceEndpoint")]
    pub urls: Vec<String>,
}

/// Outcome of resolving a DID that the chain knows about.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct DidResolution {
    /// `None` when the DID has been deleted
    pub document: Option<DidDocument>,
    pub metadata: ResolutionMetadata,
}

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionMetadata {
    pub deactivated: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS_A: &str = "4nwPAmtsK5toZfBM9WvmAe4Fa3LyZ3X3JHt7EUFfrcPPAZAm";
    const ADDRESS_B: &str = "4nxhWrDR27YzC5z4soRcz31MaeFn287JRqiE5y4u7jBEdgP2";

    #[test]
    fn test_did_from_account_encodes_kilt_address() {
        assert_eq!(did_from_account(&[1; 32]), format!("did:kilt:{}", ADDRESS_A));
        assert_eq!(did_from_account(&[2; 32]), format!("did:kilt:{}", ADDRESS_B));
    }

    #[test]
    fn test_parse_full_did() {
        let did = Did::parse(&format!("did:kilt:{}", ADDRESS_A)).unwrap();
        assert_eq!(did.address(), ADDRESS_A);
        assert!(!did.is_light());
    }

    #[test]
    fn test_parse_strips_fragment() {
        let did: Did = format!("did:kilt:{}#0x1234", ADDRESS_A).parse().unwrap();
        assert_eq!(did.as_str(), format!("did:kilt:{}", ADDRESS_A));
    }

    #[test]
    fn test_parse_light_did_with_details() {
        let did = Did::parse(&format!("did:kilt:light:00{}:z1Ac9CMtY", ADDRESS_A)).unwrap();
        assert!(did.is_light());
        assert_eq!(did.address(), ADDRESS_A);
    }

    #[test]
    fn test_parse_rejects_other_methods_and_bad_addresses() {
        assert!(matches!(
            Did::parse("did:web:example.com"),
            Err(DidParseError::UnsupportedMethod(_))
        ));
        assert!(matches!(
            Did::parse("did:kilt:light:xx4nwPAmtsK5"),
            Err(DidParseError::MalformedLightDid(_))
        ));

        // Last character altered, so the checksum no longer matches.
        let tampered = format!("did:kilt:{}n", &ADDRESS_A[..ADDRESS_A.len() - 1]);
        assert!(matches!(
            Did::parse(&tampered),
            Err(DidParseError::InvalidAddress { .. })
        ));
    }

    #[test]
    fn test_same_subject_across_light_and_full() {
        let full = format!("did:kilt:{}", ADDRESS_A);
        let light = format!("did:kilt:light:01{}", ADDRESS_A);
        assert!(is_same_subject(&full, &light));
        assert!(!is_same_subject(&full, &format!("did:kilt:{}", ADDRESS_B)));
        assert!(!is_same_subject(&full, "not a did"));
    }

    #[test]
    fn test_service_endpoint_wire_names() {
        let endpoint: ServiceEndpoint = serde_json::from_value(serde_json::json!({
            "id": "#collection",
            "type": ["KiltPublishedCredentialCollectionV1"],
            "serviceEndpoint": ["ipfs://QmCollection"]
        }))
        .unwrap();
        assert_eq!(endpoint.types, vec!["KiltPublishedCredentialCollectionV1"]);
        assert_eq!(endpoint.urls, vec!["ipfs://QmCollection"]);
    }
}
