use super::request::{SocialLinks, SubmissionRequest};
use serde::{Deserialize, Serialize};

/// Off-chain JSON document referenced by the on-chain metadata URI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadataDocument {
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub image: String,
    pub properties: MetadataProperties,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataProperties {
    pub files: Vec<MetadataFile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub socials: Option<SocialLinks>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFile {
    pub uri: String,
    #[serde(rename = "type")]
    pub content_type: String,
}

impl TokenMetadataDocument {
    pub fn from_request(request: &SubmissionRequest, image_uri: &str) -> Self {
        Self {
            name: request.name().to_owned(),
            symbol: request.symbol().to_owned(),
            description: request.description().to_owned(),
            image: image_uri.to_owned(),
            properties: MetadataProperties {
                files: vec![MetadataFile {
                    uri: image_uri.to_owned(),
                    content_type: request.image().content_type.clone(),
                }],
                socials: request.socials().cloned(),
            },
        }
    }

    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}
