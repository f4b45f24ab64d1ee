//! Parsing of the text model's line-oriented output.
//!
//! The model is asked to emit one `PREFIX: value` line per field. Anything else
//! (blank lines, chatter, markdown) is ignored.

use serde::{Deserialize, Serialize};

/// Structured copy extracted from a generated response. Missing fields are empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedContent {
    pub header: String,
    pub subheader: String,
    pub body: String,
    pub caption: String,
    pub logo: String,
    pub image_prompt: String,
}

impl GeneratedContent {
    /// At least one of header, subheader or body carries text.
    pub fn has_text(&self) -> bool {
        !self.header.is_empty() || !self.subheader.is_empty() || !self.body.is_empty()
    }

    /// The header is the one field the model is required to produce.
    pub fn has_header(&self) -> bool {
        !self.header.is_empty()
    }
}

/// Extracts fields by prefix. A later line with the same prefix overwrites an earlier one.
pub fn parse_generated_content(text: &str) -> GeneratedContent {
    let mut content = GeneratedContent::default();

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let fields: [(&str, &mut String); 6] = [
            ("HEADER:", &mut content.header),
            ("SUBHEADER:", &mut content.subheader),
            ("BODY:", &mut content.body),
            ("CAPTION:", &mut content.caption),
            ("LOGO:", &mut content.logo),
            ("IMAGE:", &mut content.image_prompt),
        ];
        for (prefix, field) in fields {
            if let Some(value) = line.strip_prefix(prefix) {
                *field = value.trim().to_string();
                break;
            }
        }
    }

    content
}
