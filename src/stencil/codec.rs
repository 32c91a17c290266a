//! Packing stencil XML into a style-safe token

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

use crate::errors::{Result, StencilError};

/// Reversible transform between stencil XML and the token carried in a
/// `shape=stencil(<token>)` style entry
pub trait Codec {
    fn compress(&self, xml: &str) -> String;

    fn decompress(&self, token: &str) -> Result<String>;
}

/// Standard-alphabet base64 of the UTF-8 text, without deflate
#[derive(Debug, Clone, Copy, Default)]
pub struct Base64Codec;

impl Codec for Base64Codec {
    fn compress(&self, xml: &str) -> String {
        STANDARD.encode(xml.as_bytes())
    }

    fn decompress(&self, token: &str) -> Result<String> {
        let bytes = STANDARD
            .decode(token.trim())
            .map_err(|e| StencilError::Decompress {
                reason: e.to_string(),
            })?;
        String::from_utf8(bytes).map_err(|e| StencilError::Decompress {
            reason: e.to_string(),
        })
    }
}
