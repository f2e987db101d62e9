//! Shareable-link state encoding.
//!
//! The document pair is JSON-encoded and then base64-encoded with the
//! URL-safe alphabet (no padding) so the result can travel as a single
//! query-parameter value. Decoding is the exact inverse.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::ShareError;

/// The document pair carried by a shared link.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedState {
    /// Raw text of the original (left) document.
    pub original: String,
    /// Raw text of the modified (right) document.
    pub modified: String,
}

impl SharedState {
    /// Encodes the pair into a single query-parameter value.
    ///
    /// ```
    /// use jcv_core::share::SharedState;
    ///
    /// let state = SharedState { original: "{}".into(), modified: "[1]".into() };
    /// let decoded = SharedState::decode(&state.encode()).unwrap();
    /// assert_eq!(decoded, state);
    /// ```
    #[must_use]
    pub fn encode(&self) -> String {
        let json = serde_json::to_vec(self).expect("string pair serializes");
        URL_SAFE_NO_PAD.encode(json)
    }

    /// Decodes a query-parameter value produced by [`SharedState::encode`].
    pub fn decode(encoded: &str) -> Result<Self, ShareError> {
        let json = URL_SAFE_NO_PAD.decode(encoded.trim())?;
        Ok(serde_json::from_slice(&json)?)
    }
}
