use genepool_types::{BundleFormat, ParsedBundle};

use crate::error::GateError;
use crate::traits::BundleDecoder;

/// Decoder for the flattened JSON manifest form of a bundle.
///
/// Archive extraction happens upstream (an external unarchiver turns the
/// zip / tar.gz into a single manifest document); this decoder parses that
/// manifest into structured assets. The declared archive format is
/// advisory here; the manifest shape is identical for both.
#[derive(Debug, Default)]
pub struct JsonBundleDecoder;

impl JsonBundleDecoder {
    pub fn new() -> Self {
        Self
    }
}

impl BundleDecoder for JsonBundleDecoder {
    fn decode(&self, bytes: &[u8], _format: BundleFormat) -> Result<ParsedBundle, GateError> {
        serde_json::from_slice(bytes)
            .map_err(|err| GateError::InvalidBundle(format!("bundle manifest: {err}")))
    }
}
