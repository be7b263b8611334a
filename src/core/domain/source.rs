//! Plaintext input for a `set`.

use std::path::PathBuf;
use zeroize::Zeroizing;

/// Where plaintext comes from when writing an object.
#[derive(Debug)]
pub enum PlaintextSource {
    /// Literal text given on the command line.
    Text(Zeroizing<String>),
    /// An existing file whose contents are encrypted.
    File(PathBuf),
    /// Standard input, read until EOF.
    Stdin,
}

impl PlaintextSource {
    /// Literal text, or stdin when the text is exactly `-`.
    pub fn from_arg(text: &str) -> Self {
        if text == "-" {
            Self::Stdin
        } else {
            Self::Text(Zeroizing::new(text.to_string()))
        }
    }
}
