//! Deployment identifiers.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

/// Identifier minted for each deploy request and echoed back in receipts and
/// history entries. Never the nil UUID.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Uuid", into = "Uuid")]
pub struct DeploymentId(Uuid);

impl DeploymentId {
    /// Length of [`DeploymentId::short`].
    pub const SHORT_LEN: usize = 8;

    /// Mints a fresh identifier for a new deploy request.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// First hex digits of the id, as shown in the history panel.
    #[must_use]
    pub fn short(self) -> String {
        let mut buf = Uuid::encode_buffer();
        self.0.simple().encode_lower(&mut buf)[..Self::SHORT_LEN].to_owned()
    }
}

impl TryFrom<Uuid> for DeploymentId {
    type Error = Error;

    fn try_from(uuid: Uuid) -> Result<Self> {
        if uuid.is_nil() {
            Err(Error::NilDeploymentId)
        } else {
            Ok(Self(uuid))
        }
    }
}

impl From<DeploymentId> for Uuid {
    fn from(id: DeploymentId) -> Self {
        id.0
    }
}

impl fmt::Display for DeploymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0.hyphenated(), f)
    }
}

impl FromStr for DeploymentId {
    type Err = Error;

    /// Accepts any UUID form the `uuid` crate parses (hyphenated, simple,
    /// braced, or URN), ignoring surrounding whitespace.
    fn from_str(s: &str) -> Result<Self> {
        Uuid::parse_str(s.trim())?.try_into()
    }
}
