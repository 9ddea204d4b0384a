//! Identity types shared across the voting core

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Verification state of a voter record
///
/// Mutated only by an administrative verification action. "Is verified"
/// is always derived from this enum, never stored as a separate flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    /// Registered, awaiting review
    Pending,
    /// Cleared to vote
    Verified,
    /// Review failed; may not vote
    Rejected,
}

impl VerificationStatus {
    /// Whether this status permits voting
    pub fn is_verified(&self) -> bool {
        matches!(self, VerificationStatus::Verified)
    }

    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Verified => "verified",
            VerificationStatus::Rejected => "rejected",
        }
    }
}

impl Default for VerificationStatus {
    fn default() -> Self {
        VerificationStatus::Pending
    }
}

impl fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for VerificationStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(VerificationStatus::Pending),
            "verified" => Ok(VerificationStatus::Verified),
            "rejected" => Ok(VerificationStatus::Rejected),
            other => Err(Error::UnknownStatus(other.to_string())),
        }
    }
}

/// Closed set of principal roles
///
/// Role checks are exhaustive matches on this enum; there is no
/// attribute probing anywhere in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May run administrative operations
    Admin,
    /// May register and cast votes
    Voter,
    /// Stands in elections
    Candidate,
}

impl Role {
    /// Whether this role may run administrative operations
    pub fn can_administer(&self) -> bool {
        match self {
            Role::Admin => true,
            Role::Voter | Role::Candidate => false,
        }
    }

    /// Lowercase wire name
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Voter => "voter",
            Role::Candidate => "candidate",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "admin" => Ok(Role::Admin),
            "voter" => Ok(Role::Voter),
            "candidate" => Ok(Role::Candidate),
            other => Err(Error::UnknownRole(other.to_string())),
        }
    }
}

/// Authenticated principal, as supplied by the caller
///
/// Authentication itself happens outside the core; this is the opaque
/// result of it, carried through operations for role screening and
/// audit attribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterIdentity {
    /// Principal id
    pub id: Uuid,
    /// Principal role
    pub role: Role,
}

impl VoterIdentity {
    /// New identity
    pub fn new(id: Uuid, role: Role) -> Self {
        Self { id, role }
    }

    /// Admin principal
    pub fn admin(id: Uuid) -> Self {
        Self::new(id, Role::Admin)
    }

    /// Voter principal
    pub fn voter(id: Uuid) -> Self {
        Self::new(id, Role::Voter)
    }
}

impl fmt::Display for VoterIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.id, self.role)
    }
}
