//! Official domain model and position table.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Store-generated row identifier for an official.
pub type OfficialId = i64;

/// Fixed set of provincial offices an official can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Position {
    #[serde(rename = "Governor")]
    Governor,
    #[serde(rename = "Vice Governor")]
    ViceGovernor,
    #[serde(rename = "Member, 1st District")]
    MemberFirstDistrict,
    #[serde(rename = "Member, 2nd District")]
    MemberSecondDistrict,
    #[serde(rename = "Member, 3rd District")]
    MemberThirdDistrict,
    #[serde(rename = "President PCL Bohol Federation")]
    PclFederationPresident,
    #[serde(rename = "Liga ng mga Barangay")]
    LigaNgMgaBarangay,
    #[serde(rename = "SK Federation President")]
    SkFederationPresident,
}

impl Position {
    /// All positions in display order.
    pub const ALL: [Position; 8] = [
        Position::Governor,
        Position::ViceGovernor,
        Position::MemberFirstDistrict,
        Position::MemberSecondDistrict,
        Position::MemberThirdDistrict,
        Position::PclFederationPresident,
        Position::LigaNgMgaBarangay,
        Position::SkFederationPresident,
    ];

    /// Human-readable label, identical to the value stored in `position`.
    pub fn label(self) -> &'static str {
        match self {
            Self::Governor => "Governor",
            Self::ViceGovernor => "Vice Governor",
            Self::MemberFirstDistrict => "Member, 1st District",
            Self::MemberSecondDistrict => "Member, 2nd District",
            Self::MemberThirdDistrict => "Member, 3rd District",
            Self::PclFederationPresident => "President PCL Bohol Federation",
            Self::LigaNgMgaBarangay => "Liga ng mga Barangay",
            Self::SkFederationPresident => "SK Federation President",
        }
    }

    /// Resolves an exact label back to its position.
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|position| position.label() == label)
    }

    /// Labels of every position in display order.
    pub fn labels() -> Vec<&'static str> {
        Self::ALL.iter().map(|position| position.label()).collect()
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Persisted provincial official record.
///
/// `position` is kept as raw text: rows written by other tools may carry
/// labels outside [`Position::ALL`] and must still be listable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Official {
    pub id: OfficialId,
    pub name: String,
    pub position: String,
    /// Stored filename inside the upload directory, if any.
    pub profile_image: Option<String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds, refreshed on every update.
    pub updated_at: i64,
}

impl Official {
    /// Returns the known position for this record, if the label is one.
    pub fn known_position(&self) -> Option<Position> {
        Position::from_label(&self.position)
    }
}

/// Insert payload for a new official row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOfficial {
    pub name: String,
    pub position: Position,
    pub profile_image: Option<String>,
}
