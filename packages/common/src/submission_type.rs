#[cfg(feature = "sea-orm")]
use sea_orm::prelude::StringLen;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which artifacts an event asks teams to submit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[cfg_attr(
    feature = "sea-orm",
    derive(sea_orm::DeriveActiveEnum, sea_orm::EnumIter),
    sea_orm(rs_type = "String", db_type = "String(StringLen::None)")
)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionType {
    /// The event takes no submissions.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "none"))]
    None,
    /// A repository link only.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "github_link"))]
    GithubLink,
    /// An uploaded zip archive only.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "zip_file"))]
    ZipFile,
    /// Both a repository link and an archive.
    #[cfg_attr(feature = "sea-orm", sea_orm(string_value = "both"))]
    Both,
}

impl SubmissionType {
    pub const ALL: &'static [SubmissionType] =
        &[Self::None, Self::GithubLink, Self::ZipFile, Self::Both];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::GithubLink => "github_link",
            Self::ZipFile => "zip_file",
            Self::Both => "both",
        }
    }

    pub fn accepts_submissions(&self) -> bool {
        !matches!(self, Self::None)
    }

    pub fn requires_github_link(&self) -> bool {
        matches!(self, Self::GithubLink | Self::Both)
    }

    pub fn requires_file(&self) -> bool {
        matches!(self, Self::ZipFile | Self::Both)
    }
}

impl Default for SubmissionType {
    fn default() -> Self {
        Self::None
    }
}

impl fmt::Display for SubmissionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseSubmissionTypeError {
    invalid: String,
}

impl fmt::Display for ParseSubmissionTypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid submission type '{}'. Valid values: none, github_link, zip_file, both",
            self.invalid
        )
    }
}

impl std::error::Error for ParseSubmissionTypeError {}

impl FromStr for SubmissionType {
    type Err = ParseSubmissionTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "github_link" => Ok(Self::GithubLink),
            "zip_file" => Ok(Self::ZipFile),
            "both" => Ok(Self::Both),
            _ => Err(ParseSubmissionTypeError {
                invalid: s.to_string(),
            }),
        }
    }
}
