use chrono::{DateTime, Utc};
use common::PaymentStatus;
use serde::{Deserialize, Serialize};

use crate::entity::{event, registration, team_member};
use crate::error::AppError;
use crate::models::event::EventListItem;
use crate::models::shared::{
    FieldResult, check_email, check_name, check_optional_url, check_phone, check_required,
    invalid, non_blank,
};

/// One team member as entered on the registration form.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq, utoipa::ToSchema)]
pub struct TeamMemberInput {
    #[schema(example = "Ana Lima")]
    pub name: String,
    #[schema(example = "ana@uni.edu")]
    pub email: String,
    /// Exactly 10 digits.
    #[schema(example = "9876543210")]
    pub phone: String,
    #[schema(example = "State Institute of Technology")]
    pub college_name: String,
    pub photo_url: Option<String>,
    #[serde(default)]
    pub is_leader: bool,
}

impl TeamMemberInput {
    /// First failing field as `(field, message)`.
    pub fn check(&self) -> Result<(), (&'static str, String)> {
        fn tag(field: &'static str, r: FieldResult) -> Result<(), (&'static str, String)> {
            r.map_err(|msg| (field, msg))
        }
        tag("name", check_name(&self.name))?;
        tag("email", check_email(&self.email))?;
        tag("phone", check_phone(&self.phone))?;
        tag(
            "college_name",
            check_required(&self.college_name, 200, "College name"),
        )?;
        tag("photo_url", check_optional_url(self.photo_url.as_deref()))?;
        Ok(())
    }

    fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            college_name: self.college_name.trim().to_string(),
            photo_url: non_blank(self.photo_url.as_deref()),
            is_leader: self.is_leader,
        }
    }
}

/// The in-progress team list.
///
/// Always holds exactly one leader at position 0, who can never be removed.
#[derive(Debug, Clone)]
pub struct TeamRoster {
    members: Vec<TeamMemberInput>,
    max_size: usize,
}

impl TeamRoster {
    pub fn new(mut leader: TeamMemberInput, max_size: usize) -> Self {
        leader.is_leader = true;
        Self {
            members: vec![leader],
            max_size: max_size.max(1),
        }
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.members.len() >= self.max_size
    }

    pub fn members(&self) -> &[TeamMemberInput] {
        &self.members
    }

    pub fn leader(&self) -> &TeamMemberInput {
        &self.members[0]
    }

    /// Append a non-leader member. Returns the new member's position.
    pub fn add_member(&mut self, mut member: TeamMemberInput) -> Result<usize, AppError> {
        if self.is_full() {
            return Err(invalid("Maximum team size reached"));
        }
        member.is_leader = false;
        self.members.push(member);
        Ok(self.members.len() - 1)
    }

    pub fn remove_member(&mut self, index: usize) -> Result<TeamMemberInput, AppError> {
        match self.members.get(index) {
            None => Err(invalid(format!("No team member at position {index}"))),
            Some(m) if m.is_leader => Err(invalid("Cannot remove team leader")),
            Some(_) => Ok(self.members.remove(index)),
        }
    }

    /// Build a roster from a submitted member list, enforcing size bounds, a
    /// single leader and the member schema. Reports the first failure only.
    pub fn from_submission(
        members: Vec<TeamMemberInput>,
        team_size_min: i32,
        team_size_max: i32,
    ) -> Result<Self, AppError> {
        if members.is_empty() {
            return Err(invalid("At least one team member is required"));
        }
        let count = members.len() as i64;
        if count < i64::from(team_size_min) {
            return Err(invalid(format!(
                "Minimum team size is {team_size_min} members"
            )));
        }
        if count > i64::from(team_size_max) {
            return Err(invalid(format!(
                "Maximum team size is {team_size_max} members"
            )));
        }
        if members.iter().filter(|m| m.is_leader).count() != 1 {
            return Err(invalid("Exactly one team member must be the leader"));
        }
        for member in &members {
            member
                .check()
                .map_err(|(field, msg)| invalid(format!("{field}: {msg}")))?;
        }

        let (leader, rest): (Vec<_>, Vec<_>) = members.into_iter().partition(|m| m.is_leader);
        let mut roster = Self::new(
            leader.into_iter().next().map(TeamMemberInput::normalized).ok_or_else(|| {
                invalid("Exactly one team member must be the leader")
            })?,
            usize::try_from(team_size_max).unwrap_or(1),
        );
        for member in rest {
            roster.add_member(member.normalized())?;
        }
        Ok(roster)
    }

    pub fn into_members(self) -> Vec<TeamMemberInput> {
        self.members
    }
}

/// Request body for registering for an event.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct RegistrationRequest {
    /// Optional for individual events.
    #[schema(example = "Null Pointers")]
    pub team_name: Option<String>,
    pub members: Vec<TeamMemberInput>,
}

/// Pure validation of a registration against the event's team bounds.
pub fn validate_registration(
    payload: RegistrationRequest,
    event: &event::Model,
) -> Result<(Option<String>, TeamRoster), AppError> {
    let team_name = non_blank(payload.team_name.as_deref());
    if let Some(ref name) = team_name
        && name.chars().count() > 100
    {
        return Err(invalid("Team name must be less than 100 characters"));
    }
    let roster =
        TeamRoster::from_submission(payload.members, event.team_size_min, event.team_size_max)?;
    Ok((team_name, roster))
}

#[derive(Serialize, Clone, Debug, utoipa::ToSchema)]
pub struct TeamMemberResponse {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub college_name: String,
    pub photo_url: Option<String>,
    pub is_leader: bool,
}

impl From<team_member::Model> for TeamMemberResponse {
    fn from(m: team_member::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            email: m.email,
            phone: m.phone,
            college_name: m.college_name,
            photo_url: m.photo_url,
            is_leader: m.is_leader,
        }
    }
}

#[derive(Serialize, Debug, utoipa::ToSchema)]
pub struct RegistrationResponse {
    pub id: i32,
    pub event_id: i32,
    pub team_name: Option<String>,
    #[schema(example = "registered")]
    pub status: String,
    pub payment_status: PaymentStatus,
    pub members: Vec<TeamMemberResponse>,
    pub created_at: DateTime<Utc>,
}

impl RegistrationResponse {
    pub fn new(reg: registration::Model, members: Vec<team_member::Model>) -> Self {
        Self {
            id: reg.id,
            event_id: reg.event_id,
            team_name: reg.team_name,
            status: reg.status,
            payment_status: reg.payment_status,
            members: members.into_iter().map(Into::into).collect(),
            created_at: reg.created_at,
        }
    }
}

/// A registration paired with its event, for the student's own lists.
#[derive(Serialize, utoipa::ToSchema)]
pub struct MyRegistrationItem {
    pub registration_id: i32,
    pub team_name: Option<String>,
    pub payment_status: PaymentStatus,
    pub registered_at: DateTime<Utc>,
    pub event: EventListItem,
}
