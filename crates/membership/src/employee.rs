use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use assetflow_core::{Aggregate, AggregateId, AggregateRoot, DomainError, EmailAddress};
use assetflow_events::Event;

/// Employee identifier.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmployeeId(pub AggregateId);

impl EmployeeId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Role of an identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmployeeRole {
    Employee,
    Hr,
}

impl EmployeeRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmployeeRole::Employee => "employee",
            EmployeeRole::Hr => "hr",
        }
    }
}

/// Identity snapshot embedded in membership events and team rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberInfo {
    pub email: EmailAddress,
    pub name: String,
}

/// Latest purchased subscription tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageInfo {
    pub price: u32,
    pub members: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Success,
}

/// Seat allotment for a tier price: 5 seats for $5, 10 for $8, 20 otherwise.
pub fn seat_allotment(price: u32) -> u32 {
    match price {
        5 => 5,
        8 => 10,
        _ => 20,
    }
}

/// One roster entry in a batched add.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipEntry {
    pub membership_id: Uuid,
    pub member: MemberInfo,
}

/// Aggregate root: Employee.
///
/// `employee_count` is derived from the active roster, so it can never drift
/// from the set of team rows built from the same events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Employee {
    id: EmployeeId,
    email: Option<EmailAddress>,
    name: String,
    role: EmployeeRole,
    is_join: bool,
    joined_under: Option<EmailAddress>,
    roster: HashMap<Uuid, MemberInfo>,
    member_limit: u32,
    package: Option<PackageInfo>,
    payment_status: Option<PaymentStatus>,
    version: u64,
    created: bool,
}

impl Employee {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: EmployeeId) -> Self {
        Self {
            id,
            email: None,
            name: String::new(),
            role: EmployeeRole::Employee,
            is_join: false,
            joined_under: None,
            roster: HashMap::new(),
            member_limit: 0,
            package: None,
            payment_status: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> EmployeeId {
        self.id
    }

    pub fn email(&self) -> Option<&EmailAddress> {
        self.email.as_ref()
    }

    pub fn role(&self) -> EmployeeRole {
        self.role
    }

    pub fn is_join(&self) -> bool {
        self.is_join
    }

    pub fn joined_under(&self) -> Option<&EmailAddress> {
        self.joined_under.as_ref()
    }

    /// Number of currently joined team members (HR identities only).
    pub fn employee_count(&self) -> u32 {
        self.roster.len() as u32
    }

    pub fn member_limit(&self) -> u32 {
        self.member_limit
    }

    pub fn package(&self) -> Option<PackageInfo> {
        self.package
    }

    pub fn payment_status(&self) -> Option<PaymentStatus> {
        self.payment_status
    }
}

impl AggregateRoot for Employee {
    type Id = EmployeeId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RegisterEmployee.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterEmployee {
    pub employee_id: EmployeeId,
    pub email: EmailAddress,
    pub name: String,
    pub role: EmployeeRole,
    pub occurred_at: DateTime<Utc>,
}

/// Command: JoinTeam (employee side of an add).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinTeam {
    pub employee_id: EmployeeId,
    pub hr_email: EmailAddress,
    pub occurred_at: DateTime<Utc>,
}

/// Command: LeaveTeam (employee side of a removal).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaveTeam {
    pub employee_id: EmployeeId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddTeamMember (HR side of an add).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddTeamMember {
    pub employee_id: EmployeeId,
    pub membership_id: Uuid,
    pub hr: MemberInfo,
    pub member: MemberInfo,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddTeamMembers (batched HR side).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddTeamMembers {
    pub employee_id: EmployeeId,
    pub hr: MemberInfo,
    pub entries: Vec<MembershipEntry>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemoveTeamMember (HR side of a removal).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveTeamMember {
    pub employee_id: EmployeeId,
    pub membership_id: Uuid,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordPayment (seat purchase).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordPayment {
    pub employee_id: EmployeeId,
    pub price: u32,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmployeeCommand {
    RegisterEmployee(RegisterEmployee),
    JoinTeam(JoinTeam),
    LeaveTeam(LeaveTeam),
    AddTeamMember(AddTeamMember),
    AddTeamMembers(AddTeamMembers),
    RemoveTeamMember(RemoveTeamMember),
    RecordPayment(RecordPayment),
}

/// Event: EmployeeRegistered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRegistered {
    pub employee_id: EmployeeId,
    pub email: EmailAddress,
    pub name: String,
    pub role: EmployeeRole,
    pub occurred_at: DateTime<Utc>,
}

/// Event: TeamJoined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamJoined {
    pub employee_id: EmployeeId,
    pub hr_email: EmailAddress,
    pub occurred_at: DateTime<Utc>,
}

/// Event: TeamLeft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamLeft {
    pub employee_id: EmployeeId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: MemberAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberAdded {
    pub employee_id: EmployeeId,
    pub membership_id: Uuid,
    pub hr: MemberInfo,
    pub member: MemberInfo,
    pub occurred_at: DateTime<Utc>,
}

/// Event: MembersAdded (batched).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembersAdded {
    pub employee_id: EmployeeId,
    pub hr: MemberInfo,
    pub entries: Vec<MembershipEntry>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: MemberRemoved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberRemoved {
    pub employee_id: EmployeeId,
    pub membership_id: Uuid,
    pub occurred_at: DateTime<Utc>,
}

/// Event: SeatsPurchased.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatsPurchased {
    pub employee_id: EmployeeId,
    pub price: u32,
    pub seats: u32,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmployeeEvent {
    EmployeeRegistered(EmployeeRegistered),
    TeamJoined(TeamJoined),
    TeamLeft(TeamLeft),
    MemberAdded(MemberAdded),
    MembersAdded(MembersAdded),
    MemberRemoved(MemberRemoved),
    SeatsPurchased(SeatsPurchased),
}

impl Event for EmployeeEvent {
    fn event_type(&self) -> &'static str {
        match self {
            EmployeeEvent::EmployeeRegistered(_) => "employee.registered",
            EmployeeEvent::TeamJoined(_) => "employee.team_joined",
            EmployeeEvent::TeamLeft(_) => "employee.team_left",
            EmployeeEvent::MemberAdded(_) => "employee.member_added",
            EmployeeEvent::MembersAdded(_) => "employee.members_added",
            EmployeeEvent::MemberRemoved(_) => "employee.member_removed",
            EmployeeEvent::SeatsPurchased(_) => "employee.seats_purchased",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            EmployeeEvent::EmployeeRegistered(e) => e.occurred_at,
            EmployeeEvent::TeamJoined(e) => e.occurred_at,
            EmployeeEvent::TeamLeft(e) => e.occurred_at,
            EmployeeEvent::MemberAdded(e) => e.occurred_at,
            EmployeeEvent::MembersAdded(e) => e.occurred_at,
            EmployeeEvent::MemberRemoved(e) => e.occurred_at,
            EmployeeEvent::SeatsPurchased(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Employee {
    type Command = EmployeeCommand;
    type Event = EmployeeEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            EmployeeEvent::EmployeeRegistered(e) => {
                self.id = e.employee_id;
                self.email = Some(e.email.clone());
                self.name = e.name.clone();
                self.role = e.role;
                self.is_join = false;
                self.created = true;
            }
            EmployeeEvent::TeamJoined(e) => {
                self.is_join = true;
                self.joined_under = Some(e.hr_email.clone());
            }
            EmployeeEvent::TeamLeft(_) => {
                self.is_join = false;
                self.joined_under = None;
            }
            EmployeeEvent::MemberAdded(e) => {
                self.roster.insert(e.membership_id, e.member.clone());
            }
            EmployeeEvent::MembersAdded(e) => {
                for entry in &e.entries {
                    self.roster.insert(entry.membership_id, entry.member.clone());
                }
            }
            EmployeeEvent::MemberRemoved(e) => {
                self.roster.remove(&e.membership_id);
            }
            EmployeeEvent::SeatsPurchased(e) => {
                // First purchase sets the cap; later purchases add to it.
                self.member_limit += e.seats;
                self.package = Some(PackageInfo {
                    price: e.price,
                    members: e.seats,
                });
                self.payment_status = Some(PaymentStatus::Success);
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            EmployeeCommand::RegisterEmployee(cmd) => self.handle_register(cmd),
            EmployeeCommand::JoinTeam(cmd) => self.handle_join(cmd),
            EmployeeCommand::LeaveTeam(cmd) => self.handle_leave(cmd),
            EmployeeCommand::AddTeamMember(cmd) => self.handle_add_member(cmd),
            EmployeeCommand::AddTeamMembers(cmd) => self.handle_add_members(cmd),
            EmployeeCommand::RemoveTeamMember(cmd) => self.handle_remove_member(cmd),
            EmployeeCommand::RecordPayment(cmd) => self.handle_record_payment(cmd),
        }
    }
}

impl Employee {
    fn ensure_created(&self) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        Ok(())
    }

    fn ensure_employee_id(&self, employee_id: EmployeeId) -> Result<(), DomainError> {
        if self.id != employee_id {
            return Err(DomainError::invariant("employee_id mismatch"));
        }
        Ok(())
    }

    fn ensure_hr(&self) -> Result<(), DomainError> {
        if self.role != EmployeeRole::Hr {
            return Err(DomainError::invariant(
                "only HR identities manage a team roster",
            ));
        }
        Ok(())
    }

    fn handle_register(&self, cmd: &RegisterEmployee) -> Result<Vec<EmployeeEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("employee already registered"));
        }
        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }

        Ok(vec![EmployeeEvent::EmployeeRegistered(EmployeeRegistered {
            employee_id: cmd.employee_id,
            email: cmd.email.clone(),
            name: cmd.name.clone(),
            role: cmd.role,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_join(&self, cmd: &JoinTeam) -> Result<Vec<EmployeeEvent>, DomainError> {
        self.ensure_created()?;
        self.ensure_employee_id(cmd.employee_id)?;

        if self.is_join {
            return Err(DomainError::conflict("employee is already a team member"));
        }

        Ok(vec![EmployeeEvent::TeamJoined(TeamJoined {
            employee_id: cmd.employee_id,
            hr_email: cmd.hr_email.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_leave(&self, cmd: &LeaveTeam) -> Result<Vec<EmployeeEvent>, DomainError> {
        self.ensure_created()?;
        self.ensure_employee_id(cmd.employee_id)?;

        if !self.is_join {
            return Err(DomainError::invariant("employee is not a team member"));
        }

        Ok(vec![EmployeeEvent::TeamLeft(TeamLeft {
            employee_id: cmd.employee_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_add_member(&self, cmd: &AddTeamMember) -> Result<Vec<EmployeeEvent>, DomainError> {
        self.ensure_created()?;
        self.ensure_employee_id(cmd.employee_id)?;
        self.ensure_hr()?;

        // Idempotent under redelivery of the same membership.
        if self.roster.contains_key(&cmd.membership_id) {
            return Ok(vec![]);
        }

        Ok(vec![EmployeeEvent::MemberAdded(MemberAdded {
            employee_id: cmd.employee_id,
            membership_id: cmd.membership_id,
            hr: cmd.hr.clone(),
            member: cmd.member.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_add_members(&self, cmd: &AddTeamMembers) -> Result<Vec<EmployeeEvent>, DomainError> {
        self.ensure_created()?;
        self.ensure_employee_id(cmd.employee_id)?;
        self.ensure_hr()?;

        if cmd.entries.is_empty() {
            return Err(DomainError::validation("batch cannot be empty"));
        }

        let fresh: Vec<MembershipEntry> = cmd
            .entries
            .iter()
            .filter(|entry| !self.roster.contains_key(&entry.membership_id))
            .cloned()
            .collect();

        if fresh.is_empty() {
            return Ok(vec![]);
        }

        Ok(vec![EmployeeEvent::MembersAdded(MembersAdded {
            employee_id: cmd.employee_id,
            hr: cmd.hr.clone(),
            entries: fresh,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_remove_member(
        &self,
        cmd: &RemoveTeamMember,
    ) -> Result<Vec<EmployeeEvent>, DomainError> {
        self.ensure_created()?;
        self.ensure_employee_id(cmd.employee_id)?;
        self.ensure_hr()?;

        if !self.roster.contains_key(&cmd.membership_id) {
            // Redelivery of a completed removal.
            return Ok(vec![]);
        }

        Ok(vec![EmployeeEvent::MemberRemoved(MemberRemoved {
            employee_id: cmd.employee_id,
            membership_id: cmd.membership_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_record_payment(&self, cmd: &RecordPayment) -> Result<Vec<EmployeeEvent>, DomainError> {
        self.ensure_created()?;
        self.ensure_employee_id(cmd.employee_id)?;
        self.ensure_hr()?;

        if cmd.price == 0 {
            return Err(DomainError::validation("price must be positive"));
        }

        Ok(vec![EmployeeEvent::SeatsPurchased(SeatsPurchased {
            employee_id: cmd.employee_id,
            price: cmd.price,
            seats: seat_allotment(cmd.price),
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assetflow_core::AggregateId;

    fn test_employee_id() -> EmployeeId {
        EmployeeId::new(AggregateId::new())
    }

    fn test_time() -> DateTime<Utc> {
        Utc::now()
    }

    fn email(s: &str) -> EmailAddress {
        EmailAddress::parse(s).unwrap()
    }

    fn registered(role: EmployeeRole) -> Employee {
        let id = test_employee_id();
        let mut employee = Employee::empty(id);
        let events = employee
            .handle(&EmployeeCommand::RegisterEmployee(RegisterEmployee {
                employee_id: id,
                email: email("person@company.com"),
                name: "Person".to_string(),
                role,
                occurred_at: test_time(),
            }))
            .unwrap();
        for e in &events {
            employee.apply(e);
        }
        employee
    }

    fn drive(employee: &mut Employee, cmd: EmployeeCommand) -> Vec<EmployeeEvent> {
        let events = employee.handle(&cmd).unwrap();
        for e in &events {
            employee.apply(e);
        }
        events
    }

    fn hr_info() -> MemberInfo {
        MemberInfo {
            email: email("hr@company.com"),
            name: "HR".to_string(),
        }
    }

    fn member_info(n: usize) -> MemberInfo {
        MemberInfo {
            email: email(&format!("member{n}@company.com")),
            name: format!("Member {n}"),
        }
    }

    #[test]
    fn seat_allotment_tiers() {
        assert_eq!(seat_allotment(5), 5);
        assert_eq!(seat_allotment(8), 10);
        assert_eq!(seat_allotment(15), 20);
    }

    #[test]
    fn join_sets_flag_and_double_join_conflicts() {
        let mut employee = registered(EmployeeRole::Employee);
        let employee_id = employee.id_typed();
        drive(
            &mut employee,
            EmployeeCommand::JoinTeam(JoinTeam {
                employee_id,
                hr_email: email("hr@company.com"),
                occurred_at: test_time(),
            }),
        );
        assert!(employee.is_join());
        assert_eq!(employee.joined_under(), Some(&email("hr@company.com")));

        let err = employee
            .handle(&EmployeeCommand::JoinTeam(JoinTeam {
                employee_id: employee.id_typed(),
                hr_email: email("other@company.com"),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn leave_clears_flag() {
        let mut employee = registered(EmployeeRole::Employee);
        let employee_id = employee.id_typed();
        drive(
            &mut employee,
            EmployeeCommand::JoinTeam(JoinTeam {
                employee_id,
                hr_email: email("hr@company.com"),
                occurred_at: test_time(),
            }),
        );
        drive(
            &mut employee,
            EmployeeCommand::LeaveTeam(LeaveTeam {
                employee_id,
                occurred_at: test_time(),
            }),
        );
        assert!(!employee.is_join());
    }

    #[test]
    fn roster_commands_require_hr_role() {
        let employee = registered(EmployeeRole::Employee);
        let err = employee
            .handle(&EmployeeCommand::AddTeamMember(AddTeamMember {
                employee_id: employee.id_typed(),
                membership_id: Uuid::now_v7(),
                hr: hr_info(),
                member: member_info(1),
                occurred_at: test_time(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::InvariantViolation(_)));
    }

    #[test]
    fn add_member_increments_count_once_per_membership() {
        let mut hr = registered(EmployeeRole::Hr);
        let membership_id = Uuid::now_v7();
        let cmd = EmployeeCommand::AddTeamMember(AddTeamMember {
            employee_id: hr.id_typed(),
            membership_id,
            hr: hr_info(),
            member: member_info(1),
            occurred_at: test_time(),
        });

        drive(&mut hr, cmd.clone());
        assert_eq!(hr.employee_count(), 1);

        // Redelivery decides nothing.
        assert!(hr.handle(&cmd).unwrap().is_empty());
    }

    #[test]
    fn batch_add_increments_count_by_batch_size() {
        let mut hr = registered(EmployeeRole::Hr);
        let entries: Vec<MembershipEntry> = (0..4)
            .map(|n| MembershipEntry {
                membership_id: Uuid::now_v7(),
                member: member_info(n),
            })
            .collect();

        let employee_id = hr.id_typed();
        drive(
            &mut hr,
            EmployeeCommand::AddTeamMembers(AddTeamMembers {
                employee_id,
                hr: hr_info(),
                entries,
                occurred_at: test_time(),
            }),
        );

        assert_eq!(hr.employee_count(), 4);
    }

    #[test]
    fn remove_member_decrements_count() {
        let mut hr = registered(EmployeeRole::Hr);
        let membership_id = Uuid::now_v7();
        let employee_id = hr.id_typed();
        drive(
            &mut hr,
            EmployeeCommand::AddTeamMember(AddTeamMember {
                employee_id,
                membership_id,
                hr: hr_info(),
                member: member_info(1),
                occurred_at: test_time(),
            }),
        );

        drive(
            &mut hr,
            EmployeeCommand::RemoveTeamMember(RemoveTeamMember {
                employee_id,
                membership_id,
                occurred_at: test_time(),
            }),
        );
        assert_eq!(hr.employee_count(), 0);

        // Redelivery of the removal is a no-op.
        let redelivered = hr
            .handle(&EmployeeCommand::RemoveTeamMember(RemoveTeamMember {
                employee_id: hr.id_typed(),
                membership_id,
                occurred_at: test_time(),
            }))
            .unwrap();
        assert!(redelivered.is_empty());
    }

    #[test]
    fn first_payment_sets_limit_and_later_payments_add() {
        let mut hr = registered(EmployeeRole::Hr);
        let employee_id = hr.id_typed();

        drive(
            &mut hr,
            EmployeeCommand::RecordPayment(RecordPayment {
                employee_id,
                price: 8,
                occurred_at: test_time(),
            }),
        );
        assert_eq!(hr.member_limit(), 10);
        assert_eq!(hr.payment_status(), Some(PaymentStatus::Success));

        drive(
            &mut hr,
            EmployeeCommand::RecordPayment(RecordPayment {
                employee_id,
                price: 5,
                occurred_at: test_time(),
            }),
        );
        assert_eq!(hr.member_limit(), 15);
        assert_eq!(
            hr.package(),
            Some(PackageInfo {
                price: 5,
                members: 5
            })
        );
    }
}
