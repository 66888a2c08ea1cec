//! Membership service: registration, team formation, seat purchases.
//!
//! Team compound transitions run in two phases: phase 1 flips the member's
//! join flag, phase 2 updates the HR roster (idempotent per membership id).
//! The team rows and the HR's `employee_count` both derive from the HR-side
//! events, so they cannot disagree with each other.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use assetflow_core::{AggregateId, EmailAddress};
use assetflow_membership::{
    AddTeamMember, AddTeamMembers, Employee, EmployeeCommand, EmployeeId, EmployeeRole, JoinTeam,
    LeaveTeam, MemberInfo, MembershipEntry, RecordPayment, RegisterEmployee, RemoveTeamMember,
};

use super::{Dispatcher, Employees, ServiceError, Teams};

const EMPLOYEE_AGGREGATE: &str = "employee";

#[derive(Debug, Clone)]
pub struct RegisterEmployeeInput {
    pub email: EmailAddress,
    pub name: String,
    pub role: EmployeeRole,
}

pub struct MembershipService {
    dispatcher: Arc<Dispatcher>,
    employees: Arc<Employees>,
    teams: Arc<Teams>,
}

impl MembershipService {
    pub fn new(dispatcher: Arc<Dispatcher>, employees: Arc<Employees>, teams: Arc<Teams>) -> Self {
        Self {
            dispatcher,
            employees,
            teams,
        }
    }

    /// Register a new identity. Email uniqueness is enforced here against the
    /// read model; emails are already normalized by `EmailAddress`.
    pub fn register(&self, input: RegisterEmployeeInput) -> Result<EmployeeId, ServiceError> {
        if self.employees.by_email(&input.email).is_some() {
            return Err(ServiceError::DuplicateEmployee);
        }

        let employee_id = EmployeeId::new(AggregateId::new());
        self.dispatch_and_apply(
            employee_id,
            EmployeeCommand::RegisterEmployee(RegisterEmployee {
                employee_id,
                email: input.email,
                name: input.name,
                role: input.role,
                occurred_at: Utc::now(),
            }),
        )?;
        Ok(employee_id)
    }

    /// Put one employee on an HR's team.
    pub fn add_member(
        &self,
        hr_email: &EmailAddress,
        member_email: &EmailAddress,
    ) -> Result<Uuid, ServiceError> {
        let hr = self.employees.by_email(hr_email).ok_or(ServiceError::NotFound)?;
        let member = self
            .employees
            .by_email(member_email)
            .ok_or(ServiceError::NotFound)?;

        self.warn_if_over_cap(&hr, 1);

        let membership_id = Uuid::now_v7();

        // Phase 1: the member's join flag (guards double join).
        self.dispatch_and_apply(
            member.employee_id,
            EmployeeCommand::JoinTeam(JoinTeam {
                employee_id: member.employee_id,
                hr_email: hr.email.clone(),
                occurred_at: Utc::now(),
            }),
        )?;

        // Phase 2: the HR roster (idempotent per membership id).
        self.dispatch_and_apply(
            hr.employee_id,
            EmployeeCommand::AddTeamMember(AddTeamMember {
                employee_id: hr.employee_id,
                membership_id,
                hr: member_info(&hr),
                member: member_info(&member),
                occurred_at: Utc::now(),
            }),
        )?;

        Ok(membership_id)
    }

    /// Put a batch of employees on an HR's team at once.
    ///
    /// An unknown email rejects the whole batch before anyone joins. Members
    /// already on a team are skipped with a warning; the HR roster gains
    /// exactly the members whose phase 1 landed.
    pub fn add_members(
        &self,
        hr_email: &EmailAddress,
        member_emails: &[EmailAddress],
    ) -> Result<Vec<Uuid>, ServiceError> {
        let hr = self.employees.by_email(hr_email).ok_or(ServiceError::NotFound)?;
        if member_emails.is_empty() {
            return Err(ServiceError::Validation("batch cannot be empty".to_string()));
        }

        // Resolve the whole batch before dispatching anything: one unknown
        // email must not abort the loop with earlier members already joined.
        let mut members = Vec::with_capacity(member_emails.len());
        for email in member_emails {
            members.push(self.employees.by_email(email).ok_or(ServiceError::NotFound)?);
        }

        self.warn_if_over_cap(&hr, members.len() as u32);

        let mut entries = Vec::new();
        for member in members {
            let joined = self.dispatch_and_apply(
                member.employee_id,
                EmployeeCommand::JoinTeam(JoinTeam {
                    employee_id: member.employee_id,
                    hr_email: hr.email.clone(),
                    occurred_at: Utc::now(),
                }),
            );
            match joined {
                Ok(()) => entries.push(MembershipEntry {
                    membership_id: Uuid::now_v7(),
                    member: member_info(&member),
                }),
                Err(e) => {
                    tracing::warn!(member = %member.email, error = %e, "batch add skipped a member");
                }
            }
        }

        if entries.is_empty() {
            return Err(ServiceError::Validation(
                "no member in the batch could join".to_string(),
            ));
        }

        let membership_ids: Vec<Uuid> = entries.iter().map(|e| e.membership_id).collect();

        self.dispatch_and_apply(
            hr.employee_id,
            EmployeeCommand::AddTeamMembers(AddTeamMembers {
                employee_id: hr.employee_id,
                hr: member_info(&hr),
                entries,
                occurred_at: Utc::now(),
            }),
        )?;

        Ok(membership_ids)
    }

    /// Remove a membership: the member's flag clears, the HR roster shrinks,
    /// the team row disappears.
    pub fn remove_member(&self, membership_id: Uuid) -> Result<(), ServiceError> {
        let row = self.teams.get(&membership_id).ok_or(ServiceError::NotFound)?;
        let member = self
            .employees
            .by_email(&row.member_email)
            .ok_or(ServiceError::NotFound)?;
        let hr = self
            .employees
            .by_email(&row.hr_email)
            .ok_or(ServiceError::NotFound)?;

        self.dispatch_and_apply(
            member.employee_id,
            EmployeeCommand::LeaveTeam(LeaveTeam {
                employee_id: member.employee_id,
                occurred_at: Utc::now(),
            }),
        )?;

        self.dispatch_and_apply(
            hr.employee_id,
            EmployeeCommand::RemoveTeamMember(RemoveTeamMember {
                employee_id: hr.employee_id,
                membership_id,
                occurred_at: Utc::now(),
            }),
        )?;

        Ok(())
    }

    /// Record a seat purchase on the HR identity. First purchase sets the
    /// member limit; later purchases add to it.
    pub fn record_payment(&self, hr_email: &EmailAddress, price: u32) -> Result<(), ServiceError> {
        let hr = self.employees.by_email(hr_email).ok_or(ServiceError::NotFound)?;

        self.dispatch_and_apply(
            hr.employee_id,
            EmployeeCommand::RecordPayment(RecordPayment {
                employee_id: hr.employee_id,
                price,
                occurred_at: Utc::now(),
            }),
        )?;
        Ok(())
    }

    // The member limit is a soft cap: the add proceeds, the operator gets a
    // warning.
    fn warn_if_over_cap(&self, hr: &crate::projections::EmployeeRow, adding: u32) {
        if hr.member_limit > 0 && hr.employee_count + adding > hr.member_limit {
            tracing::warn!(
                hr = %hr.email,
                employee_count = hr.employee_count,
                member_limit = hr.member_limit,
                adding,
                "team size exceeds the purchased member limit"
            );
        }
    }

    fn dispatch_and_apply(
        &self,
        employee_id: EmployeeId,
        command: EmployeeCommand,
    ) -> Result<(), ServiceError> {
        let committed = self.dispatcher.dispatch::<Employee>(
            employee_id.0,
            EMPLOYEE_AGGREGATE,
            command,
            |id| Employee::empty(EmployeeId::new(id)),
        )?;

        for stored in &committed {
            let envelope = stored.to_envelope();
            self.employees.apply_envelope(&envelope)?;
            self.teams.apply_envelope(&envelope)?;
        }
        Ok(())
    }
}

fn member_info(row: &crate::projections::EmployeeRow) -> MemberInfo {
    MemberInfo {
        email: row.email.clone(),
        name: row.name.clone(),
    }
}
