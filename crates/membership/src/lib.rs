//! `assetflow-membership` — the membership ledger.
//!
//! One `Employee` aggregate per identity. Regular employees carry the join
//! flag; HR identities additionally carry the member roster (from which
//! `employee_count` is derived), the purchased seat cap, and package/payment
//! state. Team roster rows are a projection over this aggregate's events.

pub mod employee;

pub use employee::{
    AddTeamMember, AddTeamMembers, Employee, EmployeeCommand, EmployeeEvent, EmployeeId,
    EmployeeRegistered, EmployeeRole, JoinTeam, LeaveTeam, MemberAdded, MemberInfo, MemberRemoved,
    MembersAdded, MembershipEntry, PackageInfo, PaymentStatus, RecordPayment, RegisterEmployee,
    RemoveTeamMember, SeatsPurchased, TeamJoined, TeamLeft, seat_allotment,
};
