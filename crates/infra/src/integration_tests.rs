//! Integration tests for the full pipeline:
//! command → event store → projections → services.

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::Utc;

    use assetflow_assets::{
        Asset, AssetCommand, AssetId, Availability, DecrementOnApprove, ProductType,
    };
    use assetflow_core::EmailAddress;
    use assetflow_events::InMemoryEventBus;
    use assetflow_membership::EmployeeRole;
    use assetflow_payments::MockGateway;
    use assetflow_requests::{
        ApproveRequest, Request, RequestCommand, RequestId, RequestStatus, RequesterInfo,
    };

    use crate::command_dispatcher::CommandDispatcher;
    use crate::event_store::InMemoryEventStore;
    use crate::projections::{
        AssetsProjection, EmployeesProjection, PageRequest, PaymentsProjection,
        RequestsProjection, TeamsProjection,
    };
    use crate::read_model::InMemoryRecordStore;
    use crate::services::{
        AssetService, Assets, CreateAssetInput, CreateRequestInput, Dispatcher, Employees,
        MembershipService, PaymentService, Payments, RecordPaymentInput, RegisterEmployeeInput,
        RequestWorkflowService, Requests, ServiceError, Teams,
    };

    struct Harness {
        dispatcher: Arc<Dispatcher>,
        assets: Arc<Assets>,
        requests: Arc<Requests>,
        employees: Arc<Employees>,
        asset_service: AssetService,
        workflow: RequestWorkflowService,
        membership: MembershipService,
        payment_service: PaymentService,
        payments: Arc<Payments>,
        teams: Arc<Teams>,
    }

    fn setup() -> Harness {
        let store = Arc::new(InMemoryEventStore::new());
        let bus = Arc::new(InMemoryEventBus::new());
        let dispatcher = Arc::new(CommandDispatcher::new(store, bus));

        let assets: Arc<Assets> =
            Arc::new(AssetsProjection::new(Arc::new(InMemoryRecordStore::new())));
        let requests: Arc<Requests> =
            Arc::new(RequestsProjection::new(Arc::new(InMemoryRecordStore::new())));
        let employees: Arc<Employees> =
            Arc::new(EmployeesProjection::new(Arc::new(InMemoryRecordStore::new())));
        let teams: Arc<Teams> =
            Arc::new(TeamsProjection::new(Arc::new(InMemoryRecordStore::new())));
        let payments: Arc<Payments> =
            Arc::new(PaymentsProjection::new(Arc::new(InMemoryRecordStore::new())));

        Harness {
            asset_service: AssetService::new(dispatcher.clone(), assets.clone()),
            workflow: RequestWorkflowService::new(
                dispatcher.clone(),
                requests.clone(),
                assets.clone(),
            ),
            membership: MembershipService::new(
                dispatcher.clone(),
                employees.clone(),
                teams.clone(),
            ),
            payment_service: PaymentService::new(
                dispatcher.clone(),
                payments.clone(),
                Arc::new(MockGateway),
            ),
            dispatcher,
            assets,
            requests,
            employees,
            teams,
            payments,
        }
    }

    fn email(s: &str) -> EmailAddress {
        EmailAddress::parse(s).unwrap()
    }

    fn requester(n: u32) -> RequesterInfo {
        RequesterInfo {
            email: email(&format!("employee{n}@company.com")),
            name: format!("Employee {n}"),
        }
    }

    fn seed_asset(h: &Harness, quantity: i64) -> AssetId {
        h.asset_service
            .create(CreateAssetInput {
                product_name: "Laptop".to_string(),
                product_type: ProductType::Returnable,
                product_quantity: quantity,
                provider: email("hr@company.com"),
            })
            .unwrap()
    }

    #[test]
    fn approve_then_return_walks_quantity_and_availability() {
        let h = setup();
        let asset_id = seed_asset(&h, 1);

        let request_id = h
            .workflow
            .create(CreateRequestInput {
                asset_id,
                requester: requester(1),
                note: None,
            })
            .unwrap();

        h.workflow.approve(request_id).unwrap();
        let row = h.assets.get(&asset_id).unwrap();
        assert_eq!(row.product_quantity, 0);
        assert_eq!(row.availability(), Availability::OutOfStock);
        assert_eq!(
            h.requests.get(&request_id).unwrap().status,
            RequestStatus::Approved
        );

        h.workflow.return_request(request_id).unwrap();
        let row = h.assets.get(&asset_id).unwrap();
        assert_eq!(row.product_quantity, 1);
        assert_eq!(row.availability(), Availability::Available);
        assert_eq!(
            h.requests.get(&request_id).unwrap().status,
            RequestStatus::Returned
        );
    }

    #[test]
    fn second_active_request_for_same_asset_is_a_duplicate() {
        let h = setup();
        let asset_id = seed_asset(&h, 5);

        h.workflow
            .create(CreateRequestInput {
                asset_id,
                requester: requester(1),
                note: None,
            })
            .unwrap();

        let err = h
            .workflow
            .create(CreateRequestInput {
                asset_id,
                requester: requester(1),
                note: None,
            })
            .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateRequest));

        // Exactly one stored request.
        let page = h
            .requests
            .for_requester(&requester(1).email, None, None, PageRequest::all());
        assert_eq!(page.count, 1);

        // A different requester is not blocked.
        h.workflow
            .create(CreateRequestInput {
                asset_id,
                requester: requester(2),
                note: None,
            })
            .unwrap();
    }

    #[test]
    fn approving_out_of_stock_asset_leaves_everything_untouched() {
        let h = setup();
        let asset_id = seed_asset(&h, 0);

        let request_id = h
            .workflow
            .create(CreateRequestInput {
                asset_id,
                requester: requester(1),
                note: None,
            })
            .unwrap();

        let err = h.workflow.approve(request_id).unwrap_err();
        assert!(matches!(err, ServiceError::Dispatch(_)));

        assert_eq!(
            h.requests.get(&request_id).unwrap().status,
            RequestStatus::Pending
        );
        assert_eq!(h.assets.get(&asset_id).unwrap().product_quantity, 0);
    }

    #[test]
    fn approving_a_decided_request_is_rejected_without_inventory_effect() {
        let h = setup();
        let asset_id = seed_asset(&h, 3);

        let request_id = h
            .workflow
            .create(CreateRequestInput {
                asset_id,
                requester: requester(1),
                note: None,
            })
            .unwrap();
        h.workflow
            .update_status(request_id, RequestStatus::Rejected)
            .unwrap();

        assert!(h.workflow.approve(request_id).is_err());
        assert_eq!(h.assets.get(&asset_id).unwrap().product_quantity, 3);
    }

    #[test]
    fn redelivered_inventory_effect_is_a_no_op() {
        let h = setup();
        let asset_id = seed_asset(&h, 5);
        let request_id = uuid::Uuid::now_v7();

        let first = h
            .dispatcher
            .dispatch::<Asset>(
                asset_id.0,
                "asset",
                AssetCommand::DecrementOnApprove(DecrementOnApprove {
                    asset_id,
                    request_id,
                    occurred_at: Utc::now(),
                }),
                |id| Asset::empty(AssetId::new(id)),
            )
            .unwrap();
        assert_eq!(first.len(), 1);

        let redelivered = h
            .dispatcher
            .dispatch::<Asset>(
                asset_id.0,
                "asset",
                AssetCommand::DecrementOnApprove(DecrementOnApprove {
                    asset_id,
                    request_id,
                    occurred_at: Utc::now(),
                }),
                |id| Asset::empty(AssetId::new(id)),
            )
            .unwrap();
        assert!(redelivered.is_empty());
    }

    #[test]
    fn repair_converges_after_a_lost_phase_two() {
        let h = setup();
        let asset_id = seed_asset(&h, 2);

        let request_id = h
            .workflow
            .create(CreateRequestInput {
                asset_id,
                requester: requester(1),
                note: None,
            })
            .unwrap();

        // Simulate a crash between the phases: the approval lands on the
        // request stream but the inventory decrement never runs.
        let committed = h
            .dispatcher
            .dispatch::<Request>(
                request_id.0,
                "request",
                RequestCommand::ApproveRequest(ApproveRequest {
                    request_id,
                    occurred_at: Utc::now(),
                }),
                |id| Request::empty(RequestId::new(id)),
            )
            .unwrap();
        for stored in &committed {
            h.requests.apply_envelope(&stored.to_envelope()).unwrap();
        }
        assert_eq!(h.assets.get(&asset_id).unwrap().product_quantity, 2);

        h.workflow.repair().unwrap();
        assert_eq!(h.assets.get(&asset_id).unwrap().product_quantity, 1);

        // Repair is idempotent.
        h.workflow.repair().unwrap();
        assert_eq!(h.assets.get(&asset_id).unwrap().product_quantity, 1);
    }

    #[test]
    fn batch_add_updates_counter_flags_and_team_rows() {
        let h = setup();
        let hr_email = email("hr@company.com");
        h.membership
            .register(RegisterEmployeeInput {
                email: hr_email.clone(),
                name: "HR".to_string(),
                role: EmployeeRole::Hr,
            })
            .unwrap();

        let member_emails: Vec<EmailAddress> = (1..=3)
            .map(|n| {
                let e = email(&format!("employee{n}@company.com"));
                h.membership
                    .register(RegisterEmployeeInput {
                        email: e.clone(),
                        name: format!("Employee {n}"),
                        role: EmployeeRole::Employee,
                    })
                    .unwrap();
                e
            })
            .collect();

        let membership_ids = h.membership.add_members(&hr_email, &member_emails).unwrap();
        assert_eq!(membership_ids.len(), 3);

        let hr_row = h.employees.by_email(&hr_email).unwrap();
        assert_eq!(hr_row.employee_count, 3);
        for e in &member_emails {
            assert!(h.employees.by_email(e).unwrap().is_join);
        }
        assert_eq!(h.teams.team_of_hr(&hr_email, PageRequest::all()).count, 3);

        // A member sees the whole team, and removal unwinds all three views.
        let member_page = h
            .teams
            .team_of_member(&member_emails[0], PageRequest::all());
        assert_eq!(member_page.count, 3);

        h.membership.remove_member(membership_ids[0]).unwrap();
        assert_eq!(h.employees.by_email(&hr_email).unwrap().employee_count, 2);
        assert!(!h.employees.by_email(&member_emails[0]).unwrap().is_join);
        assert_eq!(h.teams.team_of_hr(&hr_email, PageRequest::all()).count, 2);
    }

    #[test]
    fn batch_with_unknown_email_leaves_no_member_joined() {
        let h = setup();
        let hr_email = email("hr@company.com");
        h.membership
            .register(RegisterEmployeeInput {
                email: hr_email.clone(),
                name: "HR".to_string(),
                role: EmployeeRole::Hr,
            })
            .unwrap();

        let known = email("employee1@company.com");
        h.membership
            .register(RegisterEmployeeInput {
                email: known.clone(),
                name: "Employee 1".to_string(),
                role: EmployeeRole::Employee,
            })
            .unwrap();

        let err = h
            .membership
            .add_members(
                &hr_email,
                &[known.clone(), email("ghost@company.com")],
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound));

        // The rejected batch changed nothing: no join flag, no roster entry,
        // no team row.
        assert!(!h.employees.by_email(&known).unwrap().is_join);
        assert_eq!(h.employees.by_email(&hr_email).unwrap().employee_count, 0);
        assert_eq!(h.teams.team_of_hr(&hr_email, PageRequest::all()).count, 0);

        // The same member can still be added once the batch is valid.
        h.membership.add_members(&hr_email, &[known.clone()]).unwrap();
        assert!(h.employees.by_email(&known).unwrap().is_join);
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let h = setup();
        h.membership
            .register(RegisterEmployeeInput {
                email: email("Person@Company.com"),
                name: "Person".to_string(),
                role: EmployeeRole::Employee,
            })
            .unwrap();

        // Same address in different case: normalized before the check.
        let err = h
            .membership
            .register(RegisterEmployeeInput {
                email: email("person@company.com"),
                name: "Person".to_string(),
                role: EmployeeRole::Employee,
            })
            .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateEmployee));
    }

    #[test]
    fn seat_purchases_accumulate_the_member_limit() {
        let h = setup();
        let hr_email = email("hr@company.com");
        h.membership
            .register(RegisterEmployeeInput {
                email: hr_email.clone(),
                name: "HR".to_string(),
                role: EmployeeRole::Hr,
            })
            .unwrap();

        h.membership.record_payment(&hr_email, 8).unwrap();
        assert_eq!(h.employees.by_email(&hr_email).unwrap().member_limit, 10);

        h.membership.record_payment(&hr_email, 5).unwrap();
        let row = h.employees.by_email(&hr_email).unwrap();
        assert_eq!(row.member_limit, 15);
        assert_eq!(row.package.unwrap().members, 5);
    }

    #[tokio::test]
    async fn payment_intent_and_receipt() {
        let h = setup();

        let intent = h.payment_service.create_intent(8).await.unwrap();
        assert!(intent.client_secret.contains("800"));

        assert!(matches!(
            h.payment_service.create_intent(0).await.unwrap_err(),
            ServiceError::Validation(_)
        ));

        let payer = email("hr@company.com");
        h.payment_service
            .record(RecordPaymentInput {
                payer_email: payer.clone(),
                payer_name: "HR".to_string(),
                price: 8,
            })
            .unwrap();
        let receipts = h.payments.for_payer(&payer);
        assert_eq!(receipts.len(), 1);
        assert_eq!(receipts[0].seats, 10);
    }

    #[test]
    fn asset_list_filters_search_and_sort() {
        let h = setup();
        let provider = email("hr@company.com");

        for (name, quantity) in [("Laptop", 5), ("Chair", 0), ("Monitor", 12)] {
            h.asset_service
                .create(CreateAssetInput {
                    product_name: name.to_string(),
                    product_type: ProductType::Returnable,
                    product_quantity: quantity,
                    provider: provider.clone(),
                })
                .unwrap();
        }

        let out_of_stock = h.assets.list(
            Some(&provider),
            crate::projections::AssetFilter::parse("Out of stock"),
            None,
            None,
            PageRequest::all(),
        );
        assert_eq!(out_of_stock.items.len(), 1);
        assert_eq!(out_of_stock.items[0].product_name, "Chair");
        // Count spans the provider scope, not the filtered rows.
        assert_eq!(out_of_stock.count, 3);

        let searched = h.assets.list(
            Some(&provider),
            None,
            None,
            Some("lap"),
            PageRequest::all(),
        );
        assert_eq!(searched.items.len(), 1);

        let by_quantity = h.assets.list(
            Some(&provider),
            None,
            crate::projections::AssetSort::parse("quantity-asc"),
            None,
            PageRequest::all(),
        );
        let quantities: Vec<i64> = by_quantity
            .items
            .iter()
            .map(|r| r.product_quantity)
            .collect();
        assert_eq!(quantities, vec![0, 5, 12]);

        let limited = h.assets.limited_stock(&provider, 10);
        assert_eq!(limited.len(), 2);
    }
}
