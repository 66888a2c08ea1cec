//! Infrastructure wiring: event store, bus, dispatcher, projections, services.

use std::sync::Arc;

use assetflow_auth::TokenService;
use assetflow_events::InMemoryEventBus;
use assetflow_infra::command_dispatcher::CommandDispatcher;
use assetflow_infra::event_store::InMemoryEventStore;
use assetflow_infra::projections::{
    AssetsProjection, EmployeesProjection, PaymentsProjection, RequestsProjection, TeamsProjection,
};
use assetflow_infra::read_model::InMemoryRecordStore;
use assetflow_infra::services::{
    AssetService, Assets, Employees, MembershipService, PaymentService, Payments,
    RequestWorkflowService, Requests, Teams,
};
use assetflow_payments::PaymentGateway;

/// Everything the route handlers need, wired over the in-memory backends.
pub struct AppServices {
    pub tokens: Arc<TokenService>,

    pub asset_service: AssetService,
    pub workflow: RequestWorkflowService,
    pub membership: MembershipService,
    pub payment_service: PaymentService,

    pub assets: Arc<Assets>,
    pub requests: Arc<Requests>,
    pub employees: Arc<Employees>,
    pub teams: Arc<Teams>,
    pub payments: Arc<Payments>,
}

pub fn build_services(jwt_secret: &str, gateway: Arc<dyn PaymentGateway>) -> AppServices {
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

    AppServices {
        tokens: Arc::new(TokenService::new(jwt_secret)),
        asset_service: AssetService::new(dispatcher.clone(), assets.clone()),
        workflow: RequestWorkflowService::new(dispatcher.clone(), requests.clone(), assets.clone()),
        membership: MembershipService::new(dispatcher.clone(), employees.clone(), teams.clone()),
        payment_service: PaymentService::new(dispatcher, payments.clone(), gateway),
        assets,
        requests,
        employees,
        teams,
        payments,
    }
}
