use axum::{
    Router,
    routing::{delete, get, patch, post},
};

pub mod assets;
pub mod employees;
pub mod payments;
pub mod requests;
pub mod system;
pub mod teams;

/// Routes that mirror the frontend's unauthenticated surface.
pub fn public_router() -> Router {
    Router::new()
        .route("/", get(system::root))
        .route("/jwt", post(system::issue_token))
        .route("/employees", post(employees::register))
        .route("/employee/:email", get(employees::get_employee))
        .route("/employee/role/:email", get(employees::get_role))
        .route("/employee/payment/:email", patch(employees::record_hr_payment))
        .route("/company-info/:email", get(teams::company_info))
        .route("/teams/single", post(teams::add_single))
        .route("/teams/multiple", post(teams::add_multiple))
        .route("/team/:id", delete(teams::remove_member))
        .route("/asset/:id", get(assets::get_asset).delete(assets::delete_asset))
        .route("/asset/request", post(requests::create))
        .route("/asset/request/approve", patch(requests::approve))
        .route("/asset/request/return", patch(requests::return_request))
        .route("/asset/update-status/:id", patch(requests::update_status))
        .route("/payments", post(payments::record))
        .route("/all-request/count/:email", get(requests::provider_count))
        .route("/assets/pending-request/:email", get(requests::pending_for_provider))
        .route("/assets/top-request/:email", get(assets::top_requested))
        .route("/assets/limited-stock/:email", get(assets::limited_stock))
        .route("/assets/count/:email", get(requests::pending_type_counts))
        .route("/assets/e/pending-request/:email", get(requests::pending_for_requester))
        .route("/assets/e/monthly-request/:email", get(requests::monthly_for_requester))
}

/// Routes behind the bearer-token middleware.
pub fn protected_router() -> Router {
    Router::new()
        .route("/assets", get(assets::list_all).post(assets::create))
        .route("/assets/hr/:email", get(assets::list_for_provider))
        .route("/asset/:id", patch(assets::update))
        .route("/assets/requested-assets/:email", get(requests::for_requester))
        .route("/assets/all-requests/:email", get(requests::hr_inbox))
        .route("/employees/not-affiliated", get(employees::not_affiliated))
        .route("/my-team/:email", get(teams::my_team))
        .route("/my-teams/e/:email", get(teams::my_teams))
        .route("/create-payment-intent", post(payments::create_intent))
}
