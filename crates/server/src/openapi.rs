use utoipa::OpenApi;
use utoipa::ToSchema;

#[derive(ToSchema)]
pub struct HealthResponse { pub status: String }

#[derive(ToSchema)]
pub struct LoginRequest { pub username: String, pub password: String }

#[derive(ToSchema)]
pub struct LoginResponse { pub username: String, pub token: String, pub expires_at: i64 }

#[derive(ToSchema)]
pub struct ActionResultDoc { pub success: bool, pub message: String }

#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct CommodityDoc {
    pub name: String,
    pub quantity: f64,
    pub quantity_unit: String,
    pub value: Option<f64>,
    pub value_currency: Option<String>,
    pub rejected_quantity: Option<f64>,
    pub rejected_quantity_unit: Option<String>,
}

/// Submission body. Dates accept ISO/RFC text or epoch milliseconds.
#[derive(ToSchema)]
#[schema(rename_all = "camelCase")]
pub struct ReportInputDoc {
    pub regional_office: String,
    pub other_office: String,
    pub application_date: String,
    pub inspection_date: String,
    pub service_type: String,
    pub purpose: Option<String>,
    pub client_name: String,
    pub contact_number: String,
    pub trade_cid_number: String,
    pub document_number: Option<String>,
    pub commodities: Vec<CommodityDoc>,
    pub movement_from: Option<String>,
    pub movement_to: Option<String>,
    pub service_provider: String,
    pub fines: Option<f64>,
    pub receipt_number: Option<String>,
    pub remarks: Option<String>,
}

#[derive(ToSchema)]
pub struct FieldIssueDoc { pub field: String, pub message: String }

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::routes::health,
        crate::routes::reports::reference,
        crate::routes::reports::submit_report,
        crate::routes::reports::list_reports,
        crate::routes::reports::export_reports,
        crate::routes::reports::delete_report,
        crate::routes::auth::login,
        crate::routes::auth::logout,
        crate::routes::auth::me,
    ),
    components(
        schemas(
            HealthResponse,
            LoginRequest,
            LoginResponse,
            ActionResultDoc,
            CommodityDoc,
            ReportInputDoc,
            FieldIssueDoc,
        )
    ),
    tags(
        (name = "health"),
        (name = "reports"),
        (name = "admin"),
        (name = "auth")
    )
)]
pub struct ApiDoc;
