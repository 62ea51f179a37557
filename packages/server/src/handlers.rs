//! HTTP handler functions for the landslide viewer API.
//!
//! Every data endpoint sits behind the login gate: requests must carry an
//! `Authorization: Bearer <token>` header naming an open session.

use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, http::header, web};
use landslide_viewer_auth::{AuthError, Session};
use landslide_viewer_incident_models::Selection;
use landslide_viewer_pipeline::{Dataset, FilterSelection};
use landslide_viewer_server_models::{
    ApiHealth, ApiView, CredentialsRequest, DistrictQueryParams, LoginResponse, ViewQueryParams,
};

use crate::AppState;

/// `GET /api/health`
pub async fn health(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok().json(ApiHealth {
        healthy: true,
        version: env!("CARGO_PKG_VERSION").to_string(),
        dataset_loaded: state.dataset.get().is_some(),
    })
}

/// `POST /api/auth/register`
///
/// Creates a user. Responds `201` on success, `400` when a field is empty
/// and `409` when the username is taken.
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<CredentialsRequest>,
) -> HttpResponse {
    match landslide_viewer_auth::register(state.users.as_ref(), &body.username, &body.password)
        .await
    {
        Ok(()) => HttpResponse::Created().json(serde_json::json!({
            "username": body.username,
        })),
        Err(e) => auth_error_response(&e),
    }
}

/// `POST /api/auth/login`
///
/// Checks the credentials and opens a session whose token must be sent as
/// a bearer token on subsequent requests.
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<CredentialsRequest>,
) -> HttpResponse {
    match landslide_viewer_auth::login(state.users.as_ref(), &body.username, &body.password).await
    {
        Ok(()) => {
            let session = state.sessions.open(&body.username);
            log::info!("User {} logged in", session.username);
            HttpResponse::Ok().json(LoginResponse {
                token: session.token,
                username: session.username,
            })
        }
        Err(e) => auth_error_response(&e),
    }
}

/// `POST /api/auth/logout`
pub async fn logout(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    match bearer_token(&req) {
        Some(token) if state.sessions.close(token) => HttpResponse::NoContent().finish(),
        _ => unauthorized(),
    }
}

/// `GET /api/regions`
///
/// Region selector choices, sentinel first.
pub async fn regions(state: web::Data<AppState>, req: HttpRequest) -> HttpResponse {
    if let Err(response) = authenticate(&state, &req) {
        return response;
    }
    match dataset(&state).await {
        Ok(dataset) => HttpResponse::Ok().json(dataset.region_choices()),
        Err(response) => response,
    }
}

/// `GET /api/districts?region=`
///
/// District selector choices for the incidents inside the region,
/// sentinel first.
pub async fn districts(
    state: web::Data<AppState>,
    req: HttpRequest,
    params: web::Query<DistrictQueryParams>,
) -> HttpResponse {
    if let Err(response) = authenticate(&state, &req) {
        return response;
    }
    let dataset = match dataset(&state).await {
        Ok(dataset) => dataset,
        Err(response) => return response,
    };

    let selection = FilterSelection {
        region: Selection::from_optional(params.region.as_deref()),
        ..FilterSelection::default()
    };
    let output = landslide_viewer_pipeline::run(
        &dataset,
        &selection,
        &state.config.labels.entire_area,
    );
    HttpResponse::Ok().json(output.district_choices)
}

/// `GET /api/view`
///
/// Runs the full filter pipeline for the query and returns everything the
/// map needs: choices, boundary, incident points, range controls and
/// summary.
pub async fn view(
    state: web::Data<AppState>,
    req: HttpRequest,
    params: web::Query<ViewQueryParams>,
) -> HttpResponse {
    if let Err(response) = authenticate(&state, &req) {
        return response;
    }
    let dataset = match dataset(&state).await {
        Ok(dataset) => dataset,
        Err(response) => return response,
    };

    let output = landslide_viewer_pipeline::run(
        &dataset,
        &params.to_selection(),
        &state.config.labels.entire_area,
    );
    HttpResponse::Ok().json(ApiView::from_output(&output, &dataset))
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
fn bearer_token(req: &HttpRequest) -> Option<&str> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}

/// Resolves the request's session, or the `401` response to send.
fn authenticate(state: &AppState, req: &HttpRequest) -> Result<Session, HttpResponse> {
    bearer_token(req)
        .and_then(|token| state.sessions.get(token))
        .ok_or_else(unauthorized)
}

/// Loads the dataset on first use. A load failure becomes a `500`.
async fn dataset(state: &AppState) -> Result<Arc<Dataset>, HttpResponse> {
    state
        .dataset
        .get_or_load(&state.config)
        .await
        .map_err(|e| {
            log::error!("Failed to load dataset: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "Failed to load dataset"
            }))
        })
}

fn unauthorized() -> HttpResponse {
    HttpResponse::Unauthorized().json(serde_json::json!({
        "error": "Login required"
    }))
}

fn auth_error_response(e: &AuthError) -> HttpResponse {
    let body = serde_json::json!({ "error": e.to_string() });
    match e {
        AuthError::MissingFields => HttpResponse::BadRequest().json(body),
        AuthError::UsernameTaken(_) => HttpResponse::Conflict().json(body),
        AuthError::InvalidCredentials => HttpResponse::Unauthorized().json(body),
        AuthError::Io(_) | AuthError::Json(_) => {
            log::error!("User store error: {e}");
            HttpResponse::InternalServerError().json(serde_json::json!({
                "error": "User store unavailable"
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, test, web};
    use landslide_viewer_auth::MemoryUserStore;
    use landslide_viewer_incident_models::ColumnMapping;
    use landslide_viewer_pipeline::Dataset;
    use landslide_viewer_source::config::AppConfig;
    use landslide_viewer_source::records::parse_csv;
    use landslide_viewer_spatial::{BoundaryFields, BoundarySet};

    use crate::AppState;

    const RECORDS: &str = "\
Regency/City,District,Latitude Decimals,Longitude Decimals,Elevation (m),Slope Angle (°)
Bandung,Coblong,-6.90,107.60,800,15
Bandung,Lembang,-6.80,107.50,1300,35
Garut,Tarogong,-7.20,107.90,700,25
Garut,Tarogong,,107.90,650,20
";

    const BOUNDARIES: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "properties": { "KABKOT": "Bandung", "KECAMATAN": "Coblong" },
      "geometry": { "type": "Polygon", "coordinates": [[[107.55, -6.95], [107.65, -6.95], [107.65, -6.85], [107.55, -6.85], [107.55, -6.95]]] }
    },
    {
      "type": "Feature",
      "properties": { "KABKOT": "Bandung", "KECAMATAN": "Lembang" },
      "geometry": { "type": "Polygon", "coordinates": [[[107.45, -6.85], [107.55, -6.85], [107.55, -6.75], [107.45, -6.75], [107.45, -6.85]]] }
    },
    {
      "type": "Feature",
      "properties": { "KABKOT": "Garut", "KECAMATAN": "Tarogong" },
      "geometry": { "type": "Polygon", "coordinates": [[[107.8, -7.3], [108.0, -7.3], [108.0, -7.1], [107.8, -7.1], [107.8, -7.3]]] }
    }
  ]
}"#;

    async fn state() -> web::Data<AppState> {
        let table = parse_csv(RECORDS.as_bytes(), b',').unwrap();
        let boundaries =
            BoundarySet::from_geojson_str(BOUNDARIES, &BoundaryFields::default()).unwrap();
        let dataset = Dataset::new(&table, ColumnMapping::default(), boundaries);

        let state = AppState::new(
            AppConfig::embedded_default().unwrap(),
            Arc::new(MemoryUserStore::default()),
        );
        state
            .dataset
            .get_or_try_init(|| async { Ok(Arc::new(dataset)) })
            .await
            .unwrap();
        web::Data::new(state)
    }

    fn credentials(username: &str, password: &str) -> serde_json::Value {
        serde_json::json!({ "username": username, "password": password })
    }

    /// Registers a user directly against the store and opens a session.
    async fn logged_in_token(state: &AppState) -> String {
        landslide_viewer_auth::register(state.users.as_ref(), "surveyor", "longsor123")
            .await
            .unwrap();
        state.sessions.open("surveyor").token
    }

    #[actix_web::test]
    async fn data_endpoints_require_login() {
        let app = test::init_service(App::new().app_data(state().await).configure(crate::configure))
            .await;

        for uri in ["/api/view", "/api/regions", "/api/districts?region=Bandung"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED, "{uri}");
        }

        let req = test::TestRequest::get()
            .uri("/api/view")
            .insert_header(("Authorization", "Bearer not-a-session"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn register_rejects_duplicates_and_bad_logins() {
        let app = test::init_service(App::new().app_data(state().await).configure(crate::configure))
            .await;

        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(credentials("surveyor", "longsor123"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(credentials("surveyor", "longsor123"))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["username"], "surveyor");
        assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));

        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(credentials("surveyor", "other"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CONFLICT);

        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(credentials("", "x"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(credentials("surveyor", "wrong"))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn view_filters_by_region_and_range() {
        let state = state().await;
        let token = logged_in_token(&state).await;
        let app = test::init_service(App::new().app_data(state).configure(crate::configure)).await;

        let req = test::TestRequest::get()
            .uri("/api/view")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["summary"]["totalCount"], 3);
        assert_eq!(body["summary"]["regionLabel"], "Seluruh Jawa Barat");
        assert_eq!(body["regionChoices"], serde_json::json!(["Semua", "bandung", "garut"]));
        assert_eq!(body["boundary"]["features"].as_array().unwrap().len(), 3);

        let req = test::TestRequest::get()
            .uri("/api/view?region=Bandung&elevation=750,1000")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["summary"]["totalCount"], 1);
        assert_eq!(body["summary"]["regionLabel"], "bandung");
        assert_eq!(body["summary"]["meanElevation"], 800.0);
        assert_eq!(
            body["districtChoices"],
            serde_json::json!(["Semua", "coblong", "lembang"])
        );
        let feature = &body["incidents"]["features"][0];
        assert_eq!(feature["properties"]["District"], "Coblong");
        assert!(feature["properties"].get("Latitude Decimals").is_none());
    }

    #[actix_web::test]
    async fn view_applies_range_keys_as_reported() {
        let state = state().await;
        let token = logged_in_token(&state).await;
        let app = test::init_service(App::new().app_data(state).configure(crate::configure)).await;

        let req = test::TestRequest::get()
            .uri("/api/view?slope_angle=10,30")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["summary"]["totalCount"], 2);

        let slope = body["ranges"]
            .as_array()
            .unwrap()
            .iter()
            .find(|r| r["field"] == "slope_angle")
            .unwrap();
        assert_eq!(slope["label"], "Slope Angle (°)");
        assert_eq!(slope["min"], 15);
        assert_eq!(slope["max"], 35);
        assert_eq!(slope["selectedMin"], 15);
        assert_eq!(slope["selectedMax"], 30);
        assert_eq!(slope["fullRange"], false);

        let elevation = body["ranges"]
            .as_array()
            .unwrap()
            .iter()
            .find(|r| r["field"] == "elevation")
            .unwrap();
        assert_eq!(elevation["fullRange"], true);
    }

    #[actix_web::test]
    async fn view_lists_attribute_columns_in_source_order() {
        let state = state().await;
        let token = logged_in_token(&state).await;
        let app = test::init_service(App::new().app_data(state).configure(crate::configure)).await;

        let req = test::TestRequest::get()
            .uri("/api/view")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            body["attributeColumns"],
            serde_json::json!(["Regency/City", "District", "Elevation (m)", "Slope Angle (°)"])
        );
    }

    #[actix_web::test]
    async fn districts_and_logout() {
        let state = state().await;
        let token = logged_in_token(&state).await;
        let app = test::init_service(App::new().app_data(state).configure(crate::configure)).await;
        let auth = ("Authorization", format!("Bearer {token}"));

        let req = test::TestRequest::get()
            .uri("/api/districts?region=Garut")
            .insert_header(auth.clone())
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, serde_json::json!(["Semua", "tarogong"]));

        let req = test::TestRequest::post()
            .uri("/api/auth/logout")
            .insert_header(auth.clone())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::get()
            .uri("/api/regions")
            .insert_header(auth)
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn health_reports_loaded_dataset() {
        let app = test::init_service(App::new().app_data(state().await).configure(crate::configure))
            .await;
        let req = test::TestRequest::get().uri("/api/health").to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["healthy"], true);
        assert_eq!(body["datasetLoaded"], true);
    }
}
