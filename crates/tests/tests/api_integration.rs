use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use herd_api::build_app;
use herd_desk::{DeskConfig, DEFAULT_API_KEY};
use serde_json::{json, Value};
use tower::ServiceExt;

async fn app() -> Router {
    build_app(&DeskConfig::default())
        .await
        .expect("app should build")
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-api-key", DEFAULT_API_KEY)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn put_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("PUT")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-api-key", DEFAULT_API_KEY)
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("x-api-key", DEFAULT_API_KEY)
        .body(Body::empty())
        .unwrap()
}

async fn read_json(response: axum::response::Response) -> Value {
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let response = app()
        .await
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let parsed = read_json(response).await;
    assert_eq!(parsed["store"], "memory");
}

#[tokio::test]
async fn triage_requires_api_key() {
    let request = Request::builder()
        .method("POST")
        .uri("/v1/triage")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "text": "coughing" }).to_string()))
        .unwrap();

    let response = app().await.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn triage_returns_verdict_with_record_field_names() {
    let response = app()
        .await
        .oneshot(post_json(
            "/v1/triage",
            json!({ "animal_id": "1", "text": "Fever and LOSS OF APPETITE" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = read_json(response).await;
    let verdict = &parsed["verdict"];
    assert_eq!(verdict["severity"], "Medium");
    assert_eq!(verdict["possibleConditions"][0], "Bacterial infection");
    assert_eq!(
        verdict["urgency"],
        "Schedule vet appointment within 24-48 hours"
    );
    assert!(parsed["reply_text"]
        .as_str()
        .unwrap()
        .contains("• Viral infection"));
}

#[tokio::test]
async fn blank_symptoms_are_a_bad_request() {
    let response = app()
        .await
        .oneshot(post_json("/v1/triage", json!({ "text": "  " })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(read_json(response).await["error"], "empty_report");
}

#[tokio::test]
async fn search_filters_seeded_directory_by_fee() {
    let response = app()
        .await
        .oneshot(post_json(
            "/v1/veterinarians/search",
            json!({ "maxFee": "700" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let parsed = read_json(response).await;
    let ids: Vec<_> = parsed
        .as_array()
        .unwrap()
        .iter()
        .map(|vet| vet["id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids, vec!["2", "4"]);
}

#[tokio::test]
async fn search_can_rank_by_rating() {
    let response = app()
        .await
        .oneshot(post_json(
            "/v1/veterinarians/search",
            json!({ "location": "kathmandu", "order": "rating_desc" }),
        ))
        .await
        .unwrap();

    let parsed = read_json(response).await;
    assert_eq!(parsed[0]["name"], "Dr. Ram Bahadur Thapa");
    assert_eq!(parsed.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn booking_flow_confirms_and_lists() {
    let app = app().await;

    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/bookings",
            json!({
                "veterinarianId": "2",
                "animalId": "bhola",
                "date": "2024-03-20",
                "timeSlot": "11:00 AM"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let booking = read_json(response).await;
    assert_eq!(booking["status"], "confirmed");
    assert_eq!(booking["fee"], 600);

    let response = app
        .oneshot(get("/v1/bookings?veterinarian_id=2"))
        .await
        .unwrap();
    let listed = read_json(response).await;
    assert_eq!(listed[0]["id"], booking["id"]);
}

#[tokio::test]
async fn booking_without_veterinarian_is_unprocessable() {
    let response = app()
        .await
        .oneshot(post_json(
            "/v1/bookings",
            json!({
                "veterinarianId": "",
                "date": "2024-03-20",
                "timeSlot": "09:00 AM"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(read_json(response).await["error"], "missing_veterinarian");
}

#[tokio::test]
async fn unknown_veterinarian_is_not_found() {
    let response = app()
        .await
        .oneshot(post_json(
            "/v1/bookings",
            json!({
                "veterinarianId": "42",
                "date": "2024-03-20",
                "timeSlot": "09:00 AM"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn booking_dates_cover_the_next_week() {
    let response = app().await.oneshot(get("/v1/bookings/dates")).await.unwrap();
    let dates = read_json(response).await;
    let dates = dates.as_array().unwrap();

    assert_eq!(dates.len(), 7);
    let today = chrono::Local::now().date_naive().format("%Y-%m-%d").to_string();
    assert!(dates
        .iter()
        .all(|date| date.as_str().unwrap() > today.as_str()));
}

#[tokio::test]
async fn animals_are_registered_per_owner() {
    let app = app().await;
    let owner = json!({ "id": "farmer-7", "name": "John Farmer", "role": "farmer" });

    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/animals",
            json!({
                "owner": owner,
                "animal": { "name": "Gauri", "species": "Cow", "age": "3 years" }
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(read_json(response).await["healthStatus"], "healthy");

    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/animals",
            json!({ "owner": owner, "animal": { "name": " ", "species": "Goat" } }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(get("/v1/animals?owner_id=farmer-7"))
        .await
        .unwrap();
    let animals = read_json(response).await;
    assert_eq!(animals.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn animal_profile_shows_history() {
    let app = app().await;
    let owner = json!({ "id": "farmer-9", "name": "Maya", "role": "farmer" });

    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/animals",
            json!({ "owner": owner, "animal": { "name": "Bhola", "species": "Goat" } }),
        ))
        .await
        .unwrap();
    let animal_id = read_json(response).await["id"].as_str().unwrap().to_string();

    app.clone()
        .oneshot(post_json(
            "/v1/triage",
            json!({ "animal_id": animal_id, "text": "coughing" }),
        ))
        .await
        .unwrap();
    app.clone()
        .oneshot(post_json(
            "/v1/bookings",
            json!({
                "veterinarianId": "1",
                "animalId": animal_id,
                "date": "2024-03-20",
                "timeSlot": "09:00 AM"
            }),
        ))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(get(&format!("/v1/animals/{animal_id}")))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let profile = read_json(response).await;
    assert_eq!(profile["animal"]["name"], "Bhola");
    assert_eq!(profile["bookings"].as_array().unwrap().len(), 1);
    assert_eq!(profile["consultations"][0]["verdict"]["severity"], "High");

    let response = app.oneshot(get("/v1/animals/nobody")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(read_json(response).await["error"], "unknown_animal");
}

#[tokio::test]
async fn veterinarian_profile_can_be_edited() {
    let app = app().await;

    let response = app
        .clone()
        .oneshot(get("/v1/veterinarians/3"))
        .await
        .unwrap();
    let mut vet = read_json(response).await;
    vet["appointmentFee"] = json!(550);
    vet["availableSlots"] = json!(["10:30 AM"]);

    let response = app
        .clone()
        .oneshot(put_json("/v1/veterinarians/3", vet))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(post_json(
            "/v1/bookings",
            json!({
                "veterinarianId": "3",
                "date": "2024-03-20",
                "timeSlot": "10:30 AM"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(read_json(response).await["fee"], 550);

    let response = app
        .oneshot(put_json(
            "/v1/veterinarians/99",
            json!({
                "id": "99",
                "name": "Dr. Nobody",
                "specialization": "Equine",
                "experience": "1 year",
                "rating": 4.0,
                "appointmentFee": 100,
                "location": "Pokhara",
                "clinicAddress": "Lakeside",
                "availableSlots": []
            }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
