use super::{parse_param, ApiError};
use crate::clients::CustomerClient;
use crate::model::{Customer, CustomerBatch, CustomerCreate, CustomerId, CustomerUpdate};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, put};
use axum::{Json, Router};
use shop_kernel::RecordClient;
use tower_http::trace::TraceLayer;

pub fn router(customers: CustomerClient) -> Router {
    Router::new()
        .route("/customers/", get(list_customers).put(register_customer))
        .route("/customers/batchadd/", put(register_batch))
        .route(
            "/customers/:id",
            get(get_customer).put(update_customer).delete(remove_customer),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(customers)
}

async fn list_customers(
    State(customers): State<CustomerClient>,
) -> Result<Json<Vec<Customer>>, ApiError> {
    let mut all = customers.list().await?;
    all.sort_by_key(|c| c.customer_id);
    Ok(Json(all))
}

async fn register_customer(
    State(customers): State<CustomerClient>,
    body: Result<Json<CustomerCreate>, JsonRejection>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    let Json(create) = body?;
    let customer = customers.register(create).await?;
    Ok((StatusCode::ACCEPTED, Json(customer)))
}

async fn register_batch(
    State(customers): State<CustomerClient>,
    body: Result<Json<CustomerBatch>, JsonRejection>,
) -> Result<(StatusCode, Json<Vec<Customer>>), ApiError> {
    let Json(batch) = body?;
    let registered = customers.register_batch(batch.customers).await?;
    Ok((StatusCode::ACCEPTED, Json(registered)))
}

async fn get_customer(
    State(customers): State<CustomerClient>,
    Path(id): Path<String>,
) -> Result<Json<Customer>, ApiError> {
    let id: CustomerId = parse_param("customer id", Some(&id))?;
    Ok(Json(customers.require(id).await?))
}

async fn update_customer(
    State(customers): State<CustomerClient>,
    Path(id): Path<String>,
    body: Result<Json<CustomerUpdate>, JsonRejection>,
) -> Result<Json<Customer>, ApiError> {
    let id: CustomerId = parse_param("customer id", Some(&id))?;
    let Json(changes) = body?;
    Ok(Json(customers.update(id, changes).await?))
}

async fn remove_customer(
    State(customers): State<CustomerClient>,
    Path(id): Path<String>,
) -> Result<Json<Customer>, ApiError> {
    let id: CustomerId = parse_param("customer id", Some(&id))?;
    Ok(Json(customers.remove(id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    fn app() -> Router {
        let (store, customers) = crate::customer_actor::new();
        tokio::spawn(store.run(()));
        router(customers)
    }

    async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn customer_lifecycle() {
        let app = app();
        let (status, created) = call(
            &app,
            Method::PUT,
            "/customers/",
            Some(json!({"fullName": "Ada Lovelace", "phoneNumber": "+44 (20) 555-1234"})),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        let id = created["customerId"].as_str().unwrap().to_string();

        let (status, fetched) = call(&app, Method::GET, &format!("/customers/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["fullName"], "Ada Lovelace");

        let (status, updated) = call(
            &app,
            Method::PUT,
            &format!("/customers/{id}"),
            Some(json!({"fullName": "Augusta Ada King"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(updated["fullName"], "Augusta Ada King");

        let (status, listed) = call(&app, Method::GET, "/customers/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(listed.as_array().map(Vec::len), Some(1));

        let (status, _) = call(&app, Method::DELETE, &format!("/customers/{id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, body) = call(&app, Method::GET, &format!("/customers/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn batch_registration_skips_invalid_entries() {
        let app = app();
        let (status, registered) = call(
            &app,
            Method::PUT,
            "/customers/batchadd/",
            Some(json!({"customers": [
                {"fullName": "Grace Hopper", "phoneNumber": "+1-(0)70-555 12 34"},
                {"fullName": "Cher", "phoneNumber": "555"},
                {"fullName": "Alan Turing", "phoneNumber": "+44-20-555"}
            ]})),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        let names: Vec<&str> = registered
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["fullName"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Grace Hopper", "Alan Turing"]);

        let (_, listed) = call(&app, Method::GET, "/customers/", None).await;
        assert_eq!(listed.as_array().map(Vec::len), Some(2));

        let (status, _) = call(
            &app,
            Method::PUT,
            "/customers/batchadd/",
            Some(json!({"people": []})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn invalid_customers_are_rejected() {
        let app = app();
        let (status, body) = call(
            &app,
            Method::PUT,
            "/customers/",
            Some(json!({"fullName": "Cher", "phoneNumber": "555"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());

        let (status, _) = call(&app, Method::GET, "/customers/abc", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&app, Method::PUT, "/customers/", Some(json!([1, 2]))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
