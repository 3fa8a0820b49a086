#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::Value as JsonValue;
use styliste_backend::{
    app::create_router,
    app_state::AppState,
    clock::FixedClock,
    config::Config,
    db::{MemoryStore, Repositories, User, UserRole},
    middleware::USER_ID_HEADER,
    notifications::{ChannelMailer, OutgoingEmail},
};
use time::macros::{date, datetime};
use time::Date;
use tokio::sync::mpsc::UnboundedReceiver;
use tower::ServiceExt;
use uuid::Uuid;

pub const TODAY: Date = date!(2024 - 06 - 01);

pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
    pub outbox: UnboundedReceiver<OutgoingEmail>,
    pub admin: User,
    pub customer: User,
}

pub fn user(name: &str, email: &str, role: UserRole) -> User {
    User {
        id: Uuid::now_v7(),
        name: name.to_string(),
        email: email.to_string(),
        phone: Some("555-0101".to_string()),
        role,
        created_at: datetime!(2024-01-01 00:00 UTC),
    }
}

pub fn create_test_app() -> TestApp {
    let store = MemoryStore::new();
    let admin = user("Salon Admin", "admin@example.com", UserRole::Admin);
    let customer = user("Maya Rao", "maya@example.com", UserRole::Customer);
    store.insert_user(admin.clone()).unwrap();
    store.insert_user(customer.clone()).unwrap();

    let (mailer, outbox) = ChannelMailer::new();
    let state = AppState::new(
        Config::default(),
        Repositories::memory(store.clone()),
        Arc::new(mailer),
        Arc::new(FixedClock(TODAY)),
    );

    TestApp {
        router: create_router(state),
        store,
        outbox,
        admin,
        customer,
    }
}

impl TestApp {
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        caller: Option<&User>,
        body: Option<JsonValue>,
    ) -> (StatusCode, JsonValue) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = caller {
            builder = builder.header(USER_ID_HEADER, user.id.to_string());
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            JsonValue::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(JsonValue::Null)
        };
        (status, json)
    }

    pub async fn next_email(&mut self) -> OutgoingEmail {
        self.outbox.recv().await.expect("email delivered")
    }
}
