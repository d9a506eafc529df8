//! API integration tests against a running server
//!
//! Start the server with `LOCALLIBRARY_AUTH__BOOTSTRAP_ADMIN_PASSWORD` set,
//! then run with: cargo test -- --ignored

use chrono::{Duration, Utc};
use reqwest::{redirect::Policy, Client, StatusCode};
use serde_json::{json, Value};
use uuid::Uuid;

const BASE_URL: &str = "http://localhost:8080";

fn admin_password() -> String {
    std::env::var("LOCALLIBRARY_AUTH__BOOTSTRAP_ADMIN_PASSWORD")
        .unwrap_or_else(|_| "admin-password".to_string())
}

fn client() -> Client {
    Client::builder()
        .redirect(Policy::none())
        .build()
        .expect("Failed to build client")
}

/// Helper to get a token for the given account
async fn get_auth_token(client: &Client, username: &str, password: &str) -> String {
    let response = client
        .post(format!("{}/accounts/login/", BASE_URL))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("Failed to send login request");

    let body: Value = response.json().await.expect("Failed to parse login response");
    body["token"].as_str().expect("No token in response").to_string()
}

async fn admin_token(client: &Client) -> String {
    get_auth_token(client, "admin", &admin_password()).await
}

fn unique(prefix: &str) -> String {
    format!("{}{}", prefix, &Uuid::new_v4().simple().to_string()[..10])
}

/// Create an account holding `permissions` and return its token
async fn user_with(client: &Client, admin: &str, permissions: &[&str]) -> String {
    let username = unique("user");
    let password = "2HJ1vRV0Z&3iD";
    let response = client
        .post(format!("{}/accounts/users/", BASE_URL))
        .bearer_auth(admin)
        .json(&json!({
            "username": username,
            "password": password,
            "permissions": permissions,
        }))
        .send()
        .await
        .expect("Failed to create user");
    assert_eq!(response.status(), StatusCode::CREATED);

    get_auth_token(client, &username, password).await
}

/// Create a book with one copy and return the copy id
async fn create_copy(client: &Client, admin: &str) -> String {
    let author: Value = client
        .post(format!("{}/catalog/author/create/", BASE_URL))
        .bearer_auth(admin)
        .json(&json!({ "first_name": "John", "last_name": "Smith" }))
        .send()
        .await
        .expect("Failed to create author")
        .json()
        .await
        .expect("Failed to parse author");

    let genre: Value = client
        .post(format!("{}/catalog/genre/create/", BASE_URL))
        .bearer_auth(admin)
        .json(&json!({ "name": unique("Fantasy") }))
        .send()
        .await
        .expect("Failed to create genre")
        .json()
        .await
        .expect("Failed to parse genre");

    let book: Value = client
        .post(format!("{}/catalog/book/create/", BASE_URL))
        .bearer_auth(admin)
        .json(&json!({
            "title": "Book Title",
            "summary": "My book summary",
            "isbn": &unique("")[..10],
            "author_id": author["id"],
            "genre_ids": [genre["id"]],
        }))
        .send()
        .await
        .expect("Failed to create book")
        .json()
        .await
        .expect("Failed to parse book");

    let copy: Value = client
        .post(format!("{}/catalog/bookinstance/create/", BASE_URL))
        .bearer_auth(admin)
        .json(&json!({ "book_id": book["id"], "imprint": "Unlikely Imprint, 2016" }))
        .send()
        .await
        .expect("Failed to create copy")
        .json()
        .await
        .expect("Failed to parse copy");

    copy["id"].as_str().expect("No copy id").to_string()
}

#[tokio::test]
#[ignore] // Run with: cargo test -- --ignored
async fn test_health_check() {
    let response = client()
        .get(format!("{}/health", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
#[ignore]
async fn test_login() {
    let response = client()
        .post(format!("{}/accounts/login/", BASE_URL))
        .json(&json!({ "username": "admin", "password": admin_password() }))
        .send()
        .await
        .expect("Failed to send request");

    assert!(response.status().is_success());
    assert!(response.headers().get("set-cookie").is_some());

    let body: Value = response.json().await.expect("Failed to parse response");
    assert!(body["token"].is_string());
    assert_eq!(body["token_type"], "Bearer");
}

#[tokio::test]
#[ignore]
async fn test_login_invalid_credentials() {
    let response = client()
        .post(format!("{}/accounts/login/", BASE_URL))
        .json(&json!({ "username": "admin", "password": "wrong" }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore]
async fn test_login_redirects_to_next() {
    let response = client()
        .post(format!("{}/accounts/login/", BASE_URL))
        .json(&json!({
            "username": "admin",
            "password": admin_password(),
            "next": "/catalog/mybooks/",
        }))
        .send()
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(response.headers()["location"], "/catalog/mybooks/");
}

#[tokio::test]
#[ignore]
async fn test_renewal_flow() {
    let client = client();
    let admin = admin_token(&client).await;
    let librarian = user_with(&client, &admin, &["catalog.can_mark_returned"]).await;
    let copy_id = create_copy(&client, &admin).await;
    let renew_url = format!("{}/catalog/book/{}/renew/", BASE_URL, copy_id);
    let today = Utc::now().date_naive();

    // Blank form proposes three weeks ahead
    let form: Value = client
        .get(&renew_url)
        .bearer_auth(&librarian)
        .send()
        .await
        .expect("Failed to get form")
        .json()
        .await
        .expect("Failed to parse form");
    assert_eq!(
        form["form"]["initial"],
        (today + Duration::days(21)).format("%Y-%m-%d").to_string()
    );

    // Past dates are refused and nothing is saved
    let response = client
        .post(&renew_url)
        .bearer_auth(&librarian)
        .json(&json!({ "renewal_date": (today - Duration::days(1)).format("%Y-%m-%d").to_string() }))
        .send()
        .await
        .expect("Failed to post renewal");
    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["form"]["errors"][0], "Invalid date - renewal in past");
    assert_eq!(body["book_instance"]["due_back"], Value::Null);

    // Beyond four weeks is refused
    let response = client
        .post(&renew_url)
        .bearer_auth(&librarian)
        .json(&json!({ "renewal_date": (today + Duration::days(29)).format("%Y-%m-%d").to_string() }))
        .send()
        .await
        .expect("Failed to post renewal");
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(
        body["form"]["errors"][0],
        "Invalid date - renewal more than 4 weeks ahead"
    );

    // Today is accepted
    let response = client
        .post(&renew_url)
        .bearer_auth(&librarian)
        .form(&[("renewal_date", today.format("%Y-%m-%d").to_string())])
        .send()
        .await
        .expect("Failed to post renewal");
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()["location"], "/catalog/borrowed/");

    let copy: Value = client
        .get(format!("{}/catalog/bookinstance/{}", BASE_URL, copy_id))
        .send()
        .await
        .expect("Failed to get copy")
        .json()
        .await
        .expect("Failed to parse copy");
    assert_eq!(copy["due_back"], today.format("%Y-%m-%d").to_string());
    assert_eq!(copy["status"], "d");
}

#[tokio::test]
#[ignore]
async fn test_renewal_requires_permission() {
    let client = client();
    let admin = admin_token(&client).await;
    let reader = user_with(&client, &admin, &[]).await;
    let copy_id = create_copy(&client, &admin).await;

    let response = client
        .get(format!("{}/catalog/book/{}/renew/", BASE_URL, copy_id))
        .bearer_auth(&reader)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = client
        .get(format!("{}/catalog/book/{}/renew/", BASE_URL, Uuid::new_v4()))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore]
async fn test_genre_names_unique_ignoring_case() {
    let client = client();
    let admin = admin_token(&client).await;
    let name = unique("Genre");

    let response = client
        .post(format!("{}/catalog/genre/create/", BASE_URL))
        .bearer_auth(&admin)
        .json(&json!({ "name": name }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CREATED);
    assert!(response.headers()["location"]
        .to_str()
        .unwrap()
        .starts_with("/catalog/genre/"));

    let response = client
        .post(format!("{}/catalog/genre/create/", BASE_URL))
        .bearer_auth(&admin)
        .json(&json!({ "name": name.to_uppercase() }))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["message"], "Genre already exists (case insensitive match)");
}

#[tokio::test]
#[ignore]
async fn test_author_with_books_cannot_be_deleted() {
    let client = client();
    let admin = admin_token(&client).await;
    let copy_id = create_copy(&client, &admin).await;

    let copy: Value = client
        .get(format!("{}/catalog/bookinstance/{}", BASE_URL, copy_id))
        .send()
        .await
        .expect("Failed to get copy")
        .json()
        .await
        .expect("Failed to parse copy");
    let book: Value = client
        .get(format!("{}/catalog/book/{}", BASE_URL, copy["book_id"]))
        .send()
        .await
        .expect("Failed to get book")
        .json()
        .await
        .expect("Failed to parse book");

    let response = client
        .post(format!("{}/catalog/author/{}/delete/", BASE_URL, book["author_id"]))
        .bearer_auth(&admin)
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body: Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["error"], "ProtectedObject");
}

#[tokio::test]
#[ignore]
async fn test_index_counts_development_genres() {
    let client = client();
    let admin = admin_token(&client).await;
    let index_url = format!("{}/catalog/", BASE_URL);

    let before: Value = client
        .get(&index_url)
        .send()
        .await
        .expect("Failed to get index")
        .json()
        .await
        .expect("Failed to parse index");

    let genre: Value = client
        .post(format!("{}/catalog/genre/create/", BASE_URL))
        .bearer_auth(&admin)
        .json(&json!({ "name": unique("Web Development ") }))
        .send()
        .await
        .expect("Failed to create genre")
        .json()
        .await
        .expect("Failed to parse genre");
    let book: Value = client
        .post(format!("{}/catalog/book/create/", BASE_URL))
        .bearer_auth(&admin)
        .json(&json!({
            "title": "Rust in Action",
            "summary": "Systems programming",
            "isbn": &unique("")[..10],
            "genre_ids": [genre["id"]],
        }))
        .send()
        .await
        .expect("Failed to create book")
        .json()
        .await
        .expect("Failed to parse book");
    client
        .post(format!("{}/catalog/bookinstance/create/", BASE_URL))
        .bearer_auth(&admin)
        .json(&json!({ "book_id": book["id"], "imprint": "Manning, 2021" }))
        .send()
        .await
        .expect("Failed to create copy");

    let after: Value = client
        .get(&index_url)
        .send()
        .await
        .expect("Failed to get index")
        .json()
        .await
        .expect("Failed to parse index");
    assert_eq!(after["books"].as_i64(), before["books"].as_i64().map(|n| n + 1));
    assert_eq!(
        after["instances_available"].as_i64(),
        before["instances_available"].as_i64().map(|n| n + 1)
    );
}

#[tokio::test]
#[ignore]
async fn test_invalid_page_is_not_found() {
    let response = client()
        .get(format!("{}/catalog/books/?page=9999", BASE_URL))
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
