//! Integration tests for the reservation lifecycle over the HTTP API.

mod helpers;

use http::StatusCode;

#[tokio::test]
async fn test_reserve_exhaust_return_cycle() {
    let app = helpers::TestApp::new();
    let first = app.signup("first", "patron").await;
    let second = app.signup("second", "patron").await;
    let book_id = app.seed_book("The Dispossessed", "978-0061054884", 1).await;

    // First patron claims the only copy.
    let response = app
        .request(
            "POST",
            &format!("/api/books/{book_id}/reserve"),
            None,
            Some(&first),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["data"]["status"], "active");
    assert_eq!(app.available_copies(book_id).await, 0);

    // Second patron is turned away.
    let response = app
        .request(
            "POST",
            &format!("/api/books/{book_id}/reserve"),
            None,
            Some(&second),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["error"], "NO_COPIES_AVAILABLE");

    // Return frees the copy for the second patron.
    let response = app
        .request(
            "PUT",
            &format!("/api/books/{book_id}/return"),
            Some(serde_json::json!({})),
            Some(&first),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["status"], "returned");
    assert!(response.body["data"]["returned_at"].is_string());
    assert_eq!(app.available_copies(book_id).await, 1);

    let response = app
        .request(
            "POST",
            &format!("/api/books/{book_id}/reserve"),
            None,
            Some(&second),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_duplicate_reservation_rejected() {
    let app = helpers::TestApp::new();
    let patron = app.signup("pat", "patron").await;
    let book_id = app.seed_book("The Dispossessed", "978-0061054884", 3).await;

    app.request(
        "POST",
        &format!("/api/books/{book_id}/reserve"),
        None,
        Some(&patron),
    )
    .await;

    let response = app
        .request(
            "POST",
            &format!("/api/books/{book_id}/reserve"),
            None,
            Some(&patron),
        )
        .await;
    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.body["error"], "DUPLICATE_RESERVATION");
    assert_eq!(app.available_copies(book_id).await, 2);
}

#[tokio::test]
async fn test_double_return_is_not_found() {
    let app = helpers::TestApp::new();
    let patron = app.signup("pat", "patron").await;
    let book_id = app.seed_book("The Dispossessed", "978-0061054884", 1).await;

    app.request(
        "POST",
        &format!("/api/books/{book_id}/reserve"),
        None,
        Some(&patron),
    )
    .await;
    app.request(
        "PUT",
        &format!("/api/books/{book_id}/return"),
        Some(serde_json::json!({})),
        Some(&patron),
    )
    .await;

    let response = app
        .request(
            "PUT",
            &format!("/api/books/{book_id}/return"),
            Some(serde_json::json!({})),
            Some(&patron),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(app.available_copies(book_id).await, 1);
}

#[tokio::test]
async fn test_reserve_requires_authentication() {
    let app = helpers::TestApp::new();
    let book_id = app.seed_book("The Dispossessed", "978-0061054884", 1).await;

    let response = app
        .request("POST", &format!("/api/books/{book_id}/reserve"), None, None)
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_reservation_listing_visibility() {
    let app = helpers::TestApp::new();
    let patron = app.signup("pat", "patron").await;
    let librarian = app.signup("lib", "librarian").await;
    let book_id = app.seed_book("The Dispossessed", "978-0061054884", 2).await;

    app.request(
        "POST",
        &format!("/api/books/{book_id}/reserve"),
        None,
        Some(&patron),
    )
    .await;

    // Patrons see their own reservations.
    let response = app
        .request("GET", "/api/reservations/mine", None, Some(&patron))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"].as_array().unwrap().len(), 1);

    // The global listing is librarian territory.
    let response = app
        .request("GET", "/api/reservations", None, Some(&patron))
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app
        .request("GET", "/api/reservations", None, Some(&librarian))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"].as_array().unwrap().len(), 1);

    let response = app
        .request(
            "GET",
            &format!("/api/reservations?book_id={book_id}&status=active"),
            None,
            Some(&librarian),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_librarian_override_credits_copy() {
    let app = helpers::TestApp::new();
    let patron = app.signup("pat", "patron").await;
    let librarian = app.signup("lib", "librarian").await;
    let book_id = app.seed_book("The Dispossessed", "978-0061054884", 1).await;

    let response = app
        .request(
            "POST",
            &format!("/api/books/{book_id}/reserve"),
            None,
            Some(&patron),
        )
        .await;
    let reservation_id = response.body["data"]["id"].as_str().unwrap().to_string();

    // Patron may not touch the override endpoint.
    let response = app
        .request(
            "PUT",
            &format!("/api/reservations/{reservation_id}/status"),
            Some(serde_json::json!({ "status": "overdue" })),
            Some(&patron),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    // Marking it overdue settles the loan and frees the copy.
    let response = app
        .request(
            "PUT",
            &format!("/api/reservations/{reservation_id}/status"),
            Some(serde_json::json!({ "status": "overdue" })),
            Some(&librarian),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["copy_credited"], true);
    assert_eq!(response.body["data"]["previous_status"], "active");
    assert_eq!(app.available_copies(book_id).await, 1);

    // Reactivating does not claim the copy back.
    let response = app
        .request(
            "PUT",
            &format!("/api/reservations/{reservation_id}/status"),
            Some(serde_json::json!({ "status": "active" })),
            Some(&librarian),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["copy_credited"], false);
    assert_eq!(app.available_copies(book_id).await, 1);
}

#[tokio::test]
async fn test_admin_returns_on_behalf() {
    let app = helpers::TestApp::new();
    let patron_id = app.register_user("pat", "correct-horse", "patron").await;
    let patron = app.login("pat", "correct-horse").await;
    let admin = app.signup("root", "admin").await;
    let book_id = app.seed_book("The Dispossessed", "978-0061054884", 1).await;

    app.request(
        "POST",
        &format!("/api/books/{book_id}/reserve"),
        None,
        Some(&patron),
    )
    .await;

    let response = app
        .request(
            "PUT",
            &format!("/api/books/{book_id}/return"),
            Some(serde_json::json!({ "user_id": patron_id })),
            Some(&admin),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(app.available_copies(book_id).await, 1);
}
