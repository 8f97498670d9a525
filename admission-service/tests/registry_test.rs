mod common;

use common::TestApp;
use institute_core::auth::Role;
use reqwest::Client;
use serde_json::json;

#[tokio::test]
async fn branch_writes_are_admin_only() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let payload = json!({
        "name": "Pune Main",
        "code": "PUNE-01",
        "address": "12 MG Road, Pune",
        "contact": "9876500000"
    });

    let staff = app.token("staff-1", Role::Staff, None);
    let response = client
        .post(format!("{}/api/branches", app.address))
        .bearer_auth(&staff)
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let admin = app.token("admin-1", Role::Admin, None);
    let response = client
        .post(format!("{}/api/branches", app.address))
        .bearer_auth(&admin)
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["branch"]["code"], "PUNE-01");
    assert_eq!(body["branch"]["is_active"], true);

    // Duplicate codes collide with the unique index.
    let response = client
        .post(format!("{}/api/branches", app.address))
        .bearer_auth(&admin)
        .json(&payload)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    app.cleanup().await;
}

#[tokio::test]
async fn branch_delete_is_a_soft_delete() {
    let app = TestApp::spawn().await;
    let admin = app.token("admin-1", Role::Admin, None);
    let client = Client::new();

    let branch = app.seed_branch("Pune Main").await;

    let response = client
        .delete(format!("{}/api/branches/{}", app.address, branch.id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    // Still addressable, just inactive.
    let response = client
        .get(format!("{}/api/branches/{}", app.address, branch.id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["is_active"], false);

    app.cleanup().await;
}

#[tokio::test]
async fn branch_admin_course_creation_is_pinned_to_own_branch() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let own = app.seed_branch("Pune Main").await;
    let other = app.seed_branch("Mumbai Central").await;

    let branch_admin = app.token("ba-1", Role::BranchAdmin, Some(&own.id));
    let response = client
        .post(format!("{}/api/courses", app.address))
        .bearer_auth(&branch_admin)
        .json(&json!({
            "title": "Rust Programming",
            "code": "RUST-101",
            "category": "PROGRAMMING",
            "duration_months": 12,
            "fees": 15000.0,
            "branch_ids": [other.id]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    let body: serde_json::Value = response.json().await.unwrap();
    let branch_ids = body["course"]["branch_ids"].as_array().unwrap();
    assert_eq!(branch_ids.len(), 1);
    assert_eq!(branch_ids[0], own.id.as_str());

    app.cleanup().await;
}

#[tokio::test]
async fn branch_admin_cannot_manage_courses_outside_their_branch() {
    let app = TestApp::spawn().await;
    let client = Client::new();

    let own = app.seed_branch("Pune Main").await;
    let other = app.seed_branch("Mumbai Central").await;
    let course = app.seed_course("Rust Programming", 15000.0, &other.id).await;

    let branch_admin = app.token("ba-1", Role::BranchAdmin, Some(&own.id));
    let response = client
        .put(format!("{}/api/courses/{}", app.address, course.id))
        .bearer_auth(&branch_admin)
        .json(&json!({ "fees": 1.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let response = client
        .delete(format!("{}/api/courses/{}", app.address, course.id))
        .bearer_auth(&branch_admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    app.cleanup().await;
}

#[tokio::test]
async fn course_listing_filters_by_branch() {
    let app = TestApp::spawn().await;
    let admin = app.token("admin-1", Role::Admin, None);
    let client = Client::new();

    let branch_a = app.seed_branch("Pune Main").await;
    let branch_b = app.seed_branch("Mumbai Central").await;
    app.seed_course("Rust Programming", 15000.0, &branch_a.id)
        .await;
    app.seed_course("Graphic Design", 9000.0, &branch_b.id).await;

    let response = client
        .get(format!(
            "{}/api/courses?branch_id={}",
            app.address, branch_a.id
        ))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    let courses = body["courses"].as_array().unwrap();
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0]["title"], "Rust Programming");

    app.cleanup().await;
}

#[tokio::test]
async fn course_update_applies_partial_changes() {
    let app = TestApp::spawn().await;
    let admin = app.token("admin-1", Role::Admin, None);
    let client = Client::new();

    let branch = app.seed_branch("Pune Main").await;
    let course = app.seed_course("Rust Programming", 15000.0, &branch.id).await;

    let response = client
        .put(format!("{}/api/courses/{}", app.address, course.id))
        .bearer_auth(&admin)
        .json(&json!({ "fees": 18000.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["course"]["fees"], 18000.0);
    assert_eq!(body["course"]["title"], "Rust Programming");

    app.cleanup().await;
}
