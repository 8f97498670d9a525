mod common;

use common::TestApp;
use institute_core::auth::Role;
use reqwest::Client;
use serde_json::json;

#[tokio::test]
async fn create_admission_returns_receipt_and_pending_ledger() {
    let app = TestApp::spawn().await;
    let staff = app.token("staff-1", Role::Staff, None);

    let (admission, _, _) = app
        .seed_admission(&staff, "student-1", 15000.0, "ONE_TIME")
        .await;

    let receipt = admission["receipt_number"].as_str().unwrap();
    assert!(receipt.starts_with("ADM-"), "unexpected receipt {receipt}");
    assert_eq!(admission["status"], "ACTIVE");
    assert_eq!(admission["created_by"], "staff-1");
    assert_eq!(admission["payment_details"]["total_fees"], 15000.0);
    assert_eq!(admission["payment_details"]["paid_amount"], 0.0);
    assert_eq!(admission["payment_details"]["pending_amount"], 15000.0);
    assert_eq!(admission["payment_details"]["payment_status"], "PENDING");
    // Fees and duration come from the catalog, not the request.
    assert_eq!(admission["course_details"]["course_fees"], 15000.0);
    assert_eq!(admission["course_details"]["course_duration_months"], 12);
    // Single-record responses expand references into display names.
    assert_eq!(admission["student_name"], "Asha Verma");
    assert_eq!(admission["course_title"], "Rust Programming");
    assert_eq!(admission["branch_name"], "Pune Main");
    // staff-1 has no user record, so the creator name is omitted.
    assert!(admission["created_by_name"].is_null());

    app.cleanup().await;
}

#[tokio::test]
async fn admission_receipts_are_unique() {
    let app = TestApp::spawn().await;
    let staff = app.token("staff-1", Role::Staff, None);

    let branch = app.seed_branch("Pune Main").await;
    let course = app.seed_course("Rust Programming", 10000.0, &branch.id).await;

    let mut receipts = Vec::new();
    for i in 0..5 {
        let student_id = format!("student-{}", i);
        app.seed_user(&student_id, "Asha Verma").await;
        let response = app
            .post_admission(&staff, &student_id, &course.id, &branch.id, "ONE_TIME")
            .await;
        assert_eq!(response.status().as_u16(), 201);
        let body: serde_json::Value = response.json().await.unwrap();
        receipts.push(
            body["admission"]["receipt_number"]
                .as_str()
                .unwrap()
                .to_string(),
        );
    }

    // The per-year counter hands out a strictly increasing sequence, so
    // receipts never repeat.
    let sequences: Vec<u32> = receipts
        .iter()
        .map(|r| r.rsplit('-').next().unwrap().parse().unwrap())
        .collect();
    for pair in sequences.windows(2) {
        assert!(pair[0] < pair[1], "sequence not increasing: {receipts:?}");
    }

    app.cleanup().await;
}

#[tokio::test]
async fn create_admission_with_unknown_student_is_not_found() {
    let app = TestApp::spawn().await;
    let staff = app.token("staff-1", Role::Staff, None);

    let branch = app.seed_branch("Pune Main").await;
    let course = app.seed_course("Rust Programming", 15000.0, &branch.id).await;

    let response = app
        .post_admission(&staff, "no-such-student", &course.id, &branch.id, "ONE_TIME")
        .await;
    assert_eq!(response.status().as_u16(), 404);

    app.cleanup().await;
}

#[tokio::test]
async fn students_cannot_create_admissions() {
    let app = TestApp::spawn().await;
    let student = app.token("student-1", Role::Student, None);

    let branch = app.seed_branch("Pune Main").await;
    let course = app.seed_course("Rust Programming", 15000.0, &branch.id).await;
    app.seed_user("student-1", "Asha Verma").await;

    let response = app
        .post_admission(&student, "student-1", &course.id, &branch.id, "ONE_TIME")
        .await;
    assert_eq!(response.status().as_u16(), 403);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["current"], "STUDENT");

    app.cleanup().await;
}

#[tokio::test]
async fn invalid_mobile_is_rejected() {
    let app = TestApp::spawn().await;
    let staff = app.token("staff-1", Role::Staff, None);

    app.seed_user("student-1", "Asha Verma").await;
    let branch = app.seed_branch("Pune Main").await;
    let course = app.seed_course("Rust Programming", 15000.0, &branch.id).await;

    let data = json!({
        "student_id": "student-1",
        "personal_details": {
            "name": "Asha Verma",
            "mobile": "12345",
            "gender": "FEMALE"
        },
        "address": {
            "line1": "12 MG Road",
            "city": "Pune",
            "district": "Pune",
            "pincode": "411001",
            "state": "Maharashtra"
        },
        "course_details": { "course_id": course.id, "branch_id": branch.id },
        "payment_details": { "payment_type": "ONE_TIME" }
    });
    let form = reqwest::multipart::Form::new().text("data", data.to_string());
    let response = Client::new()
        .post(format!("{}/api/admissions", app.address))
        .bearer_auth(&staff)
        .multipart(form)
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 422);

    app.cleanup().await;
}

#[tokio::test]
async fn branch_admin_sees_only_own_branch() {
    let app = TestApp::spawn().await;
    let staff = app.token("staff-1", Role::Staff, None);

    let (first, branch_a, _) = app
        .seed_admission(&staff, "student-1", 10000.0, "ONE_TIME")
        .await;
    let (second, _branch_b, _) = app
        .seed_admission(&staff, "student-2", 10000.0, "ONE_TIME")
        .await;

    let branch_admin = app.token("ba-1", Role::BranchAdmin, Some(&branch_a));
    let client = Client::new();

    let response = client
        .get(format!("{}/api/admissions", app.address))
        .bearer_auth(&branch_admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);
    let body: serde_json::Value = response.json().await.unwrap();
    let admissions = body["admissions"].as_array().unwrap();
    assert_eq!(admissions.len(), 1);
    assert_eq!(admissions[0]["id"], first["id"]);

    // Out-of-branch records read as missing, not forbidden.
    let response = client
        .get(format!(
            "{}/api/admissions/{}",
            app.address,
            second["id"].as_str().unwrap()
        ))
        .bearer_auth(&branch_admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    app.cleanup().await;
}

#[tokio::test]
async fn student_sees_only_own_admissions() {
    let app = TestApp::spawn().await;
    let staff = app.token("staff-1", Role::Staff, None);

    let (own, _, _) = app
        .seed_admission(&staff, "student-1", 10000.0, "ONE_TIME")
        .await;
    let (other, _, _) = app
        .seed_admission(&staff, "student-2", 10000.0, "ONE_TIME")
        .await;

    let student = app.token("student-1", Role::Student, None);
    let client = Client::new();

    let response = client
        .get(format!("{}/api/admissions", app.address))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    let admissions = body["admissions"].as_array().unwrap();
    assert_eq!(admissions.len(), 1);
    assert_eq!(admissions[0]["id"], own["id"]);

    let response = client
        .get(format!(
            "{}/api/admissions/{}",
            app.address,
            other["id"].as_str().unwrap()
        ))
        .bearer_auth(&student)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    app.cleanup().await;
}

#[tokio::test]
async fn update_merges_nested_fields() {
    let app = TestApp::spawn().await;
    let staff = app.token("staff-1", Role::Staff, None);

    let (admission, _, _) = app
        .seed_admission(&staff, "student-1", 10000.0, "ONE_TIME")
        .await;
    let id = admission["id"].as_str().unwrap();

    let response = Client::new()
        .put(format!("{}/api/admissions/{}", app.address, id))
        .bearer_auth(&staff)
        .json(&json!({
            "personal_details": { "mobile": "9123456780" },
            "address": { "city": "Mumbai" }
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    let updated = &body["admission"];
    assert_eq!(updated["personal_details"]["mobile"], "9123456780");
    // Untouched keys survive the patch.
    assert_eq!(updated["personal_details"]["name"], "Asha Verma");
    assert_eq!(updated["address"]["city"], "Mumbai");
    assert_eq!(updated["address"]["line1"], "12 MG Road");

    app.cleanup().await;
}

#[tokio::test]
async fn delete_requires_admin_or_branch_admin() {
    let app = TestApp::spawn().await;
    let staff = app.token("staff-1", Role::Staff, None);
    let admin = app.token("admin-1", Role::Admin, None);

    let (admission, _, _) = app
        .seed_admission(&staff, "student-1", 10000.0, "ONE_TIME")
        .await;
    let id = admission["id"].as_str().unwrap();
    let client = Client::new();

    let response = client
        .delete(format!("{}/api/admissions/{}", app.address, id))
        .bearer_auth(&staff)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    let response = client
        .delete(format!("{}/api/admissions/{}", app.address, id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let response = client
        .get(format!("{}/api/admissions/{}", app.address, id))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    app.cleanup().await;
}

#[tokio::test]
async fn stats_aggregate_admissions_by_course() {
    let app = TestApp::spawn().await;
    let staff = app.token("staff-1", Role::Staff, None);
    let admin = app.token("admin-1", Role::Admin, None);

    app.seed_admission(&staff, "student-1", 10000.0, "ONE_TIME")
        .await;
    app.seed_admission(&staff, "student-2", 12000.0, "ONE_TIME")
        .await;

    let response = Client::new()
        .get(format!("{}/api/admissions/stats", app.address))
        .bearer_auth(&admin)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["stats"]["total_admissions"], 2);
    assert_eq!(body["stats"]["active_admissions"], 2);
    assert_eq!(body["course_stats"].as_array().unwrap().len(), 2);

    app.cleanup().await;
}
