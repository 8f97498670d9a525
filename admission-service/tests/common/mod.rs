use admission_service::config::{
    Config, DatabaseConfig, JwtConfig, RazorpayConfig, ServerConfig, UploadsConfig,
};
use admission_service::models::{Branch, Course, CourseCategory, User};
use admission_service::startup::Application;
use hmac::{Hmac, Mac};
use institute_core::auth::{JwtAuth, Role};
use secrecy::Secret;
use serde_json::json;
use sha2::Sha256;
use uuid::Uuid;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_JWT_SECRET: &str = "test-jwt-secret";
pub const TEST_RAZORPAY_SECRET: &str = "test_razorpay_secret";

pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub db: mongodb::Database,
    pub db_name: String,
    pub storage_path: String,
    pub jwt: JwtAuth,
    pub gateway: MockServer,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let gateway = MockServer::start().await;

        let db_name = format!("admission_test_{}", Uuid::new_v4().simple());
        let storage_path = format!("target/test-uploads-{}", Uuid::new_v4().simple());

        let db_url = std::env::var("ADMISSION_DATABASE_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

        let config = Config {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0, // Random port for testing
            },
            database: DatabaseConfig {
                url: Secret::new(db_url),
                db_name: db_name.clone(),
            },
            jwt: JwtConfig {
                secret: Secret::new(TEST_JWT_SECRET.to_string()),
            },
            razorpay: RazorpayConfig {
                key_id: "rzp_test_key".to_string(),
                key_secret: Secret::new(TEST_RAZORPAY_SECRET.to_string()),
                api_base_url: gateway.uri(),
            },
            uploads: UploadsConfig {
                base_path: storage_path.clone(),
            },
            service_name: "admission-service".to_string(),
        };

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let db = app.db().clone();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for the server to accept requests.
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            db,
            db_name,
            storage_path,
            jwt: JwtAuth::new(&Secret::new(TEST_JWT_SECRET.to_string())),
            gateway,
        }
    }

    pub fn token(&self, user_id: &str, role: Role, branch_id: Option<&str>) -> String {
        self.jwt
            .issue(user_id, role, branch_id.map(|b| b.to_string()))
            .expect("Failed to issue test token")
    }

    pub async fn seed_user(&self, id: &str, name: &str) {
        let user = User {
            id: id.to_string(),
            name: name.to_string(),
            email: None,
            role: Some("STUDENT".to_string()),
            branch_id: None,
        };
        self.db
            .collection::<User>("users")
            .insert_one(user, None)
            .await
            .expect("Failed to seed user");
    }

    pub async fn seed_branch(&self, name: &str) -> Branch {
        let branch = Branch::new(
            name.to_string(),
            format!("BR-{}", Uuid::new_v4().simple()),
            "12 MG Road, Pune".to_string(),
            "9876500000".to_string(),
        );
        self.db
            .collection::<Branch>("branches")
            .insert_one(&branch, None)
            .await
            .expect("Failed to seed branch");
        branch
    }

    pub async fn seed_course(&self, title: &str, fees: f64, branch_id: &str) -> Course {
        let course = Course::new(
            title.to_string(),
            format!("CRS-{}", Uuid::new_v4().simple()),
            CourseCategory::Programming,
            12,
            fees,
            vec![branch_id.to_string()],
        );
        self.db
            .collection::<Course>("courses")
            .insert_one(&course, None)
            .await
            .expect("Failed to seed course");
        course
    }

    /// POST a multipart admission creation and return the response.
    pub async fn post_admission(
        &self,
        token: &str,
        student_id: &str,
        course_id: &str,
        branch_id: &str,
        payment_type: &str,
    ) -> reqwest::Response {
        let data = json!({
            "student_id": student_id,
            "personal_details": {
                "name": "Asha Verma",
                "mobile": "9876543210",
                "gender": "FEMALE"
            },
            "address": {
                "line1": "12 MG Road",
                "city": "Pune",
                "district": "Pune",
                "pincode": "411001",
                "state": "Maharashtra"
            },
            "course_details": {
                "course_id": course_id,
                "branch_id": branch_id
            },
            "payment_details": {
                "payment_type": payment_type,
                "registration_fees": 500.0
            }
        });

        let form = reqwest::multipart::Form::new().text("data", data.to_string());
        reqwest::Client::new()
            .post(format!("{}/api/admissions", self.address))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Seed student + branch + course and create an admission; returns
    /// (admission JSON, branch id, course id).
    pub async fn seed_admission(
        &self,
        staff_token: &str,
        student_id: &str,
        fees: f64,
        payment_type: &str,
    ) -> (serde_json::Value, String, String) {
        self.seed_user(student_id, "Asha Verma").await;
        let branch = self.seed_branch("Pune Main").await;
        let course = self.seed_course("Rust Programming", fees, &branch.id).await;

        let response = self
            .post_admission(staff_token, student_id, &course.id, &branch.id, payment_type)
            .await;
        assert_eq!(response.status().as_u16(), 201, "admission create failed");
        let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
        (body["admission"].clone(), branch.id, course.id)
    }

    /// Stub the gateway order endpoint to return a fixed order id.
    pub async fn mock_gateway_order(&self, order_id: &str, amount_paise: u64) {
        Mock::given(method("POST"))
            .and(path("/orders"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": order_id,
                "amount": amount_paise,
                "currency": "INR",
                "receipt": "rcpt_test",
                "status": "created"
            })))
            .mount(&self.gateway)
            .await;
    }

    /// Compute the checkout signature the gateway would return.
    pub fn sign(&self, order_id: &str, payment_id: &str) -> String {
        type HmacSha256 = Hmac<Sha256>;
        let mut mac = HmacSha256::new_from_slice(TEST_RAZORPAY_SECRET.as_bytes())
            .expect("Invalid key length");
        mac.update(format!("{}|{}", order_id, payment_id).as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Cleanup test resources (database and uploads).
    pub async fn cleanup(&self) {
        let _ = self.db.drop(None).await;
        let _ = tokio::fs::remove_dir_all(&self.storage_path).await;
    }
}
