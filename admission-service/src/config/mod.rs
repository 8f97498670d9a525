use anyhow::Result;
use dotenvy::dotenv;
use secrecy::Secret;
use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub razorpay: RazorpayConfig,
    pub uploads: UploadsConfig,
    pub service_name: String,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    pub db_name: String,
}

#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: Secret<String>,
}

#[derive(Clone, Debug)]
pub struct RazorpayConfig {
    pub key_id: String,
    pub key_secret: Secret<String>,
    pub api_base_url: String,
}

#[derive(Clone, Debug)]
pub struct UploadsConfig {
    /// Directory admission photos are written to and served from.
    pub base_path: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let host = env::var("ADMISSION_SERVICE_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("ADMISSION_SERVICE_PORT")
            .unwrap_or_else(|_| "3001".to_string())
            .parse()?;

        let db_url =
            env::var("ADMISSION_DATABASE_URL").expect("ADMISSION_DATABASE_URL must be set");
        let db_name =
            env::var("ADMISSION_DATABASE_NAME").unwrap_or_else(|_| "institute_db".to_string());

        let jwt_secret = env::var("ADMISSION_JWT_SECRET").expect("ADMISSION_JWT_SECRET must be set");

        let razorpay_key_id = env::var("RAZORPAY_KEY_ID").unwrap_or_default();
        let razorpay_key_secret = env::var("RAZORPAY_KEY_SECRET").unwrap_or_default();
        let razorpay_api_base_url = env::var("RAZORPAY_API_BASE_URL")
            .unwrap_or_else(|_| "https://api.razorpay.com/v1".to_string());

        let uploads_path = env::var("ADMISSION_UPLOADS_PATH").unwrap_or_else(|_| "uploads".to_string());

        Ok(Self {
            server: ServerConfig { host, port },
            database: DatabaseConfig {
                url: Secret::new(db_url),
                db_name,
            },
            jwt: JwtConfig {
                secret: Secret::new(jwt_secret),
            },
            razorpay: RazorpayConfig {
                key_id: razorpay_key_id,
                key_secret: Secret::new(razorpay_key_secret),
                api_base_url: razorpay_api_base_url,
            },
            uploads: UploadsConfig {
                base_path: uploads_path,
            },
            service_name: "admission-service".to_string(),
        })
    }
}
