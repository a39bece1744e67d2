use anyhow::Context;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Settings for the server-side text generator behind `/api/tutor`.
#[derive(Debug, Clone)]
pub struct TutorConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub model: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt: JwtConfig,
    pub cors_origin: String,
    pub host: String,
    pub port: u16,
    pub tutor: Option<TutorConfig>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "mathleap".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "mathleap-users".into()),
            ttl_minutes: std::env::var("JWT_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .filter(|v| *v > 0)
                .unwrap_or(60),
        };
        anyhow::ensure!(!jwt.secret.trim().is_empty(), "JWT_SECRET must not be empty");

        let tutor = std::env::var("TUTOR_ENDPOINT")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(|endpoint| TutorConfig {
                endpoint,
                api_key: std::env::var("TUTOR_API_KEY").ok(),
                model: std::env::var("TUTOR_MODEL").unwrap_or_else(|_| "default".into()),
            });

        Ok(Self {
            database_url,
            jwt,
            cors_origin: std::env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("APP_PORT")
                .ok()
                .and_then(|v| v.parse::<u16>().ok())
                .unwrap_or(5000),
            tutor,
        })
    }
}
