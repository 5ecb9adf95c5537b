use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub storefront_origin: Option<String>,
    pub square: Option<SquareConfig>,
    pub notifications: NotifyConfig,
}

/// Square REST credentials. When SQUARE_ACCESS_TOKEN is unset the server
/// runs against the stub gateway instead.
#[derive(Debug, Clone)]
pub struct SquareConfig {
    pub base_url: String,
    pub access_token: String,
    pub location_id: String,
}

#[derive(Debug, Clone, Default)]
pub struct NotifyConfig {
    pub sendgrid_api_key: Option<String>,
    pub mail_from: Option<String>,
    pub order_sheet_webhook_url: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(3000);
        let storefront_origin = env::var("STOREFRONT_ORIGIN").ok();

        let square = match env::var("SQUARE_ACCESS_TOKEN") {
            Ok(access_token) => Some(SquareConfig {
                base_url: env::var("SQUARE_BASE_URL")
                    .unwrap_or_else(|_| "https://connect.squareupsandbox.com".to_string()),
                access_token,
                location_id: env::var("SQUARE_LOCATION_ID")?,
            }),
            Err(_) => None,
        };

        let notifications = NotifyConfig {
            sendgrid_api_key: env::var("SENDGRID_API_KEY").ok(),
            mail_from: env::var("MAIL_FROM").ok(),
            order_sheet_webhook_url: env::var("ORDER_SHEET_WEBHOOK_URL").ok(),
        };

        Ok(Self {
            database_url,
            host,
            port,
            storefront_origin,
            square,
            notifications,
        })
    }
}
