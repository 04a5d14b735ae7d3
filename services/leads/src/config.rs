use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;

pub const DEFAULT_QUERY_LIMIT: u32 = 50;

/// Service configuration sourced from environment variables, with an
/// optional YAML override file (`BRIGADE_CONFIG`). Credentials are held as
/// opaque strings and never logged.
#[derive(Debug, Clone)]
pub struct LeadsConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    pub storage: StorageBackend,
    pub warehouse: Option<WarehouseConfig>,
    pub docstore: Option<DocstoreConfig>,
    pub relational: Option<RelationalConfig>,
    pub email_worker_url: Option<String>,
    pub ga4: Option<Ga4Config>,
    pub ads: Option<AdsConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Warehouse,
}

/// Data-warehouse (BigQuery) project, dataset, and service-account creds.
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    pub project_id: String,
    pub dataset: String,
    pub table: String,
    /// Raw or base64-encoded service-account JSON.
    pub credentials: String,
}

/// Document-store (Firestore) mirror used for day-to-day CRM triage.
#[derive(Debug, Clone)]
pub struct DocstoreConfig {
    pub project_id: String,
    pub collection: String,
    pub credentials: String,
}

/// Relational backend (Supabase REST) keeping the contact directory.
#[derive(Debug, Clone)]
pub struct RelationalConfig {
    pub url: String,
    pub service_key: String,
    pub tenant_id: i64,
}

#[derive(Debug, Clone)]
pub struct Ga4Config {
    pub measurement_id: String,
    pub api_secret: String,
}

#[derive(Debug, Clone)]
pub struct AdsConfig {
    pub customer_id: String,
    pub developer_token: String,
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub qualified_conversion_id: Option<String>,
    pub booking_conversion_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LeadsConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    storage: Option<String>,
    email_worker_url: Option<String>,
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

impl LeadsConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("BRIGADE_BIND")
            .unwrap_or_else(|_| "0.0.0.0:8080".to_string())
            .parse()
            .with_context(|| "parse BRIGADE_BIND")?;
        let metrics_bind = std::env::var("BRIGADE_METRICS_BIND")
            .unwrap_or_else(|_| "0.0.0.0:9090".to_string())
            .parse()
            .with_context(|| "parse BRIGADE_METRICS_BIND")?;
        let storage = parse_storage(
            &std::env::var("BRIGADE_STORAGE").unwrap_or_else(|_| "memory".to_string()),
        )?;

        let warehouse = match (
            env_opt("BRIGADE_WAREHOUSE_PROJECT_ID"),
            env_opt("BRIGADE_WAREHOUSE_CREDENTIALS"),
        ) {
            (Some(project_id), Some(credentials)) => Some(WarehouseConfig {
                project_id,
                dataset: std::env::var("BRIGADE_WAREHOUSE_DATASET")
                    .unwrap_or_else(|_| "leads".to_string()),
                table: std::env::var("BRIGADE_WAREHOUSE_TABLE")
                    .unwrap_or_else(|_| "website_leads".to_string()),
                credentials,
            }),
            _ => None,
        };

        let docstore = match (
            env_opt("BRIGADE_DOCSTORE_PROJECT_ID"),
            env_opt("BRIGADE_DOCSTORE_CREDENTIALS"),
        ) {
            (Some(project_id), Some(credentials)) => Some(DocstoreConfig {
                project_id,
                collection: std::env::var("BRIGADE_DOCSTORE_COLLECTION")
                    .unwrap_or_else(|_| "leads".to_string()),
                credentials,
            }),
            _ => None,
        };

        let relational = match (env_opt("BRIGADE_SUPABASE_URL"), env_opt("BRIGADE_SUPABASE_KEY"))
        {
            (Some(url), Some(service_key)) => Some(RelationalConfig {
                url,
                service_key,
                tenant_id: std::env::var("BRIGADE_TENANT_ID")
                    .unwrap_or_else(|_| "1".to_string())
                    .parse()
                    .with_context(|| "parse BRIGADE_TENANT_ID")?,
            }),
            _ => None,
        };

        let ga4 = match (env_opt("BRIGADE_GA4_MEASUREMENT_ID"), env_opt("BRIGADE_GA4_API_SECRET"))
        {
            (Some(measurement_id), Some(api_secret)) => Some(Ga4Config {
                measurement_id,
                api_secret,
            }),
            _ => None,
        };

        let ads = match (
            env_opt("BRIGADE_ADS_CUSTOMER_ID"),
            env_opt("BRIGADE_ADS_DEVELOPER_TOKEN"),
            env_opt("BRIGADE_ADS_CLIENT_ID"),
            env_opt("BRIGADE_ADS_CLIENT_SECRET"),
            env_opt("BRIGADE_ADS_REFRESH_TOKEN"),
        ) {
            (
                Some(customer_id),
                Some(developer_token),
                Some(client_id),
                Some(client_secret),
                Some(refresh_token),
            ) => Some(AdsConfig {
                customer_id,
                developer_token,
                client_id,
                client_secret,
                refresh_token,
                qualified_conversion_id: env_opt("BRIGADE_ADS_QUALIFIED_CONVERSION_ID"),
                booking_conversion_id: env_opt("BRIGADE_ADS_BOOKING_CONVERSION_ID"),
            }),
            _ => None,
        };

        Ok(Self {
            bind_addr,
            metrics_bind,
            storage,
            warehouse,
            docstore,
            relational,
            email_worker_url: env_opt("BRIGADE_EMAIL_WORKER_URL"),
            ga4,
            ads,
        })
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("BRIGADE_CONFIG") {
            let contents =
                fs::read_to_string(&path).with_context(|| format!("read BRIGADE_CONFIG: {path}"))?;
            let override_cfg: LeadsConfigOverride =
                serde_yaml::from_str(&contents).with_context(|| "parse leads config yaml")?;
            if let Some(value) = override_cfg.bind_addr {
                config.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
            }
            if let Some(value) = override_cfg.metrics_bind {
                config.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
            }
            if let Some(value) = override_cfg.storage {
                config.storage = parse_storage(&value)?;
            }
            if let Some(value) = override_cfg.email_worker_url {
                config.email_worker_url = Some(value);
            }
        }
        Ok(config)
    }
}

fn parse_storage(value: &str) -> Result<StorageBackend> {
    match value {
        "memory" => Ok(StorageBackend::Memory),
        "warehouse" => Ok(StorageBackend::Warehouse),
        other => anyhow::bail!("unknown storage backend: {other}"),
    }
}
