use std::env;
use std::str::FromStr;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerStoreKind {
    Memory,
    Local,
    Supabase,
}

impl FromStr for LedgerStoreKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "memory" => Ok(LedgerStoreKind::Memory),
            "local" | "file" => Ok(LedgerStoreKind::Local),
            "supabase" => Ok(LedgerStoreKind::Supabase),
            other => Err(format!("unknown ledger store: {}", other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub ledger_store: LedgerStoreKind,
    pub ledger_storage_path: String,
    pub platform_fee: u32,
    pub max_advance_booking_days: u32,
    pub clinic_utc_offset_minutes: i32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 3000,
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_jwt_secret: String::new(),
            ledger_store: LedgerStoreKind::Local,
            ledger_storage_path: "data/medislot.json".to_string(),
            platform_fee: 29,
            max_advance_booking_days: 30,
            clinic_utc_offset_minutes: 0,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let config = Self {
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| defaults.server_host.clone()),
            server_port: parse_var("SERVER_PORT", defaults.server_port),
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            ledger_store: parse_var("LEDGER_STORE", defaults.ledger_store),
            ledger_storage_path: env::var("LEDGER_STORAGE_PATH")
                .unwrap_or_else(|_| {
                    warn!("LEDGER_STORAGE_PATH not set, using default");
                    defaults.ledger_storage_path.clone()
                }),
            platform_fee: parse_var("PLATFORM_FEE", defaults.platform_fee),
            max_advance_booking_days: parse_var(
                "MAX_ADVANCE_BOOKING_DAYS",
                defaults.max_advance_booking_days,
            ),
            clinic_utc_offset_minutes: checked_utc_offset(
                parse_var("CLINIC_UTC_OFFSET_MINUTES", defaults.clinic_utc_offset_minutes),
                defaults.clinic_utc_offset_minutes,
            ),
        };

        if !config.is_auth_configured() {
            warn!("SUPABASE_JWT_SECRET missing - every authenticated request will be rejected");
        }

        if config.ledger_store == LedgerStoreKind::Supabase && !config.is_supabase_configured() {
            warn!("LEDGER_STORE=supabase but Supabase is not fully configured");
        }

        config
    }

    pub fn is_auth_configured(&self) -> bool {
        !self.supabase_jwt_secret.is_empty()
    }

    pub fn is_supabase_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

/// Offsets must stay strictly inside one day either way.
pub const MAX_UTC_OFFSET_MINUTES: i32 = 24 * 60 - 1;

fn checked_utc_offset(minutes: i32, default: i32) -> i32 {
    if minutes.unsigned_abs() > MAX_UTC_OFFSET_MINUTES.unsigned_abs() {
        warn!(
            "CLINIC_UTC_OFFSET_MINUTES={} is outside +/-{}, using default {}",
            minutes, MAX_UTC_OFFSET_MINUTES, default
        );
        return default;
    }
    minutes
}

fn parse_var<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            warn!("{} has invalid value {:?}, using default {:?}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_kind_parsing() {
        assert_eq!("memory".parse::<LedgerStoreKind>(), Ok(LedgerStoreKind::Memory));
        assert_eq!(" Local ".parse::<LedgerStoreKind>(), Ok(LedgerStoreKind::Local));
        assert_eq!("file".parse::<LedgerStoreKind>(), Ok(LedgerStoreKind::Local));
        assert_eq!("SUPABASE".parse::<LedgerStoreKind>(), Ok(LedgerStoreKind::Supabase));
        assert!("redis".parse::<LedgerStoreKind>().is_err());
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.platform_fee, 29);
        assert_eq!(config.max_advance_booking_days, 30);
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert!(!config.is_auth_configured());
        assert!(!config.is_supabase_configured());
    }

    #[test]
    fn test_out_of_range_utc_offset_falls_back() {
        assert_eq!(checked_utc_offset(330, 0), 330);
        assert_eq!(checked_utc_offset(-MAX_UTC_OFFSET_MINUTES, 0), -MAX_UTC_OFFSET_MINUTES);
        assert_eq!(checked_utc_offset(24 * 60, 0), 0);
        assert_eq!(checked_utc_offset(-100_000, 60), 60);
    }
}
