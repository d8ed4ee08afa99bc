use crate::error::{
    BadEnvVarSnafu, ParseBoolEnvVarSnafu, ParseListenAddressSnafu, ParseNumberEnvVarSnafu,
    StudentsResult,
};
use secrecy::SecretString;
use snafu::ResultExt;
use std::{
    env::VarError,
    net::{IpAddr, SocketAddr},
    path::PathBuf,
    str::FromStr,
    sync::Arc,
    time::Duration,
};

const DEFAULT_PORT: u16 = 4000;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_UPLOADS_DIR: &str = "uploads";
const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 10;

#[derive(Clone, Debug)]
pub struct RuntimeConfiguration {
    db_config: Arc<DbConfig>,
    server_config: Arc<ServerConfig>,
}

impl RuntimeConfiguration {
    pub fn new() -> StudentsResult<Self> {
        Self::from_lookup(dotenvy::var)
    }

    ///`lookup` stands in for the environment, mostly so tests don't have to touch the real one
    pub fn from_lookup(
        lookup: impl Fn(&'static str) -> Result<String, dotenvy::Error>,
    ) -> StudentsResult<Self> {
        let vars = EnvVars { lookup };

        Ok(Self {
            db_config: Arc::new(DbConfig::new(&vars)?),
            server_config: Arc::new(ServerConfig::new(&vars)?),
        })
    }

    pub fn db_config(&self) -> Arc<DbConfig> {
        self.db_config.clone()
    }

    pub fn server_config(&self) -> Arc<ServerConfig> {
        self.server_config.clone()
    }
}

struct EnvVars<F> {
    lookup: F,
}

impl<F: Fn(&'static str) -> Result<String, dotenvy::Error>> EnvVars<F> {
    fn required(&self, name: &'static str) -> StudentsResult<String> {
        (self.lookup)(name).context(BadEnvVarSnafu { name })
    }

    fn optional(&self, name: &'static str) -> StudentsResult<Option<String>> {
        match (self.lookup)(name) {
            Ok(value) => Ok(Some(value)),
            Err(dotenvy::Error::EnvVar(VarError::NotPresent)) => Ok(None),
            Err(source) => Err(source).context(BadEnvVarSnafu { name }),
        }
    }

    fn number<T: FromStr<Err = std::num::ParseIntError>>(
        &self,
        name: &'static str,
        default: T,
    ) -> StudentsResult<T> {
        self.optional(name)?.map_or(Ok(default), |value| {
            value.trim().parse().context(ParseNumberEnvVarSnafu { name })
        })
    }

    fn flag(&self, name: &'static str) -> StudentsResult<bool> {
        self.optional(name)?.map_or(Ok(false), |value| {
            value
                .trim()
                .to_ascii_lowercase()
                .parse()
                .context(ParseBoolEnvVarSnafu { name })
        })
    }
}

#[derive(Debug)]
pub struct DbConfig {
    url: SecretString,
    max_connections: u32,
    acquire_timeout: Duration,
}

impl DbConfig {
    fn new<F>(vars: &EnvVars<F>) -> StudentsResult<Self>
    where
        F: Fn(&'static str) -> Result<String, dotenvy::Error>,
    {
        Ok(Self {
            url: SecretString::from(vars.required("DATABASE_URL")?),
            max_connections: vars.number("DB_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?,
            acquire_timeout: Duration::from_secs(
                vars.number("DB_ACQUIRE_TIMEOUT_SECS", DEFAULT_ACQUIRE_TIMEOUT_SECS)?,
            ),
        })
    }

    pub const fn url(&self) -> &SecretString {
        &self.url
    }

    pub const fn max_connections(&self) -> u32 {
        self.max_connections
    }

    pub const fn acquire_timeout(&self) -> Duration {
        self.acquire_timeout
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub listen_addr: SocketAddr,
    pub uploads_dir: PathBuf,
    pub max_body_bytes: usize,
    ///send error payloads with `200 OK`, like the old node service did
    pub legacy_error_status: bool,
}

impl ServerConfig {
    fn new<F>(vars: &EnvVars<F>) -> StudentsResult<Self>
    where
        F: Fn(&'static str) -> Result<String, dotenvy::Error>,
    {
        let host = vars
            .optional("HOST")?
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let ip =
            IpAddr::from_str(host.trim()).context(ParseListenAddressSnafu { original: host })?;
        let port = vars.number("PORT", DEFAULT_PORT)?;

        Ok(Self {
            listen_addr: SocketAddr::new(ip, port),
            uploads_dir: vars
                .optional("UPLOADS_DIR")?
                .map_or_else(|| PathBuf::from(DEFAULT_UPLOADS_DIR), PathBuf::from),
            max_body_bytes: vars.number("MAX_BODY_BYTES", DEFAULT_MAX_BODY_BYTES)?,
            legacy_error_status: vars.flag("LEGACY_ERROR_STATUS")?,
        })
    }
}
