use crate::error::{Result, TestInfraError};
use sqlx::mysql::MySqlPoolOptions;
use sqlx::MySqlPool;
use std::time::Duration;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::ImageExt;
use testcontainers::{ContainerAsync, GenericImage};
use tracing::debug;
use typed_builder::TypedBuilder;

const MYSQL_PORT: u16 = 3306;

/// Settings of a disposable registry database.
#[derive(Debug, Clone, TypedBuilder)]
pub struct RegistryDb {
    #[builder(default = "8.4".to_string())]
    image_tag: String,
    #[builder(default = "eanvault".to_string())]
    database: String,
    #[builder(default = "eanvault".to_string())]
    user: String,
    #[builder(default = "eanvault".to_string())]
    password: String,
    /// How often to try connecting once the container reports ready.
    #[builder(default = 20)]
    connect_attempts: u32,
    #[builder(default = Duration::from_millis(500))]
    connect_backoff: Duration,
}

impl RegistryDb {
    /// Starts the container and returns a pool that has connected at least once.
    pub async fn start(self) -> Result<MySqlServer> {
        let container = GenericImage::new("mysql", self.image_tag.as_str())
            .with_exposed_port(MYSQL_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stderr("ready for connections"))
            .with_env_var("MYSQL_DATABASE", self.database.as_str())
            .with_env_var("MYSQL_USER", self.user.as_str())
            .with_env_var("MYSQL_PASSWORD", self.password.as_str())
            .with_env_var("MYSQL_ROOT_PASSWORD", self.password.as_str())
            .start()
            .await?;

        let host = container.get_host().await?;
        let port = container.get_host_port_ipv4(MYSQL_PORT).await?;
        let url = format!(
            "mysql://{}:{}@{}:{}/{}",
            self.user, self.password, host, port, self.database
        );
        let pool = self.connect(&url).await?;

        Ok(MySqlServer {
            _container: container,
            pool,
        })
    }

    // mysql logs "ready for connections" once during init and again after
    // its restart, so the first connections may still be refused
    async fn connect(&self, url: &str) -> Result<MySqlPool> {
        let mut attempt = 1;
        loop {
            match MySqlPoolOptions::new().max_connections(5).connect(url).await {
                Ok(pool) => return Ok(pool),
                Err(source) if attempt >= self.connect_attempts => {
                    return Err(TestInfraError::Unreachable {
                        attempts: attempt,
                        source,
                    })
                }
                Err(err) => {
                    debug!(attempt, error = %err, "mysql not ready yet");
                    attempt += 1;
                    tokio::time::sleep(self.connect_backoff).await;
                }
            }
        }
    }
}

/// A running registry database. The container stops when this is dropped.
pub struct MySqlServer {
    _container: ContainerAsync<GenericImage>,
    pool: MySqlPool,
}

impl MySqlServer {
    pub fn pool(&self) -> MySqlPool {
        self.pool.clone()
    }
}
