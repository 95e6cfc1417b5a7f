use thiserror::Error;

#[derive(Debug, Error)]
pub enum TestInfraError {
    #[error("container error: {0}")]
    Container(#[from] testcontainers::TestcontainersError),
    #[error("mysql did not accept connections after {attempts} attempts: {source}")]
    Unreachable { attempts: u32, source: sqlx::Error },
}

pub type Result<T> = std::result::Result<T, TestInfraError>;
