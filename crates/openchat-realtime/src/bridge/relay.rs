//! Redis relay for multi-node service events.

#[cfg(feature = "bus-relay")]
pub mod implementation {
    use openchat_core::error::AppError;

    /// Redis relay for cross-node service events.
    #[derive(Debug, Clone)]
    pub struct RedisRelay {
        /// Redis URL.
        url: String,
    }

    impl RedisRelay {
        /// Creates a new Redis relay.
        pub fn new(url: &str) -> Self {
            Self {
                url: url.to_string(),
            }
        }

        /// Publishes a serialized event to a Redis channel.
        pub async fn publish(&self, subject: &str, payload: &str) -> Result<(), AppError> {
            let client = redis::Client::open(self.url.as_str())
                .map_err(|e| AppError::internal(format!("Redis connection failed: {e}")))?;

            let mut conn = client
                .get_multiplexed_async_connection()
                .await
                .map_err(|e| AppError::internal(format!("Redis connection failed: {e}")))?;

            redis::cmd("PUBLISH")
                .arg(subject)
                .arg(payload)
                .query_async::<i64>(&mut conn)
                .await
                .map_err(|e| AppError::internal(format!("Redis PUBLISH failed: {e}")))?;

            Ok(())
        }
    }
}

#[cfg(not(feature = "bus-relay"))]
pub mod implementation {
    use openchat_core::error::AppError;

    /// Stub relay when the `bus-relay` feature is disabled.
    #[derive(Debug, Clone)]
    pub struct RedisRelay;

    impl RedisRelay {
        /// Creates a stub relay.
        pub fn new(_url: &str) -> Self {
            Self
        }

        /// No-op publish.
        pub async fn publish(&self, _subject: &str, _payload: &str) -> Result<(), AppError> {
            Ok(())
        }
    }
}

pub use implementation::RedisRelay;
