pub mod http;


use anyhow::Result;
use async_trait::async_trait;

use crate::engine::Engine;

#[async_trait]
pub trait Transport {
    async fn start(self, engine: Engine) -> Result<()>;
}
